//! Whole-buffer serialization helpers.
//!
//! A fuzzer hands the target one byte buffer per input. These helpers encode a
//! value as the sole content of such a buffer, using the *exclusive* forms of
//! [`Serialize`] so that the last length prefix is dropped wherever the
//! encoding allows it.
//!
//! # Encoding
//!
//! All integers are big-endian.
//!
//! | Mutator | Encoding | Exclusive encoding |
//! |---------|----------|--------------------|
//! | `Boolean` | 1 byte, only the low bit is read | same |
//! | `Byte`/`Short`/`Integer`/`Long` | 1/2/4/8 bytes, two's complement, folded into range when read | same |
//! | `Float`/`Double` | IEEE-754 bits, 4/8 bytes | same |
//! | `String` | `u32` byte length, then UTF-8 | UTF-8 to the end |
//! | `List<T>` | `u32` element count, then elements | fixed-size `T`: elements to the end; otherwise as non-exclusive |
//! | `Nullable<T>` | tag byte (`0` absent, `1` present), then the value | tag, then the exclusive value |
//! | composite | each field in order | last field exclusive |
//! | sum | `u32` alternative index, then the value | index, then the exclusive value |

use crate::{Error, Result, Serialize, Value};

/// Encode `value` as the whole content of a buffer.
///
/// # Example
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::{codec, AnnotatedType, Factory, Value};
///
/// let factory = Factory::new();
/// let mutator = factory.resolve(&AnnotatedType::string())?;
///
/// let bytes = codec::to_bytes(&*mutator, &Value::string("hi"))?;
/// assert_eq!(bytes, b"hi");
///
/// let value = codec::from_bytes(&*mutator, &bytes)?;
/// assert_eq!(value, Value::string("hi"));
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn to_bytes(mutator: &(impl Serialize + ?Sized), value: &Value) -> Result<Vec<u8>> {
    let mut out = vec![];
    mutator.write_exclusive(value, &mut out)?;
    Ok(out)
}

/// Decode a value from the whole content of `bytes`.
///
/// Fails with a [corrupted][Error::is_corrupted] error if `bytes` is not a
/// valid encoding or has bytes left over after the value.
pub fn from_bytes(mutator: &(impl Serialize + ?Sized), bytes: &[u8]) -> Result<Value> {
    let mut input = bytes;
    let value = mutator.read_exclusive(&mut input)?;
    if !input.is_empty() {
        return Err(Error::corrupted(format!(
            "{} trailing bytes after the value",
            input.len()
        )));
    }
    Ok(value)
}
