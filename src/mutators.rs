//! The mutators the [`Factory`][crate::Factory] builds.
//!
//! You normally get these as [`MutatorRef`][crate::MutatorRef]s from a factory, but they can also
//! be assembled by hand. It is idiomatic to import this module with the alias
//! `m`:
//!
//! ```rust
//! use mutatype::mutators as m;
//! use mutatype::{IntKind, Session};
//!
//! let list = m::list(std::sync::Arc::new(m::integer(IntKind::Short, Some((0, 9)))), None);
//! assert_eq!(list.to_string(), "List<Short>");
//!
//! let mut session = Session::new();
//! let value = session.init(&list).unwrap();
//! # let _ = value;
//! ```

use crate::log;
use crate::{Context, Result, Value};
use std::io;

mod composite;
mod lazy;
mod list;
mod nullable;
mod primitives;
mod string;
mod sum;

pub use composite::*;
pub(crate) use lazy::Lazy;
pub use list::*;
pub use nullable::*;
pub use primitives::*;
pub use string::*;
pub use sum::*;

/// Run `attempt` until it produces something other than `original`, at most
/// `Config::max_mutation_attempts` times.
///
/// Returns `None` if every attempt produced `original` again.
pub(crate) fn until_changed<T: PartialEq>(
    ctx: &mut Context,
    original: &T,
    what: &str,
    mut attempt: impl FnMut(&mut Context) -> Result<T>,
) -> Result<Option<T>> {
    for _ in 0..ctx.config().max_mutation_attempts() {
        let candidate = attempt(ctx)?;
        if candidate != *original {
            return Ok(Some(candidate));
        }
    }
    log::debug!("{what}: every mutation attempt left the value unchanged");
    Ok(None)
}

/// The bytes left in `input`.
pub(crate) fn read_rest(input: &mut dyn io::Read) -> Result<Vec<u8>> {
    let mut rest = vec![];
    input.read_to_end(&mut rest)?;
    Ok(rest)
}

pub(crate) fn read_array<const N: usize>(input: &mut dyn io::Read) -> Result<[u8; N]> {
    let mut buf = [0; N];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u32(input: &mut dyn io::Read) -> Result<u32> {
    Ok(u32::from_be_bytes(read_array(input)?))
}

pub(crate) fn write_u32(out: &mut dyn io::Write, x: u32) -> Result<()> {
    out.write_all(&x.to_be_bytes())?;
    Ok(())
}

/// Write a length prefix. Lengths never exceed `u32::MAX` for values a
/// mutator produced.
pub(crate) fn write_len(out: &mut dyn io::Write, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| crate::Error::mismatch(format!("length {len} does not fit in 32 bits")))?;
    write_u32(out, len)
}

/// Length bounds from an optional `with_length` constraint.
pub(crate) fn length_bounds(length: Option<(usize, usize)>) -> (usize, usize) {
    length.unwrap_or((0, crate::DEFAULT_MAX_LEN))
}

/// How long a freshly created string or list should be at most, given how
/// deep it is nested.
pub(crate) fn init_len_cap(ctx: &Context, min: usize, max: usize) -> usize {
    if ctx.at_depth_limit() {
        return min;
    }
    let shift = ctx.depth().min(usize::BITS - 1);
    (ctx.config().max_init_len() >> shift).clamp(min, max)
}
