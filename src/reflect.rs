//! Describing Rust types to the factory, and converting their values.
//!
//! [`Reflect`] connects a Rust type with an [`AnnotatedType`] and with the
//! dynamic [`Value`]s the factory's mutators work on. It is implemented for
//! the primitive types, `String`, `Vec<T>`, `Option<T>` and `Box<T>`, and can
//! be derived for structs and enums with `#[derive(Reflect)]`.
//!
//! [`TypedMutator<T>`] wraps a factory-built mutator with conversions to and
//! from `T`, so a fuzz target can work with its own types directly.

use crate::{
    codec, AnnotatedType, Context, Error, MutatorRef, Result, Serialize, TypeRegistry, Value,
};
use std::fmt;
use std::io;
use std::marker::PhantomData;

/// A Rust type the factory can build mutators for.
///
/// # Example
///
/// Implementing `Reflect` by hand for a newtype that should mutate like the
/// integer it wraps:
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::{AnnotatedType, Constraint, Factory, Reflect, Result, TypeRegistry, Value};
///
/// #[derive(Debug, PartialEq)]
/// struct Percent(i32);
///
/// impl Reflect for Percent {
///     fn describe(_registry: &mut TypeRegistry) -> Result<AnnotatedType> {
///         Ok(AnnotatedType::integer().with(Constraint::in_range(0, 100)))
///     }
///
///     fn to_value(&self) -> Value {
///         Value::Int(i64::from(self.0))
///     }
///
///     fn from_value(value: &Value) -> Result<Self> {
///         Ok(Percent(i32::from_value(value)?))
///     }
/// }
///
/// let factory = Factory::new();
/// let mutator = factory.typed::<Percent>()?;
/// let bytes = mutator.to_bytes(&Percent(42))?;
/// assert_eq!(mutator.from_bytes(&bytes)?, Percent(42));
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub trait Reflect: Sized + 'static {
    /// Describe this type, registering any named types it needs.
    fn describe(registry: &mut TypeRegistry) -> Result<AnnotatedType>;

    /// Convert to a dynamic value.
    fn to_value(&self) -> Value;

    /// Convert from a dynamic value.
    ///
    /// Fails with a [mismatch][Error::is_mismatch] error if `value` does not
    /// have this type's shape.
    fn from_value(value: &Value) -> Result<Self>;
}

/// A Rust type described as a composite, whose fields can be flattened into
/// a subtype's fields.
///
/// `#[derive(Reflect)]` implements this for structs, which is what lets a
/// `#[mutatype(parent)]` field embed another derived struct.
pub trait ReflectComposite: Reflect {
    /// Append this value's field values, parent fields first.
    fn to_fields(&self, out: &mut Vec<Value>);

    /// Take this type's field values from the front of `fields`.
    fn from_fields(fields: &mut std::slice::Iter<'_, Value>) -> Result<Self>;
}

/// Take the next field value, failing if there are none left.
///
/// Used by `#[derive(Reflect)]`.
pub fn next_field<'a>(fields: &mut std::slice::Iter<'a, Value>) -> Result<&'a Value> {
    fields
        .next()
        .ok_or_else(|| Error::mismatch("composite value has too few fields"))
}

/// Fail if any field values are left over.
///
/// Used by `#[derive(Reflect)]`.
pub fn expect_exhausted(fields: std::slice::Iter<'_, Value>) -> Result<()> {
    match fields.len() {
        0 => Ok(()),
        n => Err(Error::mismatch(format!(
            "composite value has {n} more fields than expected"
        ))),
    }
}

/// Check that a composite or sum value belongs to the type named `name`.
///
/// Used by `#[derive(Reflect)]`.
pub fn expect_type(found: &str, name: &str) -> Result<()> {
    if found == name {
        Ok(())
    } else {
        Err(Error::mismatch(format!(
            "expected a `{name}` value, found a `{found}` value"
        )))
    }
}

impl Reflect for bool {
    fn describe(_: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(AnnotatedType::boolean())
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool()
    }
}

macro_rules! ints {
    ( $( $ty:ty => $ctor:ident ; )* ) => {
        $(
            impl Reflect for $ty {
                fn describe(_: &mut TypeRegistry) -> Result<AnnotatedType> {
                    Ok(AnnotatedType::$ctor())
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: &Value) -> Result<Self> {
                    let x = value.as_int()?;
                    <$ty>::try_from(x).map_err(|_| {
                        Error::mismatch(format!(
                            concat!("{} does not fit in `", stringify!($ty), "`"),
                            x
                        ))
                    })
                }
            }
        )*
    };
}

ints! {
    i8 => byte;
    i16 => short;
    i32 => integer;
    i64 => long;
}

impl Reflect for f32 {
    fn describe(_: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(AnnotatedType::float())
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.as_float()? as f32)
    }
}

impl Reflect for f64 {
    fn describe(_: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(AnnotatedType::double())
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_float()
    }
}

impl Reflect for String {
    fn describe(_: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(AnnotatedType::string())
    }

    fn to_value(&self) -> Value {
        Value::string(self)
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.as_str()?.to_string())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn describe(registry: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(AnnotatedType::list_of(T::describe(registry)?))
    }

    fn to_value(&self) -> Value {
        Value::list(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        value.as_list()?.iter().map(T::from_value).collect()
    }
}

/// `Option<T>` is an optional position. Nested options collapse: a
/// `Option<Option<T>>` is never `Some(None)`.
impl<T: Reflect> Reflect for Option<T> {
    fn describe(registry: &mut TypeRegistry) -> Result<AnnotatedType> {
        Ok(T::describe(registry)?.nullable())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(x) => x.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn describe(registry: &mut TypeRegistry) -> Result<AnnotatedType> {
        T::describe(registry)
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> Result<Self> {
        Ok(Box::new(T::from_value(value)?))
    }
}

/// A mutator for values of the Rust type `T`.
///
/// Get one from [`Factory::typed`][crate::Factory::typed].
pub struct TypedMutator<T> {
    mutator: MutatorRef,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedMutator<T> {
    fn clone(&self) -> Self {
        Self {
            mutator: self.mutator.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedMutator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedMutator").field(&self.mutator).finish()
    }
}

impl<T> fmt::Display for TypedMutator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mutator, f)
    }
}

impl<T: Reflect> TypedMutator<T> {
    pub(crate) fn new(mutator: MutatorRef) -> Self {
        Self {
            mutator,
            _ty: PhantomData,
        }
    }

    /// The underlying dynamic mutator.
    pub fn as_dyn(&self) -> &MutatorRef {
        &self.mutator
    }

    /// Create a new `T`.
    pub fn init(&self, ctx: &mut Context) -> Result<T> {
        T::from_value(&self.mutator.init(ctx)?)
    }

    /// Create a new `T` that differs from `value`.
    pub fn mutate(&self, value: &T, ctx: &mut Context) -> Result<T> {
        T::from_value(&self.mutator.mutate(&value.to_value(), ctx)?)
    }

    /// Create a deep copy of `value`.
    pub fn detach(&self, value: &T) -> Result<T> {
        T::from_value(&self.mutator.detach(&value.to_value())?)
    }

    /// Read a `T`.
    pub fn read(&self, input: &mut dyn io::Read) -> Result<T> {
        T::from_value(&self.mutator.read(input)?)
    }

    /// Write a `T`.
    pub fn write(&self, value: &T, out: &mut dyn io::Write) -> Result<()> {
        self.mutator.write(&value.to_value(), out)
    }

    /// Encode `value` as the whole content of a buffer. See
    /// [`codec::to_bytes`].
    pub fn to_bytes(&self, value: &T) -> Result<Vec<u8>> {
        codec::to_bytes(&*self.mutator, &value.to_value())
    }

    /// Decode a `T` from the whole content of `bytes`. See
    /// [`codec::from_bytes`].
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<T> {
        T::from_value(&codec::from_bytes(&*self.mutator, bytes)?)
    }

    /// Does every `T` serialize to the same number of bytes?
    pub fn has_fixed_size(&self) -> bool {
        self.mutator.has_fixed_size()
    }
}
