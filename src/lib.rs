#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod _guide;
mod cache;
pub mod codec;
pub mod constraint;
pub mod error;
mod factory;
mod log;
pub mod mutators;
pub mod reflect;
mod rng;
pub mod types;
mod value;

use std::fmt;
use std::io;
use std::sync::Arc;

pub use cache::TypeKey;
pub use constraint::{Constraint, ConstraintChain, ConstraintKind, ConstraintMode};
pub use error::{Error, ErrorKind, Result};
pub use factory::Factory;
pub use reflect::{Reflect, ReflectComposite, TypedMutator};
pub use rng::Rng;
pub use types::{
    AnnotatedType, Binding, CompositeDesc, Construction, FieldDesc, FloatKind, IntKind, Shape,
    SumDesc, TypeDef, TypeName, TypeRegistry,
};
pub use value::{CompositeValue, Value, VariantValue};

#[cfg(feature = "check")]
pub mod check;

#[cfg(feature = "derive")]
/// Automatically describe a struct or enum to the mutator factory.
///
/// See [the `#[derive(Reflect)]` section of the
/// guide][crate::_guide::derive_macro] for details.
pub use mutatype_derive::Reflect;

/// Strings and lists without a `with_length` constraint are never longer than
/// this.
pub const DEFAULT_MAX_LEN: usize = 1000;

/// Tunables shared by every mutator during a session.
///
/// Read it through [`Context::config`]; set it through the [`Session`]
/// builder.
#[derive(Clone, Debug)]
pub struct Config {
    max_depth: u32,
    max_init_len: usize,
    max_mutation_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_init_len: 8,
            max_mutation_attempts: 16,
        }
    }
}

impl Config {
    /// How many composite levels deep generation may go before every optional
    /// position is left absent and every list is left empty.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The largest length `init` picks for a top-level string or list,
    /// halved per level of nesting. `with_length` minimums still apply.
    #[inline]
    pub fn max_init_len(&self) -> usize {
        self.max_init_len
    }

    /// How many times a mutator retries a mutation that did not change the
    /// value before giving up.
    #[inline]
    pub fn max_mutation_attempts(&self) -> u32 {
        self.max_mutation_attempts
    }
}

/// A mutation session and its configuration.
///
/// This type allows you to configure things like the RNG seed, and how deep
/// and how long generated values get.
///
/// A session should be reused while a particular value, or set of values, are
/// being repeatedly mutated.
///
/// # Example
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::{AnnotatedType, Factory, Session};
///
/// let factory = Factory::new();
/// let mutator = factory.resolve(&AnnotatedType::list_of(AnnotatedType::integer()))?;
///
/// // Create a new mutation session.
/// let mut session = Session::new()
///     // Configure the RNG seed, changing which random mutations are chosen.
///     .seed(0x12345678);
///
/// // Create a value and mutate it a few times inside this session.
/// let mut value = session.init(&mutator)?;
/// for _ in 0..3 {
///     value = session.mutate(&mutator, &value)?;
///     println!("mutated value is {value:?}");
/// }
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug)]
pub struct Session {
    context: Context,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a new, default `Session`.
    pub fn new() -> Self {
        Self {
            context: Context {
                rng: Rng::default(),
                config: Config::default(),
                depth: 0,
            },
        }
    }

    /// Set the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.context.rng = Rng::new(seed);
        self
    }

    /// Set the generation depth cutoff.
    ///
    /// Defaults to `8`.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.context.config.max_depth = max_depth;
        self
    }

    /// Set the largest length `init` picks for top-level strings and lists.
    ///
    /// Defaults to `8`.
    pub fn max_init_len(mut self, max_init_len: usize) -> Self {
        self.context.config.max_init_len = max_init_len;
        self
    }

    /// Set how many times a mutator retries a mutation that left the value
    /// unchanged.
    ///
    /// Defaults to `16`.
    pub fn max_mutation_attempts(mut self, attempts: u32) -> Self {
        self.context.config.max_mutation_attempts = attempts.max(1);
        self
    }

    /// Create a new value with the given mutator.
    pub fn init(&mut self, mutator: &(impl Mutate + ?Sized)) -> Result<Value> {
        mutator.init(&mut self.context)
    }

    /// Mutate `value` with the given mutator, returning the new value.
    ///
    /// `value` itself is left untouched.
    pub fn mutate(&mut self, mutator: &(impl Mutate + ?Sized), value: &Value) -> Result<Value> {
        mutator.mutate(value, &mut self.context)
    }

    /// Get this session's context, for calling mutators directly.
    pub fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

/// The context for the current mutation.
///
/// This context includes the configuration, the random number generator and
/// how deep inside a composite value the current call is.
///
/// You do not create contexts directly. You create [`Session`s][crate::Session]
/// which internally manage contexts for you.
#[derive(Debug)]
pub struct Context {
    rng: Rng,
    config: Config,
    depth: u32,
}

impl Context {
    /// Get this context's random number generator.
    #[inline]
    #[must_use]
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Get this context's configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// How many composite levels deep the current call is.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Has generation reached the depth cutoff?
    #[inline]
    #[must_use]
    pub fn at_depth_limit(&self) -> bool {
        self.depth >= self.config.max_depth
    }

    /// Run `f` one composite level deeper.
    pub(crate) fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Creating and mutating values.
///
/// Mutators are immutable once built and shared between every position that
/// uses the same type. They never hold on to values they have returned:
/// `mutate` takes the old value by reference and returns a new one, so the
/// caller's value is never changed.
///
/// Implementations must uphold the following:
///
/// * `mutate(v)` returns a value different from `v`, unless the type has only
///   one value. Implementations retry a bounded number of times
///   ([`Config::max_mutation_attempts`]) before giving up.
///
/// * `detach(v)` returns a value equal to `v` that shares no heap storage with
///   `v` or with anything the mutator holds.
///
/// * Only values this mutator (or an equivalent one) produced are valid
///   inputs. Anything else fails with a
///   [mismatch error][crate::Error::is_mismatch] rather than panicking.
pub trait Mutate: Send + Sync {
    /// Create a new value from scratch.
    fn init(&self, ctx: &mut Context) -> Result<Value>;

    /// Create a new value that differs from `value`.
    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value>;

    /// Create a deep copy of `value`.
    fn detach(&self, value: &Value) -> Result<Value>;

    /// Does every value of this mutator's type serialize to the same, nonzero,
    /// number of bytes?
    fn has_fixed_size(&self) -> bool;
}

/// Reading and writing values as bytes.
///
/// The encoding is big-endian and self-delimiting: `read` consumes exactly
/// the bytes `write` produced. The *exclusive* forms are used when the value
/// owns the rest of the stream and may omit length prefixes. See the
/// [`codec`] module.
pub trait Serialize {
    /// Read a value written by [`write`][Serialize::write].
    fn read(&self, input: &mut dyn io::Read) -> Result<Value>;

    /// Write a value.
    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()>;

    /// Read a value that owns the rest of `input`.
    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read(input)
    }

    /// Write a value that will own the rest of the stream.
    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        self.write(value, out)
    }
}

impl<M> Mutate for Arc<M>
where
    M: ?Sized + Mutate,
{
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        (**self).init(ctx)
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        (**self).mutate(value, ctx)
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        (**self).detach(value)
    }

    fn has_fixed_size(&self) -> bool {
        (**self).has_fixed_size()
    }
}

impl<M> Serialize for Arc<M>
where
    M: ?Sized + Serialize,
{
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        (**self).read(input)
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        (**self).write(value, out)
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        (**self).read_exclusive(input)
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        (**self).write_exclusive(value, out)
    }
}

/// A complete mutator: creation, mutation, serialization and a printable
/// signature.
///
/// The `Display` implementation renders the mutator's signature, for example
/// `[Nullable<String>, Boolean] -> Config`.
///
/// This trait is implemented for every type that implements its supertraits.
pub trait Mutator: Mutate + Serialize + fmt::Display + fmt::Debug {}

impl<M> Mutator for M where M: ?Sized + Mutate + Serialize + fmt::Display + fmt::Debug {}

/// A shared handle to a built mutator.
pub type MutatorRef = Arc<dyn Mutator>;

fn _static_assert_object_safety(_: &dyn Mutate, _: &dyn Serialize, _: &dyn Mutator) {}

fn _static_assert_thread_safety() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<MutatorRef>();
    is_send_sync::<Factory>();
}
