//! A small harness for smoke-testing properties and mutators.
//!
//! The primary entry point for this harness is the [`Check`] type.
//!
//! This harness is designed to be used for smoke tests inside `#[test]`
//! functions. It should compile and run quickly, and is therefore suitable for
//! quick (but relatively shallow) iteration cycles like `cargo test` runs and
//! CI. It is not intended to be used for your main, in-depth, 24/7 fuzzing. For
//! that use case, hook a `mutatype` mutator into a coverage-guided fuzzer such
//! as `libfuzzer`; see [the guide][crate::_guide::fuzzer_integration].
//!
//! # Example
//!
//! ```
//! mod tests {
//!     use mutatype::{check::Check, Factory};
//!
//!     fn test_addition() {
//!         let factory = Factory::new();
//!         let mutator = factory.typed::<Vec<i32>>().unwrap();
//!         let result = Check::new()
//!             .iters(1000)
//!             .run_typed(&mutator, |xs: &Vec<i32>| {
//!                 let forwards = xs.iter().fold(0i32, |a, b| a.wrapping_add(*b));
//!                 let backwards = xs.iter().rev().fold(0i32, |a, b| a.wrapping_add(*b));
//!                 if forwards == backwards {
//!                     Ok(())
//!                 } else {
//!                     Err("addition is not commutative!")
//!                 }
//!             });
//!         assert!(result.is_ok());
//!     }
//! }
//! ```

use crate::log;
use crate::{codec, Error, Mutator, Reflect, Session, TypedMutator, Value};
use std::fmt::{self, Debug};
use std::panic;

/// The result of running a check.
///
/// If the check passes, this is `Ok(())`.
///
/// If the check fails, this is `Err(CheckError::Failed(_))` with the failing
/// test case and an error message.
///
/// If there is some other kind of error while running the check, for example
/// if a mutator is handed a value it cannot mutate, then this is
/// `Err(CheckError::Error(_))`.
pub type CheckResult<T> = std::result::Result<(), CheckError<T>>;

/// An error when running a `Check`.
pub enum CheckError<T> {
    /// The check failed.
    ///
    /// This indicates that the property being checked is not upheld for the
    /// given test case.
    Failed(CheckFailure<T>),

    /// An error occurred while running the check.
    Error(Error),
}

impl<T: Debug> Debug for CheckError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
            CheckError::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

impl<T> From<Error> for CheckError<T> {
    fn from(v: Error) -> Self {
        Self::Error(v)
    }
}

impl<T> From<CheckFailure<T>> for CheckError<T> {
    fn from(v: CheckFailure<T>) -> Self {
        Self::Failed(v)
    }
}

impl<T> CheckError<T> {
    /// Unwrap the underlying `CheckError::Failed(_)` payload, panicking if this
    /// is not a `CheckError::Failed`.
    #[track_caller]
    pub fn unwrap_failed(self) -> CheckFailure<T> {
        match self {
            CheckError::Failed(f) => f,
            _ => panic!("CheckError::unwrap_failed called on non-failed CheckError"),
        }
    }

    /// Unwrap the underlying `CheckError::Error(_)` payload, panicking if this
    /// is not a `CheckError::Error(_)`.
    #[track_caller]
    pub fn unwrap_error(self) -> Error {
        match self {
            CheckError::Error(e) => e,
            _ => panic!("CheckError::unwrap_error called on non-error CheckError"),
        }
    }
}

/// A failing test case and a message describing the failure.
///
/// # Example
///
/// ```
/// use mutatype::{check::Check, AnnotatedType, Constraint, Factory, Value};
///
/// let factory = Factory::new();
/// let mutator = factory
///     .resolve(&AnnotatedType::integer().with(Constraint::in_range(0, 9)))
///     .unwrap();
///
/// let failure = Check::new()
///     .run(&mutator, |v| {
///         if *v == Value::Int(7) {
///             Err("unlucky number!")
///         } else {
///             Ok(())
///         }
///     })
///     .unwrap_err()
///     .unwrap_failed();
///
/// assert_eq!(failure.value, Value::Int(7));
/// assert_eq!(failure.message, "unlucky number!");
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub struct CheckFailure<T> {
    /// The input value that triggered the failure.
    pub value: T,

    /// The failure message.
    pub message: String,
}

/// A check that can be run to test a property, or the mutator contract.
///
/// Every run starts a fresh [`Session`] from the configured seed, creates a
/// value with `init`, and then repeatedly mutates it.
#[derive(Debug)]
pub struct Check {
    iters: usize,
    seed: Option<u64>,
}

impl Default for Check {
    fn default() -> Check {
        Check::new()
    }
}

impl Check {
    /// Create a new `Check`.
    pub fn new() -> Check {
        Check {
            iters: 1000,
            seed: None,
        }
    }

    /// Configure the number of test iterations to run.
    pub fn iters(&mut self, iters: usize) -> &mut Check {
        self.iters = iters;
        self
    }

    /// Configure the seed of each run's session.
    pub fn seed(&mut self, seed: u64) -> &mut Check {
        self.seed = Some(seed);
        self
    }

    fn session(&self) -> Session {
        match self.seed {
            Some(seed) => Session::new().seed(seed),
            None => Session::new(),
        }
    }

    /// Run this configured `Check`, using `mutator` to create and mutate
    /// values, and checking that the given `property` function returns
    /// `Ok(_)` for all of them.
    pub fn run<S>(
        &self,
        mutator: &(impl Mutator + ?Sized),
        mut property: impl FnMut(&Value) -> std::result::Result<(), S>,
    ) -> CheckResult<Value>
    where
        S: ToString,
    {
        let mut session = self.session();
        let mut value = session.init(mutator)?;

        for i in 0..self.iters {
            if let Err(message) = check_one(&mut property, &value) {
                log::info!("failed on iteration {i} with input {value:?}: {message}");
                return Err(CheckFailure { value, message }.into());
            }
            value = session.mutate(mutator, &value)?;
        }
        Ok(())
    }

    /// Like [`run`][Check::run], but with values of the Rust type `T`.
    pub fn run_typed<T, S>(
        &self,
        mutator: &TypedMutator<T>,
        mut property: impl FnMut(&T) -> std::result::Result<(), S>,
    ) -> CheckResult<T>
    where
        T: Reflect + Debug,
        S: ToString,
    {
        let mut session = self.session();
        let mut value = mutator.init(session.context())?;

        for i in 0..self.iters {
            if let Err(message) = check_one(&mut property, &value) {
                log::info!("failed on iteration {i} with input {value:?}: {message}");
                return Err(CheckFailure { value, message }.into());
            }
            value = mutator.mutate(&value, session.context())?;
        }
        Ok(())
    }

    /// Check that `mutator` upholds the mutator contract on the values it
    /// creates:
    ///
    /// * `mutate` never returns its input unchanged, once the mutator has
    ///   shown that its type has more than one value;
    ///
    /// * `detach` returns an equal value that shares no storage with the
    ///   original;
    ///
    /// * every value reads back equal to itself, in both the plain and the
    ///   whole-buffer encodings.
    pub fn contract(&self, mutator: &(impl Mutator + ?Sized)) -> CheckResult<Value> {
        let mut session = self.session();
        let first = session.init(mutator)?;
        let mut value = first.clone();
        let mut seen_other = false;

        for i in 0..self.iters {
            if let Err(message) = check_value(mutator, &value) {
                log::info!("contract violated on iteration {i} by {value:?}: {message}");
                return Err(CheckFailure { value, message }.into());
            }

            let mutated = session.mutate(mutator, &value)?;
            seen_other |= mutated != first;
            if mutated == value && seen_other {
                log::info!("contract violated on iteration {i}: `mutate` returned {value:?}");
                return Err(CheckFailure {
                    value,
                    message: "`mutate` returned its input unchanged".to_string(),
                }
                .into());
            }
            value = mutated;
        }
        Ok(())
    }
}

fn check_one<T, S: ToString>(
    property: &mut impl FnMut(&T) -> std::result::Result<(), S>,
    value: &T,
) -> std::result::Result<(), String> {
    match panic::catch_unwind(panic::AssertUnwindSafe(|| property(value))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(message)) => Err(message.to_string()),
        Err(_) => Err("<panicked>".to_string()),
    }
}

fn check_value(mutator: &(impl Mutator + ?Sized), value: &Value) -> std::result::Result<(), String> {
    let copy = mutator.detach(value).map_err(|e| e.to_string())?;
    if copy != *value {
        return Err(format!("`detach` returned a different value: {copy:?}"));
    }
    if copy.aliases(value) {
        return Err("`detach` returned a value that shares storage".to_string());
    }

    let mut bytes = vec![];
    mutator.write(value, &mut bytes).map_err(|e| e.to_string())?;
    let read = mutator.read(&mut &bytes[..]).map_err(|e| e.to_string())?;
    if read != *value {
        return Err(format!("read back {read:?} after `write`"));
    }

    let bytes = codec::to_bytes(mutator, value).map_err(|e| e.to_string())?;
    let read = codec::from_bytes(mutator, &bytes).map_err(|e| e.to_string())?;
    if read != *value {
        return Err(format!("read back {read:?} after `codec::to_bytes`"));
    }
    Ok(())
}
