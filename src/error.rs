//! Error and result types for the `mutatype` crate.

use std::borrow::Cow;
use std::fmt;
use std::io;

/// A result that is either `Ok(T)` or `Err(mutatype::Error)`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error that can occur when using the `mutatype` crate.
///
/// This type is a thin wrapper around [`ErrorKind`], which contains the
/// specific kind of error that occurred.
///
/// Errors come in two flavors:
///
/// * Construction-time errors, raised by the
///   [`Factory`][crate::Factory] while building a mutator. These are never
///   retryable: asking for the same type again fails the same way. See
///   [`Error::is_construction_error`].
///
/// * Contract violations, raised by an already-built mutator when it is given
///   something it could never have produced, for example a corrupted byte
///   stream or a value of the wrong shape.
///
/// # Examples
///
/// ```
/// use mutatype::{AnnotatedType, Error, ErrorKind, Factory};
///
/// let factory = Factory::new();
/// let error: Error = factory
///     .resolve(&AnnotatedType::named("NeverDefined"))
///     .unwrap_err();
///
/// assert!(error.is_unsupported_type());
///
/// match error.kind() {
///     ErrorKind::UnsupportedType(msg) => println!("unsupported! {msg}"),
///     ErrorKind::InvalidConstraint(msg) => println!("invalid! {msg}"),
///
///     // The `ErrorKind` type is not exhaustive, so we always need a catch-all arm.
///     unknown => println!("unknown! {unknown:?}"),
/// }
/// ```
pub struct Error {
    // Box the inner error kind to keep `Result<Value>` small.
    kind: Box<ErrorKind>,
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::corrupted("unexpected end of input")
        } else {
            ErrorKind::Io(err).into()
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::UnsupportedType(msg) => write!(f, "unsupported type: {msg}"),
            ErrorKind::InvalidConstraint(msg) => write!(f, "invalid constraint: {msg}"),
            ErrorKind::DuplicateType(msg) => write!(f, "duplicate type definition: {msg}"),
            ErrorKind::Corrupted(msg) => write!(f, "corrupted input: {msg}"),
            ErrorKind::Mismatch(msg) => write!(f, "value does not match mutator: {msg}"),
            ErrorKind::Io(err) => write!(f, "i/o error: {err}"),
            ErrorKind::Other(msg) => write!(f, "an unknown error occurred: {msg}"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl Error {
    /// Returns a new error indicating that no mutator can be built for a type.
    #[must_use]
    pub fn unsupported_type(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::UnsupportedType(msg.into()).into()
    }

    /// Returns a new error indicating that a constraint is contradictory or
    /// applied to an incompatible position.
    #[must_use]
    pub fn invalid_constraint(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::InvalidConstraint(msg.into()).into()
    }

    /// Returns a new error indicating that a type name is already taken by a
    /// different definition.
    #[must_use]
    pub fn duplicate_type(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::DuplicateType(msg.into()).into()
    }

    /// Returns a new error indicating that a byte stream could not be decoded.
    #[must_use]
    pub fn corrupted(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Corrupted(msg.into()).into()
    }

    /// Returns a new error indicating that a value has the wrong shape for the
    /// mutator or Rust type it was given to.
    #[must_use]
    pub fn mismatch(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Mismatch(msg.into()).into()
    }

    /// Returns a new error with the given message.
    #[must_use]
    pub fn other(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Other(msg.into()).into()
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if the error's kind is
    /// [`UnsupportedType`][ErrorKind::UnsupportedType].
    #[must_use]
    pub fn is_unsupported_type(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnsupportedType(_))
    }

    /// Returns `true` if the error's kind is
    /// [`InvalidConstraint`][ErrorKind::InvalidConstraint].
    #[must_use]
    pub fn is_invalid_constraint(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidConstraint(_))
    }

    /// Returns `true` if the error's kind is
    /// [`DuplicateType`][ErrorKind::DuplicateType].
    #[must_use]
    pub fn is_duplicate_type(&self) -> bool {
        matches!(self.kind(), ErrorKind::DuplicateType(_))
    }

    /// Returns `true` if the error's kind is
    /// [`Corrupted`][ErrorKind::Corrupted].
    #[must_use]
    pub fn is_corrupted(&self) -> bool {
        matches!(self.kind(), ErrorKind::Corrupted(_))
    }

    /// Returns `true` if the error's kind is
    /// [`Mismatch`][ErrorKind::Mismatch].
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        matches!(self.kind(), ErrorKind::Mismatch(_))
    }

    /// Returns `true` if this error was raised while building a mutator, as
    /// opposed to while using one.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnsupportedType(_)
                | ErrorKind::InvalidConstraint(_)
                | ErrorKind::DuplicateType(_)
        )
    }
}

/// The kind of an error that can occur when using the `mutatype` crate.
///
/// This enum is not exhaustive, and new variants may be added in the future.
/// When matching on this enum, a catch-all arm should be used to handle any
/// new variants that are added.
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// No builder can handle the requested type and constraint combination.
    UnsupportedType(ErrorMessage),

    /// Constraints are self-contradictory or applied to a position that does
    /// not support them.
    InvalidConstraint(ErrorMessage),

    /// A type name is already registered with a different definition.
    DuplicateType(ErrorMessage),

    /// A byte stream given to `read` is not a valid encoding.
    Corrupted(ErrorMessage),

    /// A value does not have the shape its mutator or Rust type expects.
    Mismatch(ErrorMessage),

    /// An underlying reader or writer failed.
    Io(io::Error),

    /// Some other error occurred.
    Other(ErrorMessage),
}

impl From<Error> for ErrorKind {
    #[inline]
    fn from(err: Error) -> Self {
        *err.kind
    }
}

/// A message that can be attached to an error.
///
/// This is a thin wrapper around a borrowed or owned string.
///
/// # Examples
///
/// ```
/// use mutatype::error::ErrorMessage;
///
/// let msg = ErrorMessage::new("something went wrong");
/// assert_eq!(msg.as_str(), "something went wrong");
/// ```
#[derive(Debug)]
pub struct ErrorMessage {
    inner: Cow<'static, str>,
}

impl ErrorMessage {
    /// Returns a new error message with the given string.
    #[must_use]
    pub fn new(msg: impl Into<ErrorMessage>) -> Self {
        msg.into()
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ErrorMessage {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self {
            inner: Cow::Borrowed(s),
        }
    }
}

impl From<Cow<'static, str>> for ErrorMessage {
    #[inline]
    fn from(s: Cow<'static, str>) -> Self {
        Self { inner: s }
    }
}

impl From<String> for ErrorMessage {
    #[inline]
    fn from(s: String) -> Self {
        Self {
            inner: Cow::Owned(s),
        }
    }
}
