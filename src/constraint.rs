//! Structural constraints and how they propagate through a type tree.
//!
//! A [`Constraint`] annotates a position: the position must not be absent,
//! integers must fall in a range, or containers must have a bounded length.
//! By default a constraint applies only to the position it annotates. A
//! [`recursive`][Constraint::recursive] constraint also applies to every
//! position reachable from it: the fields of a composite, the elements of a
//! list, the alternatives of a sum, and so on all the way down.

use crate::{Error, Result, Shape};
use std::fmt;
use std::sync::Arc;

/// What a constraint requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// The position must hold a value; optional positions lose their
    /// optionality.
    NotNull,
    /// Integers must lie in `min..=max`.
    InRange {
        /// Smallest allowed value.
        min: i64,
        /// Largest allowed value.
        max: i64,
    },
    /// Strings (in bytes) and lists (in elements) must have a length in
    /// `min..=max`.
    WithLength {
        /// Shortest allowed length.
        min: usize,
        /// Longest allowed length.
        max: usize,
    },
}

/// How far a constraint reaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConstraintMode {
    /// Only the annotated position.
    #[default]
    Default,
    /// The annotated position and every position beneath it.
    Recursive,
}

/// A constraint annotation.
///
/// # Example
///
/// ```
/// use mutatype::{AnnotatedType, Constraint};
///
/// // A non-null list of non-null lists of integers between 0 and 100.
/// let ty = AnnotatedType::list_of(AnnotatedType::list_of(AnnotatedType::integer().nullable()))
///     .nullable()
///     .with(Constraint::not_null().recursive())
///     .with(Constraint::in_range(0, 100).recursive());
/// # let _ = ty;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Constraint {
    kind: ConstraintKind,
    mode: ConstraintMode,
}

impl Constraint {
    /// The position must not be absent.
    pub fn not_null() -> Self {
        Self::from(ConstraintKind::NotNull)
    }

    /// Integers must lie in `min..=max`.
    pub fn in_range(min: i64, max: i64) -> Self {
        Self::from(ConstraintKind::InRange { min, max })
    }

    /// Strings and lists must have a length in `min..=max`.
    pub fn with_length(min: usize, max: usize) -> Self {
        Self::from(ConstraintKind::WithLength { min, max })
    }

    /// Make this constraint apply to every position beneath the annotated one
    /// as well.
    pub fn recursive(mut self) -> Self {
        self.mode = ConstraintMode::Recursive;
        self
    }

    /// What this constraint requires.
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// How far this constraint reaches.
    pub fn mode(&self) -> ConstraintMode {
        self.mode
    }

    /// Does this constraint cascade into descendants?
    pub fn is_recursive(&self) -> bool {
        self.mode == ConstraintMode::Recursive
    }

    fn applies_to(&self, shape: &Shape) -> bool {
        match self.kind {
            ConstraintKind::NotNull => true,
            ConstraintKind::InRange { .. } => matches!(shape, Shape::Integer(_)),
            ConstraintKind::WithLength { .. } => matches!(shape, Shape::String | Shape::List(_)),
        }
    }
}

impl From<ConstraintKind> for Constraint {
    fn from(kind: ConstraintKind) -> Self {
        Self {
            kind,
            mode: ConstraintMode::Default,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConstraintKind::NotNull => f.write_str("not_null")?,
            ConstraintKind::InRange { min, max } => write!(f, "in_range({min}, {max})")?,
            ConstraintKind::WithLength { min, max } => write!(f, "with_length({min}, {max})")?,
        }
        if self.is_recursive() {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// The effective, ordered constraints on one position.
///
/// Built by [`resolve`]. Immutable once built; cloning shares the underlying
/// list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConstraintChain {
    constraints: Arc<[Constraint]>,
}

impl ConstraintChain {
    /// The constraints, inherited first and the point of use last.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Constraint> + ExactSizeIterator + '_ {
        self.constraints.iter()
    }

    /// Is the chain empty?
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Does the chain forbid absent values?
    pub fn is_not_null(&self) -> bool {
        self.iter().any(|c| c.kind == ConstraintKind::NotNull)
    }

    /// The effective integer range, if any. The most specific one wins.
    pub fn range(&self) -> Option<(i64, i64)> {
        self.iter().rev().find_map(|c| match c.kind {
            ConstraintKind::InRange { min, max } => Some((min, max)),
            _ => None,
        })
    }

    /// The effective length bounds, if any. The most specific one wins.
    pub fn length(&self) -> Option<(usize, usize)> {
        self.iter().rev().find_map(|c| match c.kind {
            ConstraintKind::WithLength { min, max } => Some((min, max)),
            _ => None,
        })
    }

    /// The constraints that every position beneath this one inherits.
    pub fn inherited(&self) -> Vec<Constraint> {
        self.iter().filter(|c| c.is_recursive()).copied().collect()
    }
}

impl fmt::Display for ConstraintChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "@{c}")?;
        }
        Ok(())
    }
}

/// Compute the effective constraint chain for a position of the given shape.
///
/// * `inherited` are the recursive constraints of the enclosing positions.
///   They are kept only where they apply, so an inherited integer range
///   silently skips string positions.
///
/// * `declared` are the constraints declared on the type itself and `at_use`
///   those annotated on this particular position. These are validated: an
///   explicit default-mode constraint that cannot apply to `shape` is an
///   error. Recursive ones are kept for their descendants even when they do
///   not apply to `shape` itself.
///
/// Integer ranges are intersected with the bounds of the integer kind.
/// Exact duplicates are dropped.
pub fn resolve(
    inherited: &[Constraint],
    declared: &[Constraint],
    at_use: &[Constraint],
    shape: &Shape,
) -> Result<ConstraintChain> {
    let mut chain: Vec<Constraint> = vec![];
    let mut explicit_range = None;
    let mut explicit_length = None;

    for c in inherited {
        if !c.applies_to(shape) {
            if c.is_recursive() {
                push_unique(&mut chain, *c);
            }
            continue;
        }
        push_unique(&mut chain, normalize(*c, shape)?);
    }

    for c in declared.iter().chain(at_use) {
        if !c.applies_to(shape) {
            if c.is_recursive() {
                validate_bounds(c)?;
                push_unique(&mut chain, *c);
                continue;
            }
            return Err(Error::invalid_constraint(format!(
                "`{c}` cannot be applied to `{shape}`"
            )));
        }
        let c = normalize(*c, shape)?;
        match c.kind {
            ConstraintKind::InRange { min, max } => {
                check_conflict(&mut explicit_range, (min, max), &c, shape)?
            }
            ConstraintKind::WithLength { min, max } => {
                check_conflict(&mut explicit_length, (min, max), &c, shape)?
            }
            ConstraintKind::NotNull => {}
        }
        push_unique(&mut chain, c);
    }

    Ok(ConstraintChain {
        constraints: chain.into(),
    })
}

fn push_unique(chain: &mut Vec<Constraint>, c: Constraint) {
    if !chain.contains(&c) {
        chain.push(c);
    }
}

fn check_conflict<T: PartialEq>(
    seen: &mut Option<T>,
    bounds: T,
    c: &Constraint,
    shape: &Shape,
) -> Result<()> {
    match seen {
        Some(prev) if *prev != bounds => Err(Error::invalid_constraint(format!(
            "`{c}` conflicts with another explicit bound on `{shape}`"
        ))),
        _ => {
            *seen = Some(bounds);
            Ok(())
        }
    }
}

fn validate_bounds(c: &Constraint) -> Result<()> {
    let ok = match c.kind {
        ConstraintKind::NotNull => true,
        ConstraintKind::InRange { min, max } => min <= max,
        ConstraintKind::WithLength { min, max } => min <= max,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::invalid_constraint(format!(
            "`{c}` has a minimum greater than its maximum"
        )))
    }
}

/// Validate bounds and clamp integer ranges to the integer kind.
fn normalize(c: Constraint, shape: &Shape) -> Result<Constraint> {
    validate_bounds(&c)?;
    match (c.kind, shape) {
        (ConstraintKind::InRange { min, max }, Shape::Integer(kind)) => {
            let lo = min.max(kind.min());
            let hi = max.min(kind.max());
            if lo > hi {
                return Err(Error::invalid_constraint(format!(
                    "`{c}` is disjoint from the values of `{shape}`"
                )));
            }
            Ok(Constraint {
                kind: ConstraintKind::InRange { min: lo, max: hi },
                mode: c.mode,
            })
        }
        _ => Ok(c),
    }
}
