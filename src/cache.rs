//! The per-factory mutator cache.
//!
//! Every mutator is built once per [`TypeKey`] and shared afterwards. Recursive
//! types are handled with placeholders: a key is marked as requested before
//! its mutator is built, and a request for that key from inside its own build
//! gets a [`Lazy`] placeholder that is bound to the real mutator once the
//! build finishes.

use crate::constraint::ConstraintChain;
use crate::log;
use crate::mutators::Lazy;
use crate::{MutatorRef, Result, Shape};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The identity of a built mutator: a shape, the position's declared
/// optionality, and the position's effective constraint chain.
///
/// Two requests with equal keys always get the same mutator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeKey {
    shape: Shape,
    nullable: bool,
    chain: ConstraintChain,
}

impl TypeKey {
    /// A declared optional position whose chain requires a value gets the
    /// same key as a non-optional one.
    pub(crate) fn new(shape: Shape, nullable: bool, chain: ConstraintChain) -> Self {
        Self {
            shape,
            nullable: nullable && !chain.is_not_null(),
            chain,
        }
    }

    /// The shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Can values at this position be absent? False whenever the chain
    /// requires a value, regardless of the declared optionality.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The effective constraints.
    pub fn chain(&self) -> &ConstraintChain {
        &self.chain
    }

    /// The same key for a position that requires a value.
    pub(crate) fn non_null(&self) -> TypeKey {
        TypeKey {
            shape: self.shape.clone(),
            nullable: false,
            chain: self.chain.clone(),
        }
    }

    /// The name mutators for this key print in signatures.
    pub(crate) fn signature(&self) -> String {
        if self.is_nullable() {
            format!("Nullable<{}>", self.shape)
        } else {
            self.shape.to_string()
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())?;
        if !self.chain.is_empty() {
            write!(f, " {}", self.chain)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum CacheEntry {
    /// The build has started, and no recursive request has been made yet.
    Requested,
    /// A recursive request was made during the build; it got this placeholder.
    UnderConstruction(Arc<Lazy>),
    /// Built.
    Ready(MutatorRef),
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<TypeKey, CacheEntry>,
    /// Keys added since the outermost build in progress started, in order.
    journal: Vec<TypeKey>,
}

/// A cache of built mutators, keyed by [`TypeKey`].
///
/// The lock is re-entrant and held for the whole of a build, so one thread
/// builds at a time and recursive requests from the building thread go
/// straight through.
#[derive(Debug, Default)]
pub(crate) struct MutatorCache {
    state: ReentrantMutex<RefCell<CacheState>>,
}

impl MutatorCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the mutator for `key`, building it with `build` if there is none
    /// yet.
    ///
    /// If `key` is already being built further up the stack, `build` is not
    /// called and a placeholder for the eventual mutator is returned instead.
    ///
    /// If `build` fails, every entry added since the outermost build started
    /// is removed again, since any of them may refer to a placeholder that
    /// will now never be bound.
    pub(crate) fn get_or_build(
        &self,
        key: &TypeKey,
        build: impl FnOnce() -> Result<MutatorRef>,
    ) -> Result<MutatorRef> {
        let guard = self.state.lock();

        let mark = {
            let mut state = guard.borrow_mut();
            match state.entries.get_mut(key) {
                Some(CacheEntry::Ready(mutator)) => {
                    log::trace!("cache hit for `{key}`");
                    return Ok(mutator.clone());
                }
                Some(CacheEntry::UnderConstruction(lazy)) => {
                    let lazy: MutatorRef = lazy.clone();
                    return Ok(lazy);
                }
                Some(entry @ CacheEntry::Requested) => {
                    log::debug!("`{key}` is recursive; installing a placeholder");
                    let lazy = Arc::new(Lazy::new(key.signature()));
                    *entry = CacheEntry::UnderConstruction(lazy.clone());
                    let lazy: MutatorRef = lazy;
                    return Ok(lazy);
                }
                None => {
                    state.entries.insert(key.clone(), CacheEntry::Requested);
                    state.journal.push(key.clone());
                    state.journal.len() - 1
                }
            }
        };

        let result = build().and_then(|mutator| {
            let state = guard.borrow();
            if let Some(CacheEntry::UnderConstruction(lazy)) = state.entries.get(key) {
                lazy.bind(mutator.clone())?;
            }
            Ok(mutator)
        });

        let mut state = guard.borrow_mut();
        match result {
            Ok(mutator) => {
                state
                    .entries
                    .insert(key.clone(), CacheEntry::Ready(mutator.clone()));
                if mark == 0 {
                    state.journal.clear();
                }
                Ok(mutator)
            }
            Err(e) => {
                let doomed = state.journal.split_off(mark);
                log::warn!(
                    "failed to build a mutator for `{key}`, discarding {} cache entries: {e}",
                    doomed.len()
                );
                for key in &doomed {
                    state.entries.remove(key);
                }
                Err(e)
            }
        }
    }

    #[cfg(test)]
    fn is_ready(&self, key: &TypeKey) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        matches!(state.entries.get(key), Some(CacheEntry::Ready(_)))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutators;
    use crate::{Error, IntKind, Session, Value};
    use std::cell::Cell;

    fn key(shape: Shape) -> TypeKey {
        TypeKey::new(shape, false, ConstraintChain::default())
    }

    fn boolean() -> MutatorRef {
        Arc::new(mutators::boolean())
    }

    #[test]
    fn builds_each_key_once() {
        let cache = MutatorCache::new();
        let k = key(Shape::Boolean);
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Ok(boolean())
        };
        let a = cache.get_or_build(&k, build).unwrap();
        let b = cache.get_or_build(&k, || unreachable!()).unwrap();
        assert_eq!(builds.get(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.is_ready(&k));
    }

    #[test]
    fn recursive_requests_get_a_bound_placeholder() {
        let cache = MutatorCache::new();
        let k = key(Shape::Boolean);
        let mut placeholder = None;
        let built = cache
            .get_or_build(&k, || {
                let p = cache.get_or_build(&k, || unreachable!())?;
                let again = cache.get_or_build(&k, || unreachable!())?;
                assert!(Arc::ptr_eq(&p, &again));

                // Not usable until the build finishes.
                assert!(p.detach(&Value::Bool(true)).is_err());
                placeholder = Some(p);
                Ok(boolean())
            })
            .unwrap();

        let placeholder = placeholder.unwrap();
        assert!(!Arc::ptr_eq(&placeholder, &built));
        assert_eq!(placeholder.to_string(), "Boolean");

        let mut session = Session::new();
        let v = placeholder.init(session.context()).unwrap();
        assert!(v.as_bool().is_ok());
        assert_eq!(placeholder.detach(&Value::Bool(true)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn failed_builds_leave_nothing_behind() {
        let cache = MutatorCache::new();
        let outer = key(Shape::Named("Outer".into()));
        let inner = key(Shape::Integer(IntKind::Long));

        let err = cache
            .get_or_build(&outer, || {
                cache.get_or_build(&inner, || {
                    Ok(Arc::new(mutators::integer(IntKind::Long, None)) as MutatorRef)
                })?;
                cache.get_or_build(&outer, || unreachable!())?;
                Err(Error::unsupported_type("nope"))
            })
            .unwrap_err();

        assert!(err.is_unsupported_type());
        assert_eq!(cache.len(), 0);
        assert!(!cache.is_ready(&inner));

        // A later build of the same key starts from scratch.
        let builds = Cell::new(0);
        cache
            .get_or_build(&outer, || {
                builds.set(builds.get() + 1);
                Ok(boolean())
            })
            .unwrap();
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn nested_failures_keep_earlier_siblings() {
        let cache = MutatorCache::new();
        let outer = key(Shape::Named("Outer".into()));
        let first = key(Shape::Boolean);
        let second = key(Shape::String);

        cache
            .get_or_build(&outer, || {
                cache.get_or_build(&first, || Ok(boolean()))?;
                let failed = cache.get_or_build(&second, || Err(Error::other("boom")));
                assert!(failed.is_err());
                Ok(boolean())
            })
            .unwrap();

        assert!(cache.is_ready(&outer));
        assert!(cache.is_ready(&first));
        assert!(!cache.is_ready(&second));
    }

    #[test]
    fn key_display_includes_constraints() {
        let chain = crate::constraint::resolve(
            &[],
            &[],
            &[crate::Constraint::in_range(1, 2)],
            &Shape::Integer(IntKind::Integer),
        )
        .unwrap();
        let k = TypeKey::new(Shape::Integer(IntKind::Integer), true, chain);
        assert!(k.is_nullable());
        assert_eq!(k.to_string(), "Nullable<Integer> @in_range(1, 2)");
        assert_eq!(k.non_null().signature(), "Integer");
    }

    #[test]
    fn required_positions_are_never_nullable() {
        let chain = crate::constraint::resolve(
            &[],
            &[],
            &[crate::Constraint::not_null()],
            &Shape::Boolean,
        )
        .unwrap();
        let declared = TypeKey::new(Shape::Boolean, true, chain.clone());
        let plain = TypeKey::new(Shape::Boolean, false, chain);
        assert!(!declared.is_nullable());
        assert_eq!(declared, plain);
    }
}
