//! Turning annotated types into mutators.

use crate::cache::{MutatorCache, TypeKey};
use crate::constraint::{self, Constraint};
use crate::log;
use crate::mutators::{self as m, Alternative, Slot};
use crate::types::{CompositeDesc, Construction, SumDesc, TypeDef, TypeRegistry};
use crate::{
    AnnotatedType, Binding, Error, MutatorRef, Reflect, Result, Shape, TypedMutator,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Builds and caches mutators for annotated types.
///
/// A factory owns a [`TypeRegistry`] of named composite and sum types and a
/// cache of every mutator it has built. Asking twice for the same type (with
/// the same constraints) returns the same mutator.
///
/// Factories are thread safe, but a fuzzing campaign usually gives each worker
/// its own.
///
/// # Example
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::{AnnotatedType, CompositeDesc, Factory};
///
/// let factory = Factory::new();
/// let simple = factory.define(
///     CompositeDesc::new("SimpleClass")
///         .field("foo", AnnotatedType::string().nullable())
///         .field(
///             "bar",
///             AnnotatedType::list_of(AnnotatedType::integer().nullable()).nullable(),
///         )
///         .field("baz", AnnotatedType::boolean()),
/// )?;
///
/// let mutator = factory.resolve(&simple)?;
/// assert_eq!(
///     mutator.to_string(),
///     "[Nullable<String>, Nullable<List<Nullable<Integer>>>, Boolean] -> SimpleClass",
/// );
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Factory {
    registry: RwLock<TypeRegistry>,
    cache: MutatorCache,
}

/// What a type needs from its children to have a finite value.
enum Needs {
    /// Nothing: it has one of its own, such as an absent or empty one.
    Nothing,
    /// Every child has a finite value.
    All,
    /// At least one child has a finite value.
    Any,
}

/// A type reachable from the type being resolved, and the types its mutator
/// is built from.
struct Position {
    key: TypeKey,
    children: Vec<TypeKey>,
    needs: Needs,
}

/// For every type reachable from the type being resolved, the number of
/// levels its shallowest value needs.
///
/// Past the depth cutoff, generation only ever moves to strictly lower
/// heights.
struct Heights(HashMap<TypeKey, u32>);

impl Heights {
    fn is_below(&self, a: &TypeKey, b: &TypeKey) -> bool {
        matches!((self.0.get(a), self.0.get(b)), (Some(a), Some(b)) if a < b)
    }
}

fn infinitely_nested(key: &TypeKey) -> Error {
    Error::unsupported_type(format!(
        "`{key}` is infinitely nested: it contains itself through positions that can \
         never be absent or empty"
    ))
}

fn undefined(name: &str) -> Error {
    Error::unsupported_type(format!("no type named `{name}` is defined"))
}

fn unconstructible(desc: &CompositeDesc) -> Error {
    Error::unsupported_type(format!("`{}` has no way to be constructed", desc.name()))
}

fn no_alternatives(desc: &SumDesc) -> Error {
    Error::unsupported_type(format!("`{}` has no alternatives", desc.name()))
}

impl Factory {
    /// Create a new factory with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new factory over the given registry.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            cache: MutatorCache::new(),
        }
    }

    /// Register a composite or sum type definition.
    ///
    /// Returns a reference to the newly defined type.
    pub fn define(&self, def: impl Into<TypeDef>) -> Result<AnnotatedType> {
        self.registry.write().insert(def)
    }

    /// Get the mutator for `ty`, building it and its children if needed.
    ///
    /// Fails with an [unsupported type][Error::is_unsupported_type] error when
    /// `ty` refers to an unknown or unconstructible type, or when a recursive
    /// type has no finite values. Fails with an [invalid
    /// constraint][Error::is_invalid_constraint] error when `ty`'s constraints
    /// contradict each other or annotate a position they cannot apply to.
    pub fn resolve(&self, ty: &AnnotatedType) -> Result<MutatorRef> {
        log::debug!("resolving a mutator for `{ty}`");
        let key = self.key_for(ty, &[])?;
        let heights = self.measure(&key)?;
        self.resolve_key(key, &heights)
    }

    /// Get the mutator for the Rust type `T`.
    ///
    /// # Example
    ///
    /// ```
    /// # fn foo() -> mutatype::Result<()> {
    /// use mutatype::{Factory, Session};
    ///
    /// let factory = Factory::new();
    /// let mutator = factory.typed::<Vec<Option<i16>>>()?;
    /// assert_eq!(mutator.to_string(), "List<Nullable<Short>>");
    ///
    /// let mut session = Session::new();
    /// let v: Vec<Option<i16>> = mutator.init(session.context())?;
    /// let w = mutator.mutate(&v, session.context())?;
    /// assert_ne!(v, w);
    /// # Ok(())
    /// # }
    /// # foo().unwrap();
    /// ```
    pub fn typed<T: Reflect>(&self) -> Result<TypedMutator<T>> {
        self.typed_with::<T>(&[])
    }

    /// Get the mutator for the Rust type `T`, with additional constraints on
    /// the top-level position.
    pub fn typed_with<T: Reflect>(&self, constraints: &[Constraint]) -> Result<TypedMutator<T>> {
        let ty = {
            let mut registry = self.registry.write();
            T::describe(&mut registry)?
        };
        let ty = constraints.iter().fold(ty, |ty, c| ty.with(*c));
        Ok(TypedMutator::new(self.resolve(&ty)?))
    }

    fn definition(&self, name: &str) -> Option<TypeDef> {
        self.registry.read().get(name).cloned()
    }

    fn key_for(&self, ty: &AnnotatedType, inherited: &[Constraint]) -> Result<TypeKey> {
        let declared = match ty.shape() {
            Shape::Named(name) => self
                .definition(name)
                .map(|def| def.constraints().to_vec())
                .unwrap_or_default(),
            _ => vec![],
        };
        let chain = constraint::resolve(inherited, &declared, ty.constraints(), ty.shape())?;
        Ok(TypeKey::new(ty.shape().clone(), ty.is_nullable(), chain))
    }

    fn resolve_key(&self, key: TypeKey, heights: &Heights) -> Result<MutatorRef> {
        self.cache.get_or_build(&key, || self.build(&key, heights))
    }

    /// The children of `key`'s mutator, and what `key` needs from them.
    fn position(&self, key: TypeKey) -> Result<Position> {
        if key.is_nullable() {
            return Ok(Position {
                children: vec![key.non_null()],
                key,
                needs: Needs::Nothing,
            });
        }

        let chain = key.chain();
        let (children, needs) = match key.shape() {
            Shape::Boolean | Shape::Integer(_) | Shape::Float(_) | Shape::String => {
                (vec![], Needs::Nothing)
            }
            Shape::List(element) => {
                let element = self.key_for(element, &chain.inherited())?;
                let may_be_empty = chain.length().map_or(true, |(min, _)| min == 0);
                let needs = if may_be_empty { Needs::Nothing } else { Needs::All };
                (vec![element], needs)
            }
            Shape::Named(name) => match self.definition(name) {
                Some(TypeDef::Composite(desc)) => {
                    if let Construction::Unavailable = desc.construction_kind() {
                        return Err(unconstructible(&desc));
                    }
                    let inherited = chain.inherited();
                    let mut children = vec![];
                    for ancestor in &self.lineage(&desc)? {
                        for field in ancestor.fields() {
                            children.push(self.key_for(field.ty(), &inherited)?);
                        }
                    }
                    (children, Needs::All)
                }
                Some(TypeDef::Sum(desc)) => {
                    if desc.alternatives().is_empty() {
                        return Err(no_alternatives(&desc));
                    }
                    let inherited = chain.inherited();
                    let children = desc
                        .alternatives()
                        .iter()
                        .map(|ty| self.key_for(ty, &inherited))
                        .collect::<Result<Vec<_>>>()?;
                    (children, Needs::Any)
                }
                None => return Err(undefined(name)),
            },
        };
        Ok(Position {
            key,
            children,
            needs,
        })
    }

    /// Find the height of every type reachable from `root`, failing if any of
    /// them has no finite values.
    fn measure(&self, root: &TypeKey) -> Result<Heights> {
        let mut positions = vec![];
        let mut seen = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(key) = queue.pop_front() {
            let position = self.position(key)?;
            for child in &position.children {
                if seen.insert(child.clone()) {
                    queue.push_back(child.clone());
                }
            }
            positions.push(position);
        }

        let mut heights = HashMap::new();
        for height in 0u32.. {
            let finite: Vec<TypeKey> = positions
                .iter()
                .filter(|p| !heights.contains_key(&p.key))
                .filter(|p| match p.needs {
                    Needs::Nothing => true,
                    Needs::All => p.children.iter().all(|c| heights.contains_key(c)),
                    Needs::Any => p.children.iter().any(|c| heights.contains_key(c)),
                })
                .map(|p| p.key.clone())
                .collect();
            if finite.is_empty() {
                break;
            }
            heights.extend(finite.into_iter().map(|key| (key, height)));
        }

        match positions.iter().find(|p| !heights.contains_key(&p.key)) {
            Some(p) => Err(infinitely_nested(&p.key)),
            None => Ok(Heights(heights)),
        }
    }

    fn build(&self, key: &TypeKey, heights: &Heights) -> Result<MutatorRef> {
        log::trace!("building a mutator for `{key}`");
        if key.is_nullable() {
            let inner = self.resolve_key(key.non_null(), heights)?;
            return Ok(Arc::new(m::nullable(inner)));
        }

        let chain = key.chain();
        match key.shape() {
            Shape::Boolean => Ok(Arc::new(m::boolean())),
            Shape::Integer(kind) => Ok(Arc::new(m::integer(*kind, chain.range()))),
            Shape::Float(kind) => Ok(Arc::new(m::float(*kind))),
            Shape::String => Ok(Arc::new(m::string(chain.length()))),
            Shape::List(element) => {
                let element = self.key_for(element, &chain.inherited())?;
                let element = self.resolve_key(element, heights)?;
                Ok(Arc::new(m::list(element, chain.length())))
            }
            Shape::Named(name) => match self.definition(name) {
                Some(TypeDef::Composite(desc)) => self.build_composite(&desc, key, heights),
                Some(TypeDef::Sum(desc)) => self.build_sum(&desc, key, heights),
                None => Err(undefined(name)),
            },
        }
    }

    /// The composite and its ancestors, furthest ancestor first.
    fn lineage(&self, desc: &Arc<CompositeDesc>) -> Result<Vec<Arc<CompositeDesc>>> {
        let mut lineage = vec![desc.clone()];
        let mut seen = HashSet::from([desc.name().clone()]);
        let mut current = desc.clone();
        while let Some(parent) = current.parent() {
            if !seen.insert(parent.clone()) {
                return Err(Error::unsupported_type(format!(
                    "`{}` inherits from itself through `{parent}`",
                    desc.name()
                )));
            }
            current = match self.definition(parent) {
                Some(TypeDef::Composite(p)) => p,
                Some(TypeDef::Sum(_)) => {
                    return Err(Error::unsupported_type(format!(
                        "`{}` cannot extend `{parent}`, which is not a composite type",
                        current.name()
                    )))
                }
                None => {
                    return Err(Error::unsupported_type(format!(
                        "`{}` extends `{parent}`, which is not defined",
                        current.name()
                    )))
                }
            };
            lineage.push(current.clone());
        }
        lineage.reverse();
        Ok(lineage)
    }

    fn build_composite(
        &self,
        desc: &Arc<CompositeDesc>,
        key: &TypeKey,
        heights: &Heights,
    ) -> Result<MutatorRef> {
        let lineage = self.lineage(desc)?;
        let inherited = key.chain().inherited();

        let mut slots = vec![];
        for ancestor in &lineage {
            for field in ancestor.fields() {
                let child = self.key_for(field.ty(), &inherited)?;
                let mutator = self.resolve_key(child, heights)?;
                slots.push(Slot::new(field.name().clone(), mutator));
            }
        }

        let binding = match desc.construction_kind() {
            Construction::Record => Binding::record(desc.name().clone(), slots.len()),
            Construction::Custom(binding) => binding.clone(),
            Construction::Unavailable => return Err(unconstructible(desc)),
        };

        Ok(Arc::new(m::composite(desc.name().clone(), slots, binding)))
    }

    /// Alternatives that are shallower than the sum itself are terminal: the
    /// sum can always stop recursing by picking one of them.
    fn build_sum(
        &self,
        desc: &Arc<SumDesc>,
        key: &TypeKey,
        heights: &Heights,
    ) -> Result<MutatorRef> {
        if desc.alternatives().is_empty() {
            return Err(no_alternatives(desc));
        }
        let inherited = key.chain().inherited();

        let mut alternatives = vec![];
        for ty in desc.alternatives() {
            let child = self.key_for(ty, &inherited)?;
            let terminal = heights.is_below(&child, key);
            let mutator = self.resolve_key(child, heights)?;
            alternatives.push(Alternative::new(mutator, terminal));
        }

        Ok(Arc::new(m::sum(desc.name().clone(), alternatives)))
    }
}
