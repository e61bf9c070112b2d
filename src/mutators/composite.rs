use super::*;
use crate::log;
use crate::{Binding, Error, Mutate, MutatorRef, Serialize, TypeName};
use std::fmt;
use std::sync::Arc;

/// One child position of a composite: its name and its mutator.
#[derive(Clone, Debug)]
pub struct Slot {
    name: Arc<str>,
    mutator: MutatorRef,
}

impl Slot {
    /// Create a new slot.
    pub fn new(name: impl Into<Arc<str>>, mutator: MutatorRef) -> Self {
        Self {
            name: name.into(),
            mutator,
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's mutator.
    pub fn mutator(&self) -> &MutatorRef {
        &self.mutator
    }
}

/// The mutator for composite values: a fixed list of child slots and a
/// binding that turns child values into the composite value and back.
///
/// See the [`composite()`] function to create new instances.
#[derive(Debug)]
pub struct Composite {
    type_name: TypeName,
    slots: Vec<Slot>,
    binding: Binding,
    weights: Vec<u32>,
    fixed_size: bool,
}

/// Create a new composite mutator.
///
/// Slots are given in construction order: parent fields first, then the
/// type's own.
///
/// # Example
///
/// ```
/// # fn foo() -> mutatype::Result<()> {
/// use mutatype::mutators::{self as m, Slot};
/// use mutatype::{Binding, IntKind, Session};
/// use std::sync::Arc;
///
/// let point = m::composite(
///     "Point",
///     vec![
///         Slot::new("x", Arc::new(m::integer(IntKind::Integer, None))),
///         Slot::new("y", Arc::new(m::integer(IntKind::Integer, None))),
///     ],
///     Binding::record("Point", 2),
/// );
/// assert_eq!(point.to_string(), "[Integer, Integer] -> Point");
///
/// let mut session = Session::new();
/// let p = session.init(&point)?;
/// let q = session.mutate(&point, &p)?;
/// assert_ne!(p, q);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn composite(type_name: impl Into<TypeName>, slots: Vec<Slot>, binding: Binding) -> Composite {
    // Variable-size children are picked twice as often.
    let weights = slots
        .iter()
        .map(|s| if s.mutator.has_fixed_size() { 1 } else { 2 })
        .collect();
    // A composite without fields encodes to nothing, so a list of them could
    // not recover its length without the count.
    let fixed_size = !slots.is_empty() && slots.iter().all(|s| s.mutator.has_fixed_size());
    Composite {
        type_name: type_name.into(),
        slots,
        binding,
        weights,
        fixed_size,
    }
}

impl Composite {
    /// The slots, in construction order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    fn children(&self, value: &Value) -> Result<Vec<Value>> {
        let children = self.binding.destruct(value)?;
        if children.len() != self.slots.len() {
            return Err(Error::mismatch(format!(
                "`{}` has {} fields but its binding produced {} values",
                self.type_name,
                self.slots.len(),
                children.len()
            )));
        }
        Ok(children)
    }

    fn read_with(&self, input: &mut dyn io::Read, exclusive: bool) -> Result<Value> {
        let last = self.slots.len().saturating_sub(1);
        let children = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                if exclusive && i == last {
                    slot.mutator.read_exclusive(input)
                } else {
                    slot.mutator.read(input)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.binding.construct(children)
    }

    fn write_with(&self, value: &Value, out: &mut dyn io::Write, exclusive: bool) -> Result<()> {
        let children = self.children(value)?;
        let last = self.slots.len().saturating_sub(1);
        for (i, (slot, child)) in self.slots.iter().zip(&children).enumerate() {
            if exclusive && i == last {
                slot.mutator.write_exclusive(child, out)?;
            } else {
                slot.mutator.write(child, out)?;
            }
        }
        Ok(())
    }
}

impl Mutate for Composite {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        let children = ctx.descend(|ctx| {
            self.slots
                .iter()
                .map(|slot| slot.mutator.init(ctx))
                .collect::<Result<Vec<_>>>()
        })?;
        self.binding.construct(children)
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let children = self.children(value)?;
        if self.slots.is_empty() {
            return Ok(value.clone());
        }

        // Retry with slots not tried yet, so a slot whose changes the binding
        // normalizes away does not eat every attempt.
        let mut untried = self.weights.clone();
        for _ in 0..ctx.config().max_mutation_attempts() {
            if untried.iter().all(|w| *w == 0) {
                untried = self.weights.clone();
            }
            let Some(i) = ctx.rng().choose_weighted(&untried) else {
                break;
            };
            untried[i] = 0;

            let child = ctx.descend(|ctx| self.slots[i].mutator.mutate(&children[i], ctx))?;
            let mut new_children = children.clone();
            new_children[i] = child;
            let candidate = self.binding.construct(new_children)?;
            if candidate != *value {
                return Ok(candidate);
            }
        }

        log::debug!(
            "`{}`: every mutation attempt left the value unchanged",
            self.type_name
        );
        Ok(value.clone())
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        let children = self
            .slots
            .iter()
            .zip(self.children(value)?)
            .map(|(slot, child)| slot.mutator.detach(&child))
            .collect::<Result<Vec<_>>>()?;
        self.binding.construct(children)
    }

    fn has_fixed_size(&self) -> bool {
        self.fixed_size
    }
}

impl Serialize for Composite {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, false)
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        self.write_with(value, out, false)
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, true)
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        self.write_with(value, out, true)
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", slot.mutator)?;
        }
        write!(f, "] -> {}", self.type_name)
    }
}
