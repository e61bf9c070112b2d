use super::*;
use crate::{Error, Mutate, MutatorRef, Serialize, TypeName};
use std::fmt;

/// One alternative of a sum type.
#[derive(Clone, Debug)]
pub struct Alternative {
    mutator: MutatorRef,
    terminal: bool,
}

impl Alternative {
    /// Create a new alternative.
    ///
    /// `terminal` alternatives have values shallower than the sum's own
    /// shallowest value, such as one that does not recurse or one whose
    /// recursion can stop at an absent or empty position. Only those are
    /// chosen once generation reaches the depth cutoff.
    pub fn new(mutator: MutatorRef, terminal: bool) -> Self {
        Self { mutator, terminal }
    }

    /// The alternative's mutator.
    pub fn mutator(&self) -> &MutatorRef {
        &self.mutator
    }

    /// Can this alternative be chosen at the depth cutoff?
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// The mutator for sum values: one of several alternatives.
///
/// See the [`sum()`] function to create new instances.
#[derive(Debug)]
pub struct Sum {
    type_name: TypeName,
    alternatives: Vec<Alternative>,
}

/// Create a new sum mutator.
///
/// At least one alternative should be terminal, or generation of deeply
/// nested values falls back to choosing among all of them.
pub fn sum(type_name: impl Into<TypeName>, alternatives: Vec<Alternative>) -> Sum {
    Sum {
        type_name: type_name.into(),
        alternatives,
    }
}

impl Sum {
    fn variant<'a>(&'a self, value: &'a Value) -> Result<(usize, &'a Alternative, &'a Value)> {
        let variant = value.as_variant()?;
        if variant.type_name() != &*self.type_name {
            return Err(Error::mismatch(format!(
                "expected a `{}` value, found a `{}` value",
                self.type_name,
                variant.type_name()
            )));
        }
        let index = variant.index() as usize;
        let alternative = self.alternatives.get(index).ok_or_else(|| {
            Error::mismatch(format!(
                "`{}` has no alternative {index}",
                self.type_name
            ))
        })?;
        Ok((index, alternative, variant.value()))
    }

    fn wrap(&self, index: usize, value: Value) -> Value {
        // There are never more alternatives than fit in the `u32` index
        // `read` accepts.
        Value::variant(self.type_name.clone(), index as u32, value)
    }

    fn read_with(
        &self,
        input: &mut dyn io::Read,
        read: impl FnOnce(&Alternative, &mut dyn io::Read) -> Result<Value>,
    ) -> Result<Value> {
        let index = read_u32(input)? as usize;
        let alternative = self.alternatives.get(index).ok_or_else(|| {
            Error::corrupted(format!(
                "`{}` has no alternative {index}",
                self.type_name
            ))
        })?;
        let value = read(alternative, input)?;
        Ok(self.wrap(index, value))
    }
}

impl Mutate for Sum {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        let mut choices: Vec<usize> = if ctx.at_depth_limit() {
            (0..self.alternatives.len())
                .filter(|i| self.alternatives[*i].terminal)
                .collect()
        } else {
            vec![]
        };
        if choices.is_empty() {
            choices = (0..self.alternatives.len()).collect();
        }
        let index = ctx.rng().choose(choices).ok_or_else(|| {
            Error::unsupported_type(format!("`{}` has no alternatives", self.type_name))
        })?;
        let value = ctx.descend(|ctx| self.alternatives[index].mutator.init(ctx))?;
        Ok(self.wrap(index, value))
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let (index, alternative, inner) = self.variant(value)?;
        let len = self.alternatives.len();

        if len == 1 || !ctx.rng().one_in(4) {
            let mutated = ctx.descend(|ctx| alternative.mutator.mutate(inner, ctx))?;
            if len == 1 || mutated != *inner {
                return Ok(self.wrap(index, mutated));
            }
        }

        // Any alternative but the current one.
        let mut other = ctx.rng().gen_index(len - 1).unwrap_or(0);
        if other >= index {
            other += 1;
        }
        let value = ctx.descend(|ctx| self.alternatives[other].mutator.init(ctx))?;
        Ok(self.wrap(other, value))
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        let (index, alternative, inner) = self.variant(value)?;
        Ok(self.wrap(index, alternative.mutator.detach(inner)?))
    }

    fn has_fixed_size(&self) -> bool {
        false
    }
}

impl Serialize for Sum {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, |alternative, input| alternative.mutator.read(input))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let (index, alternative, inner) = self.variant(value)?;
        write_len(out, index)?;
        alternative.mutator.write(inner, out)
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, |alternative, input| {
            alternative.mutator.read_exclusive(input)
        })
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let (index, alternative, inner) = self.variant(value)?;
        write_len(out, index)?;
        alternative.mutator.write_exclusive(inner, out)
    }
}

impl fmt::Display for Sum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", alternative.mutator)?;
        }
        write!(f, ") -> {}", self.type_name)
    }
}
