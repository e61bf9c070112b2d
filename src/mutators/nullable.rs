use super::*;
use crate::{Mutate, MutatorRef, Serialize};
use std::fmt;

/// The mutator for optional positions: either [`Value::Null`] or a value of
/// the inner mutator.
///
/// See the [`nullable()`] function to create new instances.
#[derive(Debug)]
pub struct Nullable {
    inner: MutatorRef,
}

/// Create a mutator for values that may be absent.
///
/// Absent values get more likely the deeper the position is nested, and at
/// the depth cutoff `init` always returns [`Value::Null`]. This is what stops
/// generation of recursive types.
pub fn nullable(inner: MutatorRef) -> Nullable {
    Nullable { inner }
}

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

impl Mutate for Nullable {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        if ctx.at_depth_limit() {
            return Ok(Value::Null);
        }
        let levels_left = (ctx.config().max_depth() - ctx.depth()).max(1);
        if ctx.rng().gen_index(levels_left as usize + 1) == Some(0) {
            return Ok(Value::Null);
        }
        self.inner.init(ctx)
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        match value {
            Value::Null => self.inner.init(ctx),
            _ if ctx.rng().one_in(16) => Ok(Value::Null),
            _ => self.inner.mutate(value, ctx),
        }
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            _ => self.inner.detach(value),
        }
    }

    fn has_fixed_size(&self) -> bool {
        false
    }
}

impl Nullable {
    fn read_with(
        &self,
        input: &mut dyn io::Read,
        read: impl FnOnce(&mut dyn io::Read) -> Result<Value>,
    ) -> Result<Value> {
        match read_array(input)? {
            [ABSENT] => Ok(Value::Null),
            [PRESENT] => read(input),
            [tag] => Err(crate::Error::corrupted(format!(
                "invalid presence tag {tag:#04x}"
            ))),
        }
    }
}

impl Serialize for Nullable {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, |input| self.inner.read(input))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        match value {
            Value::Null => Ok(out.write_all(&[ABSENT])?),
            _ => {
                out.write_all(&[PRESENT])?;
                self.inner.write(value, out)
            }
        }
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.read_with(input, |input| self.inner.read_exclusive(input))
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        match value {
            Value::Null => Ok(out.write_all(&[ABSENT])?),
            _ => {
                out.write_all(&[PRESENT])?;
                self.inner.write_exclusive(value, out)
            }
        }
    }
}

impl fmt::Display for Nullable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullable<{}>", self.inner)
    }
}
