use super::*;
use crate::{Mutate, MutatorRef, Serialize};
use std::fmt;

/// The mutator for `List<T>` values.
///
/// See the [`list()`] function to create new instances.
#[derive(Debug)]
pub struct List {
    element: MutatorRef,
    min: usize,
    max: usize,
}

/// Create a new list mutator over the given element mutator.
///
/// Without `length` bounds, lists have at most
/// [`DEFAULT_MAX_LEN`][crate::DEFAULT_MAX_LEN] elements.
pub fn list(element: MutatorRef, length: Option<(usize, usize)>) -> List {
    let (min, max) = length_bounds(length);
    List {
        element,
        min,
        max: max.max(min),
    }
}

enum Edit {
    Insert,
    Remove,
    Mutate,
    Swap,
}

impl List {
    fn check_len(&self, len: usize) -> Result<()> {
        if len < self.min || len > self.max {
            return Err(crate::Error::corrupted(format!(
                "list of {len} elements is outside of the allowed length {}..={}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn apply(&self, edit: Edit, elements: &[Value], ctx: &mut Context) -> Result<Option<Vec<Value>>> {
        let len = elements.len();
        let mut out = elements.to_vec();
        match edit {
            Edit::Insert if len < self.max => {
                let at = ctx.rng().gen_index(len + 1).unwrap_or(len);
                let element = self.element.init(ctx)?;
                out.insert(at, element);
            }
            Edit::Remove if len > self.min => {
                let Some(at) = ctx.rng().gen_index(len) else {
                    return Ok(None);
                };
                out.remove(at);
            }
            Edit::Mutate if len > 0 => {
                let Some(at) = ctx.rng().gen_index(len) else {
                    return Ok(None);
                };
                out[at] = self.element.mutate(&elements[at], ctx)?;
            }
            Edit::Swap if len > 1 => {
                let (Some(a), Some(b)) = (ctx.rng().gen_index(len), ctx.rng().gen_index(len)) else {
                    return Ok(None);
                };
                out.swap(a, b);
            }
            _ => return Ok(None),
        }
        Ok(Some(out))
    }
}

impl Mutate for List {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        let cap = init_len_cap(ctx, self.min, self.max);
        let len = ctx.rng().gen_len(self.min, cap);
        let elements = (0..len)
            .map(|_| self.element.init(ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::list(elements))
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        let elements = value.as_list()?;
        let mutated = until_changed(ctx, &elements.to_vec(), "list", |ctx| {
            let edit = match ctx.rng().gen_index(4) {
                Some(0) => Edit::Insert,
                Some(1) => Edit::Remove,
                Some(2) => Edit::Mutate,
                _ => Edit::Swap,
            };
            Ok(self
                .apply(edit, elements, ctx)?
                .unwrap_or_else(|| elements.to_vec()))
        })?;

        if let Some(elements) = mutated {
            return Ok(Value::list(elements));
        }
        for edit in [Edit::Mutate, Edit::Insert, Edit::Remove] {
            if let Some(new) = self.apply(edit, elements, ctx)? {
                if new != elements {
                    return Ok(Value::list(new));
                }
            }
        }
        Ok(value.clone())
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        let elements = value
            .as_list()?
            .iter()
            .map(|e| self.element.detach(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::list(elements))
    }

    fn has_fixed_size(&self) -> bool {
        false
    }
}

impl Serialize for List {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        let len = read_u32(input)? as usize;
        self.check_len(len)?;
        let mut elements = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            elements.push(self.element.read(input)?);
        }
        Ok(Value::list(elements))
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        let elements = value.as_list()?;
        write_len(out, elements.len())?;
        for e in elements {
            self.element.write(e, out)?;
        }
        Ok(())
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        if !self.element.has_fixed_size() {
            return self.read(input);
        }
        let rest = read_rest(input)?;
        let mut rest = &rest[..];
        let mut elements = vec![];
        while !rest.is_empty() {
            elements.push(self.element.read(&mut rest)?);
        }
        self.check_len(elements.len())?;
        Ok(Value::list(elements))
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        if !self.element.has_fixed_size() {
            return self.write(value, out);
        }
        for e in value.as_list()? {
            self.element.write(e, out)?;
        }
        Ok(())
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "List<{}>", self.element)
    }
}
