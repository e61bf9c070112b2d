use super::*;
use crate::{Error, Mutate, MutatorRef, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A stand-in for a mutator that is still being built.
///
/// Handed out by the cache when a type refers to itself. It is bound exactly
/// once, when the build it stands in for finishes, and forwards everything to
/// the bound mutator from then on.
///
/// The bound mutator usually holds this placeholder somewhere beneath it, so
/// the two keep each other alive for as long as the process runs.
pub(crate) struct Lazy {
    signature: String,
    target: OnceLock<MutatorRef>,
}

impl Lazy {
    pub(crate) fn new(signature: String) -> Self {
        Self {
            signature,
            target: OnceLock::new(),
        }
    }

    pub(crate) fn bind(&self, mutator: MutatorRef) -> Result<()> {
        self.target.set(mutator).map_err(|_| {
            Error::other(format!(
                "placeholder for `{}` was bound twice",
                self.signature
            ))
        })
    }

    fn target(&self) -> Result<&MutatorRef> {
        self.target.get().ok_or_else(|| {
            Error::other(format!(
                "placeholder for `{}` was used before its mutator was built",
                self.signature
            ))
        })
    }
}

impl Mutate for Lazy {
    fn init(&self, ctx: &mut Context) -> Result<Value> {
        self.target()?.init(ctx)
    }

    fn mutate(&self, value: &Value, ctx: &mut Context) -> Result<Value> {
        self.target()?.mutate(value, ctx)
    }

    fn detach(&self, value: &Value) -> Result<Value> {
        self.target()?.detach(value)
    }

    fn has_fixed_size(&self) -> bool {
        // Only recursive types get placeholders, and those are never fixed
        // size.
        false
    }
}

impl Serialize for Lazy {
    fn read(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.target()?.read(input)
    }

    fn write(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        self.target()?.write(value, out)
    }

    fn read_exclusive(&self, input: &mut dyn io::Read) -> Result<Value> {
        self.target()?.read_exclusive(input)
    }

    fn write_exclusive(&self, value: &Value, out: &mut dyn io::Write) -> Result<()> {
        self.target()?.write_exclusive(value, out)
    }
}

// Print only the signature: the bound mutator's own output contains this
// placeholder.
impl fmt::Display for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy").field(&self.signature).finish()
    }
}
