//! Dynamic values produced and consumed by mutators.

use crate::{Error, Result, TypeName};
use std::fmt;
use std::sync::Arc;

/// A value of some described type.
///
/// Every mutator built by a [`Factory`][crate::Factory] produces `Value`s.
/// Heap-backed variants are reference counted: cloning a `Value` is cheap and
/// the clone *shares storage* with the original. Use a mutator's
/// [`detach`][crate::Mutate::detach] method to get a deep copy that shares
/// nothing.
///
/// Equality is structural. Floats compare by bit pattern, so `NaN == NaN`.
#[derive(Clone)]
pub enum Value {
    /// An absent value in a nullable position.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer of any width.
    Int(i64),
    /// A float of either width.
    Float(f64),
    /// A string.
    String(Arc<str>),
    /// A list of values.
    List(Arc<[Value]>),
    /// A composite value.
    Composite(Arc<CompositeValue>),
    /// One alternative of a sum type.
    Variant(Arc<VariantValue>),
}

/// The fields of a composite value, in construction order.
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeValue {
    type_name: TypeName,
    fields: Vec<Value>,
}

impl CompositeValue {
    /// The name of the composite type this value belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The field values, parent fields first.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

/// A value of a sum type: which alternative, and that alternative's value.
#[derive(Clone, PartialEq, Eq)]
pub struct VariantValue {
    type_name: TypeName,
    index: u32,
    value: Value,
}

impl VariantValue {
    /// The name of the sum type this value belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The index of the chosen alternative.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The chosen alternative's value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Value {
    /// Create a new string value.
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Create a new list value.
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Arc::from(elements))
    }

    /// Create a new composite value.
    pub fn composite(type_name: impl Into<TypeName>, fields: Vec<Value>) -> Value {
        Value::Composite(Arc::new(CompositeValue {
            type_name: type_name.into(),
            fields,
        }))
    }

    /// Create a new sum-type value.
    pub fn variant(type_name: impl Into<TypeName>, index: u32, value: Value) -> Value {
        Value::Variant(Arc::new(VariantValue {
            type_name: type_name.into(),
            index,
            value,
        }))
    }

    /// Is this the absent value?
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A short name for this value's variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Composite(_) => "composite",
            Value::Variant(_) => "variant",
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::mismatch(format!("expected {expected}, found {}", self.kind_name()))
    }

    /// Get this value as a boolean.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Get this value as an integer.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(x) => Ok(*x),
            other => Err(other.mismatch("integer")),
        }
    }

    /// Get this value as a float.
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(x) => Ok(*x),
            other => Err(other.mismatch("float")),
        }
    }

    /// Get this value as a string.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    /// Get this value as a list.
    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(elements) => Ok(elements),
            other => Err(other.mismatch("list")),
        }
    }

    /// Get this value as a composite.
    pub fn as_composite(&self) -> Result<&CompositeValue> {
        match self {
            Value::Composite(c) => Ok(c),
            other => Err(other.mismatch("composite")),
        }
    }

    /// Get this value as a sum-type value.
    pub fn as_variant(&self) -> Result<&VariantValue> {
        match self {
            Value::Variant(v) => Ok(v),
            other => Err(other.mismatch("variant")),
        }
    }

    /// Do `self` and `other` share heap storage at the top level?
    ///
    /// Always `false` for scalars, which have no identity.
    ///
    /// # Example
    ///
    /// ```
    /// use mutatype::Value;
    ///
    /// let a = Value::string("hello");
    /// let b = a.clone();
    /// let c = Value::string("hello");
    ///
    /// assert!(a.shares_storage(&b));
    /// assert!(!a.shares_storage(&c));
    /// assert_eq!(a, c);
    /// ```
    pub fn shares_storage(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Composite(a), Value::Composite(b)) => Arc::ptr_eq(a, b),
            (Value::Variant(a), Value::Variant(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Does any heap node reachable from `self` share storage with any heap
    /// node reachable from `other`?
    pub fn aliases(&self, other: &Value) -> bool {
        let mut mine = vec![];
        self.collect_nodes(&mut mine);
        let mut theirs = vec![];
        other.collect_nodes(&mut theirs);
        mine.iter().any(|a| theirs.iter().any(|b| a.shares_storage(b)))
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => {}
            Value::String(_) => out.push(self),
            Value::List(elements) => {
                out.push(self);
                elements.iter().for_each(|e| e.collect_nodes(out));
            }
            Value::Composite(c) => {
                out.push(self);
                c.fields.iter().for_each(|f| f.collect_nodes(out));
            }
            Value::Variant(v) => {
                out.push(self);
                v.value.collect_nodes(out);
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Composite(a), Value::Composite(b)) => a == b,
            (Value::Variant(a), Value::Variant(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(x) => write!(f, "{x}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(elements) => f.debug_list().entries(elements.iter()).finish(),
            Value::Composite(c) => fmt::Debug::fmt(&**c, f),
            Value::Variant(v) => fmt::Debug::fmt(&**v, f),
        }
    }
}

impl fmt::Debug for CompositeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple(&self.type_name);
        for field in &self.fields {
            t.field(field);
        }
        t.finish()
    }
}

impl fmt::Debug for VariantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}(", self.type_name, self.index)?;
        fmt::Debug::fmt(&self.value, f)?;
        f.write_str(")")
    }
}
