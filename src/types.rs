//! Type descriptions: what the factory builds mutators for.
//!
//! An [`AnnotatedType`] is a [`Shape`] plus the position's declared
//! optionality and its constraint annotations. Composite and sum types are
//! referred to by name and defined in a [`TypeRegistry`], which is what lets a
//! type refer to itself.

use crate::{Constraint, Error, Result, Value};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The name of a registered composite or sum type.
pub type TypeName = Arc<str>;

/// Signed integer widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Short,
    /// 32 bits.
    Integer,
    /// 64 bits.
    Long,
}

impl IntKind {
    /// The smallest value of this width.
    pub fn min(self) -> i64 {
        match self {
            IntKind::Byte => i64::from(i8::MIN),
            IntKind::Short => i64::from(i16::MIN),
            IntKind::Integer => i64::from(i32::MIN),
            IntKind::Long => i64::MIN,
        }
    }

    /// The largest value of this width.
    pub fn max(self) -> i64 {
        match self {
            IntKind::Byte => i64::from(i8::MAX),
            IntKind::Short => i64::from(i16::MAX),
            IntKind::Integer => i64::from(i32::MAX),
            IntKind::Long => i64::MAX,
        }
    }

    /// The encoded width in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            IntKind::Byte => 1,
            IntKind::Short => 2,
            IntKind::Integer => 4,
            IntKind::Long => 8,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            IntKind::Byte => "Byte",
            IntKind::Short => "Short",
            IntKind::Integer => "Integer",
            IntKind::Long => "Long",
        }
    }
}

/// Floating point widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatKind {
    /// 32 bits.
    Float,
    /// 64 bits.
    Double,
}

impl FloatKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            FloatKind::Float => "Float",
            FloatKind::Double => "Double",
        }
    }
}

/// The structure of a type, without annotations on the type itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `true` or `false`.
    Boolean,
    /// A signed integer.
    Integer(IntKind),
    /// A float.
    Float(FloatKind),
    /// A UTF-8 string.
    String,
    /// A variable-length list; the element position carries its own
    /// annotations.
    List(Box<AnnotatedType>),
    /// A registered composite or sum type.
    Named(TypeName),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Boolean => f.write_str("Boolean"),
            Shape::Integer(kind) => f.write_str(kind.name()),
            Shape::Float(kind) => f.write_str(kind.name()),
            Shape::String => f.write_str("String"),
            Shape::List(element) => write!(f, "List<{element}>"),
            Shape::Named(name) => f.write_str(name),
        }
    }
}

/// A type at a point of use: its shape, whether the position is declared
/// optional, and the constraints annotated on the position.
///
/// # Example
///
/// ```
/// use mutatype::{AnnotatedType, Constraint};
///
/// // An optional list of optional integers between 0 and 9.
/// let ty = AnnotatedType::list_of(
///     AnnotatedType::integer()
///         .nullable()
///         .with(Constraint::in_range(0, 9)),
/// )
/// .nullable();
///
/// assert_eq!(ty.to_string(), "Nullable<List<Nullable<Integer>>>");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotatedType {
    shape: Shape,
    nullable: bool,
    constraints: Vec<Constraint>,
}

impl fmt::Display for AnnotatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Nullable<{}>", self.shape)
        } else {
            fmt::Display::fmt(&self.shape, f)
        }
    }
}

impl AnnotatedType {
    /// A non-optional, unannotated position of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            nullable: false,
            constraints: vec![],
        }
    }

    /// `Boolean`.
    pub fn boolean() -> Self {
        Self::new(Shape::Boolean)
    }

    /// `Byte`.
    pub fn byte() -> Self {
        Self::new(Shape::Integer(IntKind::Byte))
    }

    /// `Short`.
    pub fn short() -> Self {
        Self::new(Shape::Integer(IntKind::Short))
    }

    /// `Integer`.
    pub fn integer() -> Self {
        Self::new(Shape::Integer(IntKind::Integer))
    }

    /// `Long`.
    pub fn long() -> Self {
        Self::new(Shape::Integer(IntKind::Long))
    }

    /// `Float`.
    pub fn float() -> Self {
        Self::new(Shape::Float(FloatKind::Float))
    }

    /// `Double`.
    pub fn double() -> Self {
        Self::new(Shape::Float(FloatKind::Double))
    }

    /// `String`.
    pub fn string() -> Self {
        Self::new(Shape::String)
    }

    /// `List<element>`.
    pub fn list_of(element: AnnotatedType) -> Self {
        Self::new(Shape::List(Box::new(element)))
    }

    /// A reference to the registered type named `name`.
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self::new(Shape::Named(name.into()))
    }

    /// Declare this position optional.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Annotate this position with a constraint.
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// This position's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this position is declared optional.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The constraints annotated on this position.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// A field of a composite type.
#[derive(Clone, Debug)]
pub struct FieldDesc {
    name: Arc<str>,
    ty: AnnotatedType,
}

impl FieldDesc {
    /// The field's name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The field's type.
    pub fn ty(&self) -> &AnnotatedType {
        &self.ty
    }
}

/// A construction procedure and its inverse.
///
/// `construct` turns child values, in slot order, into the composite value;
/// `destruct` projects a composite value back onto its child values. Both must
/// be pure and `destruct(construct(xs))` must equal `xs` for any children the
/// procedure accepts unchanged.
#[derive(Clone)]
pub struct Binding {
    construct: Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>,
    destruct: Arc<dyn Fn(&Value) -> Result<Vec<Value>> + Send + Sync>,
}

impl Binding {
    /// Create a new binding from a construction procedure and its inverse.
    pub fn new(
        construct: impl Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
        destruct: impl Fn(&Value) -> Result<Vec<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            construct: Arc::new(construct),
            destruct: Arc::new(destruct),
        }
    }

    /// The binding every `Record` composite uses: a [`Value::Composite`] with
    /// the type's name and the children in order.
    pub fn record(type_name: impl Into<TypeName>, arity: usize) -> Self {
        let type_name: TypeName = type_name.into();
        let name = type_name.clone();
        Self::new(
            move |fields| Ok(Value::composite(name.clone(), fields)),
            move |value| {
                let composite = value.as_composite()?;
                if composite.type_name() != &*type_name || composite.fields().len() != arity {
                    return Err(Error::mismatch(format!(
                        "expected a `{type_name}` with {arity} fields, found a `{}` with {}",
                        composite.type_name(),
                        composite.fields().len(),
                    )));
                }
                Ok(composite.fields().to_vec())
            },
        )
    }

    pub(crate) fn construct(&self, fields: Vec<Value>) -> Result<Value> {
        (self.construct)(fields)
    }

    pub(crate) fn destruct(&self, value: &Value) -> Result<Vec<Value>> {
        (self.destruct)(value)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Binding { .. }")
    }
}

/// How values of a composite type are constructed.
#[derive(Clone, Debug)]
pub enum Construction {
    /// Values are generic [`Value::Composite`]s of all fields in order.
    Record,
    /// Values are built and taken apart by a user-supplied [`Binding`].
    Custom(Binding),
    /// There is no viable way to construct values of this type. Resolving a
    /// mutator for it fails with an unsupported-type error.
    Unavailable,
}

/// A composite (record-like) type: named fields, optionally extending a
/// parent composite whose fields come first.
///
/// # Example
///
/// ```
/// use mutatype::{AnnotatedType, CompositeDesc};
///
/// let parent = CompositeDesc::new("Parent")
///     .field("foo", AnnotatedType::integer().nullable());
///
/// let child = CompositeDesc::new("Child")
///     .extends("Parent")
///     .field("bar", AnnotatedType::list_of(AnnotatedType::integer()));
/// # let _ = (parent, child);
/// ```
#[derive(Clone, Debug)]
pub struct CompositeDesc {
    name: TypeName,
    parent: Option<TypeName>,
    fields: Vec<FieldDesc>,
    constraints: Vec<Constraint>,
    construction: Construction,
}

impl CompositeDesc {
    /// A new composite type with no fields, constructed as a record.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: vec![],
            constraints: vec![],
            construction: Construction::Record,
        }
    }

    /// Extend the named parent composite.
    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Extend the parent composite that `parent` refers to.
    ///
    /// Fails unless `parent` is a non-optional, unannotated reference to a
    /// named type.
    pub fn extends_type(self, parent: AnnotatedType) -> Result<Self> {
        match parent.shape {
            Shape::Named(name) if !parent.nullable && parent.constraints.is_empty() => {
                Ok(self.extends(name))
            }
            shape => Err(Error::unsupported_type(format!(
                "`{}` cannot extend `{shape}`: only plain composite types can be parents",
                self.name
            ))),
        }
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<Arc<str>>, ty: AnnotatedType) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
        });
        self
    }

    /// Declare a constraint on the type itself. It applies wherever the type
    /// is used.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set how values of this type are constructed.
    pub fn construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    /// This type's name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// The parent type's name, if any.
    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    /// The fields declared on this type, excluding inherited ones.
    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    pub(crate) fn construction_kind(&self) -> &Construction {
        &self.construction
    }
}

/// A sum (polymorphic) type: exactly one of several alternatives.
#[derive(Clone, Debug)]
pub struct SumDesc {
    name: TypeName,
    alternatives: Vec<AnnotatedType>,
    constraints: Vec<Constraint>,
}

impl SumDesc {
    /// A new sum type with no alternatives.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            alternatives: vec![],
            constraints: vec![],
        }
    }

    /// Add an alternative.
    pub fn alternative(mut self, ty: AnnotatedType) -> Self {
        self.alternatives.push(ty);
        self
    }

    /// Declare a constraint on the type itself.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// This type's name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// The alternatives, in order.
    pub fn alternatives(&self) -> &[AnnotatedType] {
        &self.alternatives
    }
}

/// A registered type definition.
#[derive(Clone, Debug)]
pub enum TypeDef {
    /// A composite type.
    Composite(Arc<CompositeDesc>),
    /// A sum type.
    Sum(Arc<SumDesc>),
}

impl TypeDef {
    /// The defined type's name.
    pub fn name(&self) -> &TypeName {
        match self {
            TypeDef::Composite(c) => &c.name,
            TypeDef::Sum(s) => &s.name,
        }
    }

    /// The constraints declared on the type itself.
    pub fn constraints(&self) -> &[Constraint] {
        match self {
            TypeDef::Composite(c) => &c.constraints,
            TypeDef::Sum(s) => &s.constraints,
        }
    }
}

impl From<CompositeDesc> for TypeDef {
    fn from(desc: CompositeDesc) -> Self {
        TypeDef::Composite(Arc::new(desc))
    }
}

impl From<SumDesc> for TypeDef {
    fn from(desc: SumDesc) -> Self {
        TypeDef::Sum(Arc::new(desc))
    }
}

/// The set of named type definitions a [`Factory`][crate::Factory] resolves
/// against.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    defs: HashMap<TypeName, TypeDef>,
    owners: HashMap<TypeName, TypeId>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    ///
    /// Fails if the name is already taken.
    pub fn insert(&mut self, def: impl Into<TypeDef>) -> Result<AnnotatedType> {
        let def = def.into();
        let name = def.name().clone();
        if self.defs.contains_key(&name) || self.owners.contains_key(&name) {
            return Err(Error::duplicate_type(format!(
                "`{name}` is already defined"
            )));
        }
        self.defs.insert(name.clone(), def);
        Ok(AnnotatedType::named(name))
    }

    /// Register the definition of the Rust type `T` under `name`, unless it is
    /// already registered.
    ///
    /// `build` runs at most once per registry and may describe other types,
    /// including `T` itself: recursive references see the name as already
    /// claimed and get a plain reference back.
    ///
    /// This is what `#[derive(Reflect)]` expands to.
    pub fn define<T: 'static>(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut Self) -> Result<TypeDef>,
    ) -> Result<AnnotatedType> {
        let id = TypeId::of::<T>();
        match self.owners.get(name) {
            Some(owner) if *owner == id => return Ok(AnnotatedType::named(name)),
            Some(_) => {
                return Err(Error::duplicate_type(format!(
                    "`{name}` is already defined by a different Rust type"
                )))
            }
            None if self.defs.contains_key(name) => {
                return Err(Error::duplicate_type(format!(
                    "`{name}` is already defined"
                )))
            }
            None => {}
        }

        let name: TypeName = name.into();
        self.owners.insert(name.clone(), id);
        match build(self) {
            Ok(def) if def.name() == &name => {
                self.defs.insert(name.clone(), def);
                Ok(AnnotatedType::named(name))
            }
            Ok(def) => {
                self.owners.remove(&name);
                Err(Error::other(format!(
                    "definition of `{name}` is named `{}`",
                    def.name()
                )))
            }
            Err(e) => {
                self.owners.remove(&name);
                Err(e)
            }
        }
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }
}
