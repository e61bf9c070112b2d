/*!

# The `#[derive(Reflect)]` Macro

The `#[derive(Reflect)]` macro is only available when the `derive` cargo
feature is enabled, which it is by default:

```toml
[dependencies]
mutatype = "..."
```

Once the `derive` feature is enabled, you can put `#[derive(Reflect)]` on top of
your `struct` and `enum` definitions. It supports unit-, tuple-, and
named-field-styles of `struct`s and `enum` variants. You cannot derive
`Reflect` for `union`s or for generic types.

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
pub struct Hero {
    needed: bool,
    deserved: bool,
    armor: Option<i32>,
}

let factory = Factory::new();
let mutator = factory.typed::<Hero>()?;
assert_eq!(mutator.to_string(), "[Boolean, Boolean, Nullable<Integer>] -> Hero");
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

The derive macro generates the following:

### A `Reflect for Hero` implementation

`Reflect::describe` registers a composite type named `Hero` in the factory's
[`TypeRegistry`][crate::TypeRegistry], with one field per `struct` field, and
returns a reference to it. Registration happens once per registry, so types
that refer to themselves, directly or through other types, describe fine:

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
pub struct Tree {
    value: i32,
    children: Vec<Tree>,
}

let factory = Factory::new();
let mutator = factory.typed::<Tree>()?;
assert_eq!(mutator.to_string(), "[Integer, List<Tree>] -> Tree");
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

`Reflect::to_value` and `Reflect::from_value` convert between `Hero`s and the
dynamic [`Value`][crate::Value]s that mutators work on.

### A `ReflectComposite for Hero` implementation

This is only generated for `struct`s. It lets other derived `struct`s embed
`Hero` as their parent; see the `parent` field attribute below.

### `enum`s

An `enum` is described as a sum type, with one alternative per variant. Each
variant is its own composite type, named `Enum::Variant`:

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
pub enum Shape {
    Circle { radius: f64 },
    Rect(f64, f64),
    Empty,
}

let factory = Factory::new();
let mutator = factory.typed::<Shape>()?;
assert_eq!(
    mutator.to_string(),
    "([Double] -> Shape::Circle | [Double, Double] -> Shape::Rect | [] -> Shape::Empty) -> Shape",
);
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

## Container Attributes

The `#[derive(Reflect)]` macro supports the following attributes on `struct`s
and `enum`s:

### `#[mutatype(name = "my.Name")]`

Register the type under the given name instead of the Rust type's name. Two
different Rust types cannot be registered under the same name in one factory.

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
#[mutatype(name = "net.Packet")]
pub struct Packet(Vec<i8>);

let factory = Factory::new();
let mutator = factory.typed::<Packet>()?;
assert_eq!(mutator.to_string(), "[List<Byte>] -> net.Packet");
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

### Constraints

The constraint attributes described below can also be put on the container.
They then apply wherever the type is used.

## Field Attributes

The `#[derive(Reflect)]` macro supports the following attributes on fields
within `struct`s and `enum` variants:

### `#[mutatype(ignore)]`

Leave this field out of the description. It is never mutated, and is set to
`Default::default()` when a value is converted back from a
[`Value`][crate::Value].

### `#[mutatype(parent)]`

This field holds the parent composite, which must itself be a derived `struct`.
The parent's fields come before this type's own fields, and the parent's
constraints and mutation behavior carry over. Only one field can be the parent,
and `enum` variants cannot have one.

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
pub struct Base {
    id: Option<i32>,
}

#[derive(Debug, Reflect)]
pub struct Derived {
    #[mutatype(parent)]
    base: Base,
    tags: Option<Vec<String>>,
}

let factory = Factory::new();
let mutator = factory.typed::<Derived>()?;
assert_eq!(
    mutator.to_string(),
    "[Nullable<Integer>, Nullable<List<String>>] -> Derived",
);
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

### `#[mutatype(not_null)]`

The field is never absent, even if its type is an `Option`.

### `#[mutatype(in_range(min = A, max = B))]`

The integer field stays within `A..=B`.

### `#[mutatype(with_length(min = A, max = B))]`

The string or list field has between `A` and `B` elements (bytes, for strings).

### Recursive constraints

Every constraint takes an optional `recursive` flag, for example
`not_null(recursive)` or `in_range(min = 0, max = 9, recursive)`. A recursive
constraint applies to the annotated position *and to every position nested
inside it*, wherever it makes sense there:

```rust
# fn foo() -> mutatype::Result<()> {
# #![cfg(feature = "derive")]
use mutatype::{Factory, Reflect};

#[derive(Debug, Reflect)]
pub struct Inner {
    a: Option<i32>,
    b: Option<Vec<Option<i32>>>,
}

#[derive(Debug, Reflect)]
pub struct Outer {
    #[mutatype(not_null(recursive))]
    inner: Option<Inner>,
}

let factory = Factory::new();
let mutator = factory.typed::<Outer>()?;
assert_eq!(
    mutator.to_string(),
    "[[Integer, List<Integer>] -> Inner] -> Outer",
);
# Ok(())
# }
# #[cfg(feature = "derive")] foo().unwrap();
```

See [the recursive types guide][crate::_guide::recursive_types] for how
constraints combine.

 */
