/*!

# Recursive Types and Constraints

## Describing types by hand

`#[derive(Reflect)]` covers Rust types, but the factory works on type
descriptions, which can also be written directly. This is useful when the
types being fuzzed come from a schema or another language.

Composite and sum types are registered by name with
[`Factory::define`][crate::Factory::define] and referred to with
[`AnnotatedType::named`][crate::AnnotatedType::named]:

```rust
# fn foo() -> mutatype::Result<()> {
use mutatype::{AnnotatedType as T, CompositeDesc, Factory, SumDesc};

let factory = Factory::new();

// An expression is a literal, or the sum of two expressions.
factory.define(
    SumDesc::new("Expr")
        .alternative(T::named("Lit"))
        .alternative(T::named("Add")),
)?;
factory.define(CompositeDesc::new("Lit").field("value", T::long()))?;
factory.define(
    CompositeDesc::new("Add")
        .field("lhs", T::named("Expr"))
        .field("rhs", T::named("Expr")),
)?;

let mutator = factory.resolve(&T::named("Expr"))?;
assert_eq!(mutator.to_string(), "([Long] -> Lit | [Expr, Expr] -> Add) -> Expr");
# Ok(())
# }
# foo().unwrap();
```

Definitions can refer to types that are not defined yet; names are only looked
up when a mutator is resolved.

## Recursion

A type that contains itself gets a mutator that contains itself: while the
mutator for `Expr` is being built, the inner references to `Expr` get a
placeholder that is bound to the finished mutator afterwards. The placeholder
prints as the type's signature, which is why `Expr` appears inside its own
signature above.

Generation stops recursing at the session's
[`max_depth`][crate::Session::max_depth]: past it, optional positions are
absent, lists are as short as they are allowed to be, and sums pick one of
their shallowest alternatives (`Lit` above).

A type whose values would all be infinitely deep cannot be generated at all,
and the factory rejects it with an [unsupported type][crate::Error::is_unsupported_type]
error. Recursion is only finite if it passes through a position that can stop
it: an optional position, a list that may be empty, or a sum type with an
alternative that has finite values. Every type the mutator is built from is
checked, including alternatives that are never picked at the cutoff.

```rust
# fn foo() -> mutatype::Result<()> {
use mutatype::{AnnotatedType as T, CompositeDesc, Constraint, Factory};

let factory = Factory::new();
factory.define(
    CompositeDesc::new("Node")
        .field("value", T::integer())
        .field("next", T::named("Node").nullable()),
)?;

// Fine: `next` can be absent.
factory.resolve(&T::named("Node"))?;

// Not fine: with `next` never absent, every node has another node after it.
let err = factory
    .resolve(&T::named("Node").with(Constraint::not_null().recursive()))
    .unwrap_err();
assert!(err.is_unsupported_type());
# Ok(())
# }
# foo().unwrap();
```

A failed resolution leaves nothing behind in the factory's cache, so asking
again fails the same way.

## Constraints

Constraints annotate a position:

* [`not_null`][crate::Constraint::not_null]: an optional position is never
  absent.

* [`in_range(min, max)`][crate::Constraint::in_range]: an integer stays within
  `min..=max`. The range is clamped to the integer's width.

* [`with_length(min, max)`][crate::Constraint::with_length]: a string has
  between `min` and `max` bytes, or a list between `min` and `max` elements.
  Without it, strings and lists have at most
  [`DEFAULT_MAX_LEN`][crate::DEFAULT_MAX_LEN] elements.

Constraints come from three places, and are combined in this order:

1. recursive constraints inherited from an enclosing position,
2. constraints declared on a composite or sum type itself, and
3. constraints written at the point of use.

When two range or length constraints apply, the later one wins, so a
declaration at the point of use overrides an inherited one. Constraints written
explicitly on a position they cannot apply to (such as `in_range` on a string)
are an [invalid constraint][crate::Error::is_invalid_constraint] error;
inherited ones silently skip such positions and keep cascading.

A [`recursive`][crate::Constraint::recursive] constraint applies to its
position and to every position nested inside it. A plain constraint applies
to its position only:

```rust
# fn foo() -> mutatype::Result<()> {
use mutatype::{AnnotatedType as T, Constraint, Factory};

let factory = Factory::new();
let nested = T::list_of(T::list_of(T::integer().nullable()).nullable()).nullable();

let plain = factory.resolve(&nested.clone().with(Constraint::not_null()))?;
assert_eq!(plain.to_string(), "List<Nullable<List<Nullable<Integer>>>>");

let recursive = factory.resolve(&nested.with(Constraint::not_null().recursive()))?;
assert_eq!(recursive.to_string(), "List<List<Integer>>");
# Ok(())
# }
# foo().unwrap();
```

Each distinct combination of type and constraints gets its own mutator, and
the same combination always gets the same, shared, mutator.

 */
