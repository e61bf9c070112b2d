use mutatype::{
    AnnotatedType as T, Binding, CompositeDesc, Constraint, Construction, Factory, Mutate,
    Session, SumDesc, Value,
};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn define_simple_class(factory: &Factory) -> anyhow::Result<T> {
    Ok(factory.define(
        CompositeDesc::new("SimpleClass")
            .field("foo", T::string().nullable())
            .field("bar", T::list_of(T::integer().nullable()).nullable())
            .field("baz", T::boolean()),
    )?)
}

fn define_bean_with_parent(factory: &Factory) -> anyhow::Result<T> {
    factory.define(CompositeDesc::new("Parent").field("foo", T::integer().nullable()))?;
    Ok(factory.define(
        CompositeDesc::new("BeanWithParent")
            .extends("Parent")
            .field("bar", T::list_of(T::integer().nullable()).nullable()),
    )?)
}

/// `Node { value: Integer, next: Nullable<Node> }`
fn define_linked_list(factory: &Factory) -> anyhow::Result<T> {
    Ok(factory.define(
        CompositeDesc::new("Node")
            .field("value", T::integer())
            .field("next", T::named("Node").nullable()),
    )?)
}

fn list_length(mut value: &Value) -> anyhow::Result<usize> {
    let mut len = 0;
    while !value.is_null() {
        len += 1;
        value = &value.as_composite()?.fields()[1];
    }
    Ok(len)
}

#[test]
fn simple_class_signature() -> anyhow::Result<()> {
    init_logging();
    let factory = Factory::new();
    let simple = define_simple_class(&factory)?;
    let mutator = factory.resolve(&simple)?;
    assert_eq!(
        mutator.to_string(),
        "[Nullable<String>, Nullable<List<Nullable<Integer>>>, Boolean] -> SimpleClass"
    );
    Ok(())
}

#[test]
fn parent_fields_come_first() -> anyhow::Result<()> {
    let factory = Factory::new();
    let bean = define_bean_with_parent(&factory)?;

    let mutator = factory.resolve(&bean)?;
    assert_eq!(
        mutator.to_string(),
        "[Nullable<Integer>, Nullable<List<Nullable<Integer>>>] -> BeanWithParent"
    );
    assert!(!mutator.has_fixed_size());
    Ok(())
}

#[test]
fn recursive_not_null_reaches_every_position() -> anyhow::Result<()> {
    let factory = Factory::new();
    let bean = define_bean_with_parent(&factory)?;

    let mutator = factory.resolve(&bean.with(Constraint::not_null().recursive()))?;
    assert_eq!(
        mutator.to_string(),
        "[Integer, List<Integer>] -> BeanWithParent"
    );
    assert!(!mutator.has_fixed_size());

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    for _ in 0..100 {
        let fields = value.as_composite()?.fields().to_vec();
        assert!(matches!(fields[0], Value::Int(_)));
        assert!(fields[1].as_list()?.iter().all(|x| matches!(x, Value::Int(_))));
        value = session.mutate(&mutator, &value)?;
    }
    Ok(())
}

#[test]
fn plain_not_null_stops_at_its_position() -> anyhow::Result<()> {
    let factory = Factory::new();
    let bean = define_bean_with_parent(&factory)?;

    let mutator = factory.resolve(&bean.nullable().with(Constraint::not_null()))?;
    assert_eq!(
        mutator.to_string(),
        "[Nullable<Integer>, Nullable<List<Nullable<Integer>>>] -> BeanWithParent"
    );
    Ok(())
}

#[test]
fn mutate_changes_the_value() -> anyhow::Result<()> {
    let factory = Factory::new();
    let simple = define_simple_class(&factory)?;
    let mutator = factory.resolve(&simple)?;

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    for _ in 0..200 {
        let mutated = session.mutate(&mutator, &value)?;
        assert_ne!(mutated, value);
        value = mutated;
    }
    Ok(())
}

#[test]
fn mutate_leaves_the_input_alone() -> anyhow::Result<()> {
    let factory = Factory::new();
    let mutator = factory.resolve(&T::list_of(T::string()))?;

    let original = Value::list(vec![Value::string("a"), Value::string("b")]);
    let copy = mutator.detach(&original)?;
    let mut session = Session::new();
    for _ in 0..50 {
        session.mutate(&mutator, &original)?;
    }
    assert_eq!(original, copy);
    Ok(())
}

#[test]
fn detach_shares_nothing() -> anyhow::Result<()> {
    let factory = Factory::new();
    let simple = define_simple_class(&factory)?;
    let mutator = factory.resolve(&simple.with(Constraint::not_null().recursive()))?;

    let mut session = Session::new().max_init_len(4);
    for _ in 0..20 {
        let value = session.init(&mutator)?;
        let copy = mutator.detach(&value)?;
        assert_eq!(copy, value);
        assert!(!copy.aliases(&value));
    }
    Ok(())
}

#[test]
fn resolve_is_cached() -> anyhow::Result<()> {
    let factory = Factory::new();
    let simple = define_simple_class(&factory)?;

    let a = factory.resolve(&simple)?;
    let b = factory.resolve(&simple)?;
    assert!(Arc::ptr_eq(&a, &b));

    // Different constraints are a different mutator.
    let c = factory.resolve(&simple.with(Constraint::not_null().recursive()))?;
    assert!(!Arc::ptr_eq(&a, &c));
    Ok(())
}

#[test]
fn resolve_from_many_threads() -> anyhow::Result<()> {
    let factory = Factory::new();
    let node = define_linked_list(&factory)?;

    let mutators = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| factory.resolve(&node)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("resolver thread panicked"))
            .collect::<mutatype::Result<Vec<_>>>()
    })?;

    for m in &mutators[1..] {
        assert!(Arc::ptr_eq(&mutators[0], m));
    }
    Ok(())
}

#[test]
fn recursive_type_generates_finite_values() -> anyhow::Result<()> {
    init_logging();
    let factory = Factory::new();
    let node = define_linked_list(&factory)?;
    let mutator = factory.resolve(&node)?;
    assert_eq!(mutator.to_string(), "[Integer, Nullable<Node>] -> Node");

    for seed in 0..50 {
        let mut session = Session::new().seed(seed).max_depth(6);
        let value = session.init(&mutator)?;
        assert!(list_length(&value)? <= 7, "too long: {value:?}");

        let bytes = mutatype::codec::to_bytes(&mutator, &value)?;
        assert_eq!(mutatype::codec::from_bytes(&mutator, &bytes)?, value);
    }
    Ok(())
}

#[test]
fn infinitely_nested_types_are_rejected() -> anyhow::Result<()> {
    let factory = Factory::new();
    let node = define_linked_list(&factory)?;

    let err = factory
        .resolve(&node.with(Constraint::not_null().recursive()))
        .unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");

    // Recursion through a list that must be non-empty never ends either.
    factory.define(
        CompositeDesc::new("Forest").field(
            "trees",
            T::list_of(T::named("Forest")).with(Constraint::with_length(1, 3)),
        ),
    )?;
    let err = factory.resolve(&T::named("Forest")).unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");
    Ok(())
}

#[test]
fn indirect_recursion_through_a_cached_type_is_checked() -> anyhow::Result<()> {
    let factory = Factory::new();
    // `A.b` is optional, but `A.c` always contains a `B`, which always
    // contains an `A`.
    factory.define(
        CompositeDesc::new("A")
            .field("b", T::named("B").nullable())
            .field("c", T::named("B")),
    )?;
    factory.define(CompositeDesc::new("B").field("a", T::named("A")))?;

    let err = factory.resolve(&T::named("A")).unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");
    Ok(())
}

#[test]
fn failed_builds_are_rolled_back() -> anyhow::Result<()> {
    init_logging();
    let factory = Factory::new();
    factory.define(CompositeDesc::new("Good").field("x", T::integer()))?;
    factory.define(
        CompositeDesc::new("Outer")
            .field("good", T::named("Good"))
            .field("bad", T::named("Missing")),
    )?;

    let err = factory.resolve(&T::named("Outer")).unwrap_err();
    assert!(err.is_unsupported_type());
    assert!(err.is_construction_error());

    // Asking again fails the same way.
    let err = factory.resolve(&T::named("Outer")).unwrap_err();
    assert!(err.is_unsupported_type());

    // Nothing half-built was left behind: once the missing type exists the
    // whole thing builds.
    factory.define(CompositeDesc::new("Missing").field("y", T::boolean()))?;
    let mutator = factory.resolve(&T::named("Outer"))?;
    assert_eq!(
        mutator.to_string(),
        "[[Integer] -> Good, [Boolean] -> Missing] -> Outer"
    );
    Ok(())
}

#[test]
fn unconstructible_types_are_unsupported() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(
        CompositeDesc::new("Opaque")
            .field("x", T::integer())
            .construction(Construction::Unavailable),
    )?;
    assert!(factory
        .resolve(&T::named("Opaque"))
        .unwrap_err()
        .is_unsupported_type());

    // A parent that is not a composite.
    factory.define(SumDesc::new("Either").alternative(T::boolean()))?;
    factory.define(CompositeDesc::new("Child").extends("Either"))?;
    assert!(factory
        .resolve(&T::named("Child"))
        .unwrap_err()
        .is_unsupported_type());

    // A sum with nothing to choose from.
    factory.define(SumDesc::new("Never"))?;
    assert!(factory
        .resolve(&T::named("Never"))
        .unwrap_err()
        .is_unsupported_type());
    Ok(())
}

#[test]
fn duplicate_definitions_are_rejected() -> anyhow::Result<()> {
    let factory = Factory::new();
    define_simple_class(&factory)?;
    let err = factory
        .define(CompositeDesc::new("SimpleClass"))
        .unwrap_err();
    assert!(err.is_duplicate_type());
    Ok(())
}

#[test]
fn invalid_constraints_are_rejected() {
    let factory = Factory::new();

    // Not applicable.
    let err = factory
        .resolve(&T::string().with(Constraint::in_range(0, 1)))
        .unwrap_err();
    assert!(err.is_invalid_constraint());

    // Empty.
    let err = factory
        .resolve(&T::string().with(Constraint::with_length(3, 2)))
        .unwrap_err();
    assert!(err.is_invalid_constraint());

    // Disjoint from the integer kind.
    let err = factory
        .resolve(&T::byte().with(Constraint::in_range(1000, 2000)))
        .unwrap_err();
    assert!(err.is_invalid_constraint());

    // Contradicting each other.
    let err = factory
        .resolve(
            &T::integer()
                .with(Constraint::in_range(0, 5))
                .with(Constraint::in_range(1, 9)),
        )
        .unwrap_err();
    assert!(err.is_invalid_constraint());
}

#[test]
fn ranges_and_lengths_are_respected() -> anyhow::Result<()> {
    let factory = Factory::new();
    let mutator = factory.resolve(
        &T::list_of(T::short().with(Constraint::in_range(-5, 5)))
            .with(Constraint::with_length(2, 3)),
    )?;

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    for _ in 0..500 {
        let elements = value.as_list()?;
        assert!((2..=3).contains(&elements.len()));
        for x in elements {
            assert!((-5..=5).contains(&x.as_int()?));
        }
        value = session.mutate(&mutator, &value)?;
    }
    Ok(())
}

#[test]
fn inherited_ranges_are_overridden_at_use() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(
        CompositeDesc::new("Pair")
            .field("a", T::integer())
            .field("b", T::integer().with(Constraint::in_range(100, 200))),
    )?;
    let mutator = factory.resolve(&T::named("Pair").with(Constraint::in_range(0, 9).recursive()))?;

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    for _ in 0..200 {
        let fields = value.as_composite()?.fields().to_vec();
        assert!((0..=9).contains(&fields[0].as_int()?));
        assert!((100..=200).contains(&fields[1].as_int()?));
        value = session.mutate(&mutator, &value)?;
    }
    Ok(())
}

#[test]
fn sums_switch_alternatives() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(
        SumDesc::new("Animal")
            .alternative(T::named("Dog"))
            .alternative(T::named("Cat")),
    )?;
    factory.define(CompositeDesc::new("Dog").field("name", T::string().nullable()))?;
    factory.define(CompositeDesc::new("Cat").field("lives", T::integer().nullable()))?;

    let mutator = factory.resolve(&T::named("Animal"))?;
    assert_eq!(
        mutator.to_string(),
        "([Nullable<String>] -> Dog | [Nullable<Integer>] -> Cat) -> Animal"
    );

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    let mut seen = [false; 2];
    for _ in 0..200 {
        let variant = value.as_variant()?;
        seen[variant.index() as usize] = true;
        value = session.mutate(&mutator, &value)?;
    }
    assert_eq!(seen, [true, true]);
    Ok(())
}

#[test]
fn recursive_constraints_cascade_into_sum_alternatives() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(
        SumDesc::new("Animal")
            .alternative(T::named("Dog"))
            .alternative(T::named("Cat")),
    )?;
    factory.define(CompositeDesc::new("Dog").field("name", T::string().nullable()))?;
    factory.define(CompositeDesc::new("Cat").field("lives", T::integer().nullable()))?;

    let mutator =
        factory.resolve(&T::named("Animal").with(Constraint::not_null().recursive()))?;
    assert_eq!(
        mutator.to_string(),
        "([String] -> Dog | [Integer] -> Cat) -> Animal"
    );
    Ok(())
}

#[test]
fn recursive_sums_terminate() -> anyhow::Result<()> {
    let factory = Factory::new();
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
    assert_eq!(
        mutator.to_string(),
        "([Long] -> Lit | [Expr, Expr] -> Add) -> Expr"
    );

    for seed in 0..20 {
        let mut session = Session::new().seed(seed).max_depth(5);
        let mut value = session.init(&mutator)?;
        for _ in 0..20 {
            value = session.mutate(&mutator, &value)?;
        }
        let bytes = mutatype::codec::to_bytes(&mutator, &value)?;
        assert_eq!(mutatype::codec::from_bytes(&mutator, &bytes)?, value);
    }

    // A sum whose every alternative recurses has no finite values.
    factory.define(SumDesc::new("Loop").alternative(T::named("Wrap")))?;
    factory.define(CompositeDesc::new("Wrap").field("inner", T::named("Loop")))?;
    assert!(factory
        .resolve(&T::named("Loop"))
        .unwrap_err()
        .is_unsupported_type());
    Ok(())
}

#[test]
fn cycles_through_sums_are_checked() -> anyhow::Result<()> {
    let factory = Factory::new();
    // `P` always holds an `S`, whose only alternative always holds a `P`.
    factory.define(CompositeDesc::new("P").field("s", T::named("S")))?;
    factory.define(SumDesc::new("S").alternative(T::named("W")))?;
    factory.define(CompositeDesc::new("W").field("p", T::named("P")))?;

    let err = factory.resolve(&T::named("P")).unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");
    let err = factory.resolve(&T::named("S")).unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");

    // Types that can only be reached through an optional position must still
    // have finite values of their own.
    factory.define(
        CompositeDesc::new("Holder").field("p", T::named("P").nullable()),
    )?;
    let err = factory.resolve(&T::named("Holder")).unwrap_err();
    assert!(err.is_unsupported_type(), "{err}");
    Ok(())
}

#[test]
fn sums_can_stop_recursing_inside_an_alternative() -> anyhow::Result<()> {
    init_logging();
    let factory = Factory::new();
    // `Tree = Node(List<Tree>)`: the list may be empty.
    factory.define(SumDesc::new("Tree").alternative(T::named("Node")))?;
    factory.define(CompositeDesc::new("Node").field("kids", T::list_of(T::named("Tree"))))?;
    // `Opt = Some(Nullable<Opt>)`: the inner value may be absent.
    factory.define(SumDesc::new("Opt").alternative(T::named("Some")))?;
    factory.define(CompositeDesc::new("Some").field("inner", T::named("Opt").nullable()))?;

    let tree = factory.resolve(&T::named("Tree"))?;
    assert_eq!(tree.to_string(), "([List<Tree>] -> Node) -> Tree");
    let opt = factory.resolve(&T::named("Opt"))?;
    assert_eq!(opt.to_string(), "([Nullable<Opt>] -> Some) -> Opt");

    for seed in 0..20 {
        let mut session = Session::new().seed(seed).max_depth(4);
        for mutator in [&tree, &opt] {
            let mut value = session.init(mutator)?;
            for _ in 0..20 {
                value = session.mutate(mutator, &value)?;
            }
            let bytes = mutatype::codec::to_bytes(mutator, &value)?;
            assert_eq!(mutatype::codec::from_bytes(mutator, &bytes)?, value);
        }
    }
    Ok(())
}

#[test]
fn sums_at_the_cutoff_pick_shallow_alternatives() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(
        SumDesc::new("Chain")
            .alternative(T::named("Link"))
            .alternative(T::named("End")),
    )?;
    factory.define(CompositeDesc::new("Link").field("next", T::named("Chain")))?;
    factory.define(CompositeDesc::new("End"))?;
    let mutator = factory.resolve(&T::named("Chain"))?;

    // With no depth to spare, only `End` is ever generated.
    let mut session = Session::new().max_depth(0);
    for _ in 0..50 {
        let value = session.init(&mutator)?;
        assert_eq!(value.as_variant()?.index(), 1);
    }
    Ok(())
}

#[test]
fn required_optional_positions_share_a_mutator() -> anyhow::Result<()> {
    let factory = Factory::new();
    let a = factory.resolve(&T::integer().nullable().with(Constraint::not_null()))?;
    let b = factory.resolve(&T::integer().with(Constraint::not_null()))?;
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.to_string(), "Integer");
    Ok(())
}

#[test]
fn custom_bindings_construct_values() -> anyhow::Result<()> {
    let factory = Factory::new();
    // Values are always even integers, stored directly rather than as a
    // composite.
    let binding = Binding::new(
        |fields| Ok(Value::Int(fields[0].as_int()? & !1)),
        |value| Ok(vec![Value::Int(value.as_int()?)]),
    );
    factory.define(
        CompositeDesc::new("Even")
            .field("n", T::integer())
            .construction(Construction::Custom(binding)),
    )?;
    let mutator = factory.resolve(&T::named("Even"))?;

    let mut session = Session::new();
    let mut value = session.init(&mutator)?;
    let mut changed = 0;
    for _ in 0..100 {
        assert_eq!(value.as_int()? % 2, 0);
        let mutated = session.mutate(&mutator, &value)?;
        if mutated != value {
            changed += 1;
        }
        value = mutated;
    }
    assert!(changed > 90);
    Ok(())
}

#[test]
fn typed_mutators_with_constraints() -> anyhow::Result<()> {
    let factory = Factory::new();
    let mutator = factory.typed_with::<Vec<i32>>(&[Constraint::with_length(2, 2)])?;
    assert_eq!(mutator.to_string(), "List<Integer>");
    assert!(!mutator.has_fixed_size());

    let mut session = Session::new();
    let mut value = mutator.init(session.context())?;
    for _ in 0..100 {
        assert_eq!(value.len(), 2);
        value = mutator.mutate(&value, session.context())?;
    }
    Ok(())
}

#[test]
fn mismatched_values_are_errors() -> anyhow::Result<()> {
    let factory = Factory::new();
    let simple = define_simple_class(&factory)?;
    let mutator = factory.resolve(&simple)?;

    let mut session = Session::new();
    let err = session.mutate(&mutator, &Value::Int(3)).unwrap_err();
    assert!(err.is_mismatch());
    let err = mutator
        .detach(&Value::composite("Other", vec![]))
        .unwrap_err();
    assert!(err.is_mismatch());
    Ok(())
}
