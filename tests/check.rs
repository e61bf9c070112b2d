#![cfg(feature = "check")]

use mutatype::{
    check::Check, AnnotatedType as T, CompositeDesc, Constraint, Factory, SumDesc, Value,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn check_finds_failures() -> anyhow::Result<()> {
    init_logging();

    let factory = Factory::new();
    let mutator = factory.resolve(&T::integer().with(Constraint::in_range(0, 3)))?;

    let failure = Check::new()
        .seed(1)
        .run(&mutator, |v| match v.as_int() {
            Ok(3) => Err("found three"),
            _ => Ok(()),
        })
        .unwrap_err()
        .unwrap_failed();
    assert_eq!(failure.value, Value::Int(3));
    assert_eq!(failure.message, "found three");
    Ok(())
}

#[test]
fn check_catches_panics() -> anyhow::Result<()> {
    let factory = Factory::new();
    let mutator = factory.resolve(&T::boolean())?;

    let failure = Check::new()
        .run(&mutator, |v| -> Result<(), String> {
            if *v == Value::Bool(true) {
                panic!("true is not allowed");
            }
            Ok(())
        })
        .unwrap_err()
        .unwrap_failed();
    assert_eq!(failure.value, Value::Bool(true));
    assert_eq!(failure.message, "<panicked>");
    Ok(())
}

#[test]
fn passing_properties_pass() -> anyhow::Result<()> {
    let factory = Factory::new();
    let mutator = factory.resolve(&T::list_of(T::byte()).with(Constraint::with_length(0, 5)))?;

    let result = Check::new().iters(500).run(&mutator, |v| {
        let len = v.as_list().map_err(|e| e.to_string())?.len();
        if len <= 5 {
            Ok(())
        } else {
            Err(format!("too long: {len}"))
        }
    });
    assert!(result.is_ok());
    Ok(())
}

#[test]
fn mismatched_values_are_errors_not_failures() -> anyhow::Result<()> {
    let factory = Factory::new();
    factory.define(CompositeDesc::new("Empty"))?;
    let mutator = factory.resolve(&T::named("Empty"))?;

    // A mutator for a different type sees a value it cannot handle.
    let strings = factory.resolve(&T::string())?;
    let value = Value::composite("Empty", vec![]);
    let err = mutatype::Session::new()
        .mutate(&strings, &value)
        .unwrap_err();
    assert!(err.is_mismatch());

    assert!(Check::new().iters(10).run(&mutator, |_| Ok::<(), String>(())).is_ok());
    Ok(())
}

#[test]
fn factory_mutators_uphold_the_contract() -> anyhow::Result<()> {
    init_logging();

    let factory = Factory::new();
    factory.define(
        CompositeDesc::new("Node")
            .field("value", T::integer())
            .field("label", T::string().nullable())
            .field("next", T::named("Node").nullable()),
    )?;
    factory.define(CompositeDesc::new("Leaf").field("weight", T::double()))?;
    factory.define(
        SumDesc::new("Tree")
            .alternative(T::named("Leaf"))
            .alternative(T::named("Branch")),
    )?;
    factory.define(
        CompositeDesc::new("Branch").field("children", T::list_of(T::named("Tree"))),
    )?;

    let types = [
        T::boolean(),
        T::byte().with(Constraint::in_range(-2, 2)),
        T::float(),
        T::string().with(Constraint::with_length(1, 8)),
        T::list_of(T::short().nullable()),
        T::named("Node"),
        T::named("Tree"),
    ];
    for ty in &types {
        let mutator = factory.resolve(ty)?;
        if let Err(e) = Check::new().iters(300).contract(&mutator) {
            panic!("`{mutator}` broke the contract: {e:?}");
        }
    }
    Ok(())
}

#[cfg(feature = "derive")]
#[test]
fn run_typed() -> anyhow::Result<()> {
    use mutatype::Reflect;

    #[derive(Debug, PartialEq, Reflect)]
    struct Account {
        #[mutatype(in_range(min = 0, max = 100))]
        balance: i32,
        owner: Option<String>,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<Account>()?;

    let result = Check::new().run_typed(&mutator, |account: &Account| {
        if (0..=100).contains(&account.balance) {
            Ok(())
        } else {
            Err("balance out of range")
        }
    });
    assert!(result.is_ok());

    let failure = Check::new()
        .run_typed(&mutator, |account: &Account| {
            if account.owner.is_some() {
                Err("owned")
            } else {
                Ok(())
            }
        })
        .unwrap_err()
        .unwrap_failed();
    assert!(failure.value.owner.is_some());
    Ok(())
}
