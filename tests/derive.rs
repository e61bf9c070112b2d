#![cfg(feature = "derive")]

use mutatype::{Factory, Reflect, Session, Value};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn derive_on_struct_with_named_fields() -> anyhow::Result<()> {
    init_logging();

    #[derive(Debug, PartialEq, Reflect)]
    struct MyStruct {
        x: i8,
        y: bool,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<MyStruct>()?;
    assert_eq!(mutator.to_string(), "[Byte, Boolean] -> MyStruct");

    let mut session = Session::new();
    let value = MyStruct { x: 0, y: false };
    let mutated = mutator.mutate(&value, session.context())?;
    assert_ne!(mutated, value);

    let bytes = mutator.to_bytes(&mutated)?;
    assert_eq!(bytes.len(), 2);
    assert_eq!(mutator.from_bytes(&bytes)?, mutated);
    Ok(())
}

#[test]
fn derive_on_struct_with_unnamed_fields() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    struct MyStruct(i16, String);

    let factory = Factory::new();
    let mutator = factory.typed::<MyStruct>()?;
    assert_eq!(mutator.to_string(), "[Short, String] -> MyStruct");

    let mut session = Session::new();
    let value = mutator.init(session.context())?;
    let mutated = mutator.mutate(&value, session.context())?;
    assert_ne!(mutated, value);
    assert_eq!(mutator.from_bytes(&mutator.to_bytes(&mutated)?)?, mutated);
    Ok(())
}

#[test]
fn derive_on_unit_struct() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    struct MyUnitStruct;

    let factory = Factory::new();
    let mutator = factory.typed::<MyUnitStruct>()?;
    assert_eq!(mutator.to_string(), "[] -> MyUnitStruct");
    assert!(!mutator.has_fixed_size());

    let mut session = Session::new();
    assert_eq!(mutator.mutate(&MyUnitStruct, session.context())?, MyUnitStruct);
    assert!(mutator.to_bytes(&MyUnitStruct)?.is_empty());
    Ok(())
}

#[test]
fn derive_on_enum() -> anyhow::Result<()> {
    init_logging();

    #[derive(Debug, PartialEq, Reflect)]
    enum MyEnum {
        Unit,
        Unnamed(i8, bool),
        Named { x: i8, y: bool },
    }

    let factory = Factory::new();
    let mutator = factory.typed::<MyEnum>()?;
    assert_eq!(
        mutator.to_string(),
        "([] -> MyEnum::Unit | [Byte, Boolean] -> MyEnum::Unnamed \
         | [Byte, Boolean] -> MyEnum::Named) -> MyEnum"
    );

    let mut session = Session::new();
    let mut seen = [false; 3];
    let mut value = MyEnum::Unit;
    for _ in 0..200 {
        value = mutator.mutate(&value, session.context())?;
        let index = match value {
            MyEnum::Unit => 0,
            MyEnum::Unnamed(..) => 1,
            MyEnum::Named { .. } => 2,
        };
        seen[index] = true;
        assert_eq!(mutator.from_bytes(&mutator.to_bytes(&value)?)?, value);
    }
    assert_eq!(seen, [true; 3]);
    Ok(())
}

#[test]
fn enum_values_name_their_variant() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    enum Light {
        Off,
        On { level: i8 },
    }

    let value = Light::On { level: 3 }.to_value();
    let variant = value.as_variant()?;
    assert_eq!(variant.type_name(), "Light");
    assert_eq!(variant.index(), 1);
    let fields = variant.value().as_composite()?;
    assert_eq!(fields.type_name(), "Light::On");
    assert_eq!(fields.fields(), &[Value::Int(3)]);

    assert_eq!(Light::from_value(&value)?, Light::On { level: 3 });
    assert!(Light::from_value(&Value::Int(3)).unwrap_err().is_mismatch());
    Ok(())
}

#[test]
fn type_name() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    #[mutatype(name = "com.example.Thing")]
    struct Thing(bool);

    let factory = Factory::new();
    let mutator = factory.typed::<Thing>()?;
    assert_eq!(mutator.to_string(), "[Boolean] -> com.example.Thing");
    assert_eq!(
        Thing(true).to_value(),
        Value::composite("com.example.Thing", vec![Value::Bool(true)])
    );
    Ok(())
}

#[test]
fn ignore_field() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    struct MyStruct {
        x: i32,
        #[mutatype(ignore)]
        cache: Vec<u8>,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<MyStruct>()?;
    assert_eq!(mutator.to_string(), "[Integer] -> MyStruct");

    let value = MyStruct {
        x: 5,
        cache: vec![1, 2, 3],
    };
    let round_tripped = mutator.from_bytes(&mutator.to_bytes(&value)?)?;
    assert_eq!(
        round_tripped,
        MyStruct {
            x: 5,
            cache: vec![]
        }
    );
    Ok(())
}

#[test]
fn parent_fields_come_first() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    struct Base {
        id: Option<i32>,
    }

    #[derive(Debug, PartialEq, Reflect)]
    struct Derived {
        name: String,
        #[mutatype(parent)]
        base: Base,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<Derived>()?;
    assert_eq!(mutator.to_string(), "[Nullable<Integer>, String] -> Derived");

    let value = Derived {
        name: "x".to_string(),
        base: Base { id: Some(7) },
    };
    assert_eq!(
        value.to_value(),
        Value::composite("Derived", vec![Value::Int(7), Value::string("x")])
    );
    assert_eq!(Derived::from_value(&value.to_value())?, value);

    // The parent is still usable on its own.
    let base = factory.typed::<Base>()?;
    assert_eq!(base.to_string(), "[Nullable<Integer>] -> Base");
    Ok(())
}

#[test]
fn field_constraints() -> anyhow::Result<()> {
    init_logging();

    #[derive(Debug, PartialEq, Reflect)]
    struct MyStruct {
        #[mutatype(in_range(min = -3, max = 3))]
        small: i64,
        #[mutatype(with_length(min = 1, max = 4))]
        items: Vec<bool>,
        #[mutatype(not_null)]
        always: Option<i8>,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<MyStruct>()?;
    assert_eq!(mutator.to_string(), "[Long, List<Boolean>, Byte] -> MyStruct");

    let mut session = Session::new();
    let mut value = mutator.init(session.context())?;
    for _ in 0..500 {
        assert!((-3..=3).contains(&value.small));
        assert!((1..=4).contains(&value.items.len()));
        assert!(value.always.is_some());
        value = mutator.mutate(&value, session.context())?;
    }
    Ok(())
}

#[test]
fn container_constraints() -> anyhow::Result<()> {
    #[derive(Debug, Reflect)]
    struct Leaf {
        x: Option<i32>,
    }

    #[derive(Debug, Reflect)]
    #[mutatype(not_null(recursive))]
    struct Strict {
        a: Option<i32>,
        b: Option<Vec<Option<Leaf>>>,
    }

    let factory = Factory::new();
    let mutator = factory.typed::<Strict>()?;
    assert_eq!(
        mutator.to_string(),
        "[Integer, List<[Integer] -> Leaf>] -> Strict"
    );
    Ok(())
}

#[test]
fn recursive_struct() -> anyhow::Result<()> {
    init_logging();

    #[derive(Debug, PartialEq, Reflect)]
    struct Tree {
        value: i32,
        children: Vec<Tree>,
    }

    impl Tree {
        fn height(&self) -> usize {
            1 + self.children.iter().map(Tree::height).max().unwrap_or(0)
        }
    }

    let factory = Factory::new();
    let mutator = factory.typed::<Tree>()?;
    assert_eq!(mutator.to_string(), "[Integer, List<Tree>] -> Tree");

    for seed in 0..20 {
        let mut session = Session::new().seed(seed).max_depth(4);
        let tree = mutator.init(session.context())?;
        assert!(tree.height() <= 5, "tree too tall: {tree:?}");

        let mutated = mutator.mutate(&tree, session.context())?;
        assert_ne!(mutated, tree);
        assert_eq!(mutator.from_bytes(&mutator.to_bytes(&mutated)?)?, mutated);
    }
    Ok(())
}

#[test]
fn recursive_enum() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    enum Expr {
        Lit(i64),
        Neg(Box<Expr>),
        Add(Box<Expr>, Box<Expr>),
    }

    let factory = Factory::new();
    let mutator = factory.typed::<Expr>()?;
    assert_eq!(
        mutator.to_string(),
        "([Long] -> Expr::Lit | [Expr] -> Expr::Neg | [Expr, Expr] -> Expr::Add) -> Expr"
    );

    let mut session = Session::new();
    let mut expr = mutator.init(session.context())?;
    for _ in 0..100 {
        expr = mutator.mutate(&expr, session.context())?;
        assert_eq!(mutator.from_bytes(&mutator.to_bytes(&expr)?)?, expr);
    }
    Ok(())
}

#[test]
fn enum_recursing_through_a_vec_or_option() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    enum Tree {
        Node(Vec<Tree>),
    }

    #[derive(Debug, PartialEq, Reflect)]
    enum Opt {
        Wrap(Option<Box<Opt>>),
    }

    let factory = Factory::new();
    let tree = factory.typed::<Tree>()?;
    let opt = factory.typed::<Opt>()?;

    let mut session = Session::new().max_depth(3);
    let mut t = tree.init(session.context())?;
    let mut o = opt.init(session.context())?;
    for _ in 0..50 {
        t = tree.mutate(&t, session.context())?;
        o = opt.mutate(&o, session.context())?;
        assert_eq!(tree.from_bytes(&tree.to_bytes(&t)?)?, t);
        assert_eq!(opt.from_bytes(&opt.to_bytes(&o)?)?, o);
    }
    Ok(())
}

#[test]
fn vec_of_unit_structs_round_trips() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq, Reflect)]
    struct Marker;

    let factory = Factory::new();
    let mutator = factory.typed::<Vec<Marker>>()?;
    let value = vec![Marker, Marker, Marker];
    assert_eq!(mutator.to_bytes(&value)?, [0, 0, 0, 3]);
    assert_eq!(mutator.from_bytes(&[0, 0, 0, 3])?, value);
    Ok(())
}

#[test]
fn infinitely_nested_struct_is_rejected() {
    #[derive(Debug, Reflect)]
    struct Chain {
        next: Box<Chain>,
    }

    let factory = Factory::new();
    let err = factory.typed::<Chain>().unwrap_err();
    assert!(err.is_unsupported_type());
}

#[test]
fn conflicting_type_names_are_rejected() {
    #[derive(Debug, Reflect)]
    #[mutatype(name = "Same")]
    struct A(bool);

    #[derive(Debug, Reflect)]
    #[mutatype(name = "Same")]
    struct B(i32);

    let factory = Factory::new();
    factory.typed::<A>().unwrap();
    assert!(factory.typed::<B>().unwrap_err().is_duplicate_type());
}
