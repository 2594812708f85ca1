//! End-to-end tests for constraint solving

use arc_checker::{promote, Constraint, ConstraintKind, System, TypeError};
use arc_types::{units, FunctionProperties, Param, Params, Type};

fn var(name: &str) -> Type {
    Type::variable(name, None)
}

fn numeric(name: &str) -> Type {
    Type::variable(name, Some(Type::numeric_constraint()))
}

fn integer_lit(name: &str) -> Type {
    Type::variable(name, Some(Type::integer_constraint()))
}

fn float_lit(name: &str) -> Type {
    Type::variable(name, Some(Type::float_constraint()))
}

fn solve_promotion(bound: Type, value: Type) -> Type {
    let mut system = System::new();
    system
        .add_compatible(Type::variable("T", Some(bound)), value, None, "promotion")
        .unwrap();
    system.unify().unwrap();
    system.substitution("T").cloned().unwrap()
}

#[test]
fn test_promotion_table() {
    let cases = [
        // either float
        (Type::f32(), Type::i32(), Type::f32()),
        (Type::i32(), Type::f32(), Type::f32()),
        (Type::f32(), Type::i64(), Type::f64()),
        (Type::f64(), Type::i32(), Type::f64()),
        (Type::f64(), Type::i64(), Type::f64()),
        (Type::f32(), Type::u32(), Type::f32()),
        // both integer, either 64-bit
        (Type::u64(), Type::u32(), Type::u64()),
        (Type::u64(), Type::u64(), Type::u64()),
        (Type::i64(), Type::u64(), Type::f64()),
        (Type::u64(), Type::i64(), Type::f64()),
        (Type::i64(), Type::u32(), Type::f64()),
        (Type::u64(), Type::i32(), Type::f64()),
        (Type::i64(), Type::i32(), Type::f64()),
        (Type::i32(), Type::i64(), Type::f64()),
        // both integer, neither 64-bit
        (Type::i32(), Type::u32(), Type::i32()),
        (Type::u32(), Type::i32(), Type::i32()),
        (Type::i32(), Type::i16(), Type::i32()),
        (Type::u32(), Type::u16(), Type::u32()),
        (Type::i16(), Type::u16(), Type::i32()),
        (Type::i16(), Type::i8(), Type::i32()),
        (Type::u16(), Type::u8(), Type::u32()),
        (Type::i8(), Type::u8(), Type::i32()),
        (Type::u32(), Type::u32(), Type::u32()),
        (Type::i32(), Type::i32(), Type::i32()),
    ];

    for (bound, value, expected) in cases {
        let label = format!("{} ~ {}", bound, value);
        assert_eq!(promote(&bound, &value), expected, "promote {}", label);
        assert_eq!(solve_promotion(bound, value), expected, "solve {}", label);
    }
}

#[test]
fn test_simple_binding() {
    let mut system = System::new();
    system.add_equality(var("T"), Type::i64(), None, "T = i64").unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::i64()));
}

#[test]
fn test_chain_resolution() {
    let mut system = System::new();
    system.add_equality(var("T1"), var("T2"), None, "T1 = T2").unwrap();
    system.add_equality(var("T2"), var("T3"), None, "T2 = T3").unwrap();
    system.add_equality(var("T3"), Type::f64(), None, "T3 = f64").unwrap();
    system.unify().unwrap();

    for name in ["T1", "T2", "T3"] {
        assert_eq!(system.apply_substitutions(&var(name)), Type::f64(), "{}", name);
    }
}

#[test]
fn test_order_independence() {
    let orders: [[(&str, Type, Type); 3]; 3] = [
        [
            ("A = B", var("A"), var("B")),
            ("B = C", var("B"), var("C")),
            ("C = f32", var("C"), Type::f32()),
        ],
        [
            ("C = f32", var("C"), Type::f32()),
            ("B = C", var("B"), var("C")),
            ("A = B", var("A"), var("B")),
        ],
        [
            ("B = C", var("B"), var("C")),
            ("C = f32", var("C"), Type::f32()),
            ("A = B", var("A"), var("B")),
        ],
    ];

    for order in orders {
        let mut system = System::new();
        for (reason, left, right) in order {
            system.add_equality(left, right, None, reason).unwrap();
        }
        system.unify().unwrap();
        assert_eq!(system.apply_substitutions(&var("A")), Type::f32());
    }
}

#[test]
fn test_bidirectional_flow() {
    let mut system = System::new();
    system.add_equality(numeric("T1"), numeric("T"), None, "constant -> add.a").unwrap();
    system.add_equality(Type::f32(), numeric("T"), None, "channel -> add.b").unwrap();
    system.add_equality(numeric("T"), numeric("T"), None, "add.a = add.b").unwrap();
    system.unify().unwrap();

    assert_eq!(system.apply_substitutions(&numeric("T1")), Type::f32());
    assert_eq!(system.apply_substitutions(&numeric("T")), Type::f32());
}

#[test]
fn test_type_flows_out_of_channel() {
    let mut system = System::new();
    system
        .add_equality(Type::chan(Type::f32()), Type::chan(numeric("ge_T")), None, "on -> ge.left")
        .unwrap();
    system
        .add_equality(numeric("constant_T"), numeric("ge_T"), None, "constant -> ge.right")
        .unwrap();
    system.unify().unwrap();

    assert_eq!(system.apply_substitutions(&numeric("constant_T")), Type::f32());
}

#[test]
fn test_compatible_without_variables() {
    let mut system = System::new();
    system.add_compatible(Type::i32(), Type::f32(), None, "i32 ~ f32").unwrap();
    system.unify().unwrap();
}

#[test]
fn test_channel_unification() {
    let mut system = System::new();
    system
        .add_equality(Type::chan(var("T")), Type::chan(Type::f32()), None, "chan T = chan f32")
        .unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::f32()));
}

#[test]
fn test_series_unification() {
    let mut system = System::new();
    let series_t = Type::series(numeric("T"));
    system
        .add_equality(series_t.clone(), Type::series(Type::i32()), None, "series T = series i32")
        .unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::i32()));
    assert_eq!(system.apply_substitutions(&series_t), Type::series(Type::i32()));
}

#[test]
fn test_incompatible_compound_types() {
    let cases = [
        (Type::chan(Type::i32()), Type::chan(Type::string())),
        (Type::chan(Type::f32()), Type::i32()),
        (Type::series(Type::f32()), Type::string()),
        (Type::chan(Type::f32()), Type::series(Type::f32())),
    ];
    for (left, right) in cases {
        let mut system = System::new();
        let err = system.add_equality(left, right, None, "incompatible").unwrap_err();
        assert!(err.to_string().contains("is not compatible with"), "{}", err);
        assert!(system.constraints().is_empty());
    }
}

#[test]
fn test_occurs_check() {
    for cyclic in [Type::chan(var("T")), Type::series(var("T"))] {
        let mut system = System::new();
        let err = system.add_equality(var("T"), cyclic, None, "T = cyclic T").unwrap_err();
        assert!(matches!(err, TypeError::CyclicType { ref var, .. } if var == "T"), "{:?}", err);
    }
}

#[test]
fn test_self_equality_is_unresolved() {
    let mut system = System::new();
    system.add_equality(var("T"), var("T"), None, "T = T").unwrap();
    let err = system.unify().unwrap_err();
    assert!(matches!(err, TypeError::UnresolvedVariable { .. }));
    assert!(err.to_string().contains("unresolved type variable"));
}

#[test]
fn test_defaults() {
    let cases = [
        (Type::numeric_constraint(), Type::f64()),
        (Type::integer_constraint(), Type::i64()),
        (Type::float_constraint(), Type::f64()),
        (Type::exact_integer_float_constraint(), Type::f64()),
        (Type::f32(), Type::f32()),
    ];
    for (bound, expected) in cases {
        let tv = Type::variable("T", Some(bound));
        let mut system = System::new();
        system.add_equality(tv.clone(), tv, None, "T = T").unwrap();
        system.unify().unwrap();
        assert_eq!(system.substitution("T"), Some(&expected));
    }
}

#[test]
fn test_numeric_default_under_compatible() {
    let mut system = System::new();
    system.add_compatible(numeric("T"), numeric("T"), None, "T ~ T").unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::f64()));
}

#[test]
fn test_concrete_constraint_mismatch() {
    let mut system = System::new();
    let err = system
        .add_equality(Type::variable("T", Some(Type::f32())), Type::i32(), None, "T = i32")
        .unwrap_err();
    assert!(matches!(err, TypeError::ConstraintViolation { .. }));
    assert!(err.to_string().contains("is not compatible with"));
}

#[test]
fn test_prefers_constrained_variable() {
    let mut system = System::new();
    system.add_equality(numeric("T1"), var("T2"), None, "T1 = T2").unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T2").and_then(Type::variable_name), Some("T1"));

    let mut system = System::new();
    system.add_equality(var("T1"), numeric("T2"), None, "T1 = T2").unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T1").and_then(Type::variable_name), Some("T2"));
}

#[test]
fn test_circular_constrained_variables_default() {
    let mut system = System::new();
    system.add_equality(numeric("A"), numeric("B"), None, "A = B").unwrap();
    system.add_equality(numeric("B"), numeric("C"), None, "B = C").unwrap();
    system.add_equality(numeric("C"), numeric("A"), None, "C = A").unwrap();
    system.unify().unwrap();
    assert_eq!(system.apply_substitutions(&numeric("A")), Type::f64());
}

#[test]
fn test_mutual_equality_then_concrete() {
    let mut system = System::new();
    system.add_equality(var("T1"), var("T2"), None, "T1 = T2").unwrap();
    system.add_equality(var("T2"), var("T1"), None, "T2 = T1").unwrap();
    system.add_equality(var("T1"), Type::f32(), None, "T1 = f32").unwrap();
    system.unify().unwrap();
    assert_eq!(system.apply_substitutions(&var("T1")), Type::f32());
    assert_eq!(system.apply_substitutions(&var("T2")), Type::f32());
}

#[test]
fn test_compatible_order_does_not_matter() {
    for (first, second) in [(Type::i32(), Type::f32()), (Type::f32(), Type::i32())] {
        let mut system = System::new();
        system.add_compatible(numeric("T"), first, None, "T ~ first").unwrap();
        system.add_compatible(numeric("T"), second, None, "T ~ second").unwrap();
        system.unify().unwrap();
        assert_eq!(system.substitution("T"), Some(&Type::f32()));
    }
}

#[test]
fn test_float_literal_constraints() {
    for target in [Type::f32(), Type::f64()] {
        let mut system = System::new();
        system.add_equality(target.clone(), float_lit("lit"), None, "assignment").unwrap();
        system.unify().unwrap();
        assert_eq!(system.apply_substitutions(&float_lit("lit")), target);
    }

    for target in [Type::i32(), Type::string()] {
        let mut system = System::new();
        let err = system.add_equality(float_lit("T"), target, None, "T = target").unwrap_err();
        assert!(err.to_string().contains("is not compatible with"));
    }

    let mut system = System::new();
    system.add_compatible(float_lit("T"), Type::i32(), None, "T ~ i32").unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::f64()));

    let mut system = System::new();
    assert!(system.add_compatible(float_lit("T"), Type::string(), None, "T ~ str").is_err());
}

#[test]
fn test_integer_literal_constraints() {
    let mut system = System::new();
    assert!(system.add_equality(integer_lit("T"), Type::string(), None, "T = str").is_err());

    for target in arc_types::types::numerics() {
        let mut system = System::new();
        system.add_equality(target.clone(), integer_lit("lit"), None, "assignment").unwrap();
        system.unify().unwrap();
        assert_eq!(system.apply_substitutions(&integer_lit("lit")), target);
    }
}

#[test]
fn test_integer_literals_not_resolved_prematurely() {
    let mut system = System::new();
    system.add_compatible(integer_lit("lit_1"), integer_lit("lit_2"), None, "lit1 ~ lit2").unwrap();
    system.add_equality(Type::i64(), integer_lit("lit_1"), None, "assignment to i64").unwrap();
    system.unify().unwrap();
    assert_eq!(system.apply_substitutions(&integer_lit("lit_1")), Type::i64());
    assert_eq!(system.apply_substitutions(&integer_lit("lit_2")), Type::i64());
}

#[test]
fn test_nested_integer_expression() {
    // ((((1 + 2) * 3) - 4) / 5) % 6 assigned to an i64
    let steps = [
        ("lit_1", "lit_2", "1 + 2"),
        ("lit_1", "add_result", "result of 1 + 2"),
        ("add_result", "lit_3", "add * 3"),
        ("add_result", "mul_result", "result of add * 3"),
        ("mul_result", "lit_4", "mul - 4"),
        ("mul_result", "sub_result", "result of mul - 4"),
        ("sub_result", "lit_5", "sub / 5"),
        ("sub_result", "div_result", "result of sub / 5"),
        ("div_result", "lit_6", "div % 6"),
        ("div_result", "mod_result", "result of div % 6"),
    ];

    let mut system = System::new();
    for (left, right, reason) in steps {
        system
            .add_compatible(integer_lit(left), integer_lit(right), None, reason)
            .unwrap();
    }
    system
        .add_equality(Type::i64(), integer_lit("mod_result"), None, "x i64 := expression")
        .unwrap();
    system.unify().unwrap();

    for name in ["lit_1", "lit_2", "lit_3", "lit_4", "lit_5", "lit_6", "mod_result"] {
        assert_eq!(system.apply_substitutions(&integer_lit(name)), Type::i64(), "{}", name);
    }
}

#[test]
fn test_unify_constraint_reports_mismatch() {
    let mut system = System::new();
    let constraint = Constraint::new(Type::i32(), Type::string(), ConstraintKind::Equality, None, "test");
    let err = system.unify_constraint(&constraint).unwrap_err();
    assert!(err.to_string().contains("is not compatible with"));
    assert_eq!(err.hint(), None);
}

#[test]
fn test_numeric_mismatch_hint() {
    let mut system = System::new();
    let constraint = Constraint::new(Type::i64(), Type::f64(), ConstraintKind::Equality, None, "test");
    let err = system.unify_constraint(&constraint).unwrap_err();
    assert_eq!(err.hint(), Some("use i64(value) to convert"));
}

#[test]
fn test_interconnected_variables() {
    let mut system = System::new();
    system.add_equality(Type::f32(), numeric("T1"), None, "sensor(f32) -> multiply").unwrap();
    system.add_equality(numeric("T1"), numeric("T2"), None, "multiply -> add.a").unwrap();
    system.add_equality(numeric("T3"), numeric("T2"), None, "constant -> add.b").unwrap();
    system.add_equality(numeric("T1"), numeric("T1"), None, "multiply preserves type").unwrap();
    system.add_equality(numeric("T2"), numeric("T2"), None, "add params must match").unwrap();
    system.unify().unwrap();

    for name in ["T1", "T2", "T3"] {
        assert_eq!(system.apply_substitutions(&numeric(name)), Type::f32(), "{}", name);
    }
}

#[test]
fn test_promotion_cascade() {
    let mut system = System::new();
    system.add_compatible(numeric("T1"), Type::i32(), None, "T1 ~ i32").unwrap();
    system.add_compatible(numeric("T2"), Type::i64(), None, "T2 ~ i64").unwrap();
    system.add_compatible(numeric("T3"), Type::f32(), None, "T3 ~ f32").unwrap();
    system.add_compatible(numeric("T1"), numeric("T2"), None, "T1 ~ T2").unwrap();
    system.add_compatible(numeric("T2"), numeric("T3"), None, "T2 ~ T3").unwrap();
    system.add_compatible(numeric("T3"), numeric("T1"), None, "T3 ~ T1").unwrap();
    system.unify().unwrap();

    for name in ["T1", "T2", "T3"] {
        let resolved = system.apply_substitutions(&numeric(name));
        assert!(resolved.is_numeric(), "{} resolved to {}", name, resolved);
        assert_eq!(resolved, Type::f64());
    }
}

#[test]
fn test_cascading_updates() {
    let mut system = System::new();
    system.add_compatible(numeric("A"), Type::i32(), None, "A ~ i32").unwrap();
    system.add_compatible(numeric("B"), Type::i64(), None, "B ~ i64").unwrap();
    system.add_compatible(numeric("C"), numeric("A"), None, "C ~ A").unwrap();
    system.add_compatible(numeric("D"), numeric("B"), None, "D ~ B").unwrap();
    system.add_compatible(numeric("C"), numeric("D"), None, "C ~ D").unwrap();
    system.add_compatible(numeric("A"), numeric("B"), None, "A ~ B").unwrap();
    system.unify().unwrap();

    for name in ["A", "B", "C", "D"] {
        assert!(system.apply_substitutions(&numeric(name)).is_numeric(), "{}", name);
    }
}

#[test]
fn test_function_signatures_unify_parameter_wise() {
    let sig = |input: Type, output: Type| {
        Type::function(FunctionProperties {
            inputs: Params(vec![Param::new("in", input)]),
            outputs: Params(vec![Param::new("out", output)]),
            config: Params::new(),
        })
    };

    let mut system = System::new();
    system
        .add_equality(sig(var("I"), var("O")), sig(Type::f32(), Type::chan(Type::i8())), None, "call")
        .unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("I"), Some(&Type::f32()));
    assert_eq!(system.substitution("O"), Some(&Type::chan(Type::i8())));

    let mut system = System::new();
    let renamed = Type::function(FunctionProperties {
        inputs: Params(vec![Param::new("other", Type::f32())]),
        ..Default::default()
    });
    assert!(system.add_equality(sig(Type::f32(), Type::f32()), renamed, None, "call").is_err());
}

#[test]
fn test_same_dimension_units_resolve_in_any_order() {
    let psi = Type::f32().with_unit(units::resolve("psi").unwrap());
    let pa = Type::f32().with_unit(units::resolve("Pa").unwrap());

    let solve = |first: &Type, second: &Type| {
        let mut system = System::new();
        system.add_compatible(numeric("T"), first.clone(), None, "first").unwrap();
        system.add_compatible(numeric("T"), second.clone(), None, "second").unwrap();
        system.unify().unwrap();
        system.substitution("T").cloned().unwrap()
    };

    assert_eq!(solve(&psi, &pa), pa);
    assert_eq!(solve(&pa, &psi), pa);
}

#[test]
fn test_shared_parameter_variable_promotes() {
    let pair = |a: Type, b: Type| {
        Type::function(FunctionProperties {
            inputs: Params(vec![Param::new("a", a), Param::new("b", b)]),
            ..Default::default()
        })
    };

    let mut system = System::new();
    system
        .add_compatible(pair(numeric("T"), numeric("T")), pair(Type::i32(), Type::f32()), None, "call")
        .unwrap();
    system.unify().unwrap();
    assert_eq!(system.substitution("T"), Some(&Type::f32()));

    // Same result as the two constraints added on their own
    let mut separate = System::new();
    separate.add_compatible(numeric("T"), Type::i32(), None, "a").unwrap();
    separate.add_compatible(numeric("T"), Type::f32(), None, "b").unwrap();
    separate.unify().unwrap();
    assert_eq!(separate.substitution("T"), system.substitution("T"));
}

#[test]
fn test_variable_unit_survives_resolution() {
    let psi = units::resolve("psi").unwrap();
    let mut system = System::new();
    let pressure = var("P").with_unit(psi.clone());
    system.add_equality(pressure.clone(), Type::f64(), None, "P = f64").unwrap();
    system.unify().unwrap();

    let resolved = system.apply_substitutions(&pressure);
    assert_eq!(resolved, Type::f64().with_unit(psi));
    assert_eq!(system.apply_substitutions(&resolved), resolved);
}

#[test]
fn test_substitution_idempotent_after_unify() {
    let mut system = System::new();
    system.add_equality(var("A"), Type::chan(var("B")), None, "A = chan B").unwrap();
    system.add_compatible(numeric("B"), Type::u16(), None, "B ~ u16").unwrap();
    system.unify().unwrap();

    for name in ["A", "B"] {
        let once = system.apply_substitutions(&var(name));
        assert_eq!(system.apply_substitutions(&once), once);
    }
    assert_eq!(system.apply_substitutions(&var("A")), Type::chan(Type::u16()));
}
