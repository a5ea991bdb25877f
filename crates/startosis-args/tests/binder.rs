//! Binding behaviour across whole schemas.

use std::sync::Arc;

use proptest::prelude::*;
use startosis_args::{
    bind, validators, ArgumentKind, ArgumentValuesSet, BuiltinArgument, ViolationReason,
};
use startosis_core::{InterpretationError, ScriptDuration, Value, ValueKind};

fn default_interval() -> Value {
    Value::from("1s")
}

fn schema() -> Arc<[BuiltinArgument]> {
    Arc::from(vec![
        BuiltinArgument::required("field", ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required("target", ArgumentKind::INT),
        BuiltinArgument::optional("flag", ArgumentKind::BOOL),
        BuiltinArgument::optional("interval", ArgumentKind::STRING)
            .with_default(default_interval)
            .with_validator(validators::duration),
        BuiltinArgument::optional("tags", ArgumentKind::LIST),
        BuiltinArgument::optional("span", ArgumentKind::Of(ValueKind::Duration)),
    ])
}

fn port_number(value: &Value, name: &str) -> Result<(), InterpretationError> {
    validators::uint64_in_range(value, name, 1, 65535)
}

#[test]
fn test_missing_single_required_argument() {
    let defs: Arc<[BuiltinArgument]> = Arc::from(vec![BuiltinArgument::required(
        "number",
        ArgumentKind::INT,
    )
    .with_validator(port_number)]);
    let err = bind("PortSpec", &defs, vec![], vec![]).unwrap_err();
    assert_eq!(err.violations.len(), 1);
    assert_eq!(err.violations[0].argument, "number");
    assert_eq!(err.violations[0].reason, ViolationReason::Missing);

    let interpretation: InterpretationError = err.into();
    assert!(interpretation.to_string().contains("number"));
}

#[test]
fn test_mismatches_in_two_arguments_form_one_error() {
    let err = bind(
        "f",
        &schema(),
        vec![Value::from(7), Value::from("seven")],
        vec![],
    )
    .unwrap_err();
    assert_eq!(err.arguments(), vec!["field", "target"]);
    assert!(err
        .violations
        .iter()
        .all(|v| matches!(v.reason, ViolationReason::TypeMismatch { .. })));
}

#[test]
fn test_optional_default_is_not_set() {
    let set = bind(
        "f",
        &schema(),
        vec![Value::from("code"), Value::from(200)],
        vec![],
    )
    .unwrap();
    assert!(!set.is_set("interval"));
    assert_eq!(set.extract::<String>("interval").unwrap(), "1s");
    assert_eq!(
        set.extract::<ScriptDuration>("span").unwrap(),
        ScriptDuration::ZERO
    );
    assert!(!set.extract::<bool>("flag").unwrap());
}

#[test]
fn test_validator_message_is_kept() {
    let err = bind(
        "f",
        &schema(),
        vec![Value::from("code"), Value::from(200)],
        vec![("interval".to_string(), Value::from("often"))],
    )
    .unwrap_err();
    match &err.violations[0].reason {
        ViolationReason::Invalid { message } => {
            assert!(message.contains("not a valid duration string format"))
        }
        other => panic!("unexpected reason {:?}", other),
    }
}

fn arbitrary_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9]{0,6}".prop_map(Value::from),
        Just(Value::list(vec![])),
        Just(Value::from("2s")),
    ]
}

fn keyword() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("field".to_string()),
        Just("target".to_string()),
        Just("flag".to_string()),
        Just("interval".to_string()),
        Just("tags".to_string()),
        Just("span".to_string()),
        Just("unknown".to_string()),
    ]
}

fn check_bound(set: &ArgumentValuesSet) {
    assert_eq!(set.len(), schema().len());
    set.extract::<String>("field").unwrap();
    set.extract::<i64>("target").unwrap();
    set.extract::<bool>("flag").unwrap();
    set.extract::<String>("interval").unwrap();
    set.extract::<Value>("tags").unwrap();
    set.extract::<ScriptDuration>("span").unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a successful bind fills every slot with a value of the declared type.
    #[test]
    fn property_bound_set_matches_schema(
        positional in proptest::collection::vec(arbitrary_value(), 0..4),
        named in proptest::collection::vec((keyword(), arbitrary_value()), 0..4),
    ) {
        if let Ok(set) = bind("f", &schema(), positional, named) {
            check_bound(&set);
        }
    }

    /// PROPERTY: the rendered call names exactly the supplied arguments.
    #[test]
    fn property_render_call_lists_set_arguments(field in "[a-z]{1,5}", target in any::<i32>(), flag in any::<bool>()) {
        let set = bind(
            "f",
            &schema(),
            vec![Value::from(field.as_str()), Value::from(target)],
            vec![("flag".to_string(), Value::from(flag))],
        ).unwrap();
        let rendered = set.render_call("f");
        let expected = format!("f(field=\"{}\", target={}, flag={})", field, target, if flag { "True" } else { "False" });
        prop_assert_eq!(rendered, expected);
    }
}
