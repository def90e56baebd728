use super::*;
use crate::tracker::DependencyTracker;
use serial_test::serial;

fn scope(ctx: RenderContext) -> FunctionScope {
    FunctionScope::new(Arc::new(ctx), None)
}

fn call(name: &str, scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    let (_, func) = FUNCTIONS
        .iter()
        .find(|(n, _)| *n == name)
        .expect("function registered");
    func(scope, args)
}

fn s(text: &str) -> Value {
    Value::from(text)
}

#[test]
fn test_function_table_matches_names() {
    let registered: Vec<&str> = FUNCTIONS.iter().map(|(n, _)| *n).collect();
    assert_eq!(registered, FUNCTION_NAMES);
}

#[test]
fn test_ref_with_and_without_schema() {
    let plain = scope(RenderContext::new());
    assert_eq!(call("ref", &plain, &[s("orders")]).unwrap().as_str(), Some("orders"));

    let qualified = scope(RenderContext::new().with_schema("analytics"));
    assert_eq!(
        call("ref", &qualified, &[s("orders")]).unwrap().as_str(),
        Some("analytics.orders")
    );
}

#[test]
fn test_ref_records_dependency_only_with_model() {
    let tracker = Arc::new(DependencyTracker::new());

    let anonymous = FunctionScope::new(Arc::new(RenderContext::new()), Some(tracker.clone()));
    call("ref", &anonymous, &[s("orders")]).unwrap();
    assert!(tracker.edges().is_empty());

    let named = FunctionScope::new(
        Arc::new(RenderContext::new().with_model("customer_orders")),
        Some(tracker.clone()),
    );
    call("ref", &named, &[s("orders")]).unwrap();
    assert_eq!(tracker.dependencies_of("customer_orders"), vec!["orders"]);
}

#[test]
fn test_ref_rejects_bad_arguments() {
    let sc = scope(RenderContext::new());
    assert!(matches!(
        call("ref", &sc, &[]),
        Err(JinjaError::InvalidArguments { .. })
    ));
    assert!(matches!(
        call("ref", &sc, &[Value::from(42)]),
        Err(JinjaError::InvalidArguments { .. })
    ));
}

#[test]
fn test_source_lookup() {
    let sc = scope(RenderContext::new().with_source("raw", "orders", "raw_data.orders"));

    assert_eq!(
        call("source", &sc, &[s("raw"), s("orders")]).unwrap().as_str(),
        Some("raw_data.orders")
    );
    assert_eq!(
        call("source", &sc, &[s("stripe"), s("charges")]).unwrap().as_str(),
        Some("stripe.charges")
    );
    assert_eq!(
        call("source", &sc, &[s("raw"), s("refunds")]).unwrap_err(),
        JinjaError::SourceTableNotFound {
            source_name: "raw".to_string(),
            table: "refunds".to_string(),
        }
    );
}

#[test]
fn test_seed_lookup() {
    let sc = scope(RenderContext::new().with_seed("countries", "seeds.countries"));

    assert_eq!(
        call("seed", &sc, &[s("countries")]).unwrap().as_str(),
        Some("seeds.countries")
    );
    assert_eq!(
        call("seed", &sc, &[s("currencies")]).unwrap_err(),
        JinjaError::SeedNotFound {
            name: "currencies".to_string()
        }
    );
    assert_eq!(
        call("seed", &sc, &[s("  ")]).unwrap_err(),
        JinjaError::EmptySeedName
    );
}

#[test]
fn test_var_lookup() {
    let sc = scope(
        RenderContext::new()
            .with_var("start_date", "2024-01-01")
            .with_var("limit", 10i64),
    );

    assert_eq!(
        call("var", &sc, &[s("start_date")]).unwrap().as_str(),
        Some("2024-01-01")
    );
    assert_eq!(call("var", &sc, &[s("limit")]).unwrap(), Value::from(10i64));
    assert_eq!(
        call("var", &sc, &[s("missing")]).unwrap_err(),
        JinjaError::VariableNotFound {
            name: "missing".to_string()
        }
    );
}

#[test]
fn test_config_dot_path() {
    let mut nested = qr_core::Value::mapping();
    nested.insert("retention_days", qr_core::Value::Integer(30));
    let sc = scope(
        RenderContext::new()
            .with_config_value("warehouse", nested)
            .with_config_value("owner", "data-team"),
    );

    assert_eq!(
        call("config", &sc, &[s("warehouse.retention_days")]).unwrap(),
        Value::from(30i64)
    );
    assert_eq!(
        call("config", &sc, &[s("owner")]).unwrap().as_str(),
        Some("data-team")
    );
    assert!(matches!(
        call("config", &sc, &[s("warehouse.missing")]),
        Err(JinjaError::ConfigKeyNotFound { ref key, .. }) if key == "warehouse.missing"
    ));
    assert!(matches!(
        call("config", &sc, &[s("owner.name")]),
        Err(JinjaError::ConfigKeyNotFound { .. })
    ));
}

#[test]
#[serial]
fn test_env_var_set() {
    std::env::set_var("QR_TEST_ENV_VAR", "from-env");
    let sc = scope(RenderContext::new());
    assert_eq!(
        call("env_var", &sc, &[s("QR_TEST_ENV_VAR"), s("fallback")])
            .unwrap()
            .as_str(),
        Some("from-env")
    );
    std::env::remove_var("QR_TEST_ENV_VAR");
}

#[test]
#[serial]
fn test_env_var_empty_uses_default() {
    std::env::set_var("QR_TEST_EMPTY_VAR", "");
    let sc = scope(RenderContext::new());
    assert_eq!(
        call("env_var", &sc, &[s("QR_TEST_EMPTY_VAR"), s("fallback")])
            .unwrap()
            .as_str(),
        Some("fallback")
    );
    assert_eq!(
        call("env_var", &sc, &[s("QR_TEST_EMPTY_VAR"), Value::from(5)])
            .unwrap()
            .as_str(),
        Some("5")
    );
    std::env::remove_var("QR_TEST_EMPTY_VAR");
}

#[test]
#[serial]
fn test_env_var_missing_without_default() {
    std::env::remove_var("QR_TEST_MISSING_VAR");
    let sc = scope(RenderContext::new());
    assert_eq!(
        call("env_var", &sc, &[s("QR_TEST_MISSING_VAR")]).unwrap_err(),
        JinjaError::EnvVarNotSet {
            key: "QR_TEST_MISSING_VAR".to_string()
        }
    );
}

#[test]
fn test_is_incremental_reflects_context() {
    assert_eq!(
        call("is_incremental", &scope(RenderContext::new()), &[]).unwrap(),
        Value::from(false)
    );
    assert_eq!(
        call(
            "is_incremental",
            &scope(RenderContext::new().with_incremental(true)),
            &[]
        )
        .unwrap(),
        Value::from(true)
    );
}

#[test]
fn test_this() {
    assert_eq!(
        call("this", &scope(RenderContext::new()), &[]).unwrap_err(),
        JinjaError::ThisNotSet
    );

    let sc = scope(RenderContext::new().with_this("events").with_schema("analytics"));
    assert_eq!(call("this", &sc, &[]).unwrap().as_str(), Some("analytics.events"));

    let sc = scope(RenderContext::new().with_this("raw.events").with_schema("analytics"));
    assert_eq!(call("this", &sc, &[]).unwrap().as_str(), Some("raw.events"));
}

#[test]
fn test_to_template_value_nested() {
    let mut inner = qr_core::Value::mapping();
    inner.insert("enabled", qr_core::Value::Bool(true));
    let value = qr_core::Value::Sequence(vec![inner, qr_core::Value::Null]);

    let converted = to_template_value(&value);
    assert_eq!(converted.len(), Some(2));
    let first = converted.get_item(&Value::from(0)).unwrap();
    assert_eq!(
        first.get_attr("enabled").unwrap(),
        Value::from(true)
    );
}
