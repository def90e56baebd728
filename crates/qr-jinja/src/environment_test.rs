use super::*;
use crate::tracker::DependencyTracker;

#[test]
fn test_render_ref_records_dependency() {
    let tracker = Arc::new(DependencyTracker::new());
    let renderer = TemplateRenderer::new().with_collector(tracker.clone());
    let template = renderer
        .parse(
            "customer_orders",
            "SELECT * FROM {{ ref('orders') }} JOIN {{ ref('customers') }} USING (customer_id)",
        )
        .unwrap();

    let ctx = RenderContext::new()
        .with_model("customer_orders")
        .with_schema("analytics");
    let sql = renderer.render(&template, &ctx, None).unwrap();

    assert_eq!(
        sql,
        "SELECT * FROM analytics.orders JOIN analytics.customers USING (customer_id)"
    );
    assert_eq!(
        tracker.dependencies_of("customer_orders"),
        vec!["customers", "orders"]
    );
}

#[test]
fn test_parse_does_not_record_dependencies() {
    let tracker = Arc::new(DependencyTracker::new());
    let renderer = TemplateRenderer::new().with_collector(tracker.clone());
    renderer.parse("m", "SELECT * FROM {{ ref('orders') }}").unwrap();
    assert!(tracker.edges().is_empty());
}

#[test]
fn test_parse_rejects_malformed_template() {
    let err = TemplateRenderer::new()
        .parse("broken", "SELECT {{ ref('orders') ")
        .unwrap_err();
    assert!(matches!(err, JinjaError::TemplateSyntax { ref name, .. } if name == "broken"));
}

#[test]
fn test_parsed_template_is_reusable() {
    let renderer = TemplateRenderer::new();
    let template = renderer.parse("m", "SELECT {{ var('n') }}").unwrap();

    let one = renderer
        .render(&template, &RenderContext::new().with_var("n", 1i64), None)
        .unwrap();
    let two = renderer
        .render(&template, &RenderContext::new().with_var("n", 2i64), None)
        .unwrap();
    assert_eq!(one, "SELECT 1");
    assert_eq!(two, "SELECT 2");
}

#[test]
fn test_render_surfaces_typed_function_errors() {
    let renderer = TemplateRenderer::new();
    let template = renderer.parse("m", "SELECT {{ var('missing') }}").unwrap();
    let err = renderer
        .render(&template, &RenderContext::new(), None)
        .unwrap_err();
    assert_eq!(
        err,
        JinjaError::VariableNotFound {
            name: "missing".to_string()
        }
    );

    let template = renderer.parse("m", "SELECT * FROM {{ this() }}").unwrap();
    let err = renderer
        .render(&template, &RenderContext::new(), None)
        .unwrap_err();
    assert_eq!(err, JinjaError::ThisNotSet);
}

#[test]
fn test_render_with_auxiliary_data() {
    let mut data = qr_core::Value::mapping();
    data.insert("table", qr_core::Value::from("events"));
    data.insert("limit", qr_core::Value::Integer(5));

    let renderer = TemplateRenderer::new();
    let template = renderer
        .parse("m", "SELECT * FROM {{ table }} LIMIT {{ limit }}")
        .unwrap();
    let sql = renderer
        .render(&template, &RenderContext::new(), Some(&data))
        .unwrap();
    assert_eq!(sql, "SELECT * FROM events LIMIT 5");
}

#[test]
fn test_undefined_data_field_is_an_error() {
    let mut data = qr_core::Value::mapping();
    data.insert("table", qr_core::Value::from("events"));

    let renderer = TemplateRenderer::new();
    let template = renderer.parse("m", "SELECT {{ missing_column }}").unwrap();
    let err = renderer
        .render(&template, &RenderContext::new(), Some(&data))
        .unwrap_err();
    assert!(matches!(err, JinjaError::RenderError(_)));

    let template = renderer.parse("m", "SELECT {{ table.nope }}").unwrap();
    assert!(renderer
        .render(&template, &RenderContext::new(), Some(&data))
        .is_err());
}

#[test]
fn test_custom_delimiters_leave_default_syntax_literal() {
    let renderer = TemplateRenderer::with_delimiters(
        Delimiters::variable("[[", "]]")
            .with_block("[%", "%]")
            .with_comment("[#", "#]"),
    )
    .unwrap();

    let sql = renderer
        .render_str(
            "m",
            "SELECT '{{ literal }}' AS raw, [[ ref('orders') ]] AS src",
            &RenderContext::new(),
        )
        .unwrap();
    assert_eq!(sql, "SELECT '{{ literal }}' AS raw, orders AS src");
}

#[test]
fn test_empty_delimiters_rejected() {
    let result = TemplateRenderer::with_delimiters(Delimiters::variable("", "]]"));
    assert!(matches!(result, Err(JinjaError::InvalidDelimiters(_))));
}

#[test]
fn test_is_incremental_in_conditional() {
    let renderer = TemplateRenderer::new();
    let template = renderer
        .parse(
            "events",
            "SELECT * FROM raw_events{% if is_incremental() %} WHERE ts > (SELECT MAX(ts) FROM {{ this() }}){% endif %}",
        )
        .unwrap();

    let full = renderer
        .render(&template, &RenderContext::new().with_this("events"), None)
        .unwrap();
    assert_eq!(full, "SELECT * FROM raw_events");

    let incremental = renderer
        .render(
            &template,
            &RenderContext::new().with_this("events").with_incremental(true),
            None,
        )
        .unwrap();
    assert_eq!(
        incremental,
        "SELECT * FROM raw_events WHERE ts > (SELECT MAX(ts) FROM events)"
    );
}

#[test]
fn test_trailing_newline_kept() {
    let sql = TemplateRenderer::new()
        .render_str("m", "SELECT 1\n", &RenderContext::new())
        .unwrap();
    assert_eq!(sql, "SELECT 1\n");
}
