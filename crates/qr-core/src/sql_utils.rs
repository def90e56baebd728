//! SQL identifier quoting and light statement inspection
//!
//! Generated statements quote every identifier so model names cannot break
//! out of the surrounding SQL.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes, following the SQL standard.
///
/// # Examples
/// ```
/// use qr_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// # Examples
/// ```
/// use qr_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("users"), r#""users""#);
/// assert_eq!(quote_qualified("staging.orders"), r#""staging"."orders""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified name into `(schema, table)`.
///
/// # Examples
/// ```
/// use qr_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("users"), (None, "users"));
/// assert_eq!(split_qualified_name("staging.orders"), (Some("staging"), "orders"));
/// ```
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Upper-cased first word of a SQL text, ignoring leading whitespace.
///
/// # Examples
/// ```
/// use qr_core::sql_utils::leading_keyword;
/// assert_eq!(leading_keyword("  drop table x").as_deref(), Some("DROP"));
/// assert_eq!(leading_keyword("   "), None);
/// ```
pub fn leading_keyword(sql: &str) -> Option<String> {
    sql.trim_start()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_uppercase)
}

/// Split SQL text on `;` into trimmed, non-blank statements.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
