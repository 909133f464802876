//! SQL literal and name helpers for dynamically built ledger statements.

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator.
///
/// # Examples
/// ```
/// use kl_db::sql_utils::split_schema;
/// assert_eq!(split_schema("schema_version"), (None, "schema_version"));
/// assert_eq!(split_schema("meta.schema_version"), (Some("meta"), "schema_version"));
/// ```
pub fn split_schema(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Check that a ledger table name is a plain, optionally schema-qualified,
/// identifier. The name is interpolated into DDL unquoted so that each
/// backend applies its own case folding.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty()
                && part.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
