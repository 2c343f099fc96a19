//! SQL quoting utilities
//!
//! Table names from configuration are quoted as identifiers; user column
//! names only ever appear as JSON keys inside `data->>'...'` expressions and
//! are quoted as string literals. Everything else is bound as a parameter.

/// Quote a SQL identifier to make it safe for use in queries
///
/// # Example
/// ```
/// use gridstore::sql::quote_identifier;
///
/// let quoted = quote_identifier("table_data");
/// assert_eq!(quoted, "\"table_data\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    // Escape any double quotes in the identifier by doubling them
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Quote a JSON key as a SQL string literal for `data->>'key'` expressions
///
/// # Example
/// ```
/// use gridstore::sql::quote_json_literal;
///
/// let quoted = quote_json_literal("unit price");
/// assert_eq!(quoted, "'unit price'");
/// ```
pub fn quote_json_literal(key: &str) -> String {
    let escaped = key.replace('\'', "''");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_simple() {
        assert_eq!(quote_identifier("table_data"), "\"table_data\"");
        assert_eq!(quote_identifier("user_tables"), "\"user_tables\"");
    }

    #[test]
    fn test_quote_identifier_with_quotes() {
        assert_eq!(
            quote_identifier("table\"with\"quotes"),
            "\"table\"\"with\"\"quotes\""
        );
    }

    #[test]
    fn test_quote_identifier_empty() {
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_quote_json_literal_simple() {
        assert_eq!(quote_json_literal("price"), "'price'");
        assert_eq!(quote_json_literal("unit price"), "'unit price'");
    }

    #[test]
    fn test_quote_json_literal_escapes_single_quotes() {
        assert_eq!(quote_json_literal("it's"), "'it''s'");
    }
}
