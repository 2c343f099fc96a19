//! Error types for record engine operations

use thiserror::Error;

/// Errors that can occur during record engine operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more fields failed validation. Carries the complete per-field
    /// error list; the target row is never partially written.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Unknown table, or access denied. The two are deliberately not
    /// distinguished so callers cannot probe for table existence.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// Duplicate value on a column with `allow_duplicates = false`.
    #[error("Conflict: {}", .0.join("; "))]
    Conflict(Vec<String>),

    /// Request payload is not the JSON shape the operation expects.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation(errors)
    }

    pub fn validation_msg(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }

    pub fn table_not_found(id: impl Into<String>) -> Self {
        Self::TableNotFound(id.into())
    }

    pub fn row_not_found(id: impl Into<String>) -> Self {
        Self::RowNotFound(id.into())
    }

    pub fn conflict(conflicts: Vec<String>) -> Self {
        Self::Conflict(conflicts)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_field_errors() {
        let err = StoreError::validation(vec![
            "Column 'price' expects a number".to_string(),
            "Required column 'sku' is missing".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("price"));
        assert!(msg.contains("sku"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn test_conflict_display() {
        let err = StoreError::conflict(vec!["Duplicate value for column 'sku'".to_string()]);
        assert!(err.to_string().starts_with("Conflict:"));
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::table_not_found("tbl-1");
        assert_eq!(err.to_string(), "Table not found: tbl-1");
    }
}
