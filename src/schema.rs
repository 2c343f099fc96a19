//! Table-schema types for the record engine
//!
//! Includes TableSchema, CreateTableRequest, UpdateTableRequest, and the
//! column-set validation rules (name hygiene, uniqueness, positions,
//! protected-column edits).

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ColumnDef, TableType, Visibility, protected_columns};

/// Schema of one user-defined table, stored in the `user_tables` metadata
/// table with its columns as a JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Unique identifier (UUID)
    pub id: String,
    /// Human-readable table name
    pub name: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Table kind
    #[serde(rename = "tableType")]
    pub table_type: TableType,
    /// Whether row mutations feed the inventory ledger
    #[serde(rename = "forSale")]
    pub for_sale: bool,
    /// Read visibility
    pub visibility: Visibility,
    /// Identity that created the table
    #[serde(rename = "createdBy")]
    pub created_by: String,
    /// Timestamp when the table was created
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Timestamp when the table was last updated
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    /// Ordered column definitions
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Look up a column by name (case-sensitive, matching row payload keys)
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether row mutations on this table feed the inventory ledger
    pub fn tracks_inventory(&self) -> bool {
        self.for_sale || self.table_type == TableType::Sale
    }

    /// Whether the named column carries system semantics for this table kind
    pub fn is_protected(&self, column_name: &str) -> bool {
        protected_columns(self.table_type, self.for_sale)
            .iter()
            .any(|p| p.eq_ignore_ascii_case(column_name))
    }
}

/// Request to create a new table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tableType", default)]
    pub table_type: TableType,
    #[serde(rename = "forSale", default)]
    pub for_sale: bool,
    #[serde(default)]
    pub visibility: Visibility,
    pub columns: Vec<ColumnDef>,
}

impl CreateTableRequest {
    /// Create a new request with defaults (private, non-sale)
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            table_type: TableType::Default,
            for_sale: false,
            visibility: Visibility::Private,
            columns,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the table kind
    pub fn with_table_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// Mark the table as for-sale
    pub fn for_sale(mut self) -> Self {
        self.for_sale = true;
        self
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Request to update an existing table. The table kind is fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTableRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub columns: Option<Vec<ColumnDef>>,
}

impl UpdateTableRequest {
    /// Create an empty update request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set new visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Set new columns
    pub fn with_columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = Some(columns);
        self
    }
}

// ============================================================================
// Column-set validation
// ============================================================================

/// Validate a column name: letters and spaces only, starting with a letter.
///
/// Column names are JSON payload keys, never SQL identifiers, so the rule is
/// a display-name hygiene check rather than an identifier grammar.
pub fn validate_column_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Column name cannot be empty".to_string());
    }

    let re = Regex::new(r"^[A-Za-z][A-Za-z ]*$").unwrap();
    if !re.is_match(name) {
        return Err(format!(
            "Column name '{}' is invalid. Must start with a letter and contain only letters and spaces.",
            name
        ));
    }

    Ok(())
}

/// Validate a full column set: per-name hygiene plus case-insensitive
/// uniqueness. Returns every problem found.
pub fn validate_columns(columns: &[ColumnDef]) -> Vec<String> {
    let mut errors = Vec::new();

    for col in columns {
        if let Err(e) = validate_column_name(&col.name) {
            errors.push(e);
        }
    }

    let mut seen: Vec<String> = Vec::new();
    for col in columns {
        let lower = col.name.to_lowercase();
        if seen.contains(&lower) {
            errors.push(format!("Duplicate column name '{}'", col.name));
        } else {
            seen.push(lower);
        }
    }

    errors
}

/// Sort columns by position and reassign contiguous positions from 0.
///
/// Swapping two positions and re-normalizing yields the swapped order, so
/// callers can reorder without renumbering the whole set.
pub fn normalize_positions(columns: &mut [ColumnDef]) {
    columns.sort_by_key(|c| c.position);
    for (i, col) in columns.iter_mut().enumerate() {
        col.position = i as i32;
    }
}

/// Check a proposed column set against the protected columns of an existing
/// table. Protected columns cannot be removed, renamed, or have their
/// required/duplicate flags changed. Columns are matched by id.
pub fn check_protected_edits(existing: &TableSchema, new_columns: &[ColumnDef]) -> Vec<String> {
    let mut errors = Vec::new();

    for old in &existing.columns {
        if !existing.is_protected(&old.name) {
            continue;
        }

        match new_columns.iter().find(|c| c.id == old.id) {
            None => {
                errors.push(format!("Protected column '{}' cannot be removed", old.name));
            }
            Some(new) => {
                if new.name != old.name {
                    errors.push(format!("Protected column '{}' cannot be renamed", old.name));
                }
                if new.is_required != old.is_required {
                    errors.push(format!(
                        "Protected column '{}' cannot change its required flag",
                        old.name
                    ));
                }
                if new.allow_duplicates != old.allow_duplicates {
                    errors.push(format!(
                        "Protected column '{}' cannot change its duplicate flag",
                        old.name
                    ));
                }
            }
        }
    }

    errors
}
