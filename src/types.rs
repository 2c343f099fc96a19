//! Core type definitions for the record engine
//!
//! Includes column types, column definitions, table kinds, and the derived
//! protected-column set.

use serde::{Deserialize, Serialize};

// ============================================================================
// Column Types
// ============================================================================

/// Column type for dynamic table schemas.
///
/// A closed set of base types plus a `Module` variant for plugin-provided
/// column types. The wire form is the lowercase tag (e.g. `"currency"`), or
/// `"module_id:column_type_id"` for module types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Text,
    Textarea,
    /// Generic numeric field, parsed as floating point
    Number,
    Integer,
    Float,
    Currency,
    Percentage,
    Boolean,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Wall-clock time, `HH:MM` or `HH:MM:SS`
    Time,
    /// RFC 3339 timestamp
    DateTime,
    Email,
    Url,
    Phone,
    /// Two-letter country code, upper-cased on coercion
    Country,
    /// Hex color, `#RRGGBB`
    Color,
    /// Small integer rating
    Rating,
    /// Plugin-provided column type. Format validation delegates to the base
    /// type parsed from `column_type_id`; unrecognized bases fall back to
    /// free text.
    Module {
        module_id: String,
        column_type_id: String,
    },
}

impl ColumnType {
    /// Parse the wire form. Anything containing a colon is a module type.
    pub fn parse(s: &str) -> Result<Self, String> {
        if let Some((module_id, column_type_id)) = s.split_once(':') {
            if module_id.is_empty() || column_type_id.is_empty() {
                return Err(format!("Invalid module column type '{}'", s));
            }
            return Ok(ColumnType::Module {
                module_id: module_id.to_string(),
                column_type_id: column_type_id.to_string(),
            });
        }

        match s {
            "text" => Ok(ColumnType::Text),
            "textarea" => Ok(ColumnType::Textarea),
            "number" => Ok(ColumnType::Number),
            "integer" => Ok(ColumnType::Integer),
            "float" => Ok(ColumnType::Float),
            "currency" => Ok(ColumnType::Currency),
            "percentage" => Ok(ColumnType::Percentage),
            "boolean" => Ok(ColumnType::Boolean),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "datetime" => Ok(ColumnType::DateTime),
            "email" => Ok(ColumnType::Email),
            "url" => Ok(ColumnType::Url),
            "phone" => Ok(ColumnType::Phone),
            "country" => Ok(ColumnType::Country),
            "color" => Ok(ColumnType::Color),
            "rating" => Ok(ColumnType::Rating),
            other => Err(format!("Unknown column type '{}'", other)),
        }
    }

    /// Wire form of this type
    pub fn as_str(&self) -> String {
        match self {
            ColumnType::Text => "text".to_string(),
            ColumnType::Textarea => "textarea".to_string(),
            ColumnType::Number => "number".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::Float => "float".to_string(),
            ColumnType::Currency => "currency".to_string(),
            ColumnType::Percentage => "percentage".to_string(),
            ColumnType::Boolean => "boolean".to_string(),
            ColumnType::Date => "date".to_string(),
            ColumnType::Time => "time".to_string(),
            ColumnType::DateTime => "datetime".to_string(),
            ColumnType::Email => "email".to_string(),
            ColumnType::Url => "url".to_string(),
            ColumnType::Phone => "phone".to_string(),
            ColumnType::Country => "country".to_string(),
            ColumnType::Color => "color".to_string(),
            ColumnType::Rating => "rating".to_string(),
            ColumnType::Module {
                module_id,
                column_type_id,
            } => format!("{}:{}", module_id, column_type_id),
        }
    }

    /// The type that drives format validation and coercion.
    ///
    /// For module types this is the base type parsed from `column_type_id`;
    /// a `column_type_id` that is not a recognized base type validates as
    /// free text. Base types resolve to themselves.
    pub fn effective(&self) -> ColumnType {
        match self {
            ColumnType::Module { column_type_id, .. } => match Self::parse(column_type_id) {
                Ok(ColumnType::Module { .. }) | Err(_) => ColumnType::Text,
                Ok(base) => base,
            },
            other => other.clone(),
        }
    }

    /// Whether coerced values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.effective(),
            ColumnType::Number
                | ColumnType::Integer
                | ColumnType::Float
                | ColumnType::Currency
                | ColumnType::Percentage
                | ColumnType::Rating
        )
    }

    /// Whether values of this type support substring matching in filters
    pub fn is_textual(&self) -> bool {
        matches!(
            self.effective(),
            ColumnType::Text
                | ColumnType::Textarea
                | ColumnType::Email
                | ColumnType::Url
                | ColumnType::Phone
        )
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for ColumnType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        Self::parse(&s)
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> String {
        t.as_str()
    }
}

// ============================================================================
// Table Kind and Visibility
// ============================================================================

/// Kind of a user-defined table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Default,
    Sale,
    Rent,
}

impl Default for TableType {
    fn default() -> Self {
        TableType::Default
    }
}

/// Who can read a table's rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
    Shared,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

impl Visibility {
    /// Public and shared tables are readable without per-table grants
    pub fn is_publicly_readable(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::Shared)
    }
}

/// Column names with system semantics for a given table kind.
///
/// Derived, never stored: sale tables depend on `price`/`qty` for inventory
/// bookkeeping, rent tables on `price`/`used` for availability. Protected
/// columns reject rename, required-flag, and duplicate-flag edits.
pub fn protected_columns(table_type: TableType, for_sale: bool) -> &'static [&'static str] {
    match table_type {
        TableType::Sale => &["price", "qty"],
        TableType::Rent => &["price", "used"],
        TableType::Default => {
            if for_sale {
                &["price", "qty"]
            } else {
                &[]
            }
        }
    }
}

// ============================================================================
// Column Definitions
// ============================================================================

fn default_allow_duplicates() -> bool {
    true
}

/// Column definition for a dynamic table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Stable identifier; survives renames. Assigned by the store when a
    /// schema is created with blank ids.
    #[serde(default)]
    pub id: String,

    /// Column name; letters and spaces only, unique per table
    /// case-insensitively
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether a non-null value is required on every row (default: false)
    #[serde(rename = "isRequired", default)]
    pub is_required: bool,

    /// Whether duplicate values are allowed across rows (default: true)
    #[serde(rename = "allowDuplicates", default = "default_allow_duplicates")]
    pub allow_duplicates: bool,

    /// Default applied to missing values before validation
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<serde_json::Value>,

    /// Display and validation order; contiguous from 0 within a table
    #[serde(default)]
    pub position: i32,
}

impl ColumnDef {
    /// Create a new column definition with a name and type
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            column_type,
            is_required: false,
            allow_duplicates: true,
            default_value: None,
            position: 0,
        }
    }

    /// Require a non-null value on every row
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Forbid duplicate values across the table's rows
    pub fn no_duplicates(mut self) -> Self {
        self.allow_duplicates = false;
        self
    }

    /// Set a default value
    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Set the position
    pub fn at(mut self, position: i32) -> Self {
        self.position = position;
        self
    }
}
