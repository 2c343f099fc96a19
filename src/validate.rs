//! Type validation and coercion for row payloads
//!
//! Converts untyped input into schema-conformant values per column type and
//! enforces required/duplicate constraints. Validation collects every error
//! it finds so callers can report a complete picture; a write proceeds only
//! when the error list is empty, never partially.

use regex::Regex;
use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::module::ModuleRegistry;
use crate::multiselect;
use crate::sql::sanitize::{quote_identifier, quote_json_literal};
use crate::types::{ColumnDef, ColumnType};

/// Result of validating one payload: the coerced data and every error found.
/// `data` is only meaningful when `errors` is empty.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schema-driven payload validator
pub struct Validator<'a> {
    columns: &'a [ColumnDef],
    registry: Option<&'a dyn ModuleRegistry>,
}

impl<'a> Validator<'a> {
    pub fn new(columns: &'a [ColumnDef]) -> Self {
        Self {
            columns,
            registry: None,
        }
    }

    /// Attach a module registry; module-typed columns with an available
    /// option list then validate membership instead of free text.
    pub fn with_registry(mut self, registry: &'a dyn ModuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate and coerce a raw payload against the column schema.
    ///
    /// - unknown keys are errors (lookup is case-sensitive)
    /// - missing columns are filled from `default_value` before validation
    /// - a required column that is missing without a default, or explicitly
    ///   null, is an error
    /// - columns are processed in position order
    pub fn validate(&self, raw: &serde_json::Map<String, serde_json::Value>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for key in raw.keys() {
            if !self.columns.iter().any(|c| c.name == *key) {
                outcome.errors.push(format!("Unknown column '{}'", key));
            }
        }

        let mut ordered: Vec<&ColumnDef> = self.columns.iter().collect();
        ordered.sort_by_key(|c| c.position);

        for col in ordered {
            let value = raw.get(&col.name).or(col.default_value.as_ref());

            let Some(value) = value else {
                if col.is_required {
                    outcome
                        .errors
                        .push(format!("Required column '{}' is missing", col.name));
                }
                continue;
            };

            if value.is_null() {
                if col.is_required {
                    outcome
                        .errors
                        .push(format!("Required column '{}' must not be null", col.name));
                } else {
                    outcome
                        .data
                        .insert(col.name.clone(), serde_json::Value::Null);
                }
                continue;
            }

            match self.coerce_value(col, value) {
                Ok(coerced) => {
                    outcome.data.insert(col.name.clone(), coerced);
                }
                Err(e) => outcome.errors.push(e),
            }
        }

        outcome
    }

    /// Coerce one non-null value against one column's type.
    ///
    /// Module columns check option membership when the registry serves an
    /// option list; otherwise they degrade to their base type, and an
    /// unrecognized base degrades to free text.
    pub fn coerce_value(
        &self,
        col: &ColumnDef,
        value: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        if let ColumnType::Module {
            module_id,
            column_type_id,
        } = &col.column_type
        {
            if let Some(options) = self
                .registry
                .and_then(|r| r.options(module_id, column_type_id))
            {
                return coerce_module_selection(col, value, &options);
            }
        }

        coerce_base(col, &col.column_type.effective(), value)
    }
}

/// Validate a module-column value against its option list. Values are
/// multiselect-decoded first so variant-tagged selections compare on the
/// underlying option value.
fn coerce_module_selection(
    col: &ColumnDef,
    value: &serde_json::Value,
    options: &[crate::module::ModuleOption],
) -> std::result::Result<serde_json::Value, String> {
    let s = value
        .as_str()
        .ok_or_else(|| format!("Column '{}' expects a text selection", col.name))?;

    let decoded = multiselect::decode(s);
    for selected in decoded.values() {
        if !options.iter().any(|o| o.value == selected) {
            return Err(format!(
                "Column '{}' has no option '{}'",
                col.name, selected
            ));
        }
    }

    Ok(serde_json::Value::String(s.to_string()))
}

fn coerce_base(
    col: &ColumnDef,
    effective: &ColumnType,
    value: &serde_json::Value,
) -> std::result::Result<serde_json::Value, String> {
    use serde_json::Value;

    match effective {
        ColumnType::Integer | ColumnType::Rating => {
            let parsed = value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()));
            match parsed {
                Some(n) => Ok(Value::Number(n.into())),
                None => Err(format!("Column '{}' expects an integer", col.name)),
            }
        }

        ColumnType::Number | ColumnType::Float | ColumnType::Currency | ColumnType::Percentage => {
            let parsed = value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()));
            match parsed.and_then(serde_json::Number::from_f64) {
                Some(n) => Ok(Value::Number(n)),
                None => Err(format!("Column '{}' expects a number", col.name)),
            }
        }

        ColumnType::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(format!("Column '{}' expects true or false", col.name)),
        },

        ColumnType::Country => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("Column '{}' expects a country code", col.name))?
                .trim();
            if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(Value::String(s.to_uppercase()))
            } else {
                Err(format!(
                    "Column '{}' expects a 2-letter country code",
                    col.name
                ))
            }
        }

        ColumnType::Date => {
            let s = string_input(col, value, "a date")?;
            match chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                Ok(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
                Err(_) => Err(format!("Column '{}' expects a date (YYYY-MM-DD)", col.name)),
            }
        }

        ColumnType::Time => {
            let s = string_input(col, value, "a time")?;
            let t = chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
                .or_else(|_| chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M"));
            match t {
                Ok(t) => Ok(Value::String(t.format("%H:%M:%S").to_string())),
                Err(_) => Err(format!("Column '{}' expects a time (HH:MM[:SS])", col.name)),
            }
        }

        ColumnType::DateTime => {
            let s = string_input(col, value, "a timestamp")?;
            match chrono::DateTime::parse_from_rfc3339(s.trim()) {
                Ok(dt) => Ok(Value::String(dt.to_rfc3339())),
                Err(_) => Err(format!(
                    "Column '{}' expects an RFC 3339 timestamp",
                    col.name
                )),
            }
        }

        ColumnType::Email => {
            let s = string_input(col, value, "an email address")?;
            let valid = s
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if valid {
                Ok(Value::String(s.trim().to_string()))
            } else {
                Err(format!("Column '{}' expects an email address", col.name))
            }
        }

        ColumnType::Url => {
            let s = string_input(col, value, "a URL")?;
            let trimmed = s.trim();
            let valid = ["http://", "https://"]
                .iter()
                .any(|scheme| trimmed.len() > scheme.len() && trimmed.starts_with(scheme));
            if valid {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(format!("Column '{}' expects an http(s) URL", col.name))
            }
        }

        ColumnType::Phone => {
            let s = string_input(col, value, "a phone number")?;
            let trimmed = s.trim();
            let chars_ok = trimmed
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
            let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
            if chars_ok && digits >= 3 {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(format!("Column '{}' expects a phone number", col.name))
            }
        }

        ColumnType::Color => {
            let s = string_input(col, value, "a color")?;
            let re = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
            if re.is_match(s.trim()) {
                Ok(Value::String(s.trim().to_string()))
            } else {
                Err(format!("Column '{}' expects a #RRGGBB color", col.name))
            }
        }

        ColumnType::Text | ColumnType::Textarea => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(format!("Column '{}' expects text", col.name)),
        },

        // effective() never returns Module
        ColumnType::Module { .. } => Err(format!("Column '{}' expects text", col.name)),
    }
}

fn string_input<'v>(
    col: &ColumnDef,
    value: &'v serde_json::Value,
    expected: &str,
) -> std::result::Result<&'v str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Column '{}' expects {}", col.name, expected))
}

// ============================================================================
// Duplicate-constraint check
// ============================================================================

/// Render a coerced value the way it compares against `data->>'col'`
fn comparable_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Scan the table's rows for values conflicting with the candidate payload
/// on columns with `allow_duplicates = false`.
///
/// Runs after coercion so comparisons see normalized values, and before the
/// row is persisted. Strings compare case-insensitively, numbers and
/// booleans exactly. `exclude_row_id` self-excludes the row being updated.
///
/// This is a read-then-write fast-reject with no locking: two concurrent
/// writers can both pass and persist a duplicate.
pub async fn check_duplicates(
    pool: &PgPool,
    config: &StoreConfig,
    table_id: &str,
    columns: &[ColumnDef],
    candidate: &serde_json::Map<String, serde_json::Value>,
    exclude_row_id: Option<&str>,
) -> Result<Vec<String>> {
    let rows_table = quote_identifier(&config.rows_table);
    let mut conflicts = Vec::new();

    for col in columns {
        if col.allow_duplicates {
            continue;
        }
        let Some(value) = candidate.get(&col.name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let field = format!("data->>{}", quote_json_literal(&col.name));
        let comparison = if value.is_string() {
            format!("LOWER({}) = LOWER($2)", field)
        } else {
            format!("{} = $2", field)
        };

        let sql = match exclude_row_id {
            Some(_) => format!(
                "SELECT COUNT(*) FROM {} WHERE table_id = $1 AND {} AND id <> $3",
                rows_table, comparison
            ),
            None => format!(
                "SELECT COUNT(*) FROM {} WHERE table_id = $1 AND {}",
                rows_table, comparison
            ),
        };

        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(table_id)
            .bind(comparable_text(value));
        if let Some(exclude) = exclude_row_id {
            query = query.bind(exclude);
        }

        let count = query.fetch_one(pool).await?;
        if count > 0 {
            conflicts.push(format!(
                "Duplicate value '{}' for column '{}'",
                comparable_text(value),
                col.name
            ));
        }
    }

    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleOption, StaticModuleRegistry};
    use serde_json::json;

    fn payload(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    fn col(name: &str, t: ColumnType) -> ColumnDef {
        ColumnDef::new(name, t)
    }

    // =========================================================================
    // Structural Rules
    // =========================================================================

    #[test]
    fn test_unknown_column_rejected() {
        let columns = vec![col("name", ColumnType::Text)];
        let outcome = Validator::new(&columns).validate(&payload(json!({"mystery": 1})));
        assert_eq!(outcome.errors, vec!["Unknown column 'mystery'"]);
    }

    #[test]
    fn test_column_lookup_is_case_sensitive() {
        let columns = vec![col("Name", ColumnType::Text)];
        let outcome = Validator::new(&columns).validate(&payload(json!({"name": "x"})));
        assert!(outcome.errors.iter().any(|e| e.contains("Unknown column")));
    }

    #[test]
    fn test_required_missing_without_default() {
        let columns = vec![col("sku", ColumnType::Text).required()];
        let outcome = Validator::new(&columns).validate(&payload(json!({})));
        assert_eq!(outcome.errors, vec!["Required column 'sku' is missing"]);
    }

    #[test]
    fn test_required_explicit_null_rejected() {
        let columns = vec![col("sku", ColumnType::Text).required()];
        let outcome = Validator::new(&columns).validate(&payload(json!({"sku": null})));
        assert_eq!(outcome.errors, vec!["Required column 'sku' must not be null"]);
    }

    #[test]
    fn test_optional_null_kept() {
        let columns = vec![col("notes", ColumnType::Textarea)];
        let outcome = Validator::new(&columns).validate(&payload(json!({"notes": null})));
        assert!(outcome.is_valid());
        assert_eq!(outcome.data.get("notes"), Some(&json!(null)));
    }

    #[test]
    fn test_default_applied_before_validation() {
        // the default goes through coercion, so a string default for a
        // numeric column still comes out as a number
        let columns = vec![
            col("qty", ColumnType::Integer).default_value(json!("5")),
            col("sku", ColumnType::Text).required().default_value(json!("none")),
        ];
        let outcome = Validator::new(&columns).validate(&payload(json!({})));
        assert!(outcome.is_valid(), "errors: {:?}", outcome.errors);
        assert_eq!(outcome.data.get("qty"), Some(&json!(5)));
        assert_eq!(outcome.data.get("sku"), Some(&json!("none")));
    }

    #[test]
    fn test_invalid_default_is_an_error() {
        let columns = vec![col("qty", ColumnType::Integer).default_value(json!("lots"))];
        let outcome = Validator::new(&columns).validate(&payload(json!({})));
        assert!(!outcome.is_valid());
    }

    #[test]
    fn test_all_errors_collected() {
        let columns = vec![
            col("qty", ColumnType::Integer),
            col("price", ColumnType::Currency).required(),
        ];
        let outcome =
            Validator::new(&columns).validate(&payload(json!({"qty": "many", "ghost": 1})));
        assert_eq!(outcome.errors.len(), 3);
    }

    #[test]
    fn test_missing_optional_column_stays_absent() {
        let columns = vec![col("notes", ColumnType::Text)];
        let outcome = Validator::new(&columns).validate(&payload(json!({})));
        assert!(outcome.is_valid());
        assert!(!outcome.data.contains_key("notes"));
    }

    // =========================================================================
    // Per-Type Coercion
    // =========================================================================

    #[test]
    fn test_integer_coercion() {
        let columns = vec![col("qty", ColumnType::Integer)];
        let v = Validator::new(&columns);

        assert_eq!(v.validate(&payload(json!({"qty": 7}))).data["qty"], json!(7));
        assert_eq!(
            v.validate(&payload(json!({"qty": "42"}))).data["qty"],
            json!(42)
        );
        assert_eq!(
            v.validate(&payload(json!({"qty": "-3"}))).data["qty"],
            json!(-3)
        );
        assert!(!v.validate(&payload(json!({"qty": "abc"}))).is_valid());
        assert!(!v.validate(&payload(json!({"qty": "12.5"}))).is_valid());
        assert!(!v.validate(&payload(json!({"qty": 12.5}))).is_valid());
    }

    #[test]
    fn test_rating_parses_as_integer() {
        let columns = vec![col("stars", ColumnType::Rating)];
        let v = Validator::new(&columns);
        assert_eq!(
            v.validate(&payload(json!({"stars": "4"}))).data["stars"],
            json!(4)
        );
        assert!(!v.validate(&payload(json!({"stars": "great"}))).is_valid());
    }

    #[test]
    fn test_float_family_coercion() {
        for t in [
            ColumnType::Number,
            ColumnType::Float,
            ColumnType::Currency,
            ColumnType::Percentage,
        ] {
            let columns = vec![col("amount", t)];
            let v = Validator::new(&columns);
            assert_eq!(
                v.validate(&payload(json!({"amount": "19.99"}))).data["amount"],
                json!(19.99)
            );
            assert_eq!(
                v.validate(&payload(json!({"amount": 5}))).data["amount"],
                json!(5.0)
            );
            assert!(!v.validate(&payload(json!({"amount": "pricey"}))).is_valid());
        }
    }

    #[test]
    fn test_boolean_strict() {
        let columns = vec![col("active", ColumnType::Boolean)];
        let v = Validator::new(&columns);

        assert_eq!(
            v.validate(&payload(json!({"active": true}))).data["active"],
            json!(true)
        );
        assert_eq!(
            v.validate(&payload(json!({"active": "false"}))).data["active"],
            json!(false)
        );
        // only true/false are accepted, no 1/0/yes/no
        assert!(!v.validate(&payload(json!({"active": "yes"}))).is_valid());
        assert!(!v.validate(&payload(json!({"active": 1}))).is_valid());
    }

    #[test]
    fn test_country_uppercased_two_letter() {
        let columns = vec![col("origin", ColumnType::Country)];
        let v = Validator::new(&columns);

        assert_eq!(
            v.validate(&payload(json!({"origin": "de"}))).data["origin"],
            json!("DE")
        );
        assert!(!v.validate(&payload(json!({"origin": "DEU"}))).is_valid());
        assert!(!v.validate(&payload(json!({"origin": "d1"}))).is_valid());
    }

    #[test]
    fn test_date_time_datetime() {
        let columns = vec![
            col("day", ColumnType::Date),
            col("at", ColumnType::Time),
            col("ts", ColumnType::DateTime),
        ];
        let v = Validator::new(&columns);

        let ok = v.validate(&payload(json!({
            "day": "2024-02-29",
            "at": "09:30",
            "ts": "2024-01-15T10:30:00Z"
        })));
        assert!(ok.is_valid(), "errors: {:?}", ok.errors);
        assert_eq!(ok.data["at"], json!("09:30:00"));

        // 2023 is not a leap year
        assert!(!v.validate(&payload(json!({"day": "2023-02-29"}))).is_valid());
        assert!(!v.validate(&payload(json!({"at": "25:00"}))).is_valid());
        assert!(!v.validate(&payload(json!({"ts": "2024-01-15"}))).is_valid());
    }

    #[test]
    fn test_email_url_phone_permissive() {
        let columns = vec![
            col("mail", ColumnType::Email),
            col("site", ColumnType::Url),
            col("tel", ColumnType::Phone),
        ];
        let v = Validator::new(&columns);

        let ok = v.validate(&payload(json!({
            "mail": "a@b.co",
            "site": "https://example.com",
            "tel": "+49 (30) 123-456"
        })));
        assert!(ok.is_valid(), "errors: {:?}", ok.errors);

        assert!(!v.validate(&payload(json!({"mail": "nobody"}))).is_valid());
        assert!(!v.validate(&payload(json!({"site": "ftp://x"}))).is_valid());
        assert!(!v.validate(&payload(json!({"tel": "call me"}))).is_valid());
    }

    #[test]
    fn test_color_format() {
        let columns = vec![col("shade", ColumnType::Color)];
        let v = Validator::new(&columns);

        assert!(v.validate(&payload(json!({"shade": "#A1b2C3"}))).is_valid());
        assert!(!v.validate(&payload(json!({"shade": "#abc"}))).is_valid());
        assert!(!v.validate(&payload(json!({"shade": "red"}))).is_valid());
    }

    #[test]
    fn test_text_accepts_scalars() {
        let columns = vec![col("label", ColumnType::Text)];
        let v = Validator::new(&columns);

        assert_eq!(
            v.validate(&payload(json!({"label": 42}))).data["label"],
            json!("42")
        );
        assert!(!v.validate(&payload(json!({"label": {"no": 1}}))).is_valid());
    }

    // =========================================================================
    // Module Types
    // =========================================================================

    #[test]
    fn test_module_type_without_registry_uses_base_type() {
        let columns = vec![col("origin", ColumnType::parse("geo:country").unwrap())];
        let v = Validator::new(&columns);
        assert_eq!(
            v.validate(&payload(json!({"origin": "fr"}))).data["origin"],
            json!("FR")
        );
    }

    #[test]
    fn test_module_type_unknown_base_is_free_text() {
        let columns = vec![col("source", ColumnType::parse("crm:lead_source").unwrap())];
        let v = Validator::new(&columns);
        assert!(v.validate(&payload(json!({"source": "anything"}))).is_valid());
    }

    #[test]
    fn test_module_type_with_options_checks_membership() {
        let registry = StaticModuleRegistry::new().with_options(
            "crm",
            "lead_source",
            vec![ModuleOption::new("web", "Web"), ModuleOption::new("ref", "Referral")],
        );
        let columns = vec![col("source", ColumnType::parse("crm:lead_source").unwrap())];
        let v = Validator::new(&columns).with_registry(&registry);

        assert!(v.validate(&payload(json!({"source": "web"}))).is_valid());
        assert!(!v.validate(&payload(json!({"source": "fax"}))).is_valid());
    }

    #[test]
    fn test_module_type_options_accept_tagged_multiselect() {
        let registry = StaticModuleRegistry::new().with_options(
            "crm",
            "contacts",
            vec![ModuleOption::new("acme", "Acme"), ModuleOption::new("jane", "Jane")],
        );
        let columns = vec![col("who", ColumnType::parse("crm:contacts").unwrap())];
        let v = Validator::new(&columns).with_registry(&registry);

        let outcome = v.validate(&payload(json!({"who": "acme:business,jane:personal"})));
        assert!(outcome.is_valid(), "errors: {:?}", outcome.errors);
        // the stored value keeps its variant tags
        assert_eq!(outcome.data["who"], json!("acme:business,jane:personal"));
    }

    #[test]
    fn test_module_type_missing_options_degrades_not_fails() {
        let registry = StaticModuleRegistry::new();
        let columns = vec![col("source", ColumnType::parse("crm:lead_source").unwrap())];
        let v = Validator::new(&columns).with_registry(&registry);
        assert!(v.validate(&payload(json!({"source": "anything"}))).is_valid());
    }

    // =========================================================================
    // Totality: a value xor a non-empty error list, never both or neither
    // =========================================================================

    #[test]
    fn test_validator_totality() {
        let columns = vec![
            col("a", ColumnType::Integer),
            col("b", ColumnType::Boolean),
            col("c", ColumnType::Date),
        ];
        let v = Validator::new(&columns);

        for input in [
            json!({"a": 1}),
            json!({"a": "nope"}),
            json!({"b": "true"}),
            json!({"b": []}),
            json!({"c": "2024-06-01"}),
            json!({"c": 20240601}),
        ] {
            let key = input.as_object().unwrap().keys().next().unwrap().clone();
            let outcome = v.validate(&payload(input));
            let coerced = outcome.data.contains_key(&key);
            let errored = !outcome.errors.is_empty();
            assert!(coerced ^ errored, "not total for key {}", key);
        }
    }

    #[test]
    fn test_comparable_text() {
        assert_eq!(comparable_text(&json!("X")), "X");
        assert_eq!(comparable_text(&json!(19.99)), "19.99");
        assert_eq!(comparable_text(&json!(true)), "true");
    }
}
