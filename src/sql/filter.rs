//! Filter, sort, and pagination SQL over the JSONB row payload
//!
//! Every predicate targets one column name inside the `data` document via
//! `data->>'name'`. Filters are AND-conjoined; there is no OR and no
//! cross-column predicate. Column names are embedded as quoted JSON-key
//! literals (validated at schema time), filter values are always bound as
//! parameters.

use std::collections::BTreeMap;

use crate::row::{Sort, SortDirection};
use crate::schema::TableSchema;
use crate::sql::sanitize::quote_json_literal;

/// Build the AND-conjoined filter clause against the payload column.
///
/// Returns `(clause, params)`; the clause is `TRUE` when no filters are
/// given. `param_offset` tracks the next `$n` placeholder so callers can
/// prepend their own bound parameters.
///
/// Predicate choice per column type:
/// - numeric columns with numeric-looking values compare as `::numeric`
/// - textual columns fall back to case-insensitive contains (ILIKE)
/// - everything else compares case-insensitive equality
pub fn build_filter_clause(
    schema: &TableSchema,
    filters: &BTreeMap<String, String>,
    param_offset: &mut i32,
) -> (String, Vec<String>) {
    if filters.is_empty() {
        return ("TRUE".to_string(), Vec::new());
    }

    let mut clauses = Vec::new();
    let mut params = Vec::new();

    for (name, value) in filters {
        let field = format!("data->>{}", quote_json_literal(name));
        let column = schema.column(name);

        let numeric = column.map(|c| c.column_type.is_numeric()).unwrap_or(false)
            && value.trim().parse::<f64>().is_ok();
        let textual = column.map(|c| c.column_type.is_textual()).unwrap_or(false);

        if numeric {
            clauses.push(format!("({})::numeric = ${}::numeric", field, param_offset));
            params.push(value.trim().to_string());
        } else if textual {
            clauses.push(format!("({}) ILIKE ${}", field, param_offset));
            params.push(format!("%{}%", value));
        } else {
            clauses.push(format!("LOWER({}) = LOWER(${})", field, param_offset));
            params.push(value.clone());
        }
        *param_offset += 1;
    }

    (clauses.join(" AND "), params)
}

/// Build the ORDER BY clause (without the `ORDER BY` prefix).
///
/// Recognized fields are the system timestamps (`createdAt`/`updatedAt`,
/// snake_case accepted), `id`, and the schema's column names (sorted inside
/// the payload). Anything else silently falls back to `updated_at DESC`.
pub fn build_order_by_clause(schema: &TableSchema, sort: Option<&Sort>) -> String {
    const FALLBACK: &str = "updated_at DESC";

    let Some(sort) = sort else {
        return FALLBACK.to_string();
    };

    let direction = match sort.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };

    match sort.field.as_str() {
        "id" => format!("id {}", direction),
        "createdAt" | "created_at" => format!("created_at {}", direction),
        "updatedAt" | "updated_at" => format!("updated_at {}", direction),
        field => {
            if schema.column(field).is_some() {
                format!("data->>{} {}", quote_json_literal(field), direction)
            } else {
                FALLBACK.to_string()
            }
        }
    }
}

/// Clamp a pagination request and derive the offset.
///
/// Pages are 1-indexed; `limit` is clamped into `1..=max_page_size`,
/// never rejected.
pub fn clamp_pagination(page: u32, limit: u32, max_page_size: u32) -> (u32, u32, i64) {
    let page = page.max(1);
    let limit = limit.clamp(1, max_page_size.max(1));
    let offset = (page as i64 - 1) * limit as i64;
    (page, limit, offset)
}
