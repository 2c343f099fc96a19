//! Row-related types for the record engine
//!
//! Includes RowRecord, ListQuery, Sort, and the paginated RowPage response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::TableSchema;

/// One row of a user-defined table. The payload is an opaque JSON object
/// whose keys are column names of the owning table's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRecord {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning table
    #[serde(rename = "tableId")]
    pub table_id: String,
    /// Column name → coerced value
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Identity that created the row
    #[serde(rename = "createdBy")]
    pub created_by: String,
    /// Timestamp when the row was created
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Timestamp when the row was last updated; refreshed server-side on
    /// every mutation, never client-supplied
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl RowRecord {
    /// Flat wire shape: id, table metadata, and data keys at the top level.
    /// Payload keys never shadow the envelope fields.
    pub fn flatten(&self, table: &TableSchema) -> serde_json::Value {
        let mut flat = serde_json::Map::new();
        flat.insert("id".to_string(), serde_json::json!(self.id));
        flat.insert("tableId".to_string(), serde_json::json!(self.table_id));
        flat.insert("tableName".to_string(), serde_json::json!(table.name));
        flat.insert("tableType".to_string(), serde_json::json!(table.table_type));

        for (key, value) in &self.data {
            flat.entry(key.clone()).or_insert_with(|| value.clone());
        }

        flat.insert("createdAt".to_string(), serde_json::json!(self.created_at));
        flat.insert("updatedAt".to_string(), serde_json::json!(self.updated_at));

        serde_json::Value::Object(flat)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One-field sort specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

/// Listing request: AND-conjoined per-column filters, one optional sort,
/// offset pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    /// Column name → filter value; all named filters must match
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Optional sort; unrecognized fields fall back to `updatedAt desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// 1-indexed page
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size, clamped to the configured maximum
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            sort: None,
            page: 1,
            limit: 100,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a per-column filter
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    /// Set the sort
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the pagination window
    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }
}

/// One page of listing results with derived pagination fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowPage {
    pub data: Vec<RowRecord>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPrevPage")]
    pub has_prev_page: bool,
}

impl RowPage {
    /// Assemble a page, deriving totals from the count and window
    pub fn new(data: Vec<RowRecord>, total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            ((total as u64).div_ceil(limit.max(1) as u64)) as u32
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDef, ColumnType, TableType, Visibility};

    fn row(id: &str, data: serde_json::Value) -> RowRecord {
        RowRecord {
            id: id.to_string(),
            table_id: "tbl-1".to_string(),
            data: data.as_object().unwrap().clone(),
            created_by: "tester".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-02T00:00:00Z".to_string(),
        }
    }

    fn schema() -> TableSchema {
        TableSchema {
            id: "tbl-1".to_string(),
            name: "Products".to_string(),
            description: None,
            table_type: TableType::Sale,
            for_sale: true,
            visibility: Visibility::Public,
            created_by: "tester".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            columns: vec![ColumnDef::new("sku", ColumnType::Text)],
        }
    }

    #[test]
    fn test_flatten_shape() {
        let flat = row("r-1", serde_json::json!({"sku": "A1", "qty": 3})).flatten(&schema());
        assert_eq!(flat["id"], "r-1");
        assert_eq!(flat["tableName"], "Products");
        assert_eq!(flat["tableType"], "sale");
        assert_eq!(flat["sku"], "A1");
        assert_eq!(flat["qty"], 3);
        assert_eq!(flat["updatedAt"], "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_flatten_payload_cannot_shadow_envelope() {
        let flat = row("r-1", serde_json::json!({"id": "spoofed"})).flatten(&schema());
        assert_eq!(flat["id"], "r-1");
    }

    #[test]
    fn test_list_query_builder() {
        let query = ListQuery::new()
            .filter("color", "red")
            .sort(Sort::desc("price"))
            .paginate(2, 25);

        assert_eq!(query.filters.get("color"), Some(&"red".to_string()));
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 25);
        assert_eq!(query.sort.as_ref().unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_list_query_deserialization_defaults() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 100);
        assert!(query.filters.is_empty());
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_row_page_derived_fields() {
        let page = RowPage::new(vec![], 95, 2, 10);
        assert_eq!(page.total_pages, 10);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);

        let last = RowPage::new(vec![], 95, 10, 10);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let empty = RowPage::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    #[test]
    fn test_row_page_exact_multiple() {
        let page = RowPage::new(vec![], 100, 1, 10);
        assert_eq!(page.total_pages, 10);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);
    }
}
