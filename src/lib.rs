//! # gridstore
//!
//! A schema-driven dynamic record engine over PostgreSQL JSONB.
//!
//! Users define "tables" with typed columns at runtime, then
//! create/read/update/delete/filter/paginate rows whose payload is an
//! opaque per-row JSON document validated against that table's column
//! schema. Table schemas live in a metadata table; row payloads share one
//! JSONB data table keyed by table id.
//!
//! ## Features
//!
//! - **Runtime Table Schemas**: typed, ordered column definitions with
//!   required/duplicate constraints, defaults, and protected system columns
//! - **Validation & Coercion**: every write is coerced per column type and
//!   reports its full error list; no partial writes
//! - **Dynamic Querying**: AND-conjoined per-column filters, one-field
//!   sorting, and offset pagination over the JSON payload
//! - **Mass Actions**: bulk delete/export/set-column-value with per-row
//!   best-effort error reporting
//! - **Inventory Ledger**: for-sale tables mirror row mutations into an
//!   append-only transaction ledger with read-time summaries and stock
//!   alerts
//! - **Grouped Multiselect**: codec for `value:personal` / `value:business`
//!   tagged multi-value strings used by module column types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridstore::{
//!     ColumnDef, ColumnType, CreateTableRequest, ListQuery, RecordStore, StoreConfig, TableType,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::builder("postgres://localhost/mydb").build();
//!     let store = RecordStore::new(config).await?;
//!
//!     // Define a table
//!     let table = store
//!         .create_table(
//!             "alice",
//!             CreateTableRequest::new(
//!                 "Products",
//!                 vec![
//!                     ColumnDef::new("sku", ColumnType::Text).required().no_duplicates(),
//!                     ColumnDef::new("price", ColumnType::Currency).required(),
//!                     ColumnDef::new("qty", ColumnType::Integer),
//!                 ],
//!             )
//!             .with_table_type(TableType::Sale),
//!         )
//!         .await?;
//!
//!     // Create a row; values are coerced against the column types
//!     let row = store
//!         .create_row(
//!             "alice",
//!             &table.id,
//!             serde_json::json!({"sku": "A1", "price": "19.99", "qty": 10}),
//!         )
//!         .await?;
//!
//!     // Filter, sort, paginate
//!     let page = store
//!         .list_rows(
//!             "alice",
//!             &table.id,
//!             &ListQuery::new().filter("sku", "A1").paginate(1, 20),
//!         )
//!         .await?;
//!
//!     println!("{} of {} rows, first: {}", page.data.len(), page.total, row.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Access and Side Effects
//!
//! The engine never authenticates: every operation takes a caller identity
//! and consults an injected [`TableAccess`] policy, reporting denial as
//! "table not found". Row mutations on for-sale tables append inventory
//! transactions as a best-effort side channel; a ledger failure is logged
//! and never alters the primary operation's result.

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod id;
pub mod inventory;
pub mod mass;
pub mod module;
pub mod multiselect;
pub mod row;
pub mod schema;
pub mod sql;
pub mod store;
pub mod types;
pub mod validate;

// Re-export main types for convenience
pub use access::{AllowAll, GrantList, TableAccess};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Result, StoreError};
pub use id::{IdGenerator, SequenceIdGenerator, UuidIdGenerator};
pub use inventory::{
    AlertLevel, InventoryTracker, InventoryTransaction, ItemInventorySummary, StockAlert,
    StockLevelReport, TableInventorySummary, TransactionType,
};
pub use mass::{MassAction, MassActionOutcome};
pub use module::{ModuleOption, ModuleOptionRaw, ModuleRegistry, StaticModuleRegistry};
pub use multiselect::{DecodedMultiselect, GroupedValues, Variant, VariantOption};
pub use row::{ListQuery, RowPage, RowRecord, Sort, SortDirection};
pub use schema::{CreateTableRequest, TableSchema, UpdateTableRequest};
pub use store::{Availability, RecordStore};
pub use types::{ColumnDef, ColumnType, TableType, Visibility};
pub use validate::{ValidationOutcome, Validator};

// Re-export SQL utilities for advanced users
pub use sql::filter::{build_filter_clause, build_order_by_clause};
pub use sql::sanitize::{quote_identifier, quote_json_literal};
