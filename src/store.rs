//! RecordStore - Main entry point for the schema-driven record engine
//!
//! Manages user-defined table schemas and their rows in a PostgreSQL
//! database. Schemas live in a metadata table; row payloads live as JSONB
//! documents in one shared data table keyed by table id; inventory
//! transactions live in an append-only ledger table.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::access::{AllowAll, TableAccess};
use crate::cache::{QueryCache, query_cache_key};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::id::{IdGenerator, UuidIdGenerator};
use crate::inventory::InventoryTracker;
use crate::module::ModuleRegistry;
use crate::row::{ListQuery, RowPage, RowRecord};
use crate::schema::{
    CreateTableRequest, TableSchema, UpdateTableRequest, check_protected_edits, normalize_positions,
    validate_columns,
};
use crate::sql::filter::{build_filter_clause, build_order_by_clause, clamp_pagination};
use crate::sql::sanitize::{quote_identifier, quote_json_literal};
use crate::types::{TableType, Visibility};
use crate::validate::{ValidationOutcome, Validator, check_duplicates};

/// Availability verdict for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    #[serde(rename = "availableQty")]
    pub available_qty: i64,
    #[serde(rename = "requestedQty")]
    pub requested_qty: u32,
}

/// Schema-driven dynamic record store
///
/// All operations take the caller identity first; table resolution asks the
/// injected [`TableAccess`] policy and reports denial as `TableNotFound`.
pub struct RecordStore {
    pub(crate) pool: PgPool,
    pub(crate) config: StoreConfig,
    pub(crate) access: Arc<dyn TableAccess>,
    pub(crate) registry: Option<Arc<dyn ModuleRegistry>>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) inventory: InventoryTracker,
    public_cache: QueryCache<RowPage>,
}

impl RecordStore {
    /// Create a new RecordStore from configuration
    ///
    /// Connects to the database and creates the metadata, data, and ledger
    /// tables if they don't exist.
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("Database connection failed: {}", e)))?;

        Self::from_pool(pool, config).await
    }

    /// Create a new RecordStore from an existing pool
    pub async fn from_pool(pool: PgPool, config: StoreConfig) -> Result<Self> {
        let ids: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator);
        let store = Self {
            inventory: InventoryTracker::new(pool.clone(), config.clone(), ids.clone()),
            public_cache: QueryCache::new(config.cache_ttl),
            pool,
            config,
            access: Arc::new(AllowAll),
            registry: None,
            ids,
        };
        store.ensure_tables().await?;
        Ok(store)
    }

    /// Replace the access policy (default: allow all)
    pub fn with_access(mut self, access: Arc<dyn TableAccess>) -> Self {
        self.access = access;
        self
    }

    /// Attach a module registry for module-typed column validation
    pub fn with_module_registry(mut self, registry: Arc<dyn ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the id generator (default: random UUIDs)
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids.clone();
        self.inventory = InventoryTracker::new(self.pool.clone(), self.config.clone(), ids);
        self
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the inventory tracker for ledger reads, sale/rental bookings,
    /// adjustments, and stock checks
    pub fn inventory(&self) -> &InventoryTracker {
        &self.inventory
    }

    /// Ensures the metadata, data, and ledger tables exist
    async fn ensure_tables(&self) -> Result<()> {
        let tables = quote_identifier(&self.config.tables_table);
        let rows = quote_identifier(&self.config.rows_table);
        let ledger = quote_identifier(&self.config.transactions_table);

        let create_tables = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id VARCHAR(255) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                table_type VARCHAR(32) NOT NULL DEFAULT 'default',
                for_sale BOOLEAN NOT NULL DEFAULT FALSE,
                visibility VARCHAR(32) NOT NULL DEFAULT 'private',
                columns JSONB NOT NULL,
                created_by VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ DEFAULT NOW(),
                updated_at TIMESTAMPTZ DEFAULT NOW()
            )
            "#,
            tables
        );
        sqlx::query(&create_tables).execute(&self.pool).await?;

        let create_rows = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id VARCHAR(255) PRIMARY KEY,
                table_id VARCHAR(255) NOT NULL,
                data JSONB NOT NULL,
                created_by VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ DEFAULT NOW(),
                updated_at TIMESTAMPTZ DEFAULT NOW()
            )
            "#,
            rows
        );
        sqlx::query(&create_rows).execute(&self.pool).await?;

        let rows_index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (table_id)",
            quote_identifier(&format!("{}_table_id_idx", self.config.rows_table)),
            rows
        );
        sqlx::query(&rows_index).execute(&self.pool).await?;

        let create_ledger = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id VARCHAR(255) PRIMARY KEY,
                table_id VARCHAR(255) NOT NULL,
                table_name VARCHAR(255) NOT NULL,
                item_id VARCHAR(255) NOT NULL,
                transaction_type VARCHAR(32) NOT NULL,
                quantity_change DOUBLE PRECISION,
                previous_data JSONB,
                new_data JSONB,
                reference_id VARCHAR(255),
                created_by VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ DEFAULT NOW()
            )
            "#,
            ledger
        );
        sqlx::query(&create_ledger).execute(&self.pool).await?;

        let ledger_index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (table_id, item_id)",
            quote_identifier(&format!("{}_item_idx", self.config.transactions_table)),
            ledger
        );
        sqlx::query(&ledger_index).execute(&self.pool).await?;

        Ok(())
    }

    // =========================================================================
    // Table Operations
    // =========================================================================

    /// Create a new table schema
    pub async fn create_table(
        &self,
        identity: &str,
        request: CreateTableRequest,
    ) -> Result<TableSchema> {
        if request.name.trim().is_empty() {
            return Err(StoreError::validation_msg("Table name cannot be empty"));
        }

        let errors = validate_columns(&request.columns);
        if !errors.is_empty() {
            return Err(StoreError::validation(errors));
        }

        let tables = quote_identifier(&self.config.tables_table);

        let name_taken_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE LOWER(name) = LOWER($1)",
            tables
        );
        let taken: i64 = sqlx::query_scalar(&name_taken_sql)
            .bind(&request.name)
            .fetch_one(&self.pool)
            .await?;
        if taken > 0 {
            return Err(StoreError::conflict(vec![format!(
                "Table '{}' already exists",
                request.name
            )]));
        }

        let mut columns = request.columns;
        for col in &mut columns {
            if col.id.is_empty() {
                col.id = self.ids.generate();
            }
        }
        normalize_positions(&mut columns);

        let table_id = self.ids.generate();
        let columns_json = serde_json::to_value(&columns)?;

        let insert_sql = format!(
            r#"
            INSERT INTO {} (id, name, description, table_type, for_sale, visibility, columns, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at, updated_at
            "#,
            tables
        );

        let row = sqlx::query(&insert_sql)
            .bind(&table_id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(table_type_str(request.table_type))
            .bind(request.for_sale)
            .bind(visibility_str(request.visibility))
            .bind(&columns_json)
            .bind(identity)
            .fetch_one(&self.pool)
            .await?;

        let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;
        let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;

        debug!(table_id = %table_id, name = %request.name, "table created");

        Ok(TableSchema {
            id: table_id,
            name: request.name,
            description: request.description,
            table_type: request.table_type,
            for_sale: request.for_sale,
            visibility: request.visibility,
            created_by: identity.to_string(),
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.to_rfc3339(),
            columns,
        })
    }

    /// Get a table schema by id
    pub async fn get_table(&self, identity: &str, table_id: &str) -> Result<TableSchema> {
        self.resolve_table(identity, table_id).await
    }

    /// List every table the identity may access
    pub async fn list_tables(&self, identity: &str) -> Result<Vec<TableSchema>> {
        let tables = quote_identifier(&self.config.tables_table);
        let select_sql = format!(
            "SELECT id, name, description, table_type, for_sale, visibility, columns, created_by, created_at, updated_at FROM {} ORDER BY name ASC",
            tables
        );

        let rows = sqlx::query(&select_sql).fetch_all(&self.pool).await?;
        let mut schemas = Vec::new();
        for row in &rows {
            let schema = row_to_table(row)?;
            if self.access.has_table_access(&schema.id, identity) {
                schemas.push(schema);
            }
        }

        Ok(schemas)
    }

    /// Update a table schema. Column edits are matched by column id and must
    /// respect protected-column rules; positions are re-normalized.
    pub async fn update_table(
        &self,
        identity: &str,
        table_id: &str,
        request: UpdateTableRequest,
    ) -> Result<TableSchema> {
        let existing = self.resolve_table(identity, table_id).await?;

        let columns = match request.columns {
            Some(mut columns) => {
                let mut errors = validate_columns(&columns);
                errors.extend(check_protected_edits(&existing, &columns));
                if !errors.is_empty() {
                    return Err(StoreError::validation(errors));
                }
                for col in &mut columns {
                    if col.id.is_empty() {
                        col.id = self.ids.generate();
                    }
                }
                normalize_positions(&mut columns);
                Some(columns)
            }
            None => None,
        };

        let tables = quote_identifier(&self.config.tables_table);

        let mut set_clauses = vec!["updated_at = NOW()".to_string()];
        let mut param_idx = 2; // $1 is the table id

        if request.name.is_some() {
            set_clauses.push(format!("name = ${}", param_idx));
            param_idx += 1;
        }
        if request.description.is_some() {
            set_clauses.push(format!("description = ${}", param_idx));
            param_idx += 1;
        }
        if request.visibility.is_some() {
            set_clauses.push(format!("visibility = ${}", param_idx));
            param_idx += 1;
        }
        if columns.is_some() {
            set_clauses.push(format!("columns = ${}", param_idx));
        }

        let update_sql = format!(
            r#"
            UPDATE {}
            SET {}
            WHERE id = $1
            RETURNING id, name, description, table_type, for_sale, visibility, columns, created_by, created_at, updated_at
            "#,
            tables,
            set_clauses.join(", ")
        );

        let mut query = sqlx::query(&update_sql).bind(table_id);
        if let Some(ref name) = request.name {
            query = query.bind(name);
        }
        if let Some(ref description) = request.description {
            query = query.bind(description);
        }
        if let Some(visibility) = request.visibility {
            query = query.bind(visibility_str(visibility));
        }
        if let Some(ref columns) = columns {
            let columns_json = serde_json::to_value(columns)?;
            query = query.bind(columns_json);
        }

        let row = query.fetch_one(&self.pool).await?;
        debug!(table_id = %table_id, "table updated");
        row_to_table(&row)
    }

    /// Delete a table schema and all of its rows. The inventory ledger is
    /// append-only and survives; clear it explicitly via
    /// [`InventoryTracker::clear_table_transactions`].
    pub async fn delete_table(&self, identity: &str, table_id: &str) -> Result<()> {
        self.resolve_table(identity, table_id).await?;

        let rows = quote_identifier(&self.config.rows_table);
        let delete_rows_sql = format!("DELETE FROM {} WHERE table_id = $1", rows);
        sqlx::query(&delete_rows_sql)
            .bind(table_id)
            .execute(&self.pool)
            .await?;

        let tables = quote_identifier(&self.config.tables_table);
        let delete_table_sql = format!("DELETE FROM {} WHERE id = $1", tables);
        sqlx::query(&delete_table_sql)
            .bind(table_id)
            .execute(&self.pool)
            .await?;

        debug!(table_id = %table_id, "table deleted");
        Ok(())
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Create a new row. The payload is validated and coerced against the
    /// table's column schema, duplicate constraints are checked, and on
    /// for-sale tables an `add` transaction is appended best-effort.
    pub async fn create_row(
        &self,
        identity: &str,
        table_id: &str,
        data: serde_json::Value,
    ) -> Result<RowRecord> {
        let schema = self.resolve_table(identity, table_id).await?;
        let raw = as_object(&data)?;

        let validated = self.run_validation(&schema, raw)?;
        let conflicts = check_duplicates(
            &self.pool,
            &self.config,
            table_id,
            &schema.columns,
            &validated,
            None,
        )
        .await?;
        if !conflicts.is_empty() {
            return Err(StoreError::conflict(conflicts));
        }

        let row_id = self.ids.generate();
        let rows = quote_identifier(&self.config.rows_table);
        let insert_sql = format!(
            r#"
            INSERT INTO {} (id, table_id, data, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at, updated_at
            "#,
            rows
        );

        let row = sqlx::query(&insert_sql)
            .bind(&row_id)
            .bind(table_id)
            .bind(serde_json::Value::Object(validated.clone()))
            .bind(identity)
            .fetch_one(&self.pool)
            .await?;

        let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;
        let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;

        let record = RowRecord {
            id: row_id,
            table_id: table_id.to_string(),
            data: validated,
            created_by: identity.to_string(),
            created_at: created_at.to_rfc3339(),
            updated_at: updated_at.to_rfc3339(),
        };

        if schema.tracks_inventory() {
            log_side_effect(
                self.inventory
                    .track_item_added(table_id, &schema.name, &record.id, &record.data, identity)
                    .await,
            );
        }

        debug!(table_id = %table_id, row_id = %record.id, "row created");
        Ok(record)
    }

    /// Get a row by id
    pub async fn get_row(&self, identity: &str, table_id: &str, row_id: &str) -> Result<RowRecord> {
        self.resolve_table(identity, table_id).await?;
        self.fetch_row(table_id, row_id)
            .await?
            .ok_or_else(|| StoreError::row_not_found(row_id))
    }

    /// Replace a row's payload. The document is validated as a whole and
    /// swapped atomically; `updated_at` is refreshed server-side. On
    /// for-sale tables an `update` transaction with before/after snapshots
    /// is appended best-effort.
    pub async fn update_row(
        &self,
        identity: &str,
        table_id: &str,
        row_id: &str,
        data: serde_json::Value,
    ) -> Result<RowRecord> {
        let schema = self.resolve_table(identity, table_id).await?;
        let raw = as_object(&data)?;

        let existing = self
            .fetch_row(table_id, row_id)
            .await?
            .ok_or_else(|| StoreError::row_not_found(row_id))?;

        let validated = self.run_validation(&schema, raw)?;
        let conflicts = check_duplicates(
            &self.pool,
            &self.config,
            table_id,
            &schema.columns,
            &validated,
            Some(row_id),
        )
        .await?;
        if !conflicts.is_empty() {
            return Err(StoreError::conflict(conflicts));
        }

        self.replace_row_data(&schema, &existing, validated, identity)
            .await
    }

    /// Delete a row and return the deleted snapshot. On for-sale tables a
    /// `remove` transaction for the row's remaining quantity is appended
    /// best-effort.
    pub async fn delete_row(
        &self,
        identity: &str,
        table_id: &str,
        row_id: &str,
    ) -> Result<RowRecord> {
        let schema = self.resolve_table(identity, table_id).await?;
        self.remove_row(&schema, row_id, identity)
            .await?
            .ok_or_else(|| StoreError::row_not_found(row_id))
    }

    /// List rows with filtering, sorting, and pagination
    pub async fn list_rows(
        &self,
        identity: &str,
        table_id: &str,
        query: &ListQuery,
    ) -> Result<RowPage> {
        let schema = self.resolve_table(identity, table_id).await?;
        self.list_rows_internal(&schema, query).await
    }

    /// List rows of a public or shared table, no identity required.
    ///
    /// Fronted by the TTL cache; results may be stale by up to the
    /// configured TTL after a write. The authenticated [`list_rows`] path
    /// never reads the cache.
    ///
    /// [`list_rows`]: RecordStore::list_rows
    pub async fn list_public_rows(&self, table_id: &str, query: &ListQuery) -> Result<RowPage> {
        let schema = self
            .fetch_table(table_id)
            .await?
            .filter(|s| s.visibility.is_publicly_readable())
            .ok_or_else(|| StoreError::table_not_found(table_id))?;

        let (page, limit, _) = clamp_pagination(query.page, query.limit, self.config.max_page_size);
        let cache_key = query_cache_key(table_id, &query.filters, page, limit);

        if let Some(cached) = self.public_cache.get(&cache_key) {
            return Ok(cached);
        }

        let result = self.list_rows_internal(&schema, query).await?;
        self.public_cache.insert(cache_key, result.clone());
        Ok(result)
    }

    /// Distinct non-null values of one column, optionally filtered.
    /// The column name matches case-insensitively; an absent column yields
    /// an empty list.
    pub async fn list_column_values(
        &self,
        identity: &str,
        table_id: &str,
        column: &str,
        filters: &std::collections::BTreeMap<String, String>,
    ) -> Result<Vec<serde_json::Value>> {
        let schema = self.resolve_table(identity, table_id).await?;

        let Some(col) = schema
            .columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
        else {
            return Ok(Vec::new());
        };

        let field = format!("data->>{}", quote_json_literal(&col.name));
        let mut param_offset = 2;
        let (filter_clause, params) = build_filter_clause(&schema, filters, &mut param_offset);

        let rows_table = quote_identifier(&self.config.rows_table);
        let select_sql = format!(
            "SELECT DISTINCT {} AS val FROM {} WHERE table_id = $1 AND {} IS NOT NULL AND ({}) ORDER BY val ASC",
            field, rows_table, field, filter_clause
        );

        let mut query = sqlx::query(&select_sql).bind(table_id);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut values = Vec::new();
        for row in &rows {
            let val: String = row.try_get("val")?;
            values.push(serde_json::Value::String(val));
        }
        Ok(values)
    }

    /// Accessible tables that contain every named column, case-insensitive
    pub async fn search_tables_with_columns(
        &self,
        identity: &str,
        columns: &[&str],
    ) -> Result<Vec<TableSchema>> {
        if columns.is_empty() {
            return Err(StoreError::validation_msg(
                "At least one column name is required",
            ));
        }

        let tables = self.list_tables(identity).await?;
        Ok(tables
            .into_iter()
            .filter(|schema| {
                columns.iter().all(|wanted| {
                    schema
                        .columns
                        .iter()
                        .any(|c| c.name.eq_ignore_ascii_case(wanted))
                })
            })
            .collect())
    }

    /// Check whether an item can satisfy a requested quantity.
    ///
    /// Sale tables answer from the row's `qty`; rent tables have one unit
    /// that is available unless the `used` flag is set.
    pub async fn check_availability(
        &self,
        identity: &str,
        table_id: &str,
        item_id: &str,
        quantity: u32,
    ) -> Result<Availability> {
        let schema = self.resolve_table(identity, table_id).await?;
        let row = self
            .fetch_row(table_id, item_id)
            .await?
            .ok_or_else(|| StoreError::row_not_found(item_id))?;

        let available_qty: i64 = match schema.table_type {
            TableType::Rent => {
                let used = row
                    .data
                    .get("used")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if used { 0 } else { 1 }
            }
            TableType::Sale => sale_quantity(&row),
            TableType::Default => {
                if schema.for_sale {
                    sale_quantity(&row)
                } else {
                    return Err(StoreError::validation_msg(
                        "Availability is only defined for sale and rent tables",
                    ));
                }
            }
        };

        Ok(Availability {
            available: available_qty >= quantity as i64,
            available_qty,
            requested_qty: quantity,
        })
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Fetch a table and apply the access policy; unknown table and denied
    /// access are indistinguishable to the caller.
    pub(crate) async fn resolve_table(
        &self,
        identity: &str,
        table_id: &str,
    ) -> Result<TableSchema> {
        let schema = self
            .fetch_table(table_id)
            .await?
            .ok_or_else(|| StoreError::table_not_found(table_id))?;

        if !self.access.has_table_access(table_id, identity) {
            return Err(StoreError::table_not_found(table_id));
        }

        Ok(schema)
    }

    async fn fetch_table(&self, table_id: &str) -> Result<Option<TableSchema>> {
        let tables = quote_identifier(&self.config.tables_table);
        let select_sql = format!(
            "SELECT id, name, description, table_type, for_sale, visibility, columns, created_by, created_at, updated_at FROM {} WHERE id = $1",
            tables
        );

        let row = sqlx::query(&select_sql)
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_table(&row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn fetch_row(
        &self,
        table_id: &str,
        row_id: &str,
    ) -> Result<Option<RowRecord>> {
        let rows = quote_identifier(&self.config.rows_table);
        let select_sql = format!(
            "SELECT id, table_id, data, created_by, created_at, updated_at FROM {} WHERE id = $1 AND table_id = $2",
            rows
        );

        let row = sqlx::query(&select_sql)
            .bind(row_id)
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Validate a raw payload against the schema, with the module registry
    /// attached when one is configured.
    pub(crate) fn run_validation(
        &self,
        schema: &TableSchema,
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        let outcome = self.validation_outcome(schema, raw);
        if outcome.is_valid() {
            Ok(outcome.data)
        } else {
            Err(StoreError::validation(outcome.errors))
        }
    }

    pub(crate) fn validation_outcome(
        &self,
        schema: &TableSchema,
        raw: &serde_json::Map<String, serde_json::Value>,
    ) -> ValidationOutcome {
        match &self.registry {
            Some(registry) => Validator::new(&schema.columns)
                .with_registry(registry.as_ref())
                .validate(raw),
            None => Validator::new(&schema.columns).validate(raw),
        }
    }

    /// Swap a row's payload atomically and append the `update` transaction.
    /// Validation and duplicate checks are the caller's responsibility.
    pub(crate) async fn replace_row_data(
        &self,
        schema: &TableSchema,
        existing: &RowRecord,
        validated: serde_json::Map<String, serde_json::Value>,
        identity: &str,
    ) -> Result<RowRecord> {
        let rows = quote_identifier(&self.config.rows_table);
        let update_sql = format!(
            r#"
            UPDATE {} SET data = $3, updated_at = NOW()
            WHERE id = $1 AND table_id = $2
            RETURNING updated_at
            "#,
            rows
        );

        let row = sqlx::query(&update_sql)
            .bind(&existing.id)
            .bind(&schema.id)
            .bind(serde_json::Value::Object(validated.clone()))
            .fetch_one(&self.pool)
            .await?;
        let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;

        let record = RowRecord {
            id: existing.id.clone(),
            table_id: schema.id.clone(),
            data: validated,
            created_by: existing.created_by.clone(),
            created_at: existing.created_at.clone(),
            updated_at: updated_at.to_rfc3339(),
        };

        if schema.tracks_inventory() {
            log_side_effect(
                self.inventory
                    .track_item_updated(
                        &schema.id,
                        &schema.name,
                        &record.id,
                        &existing.data,
                        &record.data,
                        identity,
                    )
                    .await,
            );
        }

        debug!(table_id = %schema.id, row_id = %record.id, "row updated");
        Ok(record)
    }

    /// Delete one row if it exists, appending the `remove` transaction.
    /// Returns the deleted snapshot.
    pub(crate) async fn remove_row(
        &self,
        schema: &TableSchema,
        row_id: &str,
        identity: &str,
    ) -> Result<Option<RowRecord>> {
        let Some(existing) = self.fetch_row(&schema.id, row_id).await? else {
            return Ok(None);
        };

        let rows = quote_identifier(&self.config.rows_table);
        let delete_sql = format!("DELETE FROM {} WHERE id = $1 AND table_id = $2", rows);
        sqlx::query(&delete_sql)
            .bind(row_id)
            .bind(&schema.id)
            .execute(&self.pool)
            .await?;

        if schema.tracks_inventory() {
            log_side_effect(
                self.inventory
                    .track_item_deleted(&schema.id, &schema.name, row_id, &existing.data, identity)
                    .await,
            );
        }

        debug!(table_id = %schema.id, row_id = %row_id, "row deleted");
        Ok(Some(existing))
    }

    async fn list_rows_internal(&self, schema: &TableSchema, query: &ListQuery) -> Result<RowPage> {
        let (page, limit, offset) =
            clamp_pagination(query.page, query.limit, self.config.max_page_size);

        let mut param_offset = 2; // $1 is the table id
        let (filter_clause, params) =
            build_filter_clause(schema, &query.filters, &mut param_offset);
        let order_by = build_order_by_clause(schema, query.sort.as_ref());

        let rows_table = quote_identifier(&self.config.rows_table);

        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE table_id = $1 AND ({})",
            rows_table, filter_clause
        );
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&schema.id);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT id, table_id, data, created_by, created_at, updated_at FROM {} WHERE table_id = $1 AND ({}) ORDER BY {} LIMIT ${} OFFSET ${}",
            rows_table,
            filter_clause,
            order_by,
            param_offset,
            param_offset + 1
        );
        let mut select_query = sqlx::query(&select_sql).bind(&schema.id);
        for param in &params {
            select_query = select_query.bind(param);
        }
        let rows = select_query
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let data: Result<Vec<RowRecord>> = rows.iter().map(row_to_record).collect();
        Ok(RowPage::new(data?, total, page, limit))
    }
}

fn as_object(data: &serde_json::Value) -> Result<&serde_json::Map<String, serde_json::Value>> {
    data.as_object()
        .ok_or_else(|| StoreError::malformed("Row data must be a JSON object"))
}

fn sale_quantity(row: &RowRecord) -> i64 {
    row.data
        .get("qty")
        .and_then(|v| v.as_f64())
        .map(|q| q.floor() as i64)
        .unwrap_or(0)
}

/// Discard a side-effect result, logging failures. Inventory bookkeeping is
/// a secondary write and must never alter the primary operation's outcome.
pub(crate) fn log_side_effect<T>(result: Result<T>) {
    if let Err(err) = result {
        tracing::warn!(error = %err, "inventory tracking failed; primary operation unaffected");
    }
}

fn table_type_str(t: TableType) -> &'static str {
    match t {
        TableType::Default => "default",
        TableType::Sale => "sale",
        TableType::Rent => "rent",
    }
}

fn visibility_str(v: Visibility) -> &'static str {
    match v {
        Visibility::Private => "private",
        Visibility::Public => "public",
        Visibility::Shared => "shared",
    }
}

fn parse_table_type(s: &str) -> TableType {
    match s {
        "sale" => TableType::Sale,
        "rent" => TableType::Rent,
        _ => TableType::Default,
    }
}

fn parse_visibility(s: &str) -> Visibility {
    match s {
        "public" => Visibility::Public,
        "shared" => Visibility::Shared,
        _ => Visibility::Private,
    }
}

fn row_to_table(row: &sqlx::postgres::PgRow) -> Result<TableSchema> {
    let table_type: String = row.try_get("table_type")?;
    let visibility: String = row.try_get("visibility")?;
    let columns: serde_json::Value = row.try_get("columns")?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;

    Ok(TableSchema {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        table_type: parse_table_type(&table_type),
        for_sale: row.try_get("for_sale")?,
        visibility: parse_visibility(&visibility),
        created_by: row.try_get("created_by")?,
        created_at: created_at.to_rfc3339(),
        updated_at: updated_at.to_rfc3339(),
        columns: serde_json::from_value(columns).unwrap_or_default(),
    })
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<RowRecord> {
    let data: serde_json::Value = row.try_get("data")?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at")?;

    Ok(RowRecord {
        id: row.try_get("id")?,
        table_id: row.try_get("table_id")?,
        data: data.as_object().cloned().unwrap_or_default(),
        created_by: row.try_get("created_by")?,
        created_at: created_at.to_rfc3339(),
        updated_at: updated_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_type_round_trip() {
        for t in [TableType::Default, TableType::Sale, TableType::Rent] {
            assert_eq!(parse_table_type(table_type_str(t)), t);
        }
        assert_eq!(parse_table_type("mystery"), TableType::Default);
    }

    #[test]
    fn test_visibility_round_trip() {
        for v in [Visibility::Private, Visibility::Public, Visibility::Shared] {
            assert_eq!(parse_visibility(visibility_str(v)), v);
        }
        assert_eq!(parse_visibility("hidden"), Visibility::Private);
    }

    #[test]
    fn test_as_object_rejects_non_objects() {
        assert!(as_object(&serde_json::json!({"a": 1})).is_ok());
        assert!(matches!(
            as_object(&serde_json::json!([1, 2])),
            Err(StoreError::MalformedInput(_))
        ));
        assert!(as_object(&serde_json::json!("text")).is_err());
    }
}
