//! Configuration for RecordStore
//!
//! Provides a builder pattern for configuring the record engine.

use std::time::Duration;

/// Hard cap on `limit` for listing operations. Requests above this are
/// clamped, never rejected.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Configuration for the record engine
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Name of the table-schema metadata table (default: "user_tables")
    pub tables_table: String,
    /// Name of the row payload table (default: "table_data")
    pub rows_table: String,
    /// Name of the inventory ledger table (default: "inventory_transactions")
    pub transactions_table: String,
    /// Upper bound for the `limit` of listing operations (default: 100)
    pub max_page_size: u32,
    /// Time-to-live for entries on the public list cache (default: 60s).
    /// Cache entries are invalidated by TTL only, never write-through.
    pub cache_ttl: Duration,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_url)
    }
}

/// Builder for StoreConfig
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_url: String,
    tables_table: String,
    rows_table: String,
    transactions_table: String,
    max_page_size: u32,
    cache_ttl: Duration,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            tables_table: "user_tables".to_string(),
            rows_table: "table_data".to_string(),
            transactions_table: "inventory_transactions".to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            cache_ttl: Duration::from_secs(60),
        }
    }

    /// Set the table-schema metadata table name (default: "user_tables")
    pub fn tables_table(mut self, name: impl Into<String>) -> Self {
        self.tables_table = name.into();
        self
    }

    /// Set the row payload table name (default: "table_data")
    pub fn rows_table(mut self, name: impl Into<String>) -> Self {
        self.rows_table = name.into();
        self
    }

    /// Set the inventory ledger table name (default: "inventory_transactions")
    pub fn transactions_table(mut self, name: impl Into<String>) -> Self {
        self.transactions_table = name.into();
        self
    }

    /// Set the listing page-size cap (default: 100)
    pub fn max_page_size(mut self, limit: u32) -> Self {
        self.max_page_size = limit;
        self
    }

    /// Set the public list cache TTL (default: 60 seconds)
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url,
            tables_table: self.tables_table,
            rows_table: self.rows_table,
            transactions_table: self.transactions_table,
            max_page_size: self.max_page_size,
            cache_ttl: self.cache_ttl,
        }
    }
}
