//! Inventory side-effect tracker
//!
//! Row mutations on for-sale tables append immutable transaction records to
//! a ledger table. Summaries and stock alerts are read-time folds over the
//! ledger, recomputed on every call and never cached. Ledger writes are a
//! best-effort side channel: the store invokes them after the primary write
//! has committed and logs-and-discards any failure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::id::IdGenerator;
use crate::sql::sanitize::quote_identifier;

/// Kind of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Add,
    Remove,
    Sale,
    Rent,
    Release,
    Update,
    Adjust,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Add => "add",
            TransactionType::Remove => "remove",
            TransactionType::Sale => "sale",
            TransactionType::Rent => "rent",
            TransactionType::Release => "release",
            TransactionType::Update => "update",
            TransactionType::Adjust => "adjust",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(TransactionType::Add),
            "remove" => Some(TransactionType::Remove),
            "sale" => Some(TransactionType::Sale),
            "rent" => Some(TransactionType::Rent),
            "release" => Some(TransactionType::Release),
            "update" => Some(TransactionType::Update),
            "adjust" => Some(TransactionType::Adjust),
            _ => None,
        }
    }
}

/// One immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: String,
    #[serde(rename = "tableId")]
    pub table_id: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    /// Signed quantity effect; null when the event carries no quantity
    #[serde(rename = "quantityChange")]
    pub quantity_change: Option<f64>,
    #[serde(rename = "previousData", skip_serializing_if = "Option::is_none")]
    pub previous_data: Option<serde_json::Value>,
    #[serde(rename = "newData", skip_serializing_if = "Option::is_none")]
    pub new_data: Option<serde_json::Value>,
    /// External reference, e.g. a sale id
    #[serde(rename = "referenceId", skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Read-time aggregate for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInventorySummary {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "currentQuantity")]
    pub current_quantity: f64,
    #[serde(rename = "totalAdded")]
    pub total_added: f64,
    #[serde(rename = "totalRemoved")]
    pub total_removed: f64,
    #[serde(rename = "totalSold")]
    pub total_sold: f64,
    #[serde(rename = "totalAdjustments")]
    pub total_adjustments: f64,
    #[serde(rename = "transactionCount")]
    pub transaction_count: usize,
}

/// Read-time aggregate for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInventorySummary {
    #[serde(rename = "tableId")]
    pub table_id: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    pub items: Vec<ItemInventorySummary>,
    #[serde(rename = "currentQuantity")]
    pub current_quantity: f64,
    #[serde(rename = "totalAdded")]
    pub total_added: f64,
    #[serde(rename = "totalRemoved")]
    pub total_removed: f64,
    #[serde(rename = "totalSold")]
    pub total_sold: f64,
    #[serde(rename = "totalAdjustments")]
    pub total_adjustments: f64,
}

/// Stock alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    NegativeStock,
    OutOfStock,
    LowStock,
}

/// One stock alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAlert {
    #[serde(rename = "tableId")]
    pub table_id: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "currentQuantity")]
    pub current_quantity: f64,
    pub level: AlertLevel,
}

/// Result of a stock-level sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevelReport {
    pub alerts: Vec<StockAlert>,
    #[serde(rename = "totalChecked")]
    pub total_checked: usize,
    #[serde(rename = "lowStockCount")]
    pub low_stock_count: usize,
    #[serde(rename = "outOfStockCount")]
    pub out_of_stock_count: usize,
    #[serde(rename = "negativeStockCount")]
    pub negative_stock_count: usize,
}

/// Fold a transaction sequence into an item summary.
///
/// `current_quantity` is the signed running sum; the per-type totals are
/// magnitude sums so a `sale` of −3 contributes 3 to `total_sold`.
pub fn fold_item_summary(item_id: &str, transactions: &[InventoryTransaction]) -> ItemInventorySummary {
    let mut summary = ItemInventorySummary {
        item_id: item_id.to_string(),
        current_quantity: 0.0,
        total_added: 0.0,
        total_removed: 0.0,
        total_sold: 0.0,
        total_adjustments: 0.0,
        transaction_count: 0,
    };

    for tx in transactions {
        if tx.item_id != item_id {
            continue;
        }
        summary.transaction_count += 1;

        let Some(change) = tx.quantity_change else {
            continue;
        };
        summary.current_quantity += change;

        match tx.transaction_type {
            TransactionType::Add => summary.total_added += change.abs(),
            TransactionType::Remove => summary.total_removed += change.abs(),
            TransactionType::Sale => summary.total_sold += change.abs(),
            TransactionType::Adjust => summary.total_adjustments += change.abs(),
            TransactionType::Rent
            | TransactionType::Release
            | TransactionType::Update => {}
        }
    }

    summary
}

/// Classify a quantity against a low-stock threshold; `None` means healthy.
pub fn classify_stock(quantity: f64, threshold: f64) -> Option<AlertLevel> {
    if quantity < 0.0 {
        Some(AlertLevel::NegativeStock)
    } else if quantity == 0.0 {
        Some(AlertLevel::OutOfStock)
    } else if quantity <= threshold {
        Some(AlertLevel::LowStock)
    } else {
        None
    }
}

/// Pull the `qty` field out of a row payload
pub(crate) fn quantity_of(data: &serde_json::Map<String, serde_json::Value>) -> Option<f64> {
    data.get("qty").and_then(|v| v.as_f64())
}

/// Appends ledger entries and serves the derived read models
#[derive(Clone)]
pub struct InventoryTracker {
    pool: PgPool,
    config: StoreConfig,
    ids: Arc<dyn IdGenerator>,
}

impl InventoryTracker {
    pub fn new(pool: PgPool, config: StoreConfig, ids: Arc<dyn IdGenerator>) -> Self {
        Self { pool, config, ids }
    }

    // =========================================================================
    // Ledger writes
    // =========================================================================

    /// A row was created; the positive `qty` of the new payload is recorded.
    pub async fn track_item_added(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        data: &serde_json::Map<String, serde_json::Value>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Add,
            quantity_of(data),
            None,
            Some(serde_json::Value::Object(data.clone())),
            None,
            created_by,
        )
        .await
    }

    /// Stock was explicitly taken out; stored as a negative magnitude.
    pub async fn track_item_removed(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        quantity: f64,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Remove,
            Some(-quantity.abs()),
            None,
            None,
            None,
            created_by,
        )
        .await
    }

    /// A row was edited; the quantity effect is the literal delta between
    /// the payloads' `qty` fields.
    pub async fn track_item_updated(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        previous: &serde_json::Map<String, serde_json::Value>,
        new: &serde_json::Map<String, serde_json::Value>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        let delta = quantity_of(new).unwrap_or(0.0) - quantity_of(previous).unwrap_or(0.0);
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Update,
            Some(delta),
            Some(serde_json::Value::Object(previous.clone())),
            Some(serde_json::Value::Object(new.clone())),
            None,
            created_by,
        )
        .await
    }

    /// A row was deleted; its remaining `qty` leaves the inventory.
    pub async fn track_item_deleted(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        data: &serde_json::Map<String, serde_json::Value>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Remove,
            quantity_of(data).map(|q| -q.abs()),
            Some(serde_json::Value::Object(data.clone())),
            None,
            None,
            created_by,
        )
        .await
    }

    /// Stock left through a sale; stored as a negative magnitude.
    pub async fn track_sale(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        quantity: f64,
        reference_id: Option<&str>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Sale,
            Some(-quantity.abs()),
            None,
            None,
            reference_id,
            created_by,
        )
        .await
    }

    /// An item went out on rent; nets to zero once released.
    pub async fn track_rental(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        quantity: f64,
        reference_id: Option<&str>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Rent,
            Some(-quantity.abs()),
            None,
            None,
            reference_id,
            created_by,
        )
        .await
    }

    /// A rented item came back.
    pub async fn track_release(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        quantity: f64,
        reference_id: Option<&str>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Release,
            Some(quantity.abs()),
            None,
            None,
            reference_id,
            created_by,
        )
        .await
    }

    /// Manual correction; the delta keeps the caller's sign.
    pub async fn track_adjustment(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        delta: f64,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        self.record(
            table_id,
            table_name,
            item_id,
            TransactionType::Adjust,
            Some(delta),
            None,
            None,
            None,
            created_by,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        table_id: &str,
        table_name: &str,
        item_id: &str,
        transaction_type: TransactionType,
        quantity_change: Option<f64>,
        previous_data: Option<serde_json::Value>,
        new_data: Option<serde_json::Value>,
        reference_id: Option<&str>,
        created_by: &str,
    ) -> Result<InventoryTransaction> {
        let id = self.ids.generate();
        let ledger = quote_identifier(&self.config.transactions_table);

        let insert_sql = format!(
            r#"
            INSERT INTO {} (id, table_id, table_name, item_id, transaction_type,
                            quantity_change, previous_data, new_data, reference_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING created_at
            "#,
            ledger
        );

        let row = sqlx::query(&insert_sql)
            .bind(&id)
            .bind(table_id)
            .bind(table_name)
            .bind(item_id)
            .bind(transaction_type.as_str())
            .bind(quantity_change)
            .bind(&previous_data)
            .bind(&new_data)
            .bind(reference_id)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;

        Ok(InventoryTransaction {
            id,
            table_id: table_id.to_string(),
            table_name: table_name.to_string(),
            item_id: item_id.to_string(),
            transaction_type,
            quantity_change,
            previous_data,
            new_data,
            reference_id: reference_id.map(str::to_string),
            created_by: created_by.to_string(),
            created_at: created_at.to_rfc3339(),
        })
    }

    // =========================================================================
    // Ledger reads
    // =========================================================================

    /// All transactions of one table, oldest first
    pub async fn list_table_transactions(&self, table_id: &str) -> Result<Vec<InventoryTransaction>> {
        let ledger = quote_identifier(&self.config.transactions_table);
        let select_sql = format!(
            r#"
            SELECT id, table_id, table_name, item_id, transaction_type,
                   quantity_change, previous_data, new_data, reference_id,
                   created_by, created_at
            FROM {}
            WHERE table_id = $1
            ORDER BY created_at ASC
            "#,
            ledger
        );

        let rows = sqlx::query(&select_sql)
            .bind(table_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// All transactions of one item, oldest first
    pub async fn list_item_transactions(
        &self,
        table_id: &str,
        item_id: &str,
    ) -> Result<Vec<InventoryTransaction>> {
        let ledger = quote_identifier(&self.config.transactions_table);
        let select_sql = format!(
            r#"
            SELECT id, table_id, table_name, item_id, transaction_type,
                   quantity_change, previous_data, new_data, reference_id,
                   created_by, created_at
            FROM {}
            WHERE table_id = $1 AND item_id = $2
            ORDER BY created_at ASC
            "#,
            ledger
        );

        let rows = sqlx::query(&select_sql)
            .bind(table_id)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Current aggregate for one item, folded over its full ledger on every
    /// call
    pub async fn item_summary(&self, table_id: &str, item_id: &str) -> Result<ItemInventorySummary> {
        let transactions = self.list_item_transactions(table_id, item_id).await?;
        Ok(fold_item_summary(item_id, &transactions))
    }

    /// Current aggregate for one table, grouped per item
    pub async fn table_summary(&self, table_id: &str) -> Result<TableInventorySummary> {
        let transactions = self.list_table_transactions(table_id).await?;

        let table_name = transactions
            .last()
            .map(|tx| tx.table_name.clone())
            .unwrap_or_default();

        let mut item_ids: Vec<String> = Vec::new();
        for tx in &transactions {
            if !item_ids.contains(&tx.item_id) {
                item_ids.push(tx.item_id.clone());
            }
        }

        let items: Vec<ItemInventorySummary> = item_ids
            .iter()
            .map(|item_id| fold_item_summary(item_id, &transactions))
            .collect();

        let mut summary = TableInventorySummary {
            table_id: table_id.to_string(),
            table_name,
            current_quantity: 0.0,
            total_added: 0.0,
            total_removed: 0.0,
            total_sold: 0.0,
            total_adjustments: 0.0,
            items: Vec::new(),
        };
        for item in &items {
            summary.current_quantity += item.current_quantity;
            summary.total_added += item.total_added;
            summary.total_removed += item.total_removed;
            summary.total_sold += item.total_sold;
            summary.total_adjustments += item.total_adjustments;
        }
        summary.items = items;

        Ok(summary)
    }

    /// Sweep for-sale tables and classify every item's current quantity
    /// against the threshold. Rent tables are excluded: rent + release nets
    /// to zero stock while the item is actually available.
    pub async fn check_stock_levels(
        &self,
        table_id: Option<&str>,
        threshold: f64,
    ) -> Result<StockLevelReport> {
        let tables = quote_identifier(&self.config.tables_table);

        let base_sql = format!(
            "SELECT id, name FROM {} WHERE (for_sale = TRUE OR table_type = 'sale') AND table_type <> 'rent'",
            tables
        );

        let table_rows = match table_id {
            Some(id) => {
                let sql = format!("{} AND id = $1", base_sql);
                sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?
            }
            None => sqlx::query(&base_sql).fetch_all(&self.pool).await?,
        };

        let mut alerts = Vec::new();
        let mut total_checked = 0;

        for table_row in &table_rows {
            let id: String = table_row.try_get("id")?;
            let name: String = table_row.try_get("name")?;

            let summary = self.table_summary(&id).await?;
            for item in &summary.items {
                total_checked += 1;
                if let Some(level) = classify_stock(item.current_quantity, threshold) {
                    alerts.push(StockAlert {
                        table_id: id.clone(),
                        table_name: name.clone(),
                        item_id: item.item_id.clone(),
                        current_quantity: item.current_quantity,
                        level,
                    });
                }
            }
        }

        // most critical first
        alerts.sort_by(|a, b| {
            a.current_quantity
                .partial_cmp(&b.current_quantity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let count_of = |level: AlertLevel| alerts.iter().filter(|a| a.level == level).count();
        Ok(StockLevelReport {
            low_stock_count: count_of(AlertLevel::LowStock),
            out_of_stock_count: count_of(AlertLevel::OutOfStock),
            negative_stock_count: count_of(AlertLevel::NegativeStock),
            total_checked,
            alerts,
        })
    }

    /// Drop a table's ledger wholesale. The only deletion path; individual
    /// transactions are never updated or removed.
    pub async fn clear_table_transactions(&self, table_id: &str) -> Result<u64> {
        let ledger = quote_identifier(&self.config.transactions_table);
        let delete_sql = format!("DELETE FROM {} WHERE table_id = $1", ledger);

        let result = sqlx::query(&delete_sql)
            .bind(table_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> Result<InventoryTransaction> {
    let transaction_type: String = row.try_get("transaction_type")?;
    let transaction_type = TransactionType::parse(&transaction_type).ok_or_else(|| {
        StoreError::database(format!("Unknown transaction type '{}'", transaction_type))
    })?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at")?;

    Ok(InventoryTransaction {
        id: row.try_get("id")?,
        table_id: row.try_get("table_id")?,
        table_name: row.try_get("table_name")?,
        item_id: row.try_get("item_id")?,
        transaction_type,
        quantity_change: row.try_get("quantity_change")?,
        previous_data: row.try_get("previous_data")?,
        new_data: row.try_get("new_data")?,
        reference_id: row.try_get("reference_id")?,
        created_by: row.try_get("created_by")?,
        created_at: created_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(item_id: &str, t: TransactionType, change: Option<f64>) -> InventoryTransaction {
        InventoryTransaction {
            id: format!("tx-{}", item_id),
            table_id: "tbl-1".to_string(),
            table_name: "Products".to_string(),
            item_id: item_id.to_string(),
            transaction_type: t,
            quantity_change: change,
            previous_data: None,
            new_data: None,
            reference_id: None,
            created_by: "tester".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    // =========================================================================
    // Summary Fold Tests
    // =========================================================================

    #[test]
    fn test_fold_add_sale_adjust() {
        let transactions = vec![
            tx("item-1", TransactionType::Add, Some(10.0)),
            tx("item-1", TransactionType::Sale, Some(-3.0)),
            tx("item-1", TransactionType::Adjust, Some(-2.0)),
        ];
        let summary = fold_item_summary("item-1", &transactions);

        assert_eq!(summary.current_quantity, 5.0);
        assert_eq!(summary.total_added, 10.0);
        assert_eq!(summary.total_sold, 3.0);
        assert_eq!(summary.total_adjustments, 2.0);
        assert_eq!(summary.total_removed, 0.0);
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn test_fold_ignores_other_items() {
        let transactions = vec![
            tx("item-1", TransactionType::Add, Some(10.0)),
            tx("item-2", TransactionType::Add, Some(99.0)),
        ];
        let summary = fold_item_summary("item-1", &transactions);
        assert_eq!(summary.current_quantity, 10.0);
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_fold_null_change_counts_transaction_only() {
        let transactions = vec![
            tx("item-1", TransactionType::Add, None),
            tx("item-1", TransactionType::Add, Some(4.0)),
        ];
        let summary = fold_item_summary("item-1", &transactions);
        assert_eq!(summary.current_quantity, 4.0);
        assert_eq!(summary.total_added, 4.0);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_fold_rent_release_net_zero() {
        let transactions = vec![
            tx("item-1", TransactionType::Add, Some(1.0)),
            tx("item-1", TransactionType::Rent, Some(-1.0)),
            tx("item-1", TransactionType::Release, Some(1.0)),
        ];
        let summary = fold_item_summary("item-1", &transactions);
        assert_eq!(summary.current_quantity, 1.0);
        // rent/release do not feed the per-type totals
        assert_eq!(summary.total_added, 1.0);
        assert_eq!(summary.total_removed, 0.0);
    }

    #[test]
    fn test_fold_update_moves_current_only() {
        let transactions = vec![
            tx("item-1", TransactionType::Add, Some(10.0)),
            tx("item-1", TransactionType::Update, Some(-4.0)),
        ];
        let summary = fold_item_summary("item-1", &transactions);
        assert_eq!(summary.current_quantity, 6.0);
        assert_eq!(summary.total_removed, 0.0);
        assert_eq!(summary.total_adjustments, 0.0);
    }

    // =========================================================================
    // Stock Classification Tests
    // =========================================================================

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_stock(-1.0, 5.0), Some(AlertLevel::NegativeStock));
        assert_eq!(classify_stock(0.0, 5.0), Some(AlertLevel::OutOfStock));
        assert_eq!(classify_stock(1.0, 5.0), Some(AlertLevel::LowStock));
        assert_eq!(classify_stock(5.0, 5.0), Some(AlertLevel::LowStock));
        assert_eq!(classify_stock(6.0, 5.0), None);
    }

    #[test]
    fn test_classify_zero_threshold() {
        assert_eq!(classify_stock(0.0, 0.0), Some(AlertLevel::OutOfStock));
        assert_eq!(classify_stock(1.0, 0.0), None);
    }

    // =========================================================================
    // Serialization Tests
    // =========================================================================

    #[test]
    fn test_transaction_type_round_trip() {
        for t in [
            TransactionType::Add,
            TransactionType::Remove,
            TransactionType::Sale,
            TransactionType::Rent,
            TransactionType::Release,
            TransactionType::Update,
            TransactionType::Adjust,
        ] {
            assert_eq!(TransactionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(TransactionType::parse("void"), None);
    }

    #[test]
    fn test_alert_level_wire_names() {
        assert_eq!(
            serde_json::to_string(&AlertLevel::NegativeStock).unwrap(),
            r#""negative_stock""#
        );
        assert_eq!(
            serde_json::to_string(&AlertLevel::OutOfStock).unwrap(),
            r#""out_of_stock""#
        );
        assert_eq!(
            serde_json::to_string(&AlertLevel::LowStock).unwrap(),
            r#""low_stock""#
        );
    }

    #[test]
    fn test_transaction_serialization_camel_case() {
        let t = tx("item-1", TransactionType::Sale, Some(-2.0));
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"transactionType\":\"sale\""));
        assert!(json.contains("\"quantityChange\":-2.0"));
        assert!(json.contains("\"itemId\""));
        assert!(!json.contains("referenceId"));
    }

    #[test]
    fn test_quantity_of_reads_qty_field() {
        let data = serde_json::json!({"qty": 7, "name": "Widget"});
        assert_eq!(quantity_of(data.as_object().unwrap()), Some(7.0));
        let no_qty = serde_json::json!({"name": "Widget"});
        assert_eq!(quantity_of(no_qty.as_object().unwrap()), None);
    }
}
