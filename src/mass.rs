//! Mass actions: bulk operations over a selected row-id set
//!
//! Delete and export are primitives; "set column value" composes the full
//! per-row validation and duplicate pipeline. Rows are processed in the
//! order the ids were given. Semantics are best-effort: a row that fails
//! its constraints is reported in `row_errors` while the rows that passed
//! stay committed. Ids that match no row are skipped silently.
//!
//! Confirmation prompts are a caller-side concern; the engine performs no
//! gating of its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::row::RowRecord;
use crate::store::RecordStore;
use crate::validate::{Validator, check_duplicates};

/// One bulk operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MassAction {
    /// Irreversibly remove the selected rows
    Delete,
    /// Return full snapshots of the selected rows, no mutation
    Export,
    /// Set one column to a value on every selected row
    #[serde(rename_all = "camelCase")]
    SetColumnValue {
        column: String,
        value: serde_json::Value,
    },
}

/// Result of one mass action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassActionOutcome {
    /// Rows affected (deleted, exported, or updated)
    pub count: u64,
    /// Row snapshots, present for `Export` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<RowRecord>>,
    /// Row id → human-readable reason, for rows that failed their
    /// constraints under `SetColumnValue`
    #[serde(rename = "rowErrors", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub row_errors: BTreeMap<String, String>,
}

impl MassActionOutcome {
    fn counted(count: u64) -> Self {
        Self {
            count,
            data: None,
            row_errors: BTreeMap::new(),
        }
    }
}

impl RecordStore {
    /// Execute a bulk action over the given row ids, in array order.
    pub async fn mass_action(
        &self,
        identity: &str,
        table_id: &str,
        action: MassAction,
        row_ids: &[String],
    ) -> Result<MassActionOutcome> {
        let schema = self.resolve_table(identity, table_id).await?;

        match action {
            MassAction::Delete => {
                let mut count = 0;
                for row_id in row_ids {
                    if self.remove_row(&schema, row_id, identity).await?.is_some() {
                        count += 1;
                    }
                }
                Ok(MassActionOutcome::counted(count))
            }

            MassAction::Export => {
                let mut data = Vec::new();
                for row_id in row_ids {
                    if let Some(row) = self.fetch_row(table_id, row_id).await? {
                        data.push(row);
                    }
                }
                Ok(MassActionOutcome {
                    count: data.len() as u64,
                    data: Some(data),
                    row_errors: BTreeMap::new(),
                })
            }

            MassAction::SetColumnValue { column, value } => {
                let col = schema.column(&column).ok_or_else(|| {
                    StoreError::validation(vec![format!("Unknown column '{}'", column)])
                })?;

                // validate the value once against the column's type before
                // touching any row
                let coerced = if value.is_null() {
                    if col.is_required {
                        return Err(StoreError::validation(vec![format!(
                            "Required column '{}' must not be null",
                            col.name
                        )]));
                    }
                    serde_json::Value::Null
                } else {
                    let validator = match &self.registry {
                        Some(registry) => {
                            Validator::new(&schema.columns).with_registry(registry.as_ref())
                        }
                        None => Validator::new(&schema.columns),
                    };
                    validator
                        .coerce_value(col, &value)
                        .map_err(|e| StoreError::validation(vec![e]))?
                };

                let mut outcome = MassActionOutcome::counted(0);

                for row_id in row_ids {
                    let Some(existing) = self.fetch_row(table_id, row_id).await? else {
                        continue;
                    };

                    let mut candidate = existing.data.clone();
                    candidate.insert(column.clone(), coerced.clone());

                    let validation = self.validation_outcome(&schema, &candidate);
                    if !validation.is_valid() {
                        outcome
                            .row_errors
                            .insert(row_id.clone(), validation.errors.join("; "));
                        continue;
                    }

                    let conflicts = check_duplicates(
                        &self.pool,
                        &self.config,
                        table_id,
                        &schema.columns,
                        &validation.data,
                        Some(row_id),
                    )
                    .await?;
                    if !conflicts.is_empty() {
                        outcome.row_errors.insert(row_id.clone(), conflicts.join("; "));
                        continue;
                    }

                    self.replace_row_data(&schema, &existing, validation.data, identity)
                        .await?;
                    outcome.count += 1;
                }

                Ok(outcome)
            }
        }
    }
}
