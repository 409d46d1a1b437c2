//! Spreadsheet import
//!
//! The spreadsheet reader and the column-mapping UI live outside the engine;
//! they hand over rows as header → cell maps plus the chosen mapping.

use serde::{Deserialize, Serialize};
use shared::order::{HistoryAction, HistoryEntry, Order, User};
use std::collections::HashMap;

/// One spreadsheet row: header → cell text
pub type ImportRow = HashMap<String, String>;

/// Spreadsheet header chosen for each order field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub task_name: String,
    #[serde(default)]
    pub business_no: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub serial_code: Option<String>,
    #[serde(default)]
    pub work_order_no: Option<String>,
}

/// Creation payload for one imported order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub task_name: String,
    pub business_no: String,
    pub team: String,
    pub user_name: String,
    pub serial_code: String,
    pub work_order_no: Option<String>,
}

impl OrderDraft {
    /// Dispatched order with its import note
    pub fn into_order(self, id: String, actor: &User, now: i64) -> Order {
        let mut order = Order::new(id, self.task_name, now);
        order.business_no = self.business_no;
        order.team = self.team;
        order.user_name = self.user_name;
        order.serial_code = self.serial_code;
        order.work_order_no = self.work_order_no;

        let mut entry = HistoryEntry::new(HistoryAction::Imported, &actor.name, actor.role, now);
        if !order.user_name.is_empty() {
            entry = entry.with_detail(format!("assigned to {}", order.user_name));
        }
        order.history.push(entry);
        order
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: usize,
    /// Rows dropped for a blank task name
    pub skipped: usize,
    pub order_ids: Vec<String>,
}

fn cell(row: &ImportRow, header: Option<&str>) -> String {
    header
        .and_then(|h| row.get(h))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Rows whose mapped task name is blank are dropped
pub fn drafts_from_rows(mapping: &ColumnMapping, rows: &[ImportRow]) -> Vec<OrderDraft> {
    rows.iter()
        .filter_map(|row| {
            let task_name = cell(row, Some(&mapping.task_name));
            if task_name.is_empty() {
                return None;
            }
            let work_order_no = cell(row, mapping.work_order_no.as_deref());
            Some(OrderDraft {
                task_name,
                business_no: cell(row, mapping.business_no.as_deref()),
                team: cell(row, mapping.team.as_deref()),
                user_name: cell(row, mapping.user_name.as_deref()),
                serial_code: cell(row, mapping.serial_code.as_deref()),
                work_order_no: (!work_order_no.is_empty()).then_some(work_order_no),
            })
        })
        .collect()
}
