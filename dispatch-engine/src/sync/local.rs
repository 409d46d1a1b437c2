//! redb-based local persistence
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | Full collection snapshot |
//! | `pending_writes` | `order_id` | `PendingWrite` (JSON) | Remote writes not yet accepted |
//!
//! The collection is written after every local mutation and every merged push
//! event, and replaced wholesale after a successful remote load. When the
//! remote store is unreachable at startup, this is what the session runs on.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::order::{Order, OrderPatch};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// key = order_id, value = JSON-serialized PendingWrite
const PENDING_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("pending_writes");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Remote write waiting for the remote store to come back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingWrite {
    Insert { order: Order },
    Update { patch: OrderPatch },
}

impl PendingWrite {
    /// Fold a later write for the same order into this one
    pub fn absorb(self, later: PendingWrite) -> PendingWrite {
        match (self, later) {
            (PendingWrite::Insert { mut order }, PendingWrite::Update { patch }) => {
                patch.apply_to(&mut order);
                PendingWrite::Insert { order }
            }
            (PendingWrite::Update { patch }, PendingWrite::Update { patch: later }) => {
                PendingWrite::Update {
                    patch: patch.merge(later),
                }
            }
            (_, insert @ PendingWrite::Insert { .. }) => insert,
        }
    }
}

/// Local order store backed by redb
#[derive(Clone)]
pub struct LocalOrderStorage {
    db: Arc<Database>,
}

impl LocalOrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, throwaway sessions)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PENDING_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Orders ==========

    pub fn save_order(&self, order: &Order) -> StorageResult<()> {
        self.save_orders(std::slice::from_ref(order))
    }

    pub fn save_orders(&self, orders: &[Order]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            for order in orders {
                let value = serde_json::to_vec(order)?;
                table.insert(order.id.as_str(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn remove_order(&self, order_id: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.remove(order_id)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All stored orders, newest first
    pub fn load_all(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            match serde_json::from_slice::<Order>(value.value()) {
                Ok(order) => orders.push(order),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable stored order"),
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Replace the stored collection in one transaction
    pub fn replace_all(&self, orders: &[Order]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let mut stale = Vec::new();
            for result in table.iter()? {
                let (key, _value) = result?;
                stale.push(key.value().to_string());
            }
            for id in &stale {
                table.remove(id.as_str())?;
            }
            for order in orders {
                let value = serde_json::to_vec(order)?;
                table.insert(order.id.as_str(), value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Pending remote writes ==========

    /// Queue a write, folding it into any write already queued for the order
    pub fn queue_pending(&self, order_id: &str, write: PendingWrite) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_TABLE)?;
            let existing: Option<PendingWrite> = match table.get(order_id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            let merged = match existing {
                Some(prev) => prev.absorb(write),
                None => write,
            };
            let value = serde_json::to_vec(&merged)?;
            table.insert(order_id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn pending(&self) -> StorageResult<Vec<(String, PendingWrite)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_TABLE)?;

        let mut out = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            out.push((key.value().to_string(), serde_json::from_slice(value.value())?));
        }
        Ok(out)
    }

    pub fn pending_for(&self, order_id: &str) -> StorageResult<Option<PendingWrite>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Clear the queued write only if it is still `sent` (a newer write may
    /// have been folded in meanwhile)
    pub fn clear_pending_if(&self, order_id: &str, sent: &PendingWrite) -> StorageResult<bool> {
        let txn = self.db.begin_write()?;
        let cleared = {
            let mut table = txn.open_table(PENDING_TABLE)?;
            let current: Option<PendingWrite> = match table.get(order_id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            if current.as_ref() == Some(sent) {
                table.remove(order_id)?;
                true
            } else {
                false
            }
        };
        txn.commit()?;
        Ok(cleared)
    }

    pub fn clear_pending(&self, order_id: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_TABLE)?;
            table.remove(order_id)?;
        }
        txn.commit()?;
        Ok(())
    }
}
