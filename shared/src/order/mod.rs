//! Work order domain types
//!
//! - Commands: requests from admins/workers to change an order
//! - Events: immutable facts recorded after command processing
//! - Snapshot: the current [`Order`] state
//! - Patch: partial updates exchanged with the remote store

pub mod command;
pub mod event;
pub mod history;
pub mod patch;
pub mod snapshot;
pub mod types;

// Re-exports
pub use command::{OrderCommand, OrderCommandPayload};
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use history::{History, HistoryAction, HistoryEntry};
pub use patch::OrderPatch;
pub use snapshot::{AuditStatus, Order, OrderStatus};
pub use types::*;
