//! Work order state machine
//!
//! - **actions**: one `CommandHandler` per command, guards + verification
//! - **appliers**: pure `EventApplier` per event type
//! - **manager**: OrdersManager, runs commands and hands patches to the sync layer
//! - **import**: spreadsheet rows → dispatched orders
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → Action → Event → Applier (copy of the order)
//!                 ↓                                ↓
//!             Broadcast              OrderPatch → OrderSync (local + remote)
//! ```
//!
//! # Transitions
//!
//! | From | To | Actor |
//! |------|----|-------|
//! | import | DISPATCHED | ADMIN |
//! | PENDING / DISPATCHED | RECEIVED | assigned WORKER, before deadline |
//! | RECEIVED | COMPLETED | assigned WORKER, before deadline, proof (+ verified photo) |
//! | COMPLETED | COMPLETED (amend) | same as above |
//! | any | same (reassign / deadline) | ADMIN, deadline ignored |

// traits 必须先于 appliers 声明 (enum_dispatch 按展开顺序生成实现)
pub mod traits;

pub mod actions;
pub mod appliers;
pub mod import;
pub mod manager;

pub use import::{ColumnMapping, ImportReport, ImportRow, OrderDraft, drafts_from_rows};
pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
