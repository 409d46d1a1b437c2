//! Shared types for the field dispatch workspace
//!
//! Domain and wire types used by the engine and by any adapter talking to
//! the remote store: orders, history, commands, events, patches, push
//! messages and the unified error codes.

pub mod error;
pub mod message;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, ErrorCategory, ErrorCode};
pub use message::RemoteEvent;
pub use order::{Order, OrderPatch, OrderStatus, Role, User};
