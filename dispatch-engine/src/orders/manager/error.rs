use super::super::traits::OrderError;
use crate::sync::SyncError;
use crate::verification::{VerificationError, VisionError};
use shared::error::ErrorCode;
use shared::order::CommandError;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Verification unavailable: vision service not configured")]
    VerifierMissing,
}

pub type ManagerResult<T> = Result<T, ManagerError>;

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Order(e) => e.into(),
            ManagerError::Sync(e) => e.into(),
            ManagerError::Verification(e) => {
                let code = match &e {
                    VerificationError::MissingTarget => ErrorCode::RequiredField,
                    VerificationError::Vision(VisionError::QuotaExceeded) => {
                        ErrorCode::VisionQuotaExceeded
                    }
                    VerificationError::Vision(_) => ErrorCode::VerificationUnavailable,
                };
                tracing::warn!(error = %e, error_code = ?code, "Verification failed");
                CommandError::new(code, e.to_string())
            }
            ManagerError::OrderNotFound(id) => {
                CommandError::new(ErrorCode::OrderNotFound, format!("Order not found: {}", id))
            }
            ManagerError::VerifierMissing => CommandError::new(
                ErrorCode::VerificationUnavailable,
                "Verification unavailable: vision service not configured",
            ),
        }
    }
}
