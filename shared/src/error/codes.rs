//! Unified error codes for the dispatch workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Verification errors
//! - 9xxx: System / sync errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Unknown error
    Unknown = 1,
    /// Required field missing
    RequiredField = 7,

    // ==================== 2xxx: Permission ====================
    /// Worker role required
    WorkerRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Actor is not the current assignee of the order
    NotAssignee = 2006,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Transition not allowed from the current status
    InvalidTransition = 4002,
    /// Order deadline has passed
    DeadlinePassed = 4003,
    /// Return reason not selected
    ReturnReasonRequired = 4004,
    /// Neither completion photo nor remark attachment present
    ProofRequired = 4005,

    // ==================== 5xxx: Verification ====================
    /// Serial number on the photo does not match the order
    SerialMismatch = 5001,
    /// No serial-like text found on the photo
    NothingDetected = 5002,
    /// Vision service unreachable or failed
    VerificationUnavailable = 5003,
    /// Vision service quota exhausted
    VisionQuotaExceeded = 5004,

    // ==================== 9xxx: System ====================
    /// Remote store unreachable
    RemoteUnavailable = 9201,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::RequiredField => "Required field is missing",

            // Permission
            ErrorCode::WorkerRequired => "Worker role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::NotAssignee => "Order is assigned to another worker",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Operation not allowed in current order status",
            ErrorCode::DeadlinePassed => "Order deadline has passed",
            ErrorCode::ReturnReasonRequired => "Return reason must be selected",
            ErrorCode::ProofRequired => "A completion photo or remark attachment is required",

            // Verification
            ErrorCode::SerialMismatch => "Serial number on photo does not match",
            ErrorCode::NothingDetected => "No serial number detected on photo",
            ErrorCode::VerificationUnavailable => "Verification service unavailable",
            ErrorCode::VisionQuotaExceeded => "Verification service quota exceeded",

            // System
            ErrorCode::RemoteUnavailable => "Remote store unreachable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            1 => Ok(ErrorCode::Unknown),
            7 => Ok(ErrorCode::RequiredField),

            // Permission
            2002 => Ok(ErrorCode::WorkerRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::NotAssignee),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::DeadlinePassed),
            4004 => Ok(ErrorCode::ReturnReasonRequired),
            4005 => Ok(ErrorCode::ProofRequired),

            // Verification
            5001 => Ok(ErrorCode::SerialMismatch),
            5002 => Ok(ErrorCode::NothingDetected),
            5003 => Ok(ErrorCode::VerificationUnavailable),
            5004 => Ok(ErrorCode::VisionQuotaExceeded),

            // System
            9201 => Ok(ErrorCode::RemoteUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
