//! Shared types for the order lifecycle

use crate::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session identity
// ============================================================================

/// 角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 管理员：导入、改派、设置截止时间
    Admin,
    /// 外勤人员：接单、回单
    Worker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Worker => write!(f, "WORKER"),
        }
    }
}

/// Session user. Not persisted; only used to authorize and filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl User {
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            name: name.into(),
            team: None,
        }
    }

    pub fn worker(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            role: Role::Worker,
            name: name.into(),
            team: Some(team.into()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ============================================================================
// Completion payload
// ============================================================================

/// 回单原因（现场处理结果）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnReason {
    /// 已处理完成
    Resolved,
    /// 用户不在现场
    CustomerAbsent,
    /// 地址错误/找不到
    AddressInvalid,
    /// 用户拒绝
    CustomerRefused,
    /// 设备缺失
    EquipmentMissing,
    /// 其他
    Other,
}

impl ReturnReason {
    pub fn label(&self) -> &'static str {
        match self {
            ReturnReason::Resolved => "resolved",
            ReturnReason::CustomerAbsent => "customer absent",
            ReturnReason::AddressInvalid => "address invalid",
            ReturnReason::CustomerRefused => "customer refused",
            ReturnReason::EquipmentMissing => "equipment missing",
            ReturnReason::Other => "other",
        }
    }
}

/// Image or audio payload carried inline as base64.
///
/// Storage of the binary itself belongs to the capture pipeline; the engine
/// only moves the reference around and hands images to the vision service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Base64-encoded content (no data-URL prefix)
    pub data: String,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            mime_type: None,
            data: data.into(),
        }
    }

    /// Explicit MIME type, else guessed from the file name, else JPEG
    /// (camera captures are JPEG).
    pub fn content_type(&self) -> String {
        if let Some(mime) = &self.mime_type {
            return mime.clone();
        }
        self.file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string())
    }

    /// `data:` URL form used by the vision API
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type(), self.data)
    }
}

/// Location stamp captured with the completion photo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoStamp {
    pub latitude: f64,
    pub longitude: f64,
    /// Reverse-geocoded address; absent when geocoding failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl GeoStamp {
    pub fn describe(&self) -> String {
        match &self.address {
            Some(addr) => format!("{} ({:.6}, {:.6})", addr, self.latitude, self.longitude),
            None => format!("({:.6}, {:.6})", self.latitude, self.longitude),
        }
    }
}

/// Worker's completion submission
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<ReturnReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default)]
    pub remark_images: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoStamp>,
}

impl CompletionSubmission {
    /// At least one proof-of-work artifact present
    pub fn has_proof(&self) -> bool {
        self.photo.is_some() || !self.remark_images.is_empty()
    }
}

/// Outcome of the serial check recorded on the completion event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub matched: bool,
    pub detected: String,
    pub message: String,
}

// ============================================================================
// Command response
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Affected order ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            error: Some(error),
        }
    }
}

/// Command error - a user-facing rejection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
    /// Value read from the photo, present on verification failures so the
    /// worker can retake a clearer picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detected: None,
        }
    }

    pub fn with_detected(mut self, detected: impl Into<String>) -> Self {
        self.detected = Some(detected.into());
        self
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        let detected = err.detected.clone();
        let app = AppError::with_message(err.code, err.message);
        match detected {
            Some(d) => app.with_detail("detected", d),
            None => app,
        }
    }
}
