//! Response envelope
//!
//! The message strings are part of the wire contract; clients match on them.

use serde::Serialize;

use crate::registry::RegistryEntry;

pub const MSG_OK: &str = "OK";
pub const MSG_UNKNOWN_REQUEST: &str = "Unknown request";
pub const MSG_DUPLICATE_ID: &str = "Duplicate ID";
pub const MSG_UNKNOWN_ID: &str = "Unknown ID";

const FALLBACK: &str = r#"{"success":false,"message":"Internal error"}"#;

/// `{"success": bool, "message": string, "list"?: [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<RegistryEntry>>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: MSG_OK.to_string(),
            list: None,
        }
    }

    pub fn with_list(entries: Vec<RegistryEntry>) -> Self {
        Self {
            list: Some(entries),
            ..Self::ok()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            list: None,
        }
    }

    pub fn unknown_request() -> Self {
        Self::fail(MSG_UNKNOWN_REQUEST)
    }

    /// Serialize for the wire
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize response");
            FALLBACK.to_string()
        })
    }
}
