//! Hand-written CDP types for the messages the bridge routes, fakes or parses
//!
//! These replace generated protocol bindings with a minimal set that's just
//! enough for session bridging. Forwarded command payloads stay opaque
//! `serde_json::Value`s; only the envelopes and the Target-domain payloads
//! the bridge itself inspects get concrete types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A command envelope as received from the automation client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpCommand {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The single reply owed for every command: exactly one of `result`/`error`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpResponse {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CdpError>,
}

impl CdpResponse {
    /// Build a success reply
    pub fn ok(id: u64, session_id: Option<String>, result: Value) -> Self {
        Self {
            id,
            session_id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error reply from a bridge error
    pub fn err(id: u64, session_id: Option<String>, error: &Error) -> Self {
        Self {
            id,
            session_id,
            result: None,
            error: Some(CdpError {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}

/// Protocol-level error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpError {
    pub code: i64,
    pub message: String,
}

/// An unsolicited protocol event pushed to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetInfo {
    pub target_id: String,
    pub r#type: String,
    pub title: String,
    pub url: String,
    pub attached: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetGetTargetInfoResult {
    pub target_info: TargetInfo,
}

/// Params of a `Target.attachedToTarget` event passing through the bridge
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAttachedToTargetParams {
    pub session_id: String,
    #[serde(default)]
    pub target_info: TargetInfo,
    #[serde(default)]
    pub waiting_for_debugger: bool,
}

/// Params of a `Target.detachedFromTarget` event passing through the bridge
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetachedFromTargetParams {
    pub session_id: String,
    #[serde(default)]
    pub target_id: Option<String>,
}
