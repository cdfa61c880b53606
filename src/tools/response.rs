//! Shared result envelope for the HTTP tool adapters.
//!
//! Every adapter folds its outcome into [`ToolResponse`]: a `success` flag,
//! a `data` payload on success, and a user-facing `error` plus an
//! [`ToolErrorKind`] tag on failure. Technical detail for diagnostics is
//! kept separate from the message shown to the user.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SidelineError};

/// Allow-list applied to every query before any network call.
pub const QUERY_PATTERN: &str = r"^[A-Za-z0-9\s.'&-]+$";

/// Maximum accepted query length, in characters.
pub const MAX_QUERY_CHARS: usize = 50;

/// Failure class reported alongside the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    ValidationFailed,
    TimeoutError,
    NetworkError,
    ApiError,
    TechnicalError,
}

/// Normalized adapter outcome. Exactly one of `data` / `error` is populated,
/// matching `success`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ToolErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_detail: Option<String>,
}

impl ToolResponse {
    pub fn ok(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
            error_kind: None,
            technical_detail: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::ValidationFailed, error, None)
    }

    pub fn timeout(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::TimeoutError, error, Some(detail.into()))
    }

    pub fn network(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::NetworkError, error, Some(detail.into()))
    }

    pub fn api(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::ApiError, error, Some(detail.into()))
    }

    pub fn technical(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::TechnicalError, error, Some(detail.into()))
    }

    fn failure(kind: ToolErrorKind, error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            error_kind: Some(kind),
            technical_detail: detail,
        }
    }

    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Compiles the shared query allow-list. Called at adapter construction so a
/// bad pattern surfaces before any tool is registered.
pub fn compile_query_pattern() -> Result<Regex> {
    Regex::new(QUERY_PATTERN)
        .map_err(|err| SidelineError::Protocol(format!("invalid query pattern: {err}")))
}

/// Validates a raw query and returns the trimmed form accepted for the
/// outbound request. `label` names the field in user-facing messages, e.g.
/// "team name". Never touches the network.
pub fn validate_query(
    raw: &str,
    pattern: &Regex,
    label: &str,
) -> std::result::Result<String, ToolResponse> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Err(ToolResponse::invalid(format!(
            "Invalid {label} provided. Please provide a valid {label} string."
        )));
    }
    if !pattern.is_match(cleaned) {
        return Err(ToolResponse::invalid(format!(
            "Invalid {label} format. Use only letters, numbers, spaces and basic punctuation."
        )));
    }
    if cleaned.chars().count() > MAX_QUERY_CHARS {
        return Err(ToolResponse::invalid(format!(
            "{} too long. Maximum {MAX_QUERY_CHARS} characters allowed.",
            capitalize(label)
        )));
    }
    Ok(cleaned.to_string())
}

/// Cuts free text at `max_chars` characters, marking the cut with an
/// ellipsis. Text at or under the limit passes through unchanged.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Maps a transport-stage failure onto the envelope: timeouts are reported
/// as retryable, everything else (DNS, refused connection, TLS) as a network
/// problem. `api` and `action` feed the user-facing wording, e.g.
/// ("sports API", "searching for teams").
pub fn classify_transport_error(err: &reqwest::Error, api: &str, action: &str) -> ToolResponse {
    if err.is_timeout() {
        ToolResponse::timeout(
            format!("Request timed out. The {api} is taking too long to respond. Please try again."),
            err.to_string(),
        )
    } else {
        ToolResponse::network(
            format!(
                "Network error occurred while {action}. Please check your connection and try again."
            ),
            err.to_string(),
        )
    }
}

/// The `Date` header of a response, as provenance for returned records.
pub fn response_date(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::DATE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
