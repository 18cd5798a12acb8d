//! Backend failure classification.
//!
//! Maps an arbitrary backend failure onto a fixed set of HTTP-style error
//! categories via case-insensitive substring rules plus an exact-match set
//! of network error codes. The rule order is load-bearing: a message that
//! matches several categories takes the earliest listed outcome, and
//! downstream status codes must not change.

use crate::ports::BackendError;

/// Error codes that always classify as a network failure.
const NETWORK_CODES: [&str; 6] = [
    "ECONNREFUSED",
    "ENOTFOUND",
    "ETIMEDOUT",
    "ECONNRESET",
    "ENETUNREACH",
    "EAI_AGAIN",
];

const NETWORK_TERMS: [&str; 6] = [
    "network",
    "timeout",
    "connect",
    "offline",
    "unavailable",
    "empty response",
];
const AUTH_TERMS: [&str; 4] = ["auth", "token", "unauthorized", "api key"];
const PERMISSION_TERMS: [&str; 2] = ["permission", "forbidden"];
const RATE_LIMIT_TERMS: [&str; 3] = ["rate", "limit", "quota"];
const INVALID_TERMS: [&str; 2] = ["invalid", "bad request"];

/// The fixed error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ServiceUnavailable,
    Authentication,
    Permission,
    RateLimit,
    InvalidRequest,
    NotFound,
    Internal,
}

impl ErrorCategory {
    /// HTTP status code for this category.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::ServiceUnavailable => 503,
            Self::Authentication => 401,
            Self::Permission => 403,
            Self::RateLimit => 429,
            Self::InvalidRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Wire name of this category (the OpenAI-style `error.type` value).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "service_unavailable",
            Self::Authentication => "authentication_error",
            Self::Permission => "permission_error",
            Self::RateLimit => "rate_limit_error",
            Self::InvalidRequest => "invalid_request_error",
            Self::NotFound => "not_found_error",
            Self::Internal => "internal_server_error",
        }
    }
}

fn contains_any(message: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| message.contains(term))
}

/// Classify a backend failure. Pure and order-sensitive; a failure matching
/// zero rules (including one with no message at all) is `Internal`.
pub fn classify(error: &BackendError) -> ErrorCategory {
    let message = error.message.to_lowercase();

    if error
        .code
        .as_deref()
        .is_some_and(|code| NETWORK_CODES.contains(&code))
    {
        return ErrorCategory::ServiceUnavailable;
    }

    if contains_any(&message, &NETWORK_TERMS) {
        ErrorCategory::ServiceUnavailable
    } else if contains_any(&message, &AUTH_TERMS) {
        ErrorCategory::Authentication
    } else if contains_any(&message, &PERMISSION_TERMS) {
        ErrorCategory::Permission
    } else if contains_any(&message, &RATE_LIMIT_TERMS) {
        ErrorCategory::RateLimit
    } else if contains_any(&message, &INVALID_TERMS) {
        ErrorCategory::InvalidRequest
    } else if message.contains("not found") {
        ErrorCategory::NotFound
    } else {
        ErrorCategory::Internal
    }
}
