// ── Core error types ──
//
// User-facing errors from printdeck-core. Consumers never see reqwest or
// serde errors directly: the `From<printdeck_api::Error>` impl routes every
// transport failure through the classifier first.

use thiserror::Error;

use crate::classify::{FailureKind, classify};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Selection errors ─────────────────────────────────────────────
    #[error("No active printer")]
    NoActiveDevice,

    #[error("Unknown printer profile: {id}")]
    UnknownProfileId { id: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Cannot reach printer at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    #[error("Printer rejected the request (HTTP {status}): {message}")]
    DeviceRejected { status: u16, message: String },

    #[error("Unexpected response from printer: {message}")]
    MalformedResponse { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CoreError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage {
            message: message.to_string(),
        }
    }

    /// Where this error sits in the device-failure taxonomy.
    ///
    /// Local errors (unknown profile, validation, storage) have no kind.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::NoActiveDevice => Some(FailureKind::NoActiveDevice),
            Self::Connectivity { .. } => Some(FailureKind::ConnectivityFailure),
            Self::DeviceRejected { .. } => Some(FailureKind::DeviceRejected),
            Self::MalformedResponse { .. } => Some(FailureKind::MalformedResponse),
            Self::UnknownProfileId { .. } | Self::Validation { .. } | Self::Storage { .. } => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<printdeck_api::Error> for CoreError {
    fn from(err: printdeck_api::Error) -> Self {
        use printdeck_api::Error as Api;

        match classify(&err) {
            FailureKind::ConnectivityFailure | FailureKind::NoActiveDevice => {
                let url = match &err {
                    Api::InvalidBaseUrl { url, .. } => url.clone(),
                    Api::Transport(e) => e
                        .url()
                        .map_or_else(|| "<unknown>".into(), |u| u.origin().ascii_serialization()),
                    _ => "<unknown>".into(),
                };
                CoreError::Connectivity {
                    url,
                    reason: root_cause(&err),
                }
            }
            FailureKind::DeviceRejected => match err {
                Api::InvalidApiKey { status } => CoreError::DeviceRejected {
                    status,
                    message: "API key was rejected".into(),
                },
                Api::Api { status, message } => CoreError::DeviceRejected { status, message },
                other => CoreError::DeviceRejected {
                    status: other.status().unwrap_or_default(),
                    message: other.to_string(),
                },
            },
            FailureKind::MalformedResponse => match err {
                Api::Deserialization { message, .. } => CoreError::MalformedResponse { message },
                other => CoreError::MalformedResponse {
                    message: other.to_string(),
                },
            },
        }
    }
}

/// Innermost error message, which for reqwest is the useful one
/// ("connection refused", "operation timed out").
fn root_cause(err: &printdeck_api::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(next) = source.source() {
        source = next;
    }
    source.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_rejection_maps_to_device_rejected() {
        let err: CoreError = printdeck_api::Error::InvalidApiKey { status: 403 }.into();
        assert!(matches!(err, CoreError::DeviceRejected { status: 403, .. }));
        assert_eq!(err.failure_kind(), Some(FailureKind::DeviceRejected));
    }

    #[test]
    fn decode_failure_keeps_message() {
        let err: CoreError = printdeck_api::Error::Deserialization {
            message: "missing field `state`".into(),
            body: "{}".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Unexpected response from printer: missing field `state`"
        );
    }

    #[test]
    fn local_errors_have_no_kind() {
        assert_eq!(CoreError::validation("name", "empty").failure_kind(), None);
        assert_eq!(
            CoreError::NoActiveDevice.failure_kind(),
            Some(FailureKind::NoActiveDevice)
        );
    }
}
