// ── Failure classification ──
//
// Maps raw device-request failures onto the small taxonomy that the poller
// and dispatcher report against. Pure: no I/O, no logging.

use printdeck_api::Error as ApiError;
use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// What went wrong, from the operator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No profile is selected, so there is nothing to talk to.
    NoActiveDevice,
    /// The request never reached the device or never came back.
    ConnectivityFailure,
    /// The device answered with a non-success status.
    DeviceRejected,
    /// The device answered but the payload could not be understood.
    MalformedResponse,
}

/// Classify a transport-level failure.
pub fn classify(err: &ApiError) -> FailureKind {
    match err {
        ApiError::InvalidUrl(_) | ApiError::InvalidBaseUrl { .. } | ApiError::Tls(_) => {
            FailureKind::ConnectivityFailure
        }
        ApiError::Transport(e) if e.is_decode() => FailureKind::MalformedResponse,
        ApiError::Transport(e) if e.status().is_some() => FailureKind::DeviceRejected,
        ApiError::Transport(_) => FailureKind::ConnectivityFailure,
        ApiError::InvalidApiKey { .. } | ApiError::Api { .. } => FailureKind::DeviceRejected,
        ApiError::Deserialization { .. } => FailureKind::MalformedResponse,
    }
}
