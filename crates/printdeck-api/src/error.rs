use thiserror::Error;

/// Top-level error type for the `printdeck-api` crate.
///
/// Covers every failure mode of a single device request: URL handling,
/// transport, non-success responses, and payload decoding.
/// `printdeck-core` classifies these into its failure taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Addressing ──────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL parsed but cannot address a device API.
    #[error("Invalid device address {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Device responses ────────────────────────────────────────────
    /// The device refused the API key (401 / 403).
    #[error("Invalid API key (HTTP {status})")]
    InvalidApiKey { status: u16 },

    /// Any other non-success status from the device.
    #[error("Device API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status reported by the device, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey { status } | Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the request never reached the device or never
    /// came back (refused, unreachable, timed out, TLS failure).
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => e.status().is_none() && !e.is_decode(),
            Self::Tls(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if the device answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
