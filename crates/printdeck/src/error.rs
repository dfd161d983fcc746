//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use printdeck_config::ConfigError;
use printdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the printer at {url}")]
    #[diagnostic(
        code(printdeck::connection_failed),
        help(
            "Check that the printer is powered on and its server is reachable.\n\
             Reason: {reason}\n\
             For a self-signed certificate, retry with --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The printer rejected the API key")]
    #[diagnostic(
        code(printdeck::auth_failed),
        help(
            "Create a key on the printer (Settings > Application Keys), then run:\n\
             printdeck printers edit <printer> --prompt-key"
        )
    )]
    AuthFailed,

    // ── Device responses ─────────────────────────────────────────────
    #[error("Printer refused the request (HTTP {status}): {message}")]
    #[diagnostic(
        code(printdeck::rejected),
        help("The printer may be busy or in the wrong state. Run: printdeck status")
    )]
    Rejected { status: u16, message: String },

    #[error("Printer sent a response printdeck could not read: {message}")]
    #[diagnostic(
        code(printdeck::malformed_response),
        help("Check that the URL points at an OctoPrint-compatible server.")
    )]
    MalformedResponse { message: String },

    // ── Selection ────────────────────────────────────────────────────
    #[error("No active printer")]
    #[diagnostic(
        code(printdeck::no_active_printer),
        help("Add one with: printdeck printers add <name> <url>")
    )]
    NoActivePrinter,

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(printdeck::not_found),
        help("Run: printdeck {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(printdeck::validation))]
    Validation { field: String, reason: String },

    // ── Storage / configuration ──────────────────────────────────────
    #[error("Could not save printer profiles: {message}")]
    #[diagnostic(
        code(printdeck::storage),
        help("Check permissions on the data directory (printdeck config path).")
    )]
    Storage { message: String },

    #[error(transparent)]
    #[diagnostic(code(printdeck::config), help("Run: printdeck config path"))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(printdeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(printdeck::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(printdeck::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(printdeck::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed => exit_code::AUTH,
            Self::NotFound { .. } | Self::NoActivePrinter => exit_code::NOT_FOUND,
            Self::Rejected { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoActiveDevice => Self::NoActivePrinter,

            CoreError::UnknownProfileId { id } => Self::NotFound {
                resource_type: "printer".into(),
                identifier: id,
                list_command: "printers list".into(),
            },

            CoreError::Connectivity { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::DeviceRejected {
                status: 401 | 403, ..
            } => Self::AuthFailed,

            CoreError::DeviceRejected { status, message } => Self::Rejected { status, message },

            CoreError::MalformedResponse { message } => Self::MalformedResponse { message },

            CoreError::Validation { field, reason } => Self::Validation { field, reason },

            CoreError::Storage { message } => Self::Storage { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let code = |e: CoreError| CliError::from(e).exit_code();

        assert_eq!(code(CoreError::NoActiveDevice), exit_code::NOT_FOUND);
        assert_eq!(
            code(CoreError::Connectivity {
                url: "http://octopi.local".into(),
                reason: "connection refused".into(),
            }),
            exit_code::CONNECTION
        );
        assert_eq!(
            code(CoreError::DeviceRejected {
                status: 403,
                message: "API key was rejected".into(),
            }),
            exit_code::AUTH
        );
        assert_eq!(
            code(CoreError::DeviceRejected {
                status: 409,
                message: "Printer is not operational".into(),
            }),
            exit_code::CONFLICT
        );
        assert_eq!(
            code(CoreError::Validation {
                field: "temperature".into(),
                reason: "too hot".into(),
            }),
            exit_code::USAGE
        );
    }
}
