//! Shared helpers for command handlers.

use std::io::IsTerminal;

use printdeck_core::{Axis, DeviceProfile, Registry};

use crate::error::CliError;

/// Resolve a printer by exact ID, then by case-insensitive name.
pub fn resolve_printer(registry: &Registry, identifier: &str) -> Result<DeviceProfile, CliError> {
    let profiles = registry.list();
    if let Some(found) = profiles.iter().find(|p| p.id.as_str() == identifier) {
        return Ok(found.clone());
    }

    let mut by_name = profiles
        .into_iter()
        .filter(|p| p.name.eq_ignore_ascii_case(identifier.trim()));
    match (by_name.next(), by_name.next()) {
        (Some(found), None) => Ok(found),
        (Some(_), Some(_)) => Err(CliError::Validation {
            field: "printer".into(),
            reason: format!("several printers are named '{identifier}'; use the ID instead"),
        }),
        (None, _) => Err(CliError::NotFound {
            resource_type: "printer".into(),
            identifier: identifier.into(),
            list_command: "printers list".into(),
        }),
    }
}

/// Parse an axis list such as `"xy"` or `"Z"`.
pub fn parse_axes(raw: &str) -> Result<Vec<Axis>, CliError> {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| {
            c.to_string().parse::<Axis>().map_err(|_| CliError::Validation {
                field: "axes".into(),
                reason: format!("'{c}' is not one of x, y, z"),
            })
        })
        .collect()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

/// Read an API key without echoing it.
pub fn prompt_api_key() -> Result<String, CliError> {
    let key = rpassword::prompt_password("API key: ")?;
    if key.trim().is_empty() {
        return Err(CliError::Validation {
            field: "API key".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(key)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
