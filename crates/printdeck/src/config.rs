//! CLI configuration -- thin wrapper around `printdeck_config`.
//!
//! Adds the `GlobalOpts` overrides (--config, --data-dir, --insecure,
//! --timeout) on top of the shared loader and wires the result into a
//! core `Session`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;

use printdeck_core::Session;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{Painter, TerminalNotifier};

// ── Re-exports from shared crate ────────────────────────────────────

pub use printdeck_config::{Config, config_path, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `PRINTDECK_CONFIG`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&config_file(global))?;
    if global.insecure {
        cfg.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout_secs = timeout;
    }
    if let Some(ref dir) = global.data_dir {
        cfg.data_dir = Some(dir.clone());
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Fill unset `--output` / `--color` from the config's defaults.
pub fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&cfg.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&cfg.defaults.color, true).ok();
    }
}

/// Open the engine over the on-disk profile store.
pub fn open_session(cfg: &Config, global: &GlobalOpts) -> Result<Session, CliError> {
    let notifier = TerminalNotifier::new(Painter::new(global.color()), global.quiet);
    let session = Session::open(
        &cfg.to_session_config(),
        Arc::new(cfg.open_store()),
        Arc::new(notifier),
    )?;
    Ok(session)
}
