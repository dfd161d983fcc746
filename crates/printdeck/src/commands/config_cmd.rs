//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::{Confirm, Input, Select};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::{self, prompt_err};

const OUTPUT_CHOICES: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];

#[derive(Serialize)]
struct Paths {
    config: String,
    data: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Walk through each setting, offering the current default.
fn prompt_config() -> Result<Config, CliError> {
    let defaults = Config::default();

    let poll_interval_ms: u64 = Input::new()
        .with_prompt("Poll interval (ms)")
        .default(defaults.poll_interval_ms)
        .interact_text()
        .map_err(prompt_err)?;

    let timeout_secs: u64 = Input::new()
        .with_prompt("Request timeout (s)")
        .default(defaults.timeout_secs)
        .interact_text()
        .map_err(prompt_err)?;

    let output = Select::new()
        .with_prompt("Default output format")
        .items(OUTPUT_CHOICES)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let insecure = Confirm::new()
        .with_prompt("Accept self-signed printer certificates?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let mut cfg = Config {
        poll_interval_ms,
        timeout_secs,
        insecure,
        ..defaults
    };
    if let Some(choice) = OUTPUT_CHOICES.get(output) {
        (*choice).clone_into(&mut cfg.defaults.output);
    }
    Ok(cfg)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &mut GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            config::apply_defaults(global, &cfg);
            let rendered = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                global.output(),
                &cfg,
                |_| rendered.trim_end().to_owned(),
                |_| config::config_file(global).display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let cfg = config::load(global)?;
            config::apply_defaults(global, &cfg);
            let paths = Paths {
                config: config::config_file(global).display().to_string(),
                data: cfg.data_dir().display().to_string(),
            };
            let out = output::render_single(
                global.output(),
                &paths,
                |p| format!("Config: {}\nData:   {}", p.config, p.data),
                |p| p.config.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { defaults } => {
            let path = config::config_file(global);
            let painter = Painter::new(global.color());

            if path.exists()
                && !util::confirm(
                    &format!("Overwrite {}?", path.display()),
                    global.yes,
                    "config init",
                )?
            {
                return Ok(());
            }

            let cfg = if defaults || !std::io::stdin().is_terminal() {
                Config::default()
            } else {
                eprintln!("printdeck configuration");
                eprintln!("   Config path: {}\n", path.display());
                prompt_config()?
            };

            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!(
                    "{} Configuration written to {}",
                    painter.success("✓"),
                    path.display()
                );
                eprintln!("  Next: printdeck printers add <name> <url>");
            }
            Ok(())
        }
    }
}
