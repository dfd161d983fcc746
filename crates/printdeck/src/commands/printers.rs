//! Printer profile handlers.

use serde::Serialize;
use tabled::Tabled;

use printdeck_core::{DeviceProfile, NewProfile, ProfilePatch, Session, VersionInfo};

use crate::cli::{GlobalOpts, PrintersArgs, PrintersCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// A profile as shown to the operator. The API key never leaves the store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrinterView {
    id: String,
    name: String,
    server_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    active: bool,
}

impl PrinterView {
    fn new(profile: &DeviceProfile, active: bool) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name.clone(),
            server_url: profile.server_url.clone(),
            color: profile.color.clone(),
            active,
        }
    }
}

#[derive(Tabled)]
struct PrinterRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&PrinterView> for PrinterRow {
    fn from(p: &PrinterView) -> Self {
        Self {
            marker: if p.active { "●" } else { "" },
            name: p.name.clone(),
            url: p.server_url.clone(),
            color: p.color.clone().unwrap_or_default(),
            id: p.id.clone(),
        }
    }
}

fn version_detail(v: &VersionInfo) -> String {
    [
        format!("Server:  {}", v.text.as_deref().unwrap_or("-")),
        format!("Version: {}", v.server.as_deref().unwrap_or("-")),
        format!("API:     {}", v.api.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    session: &Session,
    args: PrintersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let registry = session.registry();
    let painter = Painter::new(global.color());

    match args.command {
        PrintersCommand::List => {
            let active = registry.active_id();
            let views: Vec<PrinterView> = registry
                .list()
                .iter()
                .map(|p| PrinterView::new(p, active.as_ref() == Some(&p.id)))
                .collect();
            let out = output::render_list(
                global.output(),
                &views,
                |p| PrinterRow::from(p),
                |p| p.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PrintersCommand::Add {
            name,
            url,
            api_key,
            color,
            skip_test,
        } => {
            let api_key = match api_key {
                Some(key) => key,
                None => util::prompt_api_key()?,
            };

            if !skip_test {
                let spinner = output::spinner(&format!("Contacting {url}..."), global.quiet);
                let probe = session.dispatcher().test_connection(&url, &api_key).await;
                spinner.finish_and_clear();
                let version = probe?;
                if !global.quiet {
                    eprintln!(
                        "{} {}",
                        painter.success("✓"),
                        version.text.as_deref().unwrap_or("Printer answered")
                    );
                }
            }

            let mut profile = NewProfile::new(name.clone(), url, api_key);
            if let Some(color) = color {
                profile = profile.with_color(color);
            }
            let id = registry.add(profile)?;
            tracing::info!(printer = %id, "printer added");
            if !global.quiet {
                eprintln!(
                    "{} Added {} and made it active",
                    painter.success("✓"),
                    painter.accent(name.trim())
                );
            }
            output::print_output(id.as_str(), global.quiet);
            Ok(())
        }

        PrintersCommand::Edit {
            printer,
            name,
            url,
            api_key,
            prompt_key,
            color,
            clear_color,
        } => {
            let profile = util::resolve_printer(registry, &printer)?;
            let api_key = if prompt_key {
                Some(util::prompt_api_key()?)
            } else {
                api_key
            };
            let patch = ProfilePatch {
                name,
                server_url: url,
                api_key,
                color: if clear_color { Some(None) } else { color.map(Some) },
            };
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "edit".into(),
                    reason: "nothing to change; pass --name, --url, --api-key or --color".into(),
                });
            }

            let updated = registry.update(&profile.id, &patch)?;
            if !global.quiet {
                eprintln!("{} Updated {}", painter.success("✓"), painter.accent(&updated.name));
            }
            Ok(())
        }

        PrintersCommand::Remove { printer } => {
            let profile = util::resolve_printer(registry, &printer)?;
            let prompt = format!("Remove printer {}?", profile.name);
            if !util::confirm(&prompt, global.yes, "printers remove")? {
                return Ok(());
            }

            registry.remove(&profile.id)?;
            if !global.quiet {
                eprintln!("{} Removed {}", painter.success("✓"), profile.name);
                match registry.active() {
                    Some(next) => eprintln!("  Active printer: {}", painter.accent(&next.name)),
                    None => eprintln!("  {}", painter.dim("No printers left")),
                }
            }
            Ok(())
        }

        PrintersCommand::Use { printer } => {
            let profile = util::resolve_printer(registry, &printer)?;
            registry.set_active(&profile.id)?;
            if !global.quiet {
                eprintln!(
                    "{} Active printer: {}",
                    painter.success("✓"),
                    painter.accent(&profile.name)
                );
            }
            Ok(())
        }

        PrintersCommand::Test { printer } => {
            let profile = match printer {
                Some(ident) => util::resolve_printer(registry, &ident)?,
                None => registry.active().ok_or(CliError::NoActivePrinter)?,
            };

            let spinner = output::spinner(
                &format!("Contacting {}...", profile.server_url),
                global.quiet,
            );
            let probe = session.dispatcher().test_profile(&profile.id).await;
            spinner.finish_and_clear();
            let version = probe?;

            let out = output::render_single(global.output(), &version, version_detail, |v| {
                v.server.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
