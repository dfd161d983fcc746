//! Live status handler: one-shot read or `--watch`.

use std::sync::Arc;

use printdeck_core::{LiveStatus, Session};

use crate::cli::{GlobalOpts, OutputFormat, StatusArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

// ── Rendering ───────────────────────────────────────────────────────

fn heater_label(key: &str) -> String {
    match key {
        "tool0" => "Nozzle".into(),
        "bed" => "Bed".into(),
        "chamber" => "Chamber".into(),
        other => other
            .strip_prefix("tool")
            .map_or_else(|| other.to_owned(), |n| format!("Tool {n}")),
    }
}

fn detail(name: &str, status: &LiveStatus) -> String {
    let mut lines = vec![
        format!("Printer:   {name}"),
        format!("State:     {}", status.state_text().unwrap_or("Unknown")),
    ];

    for (key, reading) in status.temperatures() {
        lines.push(format!(
            "{:<10} {}",
            format!("{}:", heater_label(&key)),
            output::temperature(reading.actual, reading.target)
        ));
    }

    if let Some(job) = status.job.as_ref() {
        let file = job.job.file.display.as_deref().or(job.job.file.name.as_deref());
        if let Some(file) = file {
            lines.push(format!("File:      {file}"));
            lines.push(format!(
                "Progress:  {}",
                status
                    .completion()
                    .map_or_else(|| "-".into(), |c| format!("{c:.1}%"))
            ));
            lines.push(format!(
                "Elapsed:   {}",
                output::seconds(job.progress.print_time)
            ));
            lines.push(format!(
                "Remaining: {}",
                output::seconds(job.progress.print_time_left)
            ));
        }
        if let Some(error) = job.error.as_deref() {
            lines.push(format!("Error:     {error}"));
        }
    }
    lines.join("\n")
}

/// One line per change while watching.
fn watch_line(status: &LiveStatus, painter: Painter) -> String {
    let time = status
        .printer_updated_at
        .max(status.job_updated_at)
        .map_or_else(String::new, |t| {
            t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string()
        });
    let temps: Vec<String> = status
        .temperatures()
        .iter()
        .map(|(key, r)| {
            format!(
                "{} {}",
                heater_label(key),
                output::temperature(r.actual, r.target)
            )
        })
        .collect();
    let progress = status
        .completion()
        .map(|c| format!("  {c:.1}%"))
        .unwrap_or_default();
    let error = status
        .job
        .as_ref()
        .and_then(|j| j.error.as_deref())
        .map(|e| format!("  {}", painter.error(e)))
        .unwrap_or_default();

    format!(
        "{} {}  {}{progress}{error}",
        painter.dim(&time),
        painter.accent(status.state_text().unwrap_or("Unknown")),
        temps.join("  ")
    )
}

fn render(status: &Arc<LiveStatus>, name: &str, global: &GlobalOpts) -> Result<String, CliError> {
    output::render_single(
        global.output(),
        status.as_ref(),
        |s| detail(name, s),
        |s| s.state_text().unwrap_or("Unknown").to_owned(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let profile = session
        .registry()
        .active()
        .ok_or(CliError::NoActivePrinter)?;

    if args.watch {
        return watch(session, &profile.name, global).await;
    }

    let spinner = output::spinner(&format!("Reading {}...", profile.name), global.quiet);
    session.poller().refresh_now().await;
    spinner.finish_and_clear();

    let status = session.poller().status();
    if status.is_empty() {
        // The poller only logs failures; probe once to say why.
        session.dispatcher().test_profile(&profile.id).await?;
        return Err(CliError::MalformedResponse {
            message: "neither printer nor job status could be read".into(),
        });
    }

    let out = render(&status, &profile.name, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn watch(session: &Session, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(global.color());
    let mut stream = session.poller().subscribe();
    session.start();

    if !global.quiet {
        eprintln!(
            "Watching {} every {} (Ctrl-C to stop)",
            painter.accent(name),
            humantime::format_duration(session.poller().interval())
        );
    }

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            next = stream.changed() => {
                let Some(status) = next else { break };
                if status.is_empty() {
                    continue;
                }
                let out = match global.output() {
                    OutputFormat::Table => watch_line(&status, painter),
                    _ => render(&status, name, global)?,
                };
                output::print_output(&out, global.quiet);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heater_labels() {
        assert_eq!(heater_label("tool0"), "Nozzle");
        assert_eq!(heater_label("tool1"), "Tool 1");
        assert_eq!(heater_label("bed"), "Bed");
        assert_eq!(heater_label("W"), "W");
    }

    #[test]
    fn empty_status_detail_is_unknown() {
        let text = detail("Ender", &LiveStatus::default());
        assert!(text.contains("Printer:   Ender"));
        assert!(text.contains("State:     Unknown"));
        assert!(!text.contains("File:"));
    }
}
