// ── Command dispatch ──
//
// Every operator intent flows through `Dispatcher::execute`: resolve the
// active printer, validate, send, then report the outcome exactly once.
// A successful intent is followed by an immediate status read so the
// effect shows up without waiting for the next tick.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, info, warn};

use printdeck_api::{DeviceClient, DeviceConnector, FileEntry, VersionInfo};
use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::ProfileId;
use crate::notify::{NotificationKind, Notifier};
use crate::poller::StatusPoller;
use crate::registry::Registry;

/// Highest target temperature accepted for any heater, in °C.
pub const MAX_TEMPERATURE: f64 = 400.0;

/// File extensions the device accepts for upload.
pub const UPLOAD_EXTENSIONS: &[&str] = &["gcode", "gco", "g"];

const MOVE_FEEDRATE: u32 = 3000;
const EXTRUDE_FEEDRATE: u32 = 300;

// ── Intent vocabulary ────────────────────────────────────────────

/// A motion axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A heater that accepts a target temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heater {
    Tool(u8),
    Bed,
    Chamber,
}

impl Heater {
    fn label(self) -> String {
        match self {
            Self::Tool(0) => "Nozzle".into(),
            Self::Tool(n) => format!("Tool {n}"),
            Self::Bed => "Bed".into(),
            Self::Chamber => "Chamber".into(),
        }
    }
}

impl fmt::Display for Heater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool(n) => write!(f, "tool{n}"),
            Self::Bed => f.write_str("bed"),
            Self::Chamber => f.write_str("chamber"),
        }
    }
}

impl FromStr for Heater {
    type Err = CoreError;

    /// Accepts `bed`, `chamber`, `tool<N>`, and `tool` / `nozzle` / `hotend`
    /// for the first tool.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "bed" => Ok(Self::Bed),
            "chamber" => Ok(Self::Chamber),
            "tool" | "nozzle" | "hotend" => Ok(Self::Tool(0)),
            other => other
                .strip_prefix("tool")
                .and_then(|n| n.parse().ok())
                .map(Self::Tool)
                .ok_or_else(|| {
                    CoreError::validation(
                        "heater",
                        format!("'{s}' is not one of bed, chamber, tool<N>"),
                    )
                }),
        }
    }
}

/// Everything an operator can ask the active printer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    // ── Job control ──────────────────────────────────────────────────
    PauseJob,
    ResumeJob,
    CancelJob,

    // ── Temperature / motion ─────────────────────────────────────────
    SetTemperature { heater: Heater, celsius: f64 },
    /// Relative move; negative distances move toward the origin.
    MoveAxis { axis: Axis, distance_mm: f64 },
    Home { axes: Vec<Axis> },
    /// Positive amounts extrude, negative amounts retract.
    Extrude { amount_mm: f64 },

    // ── Files ────────────────────────────────────────────────────────
    StartFile { name: String },
    DeleteFile { name: String },
    UploadFile { name: String, contents: Bytes },

    // ── Raw ──────────────────────────────────────────────────────────
    SendCommands { lines: Vec<String> },
}

impl Intent {
    /// Short action name used in failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PauseJob => "Pause",
            Self::ResumeJob => "Resume",
            Self::CancelJob => "Cancel",
            Self::SetTemperature { .. } => "Set temperature",
            Self::MoveAxis { .. } => "Move",
            Self::Home { .. } => "Home",
            Self::Extrude { amount_mm } if *amount_mm < 0.0 => "Retract",
            Self::Extrude { .. } => "Extrude",
            Self::StartFile { .. } => "Start print",
            Self::DeleteFile { .. } => "Delete file",
            Self::UploadFile { .. } => "Upload",
            Self::SendCommands { .. } => "Send commands",
        }
    }

    /// Message shown once the printer accepts the intent.
    pub fn success_message(&self) -> String {
        match self {
            Self::PauseJob => "Paused".into(),
            Self::ResumeJob => "Resumed".into(),
            Self::CancelJob => "Print cancelled".into(),
            Self::SetTemperature { heater, celsius } => {
                format!("{} target set to {celsius}°C", heater.label())
            }
            Self::MoveAxis { axis, distance_mm } => format!("Moved {axis} {distance_mm}mm"),
            Self::Home { axes } => format!("Homed {}", axis_list(axes)),
            Self::Extrude { amount_mm } if *amount_mm < 0.0 => {
                format!("Retracted {}mm", amount_mm.abs())
            }
            Self::Extrude { amount_mm } => format!("Extruded {amount_mm}mm"),
            Self::StartFile { name } => format!("Starting print: {name}"),
            Self::DeleteFile { .. } => "File deleted".into(),
            Self::UploadFile { name, .. } => format!("{name} uploaded successfully"),
            Self::SendCommands { lines } if lines.len() == 1 => "Sent 1 command".into(),
            Self::SendCommands { lines } => format!("Sent {} commands", lines.len()),
        }
    }

    /// Check arguments before anything goes on the wire.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::PauseJob | Self::ResumeJob | Self::CancelJob => Ok(()),
            Self::SetTemperature { celsius, .. } => {
                if !celsius.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(celsius) {
                    return Err(CoreError::validation(
                        "temperature",
                        format!("{celsius}°C is outside 0..={MAX_TEMPERATURE}°C"),
                    ));
                }
                Ok(())
            }
            Self::MoveAxis { distance_mm, .. } => nonzero("distance", *distance_mm),
            Self::Extrude { amount_mm } => nonzero("amount", *amount_mm),
            Self::Home { axes } => {
                if axes.is_empty() {
                    return Err(CoreError::validation("axes", "at least one axis is required"));
                }
                Ok(())
            }
            Self::StartFile { name } | Self::DeleteFile { name } => file_name(name),
            Self::UploadFile { name, .. } => {
                file_name(name)?;
                let ext = Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_default();
                if !UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
                    return Err(CoreError::validation(
                        "file name",
                        format!("'{name}' must end in .gcode, .gco or .g"),
                    ));
                }
                Ok(())
            }
            Self::SendCommands { lines } => {
                if lines.is_empty() || lines.iter().any(|l| l.trim().is_empty()) {
                    return Err(CoreError::validation(
                        "commands",
                        "at least one non-blank command line is required",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Device-native command lines for motion intents.
    fn command_lines(&self) -> Option<Vec<String>> {
        match self {
            Self::MoveAxis { axis, distance_mm } => Some(relative(format!(
                "G1 {axis}{distance_mm} F{MOVE_FEEDRATE}"
            ))),
            Self::Home { axes } => Some(vec![format!("G28 {}", axis_list(axes))]),
            Self::Extrude { amount_mm } => Some(relative(format!(
                "G1 E{amount_mm} F{EXTRUDE_FEEDRATE}"
            ))),
            Self::SendCommands { lines } => {
                Some(lines.iter().map(|l| l.trim().to_owned()).collect())
            }
            _ => None,
        }
    }
}

/// Wrap one move in relative-positioning mode.
fn relative(line: String) -> Vec<String> {
    vec!["G91".into(), line, "G90".into()]
}

/// Distinct axes in X, Y, Z order, concatenated (`"XYZ"`).
fn axis_list(axes: &[Axis]) -> String {
    let mut axes = axes.to_vec();
    axes.sort_unstable();
    axes.dedup();
    axes.iter().map(ToString::to_string).collect()
}

fn nonzero(field: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value.abs() < f64::EPSILON {
        return Err(CoreError::validation(
            field,
            format!("{value}mm must be a non-zero finite number"),
        ));
    }
    Ok(())
}

fn file_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("file name", "must not be empty"));
    }
    Ok(())
}

// ── Dispatcher ───────────────────────────────────────────────────

/// Sends intents to the active printer and reports each outcome once.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Registry,
    connector: DeviceConnector,
    poller: StatusPoller,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        registry: Registry,
        connector: DeviceConnector,
        poller: StatusPoller,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            connector,
            poller,
            notifier,
        }
    }

    /// Execute one intent against the active printer.
    ///
    /// Success: one success notification, then an out-of-cycle status read.
    /// Failure: one error notification and the error; registry and live
    /// status are left as they were.
    pub async fn execute(&self, intent: Intent) -> Result<(), CoreError> {
        match self.send(&intent).await {
            Ok(()) => {
                let message = intent.success_message();
                info!(intent = intent.label(), "{message}");
                self.notifier.notify(NotificationKind::Success, &message);
                self.poller.refresh_now().await;
                Ok(())
            }
            Err(err) => {
                warn!(
                    intent = intent.label(),
                    kind = ?err.failure_kind(),
                    error = %err,
                    "intent failed"
                );
                self.notifier
                    .notify(NotificationKind::Error, &failure_message(&intent, &err));
                Err(err)
            }
        }
    }

    async fn send(&self, intent: &Intent) -> Result<(), CoreError> {
        let client = self.active_client()?;
        intent.validate()?;
        debug!(?intent, "dispatching intent");

        if let Some(lines) = intent.command_lines() {
            client.send_commands(&lines).await?;
            return Ok(());
        }

        match intent {
            Intent::PauseJob => client.pause_job().await?,
            Intent::ResumeJob => client.resume_job().await?,
            Intent::CancelJob => client.cancel_job().await?,
            Intent::SetTemperature { heater, celsius } => match heater {
                Heater::Tool(n) => client.set_tool_target(*n, *celsius).await?,
                Heater::Bed => client.set_bed_target(*celsius).await?,
                Heater::Chamber => client.set_chamber_target(*celsius).await?,
            },
            Intent::StartFile { name } => client.select_and_print(name.trim()).await?,
            Intent::DeleteFile { name } => client.delete_file(name.trim()).await?,
            Intent::UploadFile { name, contents } => {
                client.upload_file(name.trim(), contents.clone()).await?;
            }
            Intent::MoveAxis { .. }
            | Intent::Home { .. }
            | Intent::Extrude { .. }
            | Intent::SendCommands { .. } => {}
        }
        Ok(())
    }

    // ── Read-only helpers ────────────────────────────────────────

    /// Printable files on the active printer, folders flattened away.
    pub async fn list_files(&self) -> Result<Vec<FileEntry>, CoreError> {
        let client = self.active_client()?;
        let listing = client.list_files(true).await?;
        let mut files = Vec::new();
        flatten_files(listing.files, &mut files);
        Ok(files)
    }

    /// Probe an address and key before trusting them in a profile.
    pub async fn test_connection(
        &self,
        server_url: &str,
        api_key: &str,
    ) -> Result<VersionInfo, CoreError> {
        let client = self
            .connector
            .connect(server_url, SecretString::from(api_key.to_owned()))?;
        Ok(client.version().await?)
    }

    /// Probe a registered profile.
    pub async fn test_profile(&self, id: &ProfileId) -> Result<VersionInfo, CoreError> {
        let profile = self
            .registry
            .get(id)
            .ok_or_else(|| CoreError::UnknownProfileId { id: id.to_string() })?;
        let client = profile.connect(&self.connector)?;
        Ok(client.version().await?)
    }

    fn active_client(&self) -> Result<DeviceClient, CoreError> {
        let profile = self.registry.active().ok_or(CoreError::NoActiveDevice)?;
        profile.connect(&self.connector)
    }
}

fn failure_message(intent: &Intent, err: &CoreError) -> String {
    match err {
        CoreError::NoActiveDevice => err.to_string(),
        _ => format!("{} failed: {err}", intent.label()),
    }
}

fn flatten_files(entries: Vec<FileEntry>, out: &mut Vec<FileEntry>) {
    for mut entry in entries {
        if entry.is_folder() {
            flatten_files(std::mem::take(&mut entry.children), out);
        } else {
            entry.children.clear();
            out.push(entry);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn heater_parsing() {
        assert_eq!("bed".parse::<Heater>().unwrap(), Heater::Bed);
        assert_eq!("Nozzle".parse::<Heater>().unwrap(), Heater::Tool(0));
        assert_eq!("tool1".parse::<Heater>().unwrap(), Heater::Tool(1));
        assert!("toolx".parse::<Heater>().is_err());
        assert!("fan".parse::<Heater>().is_err());
        assert_eq!(Heater::Tool(2).to_string(), "tool2");
    }

    #[test]
    fn axis_parsing_is_case_insensitive() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!(Axis::iter().map(|a| a.to_string()).collect::<String>(), "XYZ");
    }

    #[test]
    fn motion_command_lines() {
        let lines = Intent::MoveAxis {
            axis: Axis::X,
            distance_mm: 10.0,
        }
        .command_lines()
        .unwrap();
        assert_eq!(lines, ["G91", "G1 X10 F3000", "G90"]);

        let lines = Intent::Home {
            axes: vec![Axis::Z, Axis::X, Axis::Y, Axis::X],
        }
        .command_lines()
        .unwrap();
        assert_eq!(lines, ["G28 XYZ"]);

        let lines = Intent::Extrude { amount_mm: -2.5 }.command_lines().unwrap();
        assert_eq!(lines, ["G91", "G1 E-2.5 F300", "G90"]);
    }

    #[test]
    fn success_messages() {
        assert_eq!(Intent::PauseJob.success_message(), "Paused");
        assert_eq!(Intent::CancelJob.success_message(), "Print cancelled");
        assert_eq!(
            Intent::SetTemperature {
                heater: Heater::Tool(0),
                celsius: 210.0
            }
            .success_message(),
            "Nozzle target set to 210°C"
        );
        assert_eq!(
            Intent::MoveAxis {
                axis: Axis::X,
                distance_mm: 10.0
            }
            .success_message(),
            "Moved X 10mm"
        );
        assert_eq!(
            Intent::Extrude { amount_mm: -5.0 }.success_message(),
            "Retracted 5mm"
        );
        assert_eq!(
            Intent::StartFile {
                name: "benchy.gcode".into()
            }
            .success_message(),
            "Starting print: benchy.gcode"
        );
    }

    #[test]
    fn validation_rules() {
        let hot = Intent::SetTemperature {
            heater: Heater::Bed,
            celsius: 401.0,
        };
        assert!(matches!(hot.validate(), Err(CoreError::Validation { .. })));
        let nan = Intent::SetTemperature {
            heater: Heater::Bed,
            celsius: f64::NAN,
        };
        assert!(nan.validate().is_err());
        assert!(
            Intent::SetTemperature {
                heater: Heater::Bed,
                celsius: 0.0
            }
            .validate()
            .is_ok()
        );

        assert!(Intent::Extrude { amount_mm: 0.0 }.validate().is_err());
        assert!(Intent::Home { axes: vec![] }.validate().is_err());
        assert!(Intent::StartFile { name: "  ".into() }.validate().is_err());
        assert!(Intent::SendCommands { lines: vec![] }.validate().is_err());

        let upload = |name: &str| Intent::UploadFile {
            name: name.into(),
            contents: Bytes::from_static(b"G28"),
        };
        assert!(upload("part.GCODE").validate().is_ok());
        assert!(upload("part.gco").validate().is_ok());
        assert!(upload("part.stl").validate().is_err());
        assert!(upload("gcode").validate().is_err());
    }

    #[test]
    fn flatten_drops_folders() {
        let entry = |name: &str, kind: &str, children: Vec<FileEntry>| FileEntry {
            name: name.into(),
            kind: Some(kind.into()),
            children,
            ..FileEntry::default()
        };
        let tree = vec![
            entry("a.gcode", "machinecode", vec![]),
            entry(
                "parts",
                "folder",
                vec![
                    entry("b.gcode", "machinecode", vec![]),
                    entry("deep", "folder", vec![entry("c.gcode", "machinecode", vec![])]),
                ],
            ),
        ];
        let mut out = Vec::new();
        flatten_files(tree, &mut out);
        let names: Vec<&str> = out.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.gcode", "b.gcode", "c.gcode"]);
    }
}
