// Device API response types
//
// Wire models for the OctoPrint-compatible REST API. Optional fields use
// `#[serde(default)]` because firmware forks and plugins differ in what
// they report; only the fields the engine cannot work without are required.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// ── Printer ──────────────────────────────────────────────────────────

/// Current printer state from `GET /api/printer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterStatus {
    /// Per-heater readings. A response without this object is malformed.
    pub temperature: Temperatures,
    #[serde(default)]
    pub state: Option<PrinterState>,
}

/// Heater readings keyed by heater name.
///
/// `tool0`, `bed` and `chamber` are modelled explicitly; additional tools
/// (`tool1`, ...) and plugin-reported sensors land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool0: Option<TemperatureReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed: Option<TemperatureReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber: Option<TemperatureReading>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Temperatures {
    /// All parseable readings as `(heater, reading)` pairs, known heaters first.
    pub fn readings(&self) -> Vec<(String, TemperatureReading)> {
        let mut out = Vec::new();
        let known = [
            ("tool0", self.tool0),
            ("bed", self.bed),
            ("chamber", self.chamber),
        ];
        for (name, reading) in known {
            if let Some(reading) = reading {
                out.push((name.to_owned(), reading));
            }
        }
        for (name, value) in &self.extra {
            if let Ok(reading) = serde_json::from_value::<TemperatureReading>(value.clone()) {
                out.push((name.clone(), reading));
            }
        }
        out
    }
}

/// A single heater reading. Values are degrees Celsius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
}

/// Operational state text and flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinterState {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub flags: PrinterFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PrinterFlags {
    #[serde(default)]
    pub operational: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub printing: bool,
    #[serde(default)]
    pub cancelling: bool,
    #[serde(default)]
    pub pausing: bool,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub closed_or_error: bool,
}

// ── Job ──────────────────────────────────────────────────────────────

/// Current job from `GET /api/job`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Human-readable state label, e.g. `"Printing"` or `"Operational"`.
    pub state: String,
    #[serde(default)]
    pub job: JobInfo,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    #[serde(default)]
    pub file: JobFile,
    #[serde(default)]
    pub estimated_print_time: Option<f64>,
}

/// The file selected for printing. Every field is null when nothing is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub date: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Percentage, 0.0 to 100.0.
    #[serde(default)]
    pub completion: Option<f64>,
    #[serde(default)]
    pub filepos: Option<u64>,
    /// Seconds elapsed.
    #[serde(default)]
    pub print_time: Option<f64>,
    /// Seconds remaining (estimate).
    #[serde(default)]
    pub print_time_left: Option<f64>,
}

// ── Files ────────────────────────────────────────────────────────────

/// File listing from `GET /api/files`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListing {
    /// Either a flat array or an object keyed by origin (`{"local": [...]}`).
    #[serde(default, deserialize_with = "flat_or_by_origin")]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub free: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

fn flat_or_by_origin<'de, D>(deserializer: D) -> Result<Vec<FileEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Flat(Vec<FileEntry>),
        ByOrigin {
            #[serde(default)]
            local: Vec<FileEntry>,
        },
    }

    Ok(match Option::<Shape>::deserialize(deserializer)? {
        Some(Shape::Flat(files) | Shape::ByOrigin { local: files }) => files,
        None => Vec::new(),
    })
}

/// A stored file or folder. Folders carry `children` when listed recursively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    /// `"machinecode"`, `"model"` or `"folder"`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileEntry>,
}

impl FileEntry {
    pub fn is_folder(&self) -> bool {
        self.kind.as_deref() == Some("folder")
    }
}

/// Response to a multipart upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub files: serde_json::Value,
}

// ── Server ───────────────────────────────────────────────────────────

/// Server identity from `GET /api/version`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}
