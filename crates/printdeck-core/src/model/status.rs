// ── Live device status ──

use chrono::{DateTime, Utc};
use printdeck_api::{JobStatus, PrinterStatus, TemperatureReading};
use serde::Serialize;

use super::ProfileId;

/// Last known state of the active printer.
///
/// Printer and job halves are fetched independently; a failed fetch leaves
/// its half at the last successfully parsed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveStatus {
    pub device_id: Option<ProfileId>,
    pub printer: Option<PrinterStatus>,
    pub job: Option<JobStatus>,
    pub printer_updated_at: Option<DateTime<Utc>>,
    pub job_updated_at: Option<DateTime<Utc>>,
}

impl LiveStatus {
    /// Empty status tagged with the device it will describe.
    pub fn for_device(device_id: Option<ProfileId>) -> Self {
        Self {
            device_id,
            ..Self::default()
        }
    }

    /// `true` until at least one half has been read.
    pub fn is_empty(&self) -> bool {
        self.printer.is_none() && self.job.is_none()
    }

    /// Operational state text, preferring the printer's own label.
    pub fn state_text(&self) -> Option<&str> {
        self.printer
            .as_ref()
            .and_then(|p| p.state.as_ref())
            .map(|s| s.text.as_str())
            .or_else(|| self.job.as_ref().map(|j| j.state.as_str()))
    }

    /// Heater readings as `(heater, reading)` pairs.
    pub fn temperatures(&self) -> Vec<(String, TemperatureReading)> {
        self.printer
            .as_ref()
            .map(|p| p.temperature.readings())
            .unwrap_or_default()
    }

    /// Job completion percentage, if a job is loaded.
    pub fn completion(&self) -> Option<f64> {
        self.job.as_ref().and_then(|j| j.progress.completion)
    }
}
