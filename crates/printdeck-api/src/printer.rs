// Printer endpoints
//
// State reads, heater targets, raw command lines, and the version probe
// used for connectivity checks.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{PrinterStatus, VersionInfo};

impl DeviceClient {
    /// Read printer state and temperatures.
    ///
    /// `GET /api/printer`
    pub async fn printer_status(&self) -> Result<PrinterStatus, Error> {
        let url = self.endpoint("/api/printer")?;
        self.get_json(url).await
    }

    /// Set a tool (hotend) target temperature.
    ///
    /// `POST /api/printer/tool` with `{"command": "target", "targets": {"toolN": t}}`
    pub async fn set_tool_target(&self, tool: u8, celsius: f64) -> Result<(), Error> {
        let url = self.endpoint("/api/printer/tool")?;
        debug!(tool, celsius, "setting tool target");
        let mut targets = serde_json::Map::new();
        targets.insert(format!("tool{tool}"), json!(celsius));
        self.post_command(url, &json!({ "command": "target", "targets": targets }))
            .await
    }

    /// Set the heated bed target temperature.
    ///
    /// `POST /api/printer/bed` with `{"command": "target", "target": t}`
    pub async fn set_bed_target(&self, celsius: f64) -> Result<(), Error> {
        let url = self.endpoint("/api/printer/bed")?;
        debug!(celsius, "setting bed target");
        self.post_command(url, &json!({ "command": "target", "target": celsius }))
            .await
    }

    /// Set the heated chamber target temperature.
    ///
    /// `POST /api/printer/chamber` with `{"command": "target", "target": t}`
    pub async fn set_chamber_target(&self, celsius: f64) -> Result<(), Error> {
        let url = self.endpoint("/api/printer/chamber")?;
        debug!(celsius, "setting chamber target");
        self.post_command(url, &json!({ "command": "target", "target": celsius }))
            .await
    }

    /// Send raw command lines to the printer, in order.
    ///
    /// `POST /api/printer/command` with `{"commands": [...]}`
    pub async fn send_commands(&self, commands: &[String]) -> Result<(), Error> {
        let url = self.endpoint("/api/printer/command")?;
        debug!(?commands, "sending printer commands");
        self.post_command(url, &json!({ "commands": commands })).await
    }

    /// Server identity. Cheap, and requires a valid key.
    ///
    /// `GET /api/version`
    pub async fn version(&self) -> Result<VersionInfo, Error> {
        let url = self.endpoint("/api/version")?;
        self.get_json(url).await
    }
}
