// Job endpoints
//
// Current job read plus pause / resume / cancel, all against `/api/job`.

use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::JobStatus;

impl DeviceClient {
    /// Read the current job and its progress.
    ///
    /// `GET /api/job`
    pub async fn job_status(&self) -> Result<JobStatus, Error> {
        let url = self.endpoint("/api/job")?;
        self.get_json(url).await
    }

    /// Pause the running job.
    ///
    /// `POST /api/job` with `{"command": "pause", "action": "pause"}`
    pub async fn pause_job(&self) -> Result<(), Error> {
        debug!("pausing job");
        self.pause_action("pause").await
    }

    /// Resume a paused job.
    ///
    /// `POST /api/job` with `{"command": "pause", "action": "resume"}`
    pub async fn resume_job(&self) -> Result<(), Error> {
        debug!("resuming job");
        self.pause_action("resume").await
    }

    /// Cancel the running job.
    ///
    /// `POST /api/job` with `{"command": "cancel"}`
    pub async fn cancel_job(&self) -> Result<(), Error> {
        let url = self.endpoint("/api/job")?;
        debug!("cancelling job");
        self.post_command(url, &json!({ "command": "cancel" })).await
    }

    async fn pause_action(&self, action: &str) -> Result<(), Error> {
        let url = self.endpoint("/api/job")?;
        self.post_command(url, &json!({ "command": "pause", "action": action }))
            .await
    }
}
