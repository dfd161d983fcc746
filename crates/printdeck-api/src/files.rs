// File endpoints
//
// Listing, upload, select-and-print, and delete against the device's
// local storage.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::debug;

use crate::client::DeviceClient;
use crate::error::Error;
use crate::models::{FileListing, UploadResponse};

const LOCAL: &str = "local";

impl DeviceClient {
    /// List stored files.
    ///
    /// `GET /api/files` (with `?recursive=true` to descend into folders)
    pub async fn list_files(&self, recursive: bool) -> Result<FileListing, Error> {
        let mut url = self.endpoint("/api/files")?;
        if recursive {
            url.query_pairs_mut().append_pair("recursive", "true");
        }
        self.get_json(url).await
    }

    /// Upload a file to local storage without selecting or printing it.
    ///
    /// `POST /api/files/local` as `multipart/form-data` with fields
    /// `file`, `filename`, `select=false`, `print=false`.
    pub async fn upload_file(&self, name: &str, contents: Bytes) -> Result<UploadResponse, Error> {
        let url = self.endpoint(&format!("/api/files/{LOCAL}"))?;
        debug!(name, size = contents.len(), "uploading file");

        let part = Part::bytes(Vec::from(contents))
            .file_name(name.to_owned())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("file", part)
            .text("filename", name.to_owned())
            .text("select", "false")
            .text("print", "false");

        self.post_multipart(url, form).await
    }

    /// Select a stored file and start printing it.
    ///
    /// `POST /api/files/local/{name}` with `{"command": "select", "print": true}`
    pub async fn select_and_print(&self, name: &str) -> Result<(), Error> {
        let url = self.file_url(LOCAL, name)?;
        debug!(name, "selecting file for print");
        self.post_command(url, &json!({ "command": "select", "print": true }))
            .await
    }

    /// Delete a stored file.
    ///
    /// `DELETE /api/files/local/{name}`
    pub async fn delete_file(&self, name: &str) -> Result<(), Error> {
        let url = self.file_url(LOCAL, name)?;
        debug!(name, "deleting file");
        self.delete(url).await
    }
}
