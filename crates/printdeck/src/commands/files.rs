//! File handlers: list, upload, print, delete.

use std::path::Path;

use bytes::Bytes;
use tabled::Tabled;

use printdeck_core::{FileEntry, Intent, Session};

use crate::cli::{FilesArgs, FilesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Uploaded")]
    date: String,
}

impl From<&FileEntry> for FileRow {
    fn from(f: &FileEntry) -> Self {
        Self {
            path: entry_path(f),
            size: output::size(f.size),
            date: output::timestamp(f.date),
        }
    }
}

fn entry_path(f: &FileEntry) -> String {
    f.path.clone().unwrap_or_else(|| f.name.clone())
}

/// Stored name for an upload: `--name`, else the local file name.
fn upload_name(path: &Path, name: Option<String>) -> Result<String, CliError> {
    if let Some(name) = name {
        return Ok(name);
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CliError::Validation {
            field: "path".into(),
            reason: format!("'{}' has no usable file name", path.display()),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: FilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FilesCommand::List => {
            let files = session.dispatcher().list_files().await?;
            let out = output::render_list(
                global.output(),
                &files,
                |f| FileRow::from(f),
                entry_path,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FilesCommand::Upload { path, name, print } => {
            let name = upload_name(&path, name)?;
            let contents = tokio::fs::read(&path).await?;

            let spinner = output::spinner(&format!("Uploading {name}..."), global.quiet);
            let result = session
                .execute(Intent::UploadFile {
                    name: name.clone(),
                    contents: Bytes::from(contents),
                })
                .await;
            spinner.finish_and_clear();
            result?;

            if print {
                session.execute(Intent::StartFile { name }).await?;
            }
            Ok(())
        }

        FilesCommand::Print { name } => {
            session.execute(Intent::StartFile { name }).await?;
            Ok(())
        }

        FilesCommand::Delete { name } => {
            if !util::confirm(&format!("Delete {name}?"), global.yes, "files delete")? {
                return Ok(());
            }
            session.execute(Intent::DeleteFile { name }).await?;
            Ok(())
        }
    }
}
