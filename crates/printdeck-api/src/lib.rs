// printdeck-api: Async Rust client for OctoPrint-compatible printer APIs

pub mod client;
pub mod error;
pub mod files;
pub mod job;
pub mod models;
pub mod printer;
pub mod transport;

pub use client::{API_KEY_HEADER, DeviceClient, DeviceConnector, normalize_base_url};
pub use error::Error;
pub use models::{
    FileEntry, FileListing, JobFile, JobInfo, JobProgress, JobStatus, PrinterFlags, PrinterState,
    PrinterStatus, TemperatureReading, Temperatures, UploadResponse, VersionInfo,
};
pub use transport::{TlsMode, TransportConfig};
