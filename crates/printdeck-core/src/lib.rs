// printdeck-core: Printer session engine between printdeck-api and consumers.

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod model;
pub mod notify;
pub mod poller;
pub mod registry;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{FailureKind, classify};
pub use dispatcher::{Axis, Dispatcher, Heater, Intent, MAX_TEMPERATURE};
pub use error::CoreError;
pub use model::{DeviceProfile, LiveStatus, NewProfile, ProfileId, ProfilePatch};
pub use notify::{ChannelNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use poller::{DEFAULT_POLL_INTERVAL, PollState, StatusPoller};
pub use registry::{Registry, RegistryState};
pub use session::{Session, SessionConfig};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use stream::StatusStream;

// Wire types consumers render directly.
pub use printdeck_api::{
    FileEntry, JobStatus, PrinterStatus, TemperatureReading, TlsMode, TransportConfig, VersionInfo,
};
