// ── Domain model ──

mod profile;
mod status;

pub use profile::{DeviceProfile, NewProfile, ProfileId, ProfilePatch};
pub use status::LiveStatus;
