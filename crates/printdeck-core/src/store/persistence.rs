// ── Registry persistence ──
//
// (De)serializes the registry into two keys. Loading never fails: missing
// or corrupt data degrades to an empty registry. Saving never fails either;
// store errors are logged and the in-memory state stays authoritative.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::model::{DeviceProfile, ProfileId};
use crate::registry::RegistryState;

/// Key holding the JSON array of profile records.
pub const PROFILES_KEY: &str = "printers";
/// Key holding the bare active profile id. Absent when nothing is active.
pub const ACTIVE_KEY: &str = "activePrinterId";

#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted registry, exactly as stored apart from dropping
    /// unreadable or duplicate records. Invariant healing is the registry's job.
    pub fn load(&self) -> RegistryState {
        let profiles = self.load_profiles();
        let active_id = match self.store.get(ACTIVE_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => Some(ProfileId::from(id.trim())),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "failed to read active printer id, treating as none");
                None
            }
        };
        debug!(profiles = profiles.len(), active = ?active_id, "loaded registry");
        RegistryState {
            profiles,
            active_id,
        }
    }

    fn load_profiles(&self) -> Vec<DeviceProfile> {
        let raw = match self.store.get(PROFILES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read printer profiles, starting empty");
                return Vec::new();
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "stored printer profiles are corrupt, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<DeviceProfile>(record) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable printer profile");
                    None
                }
            })
            .filter(|profile| {
                let fresh = seen.insert(profile.id.clone());
                if !fresh {
                    warn!(id = %profile.id, "skipping duplicate printer profile id");
                }
                fresh
            })
            .collect()
    }

    /// Write the full snapshot. Failures are logged, never returned.
    pub fn save(&self, state: &RegistryState) {
        match serde_json::to_string(&state.profiles) {
            Ok(json) => {
                if let Err(e) = self.store.set(PROFILES_KEY, &json) {
                    warn!(error = %e, "failed to persist printer profiles");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize printer profiles"),
        }

        let result = match &state.active_id {
            Some(id) => self.store.set(ACTIVE_KEY, id.as_str()),
            None => self.store.remove(ACTIVE_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to persist active printer id");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::NewProfile;
    use crate::store::MemoryStore;

    fn profile(id: &str, name: &str) -> DeviceProfile {
        NewProfile::new(name, format!("http://{name}.local"), "key").into_profile(ProfileId::from(id))
    }

    #[test]
    fn round_trip_preserves_order_and_active() {
        let store = Arc::new(MemoryStore::new());
        let persistence = Persistence::new(store.clone());
        let state = RegistryState {
            profiles: vec![profile("b", "prusa"), profile("a", "ender")],
            active_id: Some(ProfileId::from("a")),
        };

        persistence.save(&state);
        assert_eq!(store.get(ACTIVE_KEY).unwrap().as_deref(), Some("a"));
        assert_eq!(persistence.load(), state);
    }

    #[test]
    fn clearing_active_removes_key() {
        let store = Arc::new(MemoryStore::with_entries([(ACTIVE_KEY, "a")]));
        let persistence = Persistence::new(store.clone());
        persistence.save(&RegistryState::default());
        assert_eq!(store.get(ACTIVE_KEY).unwrap(), None);
        assert_eq!(store.get(PROFILES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_profiles_degrade_to_empty() {
        let store = Arc::new(MemoryStore::with_entries([
            (PROFILES_KEY, "{not json"),
            (ACTIVE_KEY, "a"),
        ]));
        let state = Persistence::new(store).load();
        assert!(state.profiles.is_empty());
        assert_eq!(state.active_id, Some(ProfileId::from("a")));
    }

    #[test]
    fn bad_and_duplicate_records_are_skipped() {
        let raw = serde_json::json!([
            { "id": "a", "name": "Ender", "serverUrl": "http://e", "apiKey": "k" },
            { "id": "b", "name": "Missing key" },
            { "id": "a", "name": "Dup", "serverUrl": "http://d", "apiKey": "k" },
            { "id": "c", "name": "Prusa", "serverUrl": "http://p", "apiKey": "k", "color": "orange" }
        ]);
        let store = Arc::new(MemoryStore::with_entries([(PROFILES_KEY, raw.to_string())]));
        let state = Persistence::new(store).load();
        let names: Vec<&str> = state.profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ender", "Prusa"]);
        assert_eq!(state.profiles[1].color.as_deref(), Some("orange"));
    }
}
