// ── Device registry ──
//
// In-memory source of truth for printer profiles and the active selection.
// All mutations run inside `watch::Sender::send_if_modified`, which holds
// the channel's write lock for the duration of the closure: mutations are
// serialized, and each one is persisted before subscribers see it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{DeviceProfile, NewProfile, ProfileId, ProfilePatch};
use crate::store::{KeyValueStore, MemoryStore, Persistence};

/// Snapshot of every profile plus the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    /// Insertion order, unique ids.
    pub profiles: Vec<DeviceProfile>,
    pub active_id: Option<ProfileId>,
}

impl RegistryState {
    pub fn get(&self, id: &ProfileId) -> Option<&DeviceProfile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    /// The active profile, or `None` when unset or dangling.
    pub fn active(&self) -> Option<&DeviceProfile> {
        self.active_id.as_ref().and_then(|id| self.get(id))
    }

    /// Restore the selection invariants, returning whether anything changed:
    /// a dangling id is dropped, and an empty selection over a non-empty
    /// registry picks the first profile.
    fn heal(&mut self) -> bool {
        let before = self.active_id.clone();
        if self.active().is_none() {
            self.active_id = self.profiles.first().map(|p| p.id.clone());
        }
        self.active_id != before
    }

    fn position(&self, id: &ProfileId) -> Result<usize, CoreError> {
        self.profiles
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CoreError::UnknownProfileId { id: id.to_string() })
    }
}

/// Owner of printer profiles and the active selection.
///
/// Cheaply cloneable; clones share state. Each registry is independent, so
/// several sessions can coexist in one process.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    state: watch::Sender<RegistryState>,
    persistence: Persistence,
}

impl Registry {
    /// Load the registry from `store`, healing the selection invariants.
    /// A healed selection is written back immediately.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let persistence = Persistence::new(store);
        let mut state = persistence.load();
        if state.heal() {
            debug!(active = ?state.active_id, "healed active printer selection on load");
            persistence.save(&state);
        }
        let (state, _) = watch::channel(state);
        Self {
            inner: Arc::new(RegistryInner { state, persistence }),
        }
    }

    /// A registry backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()))
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Ordered snapshot of all profiles.
    pub fn list(&self) -> Vec<DeviceProfile> {
        self.inner.state.borrow().profiles.clone()
    }

    pub fn get(&self, id: &ProfileId) -> Option<DeviceProfile> {
        self.inner.state.borrow().get(id).cloned()
    }

    pub fn active(&self) -> Option<DeviceProfile> {
        self.inner.state.borrow().active().cloned()
    }

    pub fn active_id(&self) -> Option<ProfileId> {
        self.inner.state.borrow().active().map(|p| p.id.clone())
    }

    pub fn snapshot(&self) -> RegistryState {
        self.inner.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().profiles.is_empty()
    }

    /// Receive a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<RegistryState> {
        self.inner.state.subscribe()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a printer and make it active. Duplicate names are allowed.
    pub fn add(&self, profile: NewProfile) -> Result<ProfileId, CoreError> {
        profile.validate()?;
        let id = ProfileId::generate();
        let profile = profile.into_profile(id.clone());
        info!(id = %id, name = %profile.name, "adding printer");

        self.mutate(|state| {
            state.profiles.push(profile);
            state.active_id = Some(id.clone());
            Ok(true)
        })?;
        Ok(id)
    }

    /// Merge `patch` into an existing profile and return the result.
    pub fn update(&self, id: &ProfileId, patch: &ProfilePatch) -> Result<DeviceProfile, CoreError> {
        patch.validate()?;
        let mut updated = None;
        self.mutate(|state| {
            let idx = state.position(id)?;
            let changed = patch.apply(&mut state.profiles[idx]);
            updated = Some(state.profiles[idx].clone());
            Ok(changed)
        })?;
        updated.ok_or_else(|| CoreError::UnknownProfileId { id: id.to_string() })
    }

    /// Delete a profile. Removing the active profile selects the first
    /// remaining one, or nothing.
    pub fn remove(&self, id: &ProfileId) -> Result<DeviceProfile, CoreError> {
        let mut removed = None;
        self.mutate(|state| {
            let idx = state.position(id)?;
            removed = Some(state.profiles.remove(idx));
            if state.active_id.as_ref() == Some(id) {
                state.active_id = None;
            }
            state.heal();
            Ok(true)
        })?;
        let removed = removed.ok_or_else(|| CoreError::UnknownProfileId { id: id.to_string() })?;
        info!(id = %id, name = %removed.name, "removed printer");
        Ok(removed)
    }

    /// Select the active printer.
    pub fn set_active(&self, id: &ProfileId) -> Result<(), CoreError> {
        self.mutate(|state| {
            state.position(id)?;
            if state.active_id.as_ref() == Some(id) {
                return Ok(false);
            }
            state.active_id = Some(id.clone());
            Ok(true)
        })?;
        info!(id = %id, "active printer selected");
        Ok(())
    }

    /// Run `f` under the channel lock. When it reports a change, persist
    /// the new state and notify subscribers. An error leaves state untouched
    /// because `f` only mutates after its checks pass.
    fn mutate<F>(&self, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut RegistryState) -> Result<bool, CoreError>,
    {
        let mut outcome = Ok(());
        let persistence = &self.inner.persistence;
        self.inner.state.send_if_modified(|state| match f(state) {
            Ok(true) => {
                persistence.save(state);
                true
            }
            Ok(false) => false,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::{ACTIVE_KEY, PROFILES_KEY};

    fn printer(name: &str) -> NewProfile {
        NewProfile::new(name, format!("http://{}.local", name.to_lowercase()), "key")
    }

    fn names(registry: &Registry) -> Vec<String> {
        registry.list().into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn add_selects_new_profile() {
        let registry = Registry::in_memory();
        let ender = registry.add(printer("Ender")).unwrap();
        assert_eq!(registry.active_id(), Some(ender));
        let prusa = registry.add(printer("Prusa")).unwrap();
        assert_eq!(registry.active_id(), Some(prusa));
        assert_eq!(names(&registry), ["Ender", "Prusa"]);
    }

    #[test]
    fn add_rejects_invalid_input_without_mutation() {
        let registry = Registry::in_memory();
        let err = registry
            .add(NewProfile::new("", "http://x.local", "k"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(registry.is_empty());
        assert_eq!(registry.active_id(), None);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let registry = Registry::in_memory();
        let a = registry.add(printer("Ender")).unwrap();
        let b = registry.add(printer("Ender")).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ender_prusa_scenario() {
        let registry = Registry::in_memory();
        let ender = registry.add(printer("Ender")).unwrap();
        let prusa = registry.add(printer("Prusa")).unwrap();
        assert_eq!(registry.active().unwrap().name, "Prusa");

        registry.remove(&ender).unwrap();
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.active_id(), Some(prusa.clone()));
        assert_eq!(registry.active().unwrap().name, "Prusa");

        registry.remove(&prusa).unwrap();
        assert_eq!(registry.active_id(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn removing_active_selects_first_remaining() {
        let registry = Registry::in_memory();
        let a = registry.add(printer("A")).unwrap();
        registry.add(printer("B")).unwrap();
        let c = registry.add(printer("C")).unwrap();

        registry.remove(&c).unwrap();
        assert_eq!(registry.active_id(), Some(a));
    }

    #[test]
    fn removing_inactive_keeps_selection() {
        let registry = Registry::in_memory();
        let a = registry.add(printer("A")).unwrap();
        let b = registry.add(printer("B")).unwrap();
        registry.remove(&a).unwrap();
        assert_eq!(registry.active_id(), Some(b));
    }

    #[test]
    fn unknown_ids_leave_state_unchanged() {
        let registry = Registry::in_memory();
        registry.add(printer("A")).unwrap();
        let before = registry.snapshot();
        let ghost = ProfileId::from("ghost");

        assert!(matches!(
            registry.set_active(&ghost),
            Err(CoreError::UnknownProfileId { .. })
        ));
        assert!(matches!(
            registry.remove(&ghost),
            Err(CoreError::UnknownProfileId { .. })
        ));
        assert!(matches!(
            registry.update(&ghost, &ProfilePatch::default()),
            Err(CoreError::UnknownProfileId { .. })
        ));
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn empty_update_leaves_fields_unchanged() {
        let registry = Registry::in_memory();
        let id = registry.add(printer("A").with_color("teal")).unwrap();
        let before = registry.get(&id).unwrap();
        let after = registry.update(&id, &ProfilePatch::default()).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn update_merges_fields() {
        let registry = Registry::in_memory();
        let id = registry.add(printer("A")).unwrap();
        let patch = ProfilePatch {
            name: Some("Voron".into()),
            server_url: Some("https://voron.lan/".into()),
            ..ProfilePatch::default()
        };
        let updated = registry.update(&id, &patch).unwrap();
        assert_eq!(updated.name, "Voron");
        assert_eq!(updated.server_url, "https://voron.lan/");
        assert_eq!(updated.api_key, "key");
    }

    #[test]
    fn mutations_persist_synchronously() {
        let store = Arc::new(MemoryStore::new());
        let registry = Registry::open(store.clone());
        let a = registry.add(printer("A")).unwrap();
        let b = registry.add(printer("B")).unwrap();
        registry.set_active(&a).unwrap();

        let reopened = Registry::open(store.clone());
        assert_eq!(reopened.snapshot(), registry.snapshot());

        registry.remove(&a).unwrap();
        assert_eq!(store.get(ACTIVE_KEY).unwrap(), Some(b.to_string()));
        registry.remove(&b).unwrap();
        assert_eq!(store.get(ACTIVE_KEY).unwrap(), None);
        assert_eq!(store.get(PROFILES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn open_heals_missing_and_dangling_selection() {
        let raw = serde_json::json!([
            { "id": "a", "name": "A", "serverUrl": "http://a", "apiKey": "k" },
            { "id": "b", "name": "B", "serverUrl": "http://b", "apiKey": "k" }
        ])
        .to_string();

        let store = Arc::new(MemoryStore::with_entries([(PROFILES_KEY, raw.clone())]));
        let registry = Registry::open(store.clone());
        assert_eq!(registry.active_id(), Some(ProfileId::from("a")));
        assert_eq!(store.get(ACTIVE_KEY).unwrap().as_deref(), Some("a"));

        let store = Arc::new(MemoryStore::with_entries([
            (PROFILES_KEY, raw),
            (ACTIVE_KEY, "deleted-elsewhere".to_owned()),
        ]));
        let registry = Registry::open(store);
        assert_eq!(registry.active_id(), Some(ProfileId::from("a")));
    }

    #[test]
    fn subscribers_see_each_mutation() {
        let registry = Registry::in_memory();
        let mut rx = registry.subscribe();
        let id = registry.add(printer("A")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().active_id, Some(id.clone()));

        // Re-selecting the active printer is not a change.
        registry.set_active(&id).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    fn pick(ids: &[ProfileId], r: u64) -> Option<&ProfileId> {
        let len = u64::try_from(ids.len()).ok().filter(|&n| n > 0)?;
        ids.get(usize::try_from(r % len).ok()?)
    }

    /// Deterministic pseudo-random op sequences; the selection invariant
    /// must hold after every step.
    #[test]
    fn selection_invariant_holds_for_op_sequences() {
        let mut seed: u64 = 0x5eed_1234_abcd_0001;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..50 {
            let registry = Registry::in_memory();
            for step in 0..40 {
                let ids: Vec<ProfileId> = registry.list().into_iter().map(|p| p.id).collect();
                match next() % 3 {
                    0 => {
                        registry.add(printer(&format!("P{step}"))).unwrap();
                    }
                    1 => {
                        if let Some(id) = pick(&ids, next()) {
                            registry.remove(id).unwrap();
                        }
                    }
                    _ => {
                        if let Some(id) = pick(&ids, next()) {
                            registry.set_active(id).unwrap();
                            assert_eq!(registry.active_id().as_ref(), Some(id));
                        }
                    }
                }

                let state = registry.snapshot();
                if state.profiles.is_empty() {
                    assert_eq!(state.active_id, None);
                } else {
                    assert!(state.active().is_some(), "dangling selection: {state:?}");
                }
            }
        }
    }
}
