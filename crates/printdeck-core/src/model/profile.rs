// ── Device profiles ──
//
// A profile is everything needed to reach one printer. Profiles are owned
// by the registry; everything else works on clones.

use std::fmt;

use printdeck_api::{DeviceClient, DeviceConnector, normalize_base_url};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque profile identifier (UUID v4 string), immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProfileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A registered printer.
///
/// Serialized with the camelCase field names of the persisted
/// `printers` record: `id`, `name`, `serverUrl`, `apiKey`, `color`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub id: ProfileId,
    pub name: String,
    pub server_url: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DeviceProfile {
    /// A client addressed at this printer.
    pub fn connect(&self, connector: &DeviceConnector) -> Result<DeviceClient, CoreError> {
        let key = SecretString::from(self.api_key.clone());
        Ok(connector.connect(&self.server_url, key)?)
    }
}

impl fmt::Debug for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("server_url", &self.server_url)
            .field("api_key", &"[REDACTED]")
            .field("color", &self.color)
            .finish()
    }
}

/// Profile data supplied by the operator, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    pub server_url: String,
    pub api_key: String,
    pub color: Option<String>,
}

impl NewProfile {
    pub fn new(
        name: impl Into<String>,
        server_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            server_url: server_url.into(),
            api_key: api_key.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        validate_name(&self.name)?;
        validate_server_url(&self.server_url)?;
        validate_api_key(&self.api_key)
    }

    pub(crate) fn into_profile(self, id: ProfileId) -> DeviceProfile {
        DeviceProfile {
            id,
            name: self.name.trim().to_owned(),
            server_url: self.server_url.trim().to_owned(),
            api_key: self.api_key.trim().to_owned(),
            color: self.color,
        }
    }
}

/// Partial update for an existing profile. `None` leaves a field unchanged;
/// `color: Some(None)` clears the color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub color: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.server_url.is_none()
            && self.api_key.is_none()
            && self.color.is_none()
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(url) = &self.server_url {
            validate_server_url(url)?;
        }
        if let Some(key) = &self.api_key {
            validate_api_key(key)?;
        }
        Ok(())
    }

    /// Merge into `profile`, returning whether anything changed.
    pub(crate) fn apply(&self, profile: &mut DeviceProfile) -> bool {
        let before = profile.clone();
        if let Some(name) = &self.name {
            name.trim().clone_into(&mut profile.name);
        }
        if let Some(url) = &self.server_url {
            url.trim().clone_into(&mut profile.server_url);
        }
        if let Some(key) = &self.api_key {
            key.trim().clone_into(&mut profile.api_key);
        }
        if let Some(color) = &self.color {
            profile.color.clone_from(color);
        }
        *profile != before
    }
}

// ── Field validation ─────────────────────────────────────────────────

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    Ok(())
}

fn validate_server_url(url: &str) -> Result<(), CoreError> {
    normalize_base_url(url)
        .map(|_| ())
        .map_err(|e| CoreError::validation("server URL", e.to_string()))
}

fn validate_api_key(key: &str) -> Result<(), CoreError> {
    if key.trim().is_empty() {
        return Err(CoreError::validation("API key", "must not be empty"));
    }
    Ok(())
}
