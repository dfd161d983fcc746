// Device API HTTP client
//
// Wraps `reqwest::Client` with base-URL normalization, API-key injection,
// status checking, and JSON decoding. Endpoint groups (printer, job, files)
// are implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the device API key on every request.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Longest error body echoed back in [`Error::Api`] messages.
const MAX_ERROR_BODY: usize = 200;

/// Parse and normalize a device base address.
///
/// Only `http` and `https` are accepted. Trailing slashes are stripped so
/// that `http://10.0.0.5/` and `http://10.0.0.5` address the same API, and
/// any path prefix (e.g. a reverse-proxy mount point) is preserved.
pub fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidBaseUrl {
            url: raw.into(),
            reason: "address is empty".into(),
        });
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidBaseUrl {
                url: raw.into(),
                reason: format!("unsupported scheme '{other}' (expected http or https)"),
            });
        }
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidBaseUrl {
            url: raw.into(),
            reason: "missing host".into(),
        });
    }
    Ok(url)
}

/// Builds [`DeviceClient`]s that share one connection pool.
///
/// The engine resolves the active profile on every operation, so clients
/// are short-lived; the underlying `reqwest::Client` is not.
#[derive(Clone)]
pub struct DeviceConnector {
    http: reqwest::Client,
}

impl DeviceConnector {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// A client for one device address and key.
    pub fn connect(&self, base_url: &str, api_key: SecretString) -> Result<DeviceClient, Error> {
        DeviceClient::with_client(self.http.clone(), base_url, api_key)
    }
}

/// Raw HTTP client for one printer's API.
///
/// Every request carries the `X-Api-Key` header. Success responses are
/// decoded into the wire models in [`crate::models`]; everything else is
/// surfaced as an [`Error`] for the core to classify.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl DeviceClient {
    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Lets several device clients share one connection pool.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        api_key: SecretString,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            api_key,
        })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path such as `/api/job`.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// Build `{base}/api/files/{location}/{name}` with each path segment
    /// of `name` percent-encoded.
    pub(crate) fn file_url(&self, location: &str, name: &str) -> Result<Url, Error> {
        let mut url = self.endpoint(&format!("/api/files/{location}"))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "address cannot carry a path".into(),
            })?
            .extend(name.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        decode(check_status(resp).await?).await
    }

    /// Send a POST request with a JSON body, discarding any response body.
    ///
    /// Most device commands answer `204 No Content`.
    pub(crate) async fn post_command(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("POST {}", url);

        let resp = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp).await?;
        Ok(())
    }

    /// Send a multipart POST and decode the JSON body.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        debug!("POST (multipart) {}", url);

        let resp = self
            .request(reqwest::Method::POST, url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        decode(check_status(resp).await?).await
    }

    /// Send a DELETE request, discarding any response body.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);

        let resp = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp).await?;
        Ok(())
    }
}

/// Map non-success statuses into errors, passing successful responses through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::InvalidApiKey {
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    } else {
        body.trim().chars().take(MAX_ERROR_BODY).collect()
    };

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Decode a JSON body, keeping the raw text on failure.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slashes() {
        let url = normalize_base_url("http://10.0.0.5/").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/");
        let url = normalize_base_url("http://host/octoprint//").unwrap();
        assert_eq!(url.as_str(), "http://host/octoprint");
    }

    #[test]
    fn normalize_rejects_bad_addresses() {
        assert!(matches!(
            normalize_base_url("  "),
            Err(Error::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            normalize_base_url("ftp://printer"),
            Err(Error::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn endpoint_joins_under_path_prefix() {
        let client = DeviceClient::with_client(
            reqwest::Client::new(),
            "http://host/octoprint/",
            SecretString::from("k".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("/api/job").unwrap().as_str(),
            "http://host/octoprint/api/job"
        );
    }

    #[test]
    fn file_url_encodes_segments() {
        let client = DeviceClient::with_client(
            reqwest::Client::new(),
            "http://host",
            SecretString::from("k".to_string()),
        )
        .unwrap();
        let url = client.file_url("local", "parts/benchy v2.gcode").unwrap();
        assert_eq!(
            url.as_str(),
            "http://host/api/files/local/parts/benchy%20v2.gcode"
        );
    }
}
