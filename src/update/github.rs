use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::Value;

use super::error::UpdateError;
use super::store::version_field;
use super::version::Version;
use crate::models::RemoteDescriptor;

const USER_AGENT: &str = concat!("ota-update/", env!("CARGO_PKG_VERSION"));

/// Name of the descriptor file published next to the artifact
pub const DESCRIPTOR_FILE: &str = "version.json";

/// Network operations the updater depends on.
pub trait Remote {
    /// Cheap pre-flight check; any connection failure means `false`.
    fn is_reachable(&self) -> bool;

    fn fetch_descriptor(&self, url: &str) -> Result<RemoteDescriptor, UpdateError>;

    fn download(&self, url: &str) -> Result<Vec<u8>, UpdateError>;
}

/// Blocking HTTP(S) implementation of [`Remote`].
pub struct HttpRemote {
    client: Client,
    connectivity_url: String,
    connectivity_timeout: Duration,
}

impl HttpRemote {
    pub fn new(connectivity_url: impl Into<String>, connectivity_timeout: Duration, http_timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(http_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to default HTTP client configuration ({err})");
                Client::new()
            });

        Self {
            client,
            connectivity_url: connectivity_url.into(),
            connectivity_timeout,
        }
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, UpdateError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| UpdateError::network(url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::network(url, format!("HTTP {}", response.status())));
        }

        Ok(response)
    }
}

impl Remote for HttpRemote {
    fn is_reachable(&self) -> bool {
        debug!("HEAD {}", self.connectivity_url);
        // Any HTTP answer proves the network is up, whatever its status
        match self
            .client
            .head(&self.connectivity_url)
            .timeout(self.connectivity_timeout)
            .send()
        {
            Ok(_) => true,
            Err(e) => {
                debug!("connectivity check failed: {}", e);
                false
            }
        }
    }

    fn fetch_descriptor(&self, url: &str) -> Result<RemoteDescriptor, UpdateError> {
        let body = self
            .get(url)?
            .text()
            .map_err(|e| UpdateError::network(url, e))?;
        parse_descriptor(&body)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|e| UpdateError::network(url, e))?;
        debug!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Parse a remote `version.json` body.
pub fn parse_descriptor(body: &str) -> Result<RemoteDescriptor, UpdateError> {
    let data: Value =
        serde_json::from_str(body).map_err(|e| UpdateError::Format(format!("not valid JSON ({e})")))?;

    let raw = version_field(&data)
        .ok_or_else(|| UpdateError::Format("missing 'version' key".to_string()))?;
    let version = Version::parse(&raw).map_err(|e| UpdateError::Format(e.to_string()))?;

    // Only an absent key means "unverified"; anything else must be a real digest
    let sha256_checksum = match data.get("sha256_checksum") {
        None => None,
        Some(Value::String(s)) if is_sha256_hex(s.trim()) => Some(s.trim().to_string()),
        Some(other) => {
            return Err(UpdateError::Format(format!(
                "'sha256_checksum' is not a SHA-256 hex digest: {}",
                other
            )))
        }
    };

    Ok(RemoteDescriptor {
        version,
        sha256_checksum,
    })
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Turn a repository page URL into its raw-content base.
///
/// `https://github.com/owner/repo` becomes
/// `https://raw.githubusercontent.com/owner/repo`. Other hosts pass through.
pub fn raw_base_url(repo_url: &str) -> String {
    let url = repo_url.trim().trim_end_matches('/');

    let rewritten = url.split_once("://").and_then(|(scheme, rest)| {
        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        let is_github =
            host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("www.github.com");
        is_github.then(|| {
            format!(
                "{}://raw.githubusercontent.com/{}",
                scheme,
                path.replace("/blob/", "/")
            )
        })
    });

    let url = rewritten.as_deref().unwrap_or(url);
    url.trim_end_matches('/').trim_end_matches(".git").to_string()
}

/// Descriptor and artifact URLs for one target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub descriptor_url: String,
    pub artifact_url: String,
}

impl Endpoints {
    pub fn new(repo_url: &str, branch: &str, filename: &str) -> Self {
        let base = raw_base_url(repo_url);
        Self {
            descriptor_url: format!("{}/{}/{}", base, branch, DESCRIPTOR_FILE),
            artifact_url: format!("{}/{}/{}", base, branch, filename),
        }
    }
}
