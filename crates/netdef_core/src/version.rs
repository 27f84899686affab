//! Background check of the tool version against a remote service.
//!
//! Requests are handed to a worker thread over a channel; results come back
//! on a second channel and are drained with [`VersionChecker::poll`], which
//! never blocks. The compiler never waits on the checker.

use crate::error::VersionCheckError;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionCheckResult {
    pub state: CheckState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_latest: bool,
    #[serde(default)]
    pub required_network_version: String,
    #[serde(default)]
    pub addon_version: String,
}

impl VersionCheckResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            state: CheckState::Failure,
            message: message.into(),
            is_latest: false,
            required_network_version: String::new(),
            addon_version: String::new(),
        }
    }
}

/// What the remote service reports for a given local version.
#[derive(Debug, Deserialize)]
struct RemoteVersion {
    is_latest: bool,
    required_network_version: String,
    addon_version: String,
}

/// Where version information comes from.
pub trait VersionSource: Send + 'static {
    fn fetch(&self, url: &str, local_version: &str) -> Result<VersionCheckResult, VersionCheckError>;
}

/// Queries the version service over HTTP.
pub struct HttpVersionSource {
    agent: ureq::Agent,
}

impl HttpVersionSource {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl VersionSource for HttpVersionSource {
    fn fetch(&self, url: &str, local_version: &str) -> Result<VersionCheckResult, VersionCheckError> {
        let response = self
            .agent
            .get(url)
            .query("version", local_version)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => VersionCheckError::Request(format!("HTTP {}", code)),
                other => VersionCheckError::Request(other.to_string()),
            })?;

        let remote: RemoteVersion = response
            .into_json()
            .map_err(|e| VersionCheckError::InvalidResponse(e.to_string()))?;

        Ok(VersionCheckResult {
            state: CheckState::Success,
            message: String::new(),
            is_latest: remote.is_latest,
            required_network_version: remote.required_network_version,
            addon_version: remote.addon_version,
        })
    }
}

struct VersionRequest {
    url: String,
    local_version: String,
}

/// Runs version checks on a worker thread.
///
/// Each request yields exactly one result. Dropping the checker closes the
/// request channel and the worker exits after any check in flight.
pub struct VersionChecker {
    requests: Sender<VersionRequest>,
    results: Receiver<VersionCheckResult>,
}

impl VersionChecker {
    pub fn new<S: VersionSource>(source: S) -> Self {
        let (request_tx, request_rx) = channel::unbounded::<VersionRequest>();
        let (result_tx, result_rx) = channel::unbounded();

        thread::spawn(move || {
            for request in request_rx.iter() {
                debug!("Checking version {} against {}", request.local_version, request.url);

                let result = source
                    .fetch(&request.url, &request.local_version)
                    .unwrap_or_else(|e| {
                        warn!("⚠️ Version check failed: {}", e);
                        VersionCheckResult::failure(e.to_string())
                    });

                if result_tx.send(result).is_err() {
                    break;
                }
            }
            debug!("Version check worker stopped");
        });

        Self {
            requests: request_tx,
            results: result_rx,
        }
    }

    /// Queues a check. Returns false if the worker is gone.
    pub fn check_version(&self, url: &str, local_version: &str) -> bool {
        self.requests
            .send(VersionRequest {
                url: url.to_string(),
                local_version: local_version.to_string(),
            })
            .is_ok()
    }

    /// Results that arrived since the last poll (non-blocking).
    pub fn poll(&self) -> Vec<VersionCheckResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.results.try_recv() {
            results.push(result);
        }
        results
    }

    /// Waits up to `timeout` for the next result.
    pub fn wait(&self, timeout: Duration) -> Option<VersionCheckResult> {
        match self.results.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionVerdict {
    UpToDate,
    /// The local install is out of date; `url` explains the mismatch.
    Mismatch { url: String },
    Failed { message: String },
}

/// Decides what a check result means for the local install.
pub fn evaluate(result: &VersionCheckResult, local_network_version: &str, mismatch_url: &str) -> VersionVerdict {
    if result.state != CheckState::Success {
        return VersionVerdict::Failed {
            message: format!("Update check failed: {}", result.message),
        };
    }

    let local = local_network_version.trim();
    if result.is_latest && local == result.required_network_version.trim() {
        info!("✅ Version {} is up to date", result.addon_version);
        return VersionVerdict::UpToDate;
    }

    let url = format!(
        "{}?bge_version={}&network_version={}",
        mismatch_url,
        urlencoding::encode(&result.addon_version),
        urlencoding::encode(local)
    );
    warn!("⚠️ Version mismatch, see {}", url);
    VersionVerdict::Mismatch { url }
}

/// Reads a `version.txt` style file.
pub fn read_version_file(path: impl AsRef<Path>) -> Result<String, VersionCheckError> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map(|contents| contents.trim().to_string())
        .map_err(|source| VersionCheckError::VersionFile {
            path: path.to_path_buf(),
            source,
        })
}
