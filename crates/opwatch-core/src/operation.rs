//! Operation model: the server-side snapshot and the reference used to find it
//!
//! Operations are created by API calls that answer with a `Location` header
//! pointing at `/apps/{app}/operations/{id}`. [`OperationRef`] captures the
//! owner and id from that URL; [`Operation`] is one status snapshot.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LOCATION};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, Result};

/// Reference to an operation owned by an app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRef {
    app: String,
    id: String,
    location: Url,
}

impl OperationRef {
    /// Parse an operation location URL, taking its last path segment as the id
    ///
    /// Trailing slashes are ignored. No request is made.
    pub fn parse(location: &str, app: &str) -> Result<Self> {
        let url = Url::parse(location).map_err(|source| CoreError::ReferenceParse {
            location: location.to_string(),
            source,
        })?;

        let missing_id = || CoreError::MissingOperationId {
            location: location.to_string(),
        };
        // Segments come back percent-encoded; the client encodes the id again
        let segment = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(missing_id)?;
        let id = urlencoding::decode(segment)
            .map_err(|_| missing_id())?
            .into_owned();

        Ok(Self {
            app: app.to_string(),
            id,
            location: url,
        })
    }

    /// Build a reference from the `Location` header of the response that started an operation
    pub fn from_headers(headers: &HeaderMap, app: &str) -> Result<Self> {
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(CoreError::MissingLocation)?;
        Self::parse(location, app)
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &Url {
        &self.location
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app, self.id)
    }
}

/// Status reported by the server
///
/// Only `done` and `error` are terminal. Values this client does not know
/// are kept verbatim in [`OperationStatus::Unknown`] and treated as still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationStatus {
    Pending,
    Done,
    Error,
    Unknown(String),
}

impl OperationStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Done | OperationStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Done => "done",
            OperationStatus::Error => "error",
            OperationStatus::Unknown(raw) => raw,
        }
    }
}

impl From<String> for OperationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => OperationStatus::Pending,
            "done" => OperationStatus::Done,
            "error" => OperationStatus::Error,
            _ => OperationStatus::Unknown(raw),
        }
    }
}

impl From<OperationStatus> for String {
    fn from(status: OperationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work an operation performs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    Scale,
    Start,
    Stop,
    Restart,
    /// Starting a one-off container; exposes an attach URL
    StartOneOff,
    #[default]
    Unspecified,
    Other(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Scale => "scale",
            OperationType::Start => "start",
            OperationType::Stop => "stop",
            OperationType::Restart => "restart",
            OperationType::StartOneOff => "start-one-off",
            OperationType::Unspecified => "",
            OperationType::Other(raw) => raw,
        }
    }
}

impl From<String> for OperationType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "scale" => OperationType::Scale,
            "start" => OperationType::Start,
            "stop" => OperationType::Stop,
            "restart" => OperationType::Restart,
            "start-one-off" => OperationType::StartOneOff,
            "" => OperationType::Unspecified,
            _ => OperationType::Other(raw),
        }
    }
}

impl From<OperationType> for String {
    fn from(op_type: OperationType) -> Self {
        op_type.as_str().to_string()
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra payload carried by `start-one-off` operations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartOneOffData {
    #[serde(default)]
    pub attach_url: String,
}

/// One snapshot of an operation as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    #[serde(rename = "type", default)]
    pub op_type: OperationType,
    pub status: OperationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_one_off_data: Option<StartOneOffData>,
}

impl Operation {
    /// Server-reported error detail; empty strings count as absent
    pub fn error_detail(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Attach URL of a one-off container, if the server provided one
    pub fn attach_url(&self) -> Option<&str> {
        self.start_one_off_data
            .as_ref()
            .map(|d| d.attach_url.as_str())
            .filter(|u| !u.is_empty())
    }

    /// Time the operation took, or has taken so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Utc::now())
    }

    /// Elapsed time relative to `now`
    ///
    /// Finished operations use `finished_at - created_at`. A missing or
    /// zero-valued `finished_at` falls back to `now`. Never negative.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        let end = match (&self.status, self.finished_at) {
            (OperationStatus::Done, Some(finished)) if finished >= self.created_at => finished,
            _ => now,
        };
        (end - self.created_at).to_std().unwrap_or_default()
    }
}
