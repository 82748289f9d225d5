//! Error types for the API client.
//!
//! # Design
//! A failure to obtain a status code at all is a `TransportError`; every
//! status code the server actually returned, 5xx included, is interpreted by
//! the façade into one of the status variants of `ApiError`. The two never
//! overlap, so callers can tell "the server said no" from "we never reached
//! the server".

use std::io;

use thiserror::Error;

use crate::http::HttpMethod;

/// Network-level failure before a status code was obtained: DNS, connection
/// refusal, timeout, or a body that could not be read to the end.
#[derive(Debug, Error)]
#[error("{method} {url} failed: {source}")]
pub struct TransportError {
    pub method: HttpMethod,
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl TransportError {
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Errors returned by the client and the façade.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 404 for the named resource.
    #[error("{kind} {id:?} wasn't found or no authorization to see it")]
    NotFound { kind: &'static str, id: String },

    /// The server returned 401. `error` and `description` are taken from the
    /// body when the server sent them, and are empty otherwise.
    #[error("unauthorized{}", unauthorized_detail(error, description))]
    Unauthorized { error: String, description: String },

    /// The server returned 400.
    #[error("invalid request: {body}")]
    InvalidRequest { body: String },

    /// Any other status outside the operation's success set.
    #[error("unexpected status code {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("project {project:?} has no versions")]
    NoVersions { project: String },

    #[error("cannot find version {version_number} of project {project:?}")]
    VersionNotFound {
        project: String,
        version_number: String,
    },

    #[error("dependency names neither a version nor a project")]
    InvalidDependency,

    /// An attachment could not be opened or copied into a multipart body.
    #[error("attachment {name:?} could not be read")]
    Attachment {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// The status code the server answered with, if one was obtained.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::InvalidRequest { .. } => Some(400),
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// `": error: description"`, skipping the parts the server left empty.
fn unauthorized_detail(error: &str, description: &str) -> String {
    [error, description]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| format!(": {part}"))
        .collect()
}
