//! Typed blocking client for a REST content-distribution API (projects,
//! versions, users).
//!
//! # Overview
//! `RinthClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network. A `Transport` executes the
//! round-trip, and the `Rinth` façade composes the two into typed operations.
//!
//! # Design
//! - PATCH bodies come from `update::diff_against_zero`, which keeps only the
//!   fields that differ from the record type's zero value.
//! - Create requests are `multipart/form-data` with a fixed `data` JSON field
//!   plus caller-supplied attachments.
//! - Transport failures and HTTP statuses are distinct `ApiError` variants.
//! - The caller's credential is sent verbatim as `Authorization` and kept on
//!   fetched records for chained calls; it is never serialized.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod search;
pub mod transport;
pub mod types;
pub mod update;

pub use api::Rinth;
pub use client::RinthClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{encode_multipart, Attachment, MultipartBody};
pub use search::{Facet, FacetOperation, SearchIndex, SearchQuery, SearchResponse, SearchResult};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Badges, Dependency, DependencyType, DonationUrl, FileHashes, FileType, GalleryImage, Icon,
    License, PayoutData, Project, ProjectStatus, ProjectType, RequestedStatus, Support, User,
    UserRole, Version, VersionFile, VersionStatus, VersionType,
};
pub use update::{apply_to_zero, diff_against_zero, Record};
