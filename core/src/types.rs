//! Domain records for the API.
//!
//! # Design
//! Every record derives `Default`, which is the zero value the selective
//! update diffs against. Optional fields are `Option` so that "absent"
//! serializes to `null` and never reaches a PATCH body. Nested objects on
//! records are optional for the same reason: the zero of every record diffs
//! to an empty mapping.
//!
//! The caller's credential and a project's icon bytes travel with the record
//! but are never serialized.

use serde::{Deserialize, Serialize};

use crate::update::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Support {
    Required,
    Optional,
    Unsupported,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Approved,
    Archived,
    Rejected,
    Draft,
    Unlisted,
    Processing,
    Withheld,
    Scheduled,
    Private,
    Unknown,
}

/// Status requested when submitting a project for review or scheduling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedStatus {
    Approved,
    Archived,
    Unlisted,
    Private,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Mod,
    Modpack,
    Resourcepack,
    Shader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    Release,
    Beta,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Listed,
    Archived,
    Draft,
    Unlisted,
    Scheduled,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    #[default]
    Required,
    Optional,
    Incompatible,
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    RequiredResourcePack,
    OptionalResourcePack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Moderator,
    Developer,
}

/// Bit set of user badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Badges(pub u32);

impl Badges {
    pub const EARLY_MODPACK_ADOPTER: u32 = 1 << 1;
    pub const EARLY_RESPACK_ADOPTER: u32 = 1 << 2;
    pub const EARLY_PLUGIN_ADOPTER: u32 = 1 << 3;
    pub const ALPHA_TESTER: u32 = 1 << 4;
    pub const CONTRIBUTOR: u32 = 1 << 5;
    pub const TRANSLATOR: u32 = 1 << 6;

    pub fn contains(self, badge: u32) -> bool {
        self.0 & badge != 0
    }
}

/// The license of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
    /// SPDX identifier.
    pub id: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationUrl {
    pub id: String,
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryImage {
    pub url: String,
    pub featured: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created: String,
    /// Gallery images sort by this, then by title.
    pub ordering: i64,
}

/// Image data for a project's icon. Uploaded separately from the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    /// File extension, e.g. `png`. Also names the content type.
    pub ext: String,
    pub data: Vec<u8>,
}

impl Icon {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            ext: "png".to_string(),
            data,
        }
    }

    pub fn content_type(&self) -> String {
        format!("image/{}", self.ext)
    }
}

/// A project. `Option` fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Vanity URL slug.
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub client_side: Option<Support>,
    pub server_side: Option<Support>,
    /// Long form description.
    pub body: String,
    pub status: Option<ProjectStatus>,
    pub requested_status: Option<RequestedStatus>,
    pub additional_categories: Vec<String>,
    pub issues_url: Option<String>,
    pub source_url: Option<String>,
    pub wiki_url: Option<String>,
    pub discord_url: Option<String>,
    pub donation_urls: Vec<DonationUrl>,
    pub project_type: Option<ProjectType>,
    pub downloads: u64,
    pub icon_url: Option<String>,
    /// RGB colour derived from the icon by the server.
    pub color: Option<u32>,
    /// Base62 id.
    pub id: String,
    pub team: String,
    pub published: String,
    pub updated: String,
    pub approved: Option<String>,
    pub queued: Option<String>,
    pub followers: u64,
    pub license: Option<License>,
    pub versions: Vec<String>,
    pub game_versions: Vec<String>,
    pub loaders: Vec<String>,
    pub gallery: Vec<GalleryImage>,
    #[serde(skip)]
    pub icon: Option<Icon>,
    /// Sent as `Authorization` by every call made on behalf of this project.
    /// Set by `get_project`, or by the caller for a project built locally.
    #[serde(skip)]
    pub credential: Option<String>,
}

impl Project {
    /// The credential this project was fetched with, reused by chained calls.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn with_credential(mut self, credential: &str) -> Self {
        self.credential = Some(credential.to_string());
        self
    }

    /// Slug when known, id otherwise. Both address the project on the API.
    pub fn handle(&self) -> &str {
        if self.slug.is_empty() {
            &self.id
        } else {
            &self.slug
        }
    }
}

impl Record for Project {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    pub version_id: Option<String>,
    pub project_id: Option<String>,
    /// Set for embedded dependencies only.
    pub file_name: Option<String>,
    pub dependency_type: DependencyType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHashes {
    pub sha512: String,
    pub sha1: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionFile {
    pub hashes: FileHashes,
    pub url: String,
    pub filename: String,
    pub primary: bool,
    pub size: u64,
    pub file_type: Option<FileType>,
}

/// One version of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub name: String,
    /// Ideally a semantic version.
    pub version_number: String,
    pub changelog: Option<String>,
    pub dependencies: Vec<Dependency>,
    pub game_versions: Vec<String>,
    pub version_type: Option<VersionType>,
    pub loaders: Vec<String>,
    pub featured: bool,
    pub status: Option<VersionStatus>,
    pub requested_status: Option<VersionStatus>,
    pub id: String,
    pub project_id: String,
    pub author_id: String,
    pub date_published: String,
    pub downloads: u64,
    pub files: Vec<VersionFile>,
    /// Local paths uploaded as file parts when the version is created.
    pub file_parts: Vec<String>,
}

impl Record for Version {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutData {
    pub balance: f64,
    pub payout_wallet: Option<String>,
    pub payout_wallet_type: Option<String>,
    pub payout_address: Option<String>,
}

/// A user. Fields documented as private are only present on your own account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub name: Option<String>,
    /// Private.
    pub email: Option<String>,
    pub bio: Option<String>,
    /// Private.
    pub payout_data: Option<PayoutData>,
    pub id: String,
    pub avatar_url: String,
    pub created: String,
    pub role: Option<UserRole>,
    pub badges: Badges,
    /// Private.
    pub auth_providers: Option<Vec<String>>,
    pub email_verified: Option<bool>,
    pub has_password: Option<bool>,
    pub has_totp: Option<bool>,
    #[serde(skip)]
    pub credential: Option<String>,
}

impl User {
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn with_credential(mut self, credential: &str) -> Self {
        self.credential = Some(credential.to_string());
        self
    }
}

impl Record for User {}
