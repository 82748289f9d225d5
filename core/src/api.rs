//! Typed operations over a `Transport`.
//!
//! `Rinth` pairs a `RinthClient` with a transport and runs
//! build → execute → parse for each call. It returns on the first error and
//! never retries.

use crate::client::RinthClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::search::{SearchQuery, SearchResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Dependency, Project, User, Version};

pub struct Rinth<T: Transport = UreqTransport> {
    client: RinthClient,
    transport: T,
}

impl Rinth<UreqTransport> {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new(config))
    }
}

impl Default for Rinth<UreqTransport> {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl<T: Transport> Rinth<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        Self {
            client: RinthClient::from_config(config),
            transport,
        }
    }

    pub fn client(&self) -> &RinthClient {
        &self.client
    }

    /// Fetches a project by id or slug. The returned project keeps
    /// `credential` for chained calls such as `get_versions`.
    pub fn get_project(&self, id_or_slug: &str, credential: &str) -> Result<Project> {
        let response = self
            .transport
            .execute(self.client.build_get_project(id_or_slug, credential))?;
        self.client.parse_get_project(response, id_or_slug, credential)
    }

    pub fn get_versions(&self, project: &Project) -> Result<Vec<Version>> {
        let response = self
            .transport
            .execute(self.client.build_get_versions(project))?;
        self.client.parse_get_versions(response, project)
    }

    /// The most recently created version, which the API lists first.
    pub fn get_latest_version(&self, project: &Project) -> Result<Version> {
        self.get_versions(project)?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NoVersions {
                project: project.handle().to_string(),
            })
    }

    pub fn get_specific_version(&self, project: &Project, version_number: &str) -> Result<Version> {
        self.get_versions(project)?
            .into_iter()
            .find(|v| v.version_number == version_number)
            .ok_or_else(|| ApiError::VersionNotFound {
                project: project.handle().to_string(),
                version_number: version_number.to_string(),
            })
    }

    pub fn get_version(&self, version_id: &str, credential: &str) -> Result<Version> {
        let response = self
            .transport
            .execute(self.client.build_get_version(version_id, credential))?;
        self.client.parse_get_version(response, version_id)
    }

    /// The user the credential belongs to.
    pub fn get_user(&self, credential: &str) -> Result<User> {
        let response = self.transport.execute(self.client.build_get_user(credential))?;
        self.client.parse_get_user(response, credential)
    }

    pub fn search_projects(
        &self,
        query: &SearchQuery,
        credential: Option<&str>,
    ) -> Result<SearchResponse> {
        let response = self
            .transport
            .execute(self.client.build_search(query, credential))?;
        self.client.parse_search(response)
    }

    /// Creates `project` as a draft owned by `user`.
    pub fn create_project(&self, user: &User, project: &Project) -> Result<()> {
        let request = self.client.build_create_project(user, project)?;
        let response = self.transport.execute(request)?;
        self.client.parse_create(response)
    }

    /// Uploads `version` and its `file_parts` under `project`. The request is
    /// authorized with `project.credential`, which `get_project` fills in. A
    /// project built locally must set it first, or no `Authorization` is sent.
    pub fn create_version(&self, project: &Project, version: &Version) -> Result<()> {
        let request = self.client.build_create_version(project, version)?;
        let response = self.transport.execute(request)?;
        self.client.parse_create(response)
    }

    /// Applies the fields `modified` sets to `project`. When `modified`
    /// carries an icon, it is uploaded only after the update succeeded.
    ///
    /// Both requests are authorized with `project.credential`, as in
    /// [`Rinth::create_version`].
    pub fn modify_project(&self, project: &Project, modified: &Project) -> Result<()> {
        let request = self.client.build_modify_project(project, modified)?;
        let response = self.transport.execute(request)?;
        self.client.parse_modify_project(response, project)?;

        if let Some(icon) = &modified.icon {
            let response = self
                .transport
                .execute(self.client.build_upload_icon(project, icon))?;
            self.client.parse_upload_icon(response, project)?;
        }
        Ok(())
    }

    /// The pinned version, or the latest version of the depended-on project.
    pub fn resolve_dependency(&self, dependency: &Dependency, credential: &str) -> Result<Version> {
        match (&dependency.version_id, &dependency.project_id) {
            (Some(version_id), _) => self.get_version(version_id, credential),
            (None, Some(project_id)) => {
                let project = self.get_project(project_id, credential)?;
                self.get_latest_version(&project)
            }
            (None, None) => Err(ApiError::InvalidDependency),
        }
    }
}
