//! Stateless HTTP request builder and response parser for the API.
//!
//! # Design
//! `RinthClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse` and applies that operation's status table. The
//! `Rinth` façade runs the round-trip in between; tests can drive either half
//! on its own.

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::{encode_multipart, Attachment};
use crate::search::{SearchQuery, SearchResponse};
use crate::types::{Icon, Project, User, Version, VersionStatus};
use crate::update::diff_against_zero;

/// License sent when a new project does not name one.
pub const UNKNOWN_LICENSE: &str = "LicenseRef-Unknown";

#[derive(Debug, Clone)]
pub struct RinthClient {
    base_url: String,
}

impl RinthClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str, credential: Option<&str>) -> HttpRequest {
        let request = HttpRequest::new(method, format!("{}{path}", self.base_url));
        match credential {
            Some(credential) => request.header("Authorization", credential),
            None => request,
        }
    }

    pub fn build_get_project(&self, id_or_slug: &str, credential: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/project/{id_or_slug}"),
            Some(credential),
        )
    }

    pub fn build_get_versions(&self, project: &Project) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/project/{}/version", project.handle()),
            project.credential(),
        )
    }

    pub fn build_get_version(&self, version_id: &str, credential: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/version/{version_id}"),
            Some(credential),
        )
    }

    pub fn build_get_user(&self, credential: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/user", Some(credential))
    }

    pub fn build_search(&self, query: &SearchQuery, credential: Option<&str>) -> HttpRequest {
        let mut request = self.request(HttpMethod::Get, "/search", credential);
        request.query = query.to_pairs();
        request
    }

    /// POST `/project`. The payload is the project's selective diff plus the
    /// fields the create endpoint requires; the icon, if any, rides along as
    /// a plain `icon` field.
    pub fn build_create_project(&self, user: &User, project: &Project) -> Result<HttpRequest> {
        let project = prepare_new_project(project);
        let mut payload = diff_against_zero(&project)?;

        let license_id = project
            .license
            .as_ref()
            .map(|l| l.id.as_str())
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_LICENSE);
        payload.insert("license_id".to_string(), json!(license_id));
        payload.insert("is_draft".to_string(), json!(true));
        payload
            .entry("categories")
            .or_insert_with(|| json!(project.categories));
        payload
            .entry("initial_versions")
            .or_insert_with(|| json!([]));

        let attachments: Vec<Attachment> = project
            .icon
            .iter()
            .map(|icon| Attachment::field("icon", icon.data.clone()))
            .collect();

        let multipart = encode_multipart(&payload, &attachments)?;
        Ok(self
            .request(HttpMethod::Post, "/project", user.credential())
            .body(&multipart.content_type(), multipart.body))
    }

    /// POST `/version`. Every entry of `file_parts` is uploaded as a file part
    /// named after the entry itself. Authorized with `project.credential`.
    pub fn build_create_version(&self, project: &Project, version: &Version) -> Result<HttpRequest> {
        let version = prepare_new_version(project, version);
        let attachments: Vec<Attachment> = version
            .file_parts
            .iter()
            .map(|part| Attachment::file(part.as_str(), part.as_str()))
            .collect();

        let multipart = encode_multipart(&version, &attachments)?;
        Ok(self
            .request(HttpMethod::Post, "/version", project.credential())
            .body(&multipart.content_type(), multipart.body))
    }

    /// PATCH `/project/{id}` with only the fields `modified` sets, authorized
    /// with `project.credential`.
    pub fn build_modify_project(&self, project: &Project, modified: &Project) -> Result<HttpRequest> {
        let update = diff_against_zero(modified)?;
        let body = serde_json::to_vec(&update)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self
            .request(
                HttpMethod::Patch,
                &format!("/project/{}", project.handle()),
                project.credential(),
            )
            .body("application/json", body))
    }

    pub fn build_upload_icon(&self, project: &Project, icon: &Icon) -> HttpRequest {
        self.request(
            HttpMethod::Patch,
            &format!("/project/{}/icon", project.handle()),
            project.credential(),
        )
        .query("ext", &icon.ext)
        .body(&icon.content_type(), icon.data.clone())
    }

    pub fn parse_get_project(
        &self,
        response: HttpResponse,
        id_or_slug: &str,
        credential: &str,
    ) -> Result<Project> {
        check_status(&response, is_success, Some(("project", id_or_slug)))?;
        let project: Project = decode(&response)?;
        Ok(project.with_credential(credential))
    }

    /// An empty success body is an empty list, not an error.
    pub fn parse_get_versions(&self, response: HttpResponse, project: &Project) -> Result<Vec<Version>> {
        check_status(&response, is_success, Some(("project", project.handle())))?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        decode(&response)
    }

    pub fn parse_get_version(&self, response: HttpResponse, version_id: &str) -> Result<Version> {
        check_status(&response, is_success, Some(("version", version_id)))?;
        decode(&response)
    }

    pub fn parse_get_user(&self, response: HttpResponse, credential: &str) -> Result<User> {
        check_status(&response, is_success, None)?;
        let user: User = decode(&response)?;
        Ok(user.with_credential(credential))
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<SearchResponse> {
        check_status(&response, is_success, None)?;
        decode(&response)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<()> {
        check_status(&response, is_success, None)
    }

    pub fn parse_modify_project(&self, response: HttpResponse, project: &Project) -> Result<()> {
        check_status(&response, is_no_content, Some(("project", project.handle())))
    }

    pub fn parse_upload_icon(&self, response: HttpResponse, project: &Project) -> Result<()> {
        check_status(&response, is_no_content, Some(("project", project.handle())))
    }
}

fn prepare_new_project(project: &Project) -> Project {
    let mut project = project.clone();
    if project.body.is_empty() {
        project.body = " ".to_string();
    }
    project
}

fn prepare_new_version(project: &Project, version: &Version) -> Version {
    let mut version = version.clone();
    if version.status.is_none() {
        version.status = Some(VersionStatus::Listed);
    }
    if version.project_id.is_empty() {
        version.project_id = project.id.clone();
    }
    if version.name.is_empty() {
        warn!(
            version_number = %version.version_number,
            "version has no name, using its version number as the title"
        );
        version.name = version.version_number.clone();
    }
    version
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn is_no_content(status: u16) -> bool {
    status == 204
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: String,
    description: String,
}

/// Map a status outside `accept` to the matching `ApiError` variant. 404 is
/// only a `NotFound` when the operation addresses a named resource.
fn check_status(
    response: &HttpResponse,
    accept: fn(u16) -> bool,
    resource: Option<(&'static str, &str)>,
) -> Result<()> {
    if accept(response.status) {
        return Ok(());
    }
    match (response.status, resource) {
        (404, Some((kind, id))) => Err(ApiError::NotFound {
            kind,
            id: id.to_string(),
        }),
        (401, _) => {
            let body: ErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
            Err(ApiError::Unauthorized {
                error: body.error,
                description: body.description,
            })
        }
        (400, _) => Err(ApiError::InvalidRequest {
            body: response.text(),
        }),
        (status, _) => Err(ApiError::UnexpectedStatus {
            status,
            body: response.text(),
        }),
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Parse a request body back into JSON. Test helper for PATCH bodies.
#[cfg(test)]
pub(crate) fn body_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::License;

    fn client() -> RinthClient {
        RinthClient::new("http://localhost:3000/v2")
    }

    fn fetched(slug: &str) -> Project {
        Project {
            id: "AANobbMI".to_string(),
            slug: slug.to_string(),
            ..Project::default()
        }
        .with_credential("mrp_token")
    }

    #[test]
    fn build_get_project_carries_credential_verbatim() {
        let req = client().build_get_project("sodium", "mrp_token");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/v2/project/sodium");
        assert_eq!(req.header_value("authorization"), Some("mrp_token"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_versions_uses_project_credential() {
        let req = client().build_get_versions(&fetched("sodium"));
        assert_eq!(req.url, "http://localhost:3000/v2/project/sodium/version");
        assert_eq!(req.header_value("Authorization"), Some("mrp_token"));
    }

    #[test]
    fn build_get_versions_without_credential_sends_no_header() {
        let project = Project {
            slug: "sodium".to_string(),
            ..Project::default()
        };
        let req = client().build_get_versions(&project);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_modify_project_sends_selective_body() {
        let modified = Project {
            title: "Sodium Extra".to_string(),
            downloads: 0,
            license: Some(License {
                id: "MIT".to_string(),
                ..License::default()
            }),
            ..Project::default()
        };
        let req = client()
            .build_modify_project(&fetched("sodium"), &modified)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:3000/v2/project/sodium");
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        assert_eq!(
            body_json(&req),
            json!({"title": "Sodium Extra", "license": {"id": "MIT", "name": "", "url": null}})
        );
    }

    #[test]
    fn build_upload_icon_targets_icon_route() {
        let req = client().build_upload_icon(&fetched("sodium"), &Icon::png(vec![1, 2, 3]));
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "http://localhost:3000/v2/project/sodium/icon");
        assert_eq!(req.query, vec![("ext".to_string(), "png".to_string())]);
        assert_eq!(req.header_value("content-type"), Some("image/png"));
        assert_eq!(req.body.as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn build_create_project_adds_required_fields() {
        let user = User::default().with_credential("mrp_token");
        let project = Project {
            title: "Sodium".to_string(),
            slug: "sodium".to_string(),
            icon: Some(Icon::png(b"PNGDATA".to_vec())),
            ..Project::default()
        };
        let req = client().build_create_project(&user, &project).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v2/project");
        let content_type = req.header_value("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains(r#""license_id":"LicenseRef-Unknown""#));
        assert!(body.contains(r#""is_draft":true"#));
        assert!(body.contains(r#""body":" ""#));
        assert!(body.contains(r#""categories":[]"#));
        assert!(body.contains(r#""initial_versions":[]"#));
        assert!(body.contains("name=\"icon\"\r\n\r\nPNGDATA\r\n"));
    }

    #[test]
    fn build_create_version_fills_defaults() {
        let version = Version {
            version_number: "1.0.0".to_string(),
            ..Version::default()
        };
        let req = client()
            .build_create_version(&fetched("sodium"), &version)
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/v2/version");
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.contains(r#""status":"listed""#));
        assert!(body.contains(r#""project_id":"AANobbMI""#));
        assert!(body.contains(r#""name":"1.0.0""#));
    }

    #[test]
    fn build_create_version_with_missing_file_fails() {
        let version = Version {
            name: "Release".to_string(),
            file_parts: vec!["/nonexistent/rinth/sodium.jar".to_string()],
            ..Version::default()
        };
        let err = client()
            .build_create_version(&fetched("sodium"), &version)
            .unwrap_err();
        assert!(matches!(err, ApiError::Attachment { .. }));
    }

    #[test]
    fn locally_built_project_authorizes_writes_with_its_credential() {
        let project = Project {
            slug: "sodium".to_string(),
            credential: Some("mrp_local".to_string()),
            ..Project::default()
        };
        let modified = Project {
            title: "Sodium".to_string(),
            ..Project::default()
        };
        let c = client();
        let requests = [
            c.build_create_version(&project, &Version::default()).unwrap(),
            c.build_modify_project(&project, &modified).unwrap(),
            c.build_upload_icon(&project, &Icon::png(vec![0])),
        ];
        for req in &requests {
            assert_eq!(req.header_value("authorization"), Some("mrp_local"), "{}", req.url);
        }

        let anonymous = Project {
            credential: None,
            ..project
        };
        let req = c.build_modify_project(&anonymous, &modified).unwrap();
        assert_eq!(req.header_value("authorization"), None);
    }

    #[test]
    fn parse_get_project_attaches_credential() {
        let response = HttpResponse::new(200, r#"{"id":"AANobbMI","slug":"sodium"}"#);
        let project = client()
            .parse_get_project(response, "sodium", "mrp_token")
            .unwrap();
        assert_eq!(project.id, "AANobbMI");
        assert_eq!(project.credential(), Some("mrp_token"));
    }

    #[test]
    fn parse_get_project_not_found_names_identifier() {
        let err = client()
            .parse_get_project(HttpResponse::new(404, ""), "sodium", "t")
            .unwrap_err();
        match err {
            ApiError::NotFound { kind, id } => {
                assert_eq!(kind, "project");
                assert_eq!(id, "sodium");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_get_versions_empty_body_is_empty_list() {
        let versions = client()
            .parse_get_versions(HttpResponse::new(200, ""), &fetched("sodium"))
            .unwrap();
        assert!(versions.is_empty());
        let versions = client()
            .parse_get_versions(HttpResponse::new(200, "[]"), &fetched("sodium"))
            .unwrap();
        assert!(versions.is_empty());
    }

    #[test]
    fn parse_get_versions_bad_json() {
        let err = client()
            .parse_get_versions(HttpResponse::new(200, "not json"), &fetched("sodium"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_unauthorized_extracts_error_fields() {
        let response = HttpResponse::new(
            401,
            r#"{"error":"unauthorized","description":"Authentication Error: invalid token"}"#,
        );
        let err = client()
            .parse_modify_project(response, &fetched("sodium"))
            .unwrap_err();
        match err {
            ApiError::Unauthorized { error, description } => {
                assert_eq!(error, "unauthorized");
                assert_eq!(description, "Authentication Error: invalid token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_unauthorized_without_body() {
        let err = client().parse_create(HttpResponse::new(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { ref error, .. } if error.is_empty()));
    }

    #[test]
    fn parse_get_user_404_is_unexpected() {
        let err = client()
            .parse_get_user(HttpResponse::new(404, ""), "mrp_token")
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 404, .. }));
        assert_eq!(err.to_string(), "unexpected status code 404");
    }

    #[test]
    fn parse_create_invalid_request_keeps_body() {
        let err = client()
            .parse_create(HttpResponse::new(400, "slug already taken"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest { ref body } if body == "slug already taken"));
    }

    #[test]
    fn parse_create_404_is_unexpected() {
        let err = client().parse_create(HttpResponse::new(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 404, .. }));
    }

    #[test]
    fn parse_modify_requires_no_content() {
        assert!(client()
            .parse_modify_project(HttpResponse::new(204, ""), &fetched("sodium"))
            .is_ok());
        let err = client()
            .parse_modify_project(HttpResponse::new(200, "{}"), &fetched("sodium"))
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 200, .. }));
    }

    #[test]
    fn parse_server_error_carries_status() {
        let err = client()
            .parse_get_version(HttpResponse::new(503, "maintenance"), "IIJJKKLL")
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 503, .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = RinthClient::new("http://localhost:3000/v2/").build_get_user("t");
        assert_eq!(req.url, "http://localhost:3000/v2/user");
    }
}
