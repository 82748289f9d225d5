//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every façade
//! operation over real HTTP with `UreqTransport`. Validates request building,
//! multipart encoding, selective updates and status interpretation end-to-end.

use std::io::Write;
use std::net::SocketAddr;

use rinth_core::{
    ApiError, ClientConfig, Icon, License, Project, Rinth, SearchQuery, User, Version,
};

const TOKEN: &str = mock_server::DEFAULT_TOKEN;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

#[test]
fn project_lifecycle() {
    let addr = start_server();
    let api = Rinth::new(&ClientConfig::new(&format!("http://{addr}/v2")));

    // Step 1: resolve the user behind the token.
    let user = api.get_user(TOKEN).unwrap();
    assert_eq!(user.username, "tester");
    assert_eq!(user.credential(), Some(TOKEN));

    // Step 2: unknown project is NotFound carrying the slug.
    let err = api.get_project("sodium", TOKEN).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { ref id, .. } if id == "sodium"));

    // Step 3: create with an icon sent as a plain field.
    let new_project = Project {
        slug: "sodium".to_string(),
        title: "Sodium".to_string(),
        description: "Rendering engine".to_string(),
        license: Some(License {
            id: "LGPL-3.0-only".to_string(),
            ..License::default()
        }),
        icon: Some(Icon::png(b"\x89PNG".to_vec())),
        ..Project::default()
    };
    api.create_project(&user, &new_project).unwrap();

    // Step 4: fetch it back; the credential is re-attached.
    let project = api.get_project("sodium", TOKEN).unwrap();
    assert_eq!(project.title, "Sodium");
    assert_eq!(project.license.as_ref().unwrap().id, "LGPL-3.0-only");
    assert!(project.icon_url.is_some());
    assert_eq!(project.credential(), Some(TOKEN));

    // Step 5: no versions yet.
    assert!(api.get_versions(&project).unwrap().is_empty());
    let err = api.get_latest_version(&project).unwrap_err();
    assert!(matches!(err, ApiError::NoVersions { .. }));

    // Step 6: create an unnamed version with one file.
    let mut jar = tempfile::Builder::new().suffix(".jar").tempfile().unwrap();
    jar.write_all(b"PK\x03\x04").unwrap();
    let jar_path = jar.path().to_string_lossy().into_owned();
    let jar_name = jar.path().file_name().unwrap().to_string_lossy().into_owned();
    let version = Version {
        version_number: "0.5.0".to_string(),
        game_versions: vec!["1.20.1".to_string()],
        loaders: vec!["fabric".to_string()],
        file_parts: vec![jar_path],
        ..Version::default()
    };
    api.create_version(&project, &version).unwrap();

    // Step 7: the new version is the latest and carries the file's base name.
    let latest = api.get_latest_version(&project).unwrap();
    assert_eq!(latest.name, "0.5.0");
    assert_eq!(latest.project_id, project.id);
    assert_eq!(latest.files[0].filename, jar_name);
    assert_eq!(latest.files[0].size, 4);
    let fetched = api.get_version(&latest.id, TOKEN).unwrap();
    assert_eq!(fetched, latest);
    let specific = api.get_specific_version(&project, "0.5.0").unwrap();
    assert_eq!(specific.id, latest.id);

    // Step 8: selective modify plus follow-up icon upload.
    let modified = Project {
        description: "Modern rendering engine".to_string(),
        downloads: 0,
        icon: Some(Icon {
            ext: "webp".to_string(),
            data: b"RIFF".to_vec(),
        }),
        ..Project::default()
    };
    api.modify_project(&project, &modified).unwrap();
    let project = api.get_project("sodium", TOKEN).unwrap();
    assert_eq!(project.description, "Modern rendering engine");
    assert_eq!(project.title, "Sodium");
    assert!(project.icon_url.as_deref().unwrap().ends_with("icon.webp"));

    // Step 9: a wrong credential is Unauthorized with the server's fields.
    let intruder = Project {
        credential: Some("mrp_wrong".to_string()),
        ..project.clone()
    };
    let err = api.modify_project(&intruder, &modified).unwrap_err();
    match err {
        ApiError::Unauthorized { error, description } => {
            assert_eq!(error, "unauthorized");
            assert!(description.contains("Authentication Error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Step 10: search finds the project.
    let results = api.search_projects(&SearchQuery::new("sod"), None).unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].slug, "sodium");
}

#[test]
fn invalid_create_surfaces_body() {
    let addr = start_server();
    let api = Rinth::new(&ClientConfig::new(&format!("http://{addr}/v2")));
    let user = api.get_user(TOKEN).unwrap();

    // No title: the server answers 400 with a JSON explanation.
    let project = Project {
        slug: "untitled".to_string(),
        ..Project::default()
    };
    let err = api.create_project(&user, &project).unwrap_err();
    match err {
        ApiError::InvalidRequest { body } => assert!(body.contains("title")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn locally_built_records_carry_their_credential() {
    let addr = start_server();
    let api = Rinth::new(&ClientConfig::new(&format!("http://{addr}/v2")));

    // The owner is never fetched; the token is set on the literal.
    let owner = User {
        username: "tester".to_string(),
        credential: Some(TOKEN.to_string()),
        ..User::default()
    };
    let new_project = Project {
        slug: "lithium".to_string(),
        title: "Lithium".to_string(),
        ..Project::default()
    };
    api.create_project(&owner, &new_project).unwrap();

    let local = Project {
        slug: "lithium".to_string(),
        credential: Some(TOKEN.to_string()),
        ..Project::default()
    };
    let modified = Project {
        description: "Server optimizations".to_string(),
        ..Project::default()
    };
    api.modify_project(&local, &modified).unwrap();
    assert_eq!(
        api.get_project("lithium", TOKEN).unwrap().description,
        "Server optimizations"
    );

    // Without a credential the write is refused.
    let anonymous = Project {
        credential: None,
        ..local
    };
    let err = api.modify_project(&anonymous, &modified).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }), "got {err:?}");
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let api = Rinth::new(&ClientConfig::new(&format!("http://{addr}/v2")));

    let err = api.get_project("sodium", TOKEN).unwrap_err();
    assert!(err.is_transport(), "expected transport error, got {err:?}");
    assert_eq!(err.status(), None);
}
