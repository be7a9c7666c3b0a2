use axum::http::StatusCode;
use axum_test::TestServer;
use devlog_relay::api::{create_router, AppState};
use devlog_relay::models::*;
use devlog_relay::registry::CredentialRegistry;
use devlog_relay::store::SeenIdStore;
use tempfile::TempDir;

struct Setup {
    server: TestServer,
    registry: CredentialRegistry,
    store: SeenIdStore,
    _dir: TempDir,
}

fn setup() -> Setup {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = SeenIdStore::open(dir.path()).expect("Failed to open store");
    let registry = CredentialRegistry::open(dir.path());
    let app = create_router(AppState {
        registry: registry.clone(),
        store: store.clone(),
    });
    Setup {
        server: TestServer::new(app).expect("Failed to create test server"),
        registry,
        store,
        _dir: dir,
    }
}

fn registration(credential: &str, channel: &str, projects: &[&str]) -> RegisterInput {
    RegisterInput {
        credential: credential.to_string(),
        channel: channel.to_string(),
        projects: projects.iter().map(|p| p.to_string()).collect(),
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_okay() {
        let s = setup();

        let response = s.server.get("/healthcheck").await;

        response.assert_status_ok();
        assert_eq!(response.text(), "I'm okay!");
    }
}

mod stats {
    use super::*;

    #[tokio::test]
    async fn counts_registered_credentials() {
        let s = setup();
        s.registry.register(registration("a", "C1", &["1"])).expect("Failed to register");
        s.registry.register(registration("b", "C2", &["2"])).expect("Failed to register");

        let response = s.server.get("/api/v1/stats").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["credentials"], 2);
    }
}

mod registrations {
    use super::*;

    #[tokio::test]
    async fn creates_a_registration() {
        let s = setup();

        let response = s
            .server
            .post("/api/v1/registrations")
            .json(&registration("key", "C1", &["10", "11"]))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created: Registration = response.json();
        assert_eq!(created.channel, "C1");
        assert_eq!(created.projects, vec!["10", "11"]);
        assert_eq!(s.registry.count().expect("Failed to count"), 1);
    }

    #[tokio::test]
    async fn rejects_non_numeric_project_ids() {
        let s = setup();

        let response = s
            .server
            .post("/api/v1/registrations")
            .json(&registration("key", "C1", &["rocket"]))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_credential_owned_by_another_channel() {
        let s = setup();
        s.registry.register(registration("key", "C1", &["1"])).expect("Failed to register");

        let response = s
            .server
            .post("/api/v1/registrations")
            .json(&registration("key", "C2", &["2"]))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }
}

mod channels {
    use super::*;

    #[tokio::test]
    async fn rekeys_the_channel_credential() {
        let s = setup();
        s.registry.register(registration("old", "C1", &["1"])).expect("Failed to register");

        let response = s
            .server
            .put("/api/v1/channels/C1/credential")
            .json(&RekeyInput {
                credential: "new".to_string(),
            })
            .await;

        response.assert_status(StatusCode::NO_CONTENT);
        let registrations = s.registry.load().expect("Failed to load");
        assert!(registrations.contains_key("new"));
        assert!(!registrations.contains_key("old"));
    }

    #[tokio::test]
    async fn rekey_of_unknown_channel_is_not_found() {
        let s = setup();

        let response = s
            .server
            .put("/api/v1/channels/C9/credential")
            .json(&RekeyInput {
                credential: "new".to_string(),
            })
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rekey_with_blank_credential_is_rejected() {
        let s = setup();
        s.registry.register(registration("old", "C1", &["1"])).expect("Failed to register");

        let response = s
            .server
            .put("/api/v1/channels/C1/credential")
            .json(&RekeyInput {
                credential: " ".to_string(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn removes_everything_for_the_channel() {
        let s = setup();
        s.registry.register(registration("a", "C1", &["1", "2"])).expect("Failed to register");

        let response = s.server.delete("/api/v1/channels/C1").await;

        response.assert_status(StatusCode::NO_CONTENT);
        assert_eq!(s.registry.count().expect("Failed to count"), 0);

        let again = s.server.delete("/api/v1/channels/C1").await;
        again.assert_status(StatusCode::NOT_FOUND);
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn removing_a_project_forgets_its_seen_ids() {
        let s = setup();
        s.registry.register(registration("a", "C1", &["1", "2"])).expect("Failed to register");
        s.store.save(1, &[10, 11]).expect("Failed to save");

        let response = s.server.delete("/api/v1/projects/1").await;

        response.assert_status(StatusCode::NO_CONTENT);
        assert!(s.store.load(1).is_empty());
        let registrations = s.registry.load().expect("Failed to load");
        assert_eq!(registrations["a"].projects, vec!["2"]);
    }

    #[tokio::test]
    async fn removing_an_untracked_project_is_not_found() {
        let s = setup();
        s.registry.register(registration("a", "C1", &["1"])).expect("Failed to register");
        s.store.save(9, &[1]).expect("Failed to save");

        let response = s.server.delete("/api/v1/projects/9").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(s.store.load(9), vec![1]);
    }

    #[tokio::test]
    async fn non_numeric_project_id_is_rejected() {
        let s = setup();

        let response = s.server.delete("/api/v1/projects/rocket").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
