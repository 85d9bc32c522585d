use serde_json::json;
use wardrobe_client::{AuthState, Client, CredentialStore, WardrobeConfig};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grant_body() -> serde_json::Value {
    json!({
        "access_token": "acc-issued",
        "refresh_token": "ref-issued",
        "token_type": "bearer",
        "expires_in": 900,
        "csrf_token": "csrf-issued"
    })
}

fn client_for(server: &MockServer) -> (Client<WardrobeConfig>, CredentialStore) {
    let store = CredentialStore::in_memory();
    let cfg = WardrobeConfig::new().with_api_base(server.uri());
    (Client::with_config(cfg, store.clone()), store)
}

#[tokio::test]
async fn login_bootstraps_csrf_and_stores_the_grant() {
    let server = MockServer::start().await;
    let (client, store) = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/auth/csrf"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"csrf_token": "bootstrap-csrf", "expires_in": 3600}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    // The login body carries the freshly fetched CSRF token.
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "me@example.com",
            "password": "hunter2",
            "csrf_token": "bootstrap-csrf"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client.auth().login("me@example.com", "hunter2").await.unwrap();
    assert_eq!(grant.access_token, "acc-issued");
    assert_eq!(store.access_token().as_deref(), Some("acc-issued"));
    assert_eq!(store.refresh_token().as_deref(), Some("ref-issued"));
    assert_eq!(store.csrf_token().as_deref(), Some("csrf-issued"));
    assert_eq!(store.auth_state(), AuthState::Authenticated);
}

#[tokio::test]
async fn register_sends_csrf_in_header_and_stores_the_grant() {
    let server = MockServer::start().await;
    let (client, store) = client_for(&server);

    Mock::given(method("GET"))
        .and(path("/api/auth/csrf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"csrf_token": "bootstrap-csrf", "expires_in": 3600}),
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(header("x-csrf-token", "bootstrap-csrf"))
        .and(body_json(json!({
            "username": "casual_fit",
            "email": "me@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
        .expect(1)
        .mount(&server)
        .await;

    client
        .auth()
        .register("casual_fit", "me@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(store.access_token().as_deref(), Some("acc-issued"));
}

#[tokio::test]
async fn logout_clears_local_state_even_when_the_server_fails() {
    let server = MockServer::start().await;
    let (client, store) = client_for(&server);
    store.set_session("acc-1", "ref-1", "csrf-1");
    let state = store.subscribe();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "database down"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.auth().logout().await;
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
    assert!(store.csrf_token().is_none());
    assert_eq!(*state.borrow(), AuthState::Anonymous);
}

#[tokio::test]
async fn sessions_list_deserializes_records() {
    let server = MockServer::start().await;
    let (client, store) = client_for(&server);
    store.set_session("acc-1", "ref-1", "csrf-1");

    Mock::given(method("GET"))
        .and(path("/api/auth/sessions"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {
                    "id": "s1",
                    "created_at": "2025-02-01T09:00:00Z",
                    "ip_address": "203.0.113.7",
                    "user_agent": "Mozilla/5.0",
                    "is_active": true,
                    "last_activity": "2025-02-01T10:00:00Z"
                },
                {"id": "s2", "is_active": false}
            ]
        })))
        .mount(&server)
        .await;

    let sessions = client.auth().sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "s1");
    assert_eq!(sessions[0].ip_address.as_deref(), Some("203.0.113.7"));
    assert!(!sessions[1].is_active);
    assert!(sessions[1].user_agent.is_none());
}

#[tokio::test]
async fn revoke_session_posts_to_the_session_path() {
    let server = MockServer::start().await;
    let (client, store) = client_for(&server);
    store.set_session("acc-1", "ref-1", "csrf-1");

    Mock::given(method("POST"))
        .and(path("/api/auth/sessions/s1/revoke"))
        .and(header("x-csrf-token", "csrf-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Sessão revogada"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client.auth().revoke_session("s1").await.unwrap();
    assert_eq!(response.message.as_deref(), Some("Sessão revogada"));
}
