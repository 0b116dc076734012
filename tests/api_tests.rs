use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use async_trait::async_trait;
use http_body_util::BodyExt;
use intelboard::clients::openai::{ChatBackend, ChatMessage};
use intelboard::config::Config;
use intelboard::db::Store;
use intelboard::state::SharedState;
use std::sync::Arc;
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery";

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.assistant.enabled = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config
}

async fn spawn_app() -> Router {
    let state = intelboard::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    intelboard::api::router(state).await
}

struct CannedBackend;

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        Ok("Noted.".to_string())
    }
}

async fn spawn_app_with_assistant() -> Router {
    let store = Store::new("sqlite::memory:").await.unwrap();
    let backend: Arc<dyn ChatBackend> = Arc::new(CannedBackend);
    let shared = SharedState::with_backend(test_config(), store, Some(backend));
    intelboard::api::router(intelboard::api::create_app_state(Arc::new(shared), None)).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json, set_cookie)
}

async fn login_as(app: &Router, username: &str) -> String {
    let credentials = json!({ "username": username, "password": PASSWORD });

    let (status, _, _) = send(app, "POST", "/api/auth/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, cookie) = send(app, "POST", "/api/auth/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], username);
    cookie.expect("login should set a session cookie")
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for uri in ["/api/incidents", "/api/datasets", "/api/tickets", "/api/dashboard"] {
        let (status, body, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], false);
    }

    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some("id=bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body, _) = send(&app, "GET", "/api/system/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["assistant"], false);
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "analyst").await;

    let (status, body, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "analyst");
    assert_eq!(body["data"]["role"], "user");

    let duplicate = json!({ "username": "analyst", "password": "another password" });
    let (status, _, _) = send(&app, "POST", "/api/auth/register", None, Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let wrong = json!({ "username": "analyst", "password": "not the password" });
    let (status, _, _) = send(&app, "POST", "/api/auth/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let short = json!({ "username": "newcomer", "password": "short" });
    let (status, _, _) = send(&app, "POST", "/api/auth/register", None, Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_on_a_used_session_starts_a_fresh_conversation() {
    let app = spawn_app_with_assistant().await;
    let alice = login_as(&app, "alice").await;

    let request = json!({ "message": "Our VPN keys leaked", "domain": "cybersecurity" });
    let (status, body, _) = send(&app, "POST", "/api/assistant/chat", Some(&alice), Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["configured"], true);

    let (_, body, _) = send(&app, "GET", "/api/assistant/history", Some(&alice), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let bob = json!({ "username": "bob", "password": PASSWORD });
    let (status, _, _) = send(&app, "POST", "/api/auth/register", None, Some(bob.clone())).await;
    assert_eq!(status, StatusCode::OK);

    // Same browser, different person
    let (status, _, cookie) = send(&app, "POST", "/api/auth/login", Some(&alice), Some(bob)).await;
    assert_eq!(status, StatusCode::OK);
    let bob_cookie = cookie.expect("login should issue a new session cookie");
    assert_ne!(bob_cookie, alice);

    let (status, body, _) = send(&app, "GET", "/api/auth/me", Some(&bob_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bob");

    let (status, body, _) = send(&app, "GET", "/api/assistant/history", Some(&bob_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _, _) = send(&app, "GET", "/api/assistant/history", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "operator").await;

    let bad = json!({ "current_password": "wrong guess", "new_password": "brand new secret" });
    let (status, body, _) = send(&app, "PUT", "/api/auth/password", Some(&cookie), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let good = json!({ "current_password": PASSWORD, "new_password": "brand new secret" });
    let (status, _, _) = send(&app, "PUT", "/api/auth/password", Some(&cookie), Some(good)).await;
    assert_eq!(status, StatusCode::OK);

    let old = json!({ "username": "operator", "password": PASSWORD });
    let (status, _, _) = send(&app, "POST", "/api/auth/login", None, Some(old)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let new = json!({ "username": "operator", "password": "brand new secret" });
    let (status, _, _) = send(&app, "POST", "/api/auth/login", None, Some(new)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_incident_lifecycle() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "soc").await;

    let incident = json!({
        "title": "Ransomware on file server",
        "severity": "Critical",
        "description": "Encrypted shares detected",
        "reported_by": "soc",
        "date": "2024-05-01"
    });
    let (status, body, _) = send(&app, "POST", "/api/incidents", Some(&cookie), Some(incident)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Open");
    assert_eq!(body["data"]["severity"], "Critical");
    let id = body["data"]["id"].as_i64().unwrap();

    let unknown_severity = json!({ "title": "Odd report", "severity": "Apocalyptic" });
    let (status, body, _) =
        send(&app, "POST", "/api/incidents", Some(&cookie), Some(unknown_severity)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["severity"], "Medium");

    let (status, _, _) =
        send(&app, "POST", "/api/incidents", Some(&cookie), Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/incidents/{id}/status");
    let (status, body, _) =
        send(&app, "PUT", &uri, Some(&cookie), Some(json!({ "status": "In Progress" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "In Progress");

    let (status, _, _) =
        send(&app, "PUT", &uri, Some(&cookie), Some(json!({ "status": "Escalated" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body, _) = send(
        &app,
        "GET",
        "/api/incidents?severity=Critical",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _, _) = send(&app, "GET", "/api/incidents?status=Bogus", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let item = format!("/api/incidents/{id}");
    let (status, _, _) = send(&app, "DELETE", &item, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", &item, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "DELETE", &item, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "GET", "/api/incidents/0", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ticket_workflow() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "helpdesk").await;

    let ticket = json!({
        "title": "VPN drops every hour",
        "priority": "High",
        "description": "Reported by finance"
    });
    let (status, body, _) = send(&app, "POST", "/api/tickets", Some(&cookie), Some(ticket)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assigned_to"], "");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body, _) = send(
        &app,
        "PUT",
        &format!("/api/tickets/{id}/assignee"),
        Some(&cookie),
        Some(json!({ "assigned_to": "alex" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assigned_to"], "alex");

    let (status, body, _) = send(
        &app,
        "POST",
        &format!("/api/tickets/{id}/close"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Closed");

    let (status, body, _) = send(&app, "GET", "/api/tickets?status=Closed", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _, _) = send(&app, "POST", "/api/tickets/999/close", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_datasets_and_dashboard() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "scientist").await;

    for (name, category, size) in [
        ("Network flows", "Security", 2_147_483_648_i64),
        ("Sales", "Finance", 1_073_741_824),
        ("Unsized", "", 0),
    ] {
        let dataset = json!({ "name": name, "source": "internal", "category": category, "size": size });
        let (status, _, _) = send(&app, "POST", "/api/datasets", Some(&cookie), Some(dataset)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let negative = json!({ "name": "Broken", "size": -1 });
    let (status, _, _) = send(&app, "POST", "/api/datasets", Some(&cookie), Some(negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body, _) =
        send(&app, "GET", "/api/datasets?category=Security", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["size_mb"], 2048.0);

    let (status, body, _) =
        send(&app, "GET", "/api/datasets?min_size_mb=1500", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Network flows");

    let (status, _, _) =
        send(&app, "GET", "/api/datasets?min_size_mb=-1", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let incident = json!({ "title": "Port scan", "severity": "Low" });
    send(&app, "POST", "/api/incidents", Some(&cookie), Some(incident)).await;

    let (status, body, _) = send(&app, "GET", "/api/dashboard", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["users"], 1);
    assert_eq!(data["incidents"]["total"], 1);
    assert_eq!(data["incidents"]["active"], 1);
    assert_eq!(data["datasets"]["total"], 3);
    assert_eq!(data["datasets"]["categories"], 2);
    assert_eq!(data["datasets"]["total_size_gb"], 3.0);
    assert_eq!(data["tickets"]["total"], 0);
}

#[tokio::test]
async fn test_assistant_without_api_key() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "curious").await;

    let request = json!({ "message": "How do I triage a phishing report?", "domain": "cybersecurity" });
    let (status, body, _) =
        send(&app, "POST", "/api/assistant/chat", Some(&cookie), Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["configured"], false);
    assert_eq!(body["data"]["domain"], "cybersecurity");
    assert!(
        body["data"]["reply"]
            .as_str()
            .unwrap()
            .contains("not configured")
    );

    let (status, body, _) = send(&app, "GET", "/api/assistant/history", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/assistant/incidents/42/analyze",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
