use chrono::{Duration as ChronoDuration, Utc};
use gate_api_rust::{
    auth::AdminGate,
    config::GateRules,
    handlers::{self, AppState},
    models::EntryLog,
    repository::{GateStore, InMemoryGateStore},
    service::GateDecisionEngine,
};
use reqwest::Client;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const ADMIN_PASSWORD: &str = "gate-admin";

struct TestServer {
    addr: SocketAddr,
    store: InMemoryGateStore,
    // Keeps the admin password file alive for the test's duration.
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn create_test_server(with_admin_password: bool) -> TestServer {
    let store = InMemoryGateStore::new();
    let rules = GateRules {
        entry_retry_delay: Duration::from_millis(1),
        ..GateRules::default()
    };
    let engine = GateDecisionEngine::new(Arc::new(store.clone()), rules);

    let dir = tempfile::tempdir().unwrap();
    let admin = AdminGate::new(dir.path().join("admin_password.sha256"));
    if with_admin_password {
        admin.set_password(ADMIN_PASSWORD).unwrap();
    }

    let app = handlers::app(AppState::new(engine, admin));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Verify server is actually listening by trying to connect
    let mut retries = 0;
    while retries < 10 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        retries += 1;
    }

    TestServer {
        addr,
        store,
        _dir: dir,
    }
}

async fn register_vehicle(client: &Client, server: &TestServer, plate: &str) {
    let response = client
        .post(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({
            "plateNumber": plate,
            "ownerName": "Asha Rao",
            "vehicleType": "Car"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_health_check_should_return_ok() {
    let server = create_test_server(false).await;
    let client = Client::new();

    let response = client
        .get(server.url("/api/v1/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_entry_for_registered_vehicle_should_show_owner() {
    let server = create_test_server(true).await;
    let client = Client::new();
    register_vehicle(&client, &server, "ka 01 ab 1234").await;

    let response = client
        .post(server.url("/api/v1/gate/entry"))
        .json(&json!({ "plateNumber": "ka01ab1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["plateNumber"], "KA01AB1234");
    assert_eq!(body["isRegistered"], true);
    assert_eq!(body["isSuspicious"], false);
    assert_eq!(body["vehicle"]["ownerName"], "Asha Rao");
    assert_eq!(body["message"], "✅ REGISTERED VEHICLE");
    assert_eq!(body["status"], "✅ Entry logged successfully");
    assert!(body["entryLogId"].is_string());
}

#[tokio::test]
async fn test_repeated_entry_of_unregistered_vehicle_should_raise_red_flag() {
    let server = create_test_server(false).await;
    let client = Client::new();

    let first: serde_json::Value = client
        .post(server.url("/api/v1/gate/entry"))
        .json(&json!({ "plateNumber": "MH12 XY 9999" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["message"], "❌ UNREGISTERED VEHICLE");
    assert_eq!(first["isSuspicious"], false);

    let second: serde_json::Value = client
        .post(server.url("/api/v1/gate/entry"))
        .json(&json!({ "plateNumber": "mh12xy9999" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["isSuspicious"], true);
    assert_eq!(
        second["suspiciousReason"],
        "Entered more than 1 time in last 20 minutes"
    );
    assert_eq!(
        second["message"],
        "⚠️ RED FLAG: Entered more than 1 time in last 20 minutes"
    );
    assert_eq!(second["pastEntries"].as_array().unwrap().len(), 1);
    assert_eq!(second["pastEntries"][0]["durationFormatted"], "In campus");
}

#[tokio::test]
async fn test_entry_with_blank_plate_should_return_validation_error() {
    let server = create_test_server(false).await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/v1/gate/entry"))
        .json(&json!({ "plateNumber": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please enter a plate number");
    assert_eq!(server.store.entry_log_count().await, 0);
}

#[tokio::test]
async fn test_exit_after_long_stay_should_be_flagged() {
    let server = create_test_server(false).await;
    let client = Client::new();
    let entry_time = Utc::now() - ChronoDuration::minutes(25);
    server
        .store
        .insert_entry_log(EntryLog {
            id: "visit-1".to_string(),
            plate_number: "DL3CAB0001".to_string(),
            entry_time: Some(entry_time),
            exit_time: None,
            duration_minutes: None,
            is_registered: false,
            is_suspicious: false,
            suspicious_reason: None,
        })
        .await;

    let response = client
        .post(server.url("/api/v1/gate/exit"))
        .json(&json!({ "plateNumber": "dl3c ab 0001" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["entryLogId"], "visit-1");
    assert_eq!(body["overstayed"], true);
    assert_eq!(body["isSuspicious"], true);
    assert!(body["durationMinutes"].as_f64().unwrap() >= 25.0);
    assert_eq!(body["durationFormatted"], "25m");
    assert_eq!(body["message"], "⚠️ SUSPICIOUS: Stayed 25m (>20min)");
    assert_eq!(
        body["entryTimeFormatted"],
        entry_time.format("%d/%m/%Y %H:%M:%S").to_string()
    );
    assert!(body["exitTimeFormatted"].is_string());

    let stored = server.store.entry_log("visit-1").await.unwrap();
    assert!(!stored.is_active());
    assert!(stored.is_suspicious);
}

#[tokio::test]
async fn test_exit_without_active_entry_should_return_not_found() {
    let server = create_test_server(false).await;
    let client = Client::new();

    client
        .post(server.url("/api/v1/gate/entry"))
        .json(&json!({ "plateNumber": "KA01AB1234" }))
        .send()
        .await
        .unwrap();
    let first_exit = client
        .post(server.url("/api/v1/gate/exit"))
        .json(&json!({ "plateNumber": "KA01AB1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first_exit.status(), 200);
    let body: serde_json::Value = first_exit.json().await.unwrap();
    assert_eq!(body["message"], "✅ Exit recorded");

    let second_exit = client
        .post(server.url("/api/v1/gate/exit"))
        .json(&json!({ "plateNumber": "KA01AB1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second_exit.status(), 404);
    let body: serde_json::Value = second_exit.json().await.unwrap();
    assert_eq!(
        body["error"],
        "No active entry found for this vehicle. Vehicle may not have entered or already exited."
    );
}

#[tokio::test]
async fn test_history_should_list_visits_newest_first() {
    let server = create_test_server(false).await;
    let client = Client::new();
    for _ in 0..2 {
        client
            .post(server.url("/api/v1/gate/entry"))
            .json(&json!({ "plateNumber": "KA01AB1234" }))
            .send()
            .await
            .unwrap();
    }

    let body: serde_json::Value = client
        .get(server.url("/api/v1/gate/history/ka01ab1234"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["plateNumber"], "KA01AB1234");
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["isSuspicious"], true);
    assert_eq!(entries[1]["isSuspicious"], false);
}

#[tokio::test]
async fn test_admin_routes_should_be_locked_until_password_is_set() {
    let server = create_test_server(false).await;
    let client = Client::new();

    let locked = client
        .get(server.url("/api/v1/admin/vehicles"))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status(), 403);

    let set = client
        .post(server.url("/api/v1/admin/password"))
        .json(&json!({ "newPassword": "1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(set.status(), 200);
    let body: serde_json::Value = set.json().await.unwrap();
    assert_eq!(body["message"], "Password set");

    let unlocked = client
        .get(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", "1234")
        .send()
        .await
        .unwrap();
    assert_eq!(unlocked.status(), 200);
}

#[tokio::test]
async fn test_admin_routes_should_reject_wrong_password() {
    let server = create_test_server(true).await;
    let client = Client::new();

    let response = client
        .get(server.url("/api/v1/admin/logs"))
        .header("x-admin-password", "not-it")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(server.url("/api/v1/admin/logs"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_password_change_should_require_current_password() {
    let server = create_test_server(true).await;
    let client = Client::new();

    let short = client
        .post(server.url("/api/v1/admin/password"))
        .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(short.status(), 422);

    let wrong = client
        .post(server.url("/api/v1/admin/password"))
        .json(&json!({ "currentPassword": "guess", "newPassword": "new-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let changed = client
        .post(server.url("/api/v1/admin/password"))
        .json(&json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "new-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(changed.status(), 200);
    let body: serde_json::Value = changed.json().await.unwrap();
    assert_eq!(body["message"], "Password changed");
}

#[tokio::test]
async fn test_duplicate_vehicle_should_return_conflict_and_keep_first_owner() {
    let server = create_test_server(true).await;
    let client = Client::new();
    register_vehicle(&client, &server, "KA01AB1234").await;

    let response = client
        .post(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({
            "plateNumber": "ka 01 ab 1234",
            "ownerName": "Someone Else"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let vehicle = server.store.get_vehicle("KA01AB1234").await.unwrap().unwrap();
    assert_eq!(vehicle.owner_name, "Asha Rao");
}

#[tokio::test]
async fn test_vehicle_without_owner_should_return_validation_error() {
    let server = create_test_server(true).await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "plateNumber": "KA01AB1234", "ownerName": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn test_vehicle_with_blank_owner_should_return_validation_error() {
    let server = create_test_server(true).await;
    let client = Client::new();

    let response = client
        .post(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "plateNumber": "KA01AB1234", "ownerName": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please fill plate number and owner name");
    assert!(server.store.get_vehicle("KA01AB1234").await.unwrap().is_none());
}

#[tokio::test]
async fn test_vehicle_list_and_delete() {
    let server = create_test_server(true).await;
    let client = Client::new();
    register_vehicle(&client, &server, "MH12XY9999").await;
    register_vehicle(&client, &server, "DL3CAB0001").await;

    let vehicles: serde_json::Value = client
        .get(server.url("/api/v1/admin/vehicles"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let plates: Vec<&str> = vehicles
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["plateNumber"].as_str().unwrap())
        .collect();
    assert_eq!(plates, vec!["DL3CAB0001", "MH12XY9999"]);

    let deleted = client
        .delete(server.url("/api/v1/admin/vehicles/dl3cab0001"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let missing = client
        .delete(server.url("/api/v1/admin/vehicles/DL3CAB0001"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_logs_should_respect_limit() {
    let server = create_test_server(true).await;
    let client = Client::new();
    for plate in ["AA11", "BB22", "CC33"] {
        client
            .post(server.url("/api/v1/gate/entry"))
            .json(&json!({ "plateNumber": plate }))
            .send()
            .await
            .unwrap();
    }

    let logs: serde_json::Value = client
        .get(server.url("/api/v1/admin/logs?limit=2"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["durationFormatted"], "In campus");
    assert!(logs[0]["exitTime"].is_null());
}

#[tokio::test]
async fn test_logs_with_invalid_limit_should_return_json_error() {
    let server = create_test_server(true).await;
    let client = Client::new();

    let response = client
        .get(server.url("/api/v1/admin/logs?limit=abc"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], 422);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to deserialize query string"));
}
