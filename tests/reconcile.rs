//! End-to-end reconciliation tests against a mock control plane.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use proxy_panel::audit::LogAuditSink;
use proxy_panel::config::ControlPlaneSettings;
use proxy_panel::control_plane::ControlPlaneClient;
use proxy_panel::error::{ControlPlaneError, PanelError};
use proxy_panel::reconcile::Reconciler;
use proxy_panel::resilience::RetryPolicy;
use proxy_panel::store::{HostStore, MemoryStore, NewHost, StoredSecret, TargetProtocol};

mod common;

fn settings_for(addr: SocketAddr) -> ControlPlaneSettings {
    ControlPlaneSettings {
        base_url: format!("http://{}", addr),
        ..ControlPlaneSettings::default()
    }
}

fn client_for(addr: SocketAddr, retries: u32) -> ControlPlaneClient {
    ControlPlaneClient::new(settings_for(addr), RetryPolicy::immediate(retries)).unwrap()
}

fn new_host(domain: &str) -> NewHost {
    NewHost {
        domain: domain.to_string(),
        target_host: "10.0.0.1".to_string(),
        target_port: 8080,
        target_protocol: TargetProtocol::Http,
        ssl_enabled: false,
        force_ssl: false,
        http2_support: false,
        http3_support: false,
        ignore_invalid_cert: false,
        enabled: true,
        basic_auth_enabled: false,
        basic_auth_username: String::new(),
        basic_auth_password: StoredSecret::Absent,
        advanced_config: String::new(),
    }
}

#[tokio::test]
async fn create_host_publishes_document_to_control_plane() {
    let (addr, captured) = common::start_mock_control_plane(|req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/config/") => (404, "{}".to_string()),
            ("POST", "/load") => (200, String::new()),
            _ => (404, String::new()),
        }
    })
    .await;

    let store = MemoryStore::new();
    let engine = Reconciler::new(
        store.clone(),
        client_for(addr, 0),
        LogAuditSink,
        settings_for(addr),
    );

    engine.create_host(new_host("a.example.com"), Some("admin")).await.unwrap();

    let requests = captured.lock().unwrap().clone();
    let load = requests
        .iter()
        .find(|r| r.method == "POST" && r.path == "/load")
        .expect("document was never POSTed");

    let doc: serde_json::Value = serde_json::from_str(&load.body).unwrap();
    let routes = &doc["apps"]["http"]["servers"]["srv0"]["routes"];
    assert_eq!(routes[0]["match"][0]["host"][0], "a.example.com");
    // No running document: the configured admin listen address goes out.
    assert_eq!(doc["admin"]["listen"], "0.0.0.0:2019");

    assert_eq!(store.select_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn running_admin_block_is_preserved_on_publish() {
    let (addr, captured) = common::start_mock_control_plane(|req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/config/") => (
                200,
                r#"{"admin":{"listen":"127.0.0.1:7777","enforce_origin":true}}"#.to_string(),
            ),
            ("POST", "/load") => (200, String::new()),
            _ => (404, String::new()),
        }
    })
    .await;

    let engine = Reconciler::new(
        MemoryStore::new(),
        client_for(addr, 0),
        LogAuditSink,
        settings_for(addr),
    );
    engine.create_host(new_host("a.example.com"), None).await.unwrap();

    let requests = captured.lock().unwrap().clone();
    let load = requests.iter().find(|r| r.path == "/load").unwrap();
    let doc: serde_json::Value = serde_json::from_str(&load.body).unwrap();
    assert_eq!(doc["admin"]["listen"], "127.0.0.1:7777");
    assert_eq!(doc["admin"]["enforce_origin"], true);
}

#[tokio::test]
async fn publish_retries_transient_failures_until_success() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let (addr, _captured) = common::start_mock_control_plane(move |req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/config/") => (404, String::new()),
            ("POST", "/load") => {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    (500, "temporarily broken".to_string())
                } else {
                    (200, String::new())
                }
            }
            _ => (404, String::new()),
        }
    })
    .await;

    let store = MemoryStore::new();
    let engine = Reconciler::new(
        store.clone(),
        client_for(addr, 3),
        LogAuditSink,
        settings_for(addr),
    );

    engine.create_host(new_host("a.example.com"), None).await.unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.select_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_rolls_back_when_control_plane_is_unreachable() {
    // Bind and immediately drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = MemoryStore::new();
    let engine = Reconciler::new(
        store.clone(),
        client_for(addr, 1),
        LogAuditSink,
        settings_for(addr),
    );

    let err = engine.create_host(new_host("a.example.com"), None).await.unwrap_err();
    match err {
        PanelError::ControlPlane(ControlPlaneError::Unreachable(_)) => {}
        other => panic!("expected unreachable error, got {:?}", other),
    }
    assert!(store.select_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn apply_rejection_carries_status_and_diagnostic_text() {
    let (addr, _captured) = common::start_mock_control_plane(|req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/config/") => (404, String::new()),
            ("POST", "/load") => (400, "unknown field 'bogus'".to_string()),
            _ => (404, String::new()),
        }
    })
    .await;

    let store = MemoryStore::new();
    let engine = Reconciler::new(
        store.clone(),
        client_for(addr, 0),
        LogAuditSink,
        settings_for(addr),
    );

    let err = engine.create_host(new_host("a.example.com"), None).await.unwrap_err();
    match err {
        PanelError::ControlPlane(ControlPlaneError::ApplyRejected { status, detail }) => {
            assert_eq!(status, 400);
            assert!(detail.contains("unknown field"));
        }
        other => panic!("expected apply rejection, got {:?}", other),
    }
    assert!(store.select_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn status_treats_404_as_running_with_nothing_loaded() {
    let (addr, _captured) =
        common::start_mock_control_plane(|_req| (404, String::new())).await;

    let status = client_for(addr, 0).status().await;
    assert!(status.running);
    assert_eq!(status.version, "mock-control-plane/1.0");
    assert!(status.document.is_none());
}

#[tokio::test]
async fn status_reports_not_running_when_all_candidates_fail() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let status = client_for(addr, 0).status().await;
    assert!(!status.running);
}

#[tokio::test]
async fn status_returns_running_document_when_loaded() {
    let (addr, _captured) = common::start_mock_control_plane(|req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/config/") => (200, r#"{"admin":{"listen":":2019"}}"#.to_string()),
            _ => (404, String::new()),
        }
    })
    .await;

    let status = client_for(addr, 0).status().await;
    assert!(status.running);
    let doc = status.document.expect("running document should be returned");
    assert_eq!(doc["admin"]["listen"], ":2019");
}

#[tokio::test]
async fn certificate_status_is_best_effort() {
    let (addr, _captured) = common::start_mock_control_plane(|req| {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/certificates/a.example.com") => (
                200,
                r#"{"subject":"a.example.com","issuer":"Mock CA","not_after":"2026-12-01T00:00:00Z"}"#
                    .to_string(),
            ),
            ("GET", "/certificates/broken.example.com") => {
                (500, "internal server error".to_string())
            }
            _ => (404, String::new()),
        }
    })
    .await;

    let client = client_for(addr, 0);

    let info = client.certificate_status("a.example.com").await.unwrap();
    assert_eq!(info.issuer.as_deref(), Some("Mock CA"));
    assert_eq!(info.subject.as_deref(), Some("a.example.com"));

    // 404 means "no certificate yet", not an error.
    assert!(client.certificate_status("missing.example.com").await.is_none());

    // A failing certificate endpoint must never poison the lookup either.
    assert!(client.certificate_status("broken.example.com").await.is_none());
}
