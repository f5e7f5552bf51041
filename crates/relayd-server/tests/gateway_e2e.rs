//! End-to-end tests: control client through the gateway to a fake module.

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::UnixListener;

use relayd_control::client::ControlClient;
use relayd_control::types::{Request, Zone};
use relayd_server::gateway::Gateway;
use relayd_test_utils::fake_module::{FailureMode, FakeConnector};

const LONG_DRIFT: Duration = Duration::from_secs(600);
const LONG_IDLE: Duration = Duration::from_secs(600);

fn test_socket(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("relayd-test-{}-{}.sock", std::process::id(), name))
}

fn spawn_gateway(
    name: &str,
    connector: FakeConnector,
    idle_disconnect: Duration,
) -> (PathBuf, tokio::task::JoinHandle<()>) {
    let path = test_socket(name);
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path).unwrap();
    let mut gateway = Gateway::with_connector(connector, LONG_DRIFT, idle_disconnect);
    let handle = tokio::spawn(async move {
        let _ = gateway.serve(&listener).await;
    });
    (path, handle)
}

#[tokio::test]
async fn set_request_reaches_the_module() {
    let connector = FakeConnector::new("admin", "admin");
    let (path, server) = spawn_gateway("set", connector.clone(), LONG_IDLE);

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    let response = client.set_zones(vec![Zone::on(3)]).await.unwrap();
    assert!(response.result);
    assert_eq!(connector.written(), vec![0x08]);
    assert_eq!(connector.connects(), 1);

    server.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn repeated_set_reuses_session_and_skips_redundant_writes() {
    let connector = FakeConnector::new("admin", "admin");
    let (path, server) = spawn_gateway("repeat", connector.clone(), LONG_IDLE);

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    assert!(client.set_zones(vec![Zone::on(1)]).await.unwrap().result);
    assert!(client.set_zones(vec![Zone::on(1)]).await.unwrap().result);
    assert!(client.set_zones(vec![Zone::on(4)]).await.unwrap().result);

    // Second request matched the belief, only two writes went out.
    assert_eq!(connector.written(), vec![0x02, 0x12]);
    assert_eq!(connector.connects(), 1);

    server.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn count_reports_output_geometry_without_a_session() {
    let connector = FakeConnector::new("admin", "admin");
    let (path, server) = spawn_gateway("count", connector.clone(), LONG_IDLE);

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    let response = client.count("bo").await.unwrap();
    assert!(response.result);
    assert_eq!(response.count, Some(8));

    let response = client.count("bi").await.unwrap();
    assert!(response.result);
    assert_eq!(response.count, Some(0));

    // Counting never touches the module.
    assert_eq!(connector.connects(), 0);

    server.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let connector = FakeConnector::new("admin", "admin");
    let (path, server) = spawn_gateway("unknown", connector, LONG_IDLE);

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    let mut request = Request::set(vec![Zone::on(0)]);
    request.method = "toggle".to_string();
    let response = client.send(&request).await.unwrap();
    assert!(!response.result);
    assert!(response.error.is_some());

    server.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn login_failure_surfaces_to_the_client() {
    let connector = FakeConnector::new("admin", "admin")
        .with_failures(vec![FailureMode::DenyLogin]);
    let (path, server) = spawn_gateway("deny", connector.clone(), LONG_IDLE);

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    let response = client.set_zones(vec![Zone::on(0)]).await.unwrap();
    assert!(!response.result);
    assert!(response.error.is_some());
    assert!(connector.written().is_empty());

    // Next attempt gets a fresh, healthy connection.
    let response = client.set_zones(vec![Zone::on(0)]).await.unwrap();
    assert!(response.result);
    assert_eq!(connector.written(), vec![0x01]);
    assert_eq!(connector.connects(), 2);

    server.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn idle_expiry_drops_the_session_and_next_request_reconnects() {
    let connector = FakeConnector::new("admin", "admin");
    let (path, server) = spawn_gateway("idle", connector.clone(), Duration::from_millis(100));

    {
        let mut client = ControlClient::connect_path(&path).await.unwrap();
        assert!(client.set_zones(vec![Zone::on(2)]).await.unwrap().result);
    }

    // Let the accept wait expire and close the module session.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut client = ControlClient::connect_path(&path).await.unwrap();
    assert!(client.set_zones(vec![Zone::on(5)]).await.unwrap().result);
    assert_eq!(connector.connects(), 2);
    // The belief survives the disconnect, so relay 2 stays merged in.
    assert_eq!(connector.written(), vec![0x04, 0x24]);

    server.abort();
    let _ = std::fs::remove_file(&path);
}
