use std::time::Duration;

use firedrill_config::GatewaySection;
use firedrill_events::SimEvent;
use firedrill_narration::Narrator;
use firedrill_runtime::{IncidentRuntime, RuntimeConfig};
use firedrill_test::calm_random;
use jsonrpsee::core::ClientError;
use jsonrpsee::core::client::Subscription;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};

use super::GatewayServer;
use crate::rpc::{IncidentRpcClient, MAX_INPUT_LEN, error_codes};

async fn start() -> GatewayServer {
    let runtime = IncidentRuntime::with_random(
        RuntimeConfig::default(),
        Narrator::disabled(),
        Box::new(calm_random()),
    );
    let section = GatewaySection {
        port: 0,
        ..GatewaySection::default()
    };
    GatewayServer::start(runtime, &section).await.unwrap()
}

async fn connect(server: &GatewayServer) -> WsClient {
    WsClientBuilder::default()
        .connection_timeout(Duration::from_secs(5))
        .build(server.url())
        .await
        .unwrap()
}

async fn wait_for_clock(server: &GatewayServer, running: bool) {
    for _ in 0..100 {
        if server.runtime().clock_running().await == running {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("clock never reached running = {running}");
}

async fn next(events: &mut Subscription<SimEvent>) -> SimEvent {
    tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

fn error_code(err: &ClientError) -> Option<i32> {
    match err {
        ClientError::Call(e) => Some(e.code()),
        _ => None,
    }
}

#[tokio::test]
async fn commands_round_trip() {
    let server = start().await;
    let client = connect(&server).await;

    let status = client.execute_command("status".into(), vec![]).await.unwrap();
    assert!(status.success);
    assert!(status.output.contains("CVE-2024-8765"));

    let rejected = client
        .execute_command("patch".into(), vec!["mars".into(), "6.6.0-2".into()])
        .await
        .unwrap();
    assert!(!rejected.success);

    let state = client.get_state().await.unwrap();
    assert_eq!(state.id, server.runtime().state().await.id);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_requests_are_rpc_errors() {
    let server = start().await;
    let client = connect(&server).await;

    let empty = client.execute_command("  ".into(), vec![]).await.unwrap_err();
    assert_eq!(error_code(&empty), Some(error_codes::INVALID_REQUEST));

    let long = "x".repeat(MAX_INPUT_LEN + 1);
    let too_long = client.send_message(long).await.unwrap_err();
    assert_eq!(error_code(&too_long), Some(error_codes::INVALID_REQUEST));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn subscribers_are_greeted_and_drive_the_clock() {
    let server = start().await;
    let client = connect(&server).await;
    assert!(!server.runtime().clock_running().await);

    let mut events = client.subscribe_events().await.unwrap();
    assert!(matches!(next(&mut events).await, SimEvent::System { .. }));
    assert!(matches!(next(&mut events).await, SimEvent::StateUpdate { .. }));
    wait_for_clock(&server, true).await;

    client
        .execute_command("alert".into(), vec!["sre".into(), "us-east".into()])
        .await
        .unwrap();
    assert!(matches!(next(&mut events).await, SimEvent::StateUpdate { .. }));

    events.unsubscribe().await.unwrap();
    wait_for_clock(&server, false).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn reset_over_rpc_replaces_the_session() {
    let server = start().await;
    let client = connect(&server).await;
    let before = client.get_state().await.unwrap().id;

    client.reset().await.unwrap();

    assert_ne!(client.get_state().await.unwrap().id, before);
    server.stop().await.unwrap();
}
