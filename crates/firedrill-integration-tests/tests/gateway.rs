//! Drills played over the JSON-RPC gateway.

mod common;

use std::time::Duration;

use firedrill_config::GatewaySection;
use firedrill_core::{IncidentPhase, Persona, Region, WorkflowState};
use firedrill_events::SimEvent;
use firedrill_gateway::{GatewayServer, IncidentRpcClient};
use firedrill_narration::Narrator;
use firedrill_runtime::{IncidentRuntime, RuntimeConfig};
use firedrill_test::calm_random;
use jsonrpsee::core::client::Subscription;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};

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

async fn next(events: &mut Subscription<SimEvent>) -> SimEvent {
    tokio::time::timeout(Duration::from_secs(5), events.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap()
}

async fn command(client: &WsClient, line: &str) -> String {
    let mut parts = line.split_whitespace().map(str::to_string);
    let name = parts.next().unwrap();
    let result = client
        .execute_command(name, parts.collect())
        .await
        .unwrap();
    assert!(result.success, "{line}: {}", result.output);
    result.output
}

#[tokio::test]
async fn drill_over_websocket() {
    let server = start().await;
    let client = connect(&server).await;
    let runtime = server.runtime().clone();

    for region in Region::ALL {
        command(&client, &format!("alert sre {region}")).await;
        runtime.wait_for_narration().await;

        // The required patch shows in the view once investigated.
        let view = client.get_state().await.unwrap();
        let required = view
            .regions
            .iter()
            .find(|r| r.region == region)
            .and_then(|r| r.required_patch.clone())
            .unwrap();
        command(&client, &format!("patch {region} {required}")).await;
        common::settle(&runtime, region).await;
    }

    let view = client.get_state().await.unwrap();
    assert!(view.security_phase_active);
    assert_eq!(view.ai_persona, Persona::Security);

    for region in Region::ALL {
        while runtime
            .with_session(|s| s.region(region).state())
            .await
            == WorkflowState::SecurityReview
        {
            command(&client, &format!("verify {region}")).await;
        }
    }

    command(&client, "resolve").await;
    let closed = command(&client, "resolve").await;
    assert!(closed.starts_with("Incident resolved in"));

    let view = client.get_state().await.unwrap();
    assert!(view.resolved);
    assert_eq!(view.phase, IncidentPhase::Resolved);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn observers_share_one_incident() {
    let server = start().await;
    let operator = connect(&server).await;
    let watcher = connect(&server).await;

    let mut events = watcher.subscribe_events().await.unwrap();
    assert!(matches!(next(&mut events).await, SimEvent::System { .. }));
    assert!(matches!(next(&mut events).await, SimEvent::StateUpdate { .. }));

    command(&operator, "alert sre apac").await;

    // The watcher sees the operator's investigation land.
    let mut investigated = false;
    for _ in 0..20 {
        if let SimEvent::StateUpdate { state } = next(&mut events).await {
            let apac = state.regions.iter().find(|r| r.region == Region::Apac);
            if apac.is_some_and(|r| r.investigation_complete) {
                investigated = true;
                break;
            }
        }
    }
    assert!(investigated);

    let seen_by_operator = operator.get_state().await.unwrap();
    let seen_by_watcher = watcher.get_state().await.unwrap();
    assert_eq!(seen_by_operator.id, seen_by_watcher.id);

    events.unsubscribe().await.unwrap();
    server.stop().await.unwrap();
}
