//! End-to-end tests for the live WebSocket channel against a real listener.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures::StreamExt;
use serde_json::json;
use sqlx::SqlitePool;
use tokio_tungstenite::tungstenite::Message;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Serve the test app on an ephemeral port.
async fn serve(ctx: &common::TestContext) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = ctx.app();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/ws"))
        .await
        .expect("WebSocket handshake");
    client
}

/// Next text frame as JSON, skipping pings.
async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(10), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("frame error");
        match frame {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

/// Wait until the broadcaster has `n` subscribers.
async fn wait_for_subscribers(ctx: &common::TestContext, n: usize) {
    for _ in 0..100 {
        if ctx.state.broadcaster.subscriber_count() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {n} subscribers");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn client_receives_greeting_on_connect(pool: SqlitePool) {
    let ctx = common::setup(pool).await;
    let addr = serve(&ctx).await;

    let mut client = connect(addr).await;
    let greeting = next_json(&mut client).await;
    assert_eq!(
        greeting,
        json!({"type": "connected", "data": {"status": "Connected to dashboard"}})
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ingested_metrics_reach_every_client(pool: SqlitePool) {
    let ctx = common::setup(pool).await;
    let addr = serve(&ctx).await;

    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_json(&mut first).await;
    next_json(&mut second).await;
    wait_for_subscribers(&ctx, 2).await;

    let body = json!({"device_name": "gpu-box", "metrics": {"cpu_usage": 77.0}});
    let response = common::post_json(ctx.app(), "/api/metrics", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    for client in [&mut first, &mut second] {
        let event = next_json(client).await;
        assert_eq!(event["type"], "metrics_update");
        assert_eq!(event["data"]["device_name"], "gpu-box");
        assert_eq!(event["data"]["metrics"]["cpu_usage"], 77.0);
        assert!(event["data"]["metrics"]["gpu_usage"].is_null());
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn script_events_are_streamed_in_order(pool: SqlitePool) {
    let ctx = common::setup(pool).await;
    let addr = serve(&ctx).await;

    let mut client = connect(addr).await;
    next_json(&mut client).await;
    wait_for_subscribers(&ctx, 1).await;

    common::post_empty(ctx.app(), "/api/scripts/hello/execute").await;

    let mut types = Vec::new();
    loop {
        let event = next_json(&mut client).await;
        let kind = event["type"].as_str().unwrap().to_string();
        types.push(kind.clone());
        if kind == "script_finished" {
            assert_eq!(event["data"]["success"], true);
            break;
        }
    }
    assert_eq!(
        types,
        vec!["script_log", "script_log", "script_log", "script_finished"]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disconnect_unsubscribes(pool: SqlitePool) {
    let ctx = common::setup(pool).await;
    let addr = serve(&ctx).await;

    let mut client = connect(addr).await;
    next_json(&mut client).await;
    wait_for_subscribers(&ctx, 1).await;

    client.close(None).await.unwrap();
    wait_for_subscribers(&ctx, 0).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn close_all_closes_the_socket(pool: SqlitePool) {
    let ctx = common::setup(pool).await;
    let addr = serve(&ctx).await;

    let mut client = connect(addr).await;
    next_json(&mut client).await;
    wait_for_subscribers(&ctx, 1).await;

    ctx.state.broadcaster.close_all();

    let frame = tokio::time::timeout(Duration::from_secs(10), client.next())
        .await
        .expect("timed out waiting for close");
    assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
}
