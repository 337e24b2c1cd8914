use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use llmdash_events::{DashboardEvent, EventBroadcaster};

use crate::state::AppState;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

const GREETING: &str = "Connected to dashboard";

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.broadcaster))
}

/// Manage a single WebSocket connection after upgrade.
///
/// The connection subscribes to the broadcaster, greets the client, then
/// multiplexes three sources until one of them ends:
///   1. broadcaster events, forwarded as text frames;
///   2. inbound frames (only `Close` matters, the channel is push-only);
///   3. the heartbeat ticker.
///
/// When the broadcaster drops the subscription (queue overflow or
/// shutdown) the socket is closed with a close frame.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<EventBroadcaster>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let mut subscription = broadcaster.subscribe();
    tracing::info!(conn_id = %conn_id, subscriber_id = subscription.id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let greeting = DashboardEvent::Connected {
        status: GREETING.to_string(),
    };
    if send_event(&mut sink, &greeting).await.is_err() {
        broadcaster.unsubscribe(subscription.id);
        return;
    }

    let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    // The first tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
                        break;
                    }
                }
                None => {
                    tracing::info!(conn_id = %conn_id, "Subscription ended, closing WebSocket");
                    let frame = CloseFrame {
                        code: close_code::AWAY,
                        reason: "event stream closed".into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(conn_id = %conn_id, "Pong received");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            _ = heartbeat.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    broadcaster.unsubscribe(subscription.id);
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Serialize `event` and send it as a text frame.
async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &DashboardEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, event_type = event.event_type(), "Failed to serialize event");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await
}
