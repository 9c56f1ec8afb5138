//! The `/ws` endpoint (§6.2): a small standalone axum server bound to its
//! own `ws_port`, independent of forge's query/mutation HTTP server on
//! `listen_port`. Forge's routing macros cover JSON request/response
//! endpoints (§6.1); the WebSocket upgrade and the Broadcast Hub fan-out it
//! carries are core per §2 item 5, so they are wired by hand here rather
//! than assumed into forge's surface.

use crate::hub::{BroadcastEvent, BroadcastHub, BroadcastKind};
use axum::{
    Router,
    extract::State,
    extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
struct RealtimeState {
    hub: Arc<BroadcastHub>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Ping,
    Subscribe {
        #[serde(default)]
        payload: Option<serde_json::Value>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Pong,
    SubscribeAck,
    Message { payload: serde_json::Value },
    ConversationUpdate { payload: serde_json::Value },
    QrCode { payload: serde_json::Value },
    ConnectionStatus { payload: serde_json::Value },
}

fn wrap_broadcast(event: BroadcastEvent) -> ServerFrame {
    let payload = serde_json::json!({
        "type": event.kind,
        "inboxId": event.inbox_id,
        "data": event.data,
    });
    match event.kind {
        BroadcastKind::Message => ServerFrame::Message { payload },
        BroadcastKind::ConversationUpdate => ServerFrame::ConversationUpdate { payload },
        BroadcastKind::Qr => ServerFrame::QrCode { payload },
        BroadcastKind::ConnectionStatus => ServerFrame::ConnectionStatus { payload },
    }
}

/// Builds and serves the websocket listener. The returned task runs until
/// aborted by the caller — there is no internal shutdown signal, matching
/// `BroadcastHub`'s own worker (§5 "every acquired resource has a paired
/// release on every exit path").
pub fn spawn(hub: Arc<BroadcastHub>, port: u16) -> tokio::task::JoinHandle<()> {
    let state = RealtimeState { hub };
    let app = Router::new().route("/ws", get(ws_upgrade)).with_state(state);

    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{port}");
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(%addr, error = %e, "failed to bind websocket listener");
                return;
            }
        };
        tracing::info!(%addr, "websocket listener bound");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "websocket server exited");
        }
    })
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<RealtimeState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// No per-client state beyond the connection handle (§6.2): `ping` gets a
/// `pong`, `subscribe` gets an ack, and every Broadcast Hub delta this
/// client is still subscribed to is forwarded as it arrives.
async fn handle_socket(mut socket: WebSocket, hub: Arc<BroadcastHub>) {
    let mut subscription = hub.subscribe().await;
    let sub_id = subscription.id;

    loop {
        tokio::select! {
            event = subscription.rx.recv() => {
                let Some(event) = event else { break };
                if send_frame(&mut socket, &wrap_broadcast(event)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) {
                            let reply = match frame {
                                ClientFrame::Ping => ServerFrame::Pong,
                                ClientFrame::Subscribe { .. } => ServerFrame::SubscribeAck,
                            };
                            if send_frame(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    hub.unsubscribe(sub_id).await;
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_default();
    socket.send(WsMessage::Text(text.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn wraps_message_event_with_matching_outer_and_inner_type() {
        let event = BroadcastEvent {
            kind: BroadcastKind::Qr,
            inbox_id: Uuid::nil(),
            data: serde_json::json!({"qr_code": "data:image/png;base64,x"}),
        };
        let frame = wrap_broadcast(event);
        let encoded = serde_json::to_value(&frame).unwrap();
        assert_eq!(encoded["type"], "qr_code");
        assert_eq!(encoded["payload"]["type"], "qr");
    }
}
