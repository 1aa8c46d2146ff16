//! `/ws`: pushes reload notices to browser clients.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;

use super::AppState;
use super::watcher::reload_message;
use crate::commands::{BuildInfo, PROJECT_NAME};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn hello_message() -> String {
    serde_json::json!({
        "type": "hello",
        "name": PROJECT_NAME,
        "version": BuildInfo::current().version,
    })
    .to_string()
}

/// Message to forward for one broadcast receive, `None` once the channel closed.
///
/// A client that falls behind the broadcast buffer gets a single reload
/// notice in place of the ones it missed.
fn notice(update: Result<String, RecvError>) -> Option<String> {
    match update {
        Ok(message) => Some(message),
        Err(RecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "WebSocket client lagged");
            Some(reload_message())
        }
        Err(RecvError::Closed) => None,
    }
}

/// Relay notices to one client until it disconnects or the channel closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.update_tx.subscribe();
    tracing::debug!("WebSocket client connected");

    if sender.send(Message::Text(hello_message())).await.is_err() {
        return;
    }

    loop {
        let outgoing = tokio::select! {
            update = updates.recv() => match notice(update) {
                Some(message) => message,
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // axum answers pings; anything else from the client is ignored
                Some(Ok(_)) => continue,
            },
        };
        if sender.send(Message::Text(outgoing)).await.is_err() {
            break;
        }
    }
    tracing::debug!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use crate::test_utils::TestEnv;
    use serde_json::Value;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    #[test]
    fn test_notice_passes_messages_through() {
        assert_eq!(notice(Ok("hi".to_string())).as_deref(), Some("hi"));
        assert_eq!(notice(Err(RecvError::Closed)), None);
    }

    #[test]
    fn test_lagged_client_gets_one_reload() {
        let message = notice(Err(RecvError::Lagged(42))).unwrap();
        let json: Value = serde_json::from_str(&message).unwrap();
        assert_eq!(json["type"], "reload");
    }

    #[tokio::test]
    async fn test_socket_greets_then_relays_updates() {
        let env = TestEnv::new();
        let state = AppState::new(env.settings(), env.init_storage());
        let updates = state.update_tx.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();

        let hello = socket.next().await.unwrap().unwrap().into_text().unwrap();
        let hello: Value = serde_json::from_str(&hello).unwrap();
        assert_eq!(hello["type"], "hello");
        assert_eq!(hello["name"], PROJECT_NAME);

        updates.send(reload_message()).unwrap();
        let update = socket.next().await.unwrap().unwrap();
        let WsMessage::Text(text) = update else {
            panic!("expected a text frame, got {:?}", update);
        };
        let update: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(update["type"], "reload");
    }
}
