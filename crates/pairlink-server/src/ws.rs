//! Real-time channel over WebSocket.
//!
//! Each socket gets a fresh [`ConnectionId`] and an outbox on the relay. A
//! forwarding task drains the outbox into the socket while the receive loop
//! dispatches incoming events. When the socket closes the connection is
//! resolved as desktop, mobile or neither and cleaned up.

use crate::server::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use pairlink_core::{
    ClientEvent, ConnectionId, DesktopBinding, Disconnect, LinkDelivery, PairlinkError, Relay,
    ServerEvent,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();
    let mut outbox = state.relay.register(conn).await;
    info!("Client connected: {}", conn);

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match ClientEvent::parse(&text) {
                Ok(event) => handle_client_event(&state, conn, event).await,
                Err(e) => debug!("Ignoring frame from {}: {}", conn, e),
            },
            Message::Close(_) => break,
            // Pong is handled automatically by axum
            _ => {}
        }
    }

    state.relay.unregister(conn).await;
    send_task.abort();

    match state.manager.handle_disconnect(conn).await {
        Ok(Disconnect::Unknown) => info!("Client disconnected: {}", conn),
        Ok(_) => {}
        Err(e) => error!("Error in disconnect handler for {}: {}", conn, e),
    }
}

/// Dispatch one event from `conn`. Replies go out through the relay.
pub async fn handle_client_event(state: &AppState, conn: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::DesktopConnect { code } => {
            if let Err(e) = state
                .manager
                .obtain_desktop_session(DesktopBinding::Live(conn), code.as_deref())
                .await
            {
                error!("Error in desktop:connect: {}", e);
                reply(
                    state,
                    conn,
                    ServerEvent::DesktopError {
                        message: "Failed to generate code".to_string(),
                    },
                )
                .await;
            }
        }

        ClientEvent::MobileValidate { code } => {
            let event = match state.manager.validate_and_link_mobile(&code, conn).await {
                Ok(pairing) => ServerEvent::MobilePaired {
                    code: pairing.code.to_string(),
                    success: true,
                },
                Err(e) => mobile_error(e, "Failed to validate code"),
            };
            reply(state, conn, event).await;
        }

        ClientEvent::MobileSubmitLink { link } => {
            let event = match state.manager.submit_link_from_mobile(conn, &link).await {
                Ok((_, LinkDelivery::Delivered)) => ServerEvent::LinkSent { success: true },
                // Stored for the desktop's next connection
                Ok((_, LinkDelivery::StoredOnly)) => ServerEvent::MobileError {
                    message: "Desktop not connected".to_string(),
                },
                Err(e) => mobile_error(e, "Failed to submit link"),
            };
            reply(state, conn, event).await;
        }
    }
}

fn mobile_error(err: PairlinkError, fallback: &'static str) -> ServerEvent {
    let message = if err.is_client_error() {
        err.public_message()
    } else {
        error!("{}: {}", fallback, err);
        fallback
    };
    ServerEvent::MobileError {
        message: message.to_string(),
    }
}

async fn reply(state: &AppState, conn: ConnectionId, event: ServerEvent) {
    state.relay.deliver(conn, event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairlink_core::{MemoryStore, PairingConfig};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            PairingConfig::default(),
            "secret",
        )
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn connect_desktop(
        state: &AppState,
    ) -> (ConnectionId, String, UnboundedReceiver<ServerEvent>) {
        let conn = ConnectionId::new();
        let mut rx = state.relay.register(conn).await;
        handle_client_event(state, conn, ClientEvent::DesktopConnect { code: None }).await;
        let code = match drain(&mut rx).as_slice() {
            [ServerEvent::DesktopCode { code }] => code.clone(),
            other => panic!("unexpected events: {:?}", other),
        };
        (conn, code, rx)
    }

    #[tokio::test]
    async fn test_mobile_flow() {
        let state = state();
        let (_desktop, code, mut desktop_rx) = connect_desktop(&state).await;

        let mobile = ConnectionId::new();
        let mut mobile_rx = state.relay.register(mobile).await;
        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileValidate { code: code.clone() },
        )
        .await;
        assert_eq!(
            drain(&mut mobile_rx),
            vec![ServerEvent::MobilePaired {
                code: code.clone(),
                success: true
            }]
        );

        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileSubmitLink {
                link: "https://example.com".into(),
            },
        )
        .await;
        assert_eq!(
            drain(&mut mobile_rx),
            vec![ServerEvent::LinkSent { success: true }]
        );
        assert_eq!(
            drain(&mut desktop_rx),
            vec![
                ServerEvent::MobileConnected { code },
                ServerEvent::DesktopLink {
                    link: "https://example.com".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mobile_errors() {
        let state = state();
        let mobile = ConnectionId::new();
        let mut rx = state.relay.register(mobile).await;

        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileSubmitLink {
                link: "https://example.com".into(),
            },
        )
        .await;
        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileValidate {
                code: "abc".into(),
            },
        )
        .await;
        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileValidate {
                code: "ZZZZZZ".into(),
            },
        )
        .await;

        let messages: Vec<_> = drain(&mut rx)
            .into_iter()
            .map(|event| match event {
                ServerEvent::MobileError { message } => message,
                other => panic!("unexpected event: {:?}", other),
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                "Not paired. Please enter code again.",
                "Invalid code format",
                "Code not found or expired",
            ]
        );
    }

    #[tokio::test]
    async fn test_link_to_unreachable_desktop_is_stored() {
        let state = state();
        let (desktop, code, _desktop_rx) = connect_desktop(&state).await;
        state.relay.unregister(desktop).await;

        let mobile = ConnectionId::new();
        let mut rx = state.relay.register(mobile).await;
        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileValidate { code: code.clone() },
        )
        .await;
        handle_client_event(
            &state,
            mobile,
            ClientEvent::MobileSubmitLink {
                link: "https://example.com".into(),
            },
        )
        .await;

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&ServerEvent::MobileError {
                message: "Desktop not connected".into()
            })
        );
        let code = pairlink_core::PairingCode::parse(&code).unwrap();
        assert_eq!(
            state.manager.link(&code).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn test_desktop_connect_twice_keeps_code() {
        let state = state();
        let (desktop, code, mut rx) = connect_desktop(&state).await;
        handle_client_event(&state, desktop, ClientEvent::DesktopConnect { code: None }).await;
        assert_eq!(drain(&mut rx), vec![ServerEvent::DesktopCode { code }]);
    }
}
