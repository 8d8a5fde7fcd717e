//! WebSocket handler for live slot synchronization.
//!
//! Each socket gets two tasks: the read loop below, which decodes client
//! updates and hands them to the engine, and a writer task that drains the
//! connection's outbox onto the socket. Whichever ends first ends both.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::server::state::AppState;
use crate::sync::{Connection, ConnectionId, Outbox};

/// WebSocket upgrade handler.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
            .on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected WebSocket handshake");
            rejection.into_response()
        }
    }
}

/// Handles an individual WebSocket connection from admission to close.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let engine = &state.engine;
    let (conn, outbox) = Connection::open(engine.registry().next_id());
    let id = conn.id();

    // Register and queue the snapshot before anything else can be sent
    if let Err(e) = engine.admit(&conn) {
        tracing::warn!(conn = id, error = %e, "Failed to admit connection");
        return;
    }
    tracing::info!(
        conn = id,
        connections = engine.registry().len(),
        "Client connected"
    );

    let (sender, mut receiver) = socket.split();
    let mut writer = tokio::spawn(write_loop(sender, outbox, state.config.write_timeout, id));

    let writer_done = tokio::select! {
        _ = read_loop(&mut receiver, &state, &conn) => false,
        _ = &mut writer => true,
    };

    engine.depart(&conn);
    if !writer_done {
        let _ = writer.await;
    }

    tracing::info!(
        conn = id,
        connections = engine.registry().len(),
        "Client disconnected"
    );
}

/// Reads client frames until the peer closes or the socket fails.
async fn read_loop(receiver: &mut SplitStream<WebSocket>, state: &AppState, conn: &Connection) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(conn = conn.id(), error = %e, "Read failed");
                return;
            }
        };

        match msg {
            Message::Text(text) => match state.engine.codec().decode_update(&text) {
                Ok(frame) => {
                    state.engine.apply(&frame, Some(conn.id()));
                }
                Err(e) => {
                    tracing::warn!(conn = conn.id(), error = %e, "Discarding client message");
                }
            },
            Message::Binary(_) => {
                tracing::warn!(conn = conn.id(), "Discarding binary message");
            }
            Message::Close(_) => return,
            // Pong is handled automatically by axum
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Drains the outbox onto the socket, bounding each write by `write_timeout`.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbox: Outbox,
    write_timeout: Duration,
    id: ConnectionId,
) {
    while let Some(payload) = outbox.next().await {
        let write = sender.send(Message::Text(payload.to_string()));
        match tokio::time::timeout(write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(conn = id, error = %e, "Write failed");
                break;
            }
            Err(_) => {
                tracing::info!(conn = id, "Write timed out");
                break;
            }
        }
    }

    // Later fan-outs to this connection now fail and evict it
    outbox.close();
    let _ = tokio::time::timeout(write_timeout, sender.send(Message::Close(None))).await;
}
