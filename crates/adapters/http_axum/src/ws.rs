//! WebSocket transport for the sync protocol.
//!
//! Each socket is one observer. Inbound text frames are handed to the command
//! interpreter; feedback frames queued for the observer are written back as
//! text frames. Pings are answered by the transport itself and binary frames
//! are ignored. A close frame or transport error ends the connection.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;

use iopanel_app::ports::OutputDriver;

use crate::state::AppState;

/// `GET /ws`: upgrade to the sync protocol.
pub async fn upgrade<D: OutputDriver + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<D>>,
) -> Response {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session<D: OutputDriver + 'static>(mut socket: WebSocket, state: AppState<D>) {
    let mut observer = state.connections.connect();

    loop {
        tokio::select! {
            frame = observer.receiver.recv() => {
                let Some(frame) = frame else {
                    tracing::debug!(observer = %observer.id, "observer dropped by hub");
                    break;
                };
                if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                    tracing::debug!(observer = %observer.id, "websocket send failed");
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => state.interpreter.receive(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(observer = %observer.id, "websocket closed by client");
                        break;
                    }
                    Some(Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Err(err)) => {
                        tracing::debug!(observer = %observer.id, %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    observer.liveness.mark_closed();
    state.connections.disconnect(observer.id);
}
