//! Server-Sent Events feed of feedback frames.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use iopanel_app::ports::OutputDriver;
use iopanel_app::services::ConnectionManager;
use iopanel_domain::id::ObserverId;

use crate::state::AppState;

/// Frames queued for one SSE observer.
///
/// Deregisters the observer when dropped, which happens once the response
/// body is dropped.
struct Subscription {
    frames: ReceiverStream<Arc<str>>,
    connections: ConnectionManager,
    id: ObserverId,
}

impl Subscription {
    fn open(connections: ConnectionManager) -> Self {
        let session = connections.connect();
        Self {
            frames: ReceiverStream::new(session.receiver),
            connections,
            id: session.id,
        }
    }
}

impl Stream for Subscription {
    type Item = Arc<str>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.connections.disconnect(self.id);
    }
}

/// `GET /api/feedback/stream`: every feedback frame as an SSE `data:` event.
///
/// The client is registered as an observer like any WebSocket client: it
/// gets frames published after it connects and is dropped if it falls behind.
/// The stream ends when the client disconnects or the hub drops it.
pub async fn stream<D: OutputDriver + 'static>(
    State(state): State<AppState<D>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let frames = Subscription::open(state.connections.clone())
        .map(|frame| Ok(Event::default().data(&*frame)));

    Sse::new(frames).keep_alive(KeepAlive::default())
}
