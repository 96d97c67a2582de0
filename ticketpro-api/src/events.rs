use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/events/stream", get(stream_events))
}

/// Live feed of every back-office event. Lagging subscribers skip what they missed.
async fn stream_events(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        let event = result.ok()?;
        match Event::default().event(event.name()).json_data(&event) {
            Ok(sse_event) => Some(Ok(sse_event)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
