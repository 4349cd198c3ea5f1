//! Server-sent event stream of monitor events.

use std::convert::Infallible;

use aura_events::MonitorEvent;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Only this machine's events plus fleet-wide ones.
    pub machine_id: Option<String>,
}

/// GET /events
///
/// Each [`MonitorEvent`] is sent with its `event_type` as the SSE event
/// name and the full event as JSON data. Subscribers that fall behind skip
/// the missed events. The stream ends when the server shuts down.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(params): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let shutdown = state.shutdown.clone().cancelled_owned();
    let stream = BroadcastStream::new(state.event_bus.subscribe()).filter_map(move |item| {
        let sse = encode(item, params.machine_id.as_deref());
        async move { sse }
    });

    Sse::new(stream.take_until(shutdown)).keep_alive(KeepAlive::default())
}

fn encode(
    item: Result<MonitorEvent, BroadcastStreamRecvError>,
    machine_id: Option<&str>,
) -> Option<Result<Event, Infallible>> {
    match item {
        Ok(event) if machine_id.is_some_and(|id| !event.concerns(id)) => None,
        Ok(event) => match Event::default().event(event.event_type.clone()).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Event stream subscriber lagged");
            None
        }
    }
}
