//! GET /events - switch events as Server-Sent Events

use super::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::debug;

pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");
    evs_common::sse::create_event_sse_stream("evs-player", ctx.orchestrator.subscribe_events())
}
