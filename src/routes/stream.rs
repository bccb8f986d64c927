use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;

use crate::common::AppState;
use crate::render;
use crate::signals::Signal;

/// Live figure updates as Server-Sent Events.
///
/// Each subscriber first receives the current figure of every signal, then one
/// event per buffer update. The event name is the signal slug and the data is
/// the re-rendered figure.
pub async fn stream_figures(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let per_signal = Signal::ALL.into_iter().map(|signal| {
        // WatchStream yields the current value first
        WatchStream::new(state.feeds.receiver(signal))
            .map(move |buffer| {
                Event::default()
                    .event(signal.slug())
                    .json_data(render::render(signal, &buffer))
            })
            .boxed()
    });

    tracing::debug!("Figure stream subscriber connected");

    Sse::new(stream::select_all(per_signal)).keep_alive(KeepAlive::default())
}
