use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use pin_project::{pin_project, pinned_drop};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{callback, registry::SharedRegistry, CallbackId, Event, EventKind};

/// Events of one kind, as a [`Stream`].
///
/// The stream ends when the service's callbacks are reset, for example by
/// [`close`](crate::WebsocketService::close). Dropping the stream unbinds it.
#[pin_project(PinnedDrop)]
pub struct EventStream {
    #[pin]
    stream: UnboundedReceiverStream<Event>,
    registry: SharedRegistry,
    id: CallbackId,
}

impl EventStream {
    pub(crate) fn bind(registry: &SharedRegistry, kind: EventKind) -> Self {
        let (send, recv) = mpsc::unbounded_channel();
        let forward = callback(move |event| {
            // The receiver only goes away while the stream is being dropped.
            send.send(event.clone()).unwrap_or(());
        });
        let id = registry.lock().insert(kind, forward);

        Self {
            stream: UnboundedReceiverStream::new(recv),
            registry: registry.clone(),
            id,
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }
}

#[pinned_drop]
impl PinnedDrop for EventStream {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        this.registry.lock().unbind(*this.id);
    }
}
