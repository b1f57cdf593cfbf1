//! Event channel bridging the pump thread and async consumers
//!
//! The pump thread is the sole producer; the application attaches zero or
//! more consumers. The channel is bounded: when no consumer is draining,
//! `EventSink::send` blocks the pump thread. That is deliberate
//! backpressure, and it means a stalled consumer stalls message pumping for
//! the whole endpoint.

use crate::error::{Error, Result};
use crate::event::EventInfo;
use async_channel::{Receiver, Sender, bounded};

/// Producer side, held by the dispatcher on the pump thread.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<EventInfo>,
}

impl EventSink {
    /// Send one event, blocking until a consumer makes room.
    ///
    /// Fails only once the stream side is fully closed.
    pub fn send(&self, event: EventInfo) -> Result<()> {
        self.tx
            .send_blocking(event)
            .map_err(|e| Error::Channel(e.to_string()))
    }
}

/// Consumer side. Clone freely; each event is delivered to exactly one
/// receiver, in the order sent.
#[derive(Debug, Clone)]
pub struct EventStream {
    rx: Receiver<EventInfo>,
}

impl EventStream {
    /// Receive the next event from an async context.
    ///
    /// Errors only after the pump has exited and every sink is dropped,
    /// which is the channel's terminal state.
    pub async fn recv(&self) -> Result<EventInfo> {
        self.rx
            .recv()
            .await
            .map_err(|e| Error::Channel(e.to_string()))
    }

    /// Receive the next event from a sync context.
    pub fn recv_blocking(&self) -> Result<EventInfo> {
        self.rx
            .recv_blocking()
            .map_err(|e| Error::Channel(e.to_string()))
    }

    /// True when no events are currently buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the bounded event channel.
///
/// Returns (EventSink for the pump thread, EventStream for consumers).
pub fn create_event_channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = bounded(capacity.max(1));
    (EventSink { tx }, EventStream { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventInfo, EventType};
    use wire::Guid;

    fn event(name: &str) -> EventInfo {
        EventInfo {
            device_type: 5,
            class_guid: Guid::NIL,
            device_name: name.into(),
            event_type: EventType::Arrival,
        }
    }

    #[tokio::test]
    async fn test_thread_to_async_bridge() {
        let (sink, stream) = create_event_channel(16);

        let handle = std::thread::spawn(move || {
            sink.send(event("first")).unwrap();
            sink.send(event("second")).unwrap();
        });

        assert_eq!(stream.recv().await.unwrap().device_name, "first");
        assert_eq!(stream.recv().await.unwrap().device_name, "second");
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_stream_closes_after_last_sink_drops() {
        let (sink, stream) = create_event_channel(4);
        sink.send(event("only")).unwrap();
        drop(sink);

        assert!(stream.recv().await.is_ok());
        assert!(matches!(stream.recv().await, Err(Error::Channel(_))));
    }

    #[test]
    fn test_send_fails_after_stream_drops() {
        let (sink, stream) = create_event_channel(4);
        drop(stream);
        assert!(matches!(sink.send(event("x")), Err(Error::Channel(_))));
    }
}
