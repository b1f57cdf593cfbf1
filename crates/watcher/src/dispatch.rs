//! Message dispatcher
//!
//! The dispatcher is the window-procedure body: the endpoint binding hands
//! it every message delivered to the registered window, it recognizes
//! device-change arrivals, decodes their payload, and emits exactly one
//! event per arrival. It runs inline on the pump thread and must not block
//! on anything only that thread could satisfy.

use crate::channel::EventSink;
use crate::event::EventInfo;
use tracing::{debug, trace, warn};
use wire::{WM_DEVICECHANGE, WireError, decode_device_broadcast};

/// What the endpoint binding must do with the message after dispatch.
///
/// Always [`Dispatch::Default`]: the binding routes every message to the
/// platform's default handler regardless of whether an event was emitted,
/// so unrelated message processing for the window is never broken.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Produce the platform default-handling result
    Default,
}

/// Per-endpoint message callback. Exactly one dispatcher is bound to
/// exactly one endpoint.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sink: EventSink,
}

impl Dispatcher {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    /// Handle one delivered message.
    ///
    /// `payload` is the message's broadcast bytes, bounded to what the
    /// caller may legally read; it is only borrowed for this call. For
    /// device-change arrivals the send blocks until a consumer drains the
    /// channel (backpressure); every other message passes through untouched.
    pub fn dispatch(&self, message: u32, subtype: usize, payload: Option<&[u8]>) -> Dispatch {
        if message == WM_DEVICECHANGE && subtype == wire::DBT_DEVICEARRIVAL {
            let event = match payload {
                Some(bytes) => match decode_device_broadcast(bytes) {
                    Ok(broadcast) => {
                        debug!(device = %broadcast.device_name, "device arrival");
                        EventInfo::arrival(broadcast)
                    }
                    Err(err) => {
                        warn!(%err, "device arrival with malformed broadcast");
                        EventInfo::degraded(&err)
                    }
                },
                None => {
                    let err = WireError::TruncatedHeader {
                        needed: wire::BROADCAST_HEADER_LEN,
                        available: 0,
                    };
                    warn!("device arrival without broadcast payload");
                    EventInfo::degraded(&err)
                }
            };
            // Channel closed means every consumer is gone; drop the event
            // rather than poison the pump.
            if let Err(err) = self.sink.send(event) {
                warn!(%err, "dropping arrival event");
            }
        } else {
            trace!(message, subtype, "message passed through");
        }
        Dispatch::Default
    }
}
