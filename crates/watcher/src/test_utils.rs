//! Test utilities
//!
//! A simulated endpoint system standing in for the OS message machinery, so
//! the registrar, pump, and dispatcher can be exercised end to end on any
//! platform, plus builders for broadcast payload buffers.
//!
//! # Example
//!
//! ```
//! use watcher::test_utils::{encode_broadcast, sim_system};
//! use watcher::{Notifier, RegisterOptions};
//! use wire::Guid;
//!
//! let (injector, system) = sim_system();
//! let options = RegisterOptions {
//!     class_name: "doc-sim-window".to_string(),
//!     ..Default::default()
//! };
//! let notifier = Notifier::register_with(&system, &options).unwrap();
//! let events = notifier.events();
//!
//! injector.inject_arrival(encode_broadcast(5, Guid::NIL, b"USB#VID_1#sn#{g}"));
//! injector.close();
//! notifier.run();
//!
//! assert_eq!(events.recv_blocking().unwrap().device_name, "USB\\VID_1\\sn");
//! ```

use crate::dispatch::{Dispatch, Dispatcher};
use crate::endpoint::{ClassClaim, EndpointSystem, MessageEndpoint, PumpTick, claim_class};
use crate::error::{Error, Result};
use std::sync::Mutex;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;
use wire::{DBT_DEVICEARRIVAL, Guid, InterfaceFilter, WM_DEVICECHANGE};

/// One scripted window message.
#[derive(Debug, Clone)]
pub struct SimMessage {
    pub message: u32,
    pub subtype: usize,
    pub payload: Option<Vec<u8>>,
}

/// Feeds scripted messages into the simulated endpoint's queue.
#[derive(Debug, Clone)]
pub struct SimInjector {
    tx: Sender<SimMessage>,
}

impl SimInjector {
    pub fn inject(&self, message: u32, subtype: usize, payload: Option<Vec<u8>>) {
        // A send can only fail after the endpoint is gone; scripted tests
        // may legitimately race that.
        let _ = self.tx.send(SimMessage {
            message,
            subtype,
            payload,
        });
    }

    /// Inject a device-change arrival carrying `payload`.
    pub fn inject_arrival(&self, payload: Vec<u8>) {
        self.inject(WM_DEVICECHANGE, DBT_DEVICEARRIVAL, Some(payload));
    }

    /// Close the simulated queue; the pump observes [`PumpTick::Closed`].
    pub fn close(self) {}
}

/// Simulated endpoint system. Supports a single endpoint, like one
/// registration of a window class.
pub struct SimSystem {
    queue: Mutex<Option<Receiver<SimMessage>>>,
    fail_subscription: bool,
}

impl SimSystem {
    /// Make `register_device_notifications` fail, to exercise the
    /// subscription error path.
    pub fn fail_subscription(mut self) -> Self {
        self.fail_subscription = true;
        self
    }
}

/// Create a simulated system and the injector feeding it.
pub fn sim_system() -> (SimInjector, SimSystem) {
    let (tx, rx) = channel();
    (
        SimInjector { tx },
        SimSystem {
            queue: Mutex::new(Some(rx)),
            fail_subscription: false,
        },
    )
}

impl EndpointSystem for SimSystem {
    type Endpoint = SimEndpoint;

    fn create_endpoint(&self, class_name: &str, dispatcher: Dispatcher) -> Result<SimEndpoint> {
        let claim = claim_class(class_name)?;
        let queue = self
            .queue
            .lock()
            .map_err(|e| Error::CreateEndpoint(e.to_string()))?
            .take()
            .ok_or_else(|| {
                Error::CreateEndpoint("simulated system already issued its endpoint".to_string())
            })?;
        Ok(SimEndpoint {
            dispatcher,
            queue,
            filter: None,
            _claim: claim,
        })
    }

    fn register_device_notifications(
        &self,
        endpoint: &mut SimEndpoint,
        filter: &InterfaceFilter,
    ) -> Result<()> {
        if self.fail_subscription {
            return Err(Error::Subscribe("simulated refusal".to_string()));
        }
        endpoint.filter = Some(*filter);
        Ok(())
    }
}

/// Simulated message endpoint over an in-process queue.
#[derive(Debug)]
pub struct SimEndpoint {
    dispatcher: Dispatcher,
    queue: Receiver<SimMessage>,
    filter: Option<InterfaceFilter>,
    _claim: ClassClaim,
}

impl SimEndpoint {
    /// Filter the simulated subscription was registered with, if any.
    pub fn filter(&self) -> Option<InterfaceFilter> {
        self.filter
    }
}

impl MessageEndpoint for SimEndpoint {
    fn pump_one(&mut self, timeout: Duration) -> Result<PumpTick> {
        match self.queue.recv_timeout(timeout) {
            Ok(msg) => {
                match self
                    .dispatcher
                    .dispatch(msg.message, msg.subtype, msg.payload.as_deref())
                {
                    Dispatch::Default => {}
                }
                Ok(PumpTick::Dispatched)
            }
            Err(RecvTimeoutError::Timeout) => Ok(PumpTick::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(PumpTick::Closed),
        }
    }

    fn release(&mut self) {
        self.filter = None;
    }
}

/// Build a broadcast buffer with a consistent declared size.
pub fn encode_broadcast(device_type: u32, class_guid: Guid, raw_name: &[u8]) -> Vec<u8> {
    encode_broadcast_with_size(
        (wire::BROADCAST_HEADER_LEN + raw_name.len()) as u32,
        device_type,
        class_guid,
        raw_name,
    )
}

/// Build a broadcast buffer with an explicit (possibly inconsistent)
/// declared size, for malformed-payload tests.
pub fn encode_broadcast_with_size(
    declared: u32,
    device_type: u32,
    class_guid: Guid,
    raw_name: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(wire::BROADCAST_HEADER_LEN + raw_name.len());
    buf.extend_from_slice(&declared.to_le_bytes());
    buf.extend_from_slice(&device_type.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    class_guid.encode_into(&mut buf);
    buf.extend_from_slice(raw_name);
    buf
}
