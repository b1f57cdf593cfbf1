//! Message endpoint abstraction
//!
//! The OS side of the watcher is consumed through two narrow traits: an
//! [`EndpointSystem`] that can create a message-receiving endpoint and
//! subscribe it to device-interface notifications, and the
//! [`MessageEndpoint`] itself, which retrieves pending messages and routes
//! them through its bound [`Dispatcher`](crate::Dispatcher). The Win32
//! binding implements them over a hidden window; tests use the simulated
//! system in [`crate::test_utils`].
//!
//! Endpoints are thread-affine: every call on an endpoint, from creation to
//! release, must happen on the thread that created it.

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use wire::InterfaceFilter;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpTick {
    /// One message was retrieved and dispatched
    Dispatched,
    /// The timeout elapsed with nothing pending
    Idle,
    /// The endpoint's queue is gone; no further messages will arrive
    Closed,
}

/// One OS-recognized message-receiving endpoint.
pub trait MessageEndpoint {
    /// Retrieve the next pending message, blocking up to `timeout`, and
    /// dispatch it through the bound dispatcher.
    fn pump_one(&mut self, timeout: Duration) -> Result<PumpTick>;

    /// Stop delivering messages to this endpoint and free what backs it:
    /// the notification subscription, the endpoint itself, and its class
    /// claim. Idempotent.
    fn release(&mut self);
}

/// Factory for endpoints plus the device-notification subscription call.
pub trait EndpointSystem {
    type Endpoint: MessageEndpoint;

    /// Create an endpoint under `class_name` with `dispatcher` as its
    /// message callback. The endpoint is ready to receive but not yet
    /// pumping; pumping is the run loop's job.
    fn create_endpoint(&self, class_name: &str, dispatcher: Dispatcher)
    -> Result<Self::Endpoint>;

    /// Subscribe the endpoint to device-interface notifications matching
    /// `filter`. The encoded filter only lives for the duration of the call.
    fn register_device_notifications(
        &self,
        endpoint: &mut Self::Endpoint,
        filter: &InterfaceFilter,
    ) -> Result<()>;
}

/// Process-wide table of claimed window class names.
///
/// Registering a window class is a process-global side effect, so a second
/// registration under a live class name must fail regardless of which
/// endpoint system backs it.
static CLAIMED_CLASSES: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Claim `class_name` for one endpoint. Released when the claim drops.
pub(crate) fn claim_class(class_name: &str) -> Result<ClassClaim> {
    let mut table = CLAIMED_CLASSES
        .lock()
        .map_err(|e| Error::CreateEndpoint(e.to_string()))?;
    let claimed = table.get_or_insert_with(HashSet::new);
    if !claimed.insert(class_name.to_string()) {
        return Err(Error::ClassInUse(class_name.to_string()));
    }
    Ok(ClassClaim {
        class_name: class_name.to_string(),
    })
}

/// Live ownership of a window class name.
#[derive(Debug)]
pub(crate) struct ClassClaim {
    class_name: String,
}

impl Drop for ClassClaim {
    fn drop(&mut self) {
        if let Ok(mut table) = CLAIMED_CLASSES.lock()
            && let Some(claimed) = table.as_mut()
        {
            claimed.remove(&self.class_name);
        }
    }
}
