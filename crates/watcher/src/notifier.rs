//! Notifier lifecycle
//!
//! The [`Notifier`] is the public handle combining the event channel with
//! one registered endpoint: created by registration, consumed by the run
//! loop. [`spawn_notifier`] wraps both on a dedicated pump thread, which is
//! the normal way to use this crate (registration has to happen on the
//! thread that will pump, because the message queue is affine to the thread
//! that creates the endpoint).

use crate::channel::{EventStream, create_event_channel};
use crate::dispatch::Dispatcher;
use crate::endpoint::{EndpointSystem, MessageEndpoint};
use crate::error::{Error, Result};
use crate::pump::{CancelFlag, DEFAULT_POLL_INTERVAL, run_pump};
use std::time::Duration;
use tracing::info;
use wire::{Guid, InterfaceFilter, USB_HOST_CONTROLLER_CLASS};

/// Registration parameters.
#[derive(Debug, Clone)]
pub struct RegisterOptions {
    /// Window class name the endpoint is created under. Process-unique
    /// while the registration lives.
    pub class_name: String,
    /// Device interface class to subscribe to
    pub class_guid: Guid,
    /// Event channel capacity; once full, the pump blocks until a consumer
    /// drains (backpressure)
    pub channel_capacity: usize,
    /// Poll interval of the run loop; bounds cancellation latency
    pub poll_interval: Duration,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            class_name: "usb-arrival-window".to_string(),
            class_guid: USB_HOST_CONTROLLER_CLASS,
            channel_capacity: 16,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A live registration: event channel plus endpoint identity.
///
/// Consumed by [`Notifier::run`]; a retired notifier cannot be pumped
/// again.
#[derive(Debug)]
pub struct Notifier<E: MessageEndpoint> {
    endpoint: E,
    events: EventStream,
    cancel: CancelFlag,
    poll_interval: Duration,
}

impl<E: MessageEndpoint> Notifier<E> {
    /// Register a new endpoint with `system` and subscribe it to device
    /// notifications.
    ///
    /// Fails fast and non-retryably if the class name is still claimed by a
    /// prior registration, if endpoint creation fails, or if the
    /// subscription call fails. On success the endpoint is ready to receive
    /// messages but not yet pumping.
    ///
    /// Must be called on the thread that will call [`Notifier::run`].
    pub fn register_with<S>(system: &S, options: &RegisterOptions) -> Result<Self>
    where
        S: EndpointSystem<Endpoint = E>,
    {
        let (sink, events) = create_event_channel(options.channel_capacity);
        let dispatcher = Dispatcher::new(sink);
        let mut endpoint = system.create_endpoint(&options.class_name, dispatcher)?;

        let filter = InterfaceFilter::new(options.class_guid);
        if let Err(err) = system.register_device_notifications(&mut endpoint, &filter) {
            endpoint.release();
            return Err(err);
        }

        info!(
            class = %options.class_name,
            guid = %options.class_guid,
            "registered for device notifications"
        );

        Ok(Self {
            endpoint,
            events,
            cancel: CancelFlag::new(),
            poll_interval: options.poll_interval,
        })
    }

    /// Consumer handle onto the event channel.
    pub fn events(&self) -> EventStream {
        self.events.clone()
    }

    /// Flag that cancels a subsequent or in-progress [`Notifier::run`].
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Pump messages until cancelled or the endpoint queue closes, then
    /// release the endpoint.
    ///
    /// Blocks the calling thread, which must be the one that registered.
    /// The event channel reaches its terminal state only after this
    /// returns.
    pub fn run(mut self) {
        run_pump(&mut self.endpoint, self.poll_interval, &self.cancel);
        self.endpoint.release();
    }
}

#[cfg(windows)]
impl Notifier<crate::win32::Win32Endpoint> {
    /// Register against the live Win32 message system.
    pub fn register(options: &RegisterOptions) -> Result<Self> {
        Self::register_with(&crate::win32::Win32System, options)
    }
}

/// Handle onto a notifier running on its own pump thread.
#[derive(Debug)]
pub struct NotifierHandle {
    events: EventStream,
    cancel: CancelFlag,
    join: std::thread::JoinHandle<()>,
}

impl NotifierHandle {
    pub fn events(&self) -> EventStream {
        self.events.clone()
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Cancel the pump and wait for the thread to retire the registration.
    pub fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.join
            .join()
            .map_err(|_| Error::Channel("pump thread panicked".to_string()))
    }
}

/// Register and run a notifier on a dedicated pump thread.
///
/// The endpoint is created on the spawned thread and stays pinned to it for
/// the whole registration. The registration outcome is reported back before
/// this returns, so a class collision or subscription failure surfaces here
/// as an error.
pub fn spawn_notifier<S>(system: S, options: RegisterOptions) -> Result<NotifierHandle>
where
    S: EndpointSystem + Send + 'static,
{
    let (ready_tx, ready_rx) = async_channel::bounded::<Result<(EventStream, CancelFlag)>>(1);

    let join = std::thread::Builder::new()
        .name("usb-pump".to_string())
        .spawn(move || match Notifier::register_with(&system, &options) {
            Ok(notifier) => {
                let _ = ready_tx.send_blocking(Ok((notifier.events(), notifier.cancel_flag())));
                notifier.run();
            }
            Err(err) => {
                let _ = ready_tx.send_blocking(Err(err));
            }
        })
        .map_err(|e| Error::CreateEndpoint(format!("failed to spawn pump thread: {e}")))?;

    match ready_rx.recv_blocking() {
        Ok(Ok((events, cancel))) => Ok(NotifierHandle {
            events,
            cancel,
            join,
        }),
        Ok(Err(err)) => {
            let _ = join.join();
            Err(err)
        }
        Err(_) => {
            let _ = join.join();
            Err(Error::CreateEndpoint(
                "pump thread exited before reporting registration".to_string(),
            ))
        }
    }
}
