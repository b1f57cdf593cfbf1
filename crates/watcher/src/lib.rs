//! USB arrival watcher
//!
//! This crate turns Windows device-change broadcasts into typed
//! [`EventInfo`] values delivered over an async channel. It owns the hidden
//! message window, the device-notification registration, and the message
//! pump that drives both.
//!
//! The pump runs on one dedicated OS thread for the lifetime of a
//! registration, because window message queues are thread-affine: messages
//! for a window are only deliverable to the thread that created it. The
//! event channel is the single cross-thread boundary; consumers drain it
//! from async or sync contexts.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(windows)]
//! # async fn demo() -> watcher::Result<()> {
//! let handle = watcher::spawn_notifier(watcher::win32::Win32System, Default::default())?;
//! let events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {}", event.class_guid, event.device_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod logging;
pub mod notifier;
pub mod pump;
pub mod test_utils;
#[cfg(windows)]
pub mod win32;

pub use channel::{EventSink, EventStream, create_event_channel};
pub use dispatch::{Dispatch, Dispatcher};
pub use endpoint::{EndpointSystem, MessageEndpoint, PumpTick};
pub use error::{Error, Result};
pub use event::{EventInfo, EventType};
pub use logging::setup_logging;
pub use notifier::{Notifier, NotifierHandle, RegisterOptions, spawn_notifier};
pub use pump::{CancelFlag, DEFAULT_POLL_INTERVAL};
