//! Wire format for Windows device-change broadcasts
//!
//! This crate defines the byte-level contract between the watcher and the
//! OS device-notification machinery: the GUID value type, the
//! `DEV_BROADCAST_DEVICEINTERFACE` arrival payload decoder, and the
//! registration filter builder. It is a pure crate with no OS or
//! concurrency dependency, so the decoder can be tested on any platform.
//!
//! # Example
//!
//! ```
//! use wire::{Guid, decode_device_broadcast};
//!
//! // 28-byte header followed by raw device-path text.
//! let guid = Guid::new(0xa5dcbf10, 0x6530, 0x11d2,
//!     [0x90, 0x1f, 0x00, 0xc0, 0x4f, 0xb9, 0x51, 0xed]);
//! let name = br"\\?\USB#VID_1A86&PID_7523#5&2B3E8B8D&0&1#{a5dcbf10-...}";
//! let mut buf = Vec::new();
//! buf.extend_from_slice(&((28 + name.len()) as u32).to_le_bytes());
//! buf.extend_from_slice(&5u32.to_le_bytes()); // device interface
//! buf.extend_from_slice(&0u32.to_le_bytes()); // reserved
//! guid.encode_into(&mut buf);
//! buf.extend_from_slice(name);
//!
//! let record = decode_device_broadcast(&buf).unwrap();
//! assert_eq!(record.device_name, r"USB\VID_1A86&PID_7523\5&2B3E8B8D&0&1");
//! ```

pub mod broadcast;
pub mod error;
pub mod filter;
pub mod guid;
pub mod message;

pub use broadcast::{BROADCAST_HEADER_LEN, DeviceBroadcast, decode_device_broadcast};
pub use error::{Result, WireError};
pub use filter::{FILTER_LEN, InterfaceFilter, USB_HOST_CONTROLLER_CLASS};
pub use guid::Guid;
pub use message::{DBT_DEVICEARRIVAL, DBT_DEVTYP_DEVICEINTERFACE, WM_DEVICECHANGE};
