//! Typed notification events

use serde::{Deserialize, Serialize};
use wire::{DeviceBroadcast, Guid, WireError};

/// Kind of device-change notification.
///
/// Open enumeration: only arrivals are produced today, removal and the
/// other device-change subtypes are deliberately ignored by the dispatcher.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// A device interface became available
    Arrival,
}

/// One observed device notification.
///
/// Immutable once constructed. `device_name` is always normalized text,
/// `""` or a diagnostic for degraded events, never the raw interface path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    /// OS device-category code from the broadcast header
    pub device_type: u32,
    /// Interface class the notification was delivered for
    pub class_guid: Guid,
    /// Normalized device path
    pub device_name: String,
    pub event_type: EventType,
}

impl EventInfo {
    /// Event for a successfully decoded arrival broadcast.
    pub fn arrival(broadcast: DeviceBroadcast) -> Self {
        Self {
            device_type: broadcast.device_type,
            class_guid: broadcast.class_guid,
            device_name: broadcast.device_name,
            event_type: EventType::Arrival,
        }
    }

    /// Degraded event for an arrival whose payload could not be decoded.
    ///
    /// Carries the diagnostic in place of the name and zero values for the
    /// other fields; emitting it keeps the pipeline live across a single
    /// malformed broadcast.
    pub fn degraded(err: &WireError) -> Self {
        Self {
            device_type: 0,
            class_guid: Guid::NIL,
            device_name: format!("error: failed to decode device broadcast: {err}"),
            event_type: EventType::Arrival,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrival_carries_broadcast_fields() {
        let event = EventInfo::arrival(DeviceBroadcast {
            device_type: 5,
            class_guid: Guid::new(1, 2, 3, [4; 8]),
            device_name: r"USB\VID_1A86&PID_7523\serial".into(),
        });
        assert_eq!(event.device_type, 5);
        assert_eq!(event.event_type, EventType::Arrival);
        assert_eq!(event.device_name, r"USB\VID_1A86&PID_7523\serial");
    }

    #[test]
    fn test_degraded_event_shape() {
        let event = EventInfo::degraded(&WireError::TruncatedHeader {
            needed: 28,
            available: 3,
        });
        assert_eq!(event.device_type, 0);
        assert_eq!(event.class_guid, Guid::NIL);
        assert!(event.device_name.starts_with("error: "));
        assert_eq!(event.event_type, EventType::Arrival);
    }
}
