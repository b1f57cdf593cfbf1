//! Notification filter builder
//!
//! `RegisterDeviceNotificationW` takes a pointer to a
//! `DEV_BROADCAST_DEVICEINTERFACE_W` describing which device interface class
//! to subscribe to. This module builds that structure as an exact byte image
//! so the caller never hands the OS an uninitialized or padded struct. The
//! OS copies the filter during the registration call; the buffer does not
//! need to outlive it.

use crate::guid::Guid;
use crate::message::DBT_DEVTYP_DEVICEINTERFACE;

/// Total size of the filter image: 28-byte header, two bytes for the empty
/// name array, two bytes of tail padding to DWORD alignment.
pub const FILTER_LEN: usize = 32;

/// Interface class of USB host controllers
/// (`GUID_DEVINTERFACE_USB_HOST_CONTROLLER`).
pub const USB_HOST_CONTROLLER_CLASS: Guid = Guid::new(
    0x3abf6f2d,
    0x71c4,
    0x462a,
    [0x8a, 0x92, 0x1e, 0x68, 0x61, 0xe6, 0xaf, 0x27],
);

/// Registration filter scoping notifications to one device interface class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceFilter {
    class_guid: Guid,
}

impl InterfaceFilter {
    pub const fn new(class_guid: Guid) -> Self {
        Self { class_guid }
    }

    /// Filter for the well-known USB host controller class.
    pub const fn for_usb_host_controllers() -> Self {
        Self::new(USB_HOST_CONTROLLER_CLASS)
    }

    pub const fn class_guid(&self) -> Guid {
        self.class_guid
    }

    /// Produce the registration image passed to the OS.
    pub fn encode(&self) -> [u8; FILTER_LEN] {
        let mut image = [0u8; FILTER_LEN];
        image[0..4].copy_from_slice(&(FILTER_LEN as u32).to_le_bytes());
        image[4..8].copy_from_slice(&DBT_DEVTYP_DEVICEINTERFACE.to_le_bytes());
        // Bytes 8..12 stay zero (reserved).
        let mut guid = Vec::with_capacity(16);
        self.class_guid.encode_into(&mut guid);
        image[12..28].copy_from_slice(&guid);
        // Bytes 28.. stay zero (empty name, padding).
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let image = InterfaceFilter::for_usb_host_controllers().encode();
        assert_eq!(image.len(), FILTER_LEN);
        assert_eq!(u32::from_le_bytes([image[0], image[1], image[2], image[3]]), 32);
        assert_eq!(u32::from_le_bytes([image[4], image[5], image[6], image[7]]), 5);
        assert_eq!(&image[8..12], &[0, 0, 0, 0]);
        // GUID starts with data1 little-endian.
        assert_eq!(&image[12..16], &[0x2d, 0x6f, 0xbf, 0x3a]);
        assert_eq!(&image[28..32], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_host_controller_guid_display() {
        assert_eq!(
            USB_HOST_CONTROLLER_CLASS.to_string(),
            "3abf6f2d-71c4-462a-8a92-1e6861e6af27"
        );
    }
}
