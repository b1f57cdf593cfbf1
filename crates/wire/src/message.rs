//! Window message and device-change constants
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/devio/wm-devicechange>.

/// Message posted to the registered window when device state changes
pub const WM_DEVICECHANGE: u32 = 0x0219;

/// `wParam` subtype: a device interface became available
pub const DBT_DEVICEARRIVAL: usize = 0x8000;

/// Broadcast device type identifying a device-interface payload
pub const DBT_DEVTYP_DEVICEINTERFACE: u32 = 5;
