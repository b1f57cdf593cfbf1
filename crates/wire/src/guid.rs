//! Platform-layout GUID value type
//!
//! Windows lays a GUID out as a 32-bit field, two 16-bit fields, and eight
//! raw bytes. On the wire the first three fields are little-endian and the
//! trailing bytes are copied verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bytes a GUID occupies on the wire
pub const GUID_LEN: usize = 16;

/// A 128-bit class identifier in platform-native layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// The all-zero GUID, used as the class of degraded events.
    pub const NIL: Guid = Guid::new(0, 0, 0, [0; 8]);

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Append the 16-byte wire image to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data1.to_le_bytes());
        out.extend_from_slice(&self.data2.to_le_bytes());
        out.extend_from_slice(&self.data3.to_le_bytes());
        out.extend_from_slice(&self.data4);
    }

    /// Decode a GUID from its 16-byte wire image.
    pub fn from_le_bytes(bytes: &[u8; GUID_LEN]) -> Self {
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4: [
                bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14],
                bytes[15],
            ],
        }
    }
}

impl fmt::Display for Guid {
    /// Canonical lowercase hyphenated form, e.g.
    /// `a5dcbf10-6530-11d2-901f-00c04fb951ed`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}
