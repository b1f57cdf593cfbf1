//! Device-change broadcast decoder
//!
//! The arrival payload handed to the window procedure is a
//! `DEV_BROADCAST_DEVICEINTERFACE` structure: a 28-byte fixed header
//! followed by the interface path as raw text.
//!
//! # Wire Format
//!
//! ```text
//! [total size: u32 LE][device type: u32 LE][reserved: u32 LE][class GUID: 16 bytes][name bytes]
//! ```
//!
//! The memory backing the buffer is owned by the OS and only valid for the
//! duration of the callback, so decoding borrows and copies out. Every field
//! read is bounds-checked against the bytes actually available; the declared
//! total size is protocol bookkeeping and is never trusted for memory access.

use crate::error::{Result, WireError};
use crate::guid::{GUID_LEN, Guid};
use serde::{Deserialize, Serialize};

/// Size of the fixed broadcast header: three u32 fields plus the class GUID.
pub const BROADCAST_HEADER_LEN: usize = 4 + 4 + 4 + GUID_LEN;

/// Decoded device-interface broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBroadcast {
    /// OS device-category code (`DBT_DEVTYP_*`)
    pub device_type: u32,
    /// Interface class the notification was delivered for
    pub class_guid: Guid,
    /// Normalized device path, e.g. `USB\VID_1A86&PID_7523\5&2B3E8B8D&0&1`
    pub device_name: String,
}

/// Decode a device-interface broadcast from `buf`.
///
/// `buf` must cover exactly the bytes the caller is permitted to read; the
/// slice length is the available-length bound. Returns
/// [`WireError::TruncatedHeader`] if the fixed header does not fit and
/// [`WireError::InvalidSize`] if the declared total size is smaller than the
/// fixed header.
///
/// Decoding is deterministic: identical input bytes yield an identical
/// record.
pub fn decode_device_broadcast(buf: &[u8]) -> Result<DeviceBroadcast> {
    let declared = read_u32(buf, 0)?;
    let device_type = read_u32(buf, 4)?;
    let _reserved = read_u32(buf, 8)?;
    let class_guid = read_guid(buf, 12)?;

    if (declared as usize) < BROADCAST_HEADER_LEN {
        return Err(WireError::InvalidSize {
            declared,
            header: BROADCAST_HEADER_LEN,
        });
    }

    // The name runs from the end of the header to the declared size, clamped
    // to what is actually available.
    let end = (declared as usize).min(buf.len());
    let device_name = normalize_device_path(&buf[BROADCAST_HEADER_LEN..end]);

    Ok(DeviceBroadcast {
        device_type,
        class_guid,
        device_name,
    })
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    let Some(bytes) = buf.get(offset..offset + 4) else {
        return Err(WireError::TruncatedHeader {
            needed: offset + 4,
            available: buf.len(),
        });
    };
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_guid(buf: &[u8], offset: usize) -> Result<Guid> {
    let Some(bytes) = buf.get(offset..offset + GUID_LEN) else {
        return Err(WireError::TruncatedHeader {
            needed: offset + GUID_LEN,
            available: buf.len(),
        });
    };
    let mut raw = [0u8; GUID_LEN];
    raw.copy_from_slice(bytes);
    Ok(Guid::from_le_bytes(&raw))
}

/// Reconstruct a conventional device path from the symbolic-link style
/// interface path the OS reports.
///
/// The raw bytes are best-effort text: usually UTF-16LE, so stripping the
/// interleaved NULs recovers the ASCII path. Not assumed NUL-terminated or
/// validly encoded.
fn normalize_device_path(raw: &[u8]) -> String {
    let without_nuls: Vec<u8> = raw.iter().copied().filter(|&b| b != 0).collect();
    let text = String::from_utf8_lossy(&without_nuls);
    let text = text.strip_prefix(r"\\?\").unwrap_or(&text);
    let text = text.replacen('#', r"\", 2);
    match text.split_once('#') {
        Some((head, _)) => head.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usb_device_class() -> Guid {
        Guid::new(
            0xa5dcbf10,
            0x6530,
            0x11d2,
            [0x90, 0x1f, 0x00, 0xc0, 0x4f, 0xb9, 0x51, 0xed],
        )
    }

    /// Build a broadcast buffer with an explicit declared size.
    fn broadcast(declared: u32, device_type: u32, guid: Guid, name: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BROADCAST_HEADER_LEN + name.len());
        buf.extend_from_slice(&declared.to_le_bytes());
        buf.extend_from_slice(&device_type.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        guid.encode_into(&mut buf);
        buf.extend_from_slice(name);
        buf
    }

    #[test]
    fn test_decode_well_formed() {
        let name = br"\\?\USB#VID_1A86&PID_7523#5&2B3E8B8D&0&1#{a5dcbf10-6530-11d2-901f-00c04fb951ed}";
        let buf = broadcast(
            (BROADCAST_HEADER_LEN + name.len()) as u32,
            5,
            usb_device_class(),
            name,
        );

        let record = decode_device_broadcast(&buf).unwrap();
        assert_eq!(record.device_type, 5);
        assert_eq!(record.class_guid, usb_device_class());
        assert_eq!(record.device_name, r"USB\VID_1A86&PID_7523\5&2B3E8B8D&0&1");
    }

    #[test]
    fn test_decode_utf16_style_name() {
        // Interleaved NULs, the shape the OS actually delivers.
        let mut name = Vec::new();
        for b in br"\\?\USB#VID_046D&PID_C52B#abc#{guid}" {
            name.push(*b);
            name.push(0);
        }
        let buf = broadcast(
            (BROADCAST_HEADER_LEN + name.len()) as u32,
            5,
            usb_device_class(),
            &name,
        );

        let record = decode_device_broadcast(&buf).unwrap();
        assert_eq!(record.device_name, r"USB\VID_046D&PID_C52B\abc");
    }

    #[test]
    fn test_truncated_header() {
        let buf = broadcast(64, 5, usb_device_class(), b"ignored");
        for len in 0..BROADCAST_HEADER_LEN {
            let err = decode_device_broadcast(&buf[..len]).unwrap_err();
            assert!(
                matches!(err, WireError::TruncatedHeader { available, .. } if available == len),
                "len {len}: {err:?}"
            );
        }
    }

    #[test]
    fn test_declared_size_below_header() {
        let buf = broadcast(20, 5, usb_device_class(), b"");
        assert_eq!(
            decode_device_broadcast(&buf),
            Err(WireError::InvalidSize {
                declared: 20,
                header: BROADCAST_HEADER_LEN,
            })
        );
    }

    #[test]
    fn test_declared_size_beyond_available_is_clamped() {
        // Declares 200 bytes of name but only 4 are present; the decoder
        // must not read past the slice.
        let buf = broadcast(200, 5, usb_device_class(), b"USB1");
        let record = decode_device_broadcast(&buf).unwrap();
        assert_eq!(record.device_name, "USB1");
    }

    #[test]
    fn test_header_only_broadcast() {
        let buf = broadcast(BROADCAST_HEADER_LEN as u32, 5, usb_device_class(), b"");
        let record = decode_device_broadcast(&buf).unwrap();
        assert_eq!(record.device_name, "");
    }

    #[test]
    fn test_decode_deterministic() {
        let name = br"\\?\USB#VID_1A86&PID_7523#serial#{guid}";
        let buf = broadcast(
            (BROADCAST_HEADER_LEN + name.len()) as u32,
            5,
            usb_device_class(),
            name,
        );
        let a = decode_device_broadcast(&buf).unwrap();
        let b = decode_device_broadcast(&buf).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_no_prefix_no_hashes() {
        assert_eq!(normalize_device_path(b"plain"), "plain");
    }

    #[test]
    fn test_normalize_invalid_utf8_is_lossy() {
        // Arbitrary bytes must not panic.
        let name = normalize_device_path(&[0xff, 0xfe, b'a', 0x00, 0xc3]);
        assert!(name.contains('a'));
    }

    #[test]
    fn test_normalize_truncates_at_third_hash() {
        assert_eq!(normalize_device_path(b"a#b#c#d#e"), r"a\b\c");
    }
}
