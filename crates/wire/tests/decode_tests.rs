//! Decoder integration tests
//!
//! Exercises the broadcast decoder against the payload shapes the OS
//! actually delivers, including the worked CH340 serial-adapter example.
//!
//! Run with: `cargo test -p wire --test decode_tests`

use wire::{BROADCAST_HEADER_LEN, Guid, WireError, decode_device_broadcast};

const USB_DEVICE_CLASS: Guid = Guid::new(
    0xa5dcbf10,
    0x6530,
    0x11d2,
    [0x90, 0x1f, 0x00, 0xc0, 0x4f, 0xb9, 0x51, 0xed],
);

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
fn test_ch340_arrival_scenario() {
    // CH340 serial adapter arriving: declared size 220, device type 5,
    // USB device interface class, UTF-16LE interface path.
    let path = r"\\?\USB#VID_1A86&PID_7523#5&2B3E8B8D&0&1#{a5dcbf10-6530-11d2-901f-00c04fb951ed}";
    let mut name = Vec::new();
    for b in path.bytes() {
        name.push(b);
        name.push(0);
    }
    // Declared size includes the terminating NUL and alignment slack the OS
    // appends; pad the buffer out to match.
    name.resize(220 - BROADCAST_HEADER_LEN, 0);
    let buf = broadcast(220, 5, USB_DEVICE_CLASS, &name);

    let record = decode_device_broadcast(&buf).unwrap();
    assert_eq!(record.device_type, 5);
    assert_eq!(
        record.class_guid.to_string(),
        "a5dcbf10-6530-11d2-901f-00c04fb951ed"
    );
    assert_eq!(record.device_name, r"USB\VID_1A86&PID_7523\5&2B3E8B8D&0&1");
}

#[test]
fn test_empty_input() {
    assert_eq!(
        decode_device_broadcast(&[]),
        Err(WireError::TruncatedHeader {
            needed: 4,
            available: 0,
        })
    );
}

#[test]
fn test_guid_survives_decode() {
    let buf = broadcast(BROADCAST_HEADER_LEN as u32, 5, USB_DEVICE_CLASS, b"");
    let record = decode_device_broadcast(&buf).unwrap();
    assert_eq!(record.class_guid, USB_DEVICE_CLASS);
}

#[test]
fn test_zero_declared_size() {
    let buf = broadcast(0, 5, USB_DEVICE_CLASS, b"name");
    assert!(matches!(
        decode_device_broadcast(&buf),
        Err(WireError::InvalidSize { declared: 0, .. })
    ));
}
