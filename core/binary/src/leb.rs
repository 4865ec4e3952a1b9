//! Thin wrappers around the `leb128` crate's `Write`-based API.
//!
//! `Vec<u8>` is an infallible `io::Write`, so every call here is
//! `.expect()`-safe; the `expect` documents that rather than hiding a
//! real failure mode.

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    leb128::write::unsigned(buf, u64::from(value)).expect("writing to Vec<u8> cannot fail");
}

pub fn write_u64(buf: &mut Vec<u8>, value: u64) {
    leb128::write::unsigned(buf, value).expect("writing to Vec<u8> cannot fail");
}

pub fn write_i32(buf: &mut Vec<u8>, value: i32) {
    leb128::write::signed(buf, i64::from(value)).expect("writing to Vec<u8> cannot fail");
}

pub fn write_i64(buf: &mut Vec<u8>, value: i64) {
    leb128::write::signed(buf, value).expect("writing to Vec<u8> cannot fail");
}

/// Writes a length-prefixed byte vector (`vec(byte)` in the core spec's
/// grammar): a `u32` LEB128 count followed by the raw bytes.
pub fn write_bytes_vec(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

/// Writes a length-prefixed name (UTF-8 string), used for import/export
/// names.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_bytes_vec(buf, name.as_bytes());
}
