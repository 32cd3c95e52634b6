//! Field codecs for PicoScenes capture frames.
//!
//! All multi-byte integers and floats are little-endian. Reads are
//! bounds-checked and report the field type on underflow.

use crate::error::{FrameError, Result};

// ---------------------------------------------------------------------------
// Read helpers
// ---------------------------------------------------------------------------

/// Read an unsigned 8-bit integer.
pub fn read_uint8(data: &[u8], offset: usize) -> Result<u8> {
    check_len(data, offset, 1, "UINT8")?;
    Ok(data[offset])
}

/// Read a signed 8-bit integer.
pub fn read_int8(data: &[u8], offset: usize) -> Result<i8> {
    check_len(data, offset, 1, "INT8")?;
    Ok(data[offset] as i8)
}

/// Read a little-endian signed 16-bit integer.
pub fn read_int16(data: &[u8], offset: usize) -> Result<i16> {
    check_len(data, offset, 2, "INT16")?;
    Ok(i16::from_le_bytes([data[offset], data[offset + 1]]))
}

/// Read a little-endian unsigned 16-bit integer.
pub fn read_uint16(data: &[u8], offset: usize) -> Result<u16> {
    check_len(data, offset, 2, "UINT16")?;
    Ok(u16::from_le_bytes([data[offset], data[offset + 1]]))
}

/// Read a little-endian signed 32-bit integer.
pub fn read_int32(data: &[u8], offset: usize) -> Result<i32> {
    check_len(data, offset, 4, "INT32")?;
    Ok(i32::from_le_bytes(array(data, offset)))
}

/// Read a little-endian unsigned 32-bit integer.
pub fn read_uint32(data: &[u8], offset: usize) -> Result<u32> {
    check_len(data, offset, 4, "UINT32")?;
    Ok(u32::from_le_bytes(array(data, offset)))
}

/// Read a little-endian unsigned 64-bit integer.
pub fn read_uint64(data: &[u8], offset: usize) -> Result<u64> {
    check_len(data, offset, 8, "UINT64")?;
    Ok(u64::from_le_bytes(array(data, offset)))
}

/// Read a little-endian IEEE 754 double.
pub fn read_float64(data: &[u8], offset: usize) -> Result<f64> {
    check_len(data, offset, 8, "FLOAT64")?;
    Ok(f64::from_le_bytes(array(data, offset)))
}

/// Borrow `len` raw bytes starting at `offset`.
pub fn read_bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    check_len(data, offset, len, "BYTES")?;
    Ok(&data[offset..offset + len])
}

/// Read a 6-byte MAC address.
pub fn read_mac(data: &[u8], offset: usize) -> Result<[u8; 6]> {
    check_len(data, offset, 6, "MAC")?;
    Ok(array(data, offset))
}

// ---------------------------------------------------------------------------
// Sequential reader
// ---------------------------------------------------------------------------

/// Cursor over a payload for variable-layout records.
///
/// Each call reads at the current position through the offset helpers above
/// and advances past the field on success.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn uint8(&mut self) -> Result<u8> {
        let v = read_uint8(self.data, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn int8(&mut self) -> Result<i8> {
        let v = read_int8(self.data, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn uint16(&mut self) -> Result<u16> {
        let v = read_uint16(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn int16(&mut self) -> Result<i16> {
        let v = read_int16(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn uint32(&mut self) -> Result<u32> {
        let v = read_uint32(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn int32(&mut self) -> Result<i32> {
        let v = read_int32(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn uint64(&mut self) -> Result<u64> {
        let v = read_uint64(self.data, self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    pub fn float64(&mut self) -> Result<f64> {
        let v = read_float64(self.data, self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    pub fn mac(&mut self) -> Result<[u8; 6]> {
        let v = read_mac(self.data, self.pos)?;
        self.pos += 6;
        Ok(v)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let v = read_bytes(self.data, self.pos, len)?;
        self.pos += len;
        Ok(v)
    }

    /// Everything from the cursor to the end.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.pos.min(self.data.len());
        self.pos = self.data.len();
        &self.data[start..]
    }
}

// ---------------------------------------------------------------------------
// Write helpers
// ---------------------------------------------------------------------------

/// Write an unsigned 8-bit integer.
pub fn write_uint8(buf: &mut Vec<u8>, val: u8) {
    buf.push(val);
}

/// Write a signed 8-bit integer.
pub fn write_int8(buf: &mut Vec<u8>, val: i8) {
    buf.push(val as u8);
}

/// Write a little-endian signed 16-bit integer.
pub fn write_int16(buf: &mut Vec<u8>, val: i16) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian unsigned 16-bit integer.
pub fn write_uint16(buf: &mut Vec<u8>, val: u16) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian signed 32-bit integer.
pub fn write_int32(buf: &mut Vec<u8>, val: i32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian unsigned 32-bit integer.
pub fn write_uint32(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian unsigned 64-bit integer.
pub fn write_uint64(buf: &mut Vec<u8>, val: u64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Write a little-endian IEEE 754 double.
pub fn write_float64(buf: &mut Vec<u8>, val: f64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

/// Longest prefix of `s` that fits a u8 length prefix without splitting a
/// character.
pub fn short_str(s: &str) -> &str {
    let max = u8::MAX as usize;
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn check_len(data: &[u8], offset: usize, need: usize, name: &'static str) -> Result<()> {
    match offset.checked_add(need) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(FrameError::malformed(name, offset.saturating_add(need), data.len())),
    }
}

/// Copy `N` bytes at `offset`; callers have already run `check_len`.
fn array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
