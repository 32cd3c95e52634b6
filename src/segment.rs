//! Named, versioned, length-prefixed segment records.
//!
//! Wire format:
//! ```text
//! TOTAL_LEN(u32) NAME_LEN(u8) NAME[NAME_LEN] VERSION(u16) FIELDS...
//! ```
//!
//! `TOTAL_LEN` excludes itself. Fields are concatenated in insertion order
//! with no per-field framing; concrete segment types give them meaning.

use std::fmt;

use crate::codec;
use crate::error::{FrameError, Result};

/// Bytes of the `TOTAL_LEN` prefix.
pub const LENGTH_PREFIX: usize = 4;

/// Decode-time switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Drop pilot tones from Intel MVM CSI (default `true`).
    pub skip_mvm_pilots: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { skip_mvm_pilots: true }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Header of one segment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMeta {
    pub name: String,
    /// Declared length, excluding the 4-byte prefix
    pub total_len: u32,
    pub version: u16,
    /// Bytes from the record start to the first field byte
    pub header_len: usize,
}

impl SegmentMeta {
    /// Record length including the prefix.
    pub fn record_len(&self) -> usize {
        self.total_len as usize + LENGTH_PREFIX
    }
}

/// Read the length, name and version at the start of a record.
///
/// One trailing NUL in the name is dropped. The caller must still check
/// `record_len() <= buf.len()` before trusting the body.
pub fn extract_meta(buf: &[u8]) -> Result<SegmentMeta> {
    let mut r = codec::Reader::new(buf);
    let total_len = r.uint32()?;
    let name_len = r.uint8()? as usize;
    let mut name = r.bytes(name_len)?;
    if let [head @ .., 0] = name {
        name = head;
    }
    let name = String::from_utf8(name.to_vec())?;
    let version = r.uint16()?;
    Ok(SegmentMeta {
        name,
        total_len,
        version,
        header_len: r.position(),
    })
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// Generic segment record: name, version and ordered fields.
///
/// The cached total length is recomputed on every field mutation. A segment
/// built by [`Segment::open`] also keeps its original bytes, which
/// [`Segment::to_buffer`] returns verbatim until a field is changed.
///
/// Two segments are equal when they serialize to the same record.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    name: String,
    version: u16,
    fields: Vec<(String, Vec<u8>)>,
    #[cfg_attr(feature = "serde", serde(skip))]
    raw: Option<Vec<u8>>,
    total_len: u32,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.to_buffer(true) == other.to_buffer(true)
    }
}

impl Segment {
    pub fn new(name: impl Into<String>, version: u16) -> Self {
        let mut segment = Self {
            name: name.into(),
            version,
            fields: Vec::new(),
            raw: None,
            total_len: 0,
        };
        segment.recompute_len();
        segment
    }

    /// Slice one record off `buf`, checking its name and declared length.
    ///
    /// Returns the segment (raw bytes retained, body stored as field `core`)
    /// and a borrow of the body.
    pub fn open<'a>(buf: &'a [u8], accepted: &[&'static str]) -> Result<(Self, &'a [u8])> {
        let meta = extract_meta(buf)?;
        if !accepted.contains(&meta.name.as_str()) {
            return Err(FrameError::NameMismatch {
                expected: accepted.first().copied().unwrap_or(""),
                got: meta.name,
            });
        }
        let record_len = meta.record_len();
        if record_len > buf.len() || meta.header_len > record_len {
            return Err(FrameError::malformed("segment record", record_len, buf.len()).with_raw(buf));
        }
        let record = &buf[..record_len];
        let body = &record[meta.header_len..];
        let segment = Self {
            name: meta.name,
            version: meta.version,
            fields: vec![("core".to_string(), body.to_vec())],
            raw: Some(record.to_vec()),
            total_len: meta.total_len,
        };
        Ok((segment, body))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Declared length, excluding the 4-byte prefix.
    pub fn total_len(&self) -> u32 {
        self.total_len
    }

    pub fn fields(&self) -> &[(String, Vec<u8>)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Original record bytes, if this segment was decoded and not modified since.
    pub fn raw_buffer(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Insert or replace a field. Replacement keeps the field's position.
    pub fn add_field(&mut self, name: impl Into<String>, value: Vec<u8>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
        self.raw = None;
        self.recompute_len();
    }

    pub fn remove_field(&mut self, name: &str) {
        self.fields.retain(|(n, _)| n != name);
        self.raw = None;
        self.recompute_len();
    }

    pub fn clear_fields(&mut self) {
        self.fields.clear();
        self.raw = None;
        self.recompute_len();
    }

    /// Serialize the record, optionally with the length prefix.
    pub fn to_buffer(&self, include_length: bool) -> Vec<u8> {
        if let Some(raw) = &self.raw {
            if raw.len() == self.total_len as usize + LENGTH_PREFIX {
                return if include_length { raw.clone() } else { raw[LENGTH_PREFIX..].to_vec() };
            }
        }

        let mut buf = Vec::with_capacity(self.total_len as usize + LENGTH_PREFIX);
        if include_length {
            codec::write_uint32(&mut buf, self.total_len);
        }
        let name = codec::short_str(&self.name).as_bytes();
        codec::write_uint8(&mut buf, name.len() as u8);
        buf.extend_from_slice(name);
        codec::write_uint16(&mut buf, self.version);
        for (_, value) in &self.fields {
            buf.extend_from_slice(value);
        }
        buf
    }

    fn recompute_len(&mut self) {
        let name_len = codec::short_str(&self.name).len();
        let body: usize = self.fields.iter().map(|(_, v)| v.len()).sum();
        self.total_len = u32::try_from(1 + name_len + 2 + body).unwrap_or(u32::MAX);
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:v{} {}B", self.name, self.version, self.total_len)
    }
}

/// Access to the generic record behind a typed segment.
pub trait FrameSegment {
    fn segment(&self) -> &Segment;

    /// Full record bytes including the length prefix.
    fn to_buffer(&self) -> Vec<u8> {
        self.segment().to_buffer(true)
    }
}

impl FrameSegment for Segment {
    fn segment(&self) -> &Segment {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Hand-build a record: prefix, name, version, body.
    pub(crate) fn record(name: &str, version: u16, body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_uint32(&mut buf, (1 + name.len() + 2 + body.len()) as u32);
        buf.push(name.len() as u8);
        buf.extend_from_slice(name.as_bytes());
        codec::write_uint16(&mut buf, version);
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn meta_fields() {
        let buf = record("RxSBasic", 3, &[1, 2, 3]);
        let meta = extract_meta(&buf).unwrap();
        assert_eq!(meta.name, "RxSBasic");
        assert_eq!(meta.version, 3);
        assert_eq!(meta.total_len, 1 + 8 + 2 + 3);
        assert_eq!(meta.header_len, 4 + 1 + 8 + 2);
        assert_eq!(meta.record_len(), buf.len());
    }

    #[test]
    fn meta_trims_one_nul() {
        let buf = record("CSI\0", 1, &[]);
        assert_eq!(extract_meta(&buf).unwrap().name, "CSI");
    }

    #[test]
    fn meta_truncated() {
        let buf = record("ExtraInfo", 1, &[]);
        assert!(matches!(extract_meta(&buf[..8]), Err(FrameError::MalformedLength { .. })));
    }

    #[test]
    fn open_checks_declared_length() {
        let mut buf = record("CSI", 1, &[9; 8]);
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            Segment::open(&buf, &["CSI"]),
            Err(FrameError::MalformedLength { .. })
        ));
    }

    #[test]
    fn open_checks_name() {
        let buf = record("CSI", 1, &[]);
        assert!(matches!(
            Segment::open(&buf, &["RxSBasic"]),
            Err(FrameError::NameMismatch { expected: "RxSBasic", .. })
        ));
    }

    #[test]
    fn open_ignores_trailing_bytes() {
        let mut buf = record("Payload", 1, &[1, 2]);
        let len = buf.len();
        buf.extend_from_slice(&[0xEE; 5]);
        let (segment, body) = Segment::open(&buf, &["Payload"]).unwrap();
        assert_eq!(body, &[1, 2]);
        assert_eq!(segment.to_buffer(true), buf[..len].to_vec());
        assert_eq!(segment.field("core").unwrap(), &[1, 2]);
    }

    #[test]
    fn length_follows_fields() {
        let mut segment = Segment::new("ExtraInfo", 1);
        assert_eq!(segment.total_len(), 1 + 9 + 2);
        segment.add_field("EI", vec![0; 10]);
        segment.add_field("tail", vec![1; 3]);
        assert_eq!(segment.total_len(), 1 + 9 + 2 + 13);
        segment.add_field("EI", vec![0; 4]);
        assert_eq!(segment.total_len(), 1 + 9 + 2 + 7);
        assert_eq!(segment.fields()[0].0, "EI");
        segment.remove_field("tail");
        assert_eq!(segment.total_len(), 1 + 9 + 2 + 4);

        let buf = segment.to_buffer(true);
        assert_eq!(buf.len(), segment.total_len() as usize + LENGTH_PREFIX);
        assert_eq!(buf, record("ExtraInfo", 1, &[0; 4]));
        assert_eq!(segment.to_buffer(false), buf[LENGTH_PREFIX..].to_vec());
    }

    #[test]
    fn long_name_keeps_whole_chars() {
        let segment = Segment::new("ß".repeat(130), 1);
        let buf = segment.to_buffer(true);
        assert_eq!(buf.len(), segment.total_len() as usize + LENGTH_PREFIX);
        let meta = extract_meta(&buf).unwrap();
        assert_eq!(meta.name, "ß".repeat(127));
        assert_eq!(meta.record_len(), buf.len());
    }

    #[test]
    fn mutation_drops_raw() {
        let mut name_with_nul = record("Payload\0", 1, &[5]);
        let (mut segment, _) = Segment::open(&name_with_nul, &["Payload"]).unwrap();
        assert_eq!(segment.total_len() as usize, name_with_nul.len() - 4);
        assert_eq!(segment.to_buffer(true), name_with_nul);

        segment.add_field("core", vec![6]);
        assert!(segment.raw_buffer().is_none());
        name_with_nul = record("Payload", 1, &[6]);
        assert_eq!(segment.to_buffer(true), name_with_nul);
    }
}
