//! Payload: typed, described data carried by a transmitted frame.
//!
//! ```text
//! TOTAL_LEN(u32) DATA_TYPE(u8) DESC_LEN(u8) DESC[DESC_LEN] DATA_LEN(u32) DATA[DATA_LEN]
//! ```
//!
//! `TOTAL_LEN` excludes itself.

use std::fmt;

use crate::codec::{self, Reader};
use crate::error::{FrameError, Result};
use crate::segment::{FrameSegment, Segment};

/// What the payload bytes contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum PayloadDataType {
    #[default]
    RawData = 0,
    SegmentData = 1,
    SignalMatrix = 2,
    CsiData = 3,
    FullMsduPacket = 4,
    FullPicoScenesPacket = 5,
}

impl PayloadDataType {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::RawData),
            1 => Ok(Self::SegmentData),
            2 => Ok(Self::SignalMatrix),
            3 => Ok(Self::CsiData),
            4 => Ok(Self::FullMsduPacket),
            5 => Ok(Self::FullPicoScenesPacket),
            _ => Err(FrameError::unsupported(format!("payload data type {code}"))),
        }
    }

    pub fn as_code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for PayloadDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawData => write!(f, "RawData"),
            Self::SegmentData => write!(f, "Segment"),
            Self::SignalMatrix => write!(f, "Signal"),
            Self::CsiData => write!(f, "CSI"),
            Self::FullMsduPacket => write!(f, "MSDU"),
            Self::FullPicoScenesPacket => write!(f, "FullPicoScenes"),
        }
    }
}

/// Described payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PayloadData {
    pub data_type: PayloadDataType,
    pub description: String,
    pub data: Vec<u8>,
}

impl PayloadData {
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let total = r.uint32()? as usize;
        if total != buf.len() - 4 {
            return Err(FrameError::underflow("Payload", buf.len() - 4, total));
        }
        let data_type = PayloadDataType::from_code(r.uint8()?)?;
        let desc_len = r.uint8()? as usize;
        let description = String::from_utf8(r.bytes(desc_len)?.to_vec())?;
        let data_len = r.uint32()? as usize;
        let data = r.bytes(data_len)?.to_vec();
        if r.remaining() != 0 {
            return Err(FrameError::underflow("Payload", buf.len(), r.position()));
        }
        Ok(Self { data_type, description, data })
    }

    /// Descriptions longer than 255 bytes are truncated at a char boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let desc = codec::short_str(&self.description).as_bytes();
        let total = 1 + 1 + desc.len() + 4 + self.data.len();
        let mut buf = Vec::with_capacity(4 + total);
        codec::write_uint32(&mut buf, total as u32);
        codec::write_uint8(&mut buf, self.data_type.as_code());
        codec::write_uint8(&mut buf, desc.len() as u8);
        buf.extend_from_slice(desc);
        codec::write_uint32(&mut buf, self.data.len() as u32);
        buf.extend_from_slice(&self.data);
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadLayout {
    V1,
}

impl PayloadLayout {
    fn from_version(version: u16) -> Result<Self> {
        match version {
            1 => Ok(Self::V1),
            _ => Err(FrameError::UnknownSegmentVersion {
                segment: PayloadSegment::NAME.to_string(),
                version,
            }),
        }
    }
}

/// The `Payload` segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSegment {
    segment: Segment,
    payload: PayloadData,
}

impl PayloadSegment {
    pub const NAME: &'static str = "Payload";

    pub fn new(description: impl Into<String>, data: Vec<u8>, data_type: Option<PayloadDataType>) -> Self {
        Self::from_payload(PayloadData {
            data_type: data_type.unwrap_or_default(),
            description: description.into(),
            data,
        })
    }

    pub fn from_payload(payload: PayloadData) -> Self {
        let mut segment = Segment::new(Self::NAME, 1);
        segment.add_field("core", payload.to_bytes());
        Self { segment, payload }
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, body) = Segment::open(buf, &[Self::NAME])?;
        let payload = match PayloadLayout::from_version(segment.version())? {
            PayloadLayout::V1 => PayloadData::from_bytes(body),
        }
        .map_err(|e| e.with_raw(body))?;
        Ok(Self { segment, payload })
    }

    pub fn payload(&self) -> &PayloadData {
        &self.payload
    }
}

impl FrameSegment for PayloadSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for PayloadSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Payload:[Type={}, Description={}, length={}B]",
            self.payload.data_type,
            self.payload.description,
            self.payload.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::tests::record;

    #[test]
    fn layout() {
        let seg = PayloadSegment::new("hi", vec![1, 2, 3], Some(PayloadDataType::CsiData));
        let body = seg.payload().to_bytes();
        assert_eq!(body, [11, 0, 0, 0, 3, 2, b'h', b'i', 3, 0, 0, 0, 1, 2, 3]);
        assert_eq!(seg.to_buffer(), record("Payload", 1, &body));
    }

    #[test]
    fn decode_record() {
        let body = PayloadData {
            data_type: PayloadDataType::FullMsduPacket,
            description: "msdu".into(),
            data: vec![0xAA; 20],
        }
        .to_bytes();
        let buf = record("Payload", 1, &body);
        let seg = PayloadSegment::from_buffer(&buf).unwrap();
        assert_eq!(seg.payload().data_type, PayloadDataType::FullMsduPacket);
        assert_eq!(seg.payload().description, "msdu");
        assert_eq!(seg.payload().data.len(), 20);
        assert_eq!(seg.to_buffer(), buf);
        assert_eq!(seg.to_string(), "Payload:[Type=MSDU, Description=msdu, length=20B]");
    }

    #[test]
    fn default_type_is_raw() {
        let seg = PayloadSegment::new("", vec![], None);
        assert_eq!(seg.payload().data_type, PayloadDataType::RawData);
    }

    #[test]
    fn long_description_keeps_whole_chars() {
        let seg = PayloadSegment::new("ü".repeat(200), vec![1], None);
        let back = PayloadSegment::from_buffer(&seg.to_buffer()).unwrap();
        assert_eq!(back.payload().description, "ü".repeat(127));
        assert_eq!(back.payload().data, [1]);
    }

    #[test]
    fn inconsistent_total_length() {
        let mut body = PayloadSegment::new("x", vec![9; 4], None).payload().to_bytes();
        body[0] += 1;
        assert!(matches!(PayloadData::from_bytes(&body), Err(FrameError::BufferUnderflow { .. })));
    }

    #[test]
    fn truncated_data() {
        let mut body = PayloadSegment::new("x", vec![9; 4], None).payload().to_bytes();
        body.truncate(body.len() - 1);
        body[0] -= 1;
        assert!(matches!(PayloadData::from_bytes(&body), Err(FrameError::MalformedLength { .. })));
    }
}
