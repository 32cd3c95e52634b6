//! MVMExtra: the raw Intel MVM CSI header that accompanies MVM CSI.
//!
//! ```text
//! HDR_LEN(u16) HDR[HDR_LEN]
//! ```
//!
//! Known header offsets:
//! ```text
//!  0 IQ_DATA_SIZE(u32)   8 FTM_CLOCK(u32)   12 SAMPLING_TICK2(u32)
//! 52 NUM_TONES(u32)     60 RSSI1(u32)       64 RSSI2(u32)
//! 68 SOURCE_ADDR[6]     76 CSI_SEQUENCE(u8) 88 MU_CLOCK(u32)
//! 92 RATE_N_FLAGS(u32)
//! ```

use std::fmt;

use crate::codec::{self, Reader};
use crate::error::{FrameError, Result};
use crate::segment::{FrameSegment, Segment};

/// Bytes of the header prefix with known fields.
pub const PARSED_HEADER_LEN: usize = 96;

/// Fields decoded from the MVM CSI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MvmParsedCsiHeader {
    pub iq_data_size: u32,
    pub ftm_clock: u32,
    pub sampling_tick2: u32,
    pub num_tones: u32,
    pub rssi1: u32,
    pub rssi2: u32,
    pub source_address: [u8; 6],
    pub csi_sequence: u8,
    pub mu_clock: u32,
    pub rate_n_flags: u32,
}

impl MvmParsedCsiHeader {
    fn parse(hdr: &[u8]) -> Result<Self> {
        Ok(Self {
            iq_data_size: codec::read_uint32(hdr, 0)?,
            ftm_clock: codec::read_uint32(hdr, 8)?,
            sampling_tick2: codec::read_uint32(hdr, 12)?,
            num_tones: codec::read_uint32(hdr, 52)?,
            rssi1: codec::read_uint32(hdr, 60)?,
            rssi2: codec::read_uint32(hdr, 64)?,
            source_address: codec::read_mac(hdr, 68)?,
            csi_sequence: codec::read_uint8(hdr, 76)?,
            mu_clock: codec::read_uint32(hdr, 88)?,
            rate_n_flags: codec::read_uint32(hdr, 92)?,
        })
    }
}

/// Raw MVM CSI header plus its decoded prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MvmExtra {
    pub csi_header: Vec<u8>,
    /// `None` when the header is shorter than [`PARSED_HEADER_LEN`]
    pub parsed: Option<MvmParsedCsiHeader>,
}

impl MvmExtra {
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let len = r.uint16()? as usize;
        if len > r.remaining() {
            return Err(FrameError::malformed("MVMExtra", len + 2, buf.len()));
        }
        let csi_header = r.bytes(len)?.to_vec();
        let parsed = if csi_header.len() >= PARSED_HEADER_LEN {
            Some(MvmParsedCsiHeader::parse(&csi_header)?)
        } else {
            None
        };
        Ok(Self { csi_header, parsed })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.csi_header.len().min(u16::MAX as usize);
        let mut buf = Vec::with_capacity(2 + len);
        codec::write_uint16(&mut buf, len as u16);
        buf.extend_from_slice(&self.csi_header[..len]);
        buf
    }
}

/// The `MVMExtra` segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MvmExtraSegment {
    segment: Segment,
    extra: MvmExtra,
}

impl MvmExtraSegment {
    pub const NAME: &'static str = "MVMExtra";

    pub fn new(extra: MvmExtra) -> Self {
        let mut segment = Segment::new(Self::NAME, 1);
        segment.add_field("core", extra.to_bytes());
        Self { segment, extra }
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, body) = Segment::open(buf, &[Self::NAME])?;
        if segment.version() != 1 {
            return Err(FrameError::UnknownSegmentVersion {
                segment: Self::NAME.to_string(),
                version: segment.version(),
            });
        }
        let extra = MvmExtra::from_bytes(body).map_err(|e| e.with_raw(body))?;
        Ok(Self { segment, extra })
    }

    pub fn extra(&self) -> &MvmExtra {
        &self.extra
    }
}

impl FrameSegment for MvmExtraSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for MvmExtraSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MVMExtra:[hdr_len={}", self.extra.csi_header.len())?;
        if let Some(p) = &self.extra.parsed {
            write!(
                f,
                ", csi_len={}B, num_tone={}, rate_n_flags=0x{:x}, ftm_clock={}, mu_clock={}",
                p.iq_data_size, p.num_tones, p.rate_n_flags, p.ftm_clock, p.mu_clock
            )?;
        }
        write!(f, "]")
    }
}
