//! 802.11 MAC header carried in front of every frame body.
//!
//! Wire format (24 bytes):
//! ```text
//! FC(u16) DURATION(u16) ADDR1[6] ADDR2[6] ADDR3[6] SEQ_CTRL(u16)
//! ```
//!
//! Frame control bits, LSB first: version:2 type:2 subtype:4 toDS fromDS
//! moreFrags retry powerMgmt moreData protect order. Sequence control:
//! frag:4 seq:12.

use std::fmt;

use crate::codec;
use crate::error::Result;

pub const MAC_HEADER_LEN: usize = 24;

/// Decoded frame control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameControl {
    pub version: u8,
    pub frame_type: u8,
    pub subtype: u8,
    pub to_ds: bool,
    pub from_ds: bool,
    pub more_frags: bool,
    pub retry: bool,
    pub power_mgmt: bool,
    pub more_data: bool,
    pub protect: bool,
    pub order: bool,
}

impl FrameControl {
    pub fn from_bits(w: u16) -> Self {
        let bit = |n: u16| w >> n & 1 == 1;
        Self {
            version: (w & 0x3) as u8,
            frame_type: (w >> 2 & 0x3) as u8,
            subtype: (w >> 4 & 0xF) as u8,
            to_ds: bit(8),
            from_ds: bit(9),
            more_frags: bit(10),
            retry: bit(11),
            power_mgmt: bit(12),
            more_data: bit(13),
            protect: bit(14),
            order: bit(15),
        }
    }

    pub fn to_bits(&self) -> u16 {
        u16::from(self.version & 0x3)
            | u16::from(self.frame_type & 0x3) << 2
            | u16::from(self.subtype & 0xF) << 4
            | u16::from(self.to_ds) << 8
            | u16::from(self.from_ds) << 9
            | u16::from(self.more_frags) << 10
            | u16::from(self.retry) << 11
            | u16::from(self.power_mgmt) << 12
            | u16::from(self.more_data) << 13
            | u16::from(self.protect) << 14
            | u16::from(self.order) << 15
    }
}

/// Management action frame without ACK, the frame kind injected for sounding.
impl Default for FrameControl {
    fn default() -> Self {
        Self::from_bits(0x80E0)
    }
}

/// The 24-byte MAC header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MacHeader {
    pub fc: FrameControl,
    pub duration: u16,
    /// Destination
    pub addr1: [u8; 6],
    /// Source
    pub addr2: [u8; 6],
    pub addr3: [u8; 6],
    /// 4 bits
    pub frag: u8,
    /// 12 bits
    pub seq: u16,
}

impl Default for MacHeader {
    fn default() -> Self {
        Self {
            fc: FrameControl::default(),
            duration: 0,
            addr1: [0x00, 0x16, 0xEA, 0x12, 0x34, 0x56],
            addr2: [0xFF; 6],
            addr3: [0xFF; 6],
            frag: 0,
            seq: 0,
        }
    }
}

impl MacHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = codec::Reader::new(data);
        let fc = FrameControl::from_bits(r.uint16()?);
        let duration = r.uint16()?;
        let addr1 = r.mac()?;
        let addr2 = r.mac()?;
        let addr3 = r.mac()?;
        let seq_ctrl = r.uint16()?;
        Ok(Self {
            fc,
            duration,
            addr1,
            addr2,
            addr3,
            frag: (seq_ctrl & 0xF) as u8,
            seq: seq_ctrl >> 4,
        })
    }

    pub fn to_bytes(&self) -> [u8; MAC_HEADER_LEN] {
        let mut buf = Vec::with_capacity(MAC_HEADER_LEN);
        codec::write_uint16(&mut buf, self.fc.to_bits());
        codec::write_uint16(&mut buf, self.duration);
        buf.extend_from_slice(&self.addr1);
        buf.extend_from_slice(&self.addr2);
        buf.extend_from_slice(&self.addr3);
        codec::write_uint16(&mut buf, u16::from(self.frag & 0xF) | (self.seq & 0x0FFF) << 4);
        let mut out = [0u8; MAC_HEADER_LEN];
        out.copy_from_slice(&buf);
        out
    }
}

impl fmt::Display for MacHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, s) = (&self.addr1, &self.addr2);
        write!(
            f,
            "MACHeader:[dest[4-6]={:02x}:{:02x}:{:02x}, src[4-6]={:02x}:{:02x}:{:02x}, seq={}, frag={}, mfrags={}]",
            d[3],
            d[4],
            d[5],
            s[3],
            s[4],
            s[5],
            self.seq,
            self.frag,
            u8::from(self.fc.more_frags)
        )
    }
}
