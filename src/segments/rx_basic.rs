//! RxSBasic: per-frame receiver summary.
//!
//! Version 3 layout (32 bytes):
//! ```text
//! DEVICE(u16) TSTAMP(u64) CENTER_FREQ(i16) CONTROL_FREQ(i16) CBW(u16)
//! FORMAT(u8) PKT_CBW(u16) GI(u16) MCS(u8) NUM_STS(u8) NUM_ESS(u8)
//! NUM_RX(u8) NUM_USER(u8) USER_INDEX(u8) NOISE_FLOOR(i8)
//! RSSI(i8) RSSI_CTL0(i8) RSSI_CTL1(i8) RSSI_CTL2(i8)
//! ```
//!
//! Version 1 (26 bytes) has a single frequency, one bandwidth, no user
//! fields, and stores the RSSI values as deltas above the noise floor.
//! Version 2 (28 bytes) adds `NUM_USER` and `USER_INDEX` after `NUM_RX`.

use std::fmt;

use crate::codec::{self, Reader};
use crate::common::{DeviceType, PacketFormat};
use crate::error::{FrameError, Result};
use crate::segment::{FrameSegment, Segment};

/// Receiver summary of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RxSBasic {
    pub device_type: DeviceType,
    /// Hardware timestamp
    pub tstamp: u64,
    /// MHz
    pub center_freq: i16,
    /// MHz
    pub control_freq: i16,
    /// Channel bandwidth, MHz
    pub cbw: u16,
    pub packet_format: PacketFormat,
    /// Packet bandwidth, MHz
    pub pkt_cbw: u16,
    /// Nanoseconds
    pub guard_interval: u16,
    pub mcs: u8,
    pub num_sts: u8,
    pub num_ess: u8,
    pub num_rx: u8,
    pub num_user: u8,
    pub user_index: u8,
    /// dBm
    pub noise_floor: i8,
    /// dBm
    pub rssi: i8,
    pub rssi_ctl0: i8,
    pub rssi_ctl1: i8,
    pub rssi_ctl2: i8,
}

/// RxSBasic segment layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxSBasicLayout {
    V1,
    /// Adds user count and index
    V2,
    /// Splits center/control frequency, absolute RSSI
    V3,
}

impl RxSBasicLayout {
    pub fn from_version(version: u16) -> Result<Self> {
        match version {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            _ => Err(FrameError::UnknownSegmentVersion {
                segment: RxSBasicSegment::NAME.to_string(),
                version,
            }),
        }
    }

    /// Body size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::V1 => 26,
            Self::V2 => 28,
            Self::V3 => 32,
        }
    }

    pub fn decode(self, body: &[u8]) -> Result<RxSBasic> {
        if body.len() < self.size() {
            return Err(FrameError::malformed("RxSBasic", self.size(), body.len()));
        }
        let mut r = Reader::new(body);
        let basic = match self {
            Self::V1 | Self::V2 => {
                let device_type = DeviceType::from_code(r.uint16()?);
                let tstamp = r.uint64()?;
                let center_freq = r.int16()?;
                let packet_format = PacketFormat::from_code(r.uint8()? as i8);
                let cbw = r.uint16()?;
                let guard_interval = r.uint16()?;
                let mcs = r.uint8()?;
                let num_sts = r.uint8()?;
                let num_ess = r.uint8()?;
                let num_rx = r.uint8()?;
                let (num_user, user_index) = match self {
                    Self::V2 => (r.uint8()?, r.uint8()?),
                    _ => (1, 0),
                };
                let noise_floor = r.int8()?;
                // stored relative to the noise floor
                let mut rssi = [0i8; 4];
                for v in &mut rssi {
                    *v = r.int8()?.wrapping_add(noise_floor);
                }
                RxSBasic {
                    device_type,
                    tstamp,
                    center_freq,
                    control_freq: center_freq,
                    cbw,
                    packet_format,
                    pkt_cbw: cbw,
                    guard_interval,
                    mcs,
                    num_sts,
                    num_ess,
                    num_rx,
                    num_user,
                    user_index,
                    noise_floor,
                    rssi: rssi[0],
                    rssi_ctl0: rssi[1],
                    rssi_ctl1: rssi[2],
                    rssi_ctl2: rssi[3],
                }
            }
            Self::V3 => RxSBasic {
                device_type: DeviceType::from_code(r.uint16()?),
                tstamp: r.uint64()?,
                center_freq: r.int16()?,
                control_freq: r.int16()?,
                cbw: r.uint16()?,
                packet_format: PacketFormat::from_code(r.uint8()? as i8),
                pkt_cbw: r.uint16()?,
                guard_interval: r.uint16()?,
                mcs: r.uint8()?,
                num_sts: r.uint8()?,
                num_ess: r.uint8()?,
                num_rx: r.uint8()?,
                num_user: r.uint8()?,
                user_index: r.uint8()?,
                noise_floor: r.int8()?,
                rssi: r.int8()?,
                rssi_ctl0: r.int8()?,
                rssi_ctl1: r.int8()?,
                rssi_ctl2: r.int8()?,
            },
        };
        if r.position() != body.len() {
            return Err(FrameError::underflow("RxSBasic", body.len(), r.position()));
        }
        Ok(basic)
    }
}

impl RxSBasic {
    /// Encode as a version 3 body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RxSBasicLayout::V3.size());
        codec::write_uint16(&mut buf, self.device_type.as_code());
        codec::write_uint64(&mut buf, self.tstamp);
        codec::write_int16(&mut buf, self.center_freq);
        codec::write_int16(&mut buf, self.control_freq);
        codec::write_uint16(&mut buf, self.cbw);
        codec::write_uint8(&mut buf, self.packet_format.as_code() as u8);
        codec::write_uint16(&mut buf, self.pkt_cbw);
        codec::write_uint16(&mut buf, self.guard_interval);
        codec::write_uint8(&mut buf, self.mcs);
        codec::write_uint8(&mut buf, self.num_sts);
        codec::write_uint8(&mut buf, self.num_ess);
        codec::write_uint8(&mut buf, self.num_rx);
        codec::write_uint8(&mut buf, self.num_user);
        codec::write_uint8(&mut buf, self.user_index);
        codec::write_int8(&mut buf, self.noise_floor);
        codec::write_int8(&mut buf, self.rssi);
        codec::write_int8(&mut buf, self.rssi_ctl0);
        codec::write_int8(&mut buf, self.rssi_ctl1);
        codec::write_int8(&mut buf, self.rssi_ctl2);
        buf
    }
}

impl fmt::Display for RxSBasic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RxSBasic:[device={}, center={}, control={}, CBW={}, format={}, Pkt_CBW={}, MCS={}, \
             numSTS={}, GI={}, UsrIdx/NUsr=({}/{}), timestamp={}, NF={}, RSS={}]",
            self.device_type,
            self.center_freq,
            self.control_freq,
            self.cbw,
            self.packet_format,
            self.pkt_cbw,
            self.mcs,
            self.num_sts,
            self.guard_interval,
            self.user_index,
            self.num_user,
            self.tstamp,
            self.noise_floor,
            self.rssi,
        )
    }
}

/// The `RxSBasic` segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RxSBasicSegment {
    segment: Segment,
    basic: RxSBasic,
}

impl RxSBasicSegment {
    pub const NAME: &'static str = "RxSBasic";
    pub const VERSION: u16 = 3;

    pub fn new(basic: RxSBasic) -> Self {
        let mut segment = Segment::new(Self::NAME, Self::VERSION);
        segment.add_field("core", basic.to_bytes());
        Self { segment, basic }
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, body) = Segment::open(buf, &[Self::NAME])?;
        let basic = RxSBasicLayout::from_version(segment.version())?
            .decode(body)
            .map_err(|e| e.with_raw(body))?;
        Ok(Self { segment, basic })
    }

    pub fn basic(&self) -> &RxSBasic {
        &self.basic
    }

    /// Replace the value; the segment is re-encoded as version 3.
    pub fn set_basic(&mut self, basic: RxSBasic) {
        *self = Self::new(basic);
    }
}

impl FrameSegment for RxSBasicSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for RxSBasicSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.basic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::tests::record;

    fn v1_body(noise_floor: i8, deltas: [i8; 4]) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_uint16(&mut buf, 0x9300);
        codec::write_uint64(&mut buf, 123_456);
        codec::write_int16(&mut buf, 2437);
        codec::write_uint8(&mut buf, 1);
        codec::write_uint16(&mut buf, 20);
        codec::write_uint16(&mut buf, 800);
        buf.extend_from_slice(&[7, 2, 0, 3]);
        codec::write_int8(&mut buf, noise_floor);
        for d in deltas {
            codec::write_int8(&mut buf, d);
        }
        buf
    }

    fn sample() -> RxSBasic {
        RxSBasic {
            device_type: DeviceType::IwlMvm,
            tstamp: 0xDEAD_BEEF,
            center_freq: 5250,
            control_freq: 5180,
            cbw: 80,
            packet_format: PacketFormat::Vht,
            pkt_cbw: 80,
            guard_interval: 400,
            mcs: 9,
            num_sts: 2,
            num_ess: 0,
            num_rx: 2,
            num_user: 1,
            user_index: 0,
            noise_floor: -92,
            rssi: -40,
            rssi_ctl0: -42,
            rssi_ctl1: -44,
            rssi_ctl2: -127,
        }
    }

    #[test]
    fn v1_rssi_is_relative_to_noise_floor() {
        let body = v1_body(-90, [10, 8, 6, 0]);
        assert_eq!(body.len(), 26);
        let basic = RxSBasicLayout::V1.decode(&body).unwrap();
        assert_eq!(basic.noise_floor, -90);
        assert_eq!(basic.rssi, -80);
        assert_eq!(basic.rssi_ctl0, -82);
        assert_eq!(basic.rssi_ctl2, -90);
        assert_eq!(basic.control_freq, 2437);
        assert_eq!(basic.pkt_cbw, 20);
        assert_eq!((basic.num_user, basic.user_index), (1, 0));
        assert_eq!(basic.device_type, DeviceType::Qca9300);
        assert_eq!(basic.packet_format, PacketFormat::Ht);
    }

    #[test]
    fn v2_reads_user_fields() {
        let mut body = v1_body(-95, [20, 0, 0, 0]);
        body.splice(21..21, [4, 2]);
        assert_eq!(body.len(), 28);
        let basic = RxSBasicLayout::V2.decode(&body).unwrap();
        assert_eq!((basic.num_user, basic.user_index), (4, 2));
        assert_eq!(basic.rssi, -75);
    }

    #[test]
    fn v3_rssi_is_absolute() {
        let body = sample().to_bytes();
        assert_eq!(body.len(), 32);
        let basic = RxSBasicLayout::V3.decode(&body).unwrap();
        assert_eq!(basic, sample());
        assert_eq!(basic.rssi, -40);
    }

    #[test]
    fn unnamed_device_code_decodes() {
        let mut body = sample().to_bytes();
        body[..2].copy_from_slice(&0x7777u16.to_le_bytes());
        let basic = RxSBasicLayout::V3.decode(&body).unwrap();
        assert_eq!(basic.device_type, DeviceType::Other(0x7777));
        assert_eq!(basic.to_bytes(), body);
    }

    #[test]
    fn exact_length_required() {
        let mut body = v1_body(-90, [0; 4]);
        assert!(matches!(
            RxSBasicLayout::V1.decode(&body[..25]),
            Err(FrameError::MalformedLength { .. })
        ));
        body.push(0);
        assert!(matches!(
            RxSBasicLayout::V1.decode(&body),
            Err(FrameError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn segment_decode_and_encode() {
        let buf = record("RxSBasic", 1, &v1_body(-90, [10, 0, 0, 0]));
        let seg = RxSBasicSegment::from_buffer(&buf).unwrap();
        assert_eq!(seg.basic().rssi, -80);
        assert_eq!(seg.to_buffer(), buf);

        let rebuilt = RxSBasicSegment::new(*seg.basic());
        assert_eq!(rebuilt.segment().version(), 3);
        let again = RxSBasicSegment::from_buffer(&rebuilt.to_buffer()).unwrap();
        assert_eq!(again.basic(), seg.basic());
    }

    #[test]
    fn unknown_version() {
        let buf = record("RxSBasic", 9, &[0; 32]);
        assert!(matches!(
            RxSBasicSegment::from_buffer(&buf),
            Err(FrameError::UnknownSegmentVersion { version: 9, .. })
        ));
    }

    #[test]
    fn display_summary() {
        let s = sample().to_string();
        assert!(s.starts_with("RxSBasic:[device=IWLMVM"));
        assert!(s.contains("UsrIdx/NUsr=(0/1)"));
    }
}
