//! Capture frame assembly and re-serialization.
//!
//! RX frame:
//! ```text
//! FRAME_LEN(u32) MAGIC(u32) VERSION(u16) NUM_RX_SEGMENTS(u8)
//! RX_SEGMENT... MAC_HEADER[24] [PICOSCENES_HEADER[16] TX_SEGMENT...] REST...
//! ```
//!
//! `FRAME_LEN` excludes itself. Everything from the MAC header to the end of
//! the buffer is the MPDU, which is kept verbatim next to its decoded parts.
//!
//! PicoScenes TX header:
//! ```text
//! MAGIC(u32) VERSION(u32) DEVICE(u16) NUM_SEGMENTS(u8) FRAME_TYPE(u8) TASK_ID(u16) TX_ID(u16)
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::codec::{self, Reader};
use crate::common::{DeviceType, PICOSCENES_MAGIC};
use crate::csi::CsiInterpolator;
use crate::error::Result;
use crate::mac::{MAC_HEADER_LEN, MacHeader};
use crate::segment::{DecodeOptions, FrameSegment, extract_meta};
use crate::segments::{
    BasebandSignalSegment, CsiSegment, ExtraInfoSegment, MvmExtraSegment, PayloadSegment,
    PreEqSymbolsSegment, RxSBasicSegment, RxSegment, TxSegment, UnknownSegment,
};

/// RX frame format version.
pub const FRAME_VERSION: u16 = 0x1;

pub const RX_HEADER_LEN: usize = 11;

pub const PICOSCENES_HEADER_LEN: usize = 16;

/// Version stamped into new PicoScenes TX headers.
pub const DEFAULT_PICOSCENES_HEADER_VERSION: u32 = 0x2020_1110;

/// Padding written after the MAC header when a TX frame has no PicoScenes
/// header. QCA9300 drops shorter frames as NDPs.
const NDP_PADDING: usize = 4;

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Outer header of an RX frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RxFrameHeader {
    /// Buffer length minus 4
    pub frame_length: u32,
    pub magic: u32,
    pub version: u16,
    pub num_rx_segments: u8,
}

impl RxFrameHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        Ok(Self {
            frame_length: r.uint32()?,
            magic: r.uint32()?,
            version: r.uint16()?,
            num_rx_segments: r.uint8()?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RX_HEADER_LEN);
        codec::write_uint32(&mut buf, self.frame_length);
        codec::write_uint32(&mut buf, self.magic);
        codec::write_uint16(&mut buf, self.version);
        codec::write_uint8(&mut buf, self.num_rx_segments);
        buf
    }
}

/// Header that marks a frame body as carrying PicoScenes TX segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PicoScenesHeader {
    pub version: u32,
    pub device_type: DeviceType,
    pub num_segments: u8,
    pub frame_type: u8,
    pub task_id: u16,
    pub tx_id: u16,
}

impl Default for PicoScenesHeader {
    fn default() -> Self {
        Self {
            version: DEFAULT_PICOSCENES_HEADER_VERSION,
            device_type: DeviceType::Qca9300,
            num_segments: 0,
            frame_type: 0,
            task_id: 0,
            tx_id: 0,
        }
    }
}

impl PicoScenesHeader {
    /// `Ok(None)` when `data` does not start with the magic word.
    pub fn from_bytes(data: &[u8]) -> Result<Option<Self>> {
        if codec::read_uint32(data, 0).ok() != Some(PICOSCENES_MAGIC) {
            return Ok(None);
        }
        let mut r = Reader::new(&data[4..]);
        Ok(Some(Self {
            version: r.uint32()?,
            device_type: DeviceType::from_code(r.uint16()?),
            num_segments: r.uint8()?,
            frame_type: r.uint8()?,
            task_id: r.uint16()?,
            tx_id: r.uint16()?,
        }))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PICOSCENES_HEADER_LEN);
        codec::write_uint32(&mut buf, PICOSCENES_MAGIC);
        codec::write_uint32(&mut buf, self.version);
        codec::write_uint16(&mut buf, self.device_type.as_code());
        codec::write_uint8(&mut buf, self.num_segments);
        codec::write_uint8(&mut buf, self.frame_type);
        codec::write_uint16(&mut buf, self.task_id);
        codec::write_uint16(&mut buf, self.tx_id);
        buf
    }
}

impl fmt::Display for PicoScenesHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PSFHeader:[ver=0x{:x}, device={}, numSegs={}, type={}, taskId={}, txId={}]",
            self.version, self.device_type, self.num_segments, self.frame_type, self.task_id, self.tx_id
        )
    }
}

/// Decode the MAC header, the optional PicoScenes header and its segments.
fn decode_tx_part(mpdu: &[u8]) -> Result<(MacHeader, Option<PicoScenesHeader>, Vec<TxSegment>)> {
    let mac_header = MacHeader::from_bytes(mpdu)?;
    let mut pos = MAC_HEADER_LEN;
    let Some(header) = PicoScenesHeader::from_bytes(&mpdu[pos..])? else {
        debug!(mpdu_len = mpdu.len(), "no PicoScenes TX header");
        return Ok((mac_header, None, Vec::new()));
    };
    pos += PICOSCENES_HEADER_LEN;

    let mut segments = Vec::with_capacity(header.num_segments as usize);
    for _ in 0..header.num_segments {
        let meta = extract_meta(&mpdu[pos..])?;
        trace!(name = %meta.name, version = meta.version, len = meta.record_len(), "tx segment");
        let (segment, len) = TxSegment::decode(&mpdu[pos..])?;
        segments.push(segment);
        pos += len;
    }
    Ok((mac_header, Some(header), segments))
}

// ---------------------------------------------------------------------------
// RxFrame
// ---------------------------------------------------------------------------

/// A decoded RX capture frame.
///
/// The buffer a frame was decoded from is retained; [`RxFrame::to_buffer`]
/// returns it unchanged even if public fields were edited afterwards. Use
/// [`RxFrame::rebuild_buffer`] to serialize from the fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RxFrame {
    pub header: RxFrameHeader,
    pub rx_basic: Option<RxSBasicSegment>,
    pub rx_extra_info: Option<ExtraInfoSegment>,
    pub csi: Option<CsiSegment>,
    pub pilot_csi: Option<CsiSegment>,
    pub legacy_csi: Option<CsiSegment>,
    pub baseband_signal: Option<BasebandSignalSegment>,
    pub pre_eq_symbols: Option<PreEqSymbolsSegment>,
    pub mvm_extra: Option<MvmExtraSegment>,
    /// Undecoded RX records, in arrival order
    pub rx_unknown_segments: Vec<UnknownSegment>,
    pub mac_header: MacHeader,
    pub picoscenes_header: Option<PicoScenesHeader>,
    pub tx_extra_info: Option<ExtraInfoSegment>,
    pub payload_segments: Vec<PayloadSegment>,
    /// Undecoded TX records, in arrival order
    pub tx_unknown_segments: Vec<UnknownSegment>,
    /// MAC header onward, verbatim
    pub mpdu: Vec<u8>,
    raw: Option<Vec<u8>>,
}

impl RxFrame {
    /// Decode with default options. `Ok(None)` means the buffer is not an
    /// RX frame (length, magic or version mismatch).
    pub fn from_buffer(buf: &[u8]) -> Result<Option<Self>> {
        Self::from_buffer_with(buf, &DecodeOptions::default())
    }

    pub fn from_buffer_with(buf: &[u8], options: &DecodeOptions) -> Result<Option<Self>> {
        let Ok(header) = RxFrameHeader::from_bytes(buf) else {
            debug!(len = buf.len(), "buffer shorter than an RX frame header");
            return Ok(None);
        };
        if header.frame_length as usize + 4 != buf.len()
            || header.magic != PICOSCENES_MAGIC
            || header.version != FRAME_VERSION
        {
            debug!(
                len = buf.len(),
                frame_length = header.frame_length,
                magic = format_args!("0x{:08X}", header.magic),
                version = header.version,
                "not a PicoScenes RX frame"
            );
            return Ok(None);
        }

        let mut frame = Self {
            header,
            rx_basic: None,
            rx_extra_info: None,
            csi: None,
            pilot_csi: None,
            legacy_csi: None,
            baseband_signal: None,
            pre_eq_symbols: None,
            mvm_extra: None,
            rx_unknown_segments: Vec::new(),
            mac_header: MacHeader::default(),
            picoscenes_header: None,
            tx_extra_info: None,
            payload_segments: Vec::new(),
            tx_unknown_segments: Vec::new(),
            mpdu: Vec::new(),
            raw: None,
        };

        let mut pos = RX_HEADER_LEN;
        for _ in 0..header.num_rx_segments {
            let meta = extract_meta(&buf[pos..])?;
            trace!(name = %meta.name, version = meta.version, len = meta.record_len(), "rx segment");
            let (segment, len) = RxSegment::decode(&buf[pos..], options)?;
            match segment {
                RxSegment::Basic(s) => frame.rx_basic = Some(s),
                RxSegment::ExtraInfo(s) => frame.rx_extra_info = Some(s),
                RxSegment::Csi(s) => match s.name() {
                    CsiSegment::PILOT_NAME => frame.pilot_csi = Some(s),
                    CsiSegment::LEGACY_NAME => frame.legacy_csi = Some(s),
                    _ => frame.csi = Some(s),
                },
                RxSegment::BasebandSignal(s) => frame.baseband_signal = Some(s),
                RxSegment::PreEqSymbols(s) => frame.pre_eq_symbols = Some(s),
                RxSegment::MvmExtra(s) => frame.mvm_extra = Some(s),
                RxSegment::Unknown(u) => {
                    debug!(name = %u.name, len, "preserving unknown rx segment");
                    frame.rx_unknown_segments.push(u);
                }
            }
            pos += len;
        }

        let mpdu = &buf[pos..];
        let (mac_header, picoscenes_header, tx_segments) = decode_tx_part(mpdu)?;
        frame.mac_header = mac_header;
        frame.picoscenes_header = picoscenes_header;
        for segment in tx_segments {
            match segment {
                TxSegment::ExtraInfo(s) => frame.tx_extra_info = Some(s),
                TxSegment::Payload(s) => frame.payload_segments.push(s),
                TxSegment::Unknown(u) => {
                    debug!(name = %u.name, len = u.raw.len(), "preserving unknown tx segment");
                    frame.tx_unknown_segments.push(u);
                }
            }
        }
        frame.mpdu = mpdu.to_vec();
        frame.raw = Some(buf.to_vec());
        Ok(Some(frame))
    }

    /// The decoded buffer if retained, otherwise [`RxFrame::rebuild_buffer`].
    pub fn to_buffer(&self) -> Vec<u8> {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => self.rebuild_buffer(),
        }
    }

    /// Serialize from the fields: RX header with recomputed length and count,
    /// segments in canonical order, unknown segments, then the MPDU.
    pub fn rebuild_buffer(&self) -> Vec<u8> {
        let mut segments: Vec<Vec<u8>> = Vec::new();
        if let Some(s) = &self.rx_basic {
            segments.push(s.to_buffer());
        }
        if let Some(s) = &self.rx_extra_info {
            segments.push(s.to_buffer());
        }
        for s in [&self.csi, &self.pilot_csi, &self.legacy_csi].into_iter().flatten() {
            segments.push(s.to_buffer());
        }
        if let Some(s) = &self.baseband_signal {
            segments.push(s.to_buffer());
        }
        if let Some(s) = &self.pre_eq_symbols {
            segments.push(s.to_buffer());
        }
        if let Some(s) = &self.mvm_extra {
            segments.push(s.to_buffer());
        }
        segments.extend(self.rx_unknown_segments.iter().map(|u| u.raw.clone()));

        let body_len: usize = segments.iter().map(Vec::len).sum::<usize>() + self.mpdu.len();
        let header = RxFrameHeader {
            frame_length: u32::try_from(RX_HEADER_LEN + body_len - 4).unwrap_or(u32::MAX),
            magic: PICOSCENES_MAGIC,
            version: FRAME_VERSION,
            num_rx_segments: u8::try_from(segments.len()).unwrap_or(u8::MAX),
        };

        let mut buf = header.to_bytes();
        buf.reserve(body_len);
        for s in &segments {
            buf.extend_from_slice(s);
        }
        buf.extend_from_slice(&self.mpdu);
        buf
    }

    /// Run `interpolator` over the CSI and legacy CSI measurements.
    pub fn interpolate_csi(&mut self, interpolator: &impl CsiInterpolator) -> Result<()> {
        for segment in [&mut self.csi, &mut self.legacy_csi].into_iter().flatten() {
            segment.csi_mut().interpolate(interpolator)?;
        }
        Ok(())
    }

    /// The TX side of the MPDU as a [`TxFrame`].
    pub fn tx_frame(&self) -> TxFrame {
        let mut segments = Vec::new();
        if let Some(s) = &self.tx_extra_info {
            segments.push(TxSegment::ExtraInfo(s.clone()));
        }
        segments.extend(self.payload_segments.iter().cloned().map(TxSegment::Payload));
        segments.extend(self.tx_unknown_segments.iter().cloned().map(TxSegment::Unknown));
        TxFrame {
            mac_header: self.mac_header,
            picoscenes_header: self.picoscenes_header,
            segments,
        }
    }
}

impl fmt::Display for RxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(s) = &self.rx_basic {
            parts.push(s.to_string());
        }
        if let Some(s) = &self.rx_extra_info {
            parts.push(s.to_string());
        }
        for s in [&self.csi, &self.pilot_csi, &self.legacy_csi].into_iter().flatten() {
            parts.push(format!("Rx{s}"));
        }
        if let Some(s) = &self.baseband_signal {
            parts.push(s.to_string());
        }
        if let Some(s) = &self.pre_eq_symbols {
            parts.push(s.to_string());
        }
        if let Some(s) = &self.mvm_extra {
            parts.push(s.to_string());
        }
        if !self.rx_unknown_segments.is_empty() {
            parts.push(format!("RxSegments:({})", join(&self.rx_unknown_segments)));
        }
        parts.push(self.mac_header.to_string());
        if let Some(h) = &self.picoscenes_header {
            parts.push(h.to_string());
        }
        if let Some(s) = &self.tx_extra_info {
            parts.push(s.to_string());
        }
        if !self.payload_segments.is_empty() {
            parts.push(format!("Payloads:({})", join(&self.payload_segments)));
        }
        if !self.tx_unknown_segments.is_empty() {
            parts.push(format!("TxSegments:({})", join(&self.tx_unknown_segments)));
        }
        parts.push(format!("MPDU={}B", self.mpdu.len()));
        write!(f, "RxFrame:{{{}}}", parts.join(", "))
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// TxFrame
// ---------------------------------------------------------------------------

/// A frame body to inject: MAC header, optional PicoScenes header and TX
/// segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxFrame {
    pub mac_header: MacHeader,
    pub picoscenes_header: Option<PicoScenesHeader>,
    pub segments: Vec<TxSegment>,
}

impl TxFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a frame body produced by [`TxFrame::to_buffer`] or taken from
    /// [`RxFrame::mpdu`].
    pub fn from_mpdu(mpdu: &[u8]) -> Result<Self> {
        let (mac_header, picoscenes_header, segments) = decode_tx_part(mpdu)?;
        Ok(Self { mac_header, picoscenes_header, segments })
    }

    fn header_mut(&mut self) -> &mut PicoScenesHeader {
        self.picoscenes_header.get_or_insert_with(PicoScenesHeader::default)
    }

    /// Append a segment, adding a PicoScenes header if there is none.
    pub fn add_segment(&mut self, segment: TxSegment) -> &mut Self {
        self.segments.push(segment);
        let n = u8::try_from(self.segments.len()).unwrap_or(u8::MAX);
        self.header_mut().num_segments = n;
        self
    }

    pub fn set_more_frags(&mut self) -> &mut Self {
        self.mac_header.fc.more_frags = true;
        self
    }

    pub fn set_retry(&mut self) -> &mut Self {
        self.mac_header.fc.retry = true;
        self
    }

    /// Low 4 bits are used.
    pub fn set_frag_number(&mut self, frag: u8) -> &mut Self {
        self.mac_header.frag = frag & 0xF;
        self
    }

    /// Low 12 bits are used.
    pub fn set_sequence(&mut self, seq: u16) -> &mut Self {
        self.mac_header.seq = seq & 0x0FFF;
        self
    }

    pub fn set_destination_address(&mut self, addr: [u8; 6]) -> &mut Self {
        self.mac_header.addr1 = addr;
        self
    }

    pub fn set_source_address(&mut self, addr: [u8; 6]) -> &mut Self {
        self.mac_header.addr2 = addr;
        self
    }

    pub fn set_third_address(&mut self, addr: [u8; 6]) -> &mut Self {
        self.mac_header.addr3 = addr;
        self
    }

    pub fn set_device_type(&mut self, device_type: DeviceType) -> &mut Self {
        self.header_mut().device_type = device_type;
        self
    }

    pub fn set_task_id(&mut self, task_id: u16) -> &mut Self {
        self.header_mut().task_id = task_id;
        self
    }

    pub fn set_tx_id(&mut self, tx_id: u16) -> &mut Self {
        self.header_mut().tx_id = tx_id;
        self
    }

    pub fn set_frame_type(&mut self, frame_type: u8) -> &mut Self {
        self.header_mut().frame_type = frame_type;
        self
    }

    /// Encoded size in bytes.
    pub fn total_length(&self) -> usize {
        let segments: usize = self.segments.iter().map(|s| s.to_buffer().len()).sum();
        MAC_HEADER_LEN
            + match self.picoscenes_header {
                Some(_) => PICOSCENES_HEADER_LEN + segments,
                None => NDP_PADDING,
            }
    }

    /// Serialize; `num_segments` in the PicoScenes header is recomputed.
    pub fn to_buffer(&self) -> Vec<u8> {
        let mut buf = self.mac_header.to_bytes().to_vec();
        match &self.picoscenes_header {
            Some(header) => {
                let mut header = *header;
                header.num_segments = u8::try_from(self.segments.len()).unwrap_or(u8::MAX);
                buf.extend_from_slice(&header.to_bytes());
                for segment in &self.segments {
                    buf.extend_from_slice(&segment.to_buffer());
                }
            }
            None => buf.resize(MAC_HEADER_LEN + NDP_PADDING, 0),
        }
        buf
    }
}

impl fmt::Display for TxFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxFrame:{{{}", self.mac_header)?;
        if let Some(h) = &self.picoscenes_header {
            write!(f, ", {h}")?;
        }
        if !self.segments.is_empty() {
            let segs: Vec<String> = self
                .segments
                .iter()
                .map(|s| {
                    let raw = s.to_buffer();
                    let name = extract_meta(&raw).map(|m| m.name).unwrap_or_default();
                    format!("{name}:{}B", raw.len())
                })
                .collect();
            write!(f, ", Segments:({})", segs.join(", "))?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use num_complex::Complex;

    use super::*;
    use crate::common::PacketFormat;
    use crate::csi::tests::body_v3;
    use crate::csi::{CsiDimension, Interpolated};
    use crate::error::FrameError;
    use crate::segment::tests::record;
    use crate::segments::{ExtraInfo, RxSBasic};
    use crate::signal::SignalMatrix;

    /// Wrap `segments` and `mpdu` in an RX header.
    fn rx_frame(segments: &[Vec<u8>], mpdu: &[u8]) -> Vec<u8> {
        let body: usize = segments.iter().map(Vec::len).sum::<usize>() + mpdu.len();
        let header = RxFrameHeader {
            frame_length: (RX_HEADER_LEN + body - 4) as u32,
            magic: PICOSCENES_MAGIC,
            version: FRAME_VERSION,
            num_rx_segments: segments.len() as u8,
        };
        let mut buf = header.to_bytes();
        for s in segments {
            buf.extend_from_slice(s);
        }
        buf.extend_from_slice(mpdu);
        buf
    }

    fn basic() -> Vec<u8> {
        RxSBasicSegment::new(RxSBasic {
            device_type: DeviceType::Qca9300,
            tstamp: 42,
            center_freq: 2437,
            control_freq: 2437,
            cbw: 20,
            packet_format: PacketFormat::Ht,
            pkt_cbw: 20,
            guard_interval: 800,
            mcs: 0,
            num_sts: 1,
            num_ess: 0,
            num_rx: 1,
            num_user: 1,
            user_index: 0,
            noise_floor: -95,
            rssi: -50,
            rssi_ctl0: -50,
            rssi_ctl1: -128,
            rssi_ctl2: -128,
        })
        .to_buffer()
    }

    fn extra() -> Vec<u8> {
        let mut ei = ExtraInfo::new();
        ei.set_cf(2_437_000_000);
        ExtraInfoSegment::new(ei).to_buffer()
    }

    fn csi(name: &str) -> Vec<u8> {
        let dims = CsiDimension { num_tones: 56, num_tx: 1, num_rx: 1, num_ess: 0, num_csi: 1 };
        record(name, 3, &body_v3(DeviceType::Qca9300, PacketFormat::Ht, 20, dims, 0, &[0u8; 140]))
    }

    fn tx_body() -> Vec<u8> {
        let mut tx = TxFrame::new();
        tx.set_task_id(12345)
            .set_tx_id(7)
            .set_sequence(99)
            .add_segment(TxSegment::Payload(PayloadSegment::new("hello", vec![1, 2, 3], None)));
        tx.to_buffer()
    }

    #[test]
    fn zero_segment_frame() {
        let mac = MacHeader::default().to_bytes();
        let buf = rx_frame(&[], &mac);
        let frame = RxFrame::from_buffer(&buf).unwrap().unwrap();
        assert_eq!(frame.mpdu, mac.to_vec());
        assert!(frame.rx_basic.is_none());
        assert!(frame.csi.is_none());
        assert!(frame.picoscenes_header.is_none());
        assert_eq!(frame.mac_header, MacHeader::default());
        assert_eq!(frame.rebuild_buffer(), buf);
    }

    #[test]
    fn not_this_format() {
        let mac = MacHeader::default().to_bytes();
        let good = rx_frame(&[], &mac);

        let mut bad_magic = good.clone();
        bad_magic[4] ^= 0xFF;
        assert!(RxFrame::from_buffer(&bad_magic).unwrap().is_none());

        let mut bad_version = good.clone();
        bad_version[8] = 2;
        assert!(RxFrame::from_buffer(&bad_version).unwrap().is_none());

        let mut long = good.clone();
        long.push(0);
        assert!(RxFrame::from_buffer(&long).unwrap().is_none());

        assert!(RxFrame::from_buffer(&good[..6]).unwrap().is_none());
    }

    #[test]
    fn full_frame() {
        let unknown = record("FutureFeature", 1, &[0xAB; 9]);
        let segments = vec![basic(), extra(), csi("CSI"), csi("LegacyCSI"), unknown.clone()];
        let mpdu = tx_body();
        let buf = rx_frame(&segments, &mpdu);

        let frame = RxFrame::from_buffer(&buf).unwrap().unwrap();
        assert_eq!(frame.rx_basic.as_ref().unwrap().basic().rssi, -50);
        assert_eq!(frame.rx_extra_info.as_ref().unwrap().extra_info().cf(), Some(2_437_000_000));
        assert_eq!(frame.csi.as_ref().unwrap().csi().csi_array.len(), 56);
        assert!(frame.legacy_csi.is_some());
        assert!(frame.pilot_csi.is_none());
        assert_eq!(frame.rx_unknown_segments.len(), 1);
        assert_eq!(frame.rx_unknown_segments[0].name, "FutureFeature");
        assert_eq!(frame.rx_unknown_segments[0].raw, unknown);

        let ps = frame.picoscenes_header.unwrap();
        assert_eq!((ps.task_id, ps.tx_id, ps.num_segments), (12345, 7, 1));
        assert_eq!(frame.payload_segments.len(), 1);
        assert_eq!(frame.payload_segments[0].payload().description, "hello");
        assert_eq!(frame.mac_header.seq, 99);
        assert_eq!(frame.mpdu, mpdu);

        assert_eq!(frame.to_buffer(), buf);
        assert_eq!(frame.rebuild_buffer(), buf);
    }

    #[test]
    fn rebuild_moves_unknown_segments_last() {
        let unknown = record("FutureFeature", 1, &[1, 2, 3]);
        let buf = rx_frame(&[unknown.clone(), basic(), csi("CSI")], &tx_body());
        let frame = RxFrame::from_buffer(&buf).unwrap().unwrap();

        let rebuilt = frame.rebuild_buffer();
        assert_eq!(rebuilt.len(), buf.len());
        assert_ne!(rebuilt, buf);
        assert!(rebuilt.ends_with(&[unknown.as_slice(), frame.mpdu.as_slice()].concat()));

        let again = RxFrame::from_buffer(&rebuilt).unwrap().unwrap();
        assert_eq!(again.rx_basic, frame.rx_basic);
        assert_eq!(again.csi, frame.csi);
        assert_eq!(again.rx_unknown_segments, frame.rx_unknown_segments);
        assert_eq!(again.rebuild_buffer(), rebuilt);
    }

    #[test]
    fn truncated_segment_is_fatal() {
        let with_extra_len = |extra: u32| {
            let mut seg = basic();
            let len = u32::from_le_bytes([seg[0], seg[1], seg[2], seg[3]]) + extra;
            seg[..4].copy_from_slice(&len.to_le_bytes());
            rx_frame(&[seg], &MacHeader::default().to_bytes())
        };

        // declared length runs past the end of the frame
        assert!(matches!(
            RxFrame::from_buffer(&with_extra_len(1000)),
            Err(FrameError::MalformedLength { .. })
        ));

        // declared length swallows the start of the MAC header
        assert!(matches!(
            RxFrame::from_buffer(&with_extra_len(8)),
            Err(FrameError::BufferUnderflow { context: "RxSBasic", .. })
        ));
    }

    #[test]
    fn unknown_version_is_fatal() {
        let buf = rx_frame(&[record("RxSBasic", 7, &[0; 32])], &MacHeader::default().to_bytes());
        assert!(matches!(
            RxFrame::from_buffer(&buf),
            Err(FrameError::UnknownSegmentVersion { version: 7, .. })
        ));
    }

    #[test]
    fn interpolation_replaces_tones() {
        let buf = rx_frame(&[csi("CSI"), csi("PilotCSI")], &MacHeader::default().to_bytes());
        let mut frame = RxFrame::from_buffer(&buf).unwrap().unwrap();

        let fill = |m: &SignalMatrix<Complex<f64>>, idx: &[i16]| -> Result<Interpolated> {
            let tones = idx.len() + 1;
            let mut indices = idx.to_vec();
            indices.push(0);
            let array = vec![Complex::new(1.0, 0.0); tones];
            let csi = SignalMatrix::new(array, vec![tones as i64, 1, 1], m.majority)?;
            let magnitude = SignalMatrix::new(vec![1.0; tones], vec![tones as i64, 1, 1], m.majority)?;
            let phase = SignalMatrix::new(vec![0.0; tones], vec![tones as i64, 1, 1], m.majority)?;
            Ok(Interpolated { csi, magnitude, phase, subcarrier_indices: indices })
        };
        frame.interpolate_csi(&fill).unwrap();

        let csi = frame.csi.as_ref().unwrap().csi();
        assert_eq!(csi.dimensions.num_tones, 57);
        assert_eq!(csi.subcarrier_indices.len(), 57);
        // pilot CSI is left alone
        assert_eq!(frame.pilot_csi.as_ref().unwrap().csi().dimensions.num_tones, 56);
        // record bytes are unchanged
        assert_eq!(frame.to_buffer(), buf);
    }

    #[test]
    fn tx_frame_round_trip() {
        let mut tx = TxFrame::new();
        let mut ei = ExtraInfo::new();
        ei.set_txpower(15);
        tx.set_device_type(DeviceType::IwlMvm)
            .set_frame_type(0x10)
            .set_retry()
            .set_frag_number(3)
            .set_destination_address([1, 2, 3, 4, 5, 6])
            .add_segment(TxSegment::ExtraInfo(ExtraInfoSegment::new(ei)))
            .add_segment(TxSegment::Payload(PayloadSegment::new("p", vec![9; 10], None)));
        let body = tx.to_buffer();
        assert_eq!(body.len(), tx.total_length());

        let back = TxFrame::from_mpdu(&body).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.picoscenes_header.unwrap().num_segments, 2);

        let rx = RxFrame::from_buffer(&rx_frame(&[], &body)).unwrap().unwrap();
        assert_eq!(rx.tx_frame(), tx);
        assert_eq!(rx.tx_extra_info.as_ref().unwrap().extra_info().txpower(), Some(15));
    }

    #[test]
    fn tx_frame_without_header_is_padded() {
        let tx = TxFrame::new();
        let body = tx.to_buffer();
        assert_eq!(body.len(), MAC_HEADER_LEN + NDP_PADDING);
        assert_eq!(tx.total_length(), body.len());
        let back = TxFrame::from_mpdu(&body).unwrap();
        assert!(back.picoscenes_header.is_none());
        assert!(back.segments.is_empty());
    }

    #[test]
    fn picoscenes_header_layout() {
        let h = PicoScenesHeader { task_id: 0x1234, ..PicoScenesHeader::default() };
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), PICOSCENES_HEADER_LEN);
        assert_eq!(&bytes[..4], &[0x15, 0x03, 0x15, 0x20]);
        assert_eq!(&bytes[4..8], &[0x10, 0x11, 0x20, 0x20]);
        assert_eq!(&bytes[8..10], &[0x00, 0x93]);
        assert_eq!(&bytes[12..14], &[0x34, 0x12]);
        assert_eq!(PicoScenesHeader::from_bytes(&bytes).unwrap(), Some(h));
        assert_eq!(PicoScenesHeader::from_bytes(&[0; 16]).unwrap(), None);
    }

    #[test]
    fn unnamed_tx_device_code_decodes() {
        let mut tx = TxFrame::new();
        tx.set_device_type(DeviceType::Other(0x7777))
            .add_segment(TxSegment::Payload(PayloadSegment::new("p", vec![1], None)));
        let body = tx.to_buffer();
        assert_eq!(&body[MAC_HEADER_LEN + 8..MAC_HEADER_LEN + 10], &[0x77, 0x77]);

        let rx = RxFrame::from_buffer(&rx_frame(&[], &body)).unwrap().unwrap();
        assert_eq!(rx.picoscenes_header.unwrap().device_type, DeviceType::Other(0x7777));
        assert_eq!(rx.payload_segments.len(), 1);
    }

    #[test]
    fn display_lists_parts() {
        let buf = rx_frame(&[basic(), record("FutureFeature", 1, &[0; 2])], &tx_body());
        let text = RxFrame::from_buffer(&buf).unwrap().unwrap().to_string();
        assert!(text.starts_with("RxFrame:{RxSBasic:["));
        assert!(text.contains("RxSegments:(FutureFeature:["));
        assert!(text.contains("PSFHeader:[ver=0x20201110"));
        assert!(text.contains("Payloads:(Payload:[Type=RawData, Description=hello, length=3B])"));
        assert!(text.ends_with(&format!("MPDU={}B}}", tx_body().len())));
    }
}
