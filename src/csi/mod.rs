//! Normalized CSI values and the per-vendor decoders that produce them.
//!
//! CSI segment body (versions 1-3 share the prefix):
//! ```text
//! DEVICE(u16) FORMAT(i8) CBW(u16) CARRIER(u64) SAMPLING(u64) SC_BW(u32)
//! NUM_TONES(u16) NUM_TX(u8) NUM_RX(u8) NUM_ESS(u8) [NUM_CSI(u16), v3]
//! ANT_SEL(u8) [SC_OFFSET(i16), v2+] CSI_LEN(u32) VENDOR_PAYLOAD[CSI_LEN]
//! ```
//!
//! The vendor payload is dispatched on `DEVICE`:
//! - [`atheros`]: QCA9300 packed 10-bit samples
//! - [`intel`]: IWL5300 packed 8-bit samples with chain permutation
//! - [`mvm`]: Intel MVM 16-bit sample pairs with pilot removal
//! - [`sdr`]: explicit index list plus a [`SignalMatrix`]
//!
//! Every decoded cube has dimensions `[tones, streams, rx]` (times `num_csi`
//! groups for SDR) stored column-major.

pub mod atheros;
pub mod intel;
pub mod mvm;
pub mod sdr;
pub mod tables;

use std::fmt;

use num_complex::Complex;

use crate::codec::{self, Reader};
use crate::common::{ChannelBandwidth, DeviceType, PacketFormat};
use crate::error::{FrameError, Result};
use crate::segment::DecodeOptions;
use crate::signal::{Majority, SignalMatrix};

pub use tables::SubcarrierSet;

/// Stream and tone counts of a CSI measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CsiDimension {
    pub num_tones: u16,
    pub num_tx: u8,
    pub num_rx: u8,
    /// Extension spatial streams used for sounding
    pub num_ess: u8,
    /// CSI groups in one measurement (SDR only, otherwise 1)
    pub num_csi: u16,
}

impl CsiDimension {
    /// `(num_tx + num_ess) * num_rx`.
    pub fn num_streams(&self) -> usize {
        (self.num_tx as usize + self.num_ess as usize) * self.num_rx as usize
    }

    /// Total complex samples across all tones, streams and groups.
    pub fn total_samples(&self) -> usize {
        self.num_streams() * self.num_tones as usize * self.num_csi as usize
    }
}

/// Fixed part of a CSI segment body, parsed before vendor dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsiHeader {
    pub device_type: DeviceType,
    pub packet_format: PacketFormat,
    pub cbw: ChannelBandwidth,
    pub carrier_freq: u64,
    pub sampling_rate: u64,
    pub subcarrier_bandwidth: u32,
    pub dimensions: CsiDimension,
    pub ant_sel: u8,
    pub subcarrier_offset: i16,
}

/// CSI segment body layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiLayout {
    V1,
    /// Adds the subcarrier offset
    V2,
    /// Adds the CSI group count
    V3,
}

impl CsiLayout {
    pub fn from_version(name: &str, version: u16) -> Result<Self> {
        match version {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            _ => Err(FrameError::UnknownSegmentVersion { segment: name.to_string(), version }),
        }
    }

    pub fn version(self) -> u16 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Parse the fixed header; returns it together with the vendor payload.
    pub fn read_header<'a>(self, body: &'a [u8]) -> Result<(CsiHeader, &'a [u8])> {
        let mut r = Reader::new(body);
        let device_type = DeviceType::from_code(r.uint16()?);
        let packet_format = PacketFormat::from_code(r.int8()?);
        let cbw = ChannelBandwidth::from_mhz(r.uint16()?)?;
        let carrier_freq = r.uint64()?;
        let sampling_rate = r.uint64()?;
        let subcarrier_bandwidth = r.uint32()?;
        let num_tones = r.uint16()?;
        let num_tx = r.uint8()?;
        let num_rx = r.uint8()?;
        let num_ess = r.uint8()?;
        let num_csi = match self {
            Self::V3 => r.uint16()?,
            Self::V1 | Self::V2 => 1,
        };
        let ant_sel = r.uint8()?;
        let subcarrier_offset = match self {
            Self::V2 | Self::V3 => r.int16()?,
            Self::V1 => 0,
        };
        let csi_len = r.uint32()? as usize;
        let payload = r.bytes(csi_len)?;
        if r.remaining() != 0 {
            return Err(FrameError::underflow("CSI", body.len(), r.position()));
        }

        let header = CsiHeader {
            device_type,
            packet_format,
            cbw,
            carrier_freq,
            sampling_rate,
            subcarrier_bandwidth,
            dimensions: CsiDimension { num_tones, num_tx, num_rx, num_ess, num_csi },
            ant_sel,
            subcarrier_offset,
        };
        Ok((header, payload))
    }
}

// ---------------------------------------------------------------------------
// Csi
// ---------------------------------------------------------------------------

/// One normalized CSI measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Csi {
    pub device_type: DeviceType,
    pub packet_format: PacketFormat,
    pub cbw: ChannelBandwidth,
    /// Hz
    pub carrier_freq: u64,
    /// Hz
    pub sampling_rate: u64,
    /// Hz
    pub subcarrier_bandwidth: u32,
    pub dimensions: CsiDimension,
    pub ant_sel: u8,
    pub subcarrier_offset: i16,
    /// Tone offset of each row of `csi_array`
    pub subcarrier_indices: Vec<i16>,
    pub csi_array: SignalMatrix<Complex<f64>>,
    pub magnitude_array: SignalMatrix<f64>,
    pub phase_array: SignalMatrix<f64>,
    /// Vendor payload as received; re-emitted verbatim on encode
    #[cfg_attr(feature = "serde", serde(skip))]
    pub raw_csi_data: Option<Vec<u8>>,
}

impl Csi {
    /// Start a value from a parsed header; vendor decoders fill the rest.
    pub(crate) fn from_header(header: &CsiHeader) -> Self {
        Self {
            device_type: header.device_type,
            packet_format: header.packet_format,
            cbw: header.cbw,
            carrier_freq: header.carrier_freq,
            sampling_rate: header.sampling_rate,
            subcarrier_bandwidth: header.subcarrier_bandwidth,
            dimensions: header.dimensions,
            ant_sel: header.ant_sel,
            subcarrier_offset: header.subcarrier_offset,
            subcarrier_indices: Vec::new(),
            csi_array: SignalMatrix::default(),
            magnitude_array: SignalMatrix::default(),
            phase_array: SignalMatrix::default(),
            raw_csi_data: None,
        }
    }

    /// Decode a CSI segment body of the given layout.
    pub fn decode(layout: CsiLayout, body: &[u8], options: &DecodeOptions) -> Result<Self> {
        let (header, payload) = layout.read_header(body)?;
        match header.device_type {
            DeviceType::Qca9300 => atheros::decode(&header, payload),
            DeviceType::Iwl5300 => intel::decode(&header, payload),
            DeviceType::IwlMvm => mvm::decode(&header, payload, options.skip_mvm_pilots),
            DeviceType::Usrp | DeviceType::VirtualSdr => sdr::decode(&header, payload),
            DeviceType::Mac80211Compatible | DeviceType::Unknown | DeviceType::Other(_) => {
                Err(FrameError::UnsupportedDevice { device: header.device_type.as_code() })
            }
        }
    }

    /// Encode as a version 3 body.
    ///
    /// The vendor payload comes from `raw_csi_data` when present. Without it
    /// only SDR CSI can be encoded; hardware bit layouts are never re-packed.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = match &self.raw_csi_data {
            Some(raw) => raw.clone(),
            None if self.device_type.is_sdr() => sdr::encode(self)?,
            None => {
                return Err(FrameError::unsupported(format!(
                    "re-packing {} CSI without its raw payload",
                    self.device_type
                )));
            }
        };
        let csi_len = u32::try_from(payload.len())
            .map_err(|_| FrameError::unsupported("CSI payload over 4 GiB"))?;

        let d = &self.dimensions;
        let mut buf = Vec::with_capacity(40 + payload.len());
        codec::write_uint16(&mut buf, self.device_type.as_code());
        codec::write_int8(&mut buf, self.packet_format.as_code());
        codec::write_uint16(&mut buf, self.cbw.as_mhz());
        codec::write_uint64(&mut buf, self.carrier_freq);
        codec::write_uint64(&mut buf, self.sampling_rate);
        codec::write_uint32(&mut buf, self.subcarrier_bandwidth);
        codec::write_uint16(&mut buf, d.num_tones);
        codec::write_uint8(&mut buf, d.num_tx);
        codec::write_uint8(&mut buf, d.num_rx);
        codec::write_uint8(&mut buf, d.num_ess);
        codec::write_uint16(&mut buf, d.num_csi);
        codec::write_uint8(&mut buf, self.ant_sel);
        codec::write_int16(&mut buf, self.subcarrier_offset);
        codec::write_uint32(&mut buf, csi_len);
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Derive magnitude and (wrapped) phase from `csi_array` if they are empty.
    pub fn fill_magnitude_phase(&mut self) {
        if self.magnitude_array.is_empty() {
            self.magnitude_array = SignalMatrix {
                array: self.csi_array.array.iter().map(|c| c.norm()).collect(),
                dimensions: self.csi_array.dimensions.clone(),
                majority: self.csi_array.majority,
            };
        }
        if self.phase_array.is_empty() {
            self.phase_array = SignalMatrix {
                array: self.csi_array.array.iter().map(|c| c.arg()).collect(),
                dimensions: self.csi_array.dimensions.clone(),
                majority: self.csi_array.majority,
            };
        }
    }

    /// Replace the cube, magnitude, phase and tone list with interpolated ones.
    pub fn interpolate(&mut self, interpolator: &impl CsiInterpolator) -> Result<()> {
        let out = interpolator.interpolate(&self.csi_array, &self.subcarrier_indices)?;
        let num_tones = u16::try_from(out.subcarrier_indices.len())
            .map_err(|_| FrameError::unsupported("more than 65535 interpolated tones"))?;
        self.csi_array = out.csi;
        self.magnitude_array = out.magnitude;
        self.phase_array = out.phase;
        self.subcarrier_indices = out.subcarrier_indices;
        self.dimensions.num_tones = num_tones;
        Ok(())
    }
}

impl fmt::Display for Csi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.dimensions;
        write!(
            f,
            "CSI:[device={}, format={}, CBW={}, cf={:.3} MHz, sf={:.3} MHz, subcarrierBW={} kHz, \
             dim(nTones,nSTS,nESS,nRx,nCSI)=({},{},{},{},{}), raw={}B]",
            self.device_type,
            self.packet_format,
            self.cbw,
            self.carrier_freq as f64 / 1e6,
            self.sampling_rate as f64 / 1e6,
            self.subcarrier_bandwidth / 1000,
            d.num_tones,
            d.num_tx,
            d.num_ess,
            d.num_rx,
            d.num_csi,
            self.raw_csi_data.as_ref().map_or(0, Vec::len),
        )
    }
}

// ---------------------------------------------------------------------------
// Interpolation boundary
// ---------------------------------------------------------------------------

/// Result of an interpolation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolated {
    pub csi: SignalMatrix<Complex<f64>>,
    pub magnitude: SignalMatrix<f64>,
    pub phase: SignalMatrix<f64>,
    pub subcarrier_indices: Vec<i16>,
}

/// External routine that fills in missing tones (DC, pilots, guard gaps)
/// and unwraps phase.
pub trait CsiInterpolator {
    fn interpolate(
        &self,
        csi: &SignalMatrix<Complex<f64>>,
        subcarrier_indices: &[i16],
    ) -> Result<Interpolated>;
}

impl<F> CsiInterpolator for F
where
    F: Fn(&SignalMatrix<Complex<f64>>, &[i16]) -> Result<Interpolated>,
{
    fn interpolate(
        &self,
        csi: &SignalMatrix<Complex<f64>>,
        subcarrier_indices: &[i16],
    ) -> Result<Interpolated> {
        self(csi, subcarrier_indices)
    }
}

// ---------------------------------------------------------------------------
// Shared vendor helpers
// ---------------------------------------------------------------------------

/// Shift a table by the header's subcarrier offset.
pub(crate) fn offset_indices(table: &[i16], offset: i16) -> Vec<i16> {
    table.iter().map(|&i| i.wrapping_add(offset)).collect()
}

/// Wrap a `[tones, streams, rx]` cube stored column-major.
pub(crate) fn cube(
    array: Vec<Complex<f64>>,
    tones: usize,
    streams: usize,
    rx: usize,
) -> Result<SignalMatrix<Complex<f64>>> {
    SignalMatrix::new(array, vec![tones as i64, streams as i64, rx as i64], Majority::ColumnMajor)
}

/// Streams present beyond `num_tx` (extension spatial streams).
pub(crate) fn extra_streams(context: &'static str, actual: usize, num_tx: u8) -> Result<u8> {
    actual
        .checked_sub(num_tx as usize)
        .and_then(|ess| u8::try_from(ess).ok())
        .ok_or(FrameError::underflow(context, num_tx as usize, actual))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a v3 body around `payload`.
    pub(crate) fn body_v3(
        device: DeviceType,
        format: PacketFormat,
        cbw: u16,
        dims: CsiDimension,
        ant_sel: u8,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_uint16(&mut buf, device.as_code());
        codec::write_int8(&mut buf, format.as_code());
        codec::write_uint16(&mut buf, cbw);
        codec::write_uint64(&mut buf, 5_200_000_000);
        codec::write_uint64(&mut buf, 20_000_000);
        codec::write_uint32(&mut buf, 312_500);
        codec::write_uint16(&mut buf, dims.num_tones);
        codec::write_uint8(&mut buf, dims.num_tx);
        codec::write_uint8(&mut buf, dims.num_rx);
        codec::write_uint8(&mut buf, dims.num_ess);
        codec::write_uint16(&mut buf, dims.num_csi);
        codec::write_uint8(&mut buf, ant_sel);
        codec::write_int16(&mut buf, 0);
        codec::write_uint32(&mut buf, payload.len() as u32);
        buf.extend_from_slice(payload);
        buf
    }

    fn dims(num_tones: u16, num_tx: u8, num_rx: u8) -> CsiDimension {
        CsiDimension { num_tones, num_tx, num_rx, num_ess: 0, num_csi: 1 }
    }

    #[test]
    fn dimension_counts() {
        let d = CsiDimension { num_tones: 56, num_tx: 2, num_rx: 3, num_ess: 1, num_csi: 2 };
        assert_eq!(d.num_streams(), 9);
        assert_eq!(d.total_samples(), 9 * 56 * 2);
    }

    #[test]
    fn v1_header_has_no_offset_or_groups() {
        let mut body = Vec::new();
        codec::write_uint16(&mut body, 0x9300);
        codec::write_int8(&mut body, 1);
        codec::write_uint16(&mut body, 20);
        codec::write_uint64(&mut body, 2_412_000_000);
        codec::write_uint64(&mut body, 20_000_000);
        codec::write_uint32(&mut body, 312_500);
        codec::write_uint16(&mut body, 56);
        body.extend_from_slice(&[1, 1, 0, 5]);
        codec::write_uint32(&mut body, 2);
        body.extend_from_slice(&[0xAA, 0xBB]);

        let (header, payload) = CsiLayout::V1.read_header(&body).unwrap();
        assert_eq!(header.dimensions.num_csi, 1);
        assert_eq!(header.subcarrier_offset, 0);
        assert_eq!(header.ant_sel, 5);
        assert_eq!(header.carrier_freq, 2_412_000_000);
        assert_eq!(payload, &[0xAA, 0xBB]);

        assert!(matches!(
            CsiLayout::V2.read_header(&body),
            Err(FrameError::MalformedLength { .. })
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut body = body_v3(DeviceType::Usrp, PacketFormat::Ht, 20, dims(1, 1, 1), 0, &[]);
        body.push(0);
        assert!(matches!(
            CsiLayout::V3.read_header(&body),
            Err(FrameError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn unknown_layout_version() {
        assert!(matches!(
            CsiLayout::from_version("CSI", 4),
            Err(FrameError::UnknownSegmentVersion { version: 4, .. })
        ));
    }

    #[test]
    fn device_without_csi_is_rejected() {
        let body = body_v3(DeviceType::Mac80211Compatible, PacketFormat::Ht, 20, dims(56, 1, 1), 0, &[]);
        assert!(matches!(
            Csi::decode(CsiLayout::V3, &body, &DecodeOptions::default()),
            Err(FrameError::UnsupportedDevice { device: 0x802 })
        ));
    }

    #[test]
    fn encode_reuses_raw_payload() {
        let payload = vec![0u8; 140];
        let body = body_v3(DeviceType::Qca9300, PacketFormat::Ht, 20, dims(56, 1, 1), 0, &payload);
        let csi = Csi::decode(CsiLayout::V3, &body, &DecodeOptions::default()).unwrap();
        assert_eq!(csi.encode().unwrap(), body);
    }

    #[test]
    fn vendor_csi_without_raw_cannot_encode() {
        let payload = vec![0u8; 140];
        let body = body_v3(DeviceType::Qca9300, PacketFormat::Ht, 20, dims(56, 1, 1), 0, &payload);
        let mut csi = Csi::decode(CsiLayout::V3, &body, &DecodeOptions::default()).unwrap();
        csi.raw_csi_data = None;
        assert!(matches!(csi.encode(), Err(FrameError::UnsupportedLayout { .. })));
    }

    #[test]
    fn magnitude_and_phase() {
        let mut csi = Csi {
            csi_array: cube(vec![Complex::new(3.0, 4.0), Complex::new(0.0, -2.0)], 2, 1, 1).unwrap(),
            ..Csi::from_header(&CsiHeader {
                device_type: DeviceType::Usrp,
                packet_format: PacketFormat::Ht,
                cbw: ChannelBandwidth::Cbw20,
                carrier_freq: 0,
                sampling_rate: 0,
                subcarrier_bandwidth: 0,
                dimensions: dims(2, 1, 1),
                ant_sel: 0,
                subcarrier_offset: 0,
            })
        };
        csi.fill_magnitude_phase();
        assert_eq!(csi.magnitude_array.array, vec![5.0, 2.0]);
        assert!((csi.phase_array.array[1] + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(csi.magnitude_array.dimensions, vec![2, 1, 1]);
    }

    #[test]
    fn interpolation_replaces_tones() {
        let payload = vec![0u8; 140];
        let body = body_v3(DeviceType::Qca9300, PacketFormat::Ht, 20, dims(56, 1, 1), 0, &payload);
        let mut csi = Csi::decode(CsiLayout::V3, &body, &DecodeOptions::default()).unwrap();

        let fill_dc = |m: &SignalMatrix<Complex<f64>>, idx: &[i16]| -> Result<Interpolated> {
            let mut indices: Vec<i16> = idx.to_vec();
            indices.push(0);
            indices.sort_unstable();
            let n = indices.len();
            let mut array = m.array.clone();
            array.push(Complex::new(0.0, 0.0));
            Ok(Interpolated {
                csi: cube(array, n, 1, 1)?,
                magnitude: SignalMatrix::new(vec![0.0; n], vec![n as i64, 1, 1], Majority::ColumnMajor)?,
                phase: SignalMatrix::new(vec![0.0; n], vec![n as i64, 1, 1], Majority::ColumnMajor)?,
                subcarrier_indices: indices,
            })
        };
        csi.interpolate(&fill_dc).unwrap();
        assert_eq!(csi.dimensions.num_tones, 57);
        assert_eq!(csi.subcarrier_indices.len(), 57);
        assert_eq!(csi.csi_array.dimensions, vec![57, 1, 1]);
        assert!(csi.subcarrier_indices.contains(&0));
    }
}
