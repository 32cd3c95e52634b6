//! QCA9300 CSI payload.
//!
//! The payload is a stream of 5-byte groups, each holding four signed 10-bit
//! values packed LSB first:
//! ```text
//! v0 = b0      | b1[1:0] << 8
//! v1 = b1[7:2] | b2[3:0] << 6
//! v2 = b2[7:4] | b3[5:0] << 4
//! v3 = b3[7:6] | b4      << 2
//! ```
//! Values come as `(imag, real)` pairs. The hardware enumerates samples with
//! rx fastest, then stream, then tone.

use num_complex::Complex;

use super::{Csi, CsiHeader, cube, extra_streams, offset_indices, tables};
use crate::common::ChannelBandwidth;
use crate::error::{FrameError, Result};

const GROUP_LEN: usize = 5;

/// Bytes one stream of one rx chain occupies.
fn bytes_per_stream(cbw: ChannelBandwidth) -> Result<usize> {
    match cbw {
        ChannelBandwidth::Cbw20 => Ok(140),
        ChannelBandwidth::Cbw40 => Ok(285),
        other => Err(FrameError::unsupported(format!("QCA9300 CSI at {other} MHz"))),
    }
}

/// Sign-extend a 10-bit value.
fn sign_extend_10(v: u16) -> i16 {
    if v & 0x200 != 0 { v as i16 - 1024 } else { v as i16 }
}

/// Unpack four signed 10-bit values from one 5-byte group.
pub fn unpack_group(g: &[u8; GROUP_LEN]) -> [i16; 4] {
    let b = g.map(u16::from);
    [
        sign_extend_10(b[0] | (b[1] & 0x03) << 8),
        sign_extend_10((b[1] & 0xFC) >> 2 | (b[2] & 0x0F) << 6),
        sign_extend_10((b[2] & 0xF0) >> 4 | (b[3] & 0x3F) << 4),
        sign_extend_10((b[3] & 0xC0) >> 6 | b[4] << 2),
    ]
}

/// Decode a QCA9300 payload into a `[tones, streams, rx]` cube.
///
/// The stream count is taken from the payload length, since the hardware
/// appends sounding streams the header does not count.
pub fn decode(header: &CsiHeader, payload: &[u8]) -> Result<Csi> {
    let dims = header.dimensions;
    let num_rx = dims.num_rx as usize;
    let num_tones = dims.num_tones as usize;
    if num_rx == 0 {
        return Err(FrameError::unsupported("QCA9300 CSI with zero rx chains"));
    }

    let num_sts = payload.len() / bytes_per_stream(header.cbw)? / num_rx;
    let num_ess = extra_streams("QCA9300 CSI", num_sts, dims.num_tx)?;
    let indices = tables::atheros_indices(header.cbw)
        .filter(|t| t.len() == num_tones)
        .ok_or_else(|| {
            FrameError::unsupported(format!("QCA9300 CSI with {num_tones} tones at {} MHz", header.cbw))
        })?;

    let total = num_rx * num_sts * num_tones;
    let groups = total / 2;
    if payload.len() < groups * GROUP_LEN {
        return Err(FrameError::malformed("QCA9300 CSI", groups * GROUP_LEN, payload.len()));
    }

    let mut array = vec![Complex::new(0.0, 0.0); total];
    for (i, chunk) in payload.chunks_exact(GROUP_LEN).take(groups).enumerate() {
        let mut group = [0u8; GROUP_LEN];
        group.copy_from_slice(chunk);
        let v = unpack_group(&group);
        for (k, (imag, real)) in [(v[0], v[1]), (v[2], v[3])].into_iter().enumerate() {
            let value_pos = i * 2 + k;
            let rx = value_pos % num_rx;
            let tx = (value_pos / num_rx) % num_sts;
            let tone = value_pos / (num_rx * num_sts);
            let pos = rx * (num_sts * num_tones) + tx * num_tones + tone;
            array[pos] = Complex::new(f64::from(real), f64::from(imag));
        }
    }

    let mut csi = Csi::from_header(header);
    csi.dimensions.num_ess = num_ess;
    csi.subcarrier_indices = offset_indices(indices, header.subcarrier_offset);
    csi.csi_array = cube(array, num_tones, num_sts, num_rx)?;
    csi.raw_csi_data = Some(payload.to_vec());
    Ok(csi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DeviceType, PacketFormat};
    use crate::csi::CsiDimension;

    fn header(num_tx: u8, num_rx: u8, cbw: ChannelBandwidth, num_tones: u16) -> CsiHeader {
        CsiHeader {
            device_type: DeviceType::Qca9300,
            packet_format: PacketFormat::Ht,
            cbw,
            carrier_freq: 2_437_000_000,
            sampling_rate: 20_000_000,
            subcarrier_bandwidth: 312_500,
            dimensions: CsiDimension { num_tones, num_tx, num_rx, num_ess: 0, num_csi: 1 },
            ant_sel: 0,
            subcarrier_offset: 0,
        }
    }

    /// Pack four 10-bit values the way the hardware does.
    fn pack_group(v: [i16; 4]) -> [u8; 5] {
        let u = v.map(|x| (x as u16) & 0x3FF);
        [
            u[0] as u8,
            ((u[0] >> 8) | (u[1] << 2)) as u8,
            ((u[1] >> 6) | (u[2] << 4)) as u8,
            ((u[2] >> 4) | (u[3] << 6)) as u8,
            (u[3] >> 2) as u8,
        ]
    }

    #[test]
    fn zero_group() {
        assert_eq!(unpack_group(&[0, 0, 0, 0, 0]), [0, 0, 0, 0]);
    }

    #[test]
    fn sign_extension_of_value_three() {
        // v3 = 0x200: b3 bits 7:6 = 0b00, b4 = 0x80
        assert_eq!(unpack_group(&[0, 0, 0, 0, 0x80]), [0, 0, 0, -512]);
        assert_eq!(unpack_group(&[0xFF, 0x03, 0, 0, 0]), [-1, 0, 0, 0]);
        assert_eq!(unpack_group(&[0xFF, 0x01, 0, 0, 0]), [511, 0, 0, 0]);
    }

    #[test]
    fn pack_unpack_agree() {
        for v in [[1, -1, 300, -300], [-512, 511, 0, 7], [42, -42, -1, 1]] {
            assert_eq!(unpack_group(&pack_group(v)), v);
        }
    }

    #[test]
    fn zero_payload_decodes_to_zeros() {
        let csi = decode(&header(1, 1, ChannelBandwidth::Cbw20, 56), &[0u8; 140]).unwrap();
        assert_eq!(csi.csi_array.len(), 56);
        assert!(csi.csi_array.array.iter().all(|c| *c == Complex::new(0.0, 0.0)));
        assert_eq!(csi.subcarrier_indices.first(), Some(&-28));
        assert_eq!(csi.subcarrier_indices.last(), Some(&28));
    }

    #[test]
    fn placement_rx_fastest() {
        // 2 rx, 1 stream, 56 tones: value_pos 0 -> (rx0, tone0), 1 -> (rx1, tone0), 2 -> (rx0, tone1)
        let mut payload = vec![0u8; 280];
        payload[..5].copy_from_slice(&pack_group([10, 20, 30, 40]));
        payload[5..10].copy_from_slice(&pack_group([-5, -6, 0, 0]));
        let csi = decode(&header(1, 2, ChannelBandwidth::Cbw20, 56), &payload).unwrap();

        assert_eq!(csi.csi_array.dimensions, vec![56, 1, 2]);
        assert_eq!(csi.csi_array.value_at(&[0, 0, 0]).unwrap(), Complex::new(20.0, 10.0));
        assert_eq!(csi.csi_array.value_at(&[0, 0, 1]).unwrap(), Complex::new(40.0, 30.0));
        assert_eq!(csi.csi_array.value_at(&[1, 0, 0]).unwrap(), Complex::new(-6.0, -5.0));
    }

    #[test]
    fn extra_streams_from_length() {
        let csi = decode(&header(1, 1, ChannelBandwidth::Cbw20, 56), &[0u8; 280]).unwrap();
        assert_eq!(csi.dimensions.num_ess, 1);
        assert_eq!(csi.csi_array.dimensions, vec![56, 2, 1]);
        assert_eq!(csi.csi_array.len(), csi.dimensions.total_samples());
    }

    #[test]
    fn short_payload_is_contract_error() {
        assert!(matches!(
            decode(&header(2, 1, ChannelBandwidth::Cbw20, 56), &[0u8; 140]),
            Err(FrameError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn forty_mhz_offsets() {
        let mut h = header(1, 1, ChannelBandwidth::Cbw40, 114);
        h.subcarrier_offset = 4;
        let csi = decode(&h, &[0u8; 285]).unwrap();
        assert_eq!(csi.subcarrier_indices.len(), 114);
        assert_eq!(csi.subcarrier_indices[0], -54);
    }

    #[test]
    fn unsupported_bandwidth() {
        assert!(matches!(
            decode(&header(1, 1, ChannelBandwidth::Cbw80, 242), &[0u8; 600]),
            Err(FrameError::UnsupportedLayout { .. })
        ));
    }
}
