//! Intel MVM CSI payload.
//!
//! `streams * rx * tones` consecutive samples, each `(imag:i16, real:i16)`.
//! Tones vary fastest, then streams, then rx chains. The hardware reports
//! every occupied tone including pilots; pilots are dropped on request by
//! walking the tone plan in step with the samples. Formats without a tone
//! plan keep every tone and get a DC-centred index list.

use std::borrow::Cow;

use num_complex::Complex;
use tracing::warn;

use super::{Csi, CsiHeader, cube, offset_indices, tables};
use crate::codec;
use crate::error::{FrameError, Result};

const SAMPLE_LEN: usize = 4;

/// Decode an MVM payload into a `[tones, streams, rx]` cube.
pub fn decode(header: &CsiHeader, payload: &[u8], skip_pilots: bool) -> Result<Csi> {
    let dims = header.dimensions;
    let num_tones = dims.num_tones as usize;
    let streams = dims.num_tx as usize + dims.num_ess as usize;
    let num_rx = dims.num_rx as usize;
    let count = streams * num_rx * num_tones;
    if payload.len() < count * SAMPLE_LEN {
        return Err(FrameError::malformed("IWLMVM CSI", count * SAMPLE_LEN, payload.len()));
    }

    let no_pilots: &'static [i16] = &[];
    let (tones, pilots): (Cow<'static, [i16]>, &'static [i16]) =
        match tables::tone_plan(header.packet_format, header.cbw) {
            Some(plan) if plan.all.len() == num_tones => {
                let pilots = if skip_pilots { plan.pilot.as_slice() } else { no_pilots };
                (Cow::Borrowed(plan.all.as_slice()), pilots)
            }
            Some(_) => {
                return Err(FrameError::unsupported(format!(
                    "IWLMVM CSI with {num_tones} tones for {} {} MHz",
                    header.packet_format, header.cbw
                )));
            }
            None => {
                if skip_pilots {
                    warn!(format = %header.packet_format, cbw = %header.cbw, num_tones, "no pilot table, keeping every tone");
                }
                (Cow::Owned(centred_tones(num_tones)), no_pilots)
            }
        };
    let kept_tones = num_tones - pilots.len();

    let mut array = Vec::with_capacity(kept_tones * streams * num_rx);
    let mut next_pilot = 0usize;
    for pos in 0..count {
        let tone = pos % num_tones;
        if tone == 0 {
            next_pilot = 0;
        }
        if pilots.get(next_pilot) == Some(&tones[tone]) {
            next_pilot += 1;
            continue;
        }
        let imag = codec::read_int16(payload, pos * SAMPLE_LEN)?;
        let real = codec::read_int16(payload, pos * SAMPLE_LEN + 2)?;
        array.push(Complex::new(f64::from(real), f64::from(imag)));
    }

    let expected = kept_tones * streams * num_rx;
    if array.len() != expected {
        return Err(FrameError::underflow("IWLMVM CSI", expected, array.len()));
    }

    let indices: Vec<i16> = tones.iter().copied().filter(|t| pilots.binary_search(t).is_err()).collect();
    let mut csi = Csi::from_header(header);
    csi.dimensions.num_tones = kept_tones as u16;
    csi.subcarrier_indices = offset_indices(&indices, header.subcarrier_offset);
    csi.csi_array = cube(array, kept_tones, streams, num_rx)?;
    csi.raw_csi_data = Some(payload.to_vec());
    Ok(csi)
}

/// Index list for `n` tones around DC with no gap other than DC itself.
fn centred_tones(n: usize) -> Vec<i16> {
    let below = (n / 2) as i32;
    let above = (n - n / 2) as i32;
    (-below..0).chain(1..=above).map(|i| i as i16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChannelBandwidth, DeviceType, PacketFormat};
    use crate::csi::CsiDimension;

    fn header(format: PacketFormat, cbw: ChannelBandwidth, num_tones: u16, num_tx: u8, num_rx: u8) -> CsiHeader {
        CsiHeader {
            device_type: DeviceType::IwlMvm,
            packet_format: format,
            cbw,
            carrier_freq: 5_180_000_000,
            sampling_rate: 20_000_000,
            subcarrier_bandwidth: 312_500,
            dimensions: CsiDimension { num_tones, num_tx, num_rx, num_ess: 0, num_csi: 1 },
            ant_sel: 0,
            subcarrier_offset: 0,
        }
    }

    /// Sample k carries (imag = -k, real = k).
    fn ramp(count: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        for k in 0..count {
            codec::write_int16(&mut buf, -(k as i16));
            codec::write_int16(&mut buf, k as i16);
        }
        buf
    }

    #[test]
    fn drops_ht20_pilots() {
        let h = header(PacketFormat::Ht, ChannelBandwidth::Cbw20, 56, 1, 2);
        let csi = decode(&h, &ramp(112), true).unwrap();
        assert_eq!(csi.dimensions.num_tones, 52);
        assert_eq!(csi.csi_array.dimensions, vec![52, 1, 2]);
        assert_eq!(csi.subcarrier_indices.len(), 52);
        assert!(!csi.subcarrier_indices.contains(&7));

        // tone -21 sits at plan position 7 and is dropped, so row 7 holds sample 8
        assert_eq!(csi.csi_array.value_at(&[6, 0, 0]).unwrap(), Complex::new(6.0, -6.0));
        assert_eq!(csi.csi_array.value_at(&[7, 0, 0]).unwrap(), Complex::new(8.0, -8.0));
        // second rx chain starts again at sample 56
        assert_eq!(csi.csi_array.value_at(&[0, 0, 1]).unwrap(), Complex::new(56.0, -56.0));
    }

    #[test]
    fn keeps_pilots_when_asked() {
        let h = header(PacketFormat::Ht, ChannelBandwidth::Cbw20, 56, 1, 1);
        let csi = decode(&h, &ramp(56), false).unwrap();
        assert_eq!(csi.dimensions.num_tones, 56);
        assert_eq!(csi.subcarrier_indices.len(), 56);
        assert_eq!(csi.csi_array.value_at(&[7, 0, 0]).unwrap(), Complex::new(7.0, -7.0));
    }

    #[test]
    fn he_sizes() {
        let h = header(PacketFormat::HeSu, ChannelBandwidth::Cbw80, 996, 2, 2);
        let csi = decode(&h, &vec![0u8; 996 * 4 * 4], true).unwrap();
        assert_eq!(csi.csi_array.len(), 980 * 4);
    }

    #[test]
    fn tone_count_must_match_plan() {
        let h = header(PacketFormat::Ht, ChannelBandwidth::Cbw20, 64, 1, 1);
        assert!(matches!(
            decode(&h, &ramp(64), true),
            Err(FrameError::UnsupportedLayout { .. })
        ));
    }

    #[test]
    fn keeps_every_tone_without_pilot_table() {
        let h = header(PacketFormat::NonHt, ChannelBandwidth::Cbw40, 104, 1, 1);
        let csi = decode(&h, &ramp(104), true).unwrap();
        assert_eq!(csi.dimensions.num_tones, 104);
        assert_eq!(csi.csi_array.dimensions, vec![104, 1, 1]);
        assert_eq!(csi.subcarrier_indices.len(), 104);
        assert_eq!(csi.subcarrier_indices[0], -52);
        assert_eq!(csi.subcarrier_indices[103], 52);
        assert!(!csi.subcarrier_indices.contains(&0));
        assert_eq!(csi.csi_array.value_at(&[103, 0, 0]).unwrap(), Complex::new(103.0, -103.0));
    }

    #[test]
    fn short_payload() {
        let h = header(PacketFormat::Ht, ChannelBandwidth::Cbw20, 56, 1, 1);
        assert!(matches!(
            decode(&h, &ramp(55), true),
            Err(FrameError::MalformedLength { .. })
        ));
    }
}
