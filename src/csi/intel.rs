//! IWL5300 CSI payload.
//!
//! 30 grouped tones. Each tone starts with a 3-bit gap followed by
//! `16 * streams * rx` bits of `(real:i8, imag:i8)` samples that are not
//! byte aligned:
//! ```text
//! tone t: [3 pad bits] [re im]rx0,tx0 [re im]rx0,tx1 ... [re im]rxN,txM
//! ```
//!
//! Receive chains are reordered by the antenna selection byte, see
//! [`compute_legacy_intel_chain_permutation`].

use num_complex::Complex;

use super::{Csi, CsiHeader, cube, extra_streams, offset_indices, tables};
use crate::error::{FrameError, Result};

pub const NUM_TONES: usize = 30;

/// Trailing bytes after the bit-packed samples.
const TAIL_LEN: usize = 12;

/// Bytes each stream of each rx chain adds (30 tones x 16 bits).
const BYTES_PER_STREAM: usize = 60;

/// Map each receive chain to its row in the output cube.
///
/// The selection byte packs three 2-bit antenna ids (`id + 1` per chain);
/// only the low bit of the first chain's pair is significant.
/// Chain `rx` lands at the rank of its antenna id among the selected ids,
/// i.e. `argsort(argsort(ids))[rx]`. Single-chain captures are identity.
pub fn compute_legacy_intel_chain_permutation(ant_sel: u8, num_rx: usize) -> Result<Vec<usize>> {
    if num_rx > 3 {
        return Err(FrameError::unsupported(format!("IWL5300 CSI with {num_rx} rx chains")));
    }
    if num_rx <= 1 {
        return Ok((0..num_rx).collect());
    }

    let ids: Vec<u8> = (0..num_rx).map(|k| ((ant_sel >> (2 * k)) & chain_mask(k)) + 1).collect();
    let mut order: Vec<usize> = (0..num_rx).collect();
    order.sort_by_key(|&k| ids[k]);
    let mut rank = vec![0usize; num_rx];
    for (r, &k) in order.iter().enumerate() {
        rank[k] = r;
    }
    Ok(rank)
}

/// Bits of chain `k`'s pair in the selection byte.
fn chain_mask(k: usize) -> u8 {
    if k == 0 { 0x1 } else { 0x3 }
}

/// Recover one signed byte straddling `data[at]` and `data[at + 1]`.
fn straddled(data: &[u8], at: usize, rem: u32) -> i8 {
    let lo = u16::from(data[at]) >> rem;
    let hi = u16::from(data[at + 1]) << (8 - rem);
    (lo | hi) as u8 as i8
}

/// Decode an IWL5300 payload into a `[30, streams, rx]` cube.
pub fn decode(header: &CsiHeader, payload: &[u8]) -> Result<Csi> {
    let dims = header.dimensions;
    let num_rx = dims.num_rx as usize;
    if num_rx == 0 || payload.len() < TAIL_LEN {
        return Err(FrameError::malformed("IWL5300 CSI", TAIL_LEN, payload.len()));
    }

    let num_sts = (payload.len() - TAIL_LEN) / BYTES_PER_STREAM / num_rx;
    let num_ess = extra_streams("IWL5300 CSI", num_sts, dims.num_tx)?;
    let streams = num_sts * num_rx;
    if streams == 0 {
        return Err(FrameError::underflow("IWL5300 CSI", BYTES_PER_STREAM + TAIL_LEN, payload.len()));
    }
    let total_bits = NUM_TONES * (3 + 16 * streams);
    let need = (total_bits - 16) / 8 + 3;
    if payload.len() < need {
        return Err(FrameError::malformed("IWL5300 CSI", need, payload.len()));
    }

    let table = tables::iwl5300_indices(header.cbw)
        .ok_or_else(|| FrameError::unsupported(format!("IWL5300 CSI at {} MHz", header.cbw)))?;
    let chains = compute_legacy_intel_chain_permutation(header.ant_sel, num_rx)?;

    let mut array = vec![Complex::new(0.0, 0.0); NUM_TONES * streams];
    let mut index = 0usize;
    for tone in 0..NUM_TONES {
        index += 3;
        let rem = (index % 8) as u32;
        for &chain in &chains {
            for tx in 0..num_sts {
                let at = index / 8;
                let real = straddled(payload, at, rem);
                let imag = straddled(payload, at + 1, rem);
                let pos = chain * (num_sts * NUM_TONES) + tx * NUM_TONES + tone;
                array[pos] = Complex::new(f64::from(real), f64::from(imag));
                index += 16;
            }
        }
    }

    let mut csi = Csi::from_header(header);
    csi.dimensions.num_tones = NUM_TONES as u16;
    csi.dimensions.num_ess = num_ess;
    csi.subcarrier_indices = offset_indices(table, header.subcarrier_offset);
    csi.csi_array = cube(array, NUM_TONES, num_sts, num_rx)?;
    csi.raw_csi_data = Some(payload.to_vec());
    Ok(csi)
}
