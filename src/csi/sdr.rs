//! Software-radio CSI payload.
//!
//! ```text
//! INDEX[num_tones](i16) SIGNAL_MATRIX(Complex<f64>)
//! ```

use num_complex::Complex;

use super::{Csi, CsiHeader};
use crate::codec::{self, Reader};
use crate::error::{FrameError, Result};
use crate::signal::{Majority, SignalMatrix};

pub fn decode(header: &CsiHeader, payload: &[u8]) -> Result<Csi> {
    let dims = header.dimensions;
    let mut r = Reader::new(payload);
    let mut indices = Vec::with_capacity(dims.num_tones as usize);
    for _ in 0..dims.num_tones {
        indices.push(r.int16()?);
    }
    let matrix = SignalMatrix::<Complex<f64>>::from_buffer(r.rest(), Majority::ColumnMajor)?;
    if matrix.len() != dims.total_samples() {
        return Err(FrameError::underflow("SDR CSI", dims.total_samples(), matrix.len()));
    }

    let mut csi = Csi::from_header(header);
    csi.subcarrier_indices = indices;
    csi.csi_array = matrix;
    csi.raw_csi_data = Some(payload.to_vec());
    Ok(csi)
}

/// Rebuild the payload from the index list and the cube.
pub fn encode(csi: &Csi) -> Result<Vec<u8>> {
    if csi.subcarrier_indices.len() != csi.dimensions.num_tones as usize {
        return Err(FrameError::unsupported(format!(
            "{} subcarrier indices for {} tones",
            csi.subcarrier_indices.len(),
            csi.dimensions.num_tones
        )));
    }
    let mut buf = Vec::with_capacity(2 * csi.subcarrier_indices.len());
    for &i in &csi.subcarrier_indices {
        codec::write_int16(&mut buf, i);
    }
    buf.extend_from_slice(&csi.csi_array.to_buffer(Majority::Undefined)?);
    Ok(buf)
}
