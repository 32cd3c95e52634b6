//! BasebandSignal and PreEQSymbols segments.
//!
//! Both bodies are a single complex [`SignalMatrix`] buffer read column-major.

use std::fmt;

use num_complex::Complex;

use crate::error::{FrameError, Result};
use crate::segment::{FrameSegment, Segment};
use crate::signal::{Majority, SignalMatrix};

/// Layouts shared by the matrix-only segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatrixLayout {
    V1,
}

impl MatrixLayout {
    fn from_version(name: &str, version: u16) -> Result<Self> {
        match version {
            1 => Ok(Self::V1),
            _ => Err(FrameError::UnknownSegmentVersion { segment: name.to_string(), version }),
        }
    }

    fn decode(self, body: &[u8]) -> Result<SignalMatrix<Complex<f64>>> {
        match self {
            Self::V1 => SignalMatrix::from_buffer(body, Majority::ColumnMajor),
        }
    }
}

fn open_matrix(buf: &[u8], name: &'static str) -> Result<(Segment, SignalMatrix<Complex<f64>>)> {
    let (segment, body) = Segment::open(buf, &[name])?;
    let matrix = MatrixLayout::from_version(name, segment.version())?
        .decode(body)
        .map_err(|e| e.with_raw(body))?;
    Ok((segment, matrix))
}

fn build_matrix(name: &'static str, matrix: &SignalMatrix<Complex<f64>>) -> Result<Segment> {
    let mut segment = Segment::new(name, 1);
    segment.add_field("core", matrix.to_buffer(Majority::Undefined)?);
    Ok(segment)
}

fn shape(matrix: &SignalMatrix<Complex<f64>>) -> String {
    let dims: Vec<String> = matrix.dimensions.iter().map(i64::to_string).collect();
    dims.join("x")
}

/// Raw baseband samples captured by an SDR frontend.
#[derive(Debug, Clone, PartialEq)]
pub struct BasebandSignalSegment {
    segment: Segment,
    signal: SignalMatrix<Complex<f64>>,
}

impl BasebandSignalSegment {
    pub const NAME: &'static str = "BasebandSignal";

    pub fn new(signal: SignalMatrix<Complex<f64>>) -> Result<Self> {
        let segment = build_matrix(Self::NAME, &signal)?;
        Ok(Self { segment, signal })
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, signal) = open_matrix(buf, Self::NAME)?;
        Ok(Self { segment, signal })
    }

    pub fn signal(&self) -> &SignalMatrix<Complex<f64>> {
        &self.signal
    }
}

impl FrameSegment for BasebandSignalSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for BasebandSignalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}]", Self::NAME, shape(&self.signal))
    }
}

/// Frequency-domain symbols before channel equalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PreEqSymbolsSegment {
    segment: Segment,
    symbols: SignalMatrix<Complex<f64>>,
}

impl PreEqSymbolsSegment {
    pub const NAME: &'static str = "PreEQSymbols";

    pub fn new(symbols: SignalMatrix<Complex<f64>>) -> Result<Self> {
        let segment = build_matrix(Self::NAME, &symbols)?;
        Ok(Self { segment, symbols })
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, symbols) = open_matrix(buf, Self::NAME)?;
        Ok(Self { segment, symbols })
    }

    pub fn symbols(&self) -> &SignalMatrix<Complex<f64>> {
        &self.symbols
    }
}

impl FrameSegment for PreEqSymbolsSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for PreEqSymbolsSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}]", Self::NAME, shape(&self.symbols))
    }
}
