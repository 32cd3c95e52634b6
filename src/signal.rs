//! Dimensioned, typed numeric arrays with a portable binary encoding.
//!
//! Wire format:
//! ```text
//! "BBv1"|"BBv2"  NDIMS(u8)  DIM[NDIMS](u32 for v1, u64 for v2)
//! COMPLEX('C'|'R')  TYPE(u8)  BITS(u8)  MAJORITY('R'|'C')  ELEMENTS...
//! ```
//!
//! Elements are little-endian; complex elements are `real, imag` pairs.
//! Encoding always emits `BBv2`.
//!
//! Storage order follows the usual convention: column-major iterates fastest
//! over the first dimension, row-major over the last. PicoScenes' C++
//! tooling names the two orders the other way round, so a buffer it writes
//! with an explicit majority reads back transposed here.

use std::fmt;
use std::path::Path;

use num_complex::Complex;

use crate::codec::Reader;
use crate::error::{FrameError, Result};

const TAG_V1: &[u8; 4] = b"BBv1";
const TAG_V2: &[u8; 4] = b"BBv2";

// ---------------------------------------------------------------------------
// Majority
// ---------------------------------------------------------------------------

/// Storage order of a [`SignalMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Majority {
    RowMajor,
    #[default]
    ColumnMajor,
    /// Only meaningful as a request ("keep whatever the storage uses").
    Undefined,
}

impl Majority {
    fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            b'R' => Ok(Self::RowMajor),
            b'C' => Ok(Self::ColumnMajor),
            other => Err(FrameError::signal_matrix(format!(
                "majority flag 0x{other:02X}"
            ))),
        }
    }

    fn as_flag(self) -> Result<u8> {
        match self {
            Self::RowMajor => Ok(b'R'),
            Self::ColumnMajor => Ok(b'C'),
            Self::Undefined => Err(FrameError::signal_matrix("undefined majority")),
        }
    }

    fn opposite(self) -> Self {
        match self {
            Self::RowMajor => Self::ColumnMajor,
            Self::ColumnMajor => Self::RowMajor,
            Self::Undefined => Self::Undefined,
        }
    }
}

impl fmt::Display for Majority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowMajor => write!(f, "RowMajor"),
            Self::ColumnMajor => write!(f, "ColumnMajor"),
            Self::Undefined => write!(f, "Undefined"),
        }
    }
}

// ---------------------------------------------------------------------------
// Element types
// ---------------------------------------------------------------------------

/// A scalar or complex value that can be stored in a [`SignalMatrix`].
pub trait SignalElement: Copy + PartialEq + fmt::Debug + Default {
    /// True for `Complex<T>` elements.
    const COMPLEX: bool;
    /// `F` f32, `D` f64, `I` signed, `U` unsigned, `L` bool.
    const TYPE_TAG: u8;
    /// Width of one scalar component.
    const SCALAR_BITS: u8;
    /// Encoded size of one element in bytes.
    const SIZE: usize;

    fn write_le(self, buf: &mut Vec<u8>);

    /// Decode from exactly `SIZE` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! signal_element {
    ($t:ty, $tag:expr) => {
        impl SignalElement for $t {
            const COMPLEX: bool = false;
            const TYPE_TAG: u8 = $tag;
            const SCALAR_BITS: u8 = (size_of::<$t>() * 8) as u8;
            const SIZE: usize = size_of::<$t>();

            fn write_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$t>()];
                raw.copy_from_slice(&bytes[..size_of::<$t>()]);
                <$t>::from_le_bytes(raw)
            }
        }

        impl SignalElement for Complex<$t> {
            const COMPLEX: bool = true;
            const TYPE_TAG: u8 = $tag;
            const SCALAR_BITS: u8 = (size_of::<$t>() * 8) as u8;
            const SIZE: usize = 2 * size_of::<$t>();

            fn write_le(self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.re.to_le_bytes());
                buf.extend_from_slice(&self.im.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let half = size_of::<$t>();
                Complex::new(
                    <$t as SignalElement>::read_le(&bytes[..half]),
                    <$t as SignalElement>::read_le(&bytes[half..2 * half]),
                )
            }
        }
    };
}

signal_element!(i8, b'I');
signal_element!(i16, b'I');
signal_element!(i32, b'I');
signal_element!(i64, b'I');
signal_element!(u8, b'U');
signal_element!(u16, b'U');
signal_element!(u32, b'U');
signal_element!(u64, b'U');
signal_element!(f32, b'F');
signal_element!(f64, b'D');

impl SignalElement for bool {
    const COMPLEX: bool = false;
    const TYPE_TAG: u8 = b'L';
    const SCALAR_BITS: u8 = 8;
    const SIZE: usize = 1;

    fn write_le(self, buf: &mut Vec<u8>) {
        buf.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

// ---------------------------------------------------------------------------
// Index arithmetic
// ---------------------------------------------------------------------------

/// Linear position of `coords` within `dimensions` stored in `majority` order.
pub fn index_for_coordinates(dimensions: &[i64], majority: Majority, coords: &[i64]) -> Result<usize> {
    if coords.len() != dimensions.len() {
        return Err(FrameError::signal_matrix(format!(
            "{} coordinates for {} dimensions",
            coords.len(),
            dimensions.len()
        )));
    }
    for (&c, &d) in coords.iter().zip(dimensions) {
        if c < 0 || c >= d {
            return Err(FrameError::signal_matrix(format!("coordinate {c} outside 0..{d}")));
        }
    }
    let index = match majority {
        Majority::ColumnMajor => compose(dimensions.iter().zip(coords).rev()),
        Majority::RowMajor => compose(dimensions.iter().zip(coords)),
        Majority::Undefined => return Err(FrameError::signal_matrix("undefined majority")),
    };
    Ok(index as usize)
}

/// Coordinates of linear position `index` within `dimensions` stored in `majority` order.
pub fn coordinates_for_index(dimensions: &[i64], majority: Majority, index: usize) -> Result<Vec<i64>> {
    let numel = element_count(dimensions)?;
    if index >= numel {
        return Err(FrameError::signal_matrix(format!("index {index} outside 0..{numel}")));
    }
    let mut coords = vec![0i64; dimensions.len()];
    decompose(dimensions, majority, index, &mut coords)?;
    Ok(coords)
}

/// Fold `(dimension, coordinate)` pairs, slowest-varying first.
fn compose<'a>(pairs: impl Iterator<Item = (&'a i64, &'a i64)>) -> i64 {
    pairs.fold(0i64, |acc, (&d, &c)| acc * d + c)
}

fn decompose(dimensions: &[i64], majority: Majority, index: usize, coords: &mut [i64]) -> Result<()> {
    let mut rest = index as i64;
    let mut peel = |axis: usize| {
        let d = dimensions[axis].max(1);
        coords[axis] = rest % d;
        rest /= d;
    };
    match majority {
        Majority::ColumnMajor => (0..dimensions.len()).for_each(&mut peel),
        Majority::RowMajor => (0..dimensions.len()).rev().for_each(&mut peel),
        Majority::Undefined => return Err(FrameError::signal_matrix("undefined majority")),
    }
    Ok(())
}

/// Map position `index` in `from` order to the same element's position in the opposite order.
fn convert_position(dimensions: &[i64], from: Majority, index: usize, scratch: &mut [i64]) -> Result<usize> {
    decompose(dimensions, from, index, scratch)?;
    let index = match from.opposite() {
        Majority::ColumnMajor => compose(dimensions.iter().zip(scratch.iter()).rev()),
        Majority::RowMajor => compose(dimensions.iter().zip(scratch.iter())),
        Majority::Undefined => return Err(FrameError::signal_matrix("undefined majority")),
    };
    Ok(index as usize)
}

fn element_count(dimensions: &[i64]) -> Result<usize> {
    dimensions.iter().try_fold(1usize, |acc, &d| {
        let d = usize::try_from(d)
            .map_err(|_| FrameError::signal_matrix(format!("negative dimension {d}")))?;
        acc.checked_mul(d)
            .ok_or_else(|| FrameError::signal_matrix("dimension product overflows"))
    })
}

// ---------------------------------------------------------------------------
// SignalMatrix
// ---------------------------------------------------------------------------

/// N-dimensional array with an explicit storage order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SignalMatrix<T> {
    /// Elements in `majority` order
    pub array: Vec<T>,
    /// Extent of each dimension
    pub dimensions: Vec<i64>,
    /// Storage order of `array`
    pub majority: Majority,
}

impl<T> Default for SignalMatrix<T> {
    fn default() -> Self {
        Self {
            array: Vec::new(),
            dimensions: vec![0],
            majority: Majority::ColumnMajor,
        }
    }
}

impl<T: SignalElement> SignalMatrix<T> {
    /// Wrap `array`; the dimension product must equal its length.
    pub fn new(array: Vec<T>, dimensions: Vec<i64>, majority: Majority) -> Result<Self> {
        let numel = element_count(&dimensions)?;
        if numel != array.len() {
            return Err(FrameError::signal_matrix(format!(
                "dimensions {dimensions:?} hold {numel} elements, array has {}",
                array.len()
            )));
        }
        Ok(Self { array, dimensions, majority })
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn get_index_for_coordinates(&self, coords: &[i64]) -> Result<usize> {
        index_for_coordinates(&self.dimensions, self.majority, coords)
    }

    pub fn get_coordinate_for_index(&self, index: usize) -> Result<Vec<i64>> {
        coordinates_for_index(&self.dimensions, self.majority, index)
    }

    pub fn value_at(&self, coords: &[i64]) -> Result<T> {
        let index = self.get_index_for_coordinates(coords)?;
        self.array
            .get(index)
            .copied()
            .ok_or_else(|| FrameError::signal_matrix(format!("index {index} outside array")))
    }

    /// Serialize as `BBv2`, writing elements in `output` order.
    ///
    /// `Undefined` keeps the storage order.
    pub fn to_buffer(&self, output: Majority) -> Result<Vec<u8>> {
        let output = if output == Majority::Undefined { self.majority } else { output };
        let flag = output.as_flag()?;
        let ndims = u8::try_from(self.dimensions.len())
            .map_err(|_| FrameError::signal_matrix("more than 255 dimensions"))?;

        let mut buf = Vec::with_capacity(12 + 8 * self.dimensions.len() + T::SIZE * self.array.len());
        buf.extend_from_slice(TAG_V2);
        buf.push(ndims);
        for &d in &self.dimensions {
            buf.extend_from_slice(&(d as u64).to_le_bytes());
        }
        buf.push(if T::COMPLEX { b'C' } else { b'R' });
        buf.push(T::TYPE_TAG);
        buf.push(T::SCALAR_BITS);
        buf.push(flag);

        if output == self.majority || self.dimensions.len() <= 1 {
            for &v in &self.array {
                v.write_le(&mut buf);
            }
        } else {
            self.majority.as_flag()?;
            let mut scratch = vec![0i64; self.dimensions.len()];
            for pos in 0..self.array.len() {
                let src = convert_position(&self.dimensions, output, pos, &mut scratch)?;
                self.array[src].write_le(&mut buf);
            }
        }
        Ok(buf)
    }

    /// Decode a `BBv1`/`BBv2` buffer, storing elements in `storage` order.
    ///
    /// `Undefined` keeps the order recorded in the buffer. The buffer must
    /// end exactly after the last element.
    pub fn from_buffer(buf: &[u8], storage: Majority) -> Result<Self> {
        let mut r = Reader::new(buf);
        let tag = r.bytes(4)?;
        let wide = if tag == TAG_V2 {
            true
        } else if tag == TAG_V1 {
            false
        } else {
            return Err(FrameError::signal_matrix(format!("header tag {tag:02X?}")));
        };

        let ndims = r.uint8()? as usize;
        let mut dimensions = Vec::with_capacity(ndims);
        for _ in 0..ndims {
            let d = if wide { r.uint64()? } else { u64::from(r.uint32()?) };
            let d = i64::try_from(d)
                .map_err(|_| FrameError::signal_matrix(format!("dimension {d} too large")))?;
            dimensions.push(d);
        }

        let complex = r.uint8()?;
        let type_tag = r.uint8()?;
        let bits = r.uint8()?;
        let input = Majority::from_flag(r.uint8()?)?;

        if complex != (if T::COMPLEX { b'C' } else { b'R' }) {
            return Err(FrameError::signal_matrix(format!(
                "complex flag '{}' for {} element type",
                complex as char,
                if T::COMPLEX { "complex" } else { "real" }
            )));
        }
        if type_tag != T::TYPE_TAG || bits != T::SCALAR_BITS {
            return Err(FrameError::signal_matrix(format!(
                "element type '{}'{bits}, expected '{}'{}",
                type_tag as char,
                T::TYPE_TAG as char,
                T::SCALAR_BITS
            )));
        }

        let numel = element_count(&dimensions)?;
        let need = numel
            .checked_mul(T::SIZE)
            .ok_or_else(|| FrameError::signal_matrix("element data size overflows"))?;
        if r.remaining() != need {
            return Err(FrameError::malformed("SignalMatrix", need, r.remaining()));
        }
        let data = r.rest();

        let storage = if storage == Majority::Undefined { input } else { storage };
        let elements = data.chunks_exact(T::SIZE).map(T::read_le);
        let array = if storage == input || dimensions.len() <= 1 {
            elements.collect()
        } else {
            let mut array = vec![T::default(); numel];
            let mut scratch = vec![0i64; dimensions.len()];
            for (pos, v) in elements.enumerate() {
                let dst = convert_position(&dimensions, input, pos, &mut scratch)?;
                array[dst] = v;
            }
            array
        };

        Ok(Self { array, dimensions, majority: storage })
    }

    /// Write the `BBv2` encoding to a file.
    pub fn to_file(&self, path: impl AsRef<Path>, output: Majority) -> Result<()> {
        std::fs::write(path, self.to_buffer(output)?)?;
        Ok(())
    }

    /// Read a `BBv1`/`BBv2` encoded file.
    pub fn from_file(path: impl AsRef<Path>, storage: Majority) -> Result<Self> {
        Self::from_buffer(&std::fs::read(path)?, storage)
    }
}

impl<T> fmt::Display for SignalMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dimensions.iter().map(|d| d.to_string()).collect();
        write!(f, "SignalMatrix[{}, {}]", dims.join("x"), self.majority)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
