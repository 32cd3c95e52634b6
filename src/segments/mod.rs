//! Concrete segment types and name-based dispatch.
//!
//! - [`RxSegment`]: records that follow the RX frame header
//! - [`TxSegment`]: records that follow the PicoScenes TX header
//!
//! ## Versioned layouts
//!
//! Every segment type carries a closed layout enum (`RxSBasicLayout`,
//! `CsiLayout`, ...) with one variant per version id. `from_version` maps the
//! declared id to a variant or fails with `UnknownSegmentVersion`; decoding
//! is an exhaustive `match` on the variant. A new wire version is a new
//! variant. New segment types are exposed through the `Unknown` variants,
//! which keep the record bytes for re-serialization.

pub mod baseband;
pub mod csi;
pub mod extra_info;
pub mod mvm_extra;
pub mod payload;
pub mod rx_basic;

use std::fmt;

use crate::error::{FrameError, Result};
use crate::segment::{DecodeOptions, FrameSegment, extract_meta};

pub use baseband::{BasebandSignalSegment, PreEqSymbolsSegment};
pub use csi::CsiSegment;
pub use extra_info::{ExtraInfo, ExtraInfoSegment};
pub use mvm_extra::{MvmExtra, MvmExtraSegment};
pub use payload::{PayloadData, PayloadDataType, PayloadSegment};
pub use rx_basic::{RxSBasic, RxSBasicSegment};

// ---------------------------------------------------------------------------
// Segment names
// ---------------------------------------------------------------------------

pub const NAME_RXS_BASIC: &str = RxSBasicSegment::NAME;
pub const NAME_EXTRA_INFO: &str = ExtraInfoSegment::NAME;
pub const NAME_CSI: &str = CsiSegment::NAME;
pub const NAME_PILOT_CSI: &str = CsiSegment::PILOT_NAME;
pub const NAME_LEGACY_CSI: &str = CsiSegment::LEGACY_NAME;
pub const NAME_BASEBAND_SIGNAL: &str = BasebandSignalSegment::NAME;
pub const NAME_PRE_EQ_SYMBOLS: &str = PreEqSymbolsSegment::NAME;
pub const NAME_MVM_EXTRA: &str = MvmExtraSegment::NAME;
pub const NAME_PAYLOAD: &str = PayloadSegment::NAME;

/// A record kept as bytes because its name has no decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSegment {
    pub name: String,
    /// Full record including the length prefix
    pub raw: Vec<u8>,
}

impl fmt::Display for UnknownSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{}B]", self.name, self.raw.len())
    }
}

// ---------------------------------------------------------------------------
// RxSegment
// ---------------------------------------------------------------------------

/// A record from the receive-side segment list.
#[derive(Debug, Clone, PartialEq)]
pub enum RxSegment {
    Basic(RxSBasicSegment),
    ExtraInfo(ExtraInfoSegment),
    /// `CSI`, `PilotCSI` or `LegacyCSI`; see [`CsiSegment::name`]
    Csi(CsiSegment),
    BasebandSignal(BasebandSignalSegment),
    PreEqSymbols(PreEqSymbolsSegment),
    MvmExtra(MvmExtraSegment),

    // -- Forward compat --
    Unknown(UnknownSegment),
}

impl RxSegment {
    /// Decode one record at the start of `buf`, dispatching on its name.
    ///
    /// Returns the segment and the record length.
    pub fn decode(buf: &[u8], options: &DecodeOptions) -> Result<(Self, usize)> {
        let meta = extract_meta(buf)?;
        let len = meta.record_len();
        let segment = match meta.name.as_str() {
            NAME_RXS_BASIC => RxSegment::Basic(RxSBasicSegment::from_buffer(buf)?),
            NAME_EXTRA_INFO => RxSegment::ExtraInfo(ExtraInfoSegment::from_buffer(buf)?),
            NAME_CSI | NAME_PILOT_CSI | NAME_LEGACY_CSI => {
                RxSegment::Csi(CsiSegment::from_buffer_with(buf, options)?)
            }
            NAME_BASEBAND_SIGNAL => {
                RxSegment::BasebandSignal(BasebandSignalSegment::from_buffer(buf)?)
            }
            NAME_PRE_EQ_SYMBOLS => RxSegment::PreEqSymbols(PreEqSymbolsSegment::from_buffer(buf)?),
            NAME_MVM_EXTRA => RxSegment::MvmExtra(MvmExtraSegment::from_buffer(buf)?),
            _ => RxSegment::Unknown(unknown(buf, meta.name, len)?),
        };
        Ok((segment, len))
    }

    pub fn to_buffer(&self) -> Vec<u8> {
        match self {
            RxSegment::Basic(s) => s.to_buffer(),
            RxSegment::ExtraInfo(s) => s.to_buffer(),
            RxSegment::Csi(s) => s.to_buffer(),
            RxSegment::BasebandSignal(s) => s.to_buffer(),
            RxSegment::PreEqSymbols(s) => s.to_buffer(),
            RxSegment::MvmExtra(s) => s.to_buffer(),
            RxSegment::Unknown(u) => u.raw.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RxSegment::Basic(s) => s.segment().name(),
            RxSegment::ExtraInfo(s) => s.segment().name(),
            RxSegment::Csi(s) => s.segment().name(),
            RxSegment::BasebandSignal(s) => s.segment().name(),
            RxSegment::PreEqSymbols(s) => s.segment().name(),
            RxSegment::MvmExtra(s) => s.segment().name(),
            RxSegment::Unknown(u) => &u.name,
        }
    }
}

// ---------------------------------------------------------------------------
// TxSegment
// ---------------------------------------------------------------------------

/// A record from the transmit-side segment list.
#[derive(Debug, Clone, PartialEq)]
pub enum TxSegment {
    ExtraInfo(ExtraInfoSegment),
    Payload(PayloadSegment),

    // -- Forward compat --
    Unknown(UnknownSegment),
}

impl TxSegment {
    /// Decode one record at the start of `buf`, dispatching on its name.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let meta = extract_meta(buf)?;
        let len = meta.record_len();
        let segment = match meta.name.as_str() {
            NAME_EXTRA_INFO => TxSegment::ExtraInfo(ExtraInfoSegment::from_buffer(buf)?),
            NAME_PAYLOAD => TxSegment::Payload(PayloadSegment::from_buffer(buf)?),
            _ => TxSegment::Unknown(unknown(buf, meta.name, len)?),
        };
        Ok((segment, len))
    }

    pub fn to_buffer(&self) -> Vec<u8> {
        match self {
            TxSegment::ExtraInfo(s) => s.to_buffer(),
            TxSegment::Payload(s) => s.to_buffer(),
            TxSegment::Unknown(u) => u.raw.clone(),
        }
    }
}

/// Slice an undecoded record, checking only its declared length.
fn unknown(buf: &[u8], name: String, len: usize) -> Result<UnknownSegment> {
    if len > buf.len() {
        return Err(FrameError::malformed("segment record", len, buf.len()).with_raw(buf));
    }
    Ok(UnknownSegment { name, raw: buf[..len].to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::tests::record;

    #[test]
    fn unknown_names_are_preserved() {
        let mut buf = record("FutureFeature", 7, &[1, 2, 3]);
        let len = buf.len();
        buf.extend_from_slice(&[0xFF; 4]);
        let (seg, consumed) = RxSegment::decode(&buf, &DecodeOptions::default()).unwrap();
        assert_eq!(consumed, len);
        assert_eq!(seg.name(), "FutureFeature");
        assert_eq!(seg.to_buffer(), buf[..len].to_vec());
    }

    #[test]
    fn unknown_record_still_length_checked() {
        let buf = record("FutureFeature", 1, &[0; 8]);
        assert!(matches!(
            TxSegment::decode(&buf[..buf.len() - 2]),
            Err(FrameError::MalformedLength { .. })
        ));
    }

    #[test]
    fn tx_dispatch() {
        let payload = PayloadSegment::new("d", vec![1], None);
        let (seg, _) = TxSegment::decode(&payload.to_buffer()).unwrap();
        assert!(matches!(seg, TxSegment::Payload(_)));

        let ei = ExtraInfoSegment::new(ExtraInfo::new());
        let (seg, len) = TxSegment::decode(&ei.to_buffer()).unwrap();
        assert!(matches!(seg, TxSegment::ExtraInfo(_)));
        assert_eq!(len, ei.to_buffer().len());
    }

    #[test]
    fn rx_dispatch_by_name() {
        let ei = ExtraInfoSegment::new(ExtraInfo::new());
        let (seg, _) = RxSegment::decode(&ei.to_buffer(), &DecodeOptions::default()).unwrap();
        assert!(matches!(seg, RxSegment::ExtraInfo(_)));

        // Payload is a TX-side record; on the RX side it is unknown
        let payload = PayloadSegment::new("d", vec![1], None);
        let (seg, _) = RxSegment::decode(&payload.to_buffer(), &DecodeOptions::default()).unwrap();
        assert!(matches!(seg, RxSegment::Unknown(_)));
    }
}
