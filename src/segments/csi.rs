//! CSI, PilotCSI and LegacyCSI segments.
//!
//! All three names share the body layout in [`crate::csi`]; the name only
//! tells which measurement the record carries.

use std::fmt;

use crate::csi::{Csi, CsiLayout};
use crate::error::Result;
use crate::segment::{DecodeOptions, FrameSegment, Segment};

/// A CSI measurement record.
#[derive(Debug, Clone, PartialEq)]
pub struct CsiSegment {
    segment: Segment,
    csi: Csi,
}

impl CsiSegment {
    pub const NAME: &'static str = "CSI";
    pub const PILOT_NAME: &'static str = "PilotCSI";
    pub const LEGACY_NAME: &'static str = "LegacyCSI";
    pub const NAMES: [&'static str; 3] = [Self::NAME, Self::PILOT_NAME, Self::LEGACY_NAME];
    pub const VERSION: u16 = 3;

    /// Wrap `csi` as a version 3 record named `name`.
    pub fn new(name: &str, csi: Csi) -> Result<Self> {
        let mut segment = Segment::new(name, Self::VERSION);
        segment.add_field("core", csi.encode()?);
        Ok(Self { segment, csi })
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        Self::from_buffer_with(buf, &DecodeOptions::default())
    }

    pub fn from_buffer_with(buf: &[u8], options: &DecodeOptions) -> Result<Self> {
        let (segment, body) = Segment::open(buf, &Self::NAMES)?;
        let layout = CsiLayout::from_version(segment.name(), segment.version())?;
        let csi = Csi::decode(layout, body, options).map_err(|e| e.with_raw(body))?;
        Ok(Self { segment, csi })
    }

    pub fn name(&self) -> &str {
        self.segment.name()
    }

    pub fn csi(&self) -> &Csi {
        &self.csi
    }

    /// Mutable access to the decoded value. The record bytes are not touched.
    pub fn csi_mut(&mut self) -> &mut Csi {
        &mut self.csi
    }

    pub fn into_csi(self) -> Csi {
        self.csi
    }
}

impl FrameSegment for CsiSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for CsiSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment.name() {
            Self::NAME => write!(f, "{}", self.csi),
            other => write!(f, "{other}{}", self.csi.to_string().trim_start_matches("CSI")),
        }
    }
}
