//! Decoder and encoder for PicoScenes WiFi CSI capture frames.
//!
//! A capture frame is a sequence of self-describing segments (receiver
//! summary, extra radio state, CSI) followed by the 802.11 MPDU, which may
//! itself carry PicoScenes TX segments. [`RxFrame::from_buffer`] decodes a
//! frame; every known segment keeps its record bytes so frames and segments
//! re-serialize byte-for-byte.

pub mod codec;
pub mod common;
pub mod csi;
pub mod error;
pub mod frame;
pub mod mac;
pub mod segment;
pub mod segments;
pub mod signal;

pub use common::{ChannelBandwidth, ChannelCoding, ChannelMode, DeviceType, GuardInterval, PacketFormat};
pub use csi::{Csi, CsiInterpolator, Interpolated};
pub use error::{FrameError, Result};
pub use frame::{PicoScenesHeader, RxFrame, RxFrameHeader, TxFrame};
pub use mac::MacHeader;
pub use segment::{DecodeOptions, FrameSegment, Segment};
pub use segments::{RxSegment, TxSegment, UnknownSegment};
pub use signal::{Majority, SignalMatrix};
