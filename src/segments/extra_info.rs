//! ExtraInfo: optional per-frame hardware metadata selected by a feature code.
//!
//! Wire format:
//! ```text
//! FEATURE_CODE(u32) FIELD... (present fields only, in bit order)
//! ```
//!
//! Each bit of the feature code gates one fixed-size field. Bit order is wire
//! order; an absent field shifts every following field forward.
//!
//! | bit | field              | size |
//! |-----|--------------------|------|
//! | 0   | length             | 2    |
//! | 1   | version            | 8    |
//! | 2   | macaddr_cur        | 6    |
//! | 3   | macaddr_rom        | 6    |
//! | 4   | chansel            | 4    |
//! | 5   | bmode              | 1    |
//! | 6   | evm                | 20   |
//! | 7   | tx_chain_mask      | 1    |
//! | 8   | rx_chain_mask      | 1    |
//! | 9   | txpower            | 1    |
//! | 10  | cf                 | 8    |
//! | 11  | tx_tsf             | 4    |
//! | 12  | last_hw_tx_tsf     | 4    |
//! | 13  | channel_flags      | 2    |
//! | 14  | tx_ness            | 1    |
//! | 15  | tuning_policy      | 1    |
//! | 16  | pll_rate           | 2    |
//! | 17  | pll_refdiv         | 1    |
//! | 18  | pll_clock_select   | 1    |
//! | 19  | agc                | 1    |
//! | 20  | ant_sel            | 1    |
//! | 21  | sampling_rate      | 8    |
//! | 22  | cfo                | 4    |
//! | 23  | sfo                | 4    |
//! | 24  | precise_tx_timing  | 8    |

use std::fmt;

use crate::codec::{self, Reader};
use crate::common::ChannelMode;
use crate::error::{FrameError, Result};
use crate::segment::{FrameSegment, Segment};

/// Version stamped into new ExtraInfo records.
pub const DEFAULT_EXTRA_INFO_VERSION: u64 = 0x2021_0517;

// ---------------------------------------------------------------------------
// Feature code
// ---------------------------------------------------------------------------

/// ExtraInfo fields, numbered by their feature-code bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExtraInfoField {
    Length = 0,
    Version = 1,
    MacAddrCur = 2,
    MacAddrRom = 3,
    Chansel = 4,
    BMode = 5,
    Evm = 6,
    TxChainMask = 7,
    RxChainMask = 8,
    TxPower = 9,
    Cf = 10,
    TxTsf = 11,
    LastHwTxTsf = 12,
    ChannelFlags = 13,
    TxNess = 14,
    TuningPolicy = 15,
    PllRate = 16,
    PllRefDiv = 17,
    PllClkSel = 18,
    Agc = 19,
    AntennaSelection = 20,
    SamplingRate = 21,
    Cfo = 22,
    Sfo = 23,
    PreciseTxTiming = 24,
}

impl ExtraInfoField {
    /// Every field in wire order.
    pub const ALL: [Self; 25] = [
        Self::Length,
        Self::Version,
        Self::MacAddrCur,
        Self::MacAddrRom,
        Self::Chansel,
        Self::BMode,
        Self::Evm,
        Self::TxChainMask,
        Self::RxChainMask,
        Self::TxPower,
        Self::Cf,
        Self::TxTsf,
        Self::LastHwTxTsf,
        Self::ChannelFlags,
        Self::TxNess,
        Self::TuningPolicy,
        Self::PllRate,
        Self::PllRefDiv,
        Self::PllClkSel,
        Self::Agc,
        Self::AntennaSelection,
        Self::SamplingRate,
        Self::Cfo,
        Self::Sfo,
        Self::PreciseTxTiming,
    ];

    pub fn bit(self) -> u32 {
        1 << self as u8
    }

    /// Encoded size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Length | Self::ChannelFlags | Self::PllRate => 2,
            Self::Version | Self::Cf | Self::SamplingRate | Self::PreciseTxTiming => 8,
            Self::MacAddrCur | Self::MacAddrRom => 6,
            Self::Chansel | Self::TxTsf | Self::LastHwTxTsf | Self::Cfo | Self::Sfo => 4,
            Self::Evm => 20,
            Self::BMode
            | Self::TxChainMask
            | Self::RxChainMask
            | Self::TxPower
            | Self::TxNess
            | Self::TuningPolicy
            | Self::PllRefDiv
            | Self::PllClkSel
            | Self::Agc
            | Self::AntennaSelection => 1,
        }
    }
}

/// Fields present under `code`, in wire order. Bits above 24 are ignored.
pub fn decode_feature_code(code: u32) -> Vec<ExtraInfoField> {
    ExtraInfoField::ALL
        .into_iter()
        .filter(|f| code & f.bit() != 0)
        .collect()
}

/// Feature code announcing exactly `fields`.
pub fn encode_feature_code(fields: impl IntoIterator<Item = ExtraInfoField>) -> u32 {
    fields.into_iter().fold(0, |code, f| code | f.bit())
}

/// Feature-code bits with a known field.
pub const KNOWN_FEATURE_BITS: u32 = (1 << ExtraInfoField::ALL.len()) - 1;

/// Bytes the fields under `code` occupy, excluding the feature code itself.
pub fn calculate_buffer_length(code: u32) -> usize {
    decode_feature_code(code).iter().map(|f| f.size()).sum()
}

/// Frequency tuning strategy recorded by the transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum TuningPolicy {
    Chansel = 30,
    FastCc = 31,
    Reset = 32,
    Default = 33,
}

impl TuningPolicy {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            30 => Some(Self::Chansel),
            31 => Some(Self::FastCc),
            32 => Some(Self::Reset),
            33 => Some(Self::Default),
            _ => None,
        }
    }
}

impl fmt::Display for TuningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chansel => write!(f, "Chansel"),
            Self::FastCc => write!(f, "FastCC"),
            Self::Reset => write!(f, "Reset"),
            Self::Default => write!(f, "Default"),
        }
    }
}

// ---------------------------------------------------------------------------
// ExtraInfo
// ---------------------------------------------------------------------------

/// Optional hardware metadata. Absent fields are `None`.
///
/// Setters keep the `length` field equal to the encoded size of the other
/// fields, so the value always re-encodes consistently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtraInfo {
    length: Option<u16>,
    version: Option<u64>,
    macaddr_cur: Option<[u8; 6]>,
    macaddr_rom: Option<[u8; 6]>,
    chansel: Option<u32>,
    bmode: Option<u8>,
    evm: Option<[i8; 20]>,
    tx_chain_mask: Option<u8>,
    rx_chain_mask: Option<u8>,
    txpower: Option<u8>,
    cf: Option<u64>,
    tx_tsf: Option<u32>,
    last_hw_tx_tsf: Option<u32>,
    channel_flags: Option<u16>,
    tx_ness: Option<u8>,
    tuning_policy: Option<u8>,
    pll_rate: Option<u16>,
    pll_refdiv: Option<u8>,
    pll_clock_select: Option<u8>,
    agc: Option<u8>,
    ant_sel: Option<[u8; 3]>,
    sampling_rate: Option<u64>,
    cfo: Option<i32>,
    sfo: Option<i32>,
    precise_tx_timing: Option<f64>,
    /// Feature-code bits above the known fields, kept for re-encoding
    unknown_bits: u32,
}

macro_rules! accessors {
    ($($field:ident, $setter:ident: $ty:ty;)*) => {
        $(
            pub fn $field(&self) -> Option<$ty> {
                self.$field
            }

            pub fn $setter(&mut self, value: $ty) {
                self.$field = Some(value);
                self.update_length();
            }
        )*
    };
}

impl ExtraInfo {
    /// A record with no fields and a zero feature code.
    pub fn empty() -> Self {
        Self {
            length: None,
            version: None,
            macaddr_cur: None,
            macaddr_rom: None,
            chansel: None,
            bmode: None,
            evm: None,
            tx_chain_mask: None,
            rx_chain_mask: None,
            txpower: None,
            cf: None,
            tx_tsf: None,
            last_hw_tx_tsf: None,
            channel_flags: None,
            tx_ness: None,
            tuning_policy: None,
            pll_rate: None,
            pll_refdiv: None,
            pll_clock_select: None,
            agc: None,
            ant_sel: None,
            sampling_rate: None,
            cfo: None,
            sfo: None,
            precise_tx_timing: None,
            unknown_bits: 0,
        }
    }

    /// A record carrying only `length` and [`DEFAULT_EXTRA_INFO_VERSION`].
    pub fn new() -> Self {
        let mut ei = Self::empty();
        ei.set_length(2);
        ei.set_version(DEFAULT_EXTRA_INFO_VERSION);
        ei
    }

    pub fn length(&self) -> Option<u16> {
        self.length
    }

    /// Set the length field verbatim.
    pub fn set_length(&mut self, value: u16) {
        self.length = Some(value);
    }

    accessors! {
        version, set_version: u64;
        macaddr_cur, set_macaddr_cur: [u8; 6];
        macaddr_rom, set_macaddr_rom: [u8; 6];
        chansel, set_chansel: u32;
        bmode, set_bmode: u8;
        evm, set_evm: [i8; 20];
        tx_chain_mask, set_tx_chain_mask: u8;
        rx_chain_mask, set_rx_chain_mask: u8;
        txpower, set_txpower: u8;
        cf, set_cf: u64;
        tx_tsf, set_tx_tsf: u32;
        last_hw_tx_tsf, set_last_hw_tx_tsf: u32;
        channel_flags, set_channel_flags: u16;
        tx_ness, set_tx_ness: u8;
        tuning_policy, set_tuning_policy: u8;
        pll_rate, set_pll_rate: u16;
        pll_refdiv, set_pll_refdiv: u8;
        pll_clock_select, set_pll_clock_select: u8;
        agc, set_agc: u8;
        ant_sel, set_ant_sel: [u8; 3];
        sampling_rate, set_sampling_rate: u64;
        cfo, set_cfo: i32;
        sfo, set_sfo: i32;
        precise_tx_timing, set_precise_tx_timing: f64;
    }

    /// HT channel placement, if channel flags are present.
    pub fn channel_mode(&self) -> Option<ChannelMode> {
        self.channel_flags.map(ChannelMode::from_channel_flags)
    }

    pub fn tuning_policy_kind(&self) -> Option<TuningPolicy> {
        self.tuning_policy.and_then(TuningPolicy::from_code)
    }

    pub fn has(&self, field: ExtraInfoField) -> bool {
        use ExtraInfoField::*;
        match field {
            Length => self.length.is_some(),
            Version => self.version.is_some(),
            MacAddrCur => self.macaddr_cur.is_some(),
            MacAddrRom => self.macaddr_rom.is_some(),
            Chansel => self.chansel.is_some(),
            BMode => self.bmode.is_some(),
            Evm => self.evm.is_some(),
            TxChainMask => self.tx_chain_mask.is_some(),
            RxChainMask => self.rx_chain_mask.is_some(),
            TxPower => self.txpower.is_some(),
            Cf => self.cf.is_some(),
            TxTsf => self.tx_tsf.is_some(),
            LastHwTxTsf => self.last_hw_tx_tsf.is_some(),
            ChannelFlags => self.channel_flags.is_some(),
            TxNess => self.tx_ness.is_some(),
            ExtraInfoField::TuningPolicy => self.tuning_policy.is_some(),
            PllRate => self.pll_rate.is_some(),
            PllRefDiv => self.pll_refdiv.is_some(),
            PllClkSel => self.pll_clock_select.is_some(),
            Agc => self.agc.is_some(),
            AntennaSelection => self.ant_sel.is_some(),
            SamplingRate => self.sampling_rate.is_some(),
            Cfo => self.cfo.is_some(),
            Sfo => self.sfo.is_some(),
            PreciseTxTiming => self.precise_tx_timing.is_some(),
        }
    }

    /// Bits of the present fields plus any unknown bits the record was
    /// decoded with.
    pub fn feature_code(&self) -> u32 {
        encode_feature_code(ExtraInfoField::ALL.into_iter().filter(|&f| self.has(f))) | self.unknown_bits
    }

    /// Decoded feature-code bits that name no known field.
    pub fn unknown_feature_bits(&self) -> u32 {
        self.unknown_bits
    }

    /// Encoded size of the present fields, excluding the feature code.
    pub fn calculate_buffer_length(&self) -> usize {
        calculate_buffer_length(self.feature_code())
    }

    /// Recompute `length` as the size of every other present field.
    fn update_length(&mut self) {
        let mut code = self.feature_code();
        code |= ExtraInfoField::Length.bit();
        let len = calculate_buffer_length(code) - ExtraInfoField::Length.size();
        self.length = Some(u16::try_from(len).unwrap_or(u16::MAX));
    }

    /// Decode fields starting at `data[0]`.
    ///
    /// With `supplied_code = None` the feature code is read first; otherwise
    /// the caller has already consumed it. Returns the value and the bytes
    /// consumed.
    pub fn from_binary(data: &[u8], supplied_code: Option<u32>) -> Result<(Self, usize)> {
        let mut r = Reader::new(data);
        let code = match supplied_code {
            Some(code) => code,
            None => r.uint32()?,
        };

        let mut ei = Self::empty();
        ei.unknown_bits = code & !KNOWN_FEATURE_BITS;
        for field in decode_feature_code(code) {
            use ExtraInfoField::*;
            match field {
                Length => ei.length = Some(r.uint16()?),
                Version => ei.version = Some(r.uint64()?),
                MacAddrCur => ei.macaddr_cur = Some(r.mac()?),
                MacAddrRom => ei.macaddr_rom = Some(r.mac()?),
                Chansel => ei.chansel = Some(r.uint32()?),
                BMode => ei.bmode = Some(r.uint8()?),
                Evm => {
                    let mut evm = [0i8; 20];
                    for (dst, &b) in evm.iter_mut().zip(r.bytes(20)?) {
                        *dst = b as i8;
                    }
                    ei.evm = Some(evm);
                }
                TxChainMask => ei.tx_chain_mask = Some(r.uint8()?),
                RxChainMask => ei.rx_chain_mask = Some(r.uint8()?),
                TxPower => ei.txpower = Some(r.uint8()?),
                Cf => ei.cf = Some(r.uint64()?),
                TxTsf => ei.tx_tsf = Some(r.uint32()?),
                LastHwTxTsf => ei.last_hw_tx_tsf = Some(r.uint32()?),
                ChannelFlags => ei.channel_flags = Some(r.uint16()?),
                TxNess => ei.tx_ness = Some(r.uint8()?),
                ExtraInfoField::TuningPolicy => ei.tuning_policy = Some(r.uint8()?),
                PllRate => ei.pll_rate = Some(r.uint16()?),
                PllRefDiv => ei.pll_refdiv = Some(r.uint8()?),
                PllClkSel => ei.pll_clock_select = Some(r.uint8()?),
                Agc => ei.agc = Some(r.uint8()?),
                AntennaSelection => ei.ant_sel = Some(unpack_ant_sel(r.uint8()?)),
                SamplingRate => ei.sampling_rate = Some(r.uint64()?),
                Cfo => ei.cfo = Some(r.int32()?),
                Sfo => ei.sfo = Some(r.int32()?),
                PreciseTxTiming => ei.precise_tx_timing = Some(r.float64()?),
            }
        }
        Ok((ei, r.position()))
    }

    /// Decode and check the consumed size against the feature code.
    pub fn from_buffer(data: &[u8], supplied_code: Option<u32>) -> Result<Self> {
        let (ei, consumed) = Self::from_binary(data, supplied_code)?;
        let prefix = if supplied_code.is_some() { 0 } else { 4 };
        let expected = ei.calculate_buffer_length() + prefix;
        if consumed != expected {
            return Err(FrameError::underflow("ExtraInfo", expected, consumed));
        }
        Ok(ei)
    }

    /// Encode as feature code followed by the present fields.
    pub fn to_buffer(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.calculate_buffer_length());
        codec::write_uint32(&mut buf, self.feature_code());
        if let Some(v) = self.length {
            codec::write_uint16(&mut buf, v);
        }
        if let Some(v) = self.version {
            codec::write_uint64(&mut buf, v);
        }
        if let Some(v) = self.macaddr_cur {
            buf.extend_from_slice(&v);
        }
        if let Some(v) = self.macaddr_rom {
            buf.extend_from_slice(&v);
        }
        if let Some(v) = self.chansel {
            codec::write_uint32(&mut buf, v);
        }
        if let Some(v) = self.bmode {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.evm {
            buf.extend(v.iter().map(|&e| e as u8));
        }
        if let Some(v) = self.tx_chain_mask {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.rx_chain_mask {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.txpower {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.cf {
            codec::write_uint64(&mut buf, v);
        }
        if let Some(v) = self.tx_tsf {
            codec::write_uint32(&mut buf, v);
        }
        if let Some(v) = self.last_hw_tx_tsf {
            codec::write_uint32(&mut buf, v);
        }
        if let Some(v) = self.channel_flags {
            codec::write_uint16(&mut buf, v);
        }
        if let Some(v) = self.tx_ness {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.tuning_policy {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.pll_rate {
            codec::write_uint16(&mut buf, v);
        }
        if let Some(v) = self.pll_refdiv {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.pll_clock_select {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.agc {
            codec::write_uint8(&mut buf, v);
        }
        if let Some(v) = self.ant_sel {
            codec::write_uint8(&mut buf, pack_ant_sel(v));
        }
        if let Some(v) = self.sampling_rate {
            codec::write_uint64(&mut buf, v);
        }
        if let Some(v) = self.cfo {
            codec::write_int32(&mut buf, v);
        }
        if let Some(v) = self.sfo {
            codec::write_int32(&mut buf, v);
        }
        if let Some(v) = self.precise_tx_timing {
            codec::write_float64(&mut buf, v);
        }
        buf
    }
}

impl Default for ExtraInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Three 2-bit antenna ids, each stored minus one.
fn unpack_ant_sel(b: u8) -> [u8; 3] {
    [(b & 0x1) + 1, ((b >> 2) & 0x3) + 1, ((b >> 4) & 0x3) + 1]
}

fn pack_ant_sel(ids: [u8; 3]) -> u8 {
    let bits = |id: u8| id.wrapping_sub(1) & 0x3;
    bits(ids[0]) | bits(ids[1]) << 2 | bits(ids[2]) << 4
}

impl fmt::Display for ExtraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(v) = self.length {
            parts.push(format!("len={v}"));
        }
        if let Some(v) = self.version {
            parts.push(format!("ver=0x{v:x}"));
        }
        if let Some(m) = self.macaddr_cur {
            parts.push(format!("mac_cur[4-6]={:02x}:{:02x}:{:02x}", m[3], m[4], m[5]));
        }
        if let Some(m) = self.macaddr_rom {
            parts.push(format!("mac_rom[4-6]={:02x}:{:02x}:{:02x}", m[3], m[4], m[5]));
        }
        if let Some(v) = self.chansel {
            parts.push(format!("chansel={v}"));
        }
        if let Some(v) = self.bmode {
            parts.push(format!("bmode={v}"));
        }
        if let Some(v) = self.evm {
            parts.push(format!("evm[0]={}", v[0]));
        }
        if let Some(v) = self.tx_chain_mask {
            parts.push(format!("txcm={v}"));
        }
        if let Some(v) = self.rx_chain_mask {
            parts.push(format!("rxcm={v}"));
        }
        if let Some(v) = self.txpower {
            parts.push(format!("txpower={v}"));
        }
        if let Some(v) = self.cf {
            parts.push(format!("cf={:.3} MHz", v as f64 / 1e6));
        }
        if let Some(v) = self.sampling_rate {
            parts.push(format!("sf={:.3} MHz", v as f64 / 1e6));
        }
        if let Some(v) = self.precise_tx_timing {
            parts.push(format!("tx-time={v}s"));
        }
        if let Some(v) = self.tx_tsf {
            parts.push(format!("tx-tsf={v}"));
        }
        if let Some(v) = self.last_hw_tx_tsf {
            parts.push(format!("last-tsf={v}"));
        }
        if let Some(v) = self.channel_flags {
            parts.push(format!("flags={v} ({})", ChannelMode::from_channel_flags(v)));
        }
        if let Some(v) = self.tx_ness {
            parts.push(format!("tx_ness={v}"));
        }
        if let Some(v) = self.tuning_policy {
            match TuningPolicy::from_code(v) {
                Some(p) => parts.push(format!("cf_policy={p}")),
                None => parts.push(format!("cf_policy={v}")),
            }
        }
        if let (Some(rate), Some(div), Some(sel)) = (self.pll_rate, self.pll_refdiv, self.pll_clock_select) {
            parts.push(format!("pll=({rate}, {div}, {sel})"));
        }
        if let Some(v) = self.agc {
            parts.push(format!("agc={v}"));
        }
        if let Some(v) = self.ant_sel {
            parts.push(format!("ant_sel=[{}, {}, {}]", v[0], v[1], v[2]));
        }
        if let Some(v) = self.cfo {
            parts.push(format!("cfo={v}"));
        }
        if let Some(v) = self.sfo {
            parts.push(format!("sfo={v}"));
        }
        write!(f, "ExtraInfo:[{}]", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// ExtraInfo segment layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraInfoLayout {
    V1,
}

impl ExtraInfoLayout {
    fn from_version(version: u16) -> Result<Self> {
        match version {
            1 => Ok(Self::V1),
            _ => Err(FrameError::UnknownSegmentVersion {
                segment: ExtraInfoSegment::NAME.to_string(),
                version,
            }),
        }
    }

    fn decode(self, body: &[u8]) -> Result<ExtraInfo> {
        match self {
            Self::V1 => {
                let ei = ExtraInfo::from_buffer(body, None)?;
                let expected = body.len().saturating_sub(4);
                if ei.calculate_buffer_length() != expected {
                    return Err(FrameError::underflow(
                        "ExtraInfo",
                        expected,
                        ei.calculate_buffer_length(),
                    ));
                }
                Ok(ei)
            }
        }
    }
}

/// The `ExtraInfo` segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtraInfoSegment {
    #[cfg_attr(feature = "serde", serde(skip))]
    segment: Segment,
    extra_info: ExtraInfo,
}

impl ExtraInfoSegment {
    pub const NAME: &'static str = "ExtraInfo";
    pub const VERSION: u16 = 1;

    pub fn new(extra_info: ExtraInfo) -> Self {
        let mut segment = Segment::new(Self::NAME, Self::VERSION);
        segment.add_field("EI", extra_info.to_buffer());
        Self { segment, extra_info }
    }

    pub fn from_buffer(buf: &[u8]) -> Result<Self> {
        let (segment, body) = Segment::open(buf, &[Self::NAME])?;
        let extra_info = ExtraInfoLayout::from_version(segment.version())?
            .decode(body)
            .map_err(|e| e.with_raw(body))?;
        Ok(Self { segment, extra_info })
    }

    pub fn extra_info(&self) -> &ExtraInfo {
        &self.extra_info
    }

    pub fn set_extra_info(&mut self, extra_info: ExtraInfo) {
        self.segment.clear_fields();
        self.segment.add_field("EI", extra_info.to_buffer());
        self.extra_info = extra_info;
    }
}

impl FrameSegment for ExtraInfoSegment {
    fn segment(&self) -> &Segment {
        &self.segment
    }
}

impl fmt::Display for ExtraInfoSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extra_info)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
