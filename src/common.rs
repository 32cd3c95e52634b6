//! Shared 802.11 and hardware enumerations.

use std::fmt;

use crate::error::{FrameError, Result};

/// Frame magic word, shared by the RX outer header and the TX PicoScenes header.
pub const PICOSCENES_MAGIC: u32 = 0x2015_0315;

/// Hardware families that produce CSI.
///
/// Codes without a named variant are kept as `Other` so frames from newer
/// frontends still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DeviceType {
    /// Qualcomm Atheros AR9300 family
    Qca9300,
    /// Intel Wireless Link 5300
    Iwl5300,
    /// Intel MVM-driver NICs (AX200/AX210 and newer)
    IwlMvm,
    /// Any mac80211 device without CSI support
    Mac80211Compatible,
    /// USRP software-defined radio
    Usrp,
    /// Simulated SDR frontend
    VirtualSdr,
    Unknown,
    Other(u16),
}

impl DeviceType {
    pub fn from_code(code: u16) -> Self {
        match code {
            0x9300 => Self::Qca9300,
            0x5300 => Self::Iwl5300,
            0x2000 => Self::IwlMvm,
            0x802 => Self::Mac80211Compatible,
            0x1234 => Self::Usrp,
            0x1000 => Self::VirtualSdr,
            0x404 => Self::Unknown,
            other => Self::Other(other),
        }
    }

    pub fn as_code(self) -> u16 {
        match self {
            Self::Qca9300 => 0x9300,
            Self::Iwl5300 => 0x5300,
            Self::IwlMvm => 0x2000,
            Self::Mac80211Compatible => 0x802,
            Self::Usrp => 0x1234,
            Self::VirtualSdr => 0x1000,
            Self::Unknown => 0x404,
            Self::Other(code) => code,
        }
    }

    /// True for frontends whose CSI arrives as an explicit index list plus matrix.
    pub fn is_sdr(self) -> bool {
        matches!(self, Self::Usrp | Self::VirtualSdr)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qca9300 => write!(f, "QCA9300"),
            Self::Iwl5300 => write!(f, "IWL5300"),
            Self::IwlMvm => write!(f, "IWLMVM"),
            Self::Mac80211Compatible => write!(f, "MAC80211 Compatible NIC"),
            Self::Usrp => write!(f, "USRP(SDR)"),
            Self::VirtualSdr => write!(f, "Virtual(SDR)"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Other(code) => write!(f, "Device(0x{code:04X})"),
        }
    }
}

/// PHY packet format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(i8)]
pub enum PacketFormat {
    NonHt = 0,
    Ht = 1,
    Vht = 2,
    HeSu = 3,
    HeMu = 4,
    Unknown = -1,
}

impl PacketFormat {
    /// Unrecognized codes map to `Unknown`.
    pub fn from_code(code: i8) -> Self {
        match code {
            0 => Self::NonHt,
            1 => Self::Ht,
            2 => Self::Vht,
            3 => Self::HeSu,
            4 => Self::HeMu,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> i8 {
        self as i8
    }
}

impl fmt::Display for PacketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonHt => write!(f, "NonHT"),
            Self::Ht => write!(f, "HT"),
            Self::Vht => write!(f, "VHT"),
            Self::HeSu => write!(f, "HE-SU"),
            Self::HeMu => write!(f, "HE-MU"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Channel bandwidth in MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u16)]
pub enum ChannelBandwidth {
    Cbw5 = 5,
    Cbw10 = 10,
    Cbw20 = 20,
    Cbw40 = 40,
    Cbw80 = 80,
    Cbw160 = 160,
}

impl ChannelBandwidth {
    pub fn from_mhz(mhz: u16) -> Result<Self> {
        match mhz {
            5 => Ok(Self::Cbw5),
            10 => Ok(Self::Cbw10),
            20 => Ok(Self::Cbw20),
            40 => Ok(Self::Cbw40),
            80 => Ok(Self::Cbw80),
            160 => Ok(Self::Cbw160),
            _ => Err(FrameError::unsupported(format!("channel bandwidth {mhz} MHz"))),
        }
    }

    pub fn as_mhz(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ChannelBandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_mhz())
    }
}

/// OFDM guard interval in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u16)]
pub enum GuardInterval {
    Gi400 = 400,
    Gi800 = 800,
    Gi1600 = 1600,
    Gi3200 = 3200,
}

impl GuardInterval {
    pub fn from_ns(ns: u16) -> Result<Self> {
        match ns {
            400 => Ok(Self::Gi400),
            800 => Ok(Self::Gi800),
            1600 => Ok(Self::Gi1600),
            3200 => Ok(Self::Gi3200),
            _ => Err(FrameError::unsupported(format!("guard interval {ns} ns"))),
        }
    }

    pub fn as_ns(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for GuardInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ns())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum ChannelCoding {
    Bcc = 0,
    Ldpc = 1,
}

impl ChannelCoding {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Bcc),
            1 => Ok(Self::Ldpc),
            _ => Err(FrameError::unsupported(format!("channel coding {code}"))),
        }
    }
}

impl fmt::Display for ChannelCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bcc => write!(f, "BCC"),
            Self::Ldpc => write!(f, "LDPC"),
        }
    }
}

/// HT channel placement derived from the Atheros channel flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum ChannelMode {
    Ht20 = 8,
    Ht40Minus = 24,
    Ht40Plus = 40,
}

impl ChannelMode {
    /// Bit 3 marks HT; bit 4 selects HT40+, bit 5 selects HT40-.
    pub fn from_channel_flags(flags: u16) -> Self {
        let ht = flags & (1 << 3) != 0;
        if ht && flags & (1 << 4) != 0 {
            Self::Ht40Plus
        } else if ht && flags & (1 << 5) != 0 {
            Self::Ht40Minus
        } else {
            Self::Ht20
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ht20 => write!(f, "HT20"),
            Self::Ht40Minus => write!(f, "HT40-"),
            Self::Ht40Plus => write!(f, "HT40+"),
        }
    }
}
