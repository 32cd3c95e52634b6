//! Subcarrier index tables.
//!
//! Tone offsets are relative to DC (negative below), never include 0 and are
//! ascending. The OFDM plans follow IEEE 802.11 clauses 17 (NonHT), 19 (HT),
//! 21 (VHT) and 27 (HE); the HE plans use the full-bandwidth RU.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use crate::common::{ChannelBandwidth, PacketFormat};

/// Which tones of a plan to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubcarrierSet {
    All,
    Data,
    Pilot,
}

/// Full, data-only and pilot-only index lists of one OFDM plan.
#[derive(Debug)]
pub struct TonePlan {
    pub all: Vec<i16>,
    pub data: Vec<i16>,
    pub pilot: Vec<i16>,
}

impl TonePlan {
    /// Build from occupied ranges and the positive half of a symmetric pilot set.
    fn new(ranges: &[RangeInclusive<i16>], positive_pilots: &[i16]) -> Self {
        let all: Vec<i16> = ranges.iter().flat_map(|r| r.clone()).collect();
        let mut pilot: Vec<i16> = positive_pilots
            .iter()
            .flat_map(|&p| [-p, p])
            .collect();
        pilot.sort_unstable();
        let data = all.iter().copied().filter(|i| pilot.binary_search(i).is_err()).collect();
        Self { all, data, pilot }
    }

    pub fn get(&self, set: SubcarrierSet) -> &[i16] {
        match set {
            SubcarrierSet::All => &self.all,
            SubcarrierSet::Data => &self.data,
            SubcarrierSet::Pilot => &self.pilot,
        }
    }
}

const HE80_PILOTS: [i16; 8] = [24, 92, 158, 226, 266, 334, 400, 468];

static NON_HT_20: LazyLock<TonePlan> = LazyLock::new(|| TonePlan::new(&[-26..=-1, 1..=26], &[7, 21]));

static HT_20: LazyLock<TonePlan> = LazyLock::new(|| TonePlan::new(&[-28..=-1, 1..=28], &[7, 21]));

static HT_40: LazyLock<TonePlan> = LazyLock::new(|| TonePlan::new(&[-58..=-2, 2..=58], &[11, 25, 53]));

static VHT_80: LazyLock<TonePlan> =
    LazyLock::new(|| TonePlan::new(&[-122..=-2, 2..=122], &[11, 39, 75, 103]));

static VHT_160: LazyLock<TonePlan> = LazyLock::new(|| {
    TonePlan::new(
        &[-250..=-130, -126..=-6, 6..=126, 130..=250],
        &[25, 53, 89, 117, 139, 167, 203, 231],
    )
});

static HE_20: LazyLock<TonePlan> =
    LazyLock::new(|| TonePlan::new(&[-122..=-2, 2..=122], &[22, 48, 90, 116]));

static HE_40: LazyLock<TonePlan> = LazyLock::new(|| {
    TonePlan::new(&[-244..=-3, 3..=244], &[10, 36, 78, 104, 144, 170, 212, 238])
});

static HE_80: LazyLock<TonePlan> = LazyLock::new(|| TonePlan::new(&[-500..=-3, 3..=500], &HE80_PILOTS));

// Two HE80 plans side by side, centred at -512 and +512.
static HE_160: LazyLock<TonePlan> = LazyLock::new(|| {
    let mut pilots: Vec<i16> = HE80_PILOTS.iter().flat_map(|&p| [512 - p, 512 + p]).collect();
    pilots.sort_unstable();
    TonePlan::new(&[-1012..=-515, -509..=-12, 12..=509, 515..=1012], &pilots)
});

/// The OFDM plan for a format and bandwidth, if one is defined.
pub fn tone_plan(format: PacketFormat, cbw: ChannelBandwidth) -> Option<&'static TonePlan> {
    use ChannelBandwidth::*;
    use PacketFormat::*;
    let plan: &'static LazyLock<TonePlan> = match (format, cbw) {
        (NonHt, Cbw20) => &NON_HT_20,
        (Ht | Vht, Cbw20) => &HT_20,
        (Ht | Vht, Cbw40) => &HT_40,
        (Vht, Cbw80) => &VHT_80,
        (Vht, Cbw160) => &VHT_160,
        (HeSu, Cbw20) => &HE_20,
        (HeSu, Cbw40) => &HE_40,
        (HeSu, Cbw80) => &HE_80,
        (HeSu, Cbw160) => &HE_160,
        _ => return None,
    };
    Some(LazyLock::force(plan))
}

/// Index list for a format, bandwidth and tone subset.
pub fn subcarrier_indices(
    format: PacketFormat,
    cbw: ChannelBandwidth,
    set: SubcarrierSet,
) -> Option<&'static [i16]> {
    tone_plan(format, cbw).map(|plan| plan.get(set))
}

// ---------------------------------------------------------------------------
// Vendor tables
// ---------------------------------------------------------------------------

/// Tones reported by the Atheros CSI engine (every HT tone).
pub fn atheros_indices(cbw: ChannelBandwidth) -> Option<&'static [i16]> {
    subcarrier_indices(PacketFormat::Ht, cbw, SubcarrierSet::All)
        .filter(|_| matches!(cbw, ChannelBandwidth::Cbw20 | ChannelBandwidth::Cbw40))
}

/// The 30 grouped tones reported by the IWL5300, 20 MHz.
pub const IWL5300_INDICES_20: [i16; 30] = [
    -28, -26, -24, -22, -20, -18, -16, -14, -12, -10, -8, -6, -4, -2, -1, 1, 3, 5, 7, 9, 11, 13, 15, 17,
    19, 21, 23, 25, 27, 28,
];

/// The 30 grouped tones reported by the IWL5300, 40 MHz.
pub const IWL5300_INDICES_40: [i16; 30] = [
    -58, -54, -50, -46, -42, -38, -34, -30, -26, -22, -18, -14, -10, -6, -2, 2, 6, 10, 14, 18, 22, 26, 30,
    34, 38, 42, 46, 50, 54, 58,
];

pub fn iwl5300_indices(cbw: ChannelBandwidth) -> Option<&'static [i16]> {
    match cbw {
        ChannelBandwidth::Cbw20 => Some(&IWL5300_INDICES_20),
        ChannelBandwidth::Cbw40 => Some(&IWL5300_INDICES_40),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(format: PacketFormat, cbw: ChannelBandwidth) -> (usize, usize, usize) {
        let plan = tone_plan(format, cbw).unwrap();
        (plan.all.len(), plan.data.len(), plan.pilot.len())
    }

    #[test]
    fn plan_sizes() {
        use ChannelBandwidth::*;
        use PacketFormat::*;
        assert_eq!(counts(NonHt, Cbw20), (52, 48, 4));
        assert_eq!(counts(Ht, Cbw20), (56, 52, 4));
        assert_eq!(counts(Ht, Cbw40), (114, 108, 6));
        assert_eq!(counts(Vht, Cbw80), (242, 234, 8));
        assert_eq!(counts(Vht, Cbw160), (484, 468, 16));
        assert_eq!(counts(HeSu, Cbw20), (242, 234, 8));
        assert_eq!(counts(HeSu, Cbw40), (484, 468, 16));
        assert_eq!(counts(HeSu, Cbw80), (996, 980, 16));
        assert_eq!(counts(HeSu, Cbw160), (1992, 1960, 32));
    }

    #[test]
    fn plans_are_ascending_without_dc() {
        use ChannelBandwidth::*;
        use PacketFormat::*;
        for (format, cbw) in [
            (NonHt, Cbw20),
            (Ht, Cbw40),
            (Vht, Cbw160),
            (HeSu, Cbw40),
            (HeSu, Cbw160),
        ] {
            let plan = tone_plan(format, cbw).unwrap();
            for set in [&plan.all, &plan.data, &plan.pilot] {
                assert!(set.windows(2).all(|w| w[0] < w[1]), "{format} {cbw}");
                assert!(!set.contains(&0));
            }
            assert!(plan.pilot.iter().all(|p| plan.all.contains(p)), "{format} {cbw}");
        }
    }

    #[test]
    fn ht20_pilots() {
        let pilots = subcarrier_indices(PacketFormat::Ht, ChannelBandwidth::Cbw20, SubcarrierSet::Pilot).unwrap();
        assert_eq!(pilots, &[-21, -7, 7, 21]);
    }

    #[test]
    fn missing_plans() {
        assert!(tone_plan(PacketFormat::NonHt, ChannelBandwidth::Cbw40).is_none());
        assert!(tone_plan(PacketFormat::Ht, ChannelBandwidth::Cbw80).is_none());
        assert!(tone_plan(PacketFormat::Unknown, ChannelBandwidth::Cbw20).is_none());
        assert!(atheros_indices(ChannelBandwidth::Cbw80).is_none());
    }

    #[test]
    fn vendor_tables() {
        assert_eq!(atheros_indices(ChannelBandwidth::Cbw40).unwrap().len(), 114);
        assert_eq!(iwl5300_indices(ChannelBandwidth::Cbw20).unwrap()[14], -1);
        assert!(iwl5300_indices(ChannelBandwidth::Cbw80).is_none());
    }
}
