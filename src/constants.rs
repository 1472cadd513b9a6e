//! Physical constants and signal tables shared by the decoding engine
use gnss_rs::prelude::Constellation;
use std::collections::HashMap;

/// Speed of light, m/s
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Speed of light, meters per nanosecond.
/// Scales receiver/satellite clock differences into pseudo ranges.
pub const SPEED_OF_LIGHT_M_NS: f64 = 0.299_792_458;

pub const NANOS_PER_SEC: i64 = 1_000_000_000;
pub const NANOS_PER_MSEC: i64 = 1_000_000;
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SEC;
pub const NANOS_PER_WEEK: i64 = 7 * NANOS_PER_DAY;

/// GPS C/A bit period (20 ms), pseudo range modulo when only bit sync is achieved
pub const NANOS_PER_BIT: i64 = 20 * NANOS_PER_MSEC;
/// GPS subframe period (6 s)
pub const NANOS_PER_SUBFRAME: i64 = 6 * NANOS_PER_SEC;
/// Galileo E1B page period (2 s)
pub const NANOS_PER_E1B_PAGE: i64 = 2 * NANOS_PER_SEC;
/// Galileo E1C secondary code period (100 ms)
pub const NANOS_PER_E1C_2ND_CODE: i64 = 100 * NANOS_PER_MSEC;

/// Raw satellite numbers in this range identify a GLONASS vehicle
/// by frequency channel (FCN + 100) instead of orbital slot.
pub const GLO_FCN_MIN: u16 = 93;
pub const GLO_FCN_MAX: u16 = 106;

/// Number of entries in the GLONASS almanac slot table
pub const GLO_MAX_SLOTS: usize = 38;

/// GLONASS G1 sub-band carrier for a given frequency channel number
pub fn glonass_g1_mhz(fcn: i8) -> f64 {
    1602.0 + (fcn as f64) * 0.5625
}

/// GLONASS G2 sub-band carrier for a given frequency channel number
pub fn glonass_g2_mhz(fcn: i8) -> f64 {
    1246.0 + (fcn as f64) * 0.4375
}

/// Nominal carrier frequency (MHz) for a (constellation, band) pair.
/// GLONASS FDMA bands are channel dependent, see [glonass_g1_mhz].
pub fn carrier_frequency_mhz(constellation: Constellation, band: char) -> Option<f64> {
    match (constellation, band) {
        (Constellation::GPS | Constellation::QZSS, '1') => Some(1575.42),
        (Constellation::GPS | Constellation::QZSS, '2') => Some(1227.60),
        (Constellation::GPS | Constellation::QZSS, '5') => Some(1176.45),
        (Constellation::Glonass, '1') => Some(1602.0),
        (Constellation::Glonass, '2') => Some(1246.0),
        (Constellation::Galileo, '1') => Some(1575.42),
        (Constellation::Galileo, '5') => Some(1176.45),
        (Constellation::Galileo, '7') => Some(1207.14),
        (Constellation::Galileo, '8') => Some(1191.795),
        (Constellation::BeiDou, '2') => Some(1561.098),
        (Constellation::BeiDou, '7') => Some(1207.14),
        (Constellation::BeiDou, '6') => Some(1268.52),
        (c, '1') if c.is_sbas() => Some(1575.42),
        (c, '5') if c.is_sbas() => Some(1176.45),
        _ => None,
    }
}

lazy_static! {
    /// Known (constellation, band + attribute) measurement combinations.
    /// Anything outside this whitelist is dropped with a warning upstream.
    pub static ref KNOWN_SIGNALS: HashMap<Constellation, Vec<&'static str>> = {
        let mut m = HashMap::new();
        m.insert(Constellation::GPS, vec!["1C", "2C", "5Q", "5X"]);
        m.insert(Constellation::Glonass, vec!["1C", "2C"]);
        m.insert(Constellation::Galileo, vec!["1B", "1C", "5Q", "5X", "7Q"]);
        m.insert(Constellation::SBAS, vec!["1C", "5Q"]);
        m.insert(Constellation::BeiDou, vec!["2I", "7I", "6I"]);
        m.insert(Constellation::QZSS, vec!["1C", "2C", "5Q"]);
        m
    };
}

/// Returns true if the (constellation, band + attribute) combination
/// is part of the supported measurement set
pub fn signal_is_known(constellation: Constellation, signal: &str) -> bool {
    let key = if constellation.is_sbas() {
        Constellation::SBAS
    } else {
        constellation
    };
    KNOWN_SIGNALS
        .get(&key)
        .map(|list| list.contains(&signal))
        .unwrap_or(false)
}

/// V2.10 equivalent of a V3.04 observable code, when one exists.
/// The V2 grammar only knows per-band codes (C1, P1, L1, D1, S1, ...).
pub fn v2_equivalent(code: &str) -> Option<&'static str> {
    let mut chars = code.chars();
    let kind = chars.next()?;
    let band = chars.next()?;
    let attribute = chars.next()?;
    match (kind, band, attribute) {
        ('C', '1', 'P' | 'W' | 'Y') => Some("P1"),
        ('C', '2', 'P' | 'W' | 'Y') => Some("P2"),
        ('C', '1', _) => Some("C1"),
        ('C', '2', _) => Some("C2"),
        ('C', '5', _) => Some("C5"),
        ('C', '6', _) => Some("C6"),
        ('C', '7', _) => Some("C7"),
        ('C', '8', _) => Some("C8"),
        ('L', '1', _) => Some("L1"),
        ('L', '2', _) => Some("L2"),
        ('L', '5', _) => Some("L5"),
        ('L', '6', _) => Some("L6"),
        ('L', '7', _) => Some("L7"),
        ('L', '8', _) => Some("L8"),
        ('D', '1', _) => Some("D1"),
        ('D', '2', _) => Some("D2"),
        ('D', '5', _) => Some("D5"),
        ('D', '6', _) => Some("D6"),
        ('D', '7', _) => Some("D7"),
        ('D', '8', _) => Some("D8"),
        ('S', '1', _) => Some("S1"),
        ('S', '2', _) => Some("S2"),
        ('S', '5', _) => Some("S5"),
        ('S', '6', _) => Some("S6"),
        ('S', '7', _) => Some("S7"),
        ('S', '8', _) => Some("S8"),
        _ => None,
    }
}

/// Default V3.04 expansion of a V2.10 observable code, used when
/// reading old files where the signal attribute was never recorded
pub fn v3_default(code: &str) -> Option<String> {
    let mut chars = code.chars();
    let kind = chars.next()?;
    let band = chars.next()?;
    if !band.is_ascii_digit() {
        return None;
    }
    match kind {
        'P' => Some(format!("C{}W", band)),
        'C' | 'L' | 'D' | 'S' => Some(format!("{}{}C", kind, band)),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn carrier_frequencies() {
        assert_eq!(
            carrier_frequency_mhz(Constellation::GPS, '1'),
            Some(1575.42)
        );
        assert_eq!(
            carrier_frequency_mhz(Constellation::Galileo, '5'),
            Some(1176.45)
        );
        assert_eq!(carrier_frequency_mhz(Constellation::GPS, '9'), None);
        assert!((glonass_g1_mhz(-3) - 1600.3125).abs() < 1e-9);
        assert!((glonass_g1_mhz(0) - 1602.0).abs() < 1e-9);
    }

    #[test]
    fn known_signals() {
        assert!(signal_is_known(Constellation::GPS, "1C"));
        assert!(signal_is_known(Constellation::Galileo, "1B"));
        assert!(!signal_is_known(Constellation::GPS, "1B"));
        assert!(!signal_is_known(Constellation::Glonass, "5Q"));
    }

    #[test]
    fn v2_equivalents() {
        assert_eq!(v2_equivalent("C1C"), Some("C1"));
        assert_eq!(v2_equivalent("C1W"), Some("P1"));
        assert_eq!(v2_equivalent("L2C"), Some("L2"));
        assert_eq!(v2_equivalent("S5Q"), Some("S5"));
        assert_eq!(v2_equivalent("X1C"), None);
    }

    #[test]
    fn v3_defaults() {
        assert_eq!(v3_default("C1").as_deref(), Some("C1C"));
        assert_eq!(v3_default("P2").as_deref(), Some("C2W"));
        assert_eq!(v3_default("S5").as_deref(), Some("S5C"));
        assert_eq!(v3_default("X1"), None);
    }
}
