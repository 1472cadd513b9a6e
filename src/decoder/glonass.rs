//! GLONASS L1 C/A navigation string decoding.
//!
//! Two independent consumers feed from the same 85 bit strings: the
//! almanac table, which pairs strings 6..15 into (orbital slot,
//! frequency channel) entries used to resolve satellites reported by
//! channel number, and the ephemeris assembler, which collects strings
//! 1..4 into one broadcast data set per satellite.
use std::collections::HashMap;

use hifitime::{Duration, Epoch, TimeScale};
use log::warn;

use crate::{
    constants::{GLO_FCN_MAX, GLO_FCN_MIN, GLO_MAX_SLOTS},
    decoder::bits::NavBits,
    epoch::week_tow_to_epoch,
    navigation::{SatNavData, BROADCAST_ORBIT_ROWS},
    prelude::Constellation,
};

/// Moscow decree time offset (UTC+3) applied to the tb field
const MOSCOW_UTC_OFFSET_S: f64 = 10_800.0;

/// One slot of the almanac table. Populated in two steps: the even
/// string (6/8/10/12/14) plants the slot number and the string number
/// its continuation must carry, the matching odd string resolves the
/// frequency channel.
#[derive(Copy, Clone, Debug, Default)]
struct AlmanacEntry {
    /// Orbital slot number nA, 0 while the entry is empty
    slot: u8,
    /// String number the pending continuation must carry
    expect: Option<u8>,
    /// Frequency channel number HnA, set once the pair completes
    channel: Option<i8>,
}

/// Almanac table cross referencing GLONASS orbital slot numbers and
/// frequency channel numbers, built incrementally from almanac string
/// pairs spread over many frames.
#[derive(Debug)]
pub struct GlonassAlmanac {
    entries: [AlmanacEntry; GLO_MAX_SLOTS],
}

impl Default for GlonassAlmanac {
    fn default() -> Self {
        Self {
            entries: [AlmanacEntry::default(); GLO_MAX_SLOTS],
        }
    }
}

impl GlonassAlmanac {
    /// Consumes one almanac string (6..15). Other string numbers are
    /// ignored. An out of order continuation leaves the table
    /// unchanged; a fresh even string always resets the expectation.
    pub fn feed_string(&mut self, string: u8, bits: &NavBits) {
        match string {
            6 | 8 | 10 | 12 | 14 => {
                let na = bits.glo_field(77, 73) as u8;
                if na == 0 || (na as usize) > GLO_MAX_SLOTS {
                    warn!("almanac string {} carries slot {}, ignored", string, na);
                    return;
                }
                let entry = &mut self.entries[na as usize - 1];
                entry.slot = na;
                entry.expect = Some(string + 1);
            },
            7 | 9 | 11 | 13 | 15 => {
                // only the entry expecting exactly this string accepts it
                let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|e| e.expect == Some(string))
                else {
                    return;
                };
                let raw = bits.glo_field(14, 10) as i8;
                // 5 bit channel: values >= 25 encode negatives
                let hna = if raw >= 25 { raw - 32 } else { raw };
                entry.channel = Some(hna);
                entry.expect = None;
            },
            _ => {},
        }
    }

    /// Resolves a raw satellite number in the frequency channel range
    /// (93..=106, i.e. FCN + 100) to its orbital slot, when the table
    /// knows the channel
    pub fn resolve_satellite(&self, raw: u16) -> Option<u8> {
        if !(GLO_FCN_MIN..=GLO_FCN_MAX).contains(&raw) {
            return None;
        }
        let channel = (raw as i16 - 100) as i8;
        self.entries
            .iter()
            .find(|e| e.slot != 0 && e.channel == Some(channel))
            .map(|e| e.slot)
    }

    /// Frequency channel of an orbital slot, when resolved
    pub fn channel_of(&self, slot: u8) -> Option<i8> {
        self.entries
            .iter()
            .find(|e| e.slot == slot)
            .and_then(|e| e.channel)
    }

    /// Every resolved (orbital slot, frequency channel) pair, for the
    /// GLONASS SLOT / FRQ # header record
    pub fn slot_channels(&self) -> Vec<(u8, i8)> {
        self.entries
            .iter()
            .filter(|e| e.slot != 0)
            .filter_map(|e| e.channel.map(|c| (e.slot, c)))
            .collect()
    }
}

/// ICD scaled content of strings 1..4, kept per transmitting satellite
/// until the set completes
#[derive(Debug, Default)]
struct GloFrame {
    strings: [Option<NavBits>; 4],
}

/// Collects GLONASS ephemeris strings into complete broadcast data sets
#[derive(Debug, Default)]
pub struct GlonassAssembler {
    frames: HashMap<u8, GloFrame>,
}

impl GlonassAssembler {
    /// Consumes one string for one satellite. Returns the decoded data
    /// set once strings 1..4 are all present, clearing the collector.
    /// `week`/`tow` (GPS time) anchor the tb day resolution, `channel`
    /// fills the frequency number cell of the record.
    pub fn feed(
        &mut self,
        slot: u8,
        string: u8,
        bits: NavBits,
        week: u32,
        tow: f64,
        channel: Option<i8>,
    ) -> Option<SatNavData> {
        if !(1..=4).contains(&string) {
            return None;
        }
        let frame = self.frames.entry(slot).or_default();
        frame.strings[string as usize - 1] = Some(bits);
        if frame.strings.iter().any(|s| s.is_none()) {
            return None;
        }
        let frame = self.frames.remove(&slot)?;
        Some(decode_frame(slot, &frame, week, tow, channel))
    }
}

fn decode_frame(
    slot: u8,
    frame: &GloFrame,
    week: u32,
    tow: f64,
    channel: Option<i8>,
) -> SatNavData {
    let s1 = frame.strings[0].as_ref().unwrap();
    let s2 = frame.strings[1].as_ref().unwrap();
    let s3 = frame.strings[2].as_ref().unwrap();
    let s4 = frame.strings[3].as_ref().unwrap();

    // string 1: frame time and X components
    let tk_h = s1.glo_field(76, 72) as f64;
    let tk_m = s1.glo_field(71, 66) as f64;
    let tk_30 = s1.glo_field(65, 65) as f64;
    let tk = tk_h * 3600.0 + tk_m * 60.0 + tk_30 * 30.0;
    let x_dot = (s1.glo_field_sm(64, 41) as f64) * 2.0_f64.powi(-20);
    let x_acc = (s1.glo_field_sm(40, 36) as f64) * 2.0_f64.powi(-30);
    let x = (s1.glo_field_sm(35, 9) as f64) * 2.0_f64.powi(-11);

    // string 2: health, tb and Y components
    let health = s2.glo_field(80, 80) as f64;
    let tb = s2.glo_field(76, 70) as f64 * 900.0;
    let y_dot = (s2.glo_field_sm(64, 41) as f64) * 2.0_f64.powi(-20);
    let y_acc = (s2.glo_field_sm(40, 36) as f64) * 2.0_f64.powi(-30);
    let y = (s2.glo_field_sm(35, 9) as f64) * 2.0_f64.powi(-11);

    // string 3: relative frequency bias and Z components
    let gamma = (s3.glo_field_sm(79, 69) as f64) * 2.0_f64.powi(-40);
    let z_dot = (s3.glo_field_sm(64, 41) as f64) * 2.0_f64.powi(-20);
    let z_acc = (s3.glo_field_sm(40, 36) as f64) * 2.0_f64.powi(-30);
    let z = (s3.glo_field_sm(35, 9) as f64) * 2.0_f64.powi(-11);

    // string 4: clock bias and age of data
    let tau = (s4.glo_field_sm(80, 59) as f64) * 2.0_f64.powi(-30);
    let age_days = s4.glo_field(53, 49) as f64;

    let epoch = tb_to_epoch(week, tow, tb);
    let mut broadcast_orbit = [[0.0; 4]; BROADCAST_ORBIT_ROWS];
    broadcast_orbit[0] = [-tau, gamma, tk, 0.0];
    broadcast_orbit[1] = [x, x_dot, x_acc, health];
    broadcast_orbit[2] = [y, y_dot, y_acc, channel.unwrap_or(0) as f64];
    broadcast_orbit[3] = [z, z_dot, z_acc, age_days];

    SatNavData {
        time_tag: epoch.to_gpst_seconds(),
        system: Constellation::Glonass,
        prn: slot,
        epoch,
        broadcast_orbit,
    }
}

/// tb indexes the 15 minute interval within the current Moscow day;
/// the observation epoch anchors which UTC day that is.
fn tb_to_epoch(week: u32, tow: f64, tb_seconds: f64) -> Epoch {
    let anchor = week_tow_to_epoch(week, tow, TimeScale::GPST);
    let (y, m, d, ..) = anchor.to_gregorian(TimeScale::UTC);
    let day_start = Epoch::from_gregorian(y, m, d, 0, 0, 0, 0, TimeScale::UTC);
    let mut seconds = tb_seconds - MOSCOW_UTC_OFFSET_S;
    if seconds < 0.0 {
        // interval belongs to the previous UTC day
        seconds += 86_400.0;
    }
    day_start + Duration::from_seconds(seconds)
}

#[cfg(test)]
mod test {
    use super::*;

    /* plants a field at GLONASS ICD bit positions within 3 words */
    fn planted(fields: &[(usize, usize, u32)]) -> NavBits {
        let mut words = [0_u32; 3];
        for (msb, lsb, value) in fields.iter().copied() {
            let width = msb - lsb + 1;
            for i in 0..width {
                let bit = (value >> i) & 1;
                let pos = 96 - (lsb + i);
                words[pos / 32] |= bit << (31 - (pos % 32));
            }
        }
        NavBits::new(&words)
    }

    #[test]
    fn almanac_pairing() {
        let mut almanac = GlonassAlmanac::default();
        // string 6 plants slot 5, string 7 resolves channel -3 (0b11101)
        almanac.feed_string(6, &planted(&[(77, 73, 5)]));
        almanac.feed_string(7, &planted(&[(14, 10, 0b11101)]));
        assert_eq!(almanac.channel_of(5), Some(-3));
        assert_eq!(almanac.slot_channels(), vec![(5, -3)]);
    }

    #[test]
    fn almanac_out_of_order_continuation() {
        let mut almanac = GlonassAlmanac::default();
        almanac.feed_string(6, &planted(&[(77, 73, 5)]));
        // string 9 is not the expected continuation of string 6
        almanac.feed_string(9, &planted(&[(14, 10, 2)]));
        assert_eq!(almanac.channel_of(5), None);
        // a fresh even string resets the expectation
        almanac.feed_string(8, &planted(&[(77, 73, 5)]));
        almanac.feed_string(9, &planted(&[(14, 10, 2)]));
        assert_eq!(almanac.channel_of(5), Some(2));
    }

    #[test]
    fn fcn_satellite_resolution() {
        let mut almanac = GlonassAlmanac::default();
        almanac.feed_string(6, &planted(&[(77, 73, 11)]));
        almanac.feed_string(7, &planted(&[(14, 10, 0b11111)]));
        // raw 99 means channel -1
        assert_eq!(almanac.resolve_satellite(99), Some(11));
        // unknown channel stays unresolved
        assert_eq!(almanac.resolve_satellite(105), None);
        // out of the FCN range entirely
        assert_eq!(almanac.resolve_satellite(12), None);
    }

    #[test]
    fn ephemeris_assembly() {
        let mut assembler = GlonassAssembler::default();
        let week = 2190;
        let tow = 345_600.0;

        // tb = 36 (09:00 Moscow), x = 2^13 * 2^-11 km, xdot negative
        let s1 = planted(&[
            (76, 72, 9),
            (35, 9, 1 << 13),
            (64, 41, (1 << 23) | 1024),
        ]);
        let s2 = planted(&[(76, 70, 36), (35, 9, 200), (80, 78, 0)]);
        let s3 = planted(&[(79, 69, 5), (35, 9, 300)]);
        let s4 = planted(&[(80, 59, 100), (53, 49, 1)]);

        assert!(assembler.feed(5, 1, s1, week, tow, Some(-3)).is_none());
        assert!(assembler.feed(5, 2, s2, week, tow, Some(-3)).is_none());
        assert!(assembler.feed(5, 3, s3, week, tow, Some(-3)).is_none());
        let data = assembler.feed(5, 4, s4, week, tow, Some(-3)).unwrap();

        assert_eq!(data.system, Constellation::Glonass);
        assert_eq!(data.prn, 5);
        assert_eq!(data.orbit_lines(), 3);
        // clock line: -tau, gamma, tk
        assert!((data.broadcast_orbit[0][0] + 100.0 * 2.0_f64.powi(-30)).abs() < 1.0E-15);
        assert!((data.broadcast_orbit[0][2] - 9.0 * 3600.0).abs() < 1.0E-9);
        // x scaled by 2^-11 km
        assert!((data.broadcast_orbit[1][0] - 4.0).abs() < 1.0E-12);
        assert!(data.broadcast_orbit[1][1] < 0.0, "sign magnitude velocity");
        // frequency number cell
        assert!((data.broadcast_orbit[2][3] + 3.0).abs() < 1.0E-12);

        // tb 09:00 Moscow is 06:00 UTC
        let (_, _, _, hh, mm, ..) = data.epoch.to_gregorian(TimeScale::UTC);
        assert_eq!((hh, mm), (6, 0));
    }
}
