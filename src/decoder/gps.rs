//! GPS L1 C/A navigation subframe decoding.
//!
//! The receiver delivers 10 raw 30 bit words per subframe, parity
//! included. Subframes 1..3 assemble into one broadcast data set per
//! satellite; subframe 4 page 18 carries the ionosphere model and the
//! UTC parameters published through the header corrections.
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::{
    decoder::bits::twos_complement,
    epoch::week_tow_to_epoch,
    header::{Correction, CorrectionType},
    navigation::{SatNavData, BROADCAST_ORBIT_ROWS},
    prelude::{Constellation, TimeScale},
};

/// User range accuracy (meters) for each 4 bit URA index
const URA_METERS: [f64; 15] = [
    2.4, 3.4, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0,
];

/// Outcome of one consumed subframe
#[derive(Debug)]
pub enum GpsOutput {
    /// Subframes 1..3 completed for one satellite
    Ephemeris(SatNavData),
    /// Subframe 4 page 18: ionosphere model, UTC parameters and the
    /// current leap second count
    Corrections {
        alpha: Correction,
        beta: Correction,
        utc: Correction,
        leap_seconds: i32,
    },
}

#[derive(Debug, Default)]
struct GpsFrame {
    subframes: [Option<[u32; 10]>; 3],
}

/// Collects GPS subframes into complete broadcast data sets
#[derive(Debug, Default)]
pub struct GpsAssembler {
    frames: HashMap<u8, GpsFrame>,
}

impl GpsAssembler {
    /// Consumes one subframe for one satellite. `week` (a full GPS week
    /// from the observation stream) resolves the 10 bit week rollover.
    pub fn feed(
        &mut self,
        prn: u8,
        subframe: u8,
        words: &[u32; 10],
        week: u32,
    ) -> Option<GpsOutput> {
        match subframe {
            1..=3 => {
                let frame = self.frames.entry(prn).or_default();
                frame.subframes[subframe as usize - 1] = Some(*words);
                if frame.subframes.iter().any(|s| s.is_none()) {
                    return None;
                }
                let frame = self.frames.remove(&prn)?;
                Some(GpsOutput::Ephemeris(decode_ephemeris(prn, &frame, week)))
            },
            4 => {
                // page 18 is identified by SV id 56 in word 3
                if field(words, 3, 3, 6) != 56 {
                    return None;
                }
                Some(decode_page18(words))
            },
            _ => None,
        }
    }
}

/// Data bit field accessor: `word` 1..10, `msb` 1..24 within the 24
/// parity stripped data bits of the word
fn field(words: &[u32; 10], word: usize, msb: usize, width: usize) -> u32 {
    let data = (words[word - 1] >> 6) & 0x00FF_FFFF;
    (data >> (24 + 1 - msb - width)) & ((1 << width) - 1)
}

fn field_signed(words: &[u32; 10], word: usize, msb: usize, width: usize) -> i32 {
    twos_complement(field(words, word, msb, width), width)
}

/// Joins the split fields (8 MSBs in one word, 24 LSBs in the next)
fn split_field(words: &[u32; 10], hi_word: usize, hi_msb: usize, lo_word: usize) -> u32 {
    (field(words, hi_word, hi_msb, 8) << 24) | field(words, lo_word, 1, 24)
}

fn split_field_signed(words: &[u32; 10], hi_word: usize, hi_msb: usize, lo_word: usize) -> i32 {
    split_field(words, hi_word, hi_msb, lo_word) as i32
}

fn decode_ephemeris(prn: u8, frame: &GpsFrame, ref_week: u32) -> SatNavData {
    let sf1 = &frame.subframes[0].unwrap();
    let sf2 = &frame.subframes[1].unwrap();
    let sf3 = &frame.subframes[2].unwrap();

    // subframe 1: clock terms
    let wn10 = field(sf1, 3, 1, 10);
    let codes_l2 = field(sf1, 3, 11, 2) as f64;
    let ura_index = field(sf1, 3, 13, 4) as usize;
    let health = field(sf1, 3, 17, 6) as f64;
    let iodc = ((field(sf1, 3, 23, 2) << 8) | field(sf1, 8, 1, 8)) as f64;
    let l2p_flag = field(sf1, 4, 1, 1) as f64;
    let tgd = (field_signed(sf1, 7, 17, 8) as f64) * 2.0_f64.powi(-31);
    let toc = (field(sf1, 8, 9, 16) as f64) * 16.0;
    let af2 = (field_signed(sf1, 9, 1, 8) as f64) * 2.0_f64.powi(-55);
    let af1 = (field_signed(sf1, 9, 9, 16) as f64) * 2.0_f64.powi(-43);
    let af0 = (twos_complement(field(sf1, 10, 1, 22), 22) as f64) * 2.0_f64.powi(-31);

    // subframe 2: in-plane ephemeris terms
    let iode = field(sf2, 3, 1, 8) as f64;
    let crs = (field_signed(sf2, 3, 9, 16) as f64) * 2.0_f64.powi(-5);
    let delta_n = (field_signed(sf2, 4, 1, 16) as f64) * 2.0_f64.powi(-43) * PI;
    let m0 = (split_field_signed(sf2, 4, 17, 5) as f64) * 2.0_f64.powi(-31) * PI;
    let cuc = (field_signed(sf2, 6, 1, 16) as f64) * 2.0_f64.powi(-29);
    let ecc = (split_field(sf2, 6, 17, 7) as f64) * 2.0_f64.powi(-33);
    let cus = (field_signed(sf2, 8, 1, 16) as f64) * 2.0_f64.powi(-29);
    let sqrt_a = (split_field(sf2, 8, 17, 9) as f64) * 2.0_f64.powi(-19);
    let toe = (field(sf2, 10, 1, 16) as f64) * 16.0;
    let fit_flag = field(sf2, 10, 17, 1) as f64;

    // subframe 3: orientation terms
    let cic = (field_signed(sf3, 3, 1, 16) as f64) * 2.0_f64.powi(-29);
    let omega0 = (split_field_signed(sf3, 3, 17, 4) as f64) * 2.0_f64.powi(-31) * PI;
    let cis = (field_signed(sf3, 5, 1, 16) as f64) * 2.0_f64.powi(-29);
    let i0 = (split_field_signed(sf3, 5, 17, 6) as f64) * 2.0_f64.powi(-31) * PI;
    let crc = (field_signed(sf3, 7, 1, 16) as f64) * 2.0_f64.powi(-5);
    let omega = (split_field_signed(sf3, 7, 17, 8) as f64) * 2.0_f64.powi(-31) * PI;
    let omega_dot = (field_signed(sf3, 9, 1, 24) as f64) * 2.0_f64.powi(-43) * PI;
    let idot = (field_signed(sf3, 10, 9, 14) as f64) * 2.0_f64.powi(-43) * PI;

    // HOW of subframe 1: time of transmission of the following subframe
    let transmission_time = (field(sf1, 2, 1, 17) as f64) * 6.0;

    let week = resolve_week(wn10, ref_week);
    let epoch = week_tow_to_epoch(week, toc, TimeScale::GPST);

    let mut broadcast_orbit = [[0.0; 4]; BROADCAST_ORBIT_ROWS];
    broadcast_orbit[0] = [af0, af1, af2, 0.0];
    broadcast_orbit[1] = [iode, crs, delta_n, m0];
    broadcast_orbit[2] = [cuc, ecc, cus, sqrt_a];
    broadcast_orbit[3] = [toe, cic, omega0, cis];
    broadcast_orbit[4] = [i0, crc, omega, omega_dot];
    broadcast_orbit[5] = [idot, codes_l2, week as f64, l2p_flag];
    broadcast_orbit[6] = [
        URA_METERS
            .get(ura_index)
            .copied()
            .unwrap_or(URA_METERS[14]),
        health,
        tgd,
        iodc,
    ];
    broadcast_orbit[7] = [transmission_time, fit_flag, 0.0, 0.0];

    SatNavData {
        time_tag: epoch.to_gpst_seconds(),
        system: Constellation::GPS,
        prn,
        epoch,
        broadcast_orbit,
    }
}

fn decode_page18(words: &[u32; 10]) -> GpsOutput {
    let alpha = Correction {
        ctype: CorrectionType::GpsAlpha,
        coefficients: [
            (field_signed(words, 3, 9, 8) as f64) * 2.0_f64.powi(-30),
            (field_signed(words, 3, 17, 8) as f64) * 2.0_f64.powi(-27),
            (field_signed(words, 4, 1, 8) as f64) * 2.0_f64.powi(-24),
            (field_signed(words, 4, 9, 8) as f64) * 2.0_f64.powi(-24),
        ],
        ref_tow: 0.0,
        ref_week: 0,
    };
    let beta = Correction {
        ctype: CorrectionType::GpsBeta,
        coefficients: [
            (field_signed(words, 4, 17, 8) as f64) * 2.0_f64.powi(11),
            (field_signed(words, 5, 1, 8) as f64) * 2.0_f64.powi(14),
            (field_signed(words, 5, 9, 8) as f64) * 2.0_f64.powi(16),
            (field_signed(words, 5, 17, 8) as f64) * 2.0_f64.powi(16),
        ],
        ref_tow: 0.0,
        ref_week: 0,
    };
    let a1 = (field_signed(words, 6, 1, 24) as f64) * 2.0_f64.powi(-50);
    // A0: 24 MSBs in word 7, 8 LSBs in word 8
    let a0_raw = (field(words, 7, 1, 24) << 8) | field(words, 8, 1, 8);
    let a0 = (a0_raw as i32 as f64) * 2.0_f64.powi(-30);
    let tot = (field(words, 8, 9, 8) as f64) * 4096.0;
    let wnt = field(words, 8, 17, 8) as i32;
    let leap_seconds = field_signed(words, 9, 1, 8);

    GpsOutput::Corrections {
        alpha,
        beta,
        utc: Correction {
            ctype: CorrectionType::GpsUtc,
            coefficients: [a0, a1, 0.0, 0.0],
            ref_tow: tot,
            ref_week: wnt,
        },
        leap_seconds,
    }
}

/// Recovers the full week number from its 10 bit broadcast remainder,
/// picking the rollover period closest to the reference week
fn resolve_week(wn10: u32, ref_week: u32) -> u32 {
    let delta = (ref_week as i32 - wn10 as i32 + 512).div_euclid(1024);
    (wn10 as i32 + 1024 * delta) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    /* plants a data field in a parity carrying 30 bit word */
    fn plant(words: &mut [u32; 10], word: usize, msb: usize, width: usize, value: u32) {
        words[word - 1] |= (value & ((1 << width) - 1)) << (6 + 24 - msb - width + 1);
    }

    #[test]
    fn week_rollover_resolution() {
        // week 2190 broadcast as 2190 - 2048 = 142
        assert_eq!(resolve_week(142, 2190), 2190);
        assert_eq!(resolve_week(1023, 1024), 1023);
        assert_eq!(resolve_week(0, 2047), 2048);
        assert_eq!(resolve_week(990, 1025), 990);
    }

    #[test]
    fn data_field_extraction() {
        let mut words = [0_u32; 10];
        plant(&mut words, 3, 1, 10, 142);
        plant(&mut words, 3, 23, 2, 0b10);
        assert_eq!(field(&words, 3, 1, 10), 142);
        assert_eq!(field(&words, 3, 23, 2), 0b10);

        // fields flush against bit 24, like toc in word 8
        plant(&mut words, 8, 9, 16, 0xBEEF);
        plant(&mut words, 9, 1, 24, 0x123456);
        assert_eq!(field(&words, 8, 9, 16), 0xBEEF);
        assert_eq!(field(&words, 9, 1, 24), 0x123456);
    }

    #[test]
    fn ephemeris_assembly() {
        let mut assembler = GpsAssembler::default();
        let mut sf1 = [0_u32; 10];
        let mut sf2 = [0_u32; 10];
        let mut sf3 = [0_u32; 10];

        plant(&mut sf1, 3, 1, 10, 142); // week
        plant(&mut sf1, 8, 9, 16, 2025); // toc = 2025 * 16
        plant(&mut sf1, 10, 1, 22, 100); // af0
        plant(&mut sf2, 3, 1, 8, 44); // iode
        plant(&mut sf2, 10, 1, 16, 2025); // toe
        // sqrt(A) ~ 5153.6: raw = 5153.6 * 2^19
        plant(&mut sf2, 8, 17, 8, 0xA1);
        plant(&mut sf2, 9, 1, 24, 0x0CCCCD);
        plant(&mut sf3, 9, 1, 24, 0xFFFFFF); // omega dot = -1 lsb

        assert!(assembler.feed(12, 1, &sf1, 2190).is_none());
        assert!(assembler.feed(12, 2, &sf2, 2190).is_none());
        let out = assembler.feed(12, 3, &sf3, 2190).unwrap();
        let GpsOutput::Ephemeris(data) = out else {
            panic!("expecting an ephemeris");
        };

        assert_eq!(data.system, Constellation::GPS);
        assert_eq!(data.prn, 12);
        assert_eq!(data.orbit_lines(), 7);
        assert!((data.broadcast_orbit[0][0] - 100.0 * 2.0_f64.powi(-31)).abs() < 1.0E-18);
        assert!((data.broadcast_orbit[1][0] - 44.0).abs() < 1.0E-12, "iode");
        assert!((data.broadcast_orbit[3][0] - 32400.0).abs() < 1.0E-9, "toe");
        assert!(
            (data.broadcast_orbit[2][3] - 5153.6).abs() < 1.0E-3,
            "sqrt(A) {}",
            data.broadcast_orbit[2][3]
        );
        assert!(data.broadcast_orbit[4][3] < 0.0, "omega dot sign");
        assert!((data.broadcast_orbit[5][2] - 2190.0).abs() < 1.0E-12, "week");

        // a second identical frame starts empty again
        assert!(assembler.feed(12, 1, &sf1, 2190).is_none());
    }

    #[test]
    fn page18_corrections() {
        let mut assembler = GpsAssembler::default();
        let mut sf4 = [0_u32; 10];
        plant(&mut sf4, 3, 3, 6, 56); // page 18 SV id
        plant(&mut sf4, 3, 9, 8, 0x12); // alpha0
        plant(&mut sf4, 9, 1, 8, 18); // leap seconds

        let out = assembler.feed(12, 4, &sf4, 2190).unwrap();
        let GpsOutput::Corrections {
            alpha,
            leap_seconds,
            ..
        } = out
        else {
            panic!("expecting corrections");
        };
        assert_eq!(alpha.ctype, CorrectionType::GpsAlpha);
        assert!((alpha.coefficients[0] - 18.0 * 2.0_f64.powi(-30)).abs() < 1.0E-15);
        assert_eq!(leap_seconds, 18);

        // any other page is ignored
        let mut other = [0_u32; 10];
        plant(&mut other, 3, 3, 6, 55);
        assert!(assembler.feed(12, 4, &other, 2190).is_none());
    }
}
