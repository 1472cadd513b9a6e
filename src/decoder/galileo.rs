//! Galileo I/NAV word decoding.
//!
//! The receiver delivers the 128 bit content of each nominal word as
//! four 32 bit words. Words 1..5 sharing one IODnav assemble into one
//! broadcast data set; word 5 also carries the NeQuick coefficients
//! and word 6 the GST to UTC conversion parameters, both published
//! through the header corrections.
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::{
    decoder::bits::NavBits,
    epoch::week_tow_to_epoch,
    header::{Correction, CorrectionType},
    navigation::{SatNavData, BROADCAST_ORBIT_ROWS},
    prelude::{Constellation, TimeScale},
};

/// E1-B I/NAV data source flags for the RINEX data sources cell
const DATA_SOURCE_INAV_E1B: f64 = 513.0;

/// Outcome of one consumed word
#[derive(Debug)]
pub enum GalileoOutput {
    /// Words 1..5 completed for one satellite
    Ephemeris(SatNavData),
    /// Word 5: NeQuick ionosphere coefficients
    IonoCorrection(Correction),
    /// Word 6: GST to UTC parameters and the leap second count
    UtcCorrection {
        utc: Correction,
        leap_seconds: i32,
    },
}

#[derive(Debug, Default)]
struct GalFrame {
    iodnav: Option<u16>,
    /// Words 1..4, keyed by IODnav coherence
    words: [Option<NavBits>; 4],
    /// Latest word 5, not IODnav bound
    word5: Option<NavBits>,
}

/// Collects I/NAV words into complete broadcast data sets
#[derive(Debug, Default)]
pub struct GalileoAssembler {
    frames: HashMap<u8, GalFrame>,
}

impl GalileoAssembler {
    /// Consumes one I/NAV word for one satellite. Corrections surface
    /// immediately; an ephemeris surfaces once words 1..5 are present
    /// with a coherent IODnav.
    pub fn feed(&mut self, prn: u8, word_type: u8, bits: NavBits) -> Vec<GalileoOutput> {
        let mut outputs = Vec::new();
        match word_type {
            1..=4 => {
                let frame = self.frames.entry(prn).or_default();
                let iodnav = bits.msb_field(7, 10) as u16;
                if frame.iodnav != Some(iodnav) {
                    // issue change invalidates previously collected words
                    frame.iodnav = Some(iodnav);
                    frame.words = Default::default();
                }
                frame.words[word_type as usize - 1] = Some(bits);
            },
            5 => {
                outputs.push(GalileoOutput::IonoCorrection(decode_iono(&bits)));
                let frame = self.frames.entry(prn).or_default();
                frame.word5 = Some(bits);
            },
            6 => {
                outputs.push(decode_utc(&bits));
            },
            _ => {},
        }

        if let Some(frame) = self.frames.get(&prn) {
            if frame.words.iter().all(|w| w.is_some()) && frame.word5.is_some() {
                let frame = self.frames.remove(&prn).unwrap();
                outputs.push(GalileoOutput::Ephemeris(decode_ephemeris(prn, &frame)));
            }
        }
        outputs
    }
}

fn decode_ephemeris(prn: u8, frame: &GalFrame) -> SatNavData {
    let w1 = frame.words[0].as_ref().unwrap();
    let w2 = frame.words[1].as_ref().unwrap();
    let w3 = frame.words[2].as_ref().unwrap();
    let w4 = frame.words[3].as_ref().unwrap();
    let w5 = frame.word5.as_ref().unwrap();

    let iodnav = w1.msb_field(7, 10) as f64;

    // word 1: Keplerian set
    let toe = (w1.msb_field(17, 14) as f64) * 60.0;
    let m0 = (w1.msb_field_signed(31, 32) as f64) * 2.0_f64.powi(-31) * PI;
    let ecc = (w1.msb_field(63, 32) as f64) * 2.0_f64.powi(-33);
    let sqrt_a = (w1.msb_field(95, 32) as f64) * 2.0_f64.powi(-19);

    // word 2: orientation
    let omega0 = (w2.msb_field_signed(17, 32) as f64) * 2.0_f64.powi(-31) * PI;
    let i0 = (w2.msb_field_signed(49, 32) as f64) * 2.0_f64.powi(-31) * PI;
    let omega = (w2.msb_field_signed(81, 32) as f64) * 2.0_f64.powi(-31) * PI;
    let idot = (w2.msb_field_signed(113, 14) as f64) * 2.0_f64.powi(-43) * PI;

    // word 3: rates and harmonic terms
    let omega_dot = (w3.msb_field_signed(17, 24) as f64) * 2.0_f64.powi(-43) * PI;
    let delta_n = (w3.msb_field_signed(41, 16) as f64) * 2.0_f64.powi(-43) * PI;
    let cuc = (w3.msb_field_signed(57, 16) as f64) * 2.0_f64.powi(-29);
    let cus = (w3.msb_field_signed(73, 16) as f64) * 2.0_f64.powi(-29);
    let crc = (w3.msb_field_signed(89, 16) as f64) * 2.0_f64.powi(-5);
    let crs = (w3.msb_field_signed(105, 16) as f64) * 2.0_f64.powi(-5);
    let sisa = sisa_meters(w3.msb_field(121, 8));

    // word 4: harmonic terms and clock correction
    let cic = (w4.msb_field_signed(23, 16) as f64) * 2.0_f64.powi(-29);
    let cis = (w4.msb_field_signed(39, 16) as f64) * 2.0_f64.powi(-29);
    let toc = (w4.msb_field(55, 14) as f64) * 60.0;
    let af0 = (w4.msb_field_signed(69, 31) as f64) * 2.0_f64.powi(-34);
    let af1 = (w4.msb_field_signed(100, 21) as f64) * 2.0_f64.powi(-46);
    let af2 = (w4.msb_field_signed(121, 6) as f64) * 2.0_f64.powi(-59);

    // word 5: broadcast group delays, health and time reference
    let bgd_e5a = (w5.msb_field_signed(48, 10) as f64) * 2.0_f64.powi(-32);
    let bgd_e5b = (w5.msb_field_signed(58, 10) as f64) * 2.0_f64.powi(-32);
    let e5b_hs = w5.msb_field(68, 2);
    let e1b_hs = w5.msb_field(70, 2);
    let e5b_dvs = w5.msb_field(72, 1);
    let e1b_dvs = w5.msb_field(73, 1);
    let week = w5.msb_field(74, 12);
    let tow = w5.msb_field(86, 20) as f64;

    let health =
        (e1b_dvs | (e1b_hs << 1) | (e5b_dvs << 6) | (e5b_hs << 7)) as f64;
    let epoch = week_tow_to_epoch(week, toc, TimeScale::GST);

    let mut broadcast_orbit = [[0.0; 4]; BROADCAST_ORBIT_ROWS];
    broadcast_orbit[0] = [af0, af1, af2, 0.0];
    broadcast_orbit[1] = [iodnav, crs, delta_n, m0];
    broadcast_orbit[2] = [cuc, ecc, cus, sqrt_a];
    broadcast_orbit[3] = [toe, cic, omega0, cis];
    broadcast_orbit[4] = [i0, crc, omega, omega_dot];
    broadcast_orbit[5] = [idot, DATA_SOURCE_INAV_E1B, week as f64, 0.0];
    broadcast_orbit[6] = [sisa, health, bgd_e5a, bgd_e5b];
    broadcast_orbit[7] = [tow, 0.0, 0.0, 0.0];

    SatNavData {
        time_tag: epoch.to_gpst_seconds(),
        system: Constellation::Galileo,
        prn,
        epoch,
        broadcast_orbit,
    }
}

fn decode_iono(w5: &NavBits) -> Correction {
    Correction {
        ctype: CorrectionType::GalAi,
        coefficients: [
            (w5.msb_field(7, 11) as f64) * 2.0_f64.powi(-2),
            (w5.msb_field_signed(18, 11) as f64) * 2.0_f64.powi(-8),
            (w5.msb_field_signed(29, 14) as f64) * 2.0_f64.powi(-15),
            0.0,
        ],
        ref_tow: 0.0,
        ref_week: 0,
    }
}

fn decode_utc(w6: &NavBits) -> GalileoOutput {
    let a0 = (w6.msb_field_signed(7, 32) as f64) * 2.0_f64.powi(-30);
    let a1 = (w6.msb_field_signed(39, 24) as f64) * 2.0_f64.powi(-50);
    let leap_seconds = w6.msb_field_signed(63, 8);
    let t0t = (w6.msb_field(71, 8) as f64) * 3600.0;
    let wn0t = w6.msb_field(79, 8) as i32;

    GalileoOutput::UtcCorrection {
        utc: Correction {
            ctype: CorrectionType::GalileoUtc,
            coefficients: [a0, a1, 0.0, 0.0],
            ref_tow: t0t,
            ref_week: wn0t,
        },
        leap_seconds,
    }
}

/// Signal in space accuracy index to meters
fn sisa_meters(index: u32) -> f64 {
    match index {
        0..=49 => (index as f64) * 0.01,
        50..=74 => 0.5 + ((index - 50) as f64) * 0.02,
        75..=99 => 1.0 + ((index - 75) as f64) * 0.04,
        100..=125 => 2.0 + ((index - 100) as f64) * 0.16,
        // no accuracy prediction available
        _ => -1.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /* plants fields at 1-based from-MSB offsets over 4 words */
    fn planted(word_type: u8, fields: &[(usize, usize, u32)]) -> NavBits {
        let mut words = [0_u32; 4];
        let mut set = |start: usize, width: usize, value: u32| {
            for i in 0..width {
                let bit = (value >> (width - 1 - i)) & 1;
                let pos = start - 1 + i;
                words[pos / 32] |= bit << (31 - (pos % 32));
            }
        };
        set(1, 6, word_type as u32);
        for (start, width, value) in fields.iter().copied() {
            set(start, width, value);
        }
        NavBits::new(&words)
    }

    #[test]
    fn sisa_index_scale() {
        assert!((sisa_meters(0)).abs() < 1.0E-12);
        assert!((sisa_meters(49) - 0.49).abs() < 1.0E-12);
        assert!((sisa_meters(50) - 0.5).abs() < 1.0E-12);
        assert!((sisa_meters(107) - 3.12).abs() < 1.0E-12);
        assert!(sisa_meters(255) < 0.0);
    }

    #[test]
    fn iodnav_coherence() {
        let mut assembler = GalileoAssembler::default();
        let iod7 = &[(7, 10, 7_u32)];
        assert!(assembler.feed(11, 1, planted(1, iod7)).is_empty());
        assert!(assembler.feed(11, 2, planted(2, iod7)).is_empty());
        assert!(assembler.feed(11, 3, planted(3, iod7)).is_empty());
        // a new issue of data drops what was collected
        assert!(assembler
            .feed(11, 4, planted(4, &[(7, 10, 8)]))
            .is_empty());
        assert!(assembler.feed(11, 1, planted(1, iod7)).is_empty());
        assert!(assembler.feed(11, 4, planted(4, iod7)).is_empty());
        // word 5 emits its iono correction but no ephemeris: the issue
        // change dropped words 2 and 3
        let outputs = assembler.feed(11, 5, planted(5, &[(74, 12, 1200)]));
        assert_eq!(outputs.len(), 1);
        assert!(matches!(outputs[0], GalileoOutput::IonoCorrection(_)));
    }

    #[test]
    fn ephemeris_assembly() {
        let mut assembler = GalileoAssembler::default();
        let iod = 7_u32;
        // toe = 540 * 60, sqrt(A) = 5440.6 * 2^19 rounded
        let w1 = planted(
            1,
            &[(7, 10, iod), (17, 14, 540), (95, 32, 2_852_441_293)],
        );
        let w2 = planted(2, &[(7, 10, iod)]);
        let w3 = planted(3, &[(7, 10, iod), (121, 8, 107)]);
        // toc = 540 * 60, af0 = 1000 * 2^-34
        let w4 = planted(4, &[(7, 10, iod), (55, 14, 540), (69, 31, 1000)]);
        let w5 = planted(5, &[(7, 11, 40), (74, 12, 1200), (86, 20, 32_460)]);

        assert!(assembler.feed(11, 1, w1).is_empty());
        assert!(assembler.feed(11, 2, w2).is_empty());
        assert!(assembler.feed(11, 3, w3).is_empty());
        assert!(assembler.feed(11, 4, w4).is_empty());
        let outputs = assembler.feed(11, 5, w5);
        assert_eq!(outputs.len(), 2, "iono correction plus ephemeris");

        let GalileoOutput::IonoCorrection(iono) = &outputs[0] else {
            panic!("expecting the iono correction first");
        };
        assert_eq!(iono.ctype, CorrectionType::GalAi);
        assert!((iono.coefficients[0] - 10.0).abs() < 1.0E-12, "ai0");

        let GalileoOutput::Ephemeris(data) = &outputs[1] else {
            panic!("expecting the completed ephemeris");
        };
        assert_eq!(data.system, Constellation::Galileo);
        assert_eq!(data.prn, 11);
        assert!((data.broadcast_orbit[1][0] - 7.0).abs() < 1.0E-12, "iodnav");
        assert!((data.broadcast_orbit[3][0] - 32_400.0).abs() < 1.0E-9, "toe");
        assert!(
            (data.broadcast_orbit[2][3] - 5440.6).abs() < 1.0E-3,
            "sqrt(A) {}",
            data.broadcast_orbit[2][3]
        );
        assert!((data.broadcast_orbit[6][0] - 3.12).abs() < 1.0E-12, "sisa");
        assert!((data.broadcast_orbit[5][2] - 1200.0).abs() < 1.0E-12, "week");
        assert!((data.broadcast_orbit[0][0] - 1000.0 * 2.0_f64.powi(-34)).abs() < 1.0E-15);
    }

    #[test]
    fn utc_parameters() {
        let mut assembler = GalileoAssembler::default();
        // WN0t is a mod 256 week counter, 8 bits only
        let w6 = planted(6, &[(7, 32, 100), (63, 8, 18), (71, 8, 10), (79, 8, 150)]);
        let outputs = assembler.feed(11, 6, w6);
        assert_eq!(outputs.len(), 1);
        let GalileoOutput::UtcCorrection { utc, leap_seconds } = &outputs[0] else {
            panic!("expecting UTC parameters");
        };
        assert_eq!(utc.ctype, CorrectionType::GalileoUtc);
        assert!((utc.coefficients[0] - 100.0 * 2.0_f64.powi(-30)).abs() < 1.0E-15);
        assert!((utc.ref_tow - 36_000.0).abs() < 1.0E-9);
        assert_eq!(utc.ref_week, 150);
        assert_eq!(*leap_seconds, 18);
    }
}
