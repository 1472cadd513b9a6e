//! Raw GRD message decoding engine.
//!
//! [GrdDecoder] turns a [MessageStream] into model calls over three
//! passes: header discovery, per epoch observables, navigation frames.
//! The decoder carries all cross epoch state (GLONASS almanac table,
//! partially assembled navigation frames, first/last observation
//! candidates), so one instance must survive a whole conversion even
//! when that conversion merges several input files.
pub mod bits;
pub mod galileo;
pub mod glonass;
pub mod gps;
pub mod tracking;

use log::{info, warn};

use crate::{
    constants::{
        carrier_frequency_mhz, glonass_g1_mhz, glonass_g2_mhz, signal_is_known, GLO_FCN_MAX,
        GLO_FCN_MIN, NANOS_PER_WEEK, SPEED_OF_LIGHT_M_NS, SPEED_OF_LIGHT_M_S,
    },
    decoder::{
        bits::NavBits,
        galileo::{GalileoAssembler, GalileoOutput},
        glonass::{GlonassAlmanac, GlonassAssembler},
        gps::{GpsAssembler, GpsOutput},
        tracking::{
            lli_flags, phase_invalid, pseudorange_ambiguous, rx_time_window_nanos,
            unambiguous_measurement, AdrState, TrackingState,
        },
    },
    epoch::{epoch_decompose, week_tow_to_epoch},
    header::{HeaderField, HeaderLabel},
    observation::{EpochFlag, Ssi},
    prelude::{Constellation, Epoch, TimeScale},
    stream::{MessageStream, MessageType, RawMessage},
    version::{VERSION_2, VERSION_3},
    Rinex,
};

/// WGS84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Default GLONASS code / phase bias pairs published when the source
/// platform does not expose the receiver calibration
const GLO_DEFAULT_BIASES: [&str; 4] = ["C1C", "C1P", "C2C", "C2P"];

/// Stateful raw message decoding engine
#[derive(Debug, Default)]
pub struct GrdDecoder {
    almanac: GlonassAlmanac,
    gps: GpsAssembler,
    glonass: GlonassAssembler,
    galileo: GalileoAssembler,
    /// Most recent observation epoch, anchors navigation time fields
    ref_time: Option<(u32, f64)>,
    first_obs: Option<Epoch>,
    last_obs: Option<Epoch>,
    program: Option<String>,
    device_type: Option<String>,
    device_version: Option<String>,
    receiver_number: Option<String>,
    observer: Option<String>,
    agency: Option<String>,
    date: Option<String>,
    fit_interval: Option<f64>,
    sat_selection: Vec<String>,
    obs_selection: Vec<String>,
    finalized: bool,
}

impl GrdDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Almanac table built so far, exposed for satellite resolution
    /// diagnostics
    pub fn almanac(&self) -> &GlonassAlmanac {
        &self.almanac
    }

    /// Single forward pass collecting header facts: scalar fields from
    /// the first file only, signal discovery and first/last observation
    /// candidates from every file. When `file_index` reaches
    /// `last_file_index` the header is finalized exactly once.
    pub fn collect_header_data(
        &mut self,
        stream: &mut MessageStream,
        rinex: &mut Rinex,
        file_index: usize,
        last_file_index: usize,
    ) {
        stream.rewind();
        let first_file = file_index == 0;

        while let Some(msg) = stream.next_message() {
            match msg.msg_type {
                MessageType::Epoch => {
                    if let (Some(week), Some(tow)) = (msg.u32_field(0), msg.f64_field(1)) {
                        let epoch = week_tow_to_epoch(week, tow, TimeScale::GPST);
                        if self.first_obs.map(|e| epoch < e).unwrap_or(true) {
                            self.first_obs = Some(epoch);
                        }
                        if self.last_obs.map(|e| epoch > e).unwrap_or(true) {
                            self.last_obs = Some(epoch);
                        }
                    } else {
                        warn!("malformed epoch message, skipped");
                    }
                },
                MessageType::SatObs => self.discover_signal(msg, rinex),
                MessageType::SatNavGpsL1Ca
                | MessageType::SatNavGpsL2Cnav
                | MessageType::SatNavGpsL5Cnav
                | MessageType::SatNavGpsCnav2 => {
                    rinex.register_system(Constellation::GPS);
                },
                MessageType::SatNavGlonassL1Ca => {
                    rinex.register_system(Constellation::Glonass);
                    // almanac strings feed the slot table even during
                    // the header pass
                    if let Some((string, bits)) = glonass_string(msg) {
                        self.almanac.feed_string(string, &bits);
                    }
                },
                MessageType::SatNavGalileoInav | MessageType::SatNavGalileoFnav => {
                    rinex.register_system(Constellation::Galileo);
                },
                MessageType::SatNavBeidouD1 | MessageType::SatNavBeidouD2 => {
                    rinex.register_system(Constellation::BeiDou);
                },
                MessageType::SatNavSbas => {
                    rinex.register_system(Constellation::SBAS);
                },
                MessageType::GrdVersion => {
                    if let Some(version) = msg.str_field(0) {
                        info!("raw data format {}", version);
                    }
                },
                MessageType::Program => {
                    if first_file {
                        self.program = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::DeviceType => {
                    if first_file {
                        self.device_type = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::DeviceVersion => {
                    if first_file {
                        self.device_version = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::ReceiverNumber => {
                    if first_file {
                        self.receiver_number = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::SiteLla => {
                    if first_file {
                        if let (Some(lat), Some(lon), Some(alt)) =
                            (msg.f64_field(0), msg.f64_field(1), msg.f64_field(2))
                        {
                            let (x, y, z) = lla_to_ecef(lat, lon, alt);
                            self.set_field(
                                rinex,
                                HeaderField::Vector3(HeaderLabel::ApproxPosition, x, y, z),
                            );
                        }
                    }
                },
                MessageType::Date => {
                    if first_file {
                        self.date = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::IntervalMs => {
                    if first_file {
                        if let Some(ms) = msg.f64_field(0) {
                            self.set_field(
                                rinex,
                                HeaderField::Real(HeaderLabel::Interval, ms / 1000.0),
                            );
                        }
                    }
                },
                MessageType::SignalUnit => {
                    if first_file {
                        if let Some(unit) = msg.str_field(0) {
                            self.set_field(
                                rinex,
                                HeaderField::Text(HeaderLabel::SignalUnit, unit.to_string()),
                            );
                        }
                    }
                },
                MessageType::RinexVersion => {
                    if first_file {
                        let version = match msg.str_field(0) {
                            Some(s) if s.contains('2') => VERSION_2,
                            _ => VERSION_3,
                        };
                        if let Err(e) = rinex.set_version(version) {
                            warn!("requested revision rejected: {}", e);
                        }
                    }
                },
                MessageType::MarkerName => {
                    if first_file {
                        if let Some(name) = msg.str_field(0) {
                            self.set_field(
                                rinex,
                                HeaderField::Text(HeaderLabel::MarkerName, name.to_string()),
                            );
                        }
                    }
                },
                MessageType::MarkerType => {
                    if first_file {
                        if let Some(mtype) = msg.str_field(0) {
                            self.set_field(
                                rinex,
                                HeaderField::Text(HeaderLabel::MarkerType, mtype.to_string()),
                            );
                        }
                    }
                },
                MessageType::Observer => {
                    if first_file {
                        self.observer = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::Agency => {
                    if first_file {
                        self.agency = msg.str_field(0).map(str::to_string);
                    }
                },
                MessageType::Comment => {
                    if first_file {
                        if let Some(text) = msg.str_field(0) {
                            rinex.add_comment(text, HeaderLabel::MarkerName);
                        }
                    }
                },
                MessageType::ClockOffsetFlag => {
                    if first_file {
                        if let Some(flag) = msg.i64_field(0) {
                            self.set_field(
                                rinex,
                                HeaderField::Integer(
                                    HeaderLabel::ClockOffsetApplied,
                                    flag as i32,
                                ),
                            );
                        }
                    }
                },
                MessageType::FitInterval => {
                    if first_file {
                        self.fit_interval = msg.f64_field(0);
                    }
                },
                MessageType::LogLevel => {
                    if let Some(level) = msg.str_field(0) {
                        info!("capture log level was {}", level);
                    }
                },
                MessageType::ConstellationList | MessageType::SatelliteList => {
                    if first_file {
                        self.sat_selection
                            .extend(msg.fields.iter().map(|f| f.trim().to_string()));
                    }
                },
                MessageType::ObservableList => {
                    if first_file {
                        self.obs_selection
                            .extend(msg.fields.iter().map(|f| f.trim().to_string()));
                    }
                },
                _ => {},
            }
        }

        if file_index == last_file_index && !self.finalized {
            self.finalize_header(rinex);
            self.finalized = true;
        }
    }

    /// Registers the (system, signal) pair of an observation message
    /// once its tracking state guarantees at least one unambiguous
    /// measurement
    fn discover_signal(&mut self, msg: &RawMessage, rinex: &mut Rinex) {
        let Some(constellation) = parse_system(msg) else {
            return;
        };
        let Some(signal) = msg.str_field(2).map(str::to_string) else {
            return;
        };
        if !signal_is_known(constellation, &signal) {
            return;
        }
        let state = TrackingState::from_bits_truncate(msg.word_field(3).unwrap_or(0));
        let adr = AdrState::from_bits_truncate(msg.word_field(6).unwrap_or(0));
        if !unambiguous_measurement(constellation, &signal, state, adr) {
            return;
        }
        for kind in ["C", "L", "D", "S"] {
            rinex.register_observable(constellation, &format!("{}{}", kind, signal));
        }
    }

    /// Publishes the accumulated single shot header records.
    /// Runs exactly once, after the last input file.
    fn finalize_header(&mut self, rinex: &mut Rinex) {
        let date = self.date.clone().unwrap_or_else(|| {
            let (y, m, d, hh, mm, ss, _) = epoch_decompose(crate::epoch::now());
            format!("{:04}{:02}{:02} {:02}{:02}{:02} UTC", y, m, d, hh, mm, ss)
        });
        self.set_field(
            rinex,
            HeaderField::TextTriple(
                HeaderLabel::RunBy,
                self.program.clone().unwrap_or_default(),
                self.agency.clone().unwrap_or_default(),
                date,
            ),
        );
        self.set_field(
            rinex,
            HeaderField::TextTriple(
                HeaderLabel::Receiver,
                self.receiver_number.clone().unwrap_or_default(),
                self.device_type.clone().unwrap_or_default(),
                self.device_version.clone().unwrap_or_default(),
            ),
        );
        self.set_field(
            rinex,
            HeaderField::TextPair(
                HeaderLabel::Agency,
                self.observer.clone().unwrap_or_default(),
                self.agency.clone().unwrap_or_default(),
            ),
        );
        if let Some(first) = self.first_obs {
            self.set_field(rinex, HeaderField::TimeTag(HeaderLabel::FirstObs, first));
        }
        if let Some(last) = self.last_obs {
            self.set_field(rinex, HeaderField::TimeTag(HeaderLabel::LastObs, last));
        }

        // one phase shift record per discovered system; the platform
        // exposes no calibration so the correction stays blank
        let shifts: Vec<(Constellation, String)> = rinex
            .systems()
            .iter()
            .filter_map(|s| {
                s.obs_types
                    .iter()
                    .find(|o| o.code.starts_with('L'))
                    .map(|o| (s.constellation, o.code.clone()))
            })
            .collect();
        for (constellation, code) in shifts {
            self.set_field(
                rinex,
                HeaderField::PhaseShift(HeaderLabel::PhaseShift, constellation, code, None),
            );
        }

        if rinex.system_index(Constellation::Glonass).is_some() {
            let biases = GLO_DEFAULT_BIASES
                .iter()
                .map(|code| (code.to_string(), 0.0))
                .collect();
            self.set_field(
                rinex,
                HeaderField::GloPhaseBias(HeaderLabel::GlonassCpBias, biases),
            );
            let slots = self.almanac.slot_channels();
            if !slots.is_empty() {
                self.set_field(
                    rinex,
                    HeaderField::GloSlots(HeaderLabel::GlonassSlots, slots),
                );
            }
        }

        if !self.sat_selection.is_empty() || !self.obs_selection.is_empty() {
            let sats: Vec<&str> = self.sat_selection.iter().map(String::as_str).collect();
            let codes: Vec<&str> = self.obs_selection.iter().map(String::as_str).collect();
            if !rinex.set_filter(&sats, &codes) {
                warn!("parts of the requested selection were not applicable");
            }
        }
    }

    fn set_field(&self, rinex: &mut Rinex, field: HeaderField) {
        if let Err(e) = rinex.set_field(field) {
            warn!("header field rejected: {}", e);
        }
    }

    /// Consumes exactly one observation epoch: one epoch message
    /// followed by its announced count of satellite observations.
    /// Returns false at end of stream. Count mismatches are logged and
    /// never abort the pass.
    pub fn collect_epoch_obs_data(
        &mut self,
        stream: &mut MessageStream,
        rinex: &mut Rinex,
    ) -> bool {
        let (week, tow, time_tag, clock_offset, flag, declared) = loop {
            let Some(msg) = stream.next_message() else {
                return false;
            };
            match msg.msg_type {
                MessageType::Epoch => {
                    let fields = (
                        msg.u32_field(0),
                        msg.f64_field(1),
                        msg.f64_field(2),
                        msg.f64_field(3),
                        msg.u32_field(4),
                        msg.u32_field(5),
                    );
                    if let (Some(week), Some(tow), Some(tag), Some(offset), Some(flag), Some(n)) =
                        fields
                    {
                        let flag = EpochFlag::try_from(flag as u8).unwrap_or_default();
                        break (week, tow, tag, offset, flag, n);
                    }
                    warn!("malformed epoch message, skipped");
                },
                MessageType::SatObs => {
                    warn!("observation outside any epoch, skipped");
                },
                _ => {},
            }
        };

        self.ref_time = Some((week, tow));
        rinex.set_epoch_time(week, tow, clock_offset, flag, time_tag);

        let mut remaining = declared;
        while remaining > 0 {
            let Some(next) = stream.peek_message() else {
                warn!("end of stream, {} announced observations missing", remaining);
                break;
            };
            if next.msg_type != MessageType::SatObs {
                warn!("epoch announced {} more observations than present", remaining);
                break;
            }
            let msg = stream.next_message().unwrap();
            process_sat_obs(&self.almanac, msg, rinex, tow, time_tag);
            remaining -= 1;
        }
        // observations past the announced count terminate the epoch
        while stream
            .peek_message()
            .map(|m| m.msg_type == MessageType::SatObs)
            .unwrap_or(false)
        {
            stream.next_message();
            warn!("observation beyond the announced count, skipped");
        }
        true
    }

    /// Single pass over the whole stream assembling navigation frames
    /// and buffering every completed data set into the model
    pub fn collect_nav_data(&mut self, stream: &mut MessageStream, rinex: &mut Rinex) {
        stream.rewind();
        while let Some(msg) = stream.next_message() {
            match msg.msg_type {
                MessageType::Epoch => {
                    if let (Some(week), Some(tow)) = (msg.u32_field(0), msg.f64_field(1)) {
                        self.ref_time = Some((week, tow));
                    }
                },
                MessageType::SatNavGpsL1Ca => self.process_gps_nav(msg, rinex),
                MessageType::SatNavGlonassL1Ca => self.process_glonass_nav(msg, rinex),
                MessageType::SatNavGalileoInav => self.process_galileo_nav(msg, rinex),
                MessageType::SatNavGalileoFnav
                | MessageType::SatNavBeidouD1
                | MessageType::SatNavBeidouD2
                | MessageType::SatNavGpsL2Cnav
                | MessageType::SatNavGpsL5Cnav
                | MessageType::SatNavGpsCnav2
                | MessageType::SatNavSbas => {
                    info!("{:?} decoding not implemented, skipped", msg.msg_type);
                },
                _ => {},
            }
        }
    }

    fn process_gps_nav(&mut self, msg: &RawMessage, rinex: &mut Rinex) {
        let (Some(prn), Some(subframe)) = (msg.u32_field(0), msg.u32_field(1)) else {
            warn!("malformed GPS navigation message, skipped");
            return;
        };
        let mut words = [0_u32; 10];
        for (i, word) in words.iter_mut().enumerate() {
            let Some(w) = msg.word_field(2 + i) else {
                warn!("GPS subframe {} for satellite {} truncated", subframe, prn);
                return;
            };
            *word = w;
        }
        // ephemeris subframes carry a 10 bit week that can only be
        // resolved against an observation epoch
        let ref_week = match self.ref_time {
            Some((week, _)) => week,
            None if (1..=3).contains(&subframe) => {
                warn!("no epoch reference yet, GPS subframe {} dropped", subframe);
                return;
            },
            None => 0,
        };
        match self.gps.feed(prn as u8, subframe as u8, &words, ref_week) {
            Some(GpsOutput::Ephemeris(mut data)) => {
                if let Some(fit) = self.fit_interval {
                    data.broadcast_orbit[7][1] = fit;
                }
                if !rinex.save_nav_data(data) {
                    info!("duplicate GPS ephemeris for satellite {}, rejected", prn);
                }
            },
            Some(GpsOutput::Corrections {
                alpha,
                beta,
                utc,
                leap_seconds,
            }) => {
                for corr in [alpha, beta, utc] {
                    let label = corr.ctype.v3_label();
                    self.set_field(rinex, HeaderField::Correction(label, corr));
                }
                self.set_field(
                    rinex,
                    HeaderField::Integer(HeaderLabel::LeapSeconds, leap_seconds),
                );
            },
            None => {},
        }
    }

    fn process_glonass_nav(&mut self, msg: &RawMessage, rinex: &mut Rinex) {
        let Some((string, bits)) = glonass_string(msg) else {
            warn!("malformed GLONASS navigation message, skipped");
            return;
        };
        self.almanac.feed_string(string, &bits);
        if !(1..=4).contains(&string) {
            return;
        }
        let Some(raw) = msg.u32_field(0) else {
            return;
        };
        let slot = if (GLO_FCN_MIN..=GLO_FCN_MAX).contains(&(raw as u16)) {
            match self.almanac.resolve_satellite(raw as u16) {
                Some(slot) => slot,
                None => {
                    warn!(
                        "GLONASS satellite {} not yet resolvable to an orbital slot",
                        raw
                    );
                    return;
                },
            }
        } else {
            raw as u8
        };
        let Some((week, tow)) = self.ref_time else {
            warn!("no epoch reference yet, GLONASS string dropped");
            return;
        };
        let channel = self.almanac.channel_of(slot);
        if let Some(data) = self
            .glonass
            .feed(slot, string, bits, week, tow, channel)
        {
            if !rinex.save_nav_data(data) {
                info!("duplicate GLONASS ephemeris for slot {}, rejected", slot);
            }
        }
    }

    fn process_galileo_nav(&mut self, msg: &RawMessage, rinex: &mut Rinex) {
        let (Some(prn), Some(word_type)) = (msg.u32_field(0), msg.u32_field(1)) else {
            warn!("malformed Galileo navigation message, skipped");
            return;
        };
        let mut words = [0_u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let Some(w) = msg.word_field(2 + i) else {
                warn!("Galileo word {} for satellite {} truncated", word_type, prn);
                return;
            };
            *word = w;
        }
        for output in self
            .galileo
            .feed(prn as u8, word_type as u8, NavBits::new(&words))
        {
            match output {
                GalileoOutput::Ephemeris(data) => {
                    if !rinex.save_nav_data(data) {
                        info!("duplicate Galileo ephemeris for satellite {}, rejected", prn);
                    }
                },
                GalileoOutput::IonoCorrection(corr) => {
                    let label = corr.ctype.v3_label();
                    self.set_field(rinex, HeaderField::Correction(label, corr));
                },
                GalileoOutput::UtcCorrection { utc, leap_seconds } => {
                    let label = utc.ctype.v3_label();
                    self.set_field(rinex, HeaderField::Correction(label, utc));
                    self.set_field(
                        rinex,
                        HeaderField::Integer(HeaderLabel::LeapSeconds, leap_seconds),
                    );
                },
            }
        }
    }
}

/// Processes one satellite observation into up to four observables
fn process_sat_obs(
    almanac: &GlonassAlmanac,
    msg: &RawMessage,
    rinex: &mut Rinex,
    tow: f64,
    time_tag: f64,
) {
    let Some(constellation) = parse_system(msg) else {
        warn!("observation with unknown system identifier, skipped");
        return;
    };
    let Some(raw_sat) = msg.u32_field(1) else {
        warn!("observation without satellite number, skipped");
        return;
    };
    let Some(signal) = msg.str_field(2).map(str::to_string) else {
        return;
    };
    if !signal_is_known(constellation, &signal) {
        warn!(
            "unknown measurement {:x}/{} for satellite {}, dropped",
            constellation, signal, raw_sat
        );
        return;
    }

    let state = TrackingState::from_bits_truncate(msg.word_field(3).unwrap_or(0));
    let t_tx = msg.f64_field(4).unwrap_or(0.0);
    let time_offset = msg.f64_field(5).unwrap_or(0.0);
    let adr = AdrState::from_bits_truncate(msg.word_field(6).unwrap_or(0));
    let adr_m = msg.f64_field(7).unwrap_or(0.0);
    let carrier_mhz = msg.f64_field(8).unwrap_or(0.0);
    let cn0 = msg.f64_field(9).unwrap_or(0.0);
    let range_rate = msg.f64_field(10).unwrap_or(0.0);

    // GLONASS vehicles reported by frequency channel must resolve to
    // an orbital slot before they can appear in a RINEX body
    let mut channel = None;
    let prn = if constellation == Constellation::Glonass {
        if (GLO_FCN_MIN..=GLO_FCN_MAX).contains(&(raw_sat as u16)) {
            match almanac.resolve_satellite(raw_sat as u16) {
                Some(slot) => {
                    channel = almanac.channel_of(slot);
                    slot
                },
                None => {
                    warn!(
                        "GLONASS satellite {} not resolvable to an orbital slot, dropped",
                        raw_sat
                    );
                    return;
                },
            }
        } else {
            channel = almanac.channel_of(raw_sat as u8);
            raw_sat as u8
        }
    } else {
        raw_sat as u8
    };

    let ambiguous = pseudorange_ambiguous(constellation, &signal, state);
    let invalid_phase = phase_invalid(adr);
    if ambiguous && invalid_phase {
        warn!(
            "neither pseudorange nor phase usable for {:x}{:02}, dropped",
            constellation, prn
        );
        return;
    }

    let band = signal.chars().next().unwrap_or('1');
    let freq_mhz = if carrier_mhz > 1.0 {
        carrier_mhz
    } else {
        match (constellation, channel, band) {
            (Constellation::Glonass, Some(fcn), '1') => glonass_g1_mhz(fcn),
            (Constellation::Glonass, Some(fcn), '2') => glonass_g2_mhz(fcn),
            _ => carrier_frequency_mhz(constellation, band).unwrap_or(1575.42),
        }
    };

    let window = rx_time_window_nanos(constellation, &signal, state).unwrap_or(NANOS_PER_WEEK);
    let t_rx = (tow * 1.0E9 - time_offset).rem_euclid(window as f64);
    let range = if ambiguous {
        0.0
    } else {
        pseudorange_m(t_rx, t_tx)
    };

    let cycles_per_m = freq_mhz * 1.0E6 / SPEED_OF_LIGHT_M_S;
    let phase = if invalid_phase {
        0.0
    } else {
        adr_m * cycles_per_m
    };
    let doppler = -range_rate * cycles_per_m;
    let ssi = Some(Ssi::from_cn0_dbhz(cn0));
    let lli = lli_flags(adr);

    rinex.save_obs_data(
        constellation,
        prn,
        &format!("C{}", signal),
        range,
        None,
        ssi,
        time_tag,
    );
    rinex.save_obs_data(
        constellation,
        prn,
        &format!("L{}", signal),
        phase,
        lli,
        ssi,
        time_tag,
    );
    rinex.save_obs_data(
        constellation,
        prn,
        &format!("D{}", signal),
        doppler,
        None,
        ssi,
        time_tag,
    );
    rinex.save_obs_data(
        constellation,
        prn,
        &format!("S{}", signal),
        cn0,
        None,
        ssi,
        time_tag,
    );
}

/// Clock difference to meters; an unphysical negative range collapses
/// to zero rather than propagating
pub fn pseudorange_m(t_rx_ns: f64, t_tx_ns: f64) -> f64 {
    let range = (t_rx_ns - t_tx_ns) * SPEED_OF_LIGHT_M_NS;
    if range < 0.0 {
        0.0
    } else {
        range
    }
}

fn parse_system(msg: &RawMessage) -> Option<Constellation> {
    msg.str_field(0)?.parse::<Constellation>().ok()
}

/// GLONASS navigation payload: string number plus the 85 bit string
/// packed into three words
fn glonass_string(msg: &RawMessage) -> Option<(u8, NavBits)> {
    let string = msg.u32_field(1)? as u8;
    let words = [
        msg.word_field(2)?,
        msg.word_field(3)?,
        msg.word_field(4)?,
    ];
    Some((string, NavBits::new(&words)))
}

/// Geodetic coordinates (degrees, meters) to ECEF XYZ meters
fn lla_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> (f64, f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let n = WGS84_A / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    let x = (n + alt_m) * lat.cos() * lon.cos();
    let y = (n + alt_m) * lat.cos() * lon.sin();
    let z = (n * (1.0 - e2) + alt_m) * lat.sin();
    (x, y, z)
}
