//! Tracking state classification.
//!
//! The receiver reports one synchronization bitmask and one accumulated
//! delta range bitmask per measurement. Together they decide whether a
//! pseudorange is unambiguous, whether the carrier phase is usable, and
//! which loss of lock indicator bits the phase observable carries.
use bitflags::bitflags;

use crate::{
    constants::{
        NANOS_PER_BIT, NANOS_PER_DAY, NANOS_PER_E1B_PAGE, NANOS_PER_E1C_2ND_CODE,
        NANOS_PER_SUBFRAME, NANOS_PER_WEEK,
    },
    observation::LliFlags,
    prelude::Constellation,
};

bitflags! {
    /// Measurement synchronization state word
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct TrackingState: u32 {
        const CODE_LOCK = 0x0001;
        const BIT_SYNC = 0x0002;
        const SUBFRAME_SYNC = 0x0004;
        const TOW_DECODED = 0x0008;
        const MSEC_AMBIGUOUS = 0x0010;
        const SYMBOL_SYNC = 0x0020;
        const GLO_STRING_SYNC = 0x0040;
        const GLO_TOD_DECODED = 0x0080;
        const BDS_D2_BIT_SYNC = 0x0100;
        const BDS_D2_SUBFRAME_SYNC = 0x0200;
        const GAL_E1BC_CODE_LOCK = 0x0400;
        const GAL_E1C_2ND_CODE_LOCK = 0x0800;
        const GAL_E1B_PAGE_SYNC = 0x1000;
        const SBAS_SYNC = 0x2000;
        const TOW_KNOWN = 0x4000;
        const GLO_TOD_KNOWN = 0x8000;
    }
}

bitflags! {
    /// Accumulated delta range (carrier phase) state word
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct AdrState: u32 {
        const VALID = 0x01;
        const RESET = 0x02;
        const CYCLE_SLIP = 0x04;
        const HALF_CYCLE_RESOLVED = 0x08;
        const HALF_CYCLE_REPORTED = 0x10;
    }
}

impl TrackingState {
    fn tow_known(self) -> bool {
        self.intersects(Self::TOW_DECODED | Self::TOW_KNOWN)
    }

    fn tod_known(self) -> bool {
        self.intersects(Self::GLO_TOD_DECODED | Self::GLO_TOD_KNOWN)
    }
}

/// True when the tracking state cannot guarantee an unambiguous
/// pseudorange for this (system, signal) pair: code lock plus a fully
/// known time of week (GLONASS: time of day) are required.
pub fn pseudorange_ambiguous(
    constellation: Constellation,
    signal: &str,
    state: TrackingState,
) -> bool {
    if state.contains(TrackingState::MSEC_AMBIGUOUS) {
        return true;
    }
    match (constellation, signal) {
        (Constellation::Glonass, _) => {
            !(state.contains(TrackingState::CODE_LOCK) && state.tod_known())
        },
        (Constellation::Galileo, "1B") => {
            !(state.contains(TrackingState::GAL_E1BC_CODE_LOCK) && state.tow_known())
        },
        (Constellation::Galileo, "1C") => {
            !(state.contains(TrackingState::GAL_E1C_2ND_CODE_LOCK) && state.tow_known())
        },
        (c, _) if c.is_sbas() => {
            !(state.contains(TrackingState::CODE_LOCK)
                && state.contains(TrackingState::SBAS_SYNC))
        },
        _ => !(state.contains(TrackingState::CODE_LOCK) && state.tow_known()),
    }
}

/// Width of the time window within which the receiver clock estimate
/// is meaningful, given the synchronization achieved. Full time
/// knowledge yields the week (GLONASS: day), partial synchronization
/// the corresponding sub period, no synchronization nothing at all.
pub fn rx_time_window_nanos(
    constellation: Constellation,
    signal: &str,
    state: TrackingState,
) -> Option<i64> {
    match (constellation, signal) {
        (Constellation::Glonass, _) => {
            if state.tod_known() {
                Some(NANOS_PER_DAY)
            } else if state.contains(TrackingState::GLO_STRING_SYNC) {
                Some(2 * crate::constants::NANOS_PER_SEC)
            } else {
                None
            }
        },
        (Constellation::Galileo, "1B") => {
            if state.tow_known() {
                Some(NANOS_PER_WEEK)
            } else if state.contains(TrackingState::GAL_E1B_PAGE_SYNC) {
                Some(NANOS_PER_E1B_PAGE)
            } else {
                None
            }
        },
        (Constellation::Galileo, "1C") => {
            if state.tow_known() {
                Some(NANOS_PER_WEEK)
            } else if state.contains(TrackingState::GAL_E1C_2ND_CODE_LOCK) {
                Some(NANOS_PER_E1C_2ND_CODE)
            } else {
                None
            }
        },
        _ => {
            if state.tow_known() {
                Some(NANOS_PER_WEEK)
            } else if state.contains(TrackingState::SUBFRAME_SYNC) {
                Some(NANOS_PER_SUBFRAME)
            } else if state.contains(TrackingState::BIT_SYNC) {
                Some(NANOS_PER_BIT)
            } else {
                None
            }
        },
    }
}

/// True when the accumulated delta range cannot be used as a carrier
/// phase observable: it must be valid, not freshly reset, and any
/// reported half cycle ambiguity must be resolved.
pub fn phase_invalid(adr: AdrState) -> bool {
    if !adr.contains(AdrState::VALID) {
        return true;
    }
    if adr.contains(AdrState::RESET) {
        return true;
    }
    adr.contains(AdrState::HALF_CYCLE_REPORTED) && !adr.contains(AdrState::HALF_CYCLE_RESOLVED)
}

/// Loss of lock indicator bits for the phase observable
pub fn lli_flags(adr: AdrState) -> Option<LliFlags> {
    let mut lli = LliFlags::empty();
    if adr.intersects(AdrState::RESET | AdrState::CYCLE_SLIP) {
        lli |= LliFlags::LOCK_LOSS;
    }
    if adr.contains(AdrState::HALF_CYCLE_REPORTED) && !adr.contains(AdrState::HALF_CYCLE_RESOLVED)
    {
        lli |= LliFlags::HALF_CYCLE_SLIP;
    }
    if lli.is_empty() {
        None
    } else {
        Some(lli)
    }
}

/// True when at least one unambiguous observable (pseudorange or
/// carrier phase) can be produced; gates signal discovery during the
/// header pass.
pub fn unambiguous_measurement(
    constellation: Constellation,
    signal: &str,
    state: TrackingState,
    adr: AdrState,
) -> bool {
    !pseudorange_ambiguous(constellation, signal, state) || !phase_invalid(adr)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gps_pseudorange_classification() {
        let locked = TrackingState::CODE_LOCK
            | TrackingState::BIT_SYNC
            | TrackingState::SUBFRAME_SYNC
            | TrackingState::TOW_DECODED;
        assert!(!pseudorange_ambiguous(Constellation::GPS, "1C", locked));
        assert_eq!(
            rx_time_window_nanos(Constellation::GPS, "1C", locked),
            Some(NANOS_PER_WEEK)
        );

        let partial = TrackingState::CODE_LOCK | TrackingState::BIT_SYNC;
        assert!(pseudorange_ambiguous(Constellation::GPS, "1C", partial));
        assert_eq!(
            rx_time_window_nanos(Constellation::GPS, "1C", partial),
            Some(NANOS_PER_BIT)
        );

        // millisecond ambiguity poisons everything
        let poisoned = locked | TrackingState::MSEC_AMBIGUOUS;
        assert!(pseudorange_ambiguous(Constellation::GPS, "1C", poisoned));
    }

    #[test]
    fn glonass_uses_time_of_day() {
        let state = TrackingState::CODE_LOCK | TrackingState::GLO_TOD_DECODED;
        assert!(!pseudorange_ambiguous(Constellation::Glonass, "1C", state));
        assert_eq!(
            rx_time_window_nanos(Constellation::Glonass, "1C", state),
            Some(NANOS_PER_DAY)
        );
        // plain TOW knowledge is not enough for GLONASS
        let state = TrackingState::CODE_LOCK | TrackingState::TOW_DECODED;
        assert!(pseudorange_ambiguous(Constellation::Glonass, "1C", state));
    }

    #[test]
    fn galileo_pilot_and_data_components() {
        let e1b = TrackingState::GAL_E1BC_CODE_LOCK | TrackingState::TOW_KNOWN;
        assert!(!pseudorange_ambiguous(Constellation::Galileo, "1B", e1b));
        // the pilot component needs its secondary code lock
        assert!(pseudorange_ambiguous(Constellation::Galileo, "1C", e1b));

        let e1c = TrackingState::GAL_E1C_2ND_CODE_LOCK;
        assert_eq!(
            rx_time_window_nanos(Constellation::Galileo, "1C", e1c),
            Some(NANOS_PER_E1C_2ND_CODE)
        );
    }

    #[test]
    fn phase_validity_and_lli() {
        assert!(!phase_invalid(AdrState::VALID));
        assert!(phase_invalid(AdrState::empty()));
        assert!(phase_invalid(AdrState::VALID | AdrState::RESET));
        assert!(phase_invalid(
            AdrState::VALID | AdrState::HALF_CYCLE_REPORTED
        ));
        assert!(!phase_invalid(
            AdrState::VALID | AdrState::HALF_CYCLE_REPORTED | AdrState::HALF_CYCLE_RESOLVED
        ));

        assert_eq!(lli_flags(AdrState::VALID), None);
        assert_eq!(
            lli_flags(AdrState::VALID | AdrState::CYCLE_SLIP),
            Some(LliFlags::LOCK_LOSS)
        );
        assert_eq!(
            lli_flags(AdrState::VALID | AdrState::HALF_CYCLE_REPORTED),
            Some(LliFlags::HALF_CYCLE_SLIP)
        );
    }
}
