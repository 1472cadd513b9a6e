//! Loss of Lock Indication (LLI) for phase tracking
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LliFlags: u8 {
        /// Current epoch is marked Ok or Unknown status
        const OK_OR_UNKNOWN = 0x00;
        /// Lock lost between previous and current observation,
        /// cycle slip is possible
        const LOCK_LOSS = 0x01;
        /// Half cycle slip marker
        const HALF_CYCLE_SLIP = 0x02;
        /// Observing under anti spoofing,
        /// might suffer from decreased signal quality
        const UNDER_ANTI_SPOOFING = 0x04;
    }
}
