//! Raw GRD message stream
//!
//! ORD/NRD files are sequences of ASCII records `type;field;field;...`,
//! one per line, where `type` is a small integer tag from a closed registry.
//! The whole sequence is finite and is captured up front, so the decoder
//! can rewind it between the header, observation and navigation passes.
use log::warn;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error while reading raw messages")]
    Io(#[from] std::io::Error),
}

/// Closed registry of raw message tags.
///
/// 1..=2 carry epoch / observation data, 3..=12 carry navigation
/// messages, 50.. carry header and configuration records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Observation epoch header: week;tow;time_tag;clock_offset;flag;n_obs
    Epoch,
    /// One satellite measurement:
    /// sys;sat;signal;sync_state;t_tx_ns;time_offset_ns;adr_state;adr_m;carrier_mhz;cn0;range_rate
    SatObs,
    /// GPS L1 C/A navigation subframe
    SatNavGpsL1Ca,
    /// GLONASS L1 C/A navigation string
    SatNavGlonassL1Ca,
    /// Galileo I/NAV nominal page
    SatNavGalileoInav,
    /// Galileo F/NAV page (not decoded)
    SatNavGalileoFnav,
    /// BeiDou D1 frame (not decoded)
    SatNavBeidouD1,
    /// BeiDou D2 frame (not decoded)
    SatNavBeidouD2,
    /// GPS L2 CNAV message (not decoded)
    SatNavGpsL2Cnav,
    /// GPS L5 CNAV message (not decoded)
    SatNavGpsL5Cnav,
    /// GPS L1C CNAV-2 message (not decoded)
    SatNavGpsCnav2,
    /// SBAS navigation message (not decoded)
    SatNavSbas,
    /// GRD format version
    GrdVersion,
    /// Generator program name
    Program,
    /// Device type
    DeviceType,
    /// Device software version
    DeviceVersion,
    /// Receiver number
    ReceiverNumber,
    /// Site position, geodetic lat;lon;alt
    SiteLla,
    /// Acquisition date
    Date,
    /// Observation interval, milliseconds
    IntervalMs,
    /// Signal strength unit
    SignalUnit,
    /// Target RINEX version request
    RinexVersion,
    /// Marker name
    MarkerName,
    /// Marker type
    MarkerType,
    /// Observer name
    Observer,
    /// Agency name
    Agency,
    /// Free comment
    Comment,
    /// Receiver clock offset application flag
    ClockOffsetFlag,
    /// Fit interval flag
    FitInterval,
    /// Logging level request
    LogLevel,
    /// Constellation selection list
    ConstellationList,
    /// Satellite selection list
    SatelliteList,
    /// Observable selection list
    ObservableList,
    /// Tag outside the registry, skipped with a warning
    Unknown(u16),
}

impl From<u16> for MessageType {
    fn from(tag: u16) -> Self {
        match tag {
            1 => Self::Epoch,
            2 => Self::SatObs,
            3 => Self::SatNavGpsL1Ca,
            4 => Self::SatNavGlonassL1Ca,
            5 => Self::SatNavGalileoInav,
            6 => Self::SatNavGalileoFnav,
            7 => Self::SatNavBeidouD1,
            8 => Self::SatNavBeidouD2,
            9 => Self::SatNavGpsL2Cnav,
            10 => Self::SatNavGpsL5Cnav,
            11 => Self::SatNavGpsCnav2,
            12 => Self::SatNavSbas,
            50 => Self::GrdVersion,
            51 => Self::Program,
            52 => Self::DeviceType,
            53 => Self::DeviceVersion,
            54 => Self::ReceiverNumber,
            55 => Self::SiteLla,
            56 => Self::Date,
            57 => Self::IntervalMs,
            58 => Self::SignalUnit,
            59 => Self::RinexVersion,
            60 => Self::MarkerName,
            61 => Self::MarkerType,
            62 => Self::Observer,
            63 => Self::Agency,
            64 => Self::Comment,
            65 => Self::ClockOffsetFlag,
            66 => Self::FitInterval,
            67 => Self::LogLevel,
            68 => Self::ConstellationList,
            69 => Self::SatelliteList,
            70 => Self::ObservableList,
            other => Self::Unknown(other),
        }
    }
}

/// One raw message: a type tag and its positional fields
#[derive(Clone, Debug)]
pub struct RawMessage {
    pub msg_type: MessageType,
    pub fields: Vec<String>,
}

impl RawMessage {
    /// Numeric field accessor, `None` if missing or malformed
    pub fn f64_field(&self, index: usize) -> Option<f64> {
        self.fields.get(index)?.trim().parse::<f64>().ok()
    }

    pub fn i64_field(&self, index: usize) -> Option<i64> {
        self.fields.get(index)?.trim().parse::<i64>().ok()
    }

    pub fn u32_field(&self, index: usize) -> Option<u32> {
        self.fields.get(index)?.trim().parse::<u32>().ok()
    }

    /// Hexadecimal or decimal word field ("0x..." or plain decimal)
    pub fn word_field(&self, index: usize) -> Option<u32> {
        let raw = self.fields.get(index)?.trim();
        if let Some(hex) = raw.strip_prefix("0x").or(raw.strip_prefix("0X")) {
            u32::from_str_radix(hex, 16).ok()
        } else {
            raw.parse::<u32>().ok()
        }
    }

    pub fn str_field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|s| s.trim())
    }
}

/// Sequential reader over the finite, ordered raw message sequence
#[derive(Debug)]
pub struct MessageStream {
    messages: Vec<RawMessage>,
    position: usize,
}

impl MessageStream {
    /// Captures the complete message sequence from any readable source.
    /// Blank lines are skipped; lines without a valid numeric tag are
    /// dropped with a warning, the stream position always moves past them.
    pub fn new<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut split = trimmed.split(';');
            let tag = split.next().unwrap_or("").trim();
            match tag.parse::<u16>() {
                Ok(tag) => {
                    let msg_type = MessageType::from(tag);
                    if let MessageType::Unknown(t) = msg_type {
                        warn!("unknown raw message type {}, skipped", t);
                        continue;
                    }
                    messages.push(RawMessage {
                        msg_type,
                        fields: split.map(|f| f.to_string()).collect(),
                    });
                },
                Err(_) => {
                    warn!("malformed raw message line \"{}\", skipped", trimmed);
                },
            }
        }
        Ok(Self {
            messages,
            position: 0,
        })
    }

    /// Restarts iteration from the first message
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Next message, `None` once the sequence is exhausted
    pub fn next_message(&mut self) -> Option<&RawMessage> {
        let msg = self.messages.get(self.position)?;
        self.position += 1;
        Some(msg)
    }

    /// Next message without advancing the stream
    pub fn peek_message(&self) -> Option<&RawMessage> {
        self.messages.get(self.position)
    }

    /// Number of captured messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stream_capture_and_rewind() {
        let content = "51;toRinex 2.1\n\n1;2190;345600.0;345600.0;0.0;0;2\n999;x\nnot a message\n2;G;12;1C;16399;1;0;0;1;0.0;1575.42;45.0;120.5\n";
        let mut stream = MessageStream::new(Cursor::new(content)).unwrap();
        assert_eq!(stream.len(), 3);

        let msg = stream.next_message().unwrap();
        assert_eq!(msg.msg_type, MessageType::Program);
        assert_eq!(msg.str_field(0), Some("toRinex 2.1"));

        let msg = stream.next_message().unwrap();
        assert_eq!(msg.msg_type, MessageType::Epoch);
        assert_eq!(msg.u32_field(0), Some(2190));
        assert_eq!(msg.f64_field(1), Some(345600.0));

        let msg = stream.next_message().unwrap();
        assert_eq!(msg.msg_type, MessageType::SatObs);
        assert!(stream.next_message().is_none());

        stream.rewind();
        assert_eq!(
            stream.next_message().unwrap().msg_type,
            MessageType::Program
        );
    }

    #[test]
    fn word_fields() {
        let content = "3;12;1;0x22C34F2D;573738291\n";
        let mut stream = MessageStream::new(Cursor::new(content)).unwrap();
        let msg = stream.next_message().unwrap();
        assert_eq!(msg.word_field(2), Some(0x22C34F2D));
        assert_eq!(msg.word_field(3), Some(573738291));
    }
}
