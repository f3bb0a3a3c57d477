//! Common types used in the protocol.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Current-sense range encoded in the top two bits of a trigger word.
///
/// The device switches ranges automatically as the measured current moves;
/// each range has its own sense resistor. `None` and `Invalid` mark samples
/// that cannot be converted, not measurable ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementRange {
    /// No range detected.
    None,
    /// Low current range.
    Low,
    /// Mid current range.
    Mid,
    /// High current range.
    High,
    /// Reserved invalid range code.
    Invalid,
}

impl MeasurementRange {
    /// Extract the range field from a raw 16-bit trigger word.
    pub fn from_word(word: u16) -> Self {
        (((word & MEAS_RANGE_MSK) >> MEAS_RANGE_POS) as u8).into()
    }

    /// Whether samples in this range can be converted to a current.
    pub fn is_measurable(&self) -> bool {
        matches!(
            self,
            MeasurementRange::Low | MeasurementRange::Mid | MeasurementRange::High
        )
    }
}

impl std::fmt::Display for MeasurementRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementRange::None => write!(f, "none"),
            MeasurementRange::Low => write!(f, "low"),
            MeasurementRange::Mid => write!(f, "mid"),
            MeasurementRange::High => write!(f, "high"),
            MeasurementRange::Invalid => write!(f, "invalid"),
        }
    }
}

impl From<u8> for MeasurementRange {
    fn from(code: u8) -> Self {
        match code {
            MEAS_RANGE_NONE => MeasurementRange::None,
            MEAS_RANGE_LO => MeasurementRange::Low,
            MEAS_RANGE_MID => MeasurementRange::Mid,
            MEAS_RANGE_HI => MeasurementRange::High,
            _ => MeasurementRange::Invalid,
        }
    }
}

impl From<MeasurementRange> for u8 {
    fn from(range: MeasurementRange) -> Self {
        match range {
            MeasurementRange::None => MEAS_RANGE_NONE,
            MeasurementRange::Low => MEAS_RANGE_LO,
            MeasurementRange::Mid => MEAS_RANGE_MID,
            MeasurementRange::High => MEAS_RANGE_HI,
            MeasurementRange::Invalid => MEAS_RANGE_INVALID,
        }
    }
}

/// Sense resistor values for the three measurement ranges, in ohms.
///
/// Every trigger conversion reads the triple for the range its word selects.
/// Values must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResistors {
    /// Low range sense resistor.
    pub low: f64,
    /// Mid range sense resistor.
    pub mid: f64,
    /// High range sense resistor.
    pub high: f64,
}

impl CalibrationResistors {
    /// Create a resistor triple.
    pub fn new(low: f64, mid: f64, high: f64) -> Self {
        CalibrationResistors { low, mid, high }
    }

    /// Resistance for the given range, if the range is measurable.
    pub fn resistance(&self, range: MeasurementRange) -> Option<f64> {
        match range {
            MeasurementRange::Low => Some(self.low),
            MeasurementRange::Mid => Some(self.mid),
            MeasurementRange::High => Some(self.high),
            MeasurementRange::None | MeasurementRange::Invalid => None,
        }
    }
}

impl Default for CalibrationResistors {
    fn default() -> Self {
        CalibrationResistors {
            low: MEAS_RES_LO,
            mid: MEAS_RES_MID,
            high: MEAS_RES_HI,
        }
    }
}

/// A decoded measurement emitted by the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    /// A device-averaged current reading.
    Average {
        /// Current in microamps.
        value: f32,
        /// Stream timestamp of the reading in microseconds.
        timestamp_us: u64,
    },

    /// A high-rate capture window surrounding a trigger event.
    TriggerBurst {
        /// Current readings in microamps, in capture order.
        values: Vec<f32>,
        /// Stream timestamp of the last reading in microseconds.
        last_timestamp_us: u64,
    },
}

impl Sample {
    /// Stream timestamp of the sample (of the last value for a burst).
    pub fn timestamp_us(&self) -> u64 {
        match self {
            Sample::Average { timestamp_us, .. } => *timestamp_us,
            Sample::TriggerBurst {
                last_timestamp_us, ..
            } => *last_timestamp_us,
        }
    }

    /// Whether this is an average sample.
    pub fn is_average(&self) -> bool {
        matches!(self, Sample::Average { .. })
    }
}
