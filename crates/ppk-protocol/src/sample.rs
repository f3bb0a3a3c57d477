//! Measurement frame interpretation.
//!
//! A completed frame payload is classified by its decoded length:
//!
//! - **4 bytes**: a device-computed average reading (little-endian `f32`)
//! - **5 bytes**: a systick counter resetting the stream clock
//! - **any other length**: a trigger burst of raw 16-bit ADC words
//!
//! Each trigger word packs a 2-bit range selector above a 14-bit ADC code;
//! conversion to microamps divides the ADC scale by the sense resistor of
//! the selected range.

use crate::constants::*;
use crate::error::DecodeError;
use crate::types::{CalibrationResistors, MeasurementRange, Sample};

/// Interprets completed frames and tracks the stream clock.
///
/// The decoder owns a running microsecond timestamp: average frames advance
/// it by [`AVERAGE_TIME_US`], systick frames reset it, and trigger bursts
/// leave it untouched.
#[derive(Debug, Default)]
pub struct SampleDecoder {
    /// Stream position in microseconds.
    timestamp_us: u64,
    /// Scratch space reused across trigger conversions. Results are copied
    /// out; this buffer is never exposed.
    scratch: Vec<f32>,
}

impl SampleDecoder {
    /// Create a new sample decoder with the clock at zero.
    pub fn new() -> Self {
        SampleDecoder::default()
    }

    /// Current stream position in microseconds.
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    /// Reset the stream clock to zero.
    pub fn reset(&mut self) {
        self.timestamp_us = 0;
    }

    /// Interpret one completed frame payload.
    ///
    /// Returns `Ok(Some(sample))` for average and trigger frames and
    /// `Ok(None)` for systick frames, which only adjust the clock. A burst
    /// whose range bits decode to an unusable range fails as a whole: the
    /// error names the first bad word and no partial values are emitted.
    /// A zero-length payload decodes to an empty burst.
    pub fn decode(
        &mut self,
        frame: &[u8],
        resistors: &CalibrationResistors,
    ) -> Result<Option<Sample>, DecodeError> {
        match frame.len() {
            AVERAGE_FRAME_LEN => Ok(Some(self.decode_average(frame))),
            SYSTICK_FRAME_LEN => {
                self.resync(frame);
                Ok(None)
            }
            _ => self.decode_trigger(frame, resistors).map(Some),
        }
    }

    fn decode_average(&mut self, frame: &[u8]) -> Sample {
        let value = f32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        let sample = Sample::Average {
            value,
            timestamp_us: self.timestamp_us,
        };
        self.timestamp_us += AVERAGE_TIME_US;
        sample
    }

    fn resync(&mut self, frame: &[u8]) {
        // The counter occupies the first four bytes; the fifth is padding.
        let ticks = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        self.timestamp_us = u64::from(ticks) * ADC_SAMPLING_TIME_US;
        log::trace!("systick resync: {} ticks -> {} us", ticks, self.timestamp_us);
    }

    fn decode_trigger(
        &mut self,
        frame: &[u8],
        resistors: &CalibrationResistors,
    ) -> Result<Sample, DecodeError> {
        // An odd trailing byte cannot form a word and is ignored.
        let count = frame.len() / 2;
        self.scratch.clear();
        self.scratch.reserve(count);
        for index in 0..count {
            let word = u16::from_le_bytes([frame[2 * index], frame[2 * index + 1]]);
            self.scratch.push(convert_word(word, index, resistors)?);
        }
        Ok(Sample::TriggerBurst {
            values: self.scratch.clone(),
            last_timestamp_us: self.timestamp_us + ADC_SAMPLING_TIME_US * count as u64,
        })
    }
}

/// Convert one raw ADC word to microamps using its range's sense resistor.
fn convert_word(
    word: u16,
    index: usize,
    resistors: &CalibrationResistors,
) -> Result<f32, DecodeError> {
    let adc = f64::from(word & MEAS_ADC_MSK);
    let resistance = match MeasurementRange::from_word(word) {
        MeasurementRange::Low => resistors.low,
        MeasurementRange::Mid => resistors.mid,
        MeasurementRange::High => resistors.high,
        MeasurementRange::None => return Err(DecodeError::RangeNotDetected { index }),
        MeasurementRange::Invalid => return Err(DecodeError::RangeInvalid { index }),
    };
    // Amps to microamps.
    Ok((adc * (ADC_MULT / resistance) * 1e6) as f32)
}
