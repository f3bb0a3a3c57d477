//! Transport-free streaming decoder.
//!
//! [`StreamDecoder`] glues the frame codec and the sample decoder into one
//! object that eats raw byte chunks and yields decoded samples. Hosts that
//! own their I/O can feed it directly; the session layer is built on top
//! of it.

use crate::error::DecodeError;
use crate::frame::FrameCodec;
use crate::sample::SampleDecoder;
use crate::types::{CalibrationResistors, Sample};

/// Incremental decoder from raw bytes to measurement samples.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    codec: FrameCodec,
    samples: SampleDecoder,
    resistors: CalibrationResistors,
}

impl StreamDecoder {
    /// Create a decoder using the default sense resistors.
    pub fn new() -> Self {
        StreamDecoder::default()
    }

    /// Create a decoder with a specific resistor calibration.
    pub fn with_resistors(resistors: CalibrationResistors) -> Self {
        StreamDecoder {
            resistors,
            ..StreamDecoder::default()
        }
    }

    /// Feed a chunk of raw bytes, in arrival order.
    ///
    /// Returns one entry per completed frame that produced an outcome:
    /// `Ok` for each decoded sample, `Err` for each corrupt trigger burst.
    /// Clock-sync frames complete silently. Bytes of an unfinished frame
    /// stay buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Sample, DecodeError>> {
        let mut out = Vec::new();
        for &byte in chunk {
            if let Some(frame) = self.codec.push_byte(byte) {
                match self.samples.decode(&frame, &self.resistors) {
                    Ok(Some(sample)) => out.push(Ok(sample)),
                    Ok(None) => {}
                    Err(e) => out.push(Err(e)),
                }
            }
        }
        out
    }

    /// Replace the sense resistors used by subsequent conversions.
    pub fn set_resistors(&mut self, resistors: CalibrationResistors) {
        self.resistors = resistors;
    }

    /// The resistor calibration currently in effect.
    pub fn resistors(&self) -> CalibrationResistors {
        self.resistors
    }

    /// Current stream position in microseconds.
    pub fn timestamp_us(&self) -> u64 {
        self.samples.timestamp_us()
    }

    /// Drop any partial frame and rewind the stream clock to zero.
    ///
    /// Resistor calibration is kept.
    pub fn reset(&mut self) {
        self.codec.clear();
        self.samples.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::metadata::DeviceMetadata;

    /// Escape a payload and terminate it the way the device does. Inbound
    /// frames carry no start marker.
    fn device_frame(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for &b in payload {
            match b {
                STX | ETX | ESC => {
                    out.push(ESC);
                    out.push(b ^ ESC_MASK);
                }
                _ => out.push(b),
            }
        }
        out.push(ETX);
        out
    }

    fn systick_payload(ticks: u32) -> [u8; 5] {
        let mut payload = [0u8; 5];
        payload[..4].copy_from_slice(&ticks.to_le_bytes());
        payload
    }

    #[test]
    fn test_average_stream() {
        let mut decoder = StreamDecoder::new();

        let results = decoder.push(&device_frame(&1.0f32.to_le_bytes()));

        assert_eq!(
            results,
            vec![Ok(Sample::Average {
                value: 1.0,
                timestamp_us: 0,
            })]
        );
        assert_eq!(decoder.timestamp_us(), AVERAGE_TIME_US);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = StreamDecoder::new();
        let frame = device_frame(&2.0f32.to_le_bytes());
        let (head, tail) = frame.split_at(2);

        assert!(decoder.push(head).is_empty());
        let results = decoder.push(tail);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_systick_sets_clock_for_next_average() {
        let mut decoder = StreamDecoder::new();

        let results = decoder.push(&device_frame(&systick_payload(100)));
        assert!(results.is_empty());

        let results = decoder.push(&device_frame(&3.0f32.to_le_bytes()));
        assert_eq!(
            results,
            vec![Ok(Sample::Average {
                value: 3.0,
                timestamp_us: 100 * ADC_SAMPLING_TIME_US,
            })]
        );
    }

    #[test]
    fn test_corrupt_burst_does_not_stall_stream() {
        let mut decoder = StreamDecoder::new();

        // One word with no range bits set, then a valid average frame.
        let mut bytes = device_frame(&5u16.to_le_bytes());
        bytes.extend_from_slice(&device_frame(&1.5f32.to_le_bytes()));

        let results = decoder.push(&bytes);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            Err(DecodeError::RangeNotDetected { index: 0 })
        );
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_set_resistors_applies_to_next_conversion() {
        let mut decoder = StreamDecoder::new();
        let word = ((u16::from(MEAS_RANGE_LO) << MEAS_RANGE_POS) | 100).to_le_bytes();
        let frame = device_frame(&word);

        let before = decoder.push(&frame);
        decoder.set_resistors(CalibrationResistors::new(100.0, 28.0, 1.8));
        let after = decoder.push(&frame);

        let value = |results: &[Result<Sample, DecodeError>]| match &results[0] {
            Ok(Sample::TriggerBurst { values, .. }) => values[0],
            other => panic!("Expected trigger burst, got {:?}", other),
        };
        assert_eq!(value(&before), (100.0 * (ADC_MULT / MEAS_RES_LO) * 1e6) as f32);
        assert_eq!(value(&after), (100.0 * (ADC_MULT / 100.0) * 1e6) as f32);
    }

    #[test]
    fn test_with_resistors_from_banner_calibration() {
        let meta = DeviceMetadata::parse(
            "VERSION 2.0.0 CAL: 1 R1: 100.000 R2: 28.000 R3: 1.800 Board ID AB \
             Refs VDD: 3000 HI: 10 LO: 5",
        )
        .unwrap();

        let mut decoder = StreamDecoder::with_resistors(meta.active_resistors());
        assert_eq!(decoder.resistors(), meta.active_resistors());

        let word = ((u16::from(MEAS_RANGE_LO) << MEAS_RANGE_POS) | 100).to_le_bytes();
        let results = decoder.push(&device_frame(&word));
        match &results[0] {
            Ok(Sample::TriggerBurst { values, .. }) => {
                assert_eq!(values[0], (100.0 * (ADC_MULT / 100.0) * 1e6) as f32);
            }
            other => panic!("Expected trigger burst, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_discards_partial_frame_and_clock() {
        let mut decoder = StreamDecoder::new();

        decoder.push(&device_frame(&1.0f32.to_le_bytes()));
        assert_eq!(decoder.timestamp_us(), AVERAGE_TIME_US);

        // Leave a frame half-delivered, then reset.
        decoder.push(&[0xAA, 0xBB]);
        decoder.reset();
        assert_eq!(decoder.timestamp_us(), 0);

        let results = decoder.push(&device_frame(&1.0f32.to_le_bytes()));
        assert_eq!(
            results,
            vec![Ok(Sample::Average {
                value: 1.0,
                timestamp_us: 0,
            })]
        );
    }

    #[test]
    fn test_escaped_payload_bytes_survive() {
        let mut decoder = StreamDecoder::new();

        // An average whose encoding contains the terminator byte.
        let payload = f32::from_le_bytes([ETX, 0x00, 0x80, 0x3F]).to_le_bytes();
        assert_eq!(payload[0], ETX);

        let results = decoder.push(&device_frame(&payload));
        assert_eq!(results.len(), 1);
        match &results[0] {
            Ok(Sample::Average { value, .. }) => {
                assert_eq!(*value, f32::from_le_bytes([ETX, 0x00, 0x80, 0x3F]));
            }
            other => panic!("Expected average sample, got {:?}", other),
        }
    }
}
