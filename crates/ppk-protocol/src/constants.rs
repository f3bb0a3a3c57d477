//! Wire format constants
//!
//! These constants define the frame delimiters, bit layouts, and conversion
//! factors used by the Power Profiler measurement firmware. They must match
//! the device firmware exactly.

// ============================================================================
// Frame Delimiters
// ============================================================================

/// Start-of-frame marker for host → device command frames.
pub const STX: u8 = 0x02;
/// End-of-frame marker terminating every frame in both directions.
pub const ETX: u8 = 0x03;
/// Escape byte; the byte that follows has been XORed with [`ESC_MASK`].
pub const ESC: u8 = 0x1F;
/// Mask applied to a delimiter byte when it is escaped into a payload.
pub const ESC_MASK: u8 = 0x20;

// ============================================================================
// Frame Lengths
// ============================================================================

/// Decoded length of a device-averaged sample frame.
pub const AVERAGE_FRAME_LEN: usize = 4;
/// Decoded length of a systick (clock resynchronization) frame.
pub const SYSTICK_FRAME_LEN: usize = 5;

// ============================================================================
// Measurement Range Codes
// ============================================================================

/// No range detected; the sample is unusable.
pub const MEAS_RANGE_NONE: u8 = 0;
/// Low current range (largest sense resistor).
pub const MEAS_RANGE_LO: u8 = 1;
/// Mid current range.
pub const MEAS_RANGE_MID: u8 = 2;
/// High current range (smallest sense resistor).
pub const MEAS_RANGE_HI: u8 = 3;
/// Reserved invalid range code.
pub const MEAS_RANGE_INVALID: u8 = 4;

/// Bit position of the range field within a trigger word.
pub const MEAS_RANGE_POS: u16 = 14;
/// Mask selecting the 2-bit range field of a trigger word.
pub const MEAS_RANGE_MSK: u16 = 3 << MEAS_RANGE_POS;
/// Mask selecting the 14-bit ADC code of a trigger word.
pub const MEAS_ADC_MSK: u16 = 0x3FFF;

// ============================================================================
// ADC Conversion
// ============================================================================

/// ADC reference voltage in volts.
pub const ADC_REF: f64 = 0.6;
/// Front-end amplifier gain.
pub const ADC_GAIN: f64 = 4.0;
/// Full-scale ADC code.
pub const ADC_MAX: f64 = 8192.0;
/// Volts per ADC code before the per-range sense resistor is applied.
pub const ADC_MULT: f64 = ADC_REF / (ADC_GAIN * ADC_MAX);

// ============================================================================
// Timing
// ============================================================================

/// Duration of one raw ADC sample in microseconds.
pub const ADC_SAMPLING_TIME_US: u64 = 13;
/// Raw samples folded into each device-computed average.
pub const SAMPLES_PER_AVERAGE: u64 = 10;
/// Duration covered by one average sample in microseconds.
pub const AVERAGE_TIME_US: u64 = ADC_SAMPLING_TIME_US * SAMPLES_PER_AVERAGE;

// ============================================================================
// Default Sense Resistors (ohms)
// ============================================================================

/// Factory default low-range sense resistor.
pub const MEAS_RES_LO: f64 = 510.0;
/// Factory default mid-range sense resistor.
pub const MEAS_RES_MID: f64 = 28.0;
/// Factory default high-range sense resistor.
pub const MEAS_RES_HI: f64 = 1.8;
