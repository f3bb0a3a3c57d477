//! Power Profiler Measurement Protocol
//!
//! This crate decodes the byte stream produced by a Power Profiler
//! current-measurement device into structured samples, and encodes command
//! bytes for transmission back to it. Framing is SLIP-like: frames end with
//! an `ETX` terminator and reserved bytes inside a payload are escaped with
//! `ESC` followed by the byte XOR 0x20.
//!
//! # Protocol Overview
//!
//! A completed frame payload is classified by its decoded length:
//!
//! - **4 bytes**: device-computed average current (little-endian `f32`)
//! - **5 bytes**: systick counter that resynchronizes the stream clock
//! - **anything else**: a trigger burst of raw 16-bit ADC words, each
//!   packing a 2-bit range selector and a 14-bit ADC code
//!
//! At connection time the device emits an ASCII metadata banner carrying
//! its firmware version, board ID and resistor calibration; see
//! [`DeviceMetadata`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ppk_protocol::{Sample, StreamDecoder};
//!
//! let mut decoder = StreamDecoder::new();
//! for result in decoder.push(&received_bytes) {
//!     match result? {
//!         Sample::Average { value, timestamp_us } => plot(timestamp_us, value),
//!         Sample::TriggerBurst { values, .. } => plot_burst(&values),
//!     }
//! }
//! ```

mod constants;
mod error;
mod frame;
mod metadata;
mod sample;
mod stream;
mod types;

pub use constants::*;
pub use error::*;
pub use frame::*;
pub use metadata::*;
pub use sample::*;
pub use stream::*;
pub use types::*;
