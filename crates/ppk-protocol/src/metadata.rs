//! Boot-time metadata banner parsing.
//!
//! After opening, the device emits one multi-line ASCII banner describing
//! its firmware and calibration state:
//!
//! ```text
//! VERSION {version} CAL: {status} [R1: {lo} R2: {mid} R3: {hi}] Board ID {id}
//! [USER SET R1: {lo} R2: {mid} R3: {hi}]
//! Refs VDD: {vdd} HI: {high} LO: {low}
//! ```
//!
//! Bracketed groups are optional and independently present. The banner is
//! parsed once per session start.

use std::iter::Peekable;
use std::str::SplitWhitespace;

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::types::CalibrationResistors;

/// Device identity and calibration record from the boot banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Firmware version string, e.g. "2.1.0".
    pub version: String,
    /// Calibration status code reported by the firmware (0 = uncalibrated).
    pub calibration_status: u32,
    /// Factory-calibrated sense resistors, if the device carries them.
    pub resistors: Option<CalibrationResistors>,
    /// Board identifier (uppercase hex string).
    pub board_id: String,
    /// User-programmed sense resistors, if any were stored.
    pub user_resistors: Option<CalibrationResistors>,
    /// Supply voltage in millivolts.
    pub vdd: u32,
    /// Upper voltage reference value.
    pub vref_high: u32,
    /// Lower voltage reference value.
    pub vref_low: u32,
}

impl DeviceMetadata {
    /// Parse the boot banner.
    ///
    /// Any noise preceding the `VERSION` keyword is skipped; tokens may be
    /// separated by any whitespace, including newlines. An absent optional
    /// group leaves its field `None`, but a group that starts and then
    /// breaks off mid-triple is a format error.
    pub fn parse(text: &str) -> Result<DeviceMetadata, MetadataError> {
        // Serial noise may precede the banner, sometimes glued straight
        // onto the keyword; everything up to VERSION is discarded.
        let banner = match text.split_once("VERSION") {
            Some((_, banner)) => banner,
            None => {
                return Err(MetadataError::FormatMismatch(
                    "VERSION keyword not found".to_string(),
                ))
            }
        };
        let mut scanner = TokenScanner::new(banner);
        let version = scanner.next_token("version")?.to_string();
        let calibration_status = parse_u32("CAL", scanner.tagged_value("CAL:")?)?;

        let resistors = if scanner.peek_tag("R1:") {
            Some(scanner.resistor_triple()?)
        } else {
            None
        };

        scanner.expect_word("Board")?;
        scanner.expect_word("ID")?;
        let board_id = scanner.next_token("board ID")?;
        if board_id.is_empty()
            || !board_id
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        {
            return Err(MetadataError::FormatMismatch(format!(
                "board ID is not uppercase hex: {}",
                board_id
            )));
        }
        let board_id = board_id.to_string();

        let user_resistors = if scanner.peek_word("USER") {
            scanner.expect_word("USER")?;
            scanner.expect_word("SET")?;
            Some(scanner.resistor_triple()?)
        } else {
            None
        };

        scanner.expect_word("Refs")?;
        let vdd = parse_u32("VDD", scanner.tagged_value("VDD:")?)?;
        let vref_high = parse_u32("HI", scanner.tagged_value("HI:")?)?;
        let vref_low = parse_u32("LO", scanner.tagged_value("LO:")?)?;

        Ok(DeviceMetadata {
            version,
            calibration_status,
            resistors,
            board_id,
            user_resistors,
            vdd,
            vref_high,
            vref_low,
        })
    }

    /// The resistor triple a session should start with.
    ///
    /// User-programmed values win over factory calibration, which wins over
    /// the firmware defaults.
    pub fn active_resistors(&self) -> CalibrationResistors {
        self.user_resistors.or(self.resistors).unwrap_or_default()
    }
}

/// Whitespace-token scanner over the banner text.
struct TokenScanner<'a> {
    tokens: Peekable<SplitWhitespace<'a>>,
}

impl<'a> TokenScanner<'a> {
    fn new(text: &'a str) -> TokenScanner<'a> {
        TokenScanner {
            tokens: text.split_whitespace().peekable(),
        }
    }

    fn next_token(&mut self, what: &'static str) -> Result<&'a str, MetadataError> {
        self.tokens
            .next()
            .ok_or_else(|| MetadataError::FormatMismatch(format!("missing {}", what)))
    }

    fn expect_word(&mut self, word: &'static str) -> Result<(), MetadataError> {
        let token = self.next_token(word)?;
        if token == word {
            Ok(())
        } else {
            Err(MetadataError::FormatMismatch(format!(
                "expected {}, found {}",
                word, token
            )))
        }
    }

    fn peek_word(&mut self, word: &str) -> bool {
        self.tokens.peek() == Some(&word)
    }

    fn peek_tag(&mut self, tag: &str) -> bool {
        match self.tokens.peek() {
            Some(token) => token.starts_with(tag),
            None => false,
        }
    }

    /// Consume a `TAG:` label and its value. The firmware prints a space
    /// between them but the format does not require one.
    fn tagged_value(&mut self, tag: &'static str) -> Result<&'a str, MetadataError> {
        let token = self.next_token(tag)?;
        match token.strip_prefix(tag) {
            Some("") => self.next_token(tag),
            Some(value) => Ok(value),
            None => Err(MetadataError::FormatMismatch(format!(
                "expected {}, found {}",
                tag, token
            ))),
        }
    }

    /// Parse an `R1: .. R2: .. R3: ..` group into low/mid/high resistors.
    fn resistor_triple(&mut self) -> Result<CalibrationResistors, MetadataError> {
        let low = parse_f64("R1", self.tagged_value("R1:")?)?;
        let mid = parse_f64("R2", self.tagged_value("R2:")?)?;
        let high = parse_f64("R3", self.tagged_value("R3:")?)?;
        Ok(CalibrationResistors::new(low, mid, high))
    }
}

/// Parse an unsigned decimal integer field. The banner never carries signs
/// or exponents, so tokens with anything but digits are rejected up front.
fn parse_u32(field: &'static str, token: &str) -> Result<u32, MetadataError> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(MetadataError::InvalidNumber {
            field,
            value: token.to_string(),
        });
    }
    token.parse().map_err(|_| MetadataError::InvalidNumber {
        field,
        value: token.to_string(),
    })
}

/// Parse a resistor value field, restricted to digits and a decimal point.
fn parse_f64(field: &'static str, token: &str) -> Result<f64, MetadataError> {
    if !token.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(MetadataError::InvalidNumber {
            field,
            value: token.to_string(),
        });
    }
    token.parse().map_err(|_| MetadataError::InvalidNumber {
        field,
        value: token.to_string(),
    })
}
