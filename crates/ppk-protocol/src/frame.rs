//! Frame decoding/encoding utilities.
//!
//! The measurement stream delimits frames with a trailing `ETX` byte and
//! escapes any delimiter value occurring inside a payload:
//!
//! ```text
//! +------------------------+-----+
//! | escaped payload bytes  | ETX |
//! +------------------------+-----+
//! ```
//!
//! An `ESC` byte marks the following byte as payload XORed with `ESC_MASK`.
//! Device → host frames carry no start marker; host → device command frames
//! are additionally prefixed with `STX`.

use bytes::{BufMut, BytesMut};

use crate::constants::*;

/// Decoder state between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    /// Accumulating plain payload bytes.
    #[default]
    Normal,
    /// An `ESC` was seen; the next byte is masked payload.
    EscapePending,
}

/// A codec for the device's escaped, `ETX`-terminated byte stream.
///
/// Feed received bytes one at a time; a completed payload is returned
/// whenever a terminator is observed. The codec owns the partial-frame
/// buffer and never hands out references to it.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Escape state carried between bytes.
    state: DecodeState,
    /// Buffer for the payload of the frame in progress.
    payload: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            state: DecodeState::Normal,
            payload: BytesMut::new(),
        }
    }

    /// Process one received byte.
    ///
    /// Returns `Some(payload)` when `byte` completes a frame, `None`
    /// otherwise. An `ETX` with nothing buffered yields an empty payload.
    pub fn push_byte(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.state {
            DecodeState::Normal => match byte {
                ESC => {
                    self.state = DecodeState::EscapePending;
                    None
                }
                ETX => {
                    let len = self.payload.len();
                    Some(self.payload.split_to(len).to_vec())
                }
                other => {
                    self.payload.put_u8(other);
                    None
                }
            },
            DecodeState::EscapePending => {
                self.payload.put_u8(byte ^ ESC_MASK);
                self.state = DecodeState::Normal;
                None
            }
        }
    }

    /// Encode a command payload for host → device transmission.
    ///
    /// The payload is wrapped in `STX`/`ETX`, and any payload byte equal to
    /// a delimiter is escaped as `ESC, byte ^ ESC_MASK`.
    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(payload.len() + 2);
        buf.push(STX);
        for &byte in payload {
            match byte {
                STX | ETX | ESC => {
                    buf.push(ESC);
                    buf.push(byte ^ ESC_MASK);
                }
                other => buf.push(other),
            }
        }
        buf.push(ETX);
        buf
    }

    /// Get the number of payload bytes buffered for the frame in progress.
    pub fn buffered_len(&self) -> usize {
        self.payload.len()
    }

    /// Discard any partial frame and return to the initial state.
    pub fn clear(&mut self) {
        self.payload.clear();
        self.state = DecodeState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to run a byte sequence through a codec, collecting frames.
    fn decode_all(codec: &mut FrameCodec, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if let Some(frame) = codec.push_byte(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    #[test]
    fn test_plain_frame() {
        let mut codec = FrameCodec::new();
        let frames = decode_all(&mut codec, &[0x10, 0x20, 0x30, ETX]);
        assert_eq!(frames, vec![vec![0x10, 0x20, 0x30]]);
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_escaped_terminator() {
        // ESC followed by ETX ^ ESC_MASK decodes to a literal ETX byte.
        let mut codec = FrameCodec::new();
        let frames = decode_all(&mut codec, &[ESC, ETX ^ ESC_MASK, ETX]);
        assert_eq!(frames, vec![vec![ETX]]);
    }

    #[test]
    fn test_escaped_escape() {
        let mut codec = FrameCodec::new();
        let frames = decode_all(&mut codec, &[ESC, ESC ^ ESC_MASK, 0x01, ETX]);
        assert_eq!(frames, vec![vec![ESC, 0x01]]);
    }

    #[test]
    fn test_partial_frame() {
        let mut codec = FrameCodec::new();

        assert!(codec.push_byte(0xAA).is_none());
        assert!(codec.push_byte(0xBB).is_none());
        assert_eq!(codec.buffered_len(), 2);

        let frame = codec.push_byte(ETX).expect("should complete frame");
        assert_eq!(frame, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_multiple_frames() {
        let mut codec = FrameCodec::new();
        let frames = decode_all(&mut codec, &[0x01, ETX, 0x02, 0x03, ETX, ETX]);
        assert_eq!(frames, vec![vec![0x01], vec![0x02, 0x03], vec![]]);
    }

    #[test]
    fn test_empty_frame() {
        let mut codec = FrameCodec::new();
        let frame = codec.push_byte(ETX).expect("bare terminator completes");
        assert!(frame.is_empty());
    }

    #[test]
    fn test_encode_escapes_delimiters() {
        let encoded = FrameCodec::encode(&[0x01, STX, ETX, ESC]);
        assert_eq!(
            encoded,
            vec![
                STX,
                0x01,
                ESC,
                STX ^ ESC_MASK,
                ESC,
                ETX ^ ESC_MASK,
                ESC,
                ESC ^ ESC_MASK,
                ETX,
            ]
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = [0x00, STX, ETX, ESC, 0x7F, ETX ^ ESC_MASK, 0xFF];
        let encoded = FrameCodec::encode(&payload);

        // Inbound frames carry no start marker, so skip the leading STX.
        let mut codec = FrameCodec::new();
        let frames = decode_all(&mut codec, &encoded[1..]);
        assert_eq!(frames, vec![payload.to_vec()]);
    }

    #[test]
    fn test_clear_discards_partial_frame() {
        let mut codec = FrameCodec::new();
        codec.push_byte(0x42);
        codec.push_byte(ESC);
        codec.clear();

        // A fresh frame decodes as if the partial bytes never arrived.
        let frames = decode_all(&mut codec, &[0x55, ETX]);
        assert_eq!(frames, vec![vec![0x55]]);
    }
}
