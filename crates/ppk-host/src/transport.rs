//! Abstract byte link to the device.
//!
//! Sessions talk to hardware through the [`Transport`] trait, which hides
//! serial/USB specifics behind three operations: open (capturing the boot
//! banner), send, and close. [`ChannelTransport`] is an in-memory
//! implementation whose paired handle plays the device side, used by
//! tests and embedders without hardware.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::TransportError;

/// A live link produced by [`Transport::open`].
pub struct TransportConnection {
    /// Boot-time metadata banner captured by the transport.
    pub metadata_text: String,
    /// Raw byte chunks from the device, in arrival order.
    pub bytes: Receiver<Vec<u8>>,
}

/// Byte-level link to a Power Profiler device.
///
/// Implementations own the physical link and deliver received bytes
/// through the connection's channel. `open` must capture the device's
/// boot banner before returning; the banner is never replayed on the
/// byte channel.
pub trait Transport: Send {
    /// Open the link and capture the metadata banner.
    fn open(&mut self) -> Result<TransportConnection, TransportError>;

    /// Send raw, already-framed bytes to the device.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Release the link. Idempotent; closing an unopened link is a no-op.
    fn close(&mut self);
}

/// In-memory [`Transport`] over crossbeam channels.
///
/// [`new_pair`](ChannelTransport::new_pair) returns the host side and a
/// [`ChannelTransportHandle`] for the device side. The handle injects
/// received bytes and observes sent command frames. Reopening after a
/// close resumes the same channels, so a transport survives stop/start
/// cycles.
pub struct ChannelTransport {
    metadata_text: String,
    bytes: Receiver<Vec<u8>>,
    sent: Sender<Vec<u8>>,
}

/// Device side of a [`ChannelTransport`] pair.
#[derive(Clone)]
pub struct ChannelTransportHandle {
    bytes: Sender<Vec<u8>>,
    sent: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a transport and its device-side handle.
    ///
    /// `metadata_text` is the banner `open` will report, standing in for
    /// what a real device prints at boot.
    pub fn new_pair(metadata_text: &str) -> (ChannelTransport, ChannelTransportHandle) {
        let (byte_tx, byte_rx) = unbounded();
        let (sent_tx, sent_rx) = unbounded();
        (
            ChannelTransport {
                metadata_text: metadata_text.to_string(),
                bytes: byte_rx,
                sent: sent_tx,
            },
            ChannelTransportHandle {
                bytes: byte_tx,
                sent: sent_rx,
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn open(&mut self) -> Result<TransportConnection, TransportError> {
        Ok(TransportConnection {
            metadata_text: self.metadata_text.clone(),
            bytes: self.bytes.clone(),
        })
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent
            .send(bytes.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {}
}

impl ChannelTransportHandle {
    /// Deliver a chunk of bytes as if received from the device.
    ///
    /// Returns false if the host side is gone.
    pub fn inject(&self, bytes: &[u8]) -> bool {
        self.bytes.send(bytes.to_vec()).is_ok()
    }

    /// Next command frame the host sent, if one already arrived.
    pub fn try_next_sent(&self) -> Option<Vec<u8>> {
        self.sent.try_recv().ok()
    }

    /// Wait up to `timeout` for the next command frame from the host.
    pub fn next_sent_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.sent.recv_timeout(timeout).ok()
    }
}
