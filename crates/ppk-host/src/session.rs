//! Measurement session lifecycle.
//!
//! A [`PpkSession`] owns a [`Transport`] and drives one measurement
//! session at a time: `start` opens the link, parses the boot banner and
//! spawns a pump thread that decodes incoming bytes into events; `stop`
//! tears it down. Decoded samples and recoverable errors arrive on the
//! channel returned by [`PpkSession::events`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use ppk_protocol::{CalibrationResistors, DeviceMetadata, FrameCodec, Sample, StreamDecoder};

use crate::error::{SessionError, TransportError};
use crate::transport::Transport;

/// How often the pump checks the stop flag while the byte channel is idle.
const PUMP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session active; `start` may be called.
    Stopped,
    /// `start` is opening the transport and parsing the banner.
    Starting,
    /// The pump thread is decoding incoming bytes.
    Running,
}

/// Events published while a session is running.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// One device-computed average reading, in microamps.
    Average {
        /// Current in microamps.
        value: f32,
        /// Stream position when the reading was taken.
        timestamp_us: u64,
    },
    /// One trigger burst of host-converted readings, in microamps.
    Trigger {
        /// Converted readings in capture order.
        values: Vec<f32>,
        /// Stream position at the end of the burst.
        last_timestamp_us: u64,
    },
    /// A recoverable failure. The session keeps running unless the
    /// transport itself died.
    Error(SessionError),
}

/// State shared between the session handle and its pump thread.
struct SharedState {
    state: RwLock<SessionState>,
    /// Signals the pump thread to exit.
    stop_flag: AtomicBool,
    /// Sense resistors applied to trigger conversion, swappable mid-run.
    resistors: RwLock<CalibrationResistors>,
}

impl SharedState {
    fn new() -> Self {
        SharedState {
            state: RwLock::new(SessionState::Stopped),
            stop_flag: AtomicBool::new(false),
            resistors: RwLock::new(CalibrationResistors::default()),
        }
    }

    fn state(&self) -> SessionState {
        *self.state.read()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    fn should_stop(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    fn signal_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    fn clear_stop(&self) {
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    fn resistors(&self) -> CalibrationResistors {
        *self.resistors.read()
    }

    fn set_resistors(&self, resistors: CalibrationResistors) {
        *self.resistors.write() = resistors;
    }
}

/// A Power Profiler measurement session over an abstract transport.
pub struct PpkSession<T: Transport> {
    transport: T,
    shared: Arc<SharedState>,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
    pump: Option<JoinHandle<()>>,
}

impl<T: Transport> PpkSession<T> {
    /// Create a session over the given transport. Nothing is opened until
    /// [`start`](PpkSession::start).
    pub fn new(transport: T) -> Self {
        let (event_tx, event_rx) = unbounded();
        PpkSession {
            transport,
            shared: Arc::new(SharedState::new()),
            event_tx,
            event_rx,
            pump: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// A receiver for session events. May be called any number of times;
    /// each event is delivered to exactly one receiver.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.event_rx.clone()
    }

    /// Open the transport, parse the device's boot banner and begin
    /// decoding the byte stream.
    ///
    /// On success the session is `Running` and the parsed metadata is
    /// returned; its resistor calibration (user-set over factory over
    /// defaults) becomes the active one. On failure the transport is
    /// released and the session stays `Stopped`. Starting a running
    /// session is an error.
    pub fn start(&mut self) -> Result<DeviceMetadata, SessionError> {
        if self.shared.state() == SessionState::Stopped {
            // The pump exits by itself if the device side vanishes; reap
            // it and release the link before reopening.
            if let Some(handle) = self.pump.take() {
                let _ = handle.join();
                self.transport.close();
            }
        }
        if self.shared.state() != SessionState::Stopped {
            return Err(SessionError::AlreadyRunning);
        }

        self.shared.set_state(SessionState::Starting);
        log::debug!("session starting");

        let connection = match self.transport.open() {
            Ok(connection) => connection,
            Err(e) => {
                self.shared.set_state(SessionState::Stopped);
                return Err(e.into());
            }
        };
        let metadata = match DeviceMetadata::parse(&connection.metadata_text) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("rejecting device banner: {}", e);
                self.transport.close();
                self.shared.set_state(SessionState::Stopped);
                return Err(e.into());
            }
        };

        self.shared.set_resistors(metadata.active_resistors());
        self.shared.clear_stop();
        // Running must be visible before the pump can auto-stop.
        self.shared.set_state(SessionState::Running);

        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        let bytes = connection.bytes;
        let pump = thread::Builder::new()
            .name("ppk-session-pump".to_string())
            .spawn(move || pump_main(bytes, shared, event_tx))
            .expect("Failed to spawn session pump thread");
        self.pump = Some(pump);

        log::debug!(
            "session running: board {} firmware {}",
            metadata.board_id,
            metadata.version
        );
        Ok(metadata)
    }

    /// Stop the session and release the transport.
    ///
    /// Safe to call at any time, including mid-frame; a partially
    /// accumulated frame is discarded. Stopping a stopped session is a
    /// no-op.
    pub fn stop(&mut self) {
        self.shared.signal_stop();
        if let Some(handle) = self.pump.take() {
            let _ = handle.join();
        }
        self.transport.close();
        self.shared.set_state(SessionState::Stopped);
        log::debug!("session stopped");
    }

    /// Frame a command payload and send it to the device.
    ///
    /// Valid only while running.
    pub fn send_command(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        if self.shared.state() != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let framed = FrameCodec::encode(payload);
        self.transport.send(&framed)?;
        Ok(())
    }

    /// Replace the sense resistor calibration.
    ///
    /// Takes effect on the next decoded chunk; already-emitted samples are
    /// not recomputed. May be called whether or not a session is running.
    pub fn set_calibration(&self, low: f64, mid: f64, high: f64) {
        self.shared
            .set_resistors(CalibrationResistors::new(low, mid, high));
    }

    /// The resistor calibration currently in effect.
    pub fn calibration(&self) -> CalibrationResistors {
        self.shared.resistors()
    }
}

impl<T: Transport> Drop for PpkSession<T> {
    fn drop(&mut self) {
        self.shared.signal_stop();
        // Don't wait for the pump thread in drop - it will terminate on its own
    }
}

/// Pump thread: drain byte chunks, decode, publish events.
///
/// Exits when the stop flag is raised or the byte channel disconnects.
/// On disconnect the session is marked `Stopped` before the final error
/// event goes out.
fn pump_main(bytes: Receiver<Vec<u8>>, shared: Arc<SharedState>, event_tx: Sender<SessionEvent>) {
    let mut decoder = StreamDecoder::new();

    while !shared.should_stop() {
        match bytes.recv_timeout(PUMP_POLL_INTERVAL) {
            Ok(chunk) => {
                decoder.set_resistors(shared.resistors());
                for result in decoder.push(&chunk) {
                    let event = match result {
                        Ok(Sample::Average {
                            value,
                            timestamp_us,
                        }) => SessionEvent::Average {
                            value,
                            timestamp_us,
                        },
                        Ok(Sample::TriggerBurst {
                            values,
                            last_timestamp_us,
                        }) => SessionEvent::Trigger {
                            values,
                            last_timestamp_us,
                        },
                        Err(e) => {
                            log::warn!("corrupt trigger burst: {}", e);
                            SessionEvent::Error(e.into())
                        }
                    };
                    let _ = event_tx.send(event);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("device byte stream disconnected");
                shared.set_state(SessionState::Stopped);
                let _ = event_tx.send(SessionEvent::Error(TransportError::Closed.into()));
                return;
            }
        }
    }
}
