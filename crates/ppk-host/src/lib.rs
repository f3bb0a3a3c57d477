//! Power Profiler Session Layer
//!
//! This crate manages measurement sessions against a Power Profiler
//! device. It sits on top of [`ppk_protocol`], adding a [`Transport`]
//! abstraction for the physical link, a session lifecycle
//! (`Stopped -> Starting -> Running`), a decode pump thread and an event
//! channel delivering samples to the host application.
//!
//! # Example
//!
//! ```rust,ignore
//! use ppk_host::{PpkSession, SessionEvent};
//!
//! let mut session = PpkSession::new(serial_transport);
//! let metadata = session.start()?;
//! println!("board {} firmware {}", metadata.board_id, metadata.version);
//!
//! for event in session.events() {
//!     match event {
//!         SessionEvent::Average { value, timestamp_us } => record(timestamp_us, value),
//!         SessionEvent::Trigger { values, .. } => record_burst(&values),
//!         SessionEvent::Error(e) => eprintln!("decode error: {}", e),
//!     }
//! }
//! ```

mod error;
mod session;
mod transport;

pub use error::*;
pub use session::*;
pub use transport::*;
