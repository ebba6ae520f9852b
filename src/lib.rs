//! A bidirectional, packet-framed protocol engine for controlling a managed
//! node over a serial (RS-232) link from a supervising host.
//!
//! The engine handles byte-level framing, header validation, multi-fragment
//! reassembly and acknowledgement, and a dispatch loop that pairs inbound
//! command requests with concurrent local executions -- including a
//! crash/restart-resume handshake that guarantees a pending response
//! survives the agent's own restart. It knows nothing about how commands are
//! actually executed, or what kind of serial device it is talking to beyond
//! the [`SerialDevice`] contract: both are supplied by the embedder.

#[macro_use]
mod log;

pub mod command;
pub mod error;
pub mod executor;
pub mod guid;
pub mod packet;
pub mod reader;
pub mod reassembly;

mod clock;
mod engine;
mod restart_journal;
mod serial_device;
mod writer;

pub use clock::{Clock, SystemClock};
pub use engine::Engine;
pub use restart_journal::RestartJournal;
pub use serial_device::{ByteSize, Parity, SerialConfig, SerialDevice, StopBits};
pub use writer::Writer;

#[cfg(feature = "serial2-device")]
pub use serial_device::Serial2Device;
