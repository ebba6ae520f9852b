//! The `CommandExecutor` external contract, in-flight execution handles, and
//! the deferred-send output queue executors use to talk back to the engine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::command::CommandRequest;
use crate::packet::Packet;

/// A capability handle to the engine's output queue.
///
/// Executors call [`OutputSink::send_later`] to enqueue a packet for the
/// engine thread to transmit; this is the only engine-owned state an
/// executor may touch, breaking the cyclic reference an executor would
/// otherwise need back into the full engine.
#[derive(Clone)]
pub struct OutputSink {
	queue: Arc<Mutex<VecDeque<Packet>>>,
}

impl OutputSink {
	pub(crate) fn new() -> Self {
		Self { queue: Arc::new(Mutex::new(VecDeque::new())) }
	}

	/// Enqueue `packet` for the engine thread to transmit on its next drain.
	pub fn send_later(&self, packet: Packet) {
		self.queue.lock().unwrap().push_back(packet);
	}

	/// Drain every currently queued packet, holding the lock for the whole drain.
	pub(crate) fn drain(&self) -> Vec<Packet> {
		let mut queue = self.queue.lock().unwrap();
		queue.drain(..).collect()
	}
}

/// A single in-flight or already-finished-but-unresponded command.
///
/// Both a real executor's handle and a synthetic, pre-baked completion
/// (restart-resume, malformed-command error) implement this trait, so
/// `Engine::thread_map` can hold either uniformly.
pub trait Execution: Send {
	/// Whether the underlying work is still running. Always `false` for a
	/// synthetic completion.
	fn is_running(&self) -> bool;

	/// The final response packet. Only meaningful once `is_running()` is `false`.
	fn response_packet(&self) -> Packet;
}

/// A pre-baked completion that was never actually running: the restart-resume
/// response, or the synthetic error response for a malformed command body.
pub struct SyntheticExecution {
	response: Packet,
}

impl SyntheticExecution {
	pub fn new(response: Packet) -> Self {
		Self { response }
	}
}

impl Execution for SyntheticExecution {
	fn is_running(&self) -> bool {
		false
	}

	fn response_packet(&self) -> Packet {
		self.response.clone()
	}
}

/// Constructs and starts executions for accepted [`CommandRequest`]s.
///
/// Concrete command execution (spawning child processes, the software
/// update mechanism) is outside the scope of this crate; this trait is the
/// seam an embedder implements.
pub trait CommandExecutor: Send + Sync {
	/// Start executing `request`. Must return immediately; the returned
	/// handle is polled by the engine via [`Execution::is_running`].
	///
	/// `timeout` is the command's individual deadline: the executor must
	/// surface a [`Packet::response`] (with [`crate::packet::Outcome::Error`]
	/// on timeout) within it.
	fn spawn(&self, request: CommandRequest, timeout: Duration, sink: OutputSink) -> Box<dyn Execution>;
}
