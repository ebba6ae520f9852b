//! Top-level dispatch loop: reads packets, reacts per command type, and
//! manages the command queue, in-flight executions, and the deferred-send
//! output queue.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::command::{parse_command_body, CommandRequest};
use crate::executor::{CommandExecutor, Execution, OutputSink, SyntheticExecution};
use crate::guid::Guid;
use crate::packet::{Command, Outcome, Packet};
use crate::reader::Reader;
use crate::restart_journal::RestartJournal;
use crate::serial_device::SerialDevice;
use crate::writer::Writer;

/// Reader poll timeout for each main-loop tick.
const TICK_TIMEOUT: Duration = Duration::from_secs(1);

/// Top-level dispatch loop over an open [`SerialDevice`].
///
/// Owns the device, the reassembly-aware [`Reader`], the command queue, the
/// map of in-flight executions, and the deferred-send output queue. The
/// device must already be open and configured; opening it is the caller's
/// responsibility, since a failure to open is the one error in this whole
/// system that is fatal (see the crate-level docs).
pub struct Engine<D: SerialDevice, C: Clock = SystemClock> {
	device: D,
	clock: C,
	reader: Reader,
	executor: Arc<dyn CommandExecutor>,
	command_timeout: Duration,
	attachment_dir: PathBuf,
	restart_journal: RestartJournal,
	output_sink: OutputSink,
	command_queue: VecDeque<CommandRequest>,
	thread_map: HashMap<Guid, Box<dyn Execution>>,
	/// Guid of the blocking execution currently occupying `thread_map`, if
	/// any. While set, nothing else may be spawned: neither another blocking
	/// command (only one may run at a time) nor a non-blocking one (it must
	/// not run concurrently with a blocking command either).
	blocking_in_flight: Option<Guid>,
}

impl<D: SerialDevice> Engine<D, SystemClock> {
	/// Build an engine with the real system clock.
	pub fn new(
		device: D,
		executor: Arc<dyn CommandExecutor>,
		command_timeout: Duration,
		attachment_dir: PathBuf,
		restart_journal: RestartJournal,
	) -> Self {
		Self::with_clock(device, SystemClock, executor, command_timeout, attachment_dir, restart_journal)
	}
}

impl<D: SerialDevice, C: Clock> Engine<D, C> {
	/// Build an engine with an injectable [`Clock`], for deterministic tests
	/// of the logic timeout.
	pub fn with_clock(
		device: D,
		clock: C,
		executor: Arc<dyn CommandExecutor>,
		command_timeout: Duration,
		attachment_dir: PathBuf,
		restart_journal: RestartJournal,
	) -> Self {
		Self {
			device,
			clock,
			reader: Reader::new(),
			executor,
			command_timeout,
			attachment_dir,
			restart_journal,
			output_sink: OutputSink::new(),
			command_queue: VecDeque::new(),
			thread_map: HashMap::new(),
			blocking_in_flight: None,
		}
	}

	/// Run the main loop until `stopflag` is set, completing the current
	/// iteration (including draining pending output) before returning.
	pub fn run(&mut self, stopflag: &AtomicBool) {
		self.resume_from_restart();

		while !stopflag.load(Ordering::Relaxed) {
			self.tick();
		}
	}

	/// Run exactly one iteration of the main loop. Exposed for tests that
	/// need to observe engine state between ticks.
	pub fn tick(&mut self) {
		match self.reader.read_one(&mut self.device, &self.clock, TICK_TIMEOUT) {
			Ok(Some(packet)) => self.react(packet),
			Ok(None) => {},
			Err(e) => warn!("reader error, will retry next tick: {}", e),
		}

		for packet in self.output_sink.drain() {
			self.send(&packet);
		}

		self.reconcile_blocking();
		self.drain_command_queue();
	}

	fn resume_from_restart(&mut self) {
		let Some(guid) = self.restart_journal.consume() else { return };
		info!("resuming after restart, response owed for guid {}", guid);
		self.send(&Packet::auth_response(guid));
		let response = Packet::response(guid, Outcome::Success, Vec::new());
		self.thread_map.insert(guid, Box::new(SyntheticExecution::new(response)));
	}

	fn is_idle(&self) -> bool {
		self.thread_map.values().all(|execution| !execution.is_running())
	}

	fn react(&mut self, packet: Packet) {
		debug!("{:?} received (guid {})", packet.command, packet.guid);
		match packet.command {
			Command::Ack => self.send(&Packet::ack(packet.guid)),
			Command::Received => {},
			Command::Response => {},
			Command::AuthResponse => self.process_auth_response(packet),
			Command::Command => self.process_command(packet),
		}
	}

	fn process_command(&mut self, packet: Packet) {
		match parse_command_body(&packet.body, packet.guid, &self.attachment_dir) {
			Ok(request) => {
				self.send(&Packet::received(packet.guid, 1, 1, false));
				self.command_queue.push_back(request);
			},
			Err(reason) => {
				warn!("malformed command body for guid {}: {}", packet.guid, reason);
				self.send(&Packet::auth_response(packet.guid));
				let response = Packet::response(packet.guid, Outcome::Error, Vec::new());
				self.thread_map.insert(packet.guid, Box::new(SyntheticExecution::new(response)));
			},
		}
	}

	fn process_auth_response(&mut self, packet: Packet) {
		match self.thread_map.remove(&packet.guid) {
			Some(execution) => self.send(&execution.response_packet()),
			None => {
				warn!("AuthResponse for unknown guid {}", packet.guid);
				self.send(&Packet::response(packet.guid, Outcome::Error, Vec::new()));
			},
		}
	}

	/// Clear `blocking_in_flight` once the blocking execution it names has
	/// stopped running, reopening the queue to the command behind it.
	fn reconcile_blocking(&mut self) {
		if let Some(guid) = self.blocking_in_flight {
			let still_running = self.thread_map.get(&guid).map(|execution| execution.is_running()).unwrap_or(false);
			if !still_running {
				debug!("blocking command {} finished, resuming normal scheduling", guid);
				self.blocking_in_flight = None;
			}
		}
	}

	/// Spawn as many queued commands as the blocking-exclusivity rule
	/// allows: nothing starts while a blocking command is in flight; a
	/// blocking command itself only starts once nothing else is running.
	fn drain_command_queue(&mut self) {
		while self.blocking_in_flight.is_none() {
			let Some(front) = self.command_queue.front() else { break };
			if front.is_blocking() {
				if !self.is_idle() {
					debug!("blocking command {} waiting for other executions to finish", front.guid);
					break;
				}
				let request = self.command_queue.pop_front().expect("front just checked");
				debug!("spawning blocking command {}", request.guid);
				self.spawn_command(request);
				break;
			} else {
				let request = self.command_queue.pop_front().expect("front just checked");
				self.spawn_command(request);
			}
		}
	}

	fn spawn_command(&mut self, request: CommandRequest) {
		let guid = request.guid;
		let blocking = request.is_blocking();
		if blocking {
			if let Err(e) = self.restart_journal.write(guid) {
				warn!("failed to persist restart journal before blocking command: {}", e);
			}
			self.blocking_in_flight = Some(guid);
		}

		info!("spawning command {:?} (guid {})", request.command_string, guid);
		let handle = self.executor.spawn(request, self.command_timeout, self.output_sink.clone());
		self.thread_map.insert(guid, handle);
	}

	fn send(&mut self, packet: &Packet) {
		if let Err(e) = Writer::write(&mut self.device, packet) {
			warn!("failed to send {:?} packet for guid {}: {}", packet.command, packet.guid, e);
		}
	}
}
