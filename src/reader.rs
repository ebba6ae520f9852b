//! Byte-level state machine that turns a stream of serial bytes into whole
//! logical packets, with resync on framing errors and a logic timeout on
//! stalled bodies.

use std::time::Duration;

use crate::clock::Clock;
use crate::error::ReadError;
use crate::packet::{FrameCodec, Packet, START_SENTINEL};
use crate::reassembly::ReassemblyPool;
use crate::serial_device::SerialDevice;
use crate::writer::Writer;

/// Maximum bytes the reader requests per device read.
pub const SERIAL_MIN_READ: usize = 100_000;

/// Maximum wall-clock interval a valid header may remain unsatisfied by its body.
pub const LOGIC_TIMEOUT: i64 = 30;

/// Byte budget for a single resync scan.
const RESYNC_SCAN_CAP: usize = 5000;

/// Per-call bound on a single device read, independent of the caller's
/// overall `read_one` timeout.
const DEVICE_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Pulls bytes from a [`SerialDevice`], advances the resync/reassembly state
/// machine, and emits whole logical packets.
pub struct Reader {
	buffer: Vec<u8>,
	scratch: Vec<u8>,
	pool: ReassemblyPool,
	/// Set when a syntactically valid header is sitting unsatisfied at the
	/// front of the buffer; cleared whenever the buffer has no header, or a
	/// packet is fully consumed, or a resync discards bytes.
	logic_timer: Option<i64>,
}

impl Default for Reader {
	fn default() -> Self {
		Self::new()
	}
}

impl Reader {
	pub fn new() -> Self {
		Self {
			buffer: Vec::new(),
			scratch: vec![0u8; SERIAL_MIN_READ],
			pool: ReassemblyPool::new(),
			logic_timer: None,
		}
	}

	/// Read bytes until one full logical packet has been extracted, the
	/// wall-clock deadline (`timeout` from now) is reached, or the clock
	/// fails.
	///
	/// May transmit `Received` acknowledgements (per-fragment, or
	/// speculative on logic timeout) through `device` via [`Writer`] before
	/// returning.
	pub fn read_one<D: SerialDevice, C: Clock>(
		&mut self,
		device: &mut D,
		clock: &C,
		timeout: Duration,
	) -> Result<Option<Packet>, ReadError<D::Error>> {
		let start = clock.now();
		if start < 0 {
			return Ok(None);
		}
		let timeout_secs = timeout.as_secs() as i64;

		loop {
			let now = clock.now();
			if now < 0 {
				return Ok(None);
			}
			if timeout_secs != 0 && now - start > timeout_secs {
				return Ok(None);
			}

			if !self.buffer.is_empty() && self.buffer[0] != START_SENTINEL {
				debug!("discarding leading garbage byte(s), no start sentinel at front of buffer");
				self.resync();
				self.logic_timer = None;
				continue;
			}

			if !FrameCodec::has_header(&self.buffer) {
				self.logic_timer = None;
				self.pull_bytes(device)?;
				continue;
			}

			let header = match FrameCodec::extract_header(&self.buffer) {
				Ok(header) => header,
				Err(reason) => {
					debug!("malformed header ({}), resyncing", reason);
					self.resync();
					continue;
				},
			};

			if self.logic_timer.is_none() {
				self.logic_timer = Some(now);
			} else if now - self.logic_timer.unwrap() > LOGIC_TIMEOUT {
				debug!("logic timeout waiting for body of guid {}", header.guid);
				let lost = Packet::received(header.guid, header.number, header.count, true);
				Writer::write(device, &lost).map_err(|e| ReadError::Device(e.0))?;
				self.buffer.drain(..1);
				self.logic_timer = None;
				continue;
			}

			if !FrameCodec::has_header_and_footer(&self.buffer, &header) {
				self.pull_bytes(device)?;
				continue;
			}

			let (packet, consumed) = match FrameCodec::decode(&self.buffer, &header) {
				Ok(pair) => pair,
				Err(reason) => {
					debug!("malformed body ({}), resyncing", reason);
					self.buffer.drain(..1);
					continue;
				},
			};
			self.buffer.drain(..consumed);
			self.logic_timer = None;

			if packet.is_single_packet() {
				return Ok(Some(packet));
			}

			let guid = packet.guid;
			let number = packet.number;
			let count = packet.count;
			self.pool.add(packet);

			if self.pool.has_all(guid, count) {
				let full = self.pool.take_full(guid);
				self.pool.remove(guid);
				return Ok(Some(full));
			}

			let ack = Packet::received(guid, number, count, false);
			Writer::write(device, &ack).map_err(|e| ReadError::Device(e.0))?;
		}
	}

	fn resync(&mut self) {
		let mut skip = 1;
		while skip < self.buffer.len() && skip < RESYNC_SCAN_CAP && self.buffer[skip] != START_SENTINEL {
			skip += 1;
		}
		debug!("resync: discarding {} byte(s)", skip);
		self.buffer.drain(..skip);
	}

	fn pull_bytes<D: SerialDevice>(&mut self, device: &mut D) -> Result<(), ReadError<D::Error>> {
		let n = device.read(&mut self.scratch, DEVICE_POLL_TIMEOUT).map_err(ReadError::Device)?;
		if n > 0 {
			self.buffer.extend_from_slice(&self.scratch[..n]);
		}
		Ok(())
	}
}
