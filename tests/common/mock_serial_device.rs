use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serline::SerialDevice;

use super::FakeClock;

/// An in-memory [`SerialDevice`] backed by plain byte queues: bytes pushed
/// with [`Self::push_inbound`] are what [`SerialDevice::read`] hands back;
/// bytes passed to [`SerialDevice::write`] land in [`Self::take_outbound`].
#[derive(Clone)]
pub struct MockSerialDevice {
	inbound: Arc<Mutex<VecDeque<u8>>>,
	outbound: Arc<Mutex<VecDeque<u8>>>,
	advance_on_empty_read: Option<(FakeClock, i64)>,
}

impl MockSerialDevice {
	pub fn new() -> Self {
		Self {
			inbound: Arc::new(Mutex::new(VecDeque::new())),
			outbound: Arc::new(Mutex::new(VecDeque::new())),
			advance_on_empty_read: None,
		}
	}

	/// Advance `clock` by `secs` every time a read finds nothing to deliver,
	/// simulating wall-clock time passing while the agent waits on the wire.
	pub fn auto_advance(&mut self, clock: FakeClock, secs: i64) {
		self.advance_on_empty_read = Some((clock, secs));
	}

	pub fn push_inbound(&self, bytes: &[u8]) {
		self.inbound.lock().unwrap().extend(bytes.iter().copied());
	}

	pub fn take_outbound(&self) -> Vec<u8> {
		self.outbound.lock().unwrap().drain(..).collect()
	}
}

impl Default for MockSerialDevice {
	fn default() -> Self {
		Self::new()
	}
}

impl SerialDevice for MockSerialDevice {
	type Error = Infallible;

	fn read(&mut self, buffer: &mut [u8], _timeout: Duration) -> Result<usize, Self::Error> {
		let mut inbound = self.inbound.lock().unwrap();
		if inbound.is_empty() {
			if let Some((clock, secs)) = &self.advance_on_empty_read {
				clock.advance(*secs);
			}
			return Ok(0);
		}

		let n = inbound.len().min(buffer.len());
		for slot in buffer.iter_mut().take(n) {
			*slot = inbound.pop_front().unwrap();
		}
		Ok(n)
	}

	fn write(&mut self, buffer: &[u8]) -> Result<usize, Self::Error> {
		self.outbound.lock().unwrap().extend(buffer.iter().copied());
		Ok(buffer.len())
	}
}
