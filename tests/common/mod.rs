pub mod fake_clock;
pub mod mock_executor;
pub mod mock_serial_device;

pub use fake_clock::FakeClock;
pub use mock_executor::MockExecutor;
pub use mock_serial_device::MockSerialDevice;

use std::time::Duration;

use serline::packet::Packet;
use serline::reader::Reader;

/// Replay raw bytes written by an [`serline::Engine`] through a fresh
/// [`Reader`], as the host side of the link would, and collect every whole
/// packet that comes out the other end.
pub fn parse_all_packets(bytes: &[u8]) -> Vec<Packet> {
	let clock = FakeClock::new(0);
	let mut device = MockSerialDevice::new();
	device.auto_advance(clock.clone(), 1);
	device.push_inbound(bytes);

	let mut reader = Reader::new();
	let mut packets = Vec::new();
	while let Some(packet) = reader.read_one(&mut device, &clock, Duration::from_secs(2)).unwrap() {
		packets.push(packet);
	}
	packets
}
