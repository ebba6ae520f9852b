//! Chunked, retrying writer for outbound packets.

use crate::error::WriteError;
use crate::packet::{FrameCodec, Packet};
use crate::serial_device::SerialDevice;

/// Bytes written to the device per chunk.
const CHUNK_SIZE: usize = 8 * 1024;

/// Encodes and writes packets to a [`SerialDevice`] in fixed-size chunks,
/// retrying a chunk on a short write.
///
/// Stateless: like [`FrameCodec`], a `Writer` carries no data of its own.
/// Serialization (at most one thread writing at a time) is the caller's
/// responsibility; in this crate that caller is always the engine thread.
pub struct Writer;

impl Writer {
	/// Encode `packet` and write it to `device`, chunk by chunk.
	///
	/// There is no retry cap on a given chunk: the protocol layer above is
	/// responsible for overall liveness, per the spec.
	pub fn write<D: SerialDevice>(device: &mut D, packet: &Packet) -> Result<(), WriteError<D::Error>> {
		let raw = FrameCodec::encode(packet);

		if raw.iter().any(|&byte| byte == 0xFF) {
			trace!("packet for guid {} contains a telnet IAC byte", packet.guid);
		}

		debug!("sending {:?} packet for guid {} ({} bytes)", packet.command, packet.guid, raw.len());

		let mut offset = 0;
		while offset < raw.len() {
			let end = (offset + CHUNK_SIZE).min(raw.len());
			let chunk = &raw[offset..end];

			let mut sent = 0;
			while sent < chunk.len() {
				let written = device.write(&chunk[sent..]).map_err(WriteError)?;
				if written == 0 {
					warn!("short write to serial device: 0 of {} bytes, retrying", chunk.len() - sent);
					continue;
				}
				sent += written;
			}

			offset = end;
		}

		Ok(())
	}
}
