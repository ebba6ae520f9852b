//! Byte-exact encode/decode of a single packet.
//!
//! `FrameCodec` is purely a function of the buffer it is given; it carries
//! no state of its own; all state (the growing read buffer, the in-progress
//! reassembly map) lives in [`crate::reader::Reader`] and [`crate::reassembly::ReassemblyPool`].

use super::{Command, Header, Outcome, FOOTER_LEN, FOOTER_SENTINEL, HEADER_LEN, START_SENTINEL};
use crate::error::{MalformedBody, MalformedHeader};
use crate::guid::Guid;
use crate::packet::Packet;

/// Byte-exact encode/decode of a single packet against a growing buffer.
pub struct FrameCodec;

impl FrameCodec {
	/// True if `buffer` is at least long enough to hold a header and starts with the sentinel.
	pub fn has_header(buffer: &[u8]) -> bool {
		buffer.len() >= HEADER_LEN && buffer[0] == START_SENTINEL
	}

	/// Parse the fixed-width header fields out of `buffer`.
	///
	/// Callers must have already checked [`Self::has_header`]. Fails if the
	/// command byte is unknown, `number` is zero or greater than `count`, or
	/// `count` is zero.
	pub(crate) fn extract_header(buffer: &[u8]) -> Result<Header, MalformedHeader> {
		debug_assert!(buffer.len() >= HEADER_LEN);

		let command = Command::from_byte(buffer[1])?;

		let mut guid_bytes = [0u8; 16];
		guid_bytes.copy_from_slice(&buffer[2..18]);
		let guid = Guid::from_bytes(guid_bytes);

		let number = u16::from_le_bytes([buffer[18], buffer[19]]);
		let count = u16::from_le_bytes([buffer[20], buffer[21]]);
		let body_len = u32::from_le_bytes([buffer[22], buffer[23], buffer[24], buffer[25]]);
		let outcome = Outcome::from_byte(buffer[26]);

		if count == 0 {
			return Err(MalformedHeader::ZeroFragmentCount);
		}
		if number == 0 || number > count {
			return Err(MalformedHeader::BadFragmentIndex { number, count });
		}
		if (body_len as usize).checked_add(HEADER_LEN + FOOTER_LEN).is_none() {
			return Err(MalformedHeader::BodyTooLong { len: body_len as usize });
		}

		Ok(Header {
			guid,
			command,
			number,
			count,
			body_len,
			outcome,
		})
	}

	/// True if `buffer` holds a full header whose declared body is present and
	/// whose footer sentinel is exactly where it should be.
	pub(crate) fn has_header_and_footer(buffer: &[u8], header: &Header) -> bool {
		let total = header.total_len();
		buffer.len() >= total && buffer[total - FOOTER_LEN] == FOOTER_SENTINEL
	}

	/// Decode a full packet out of the front of `buffer`.
	///
	/// Returns the packet and the number of bytes it consumed. Callers must
	/// have already checked [`Self::has_header_and_footer`] against the same
	/// header; this only re-validates the footer position, matching the
	/// spec's split between "malformed header" and "malformed body" errors.
	pub(crate) fn decode(buffer: &[u8], header: &Header) -> Result<(Packet, usize), MalformedBody> {
		let total = header.total_len();
		let footer_pos = total - FOOTER_LEN;
		if buffer.len() < total || buffer[footer_pos] != FOOTER_SENTINEL {
			return Err(MalformedBody { expected_footer_at: footer_pos });
		}

		let body = buffer[HEADER_LEN..footer_pos].to_vec();
		let packet = Packet {
			guid: header.guid,
			command: header.command,
			number: header.number,
			count: header.count,
			body,
			outcome: header.outcome,
		};
		Ok((packet, total))
	}

	/// Encode `packet` to its on-wire byte representation.
	pub fn encode(packet: &Packet) -> Vec<u8> {
		let mut buffer = Vec::with_capacity(HEADER_LEN + packet.body.len() + FOOTER_LEN);
		buffer.push(START_SENTINEL);
		buffer.push(packet.command.to_byte());
		buffer.extend_from_slice(packet.guid.as_bytes());
		buffer.extend_from_slice(&packet.number.to_le_bytes());
		buffer.extend_from_slice(&packet.count.to_le_bytes());
		buffer.extend_from_slice(&(packet.body.len() as u32).to_le_bytes());
		buffer.push(packet.outcome.map(Outcome::to_byte).unwrap_or(0));
		buffer.extend_from_slice(&packet.body);
		buffer.push(FOOTER_SENTINEL);
		buffer
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::packet::Outcome;
	use assert2::assert;

	fn guid(byte: u8) -> Guid {
		Guid::from_bytes([byte; 16])
	}

	#[test]
	fn round_trips_ack() {
		let packet = Packet::ack(guid(1));
		let encoded = FrameCodec::encode(&packet);
		assert!(FrameCodec::has_header(&encoded));
		let header = FrameCodec::extract_header(&encoded).unwrap();
		assert!(FrameCodec::has_header_and_footer(&encoded, &header));
		let (decoded, consumed) = FrameCodec::decode(&encoded, &header).unwrap();
		assert!(consumed == encoded.len());
		assert!(decoded == packet);
	}

	#[test]
	fn round_trips_response_with_body() {
		let packet = Packet::response(guid(2), Outcome::Error, b"boom".to_vec());
		let encoded = FrameCodec::encode(&packet);
		let header = FrameCodec::extract_header(&encoded).unwrap();
		let (decoded, _) = FrameCodec::decode(&encoded, &header).unwrap();
		assert!(decoded == packet);
		assert!(decoded.outcome == Some(Outcome::Error));
	}

	#[test]
	fn round_trips_fragment() {
		let packet = Packet {
			guid: guid(3),
			command: Command::Command,
			number: 2,
			count: 3,
			body: b"fragment body".to_vec(),
			outcome: None,
		};
		let encoded = FrameCodec::encode(&packet);
		let header = FrameCodec::extract_header(&encoded).unwrap();
		let (decoded, _) = FrameCodec::decode(&encoded, &header).unwrap();
		assert!(decoded == packet);
		assert!(!decoded.is_single_packet());
	}

	#[test]
	fn rejects_unknown_command() {
		let mut encoded = FrameCodec::encode(&Packet::ack(guid(4)));
		encoded[1] = 0xEE;
		assert!(matches!(FrameCodec::extract_header(&encoded), Err(MalformedHeader::UnknownCommand { actual: 0xEE })));
	}

	#[test]
	fn rejects_zero_count() {
		let mut encoded = FrameCodec::encode(&Packet::ack(guid(5)));
		encoded[20] = 0;
		encoded[21] = 0;
		assert!(matches!(FrameCodec::extract_header(&encoded), Err(MalformedHeader::ZeroFragmentCount)));
	}

	#[test]
	fn rejects_number_greater_than_count() {
		let mut encoded = FrameCodec::encode(&Packet::ack(guid(6)));
		// number = 5, count stays 1
		encoded[18] = 5;
		encoded[19] = 0;
		assert!(matches!(
			FrameCodec::extract_header(&encoded),
			Err(MalformedHeader::BadFragmentIndex { number: 5, count: 1 })
		));
	}

	#[test]
	fn rejects_bad_footer() {
		let mut encoded = FrameCodec::encode(&Packet::ack(guid(7)));
		let last = encoded.len() - 1;
		encoded[last] = 0x00;
		let header = FrameCodec::extract_header(&encoded).unwrap();
		assert!(!FrameCodec::has_header_and_footer(&encoded, &header));
		assert!(FrameCodec::decode(&encoded, &header).is_err());
	}

	#[test]
	fn has_header_requires_sentinel() {
		let junk = vec![0xAA; HEADER_LEN + 4];
		assert!(!FrameCodec::has_header(&junk));
	}
}
