//! Wire packet types for the serial protocol.

mod codec;
pub use codec::FrameCodec;

use crate::error::MalformedHeader;
use crate::guid::Guid;

/// The start-of-text sentinel byte that opens every packet.
pub const START_SENTINEL: u8 = 0x02;

/// The end-of-text sentinel byte that closes every packet.
pub const FOOTER_SENTINEL: u8 = 0x03;

/// `sentinel(1) + command(1) + guid(16) + number(2) + count(2) + body_len(4) + outcome(1)`.
pub const HEADER_LEN: usize = 1 + 1 + 16 + 2 + 2 + 4 + 1;

/// A single trailing sentinel byte.
pub const FOOTER_LEN: usize = 1;

/// The five wire-level command codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Command {
	Ack,
	Command,
	Received,
	AuthResponse,
	Response,
}

impl Command {
	pub(crate) fn to_byte(self) -> u8 {
		match self {
			Self::Ack => 0,
			Self::Command => 1,
			Self::Received => 2,
			Self::AuthResponse => 3,
			Self::Response => 4,
		}
	}

	pub(crate) fn from_byte(byte: u8) -> Result<Self, MalformedHeader> {
		match byte {
			0 => Ok(Self::Ack),
			1 => Ok(Self::Command),
			2 => Ok(Self::Received),
			3 => Ok(Self::AuthResponse),
			4 => Ok(Self::Response),
			actual => Err(MalformedHeader::UnknownCommand { actual }),
		}
	}
}

/// The outcome carried by a [`Command::Response`] packet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Outcome {
	Success,
	Error,
}

impl Outcome {
	pub(crate) fn to_byte(self) -> u8 {
		match self {
			Self::Success => 1,
			Self::Error => 2,
		}
	}

	pub(crate) fn from_byte(byte: u8) -> Option<Self> {
		match byte {
			1 => Some(Self::Success),
			2 => Some(Self::Error),
			_ => None,
		}
	}
}

/// A single logical packet, possibly the result of reassembling several
/// wire fragments (in which case `number == count == 1`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Packet {
	pub guid: Guid,
	pub command: Command,
	pub number: u16,
	pub count: u16,
	pub body: Vec<u8>,
	pub outcome: Option<Outcome>,
}

impl Packet {
	/// True if this packet is not part of a multi-fragment message.
	pub fn is_single_packet(&self) -> bool {
		self.count == 1
	}

	/// Build a loopback `Ack` in response to `Ack(guid)`.
	pub fn ack(guid: Guid) -> Self {
		Self {
			guid,
			command: Command::Ack,
			number: 1,
			count: 1,
			body: Vec::new(),
			outcome: None,
		}
	}

	/// Build a per-fragment or whole-message `Received` acknowledgement.
	///
	/// `number` and `count` identify the fragment being acknowledged, not
	/// this packet's own (always single) framing position.
	pub fn received(guid: Guid, number: u16, count: u16, lost: bool) -> Self {
		let mut body = Vec::with_capacity(5);
		body.extend_from_slice(&number.to_le_bytes());
		body.extend_from_slice(&count.to_le_bytes());
		body.push(lost as u8);
		Self {
			guid,
			command: Command::Received,
			number: 1,
			count: 1,
			body,
			outcome: None,
		}
	}

	/// Parse the `(number, count, lost)` triple out of a [`Command::Received`] packet's body.
	pub fn received_fragment(&self) -> Option<(u16, u16, bool)> {
		if self.command != Command::Received || self.body.len() < 5 {
			return None;
		}
		let number = u16::from_le_bytes([self.body[0], self.body[1]]);
		let count = u16::from_le_bytes([self.body[2], self.body[3]]);
		let lost = self.body[4] != 0;
		Some((number, count, lost))
	}

	/// Build an `AuthResponse(guid)`: "I am back, give me the answer you are holding."
	pub fn auth_response(guid: Guid) -> Self {
		Self {
			guid,
			command: Command::AuthResponse,
			number: 1,
			count: 1,
			body: Vec::new(),
			outcome: None,
		}
	}

	/// Build a final `Response(guid, outcome, body)`.
	pub fn response(guid: Guid, outcome: Outcome, body: Vec<u8>) -> Self {
		Self {
			guid,
			command: Command::Response,
			number: 1,
			count: 1,
			body,
			outcome: Some(outcome),
		}
	}
}

/// The fixed-width fields parsed out of a packet header, before the body is available.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Header {
	pub guid: Guid,
	pub command: Command,
	pub number: u16,
	pub count: u16,
	pub body_len: u32,
	pub outcome: Option<Outcome>,
}

impl Header {
	/// Total number of bytes this packet occupies on the wire, header through footer.
	pub fn total_len(&self) -> usize {
		HEADER_LEN + self.body_len as usize + FOOTER_LEN
	}
}
