use core::fmt;

/// A packet header failed to parse: unknown command byte, `number` out of
/// range with respect to `count`, or a body length that would overflow the
/// buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MalformedHeader {
	/// The first byte was not the start sentinel.
	///
	/// This should never surface to a caller: [`crate::packet::FrameCodec::has_header`]
	/// is meant to be checked first. Kept for defensive callers.
	BadStartSentinel { actual: u8 },

	/// The command byte did not match any of the five known commands.
	UnknownCommand { actual: u8 },

	/// `number` was zero, or greater than `count`.
	BadFragmentIndex { number: u16, count: u16 },

	/// `count` was zero.
	ZeroFragmentCount,

	/// The declared body length would not fit the protocol's length field.
	BodyTooLong { len: usize },
}

impl fmt::Display for MalformedHeader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::BadStartSentinel { actual } => write!(f, "bad start sentinel: {:#04x}", actual),
			Self::UnknownCommand { actual } => write!(f, "unknown command byte: {:#04x}", actual),
			Self::BadFragmentIndex { number, count } => write!(f, "invalid fragment index {} of {}", number, count),
			Self::ZeroFragmentCount => write!(f, "fragment count is zero"),
			Self::BodyTooLong { len } => write!(f, "body length {} exceeds protocol limit", len),
		}
	}
}

impl std::error::Error for MalformedHeader {}

/// A packet body failed to parse: the footer sentinel was not where the
/// header's body length said it would be.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MalformedBody {
	pub expected_footer_at: usize,
}

impl fmt::Display for MalformedBody {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "missing or invalid footer sentinel at offset {}", self.expected_footer_at)
	}
}

impl std::error::Error for MalformedBody {}

/// Error from a [`crate::serial_device::SerialDevice`] read, surfaced by [`crate::reader::Reader`].
#[derive(Debug)]
pub enum ReadError<E> {
	/// The underlying device reported an error.
	Device(E),

	/// [`crate::clock::Clock::now`] reported failure (returned `-1`).
	ClockFailure,
}

impl<E: fmt::Display> fmt::Display for ReadError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Device(e) => write!(f, "serial device read failed: {}", e),
			Self::ClockFailure => write!(f, "clock failure"),
		}
	}
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ReadError<E> {}

/// Error from a [`crate::serial_device::SerialDevice`] write, surfaced by [`crate::writer::Writer`].
#[derive(Debug)]
pub struct WriteError<E>(pub E);

impl<E: fmt::Display> fmt::Display for WriteError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "serial device write failed: {}", self.0)
	}
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for WriteError<E> {}

/// A `Command` packet's body failed to yield a usable [`crate::command::CommandRequest`].
///
/// Never propagated to callers of [`crate::engine::Engine`]: always converted
/// into an `AuthResponse` plus a synthetic error `Response`, per the
/// restart-resume-style error handshake. Kept as a real error type so the
/// parsing logic is independently testable and so failures are logged with
/// a specific reason.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CommandBodyError {
	/// The body was not well-formed XML.
	InvalidXml,

	/// The root element was missing or was not named `command`.
	MissingRootElement,

	/// No `commandString` child element was present.
	MissingCommandString,

	/// A `binaryData` element was present but its text was not valid base64,
	/// or decoded to zero bytes.
	InvalidBinaryData,

	/// The decoded binary attachment could not be persisted to a temporary file.
	AttachmentPersistFailed,
}

impl fmt::Display for CommandBodyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidXml => write!(f, "malformed command XML"),
			Self::MissingRootElement => write!(f, "missing or wrong root element, expected 'command'"),
			Self::MissingCommandString => write!(f, "missing 'commandString' element"),
			Self::InvalidBinaryData => write!(f, "malformed or empty base64 encoded binary data"),
			Self::AttachmentPersistFailed => write!(f, "could not persist decoded attachment to disk"),
		}
	}
}

impl std::error::Error for CommandBodyError {}

/// I/O failure while writing the restart journal.
#[derive(Debug)]
pub struct RestartJournalError(pub std::io::Error);

impl fmt::Display for RestartJournalError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "restart journal I/O failed: {}", self.0)
	}
}

impl std::error::Error for RestartJournalError {}

impl From<std::io::Error> for RestartJournalError {
	fn from(other: std::io::Error) -> Self {
		Self(other)
	}
}
