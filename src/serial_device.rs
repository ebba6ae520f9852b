//! The [`SerialDevice`] trait is the abstract, byte-oriented transport the
//! engine speaks over. The engine never assumes anything about the concrete
//! transport beyond this contract.

use core::time::Duration;

/// Byte-oriented, bidirectional serial transport.
///
/// Implementors must configure the line themselves (baud rate, byte size,
/// parity, stop bits); the trait only exposes the read/write surface the
/// engine needs.
pub trait SerialDevice {
	type Error: core::fmt::Debug + core::fmt::Display;

	/// Read up to `buffer.len()` bytes, blocking for at most `timeout`.
	///
	/// May return fewer bytes than requested, including zero on timeout.
	/// Must never block indefinitely past `timeout`.
	fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, Self::Error>;

	/// Write as many bytes of `buffer` as the device currently accepts.
	///
	/// May perform a short write; must never block indefinitely.
	fn write(&mut self, buffer: &[u8]) -> Result<usize, Self::Error>;
}

/// Character size, in bits, for an RS-232 line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ByteSize {
	Five,
	Six,
	Seven,
	Eight,
}

/// Parity mode for an RS-232 line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Parity {
	None,
	Odd,
	Even,
}

/// Stop bit count for an RS-232 line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StopBits {
	One,
	Two,
}

/// Parameters used to open a [`SerialDevice`].
#[derive(Debug, Clone)]
pub struct SerialConfig {
	pub port: String,
	pub baud_rate: u32,
	pub byte_size: ByteSize,
	pub parity: Parity,
	pub stop_bits: StopBits,
}

#[cfg(feature = "serial2-device")]
mod serial2_device {
	use super::{ByteSize, Parity, SerialConfig, SerialDevice, StopBits};
	use core::time::Duration;

	/// [`SerialDevice`] adapter backed by the `serial2` crate.
	pub struct Serial2Device {
		port: serial2::SerialPort,
	}

	impl Serial2Device {
		/// Open and configure a real serial port per `config`.
		pub fn open(config: &SerialConfig) -> std::io::Result<Self> {
			let port = serial2::SerialPort::open(&config.port, |mut settings: serial2::Settings| {
				settings.set_baud_rate(config.baud_rate)?;
				settings.set_char_size(match config.byte_size {
					ByteSize::Five => serial2::CharSize::Bits5,
					ByteSize::Six => serial2::CharSize::Bits6,
					ByteSize::Seven => serial2::CharSize::Bits7,
					ByteSize::Eight => serial2::CharSize::Bits8,
				});
				settings.set_parity(match config.parity {
					Parity::None => serial2::Parity::None,
					Parity::Odd => serial2::Parity::Odd,
					Parity::Even => serial2::Parity::Even,
				});
				settings.set_stop_bits(match config.stop_bits {
					StopBits::One => serial2::StopBits::One,
					StopBits::Two => serial2::StopBits::Two,
				});
				Ok(settings)
			})?;
			Ok(Self { port })
		}
	}

	impl SerialDevice for Serial2Device {
		type Error = std::io::Error;

		fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, Self::Error> {
			self.port.set_read_timeout(timeout)?;
			match self.port.read(buffer) {
				Ok(n) => Ok(n),
				Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
				Err(e) => Err(e),
			}
		}

		fn write(&mut self, buffer: &[u8]) -> Result<usize, Self::Error> {
			self.port.write(buffer)
		}
	}
}

#[cfg(feature = "serial2-device")]
pub use serial2_device::Serial2Device;
