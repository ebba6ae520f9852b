use std::path::PathBuf;

use serline::{ByteSize, Parity, StopBits};

/// Run the serial-line control agent against a host on the other end of an RS-232 link.
#[derive(clap::Parser)]
pub struct Options {
	/// Print more verbose messages. Can be used multiple times.
	#[clap(long, short)]
	#[clap(action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// The serial port to use.
	#[clap(long, short)]
	#[cfg_attr(target_os = "windows", clap(default_value = "COM1"))]
	#[cfg_attr(not(target_os = "windows"), clap(default_value = "/dev/ttyUSB0"))]
	pub serial_port: PathBuf,

	/// The baud rate for the serial port.
	#[clap(long, short)]
	#[clap(default_value = "9600")]
	pub baud_rate: u32,

	/// Character size, in bits, for the serial line.
	#[clap(long)]
	#[clap(default_value = "eight")]
	pub byte_size: ByteSizeArg,

	/// Parity mode for the serial line.
	#[clap(long)]
	#[clap(default_value = "none")]
	pub parity: ParityArg,

	/// Stop bit count for the serial line.
	#[clap(long)]
	#[clap(default_value = "one")]
	pub stop_bits: StopBitsArg,

	/// Directory holding the restart journal and decoded command attachments.
	#[clap(long)]
	pub root_dir: PathBuf,

	/// Per-command timeout, in seconds, passed to every spawned command.
	#[clap(long)]
	#[clap(default_value = "60")]
	pub command_timeout: u64,
}

#[derive(Copy, Clone, clap::ValueEnum)]
pub enum ByteSizeArg {
	Five,
	Six,
	Seven,
	Eight,
}

impl From<ByteSizeArg> for ByteSize {
	fn from(value: ByteSizeArg) -> Self {
		match value {
			ByteSizeArg::Five => Self::Five,
			ByteSizeArg::Six => Self::Six,
			ByteSizeArg::Seven => Self::Seven,
			ByteSizeArg::Eight => Self::Eight,
		}
	}
}

#[derive(Copy, Clone, clap::ValueEnum)]
pub enum ParityArg {
	None,
	Odd,
	Even,
}

impl From<ParityArg> for Parity {
	fn from(value: ParityArg) -> Self {
		match value {
			ParityArg::None => Self::None,
			ParityArg::Odd => Self::Odd,
			ParityArg::Even => Self::Even,
		}
	}
}

#[derive(Copy, Clone, clap::ValueEnum)]
pub enum StopBitsArg {
	One,
	Two,
}

impl From<StopBitsArg> for StopBits {
	fn from(value: StopBitsArg) -> Self {
		match value {
			StopBitsArg::One => Self::One,
			StopBitsArg::Two => Self::Two,
		}
	}
}
