use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serline::{Engine, RestartJournal, SerialConfig, Serial2Device};

mod executor;
mod logging;
mod options;

use executor::ShellCommandExecutor;
use options::Options;

fn main() {
	let options = Options::parse();
	logging::init(env!("CARGO_CRATE_NAME"), options.verbose);

	if let Err(()) = do_main(options) {
		std::process::exit(1);
	}
}

fn do_main(options: Options) -> Result<(), ()> {
	let config = SerialConfig {
		port: options.serial_port.to_string_lossy().into_owned(),
		baud_rate: options.baud_rate,
		byte_size: options.byte_size.into(),
		parity: options.parity.into(),
		stop_bits: options.stop_bits.into(),
	};

	let device = Serial2Device::open(&config)
		.map_err(|e| log::error!("failed to open serial port {}: {}", options.serial_port.display(), e))?;

	std::fs::create_dir_all(&options.root_dir)
		.map_err(|e| log::error!("failed to create root directory {}: {}", options.root_dir.display(), e))?;

	let restart_journal = RestartJournal::new(&options.root_dir);
	let executor: Arc<dyn serline::executor::CommandExecutor> = Arc::new(ShellCommandExecutor);
	let mut engine = Engine::new(
		device,
		executor,
		Duration::from_secs(options.command_timeout),
		options.root_dir.clone(),
		restart_journal,
	);

	log::info!(
		"serline agent listening on {} at {} baud, root dir {}",
		options.serial_port.display(),
		options.baud_rate,
		options.root_dir.display(),
	);

	let stopflag = AtomicBool::new(false);
	engine.run(&stopflag);
	Ok(())
}
