//! A reference [`CommandExecutor`] that runs each accepted command as a shell
//! command. This is glue, not protocol: embedders with a different notion of
//! "executing a command" supply their own implementation instead.

use std::io::Read;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serline::command::CommandRequest;
use serline::executor::{CommandExecutor, Execution, OutputSink};
use serline::packet::{Outcome, Packet};

pub struct ShellCommandExecutor;

impl CommandExecutor for ShellCommandExecutor {
	fn spawn(&self, request: CommandRequest, timeout: Duration, _sink: OutputSink) -> Box<dyn Execution> {
		let done = Arc::new(Mutex::new(None));
		let slot = done.clone();
		std::thread::spawn(move || {
			let response = run(&request, timeout);
			*slot.lock().unwrap() = Some(response);
		});
		Box::new(ShellExecution { done })
	}
}

struct ShellExecution {
	done: Arc<Mutex<Option<Packet>>>,
}

impl Execution for ShellExecution {
	fn is_running(&self) -> bool {
		self.done.lock().unwrap().is_none()
	}

	fn response_packet(&self) -> Packet {
		self.done.lock().unwrap().clone().expect("response_packet called while still running")
	}
}

fn run(request: &CommandRequest, timeout: Duration) -> Packet {
	let mut command = std::process::Command::new("sh");
	command.arg("-c").arg(&request.command_string);
	command.stdout(Stdio::piped()).stderr(Stdio::piped());
	if let Some(path) = &request.attachment_path {
		command.env("SERLINE_ATTACHMENT", path);
	}

	let mut child = match command.spawn() {
		Ok(child) => child,
		Err(e) => {
			log::warn!("failed to spawn command {:?}: {}", request.command_string, e);
			return Packet::response(request.guid, Outcome::Error, Vec::new());
		},
	};

	// Drain stdout/stderr on their own threads as the child produces them:
	// polling `try_wait()` without doing this deadlocks on any command whose
	// output exceeds the OS pipe buffer, since the child blocks on the write
	// end while nobody reads the other end.
	let stdout_reader = child.stdout.take().map(spawn_drain);
	let stderr_reader = child.stderr.take().map(spawn_drain);

	let start = Instant::now();
	let status = loop {
		match child.try_wait() {
			Ok(Some(status)) => break Some(status),
			Ok(None) => {
				if start.elapsed() >= timeout {
					log::warn!("command {:?} timed out after {:?}, killing", request.command_string, timeout);
					let _ = child.kill();
					let _ = child.wait();
					break None;
				}
				std::thread::sleep(Duration::from_millis(20));
			},
			Err(e) => {
				log::warn!("failed to poll command {:?}: {}", request.command_string, e);
				break None;
			},
		}
	};

	let stdout = stdout_reader.and_then(|reader| reader.join().ok()).unwrap_or_default();
	let _ = stderr_reader.and_then(|reader| reader.join().ok());

	match status {
		Some(status) => {
			let outcome = if status.success() { Outcome::Success } else { Outcome::Error };
			Packet::response(request.guid, outcome, stdout)
		},
		None => Packet::response(request.guid, Outcome::Error, Vec::new()),
	}
}

/// Spawn a thread that reads `pipe` to EOF, so the child never blocks
/// writing to a full pipe buffer while we're busy polling `try_wait()`.
fn spawn_drain<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<Vec<u8>> {
	std::thread::spawn(move || {
		let mut buf = Vec::new();
		let _ = pipe.read_to_end(&mut buf);
		buf
	})
}
