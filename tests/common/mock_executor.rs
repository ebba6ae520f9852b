use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serline::command::CommandRequest;
use serline::executor::{CommandExecutor, Execution, OutputSink};
use serline::guid::Guid;
use serline::packet::{Outcome, Packet};

/// A [`CommandExecutor`] a test drives by hand: [`Self::spawn`] records the
/// request and hands back a handle that stays "running" until the test calls
/// [`Self::complete`] for that guid, mirroring a real executor's child
/// process finishing on its own schedule.
#[derive(Default)]
pub struct MockExecutor {
	pub spawned: Mutex<Vec<CommandRequest>>,
	handles: Mutex<HashMap<Guid, Arc<Mutex<Option<Packet>>>>>,
}

impl MockExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Mark the execution for `guid` finished with the given outcome.
	pub fn complete(&self, guid: Guid, outcome: Outcome, body: Vec<u8>) {
		let handles = self.handles.lock().unwrap();
		let slot = handles.get(&guid).expect("complete() called for a guid that was never spawned");
		*slot.lock().unwrap() = Some(Packet::response(guid, outcome, body));
	}
}

impl CommandExecutor for MockExecutor {
	fn spawn(&self, request: CommandRequest, _timeout: Duration, _sink: OutputSink) -> Box<dyn Execution> {
		let slot = Arc::new(Mutex::new(None));
		self.handles.lock().unwrap().insert(request.guid, slot.clone());
		self.spawned.lock().unwrap().push(request);
		Box::new(TestExecution { slot })
	}
}

struct TestExecution {
	slot: Arc<Mutex<Option<Packet>>>,
}

impl Execution for TestExecution {
	fn is_running(&self) -> bool {
		self.slot.lock().unwrap().is_none()
	}

	fn response_packet(&self) -> Packet {
		self.slot.lock().unwrap().clone().expect("response_packet called while still running")
	}
}
