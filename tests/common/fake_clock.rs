use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serline::Clock;

/// A manually driven [`Clock`] for deterministic tests of the logic timeout
/// and read deadline. Cloning shares the same underlying counter, so a test
/// and a [`super::MockSerialDevice`] configured to auto-advance it observe
/// the same notion of "now".
#[derive(Clone)]
pub struct FakeClock(Arc<AtomicI64>);

impl FakeClock {
	pub fn new(start: i64) -> Self {
		Self(Arc::new(AtomicI64::new(start)))
	}

	/// Move the clock forward by `secs` and return the new value.
	pub fn advance(&self, secs: i64) -> i64 {
		self.0.fetch_add(secs, Ordering::SeqCst) + secs
	}

	/// Make every subsequent `now()` report clock failure.
	pub fn fail(&self) {
		self.0.store(-1, Ordering::SeqCst);
	}
}

impl Clock for FakeClock {
	fn now(&self) -> i64 {
		self.0.load(Ordering::SeqCst)
	}
}
