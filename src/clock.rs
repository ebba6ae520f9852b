//! Monotonic wall-clock abstraction used by the reader's logic timeout.

/// Monotonic wall-clock seconds.
///
/// `now()` returning `-1` indicates clock failure; [`crate::reader::Reader`]
/// treats that as a reason to short-circuit and return `None` without
/// reading, per the spec's error handling table.
pub trait Clock {
	fn now(&self) -> i64;
}

/// A [`Clock`] backed by [`std::time::SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> i64 {
		match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
			Ok(duration) => duration.as_secs() as i64,
			Err(_) => -1,
		}
	}
}
