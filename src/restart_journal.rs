//! On-disk record of a pending response GUID that must survive an agent restart.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::RestartJournalError;
use crate::guid::Guid;

const FILE_NAME: &str = "serclient.restart";

/// A single-line file at `<root>/serclient.restart` recording the GUID of a
/// response the agent owes the host across a restart.
pub struct RestartJournal {
	path: PathBuf,
}

impl RestartJournal {
	/// `root_dir` is the directory the journal file lives under.
	pub fn new(root_dir: impl Into<PathBuf>) -> Self {
		Self { path: root_dir.into().join(FILE_NAME) }
	}

	/// Truncate and write `guid` as the journal's sole contents.
	///
	/// Writes to a sibling temporary file and renames it into place so that
	/// a crash during the write can never leave a half-written journal
	/// behind for [`Self::consume`] to misread.
	pub fn write(&self, guid: Guid) -> Result<(), RestartJournalError> {
		let tmp_path = self.path.with_extension("tmp");
		std::fs::write(&tmp_path, guid.to_string())?;
		std::fs::rename(&tmp_path, &self.path)?;
		info!("persisted restart journal for guid {}", guid);
		Ok(())
	}

	/// Read and delete the journal, if present.
	///
	/// Any I/O failure -- including the file simply not existing -- is
	/// treated as "no pending restart" and yields `None`. A present file is
	/// always removed, whether or not its contents parsed as a GUID.
	pub fn consume(&self) -> Option<Guid> {
		let contents = std::fs::read_to_string(&self.path).ok()?;
		let _ = std::fs::remove_file(&self.path);
		let guid = contents.lines().next()?.trim();
		Guid::from_str(guid).ok()
	}
}
