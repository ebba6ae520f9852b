//! Parsing a `Command` packet's XML body into a [`CommandRequest`], and the
//! request queue item itself.

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use quick_xml::events::Event;

use crate::error::CommandBodyError;
use crate::guid::Guid;

/// A request accepted from one `Command` packet, awaiting dispatch to a
/// [`crate::executor::CommandExecutor`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommandRequest {
	pub command_string: String,
	pub guid: Guid,
	/// Path to a decoded binary attachment, if the command carried one.
	pub attachment_path: Option<PathBuf>,
}

impl CommandRequest {
	/// Whether this command must run alone: `restart`, or a software update.
	pub fn is_blocking(&self) -> bool {
		self.command_string == "restart" || self.is_update_software()
	}

	pub fn is_update_software(&self) -> bool {
		self.command_string == "updateSoftware"
	}
}

/// Parse a `Command` packet's XML body.
///
/// Required shape: a root element named `command` containing a
/// `commandString` element and an optional `binaryData` element whose text
/// is base64. Any structural deviation is an error -- never a partial accept.
/// A present-but-empty `binaryData` element is treated as "no attachment",
/// matching the original implementation.
pub fn parse_command_body(body: &[u8], guid: Guid, attachment_dir: &Path) -> Result<CommandRequest, CommandBodyError> {
	let text = std::str::from_utf8(body).map_err(|_| CommandBodyError::InvalidXml)?;
	let mut reader = quick_xml::Reader::from_str(text);
	reader.config_mut().trim_text(true);

	let mut buf = Vec::new();
	let mut root_seen = false;
	let mut current: Option<String> = None;
	let mut command_string: Option<String> = None;
	let mut binary_data: Option<String> = None;

	loop {
		let event = reader.read_event_into(&mut buf).map_err(|_| CommandBodyError::InvalidXml)?;
		match event {
			Event::Eof => break,
			Event::Start(start) => {
				let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
				if !root_seen {
					if name != "command" {
						return Err(CommandBodyError::MissingRootElement);
					}
					root_seen = true;
				} else {
					current = Some(name);
				}
			},
			Event::Empty(start) => {
				let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
				if !root_seen {
					if name != "command" {
						return Err(CommandBodyError::MissingRootElement);
					}
					root_seen = true;
				}
			},
			Event::Text(text) => {
				if let Some(name) = current.as_deref() {
					let text = text.unescape().map_err(|_| CommandBodyError::InvalidXml)?.into_owned();
					match name {
						"commandString" => command_string = Some(text),
						"binaryData" => binary_data = Some(text),
						_ => {},
					}
				}
			},
			Event::End(_) => current = None,
			_ => {},
		}
		buf.clear();
	}

	if !root_seen {
		return Err(CommandBodyError::MissingRootElement);
	}
	let command_string = command_string.ok_or(CommandBodyError::MissingCommandString)?;

	let attachment_path = match binary_data {
		None => None,
		Some(text) if text.trim().is_empty() => None,
		Some(text) => Some(persist_attachment(attachment_dir, &text)?),
	};

	Ok(CommandRequest {
		command_string,
		guid,
		attachment_path,
	})
}

fn persist_attachment(attachment_dir: &Path, base64_text: &str) -> Result<PathBuf, CommandBodyError> {
	let decoded = base64::engine::general_purpose::STANDARD
		.decode(base64_text.trim())
		.map_err(|_| CommandBodyError::InvalidBinaryData)?;
	if decoded.is_empty() {
		return Err(CommandBodyError::InvalidBinaryData);
	}

	let mut file = tempfile::Builder::new()
		.prefix("serline-attachment-")
		.tempfile_in(attachment_dir)
		.map_err(|_| CommandBodyError::AttachmentPersistFailed)?;
	file.write_all(&decoded).map_err(|_| CommandBodyError::AttachmentPersistFailed)?;
	file.flush().map_err(|_| CommandBodyError::AttachmentPersistFailed)?;

	let (_file, path) = file.keep().map_err(|_| CommandBodyError::AttachmentPersistFailed)?;
	Ok(path)
}

#[cfg(test)]
mod test {
	use super::*;
	use assert2::assert;

	fn guid() -> Guid {
		Guid::from_bytes([1; 16])
	}

	#[test]
	fn parses_command_string_only() {
		let dir = tempfile::tempdir().unwrap();
		let req = parse_command_body(b"<command><commandString>ls</commandString></command>", guid(), dir.path()).unwrap();
		assert!(req.command_string == "ls");
		assert!(req.attachment_path.is_none());
	}

	#[test]
	fn parses_binary_attachment() {
		let dir = tempfile::tempdir().unwrap();
		let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello world");
		let body = format!(
			"<command><commandString>updateSoftware</commandString><binaryData>{encoded}</binaryData></command>"
		);
		let req = parse_command_body(body.as_bytes(), guid(), dir.path()).unwrap();
		assert!(req.command_string == "updateSoftware");
		let path = req.attachment_path.unwrap();
		assert!(std::fs::read(path).unwrap() == b"hello world");
	}

	#[test]
	fn empty_binary_data_element_means_no_attachment() {
		let dir = tempfile::tempdir().unwrap();
		let req = parse_command_body(
			b"<command><commandString>ls</commandString><binaryData></binaryData></command>",
			guid(),
			dir.path(),
		)
		.unwrap();
		assert!(req.attachment_path.is_none());
	}

	#[test]
	fn rejects_wrong_root_element() {
		let dir = tempfile::tempdir().unwrap();
		let err = parse_command_body(b"<notcommand></notcommand>", guid(), dir.path()).unwrap_err();
		assert!(err == CommandBodyError::MissingRootElement);
	}

	#[test]
	fn rejects_missing_command_string() {
		let dir = tempfile::tempdir().unwrap();
		let err = parse_command_body(b"<command></command>", guid(), dir.path()).unwrap_err();
		assert!(err == CommandBodyError::MissingCommandString);
	}

	#[test]
	fn rejects_malformed_xml() {
		let dir = tempfile::tempdir().unwrap();
		let err = parse_command_body(b"<command><unterminated>", guid(), dir.path()).unwrap_err();
		assert!(matches!(err, CommandBodyError::InvalidXml | CommandBodyError::MissingCommandString));
	}

	#[test]
	fn rejects_invalid_base64() {
		let dir = tempfile::tempdir().unwrap();
		let err = parse_command_body(
			b"<command><commandString>ls</commandString><binaryData>not-base64!!</binaryData></command>",
			guid(),
			dir.path(),
		)
		.unwrap_err();
		assert!(err == CommandBodyError::InvalidBinaryData);
	}

	#[test]
	fn restart_and_update_software_are_blocking() {
		let restart = CommandRequest {
			command_string: "restart".into(),
			guid: guid(),
			attachment_path: None,
		};
		let update = CommandRequest {
			command_string: "updateSoftware".into(),
			guid: guid(),
			attachment_path: None,
		};
		let ls = CommandRequest {
			command_string: "ls".into(),
			guid: guid(),
			attachment_path: None,
		};
		assert!(restart.is_blocking());
		assert!(update.is_blocking());
		assert!(!ls.is_blocking());
	}
}
