//! Change sets and their items as reported by the server history.

use serde::{Deserialize, Serialize};

/// Kind of modification recorded for one item of a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
	Add,
	Edit,
	Delete,
}

impl EditType {
	/// Maps a server change action (`add`, `edit`, `delete`, `rename`, ...) to
	/// an edit type. Anything that is neither an add nor a delete counts as an
	/// edit of existing content.
	pub fn from_action(action: &str) -> Self {
		match action.trim().to_ascii_lowercase().as_str() {
			"add" | "undelete" | "branch" => EditType::Add,
			"delete" => EditType::Delete,
			_ => EditType::Edit,
		}
	}
}

/// One path touched by a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetItem {
	/// Server path, e.g. `$/Project/Folder/file.cs`.
	pub path: String,
	pub action: String,
}

impl ChangeSetItem {
	pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			action: action.into(),
		}
	}

	pub fn edit_type(&self) -> EditType {
		EditType::from_action(&self.action)
	}
}

/// A committed change set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
	/// Change set number as reported by the server.
	pub version: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date: Option<String>,
	pub user: String,
	#[serde(default)]
	pub comment: String,
	#[serde(default)]
	pub items: Vec<ChangeSetItem>,
	/// Collection URL of the server this change set was read from.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub server_url: Option<String>,
}

impl ChangeSet {
	pub fn new(version: impl Into<String>, user: impl Into<String>, comment: impl Into<String>) -> Self {
		Self {
			version: version.into(),
			user: user.into(),
			comment: comment.into(),
			..Default::default()
		}
	}

	pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
		self.server_url = Some(url.into());
		self
	}

	pub fn with_item(mut self, item: ChangeSetItem) -> Self {
		self.items.push(item);
		self
	}
}
