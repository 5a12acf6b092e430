//! Server-side workspace descriptions.

use serde::{Deserialize, Serialize};

/// A workspace registered on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
	pub name: String,
	/// Machine the workspace is bound to.
	#[serde(default)]
	pub computer: String,
	#[serde(default)]
	pub owner: String,
	#[serde(default)]
	pub comment: String,
}

impl Workspace {
	pub fn new(name: impl Into<String>, computer: impl Into<String>, owner: impl Into<String>, comment: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			computer: computer.into(),
			owner: owner.into(),
			comment: comment.into(),
		}
	}
}
