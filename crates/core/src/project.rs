//! Per-path project handles.

use std::sync::{Arc, Weak};

use tfs_protocol::ChangeSet;

use crate::error::{Error, Result};
use crate::session::SessionInner;

/// A server path (e.g. `$/Project/Main`) bound to a session.
///
/// Handles are cached by [`ConnectionSession::project`](crate::ConnectionSession::project)
/// and only reach the server when an operation is called.
pub struct ProjectHandle {
	path: String,
	session: Weak<SessionInner>,
}

impl ProjectHandle {
	pub(crate) fn new(path: String, session: Weak<SessionInner>) -> Self {
		Self { path, session }
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	/// Change sets under this path, newest first, at most `max_count`.
	///
	/// Change sets come back tagged with the session's server URL so that
	/// repository browser links can fall back to it.
	pub fn history(&self, max_count: usize) -> Result<Vec<ChangeSet>> {
		let session = self.session()?;
		let client = session.remote_client()?;
		let mut changesets = client.query_history(&self.path, max_count)?;
		for changeset in &mut changesets {
			if changeset.server_url.is_none() {
				changeset.server_url = Some(session.url().to_string());
			}
		}
		Ok(changesets)
	}

	pub fn latest_changeset(&self) -> Result<Option<ChangeSet>> {
		Ok(self.history(1)?.into_iter().next())
	}

	fn session(&self) -> Result<Arc<SessionInner>> {
		self.session.upgrade().ok_or_else(|| Error::SessionClosed(self.path.clone()))
	}
}

impl std::fmt::Debug for ProjectHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProjectHandle").field("path", &self.path).finish_non_exhaustive()
	}
}
