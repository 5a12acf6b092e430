//! Workspace registry bound to a session.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tfs_protocol::Workspace;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::SessionInner;

/// Server workspaces, cached by name after the first listing.
///
/// The cache follows `create` and `delete` made through this registry;
/// [`refresh`](Self::refresh) picks up changes made elsewhere.
pub struct WorkspaceRegistry {
	session: Weak<SessionInner>,
	cache: Mutex<Option<BTreeMap<String, Workspace>>>,
}

impl WorkspaceRegistry {
	pub(crate) fn new(session: Weak<SessionInner>) -> Self {
		Self {
			session,
			cache: Mutex::new(None),
		}
	}

	/// Reloads the workspace list from the server.
	pub fn refresh(&self) -> Result<Vec<Workspace>> {
		let mut cache = self.cache.lock();
		let loaded = self.load()?;
		let list = loaded.values().cloned().collect();
		*cache = Some(loaded);
		Ok(list)
	}

	/// All workspaces, sorted by name.
	pub fn list(&self) -> Result<Vec<Workspace>> {
		self.with_cache(|cache| cache.values().cloned().collect())
	}

	pub fn exists(&self, name: &str) -> Result<bool> {
		self.with_cache(|cache| cache.contains_key(name))
	}

	pub fn get(&self, name: &str) -> Result<Option<Workspace>> {
		self.with_cache(|cache| cache.get(name).cloned())
	}

	pub fn create(&self, name: &str, computer: &str, comment: &str) -> Result<Workspace> {
		let client = self.session()?.remote_client()?;
		let workspace = client.create_workspace(name, computer, comment)?;
		debug!(target = "tfs.session", workspace = %workspace.name, %computer, "workspace created");
		if let Some(cache) = self.cache.lock().as_mut() {
			cache.insert(workspace.name.clone(), workspace.clone());
		}
		Ok(workspace)
	}

	pub fn delete(&self, name: &str) -> Result<()> {
		let client = self.session()?.remote_client()?;
		client.delete_workspace(name)?;
		debug!(target = "tfs.session", workspace = %name, "workspace deleted");
		if let Some(cache) = self.cache.lock().as_mut() {
			cache.remove(name);
		}
		Ok(())
	}

	fn with_cache<R>(&self, read: impl FnOnce(&BTreeMap<String, Workspace>) -> R) -> Result<R> {
		let mut cache = self.cache.lock();
		if cache.is_none() {
			*cache = Some(self.load()?);
		}
		match cache.as_ref() {
			Some(cache) => Ok(read(cache)),
			None => Ok(read(&BTreeMap::new())),
		}
	}

	fn load(&self) -> Result<BTreeMap<String, Workspace>> {
		let client = self.session()?.remote_client()?;
		let workspaces = client.query_workspaces()?;
		Ok(workspaces.into_iter().map(|ws| (ws.name.clone(), ws)).collect())
	}

	fn session(&self) -> Result<Arc<SessionInner>> {
		self.session.upgrade().ok_or_else(|| Error::SessionClosed("workspace registry".into()))
	}
}

impl std::fmt::Debug for WorkspaceRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let cached = self.cache.lock().as_ref().map(BTreeMap::len);
		f.debug_struct("WorkspaceRegistry").field("cached", &cached).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use tfs_protocol::ServerConfig;

	use super::*;
	use crate::credentials::PlatformCapabilities;
	use crate::fake::{FakeServerBuilder, FakeServerController};
	use crate::{ConnectionSession, SessionOptions};

	fn session_with(builder: FakeServerBuilder) -> (ConnectionSession, FakeServerController) {
		let (connector, controller) = builder.build();
		let options = SessionOptions::default()
			.with_platform(PlatformCapabilities::with_default_credentials(true))
			.with_connector(connector);
		(ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options).unwrap(), controller)
	}

	#[test]
	fn first_lookup_loads_then_serves_from_cache() {
		let (session, controller) = session_with(FakeServerBuilder::new().workspace(Workspace::new("ci-main", "agent01", "builder", "")));
		let registry = session.workspaces();

		assert!(registry.exists("ci-main").unwrap());
		assert!(!registry.exists("other").unwrap());
		assert_eq!(registry.get("ci-main").unwrap().unwrap().computer, "agent01");
		assert_eq!(controller.workspace_queries(), 1);
	}

	#[test]
	fn create_and_delete_keep_cache_in_step() {
		let (session, controller) = session_with(FakeServerBuilder::new());
		let registry = session.workspaces();
		assert!(registry.list().unwrap().is_empty());

		let created = registry.create("ci-release", "agent02", "release builds").unwrap();
		assert_eq!(created.comment, "release builds");
		assert!(registry.exists("ci-release").unwrap());

		registry.delete("ci-release").unwrap();
		assert!(!registry.exists("ci-release").unwrap());
		assert_eq!(controller.workspace_queries(), 1);
	}

	#[test]
	fn refresh_sees_external_changes() {
		let (session, controller) = session_with(FakeServerBuilder::new());
		let registry = session.workspaces();
		assert!(!registry.exists("external").unwrap());

		controller.add_workspace(Workspace::new("external", "agent03", "someone", ""));
		assert!(!registry.exists("external").unwrap());
		assert_eq!(registry.refresh().unwrap().len(), 1);
		assert!(registry.exists("external").unwrap());
	}

	#[test]
	fn deleting_unknown_workspace_fails() {
		let (session, _controller) = session_with(FakeServerBuilder::new());
		assert!(matches!(session.workspaces().delete("ghost"), Err(Error::Remote(_))));
	}
}
