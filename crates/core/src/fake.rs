//! In-memory remote server for testing sessions without a network.
//!
//! Compiled for this crate's own tests and behind the `testing` feature.
//!
//! # Example
//!
//! ```ignore
//! let (connector, controller) = FakeServerBuilder::new()
//!     .history("$/Project", vec![ChangeSet::new("12", "builder", "fix")])
//!     .build();
//! let session = ConnectionSession::open(config, SessionOptions::default().with_connector(connector))?;
//!
//! session.project("$/Project").history(10)?;
//! assert_eq!(controller.client_calls(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tfs_protocol::{ChangeSet, Workspace};
use url::Url;

use crate::credentials::ResolvedCredentials;
use crate::identity::{Identity, IdentityService};
use crate::proxy::ProxyDecision;
use crate::remote::{Closable, InternalAccessError, ProjectCollection, RemoteConnector, RemoteError, VersionControlClient};

/// How the fake collection answers the leaked configuration-server hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigurationServerMode {
	/// Present and opened; closing it succeeds.
	#[default]
	Open,
	/// Present but never opened.
	Unopened,
	/// Not reachable in this client version.
	Missing,
	/// Present, opened, and closing it fails.
	FailsToClose,
}

#[derive(Debug, Default)]
struct Settings {
	client_delay: Option<Duration>,
	reject_anonymous: bool,
	connect_error: Option<RemoteError>,
	client_error: Option<RemoteError>,
	identity_unavailable: bool,
	configuration_server: ConfigurationServerMode,
	fail_client_close: bool,
}

#[derive(Debug, Default)]
struct State {
	connect_calls: AtomicUsize,
	client_calls: AtomicUsize,
	history_queries: AtomicUsize,
	workspace_queries: AtomicUsize,
	client_closed: AtomicBool,
	collection_closed: AtomicBool,
	configuration_server_closed: AtomicBool,
	last_credentials: Mutex<Option<ResolvedCredentials>>,
	last_proxy: Mutex<Option<ProxyDecision>>,
	history: Mutex<HashMap<String, Vec<ChangeSet>>>,
	workspaces: Mutex<Vec<Workspace>>,
}

#[derive(Debug, Default)]
struct Shared {
	settings: Settings,
	state: State,
}

/// Builder for a fake server and its controller.
#[derive(Debug, Default)]
pub struct FakeServerBuilder {
	shared: Shared,
}

impl FakeServerBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sleeps inside client construction, widening the window for races.
	pub fn client_delay(mut self, delay: Duration) -> Self {
		self.shared.settings.client_delay = Some(delay);
		self
	}

	/// Refuses connections made without credentials.
	pub fn reject_anonymous(mut self) -> Self {
		self.shared.settings.reject_anonymous = true;
		self
	}

	pub fn fail_connect(mut self, error: RemoteError) -> Self {
		self.shared.settings.connect_error = Some(error);
		self
	}

	pub fn fail_client(mut self, error: RemoteError) -> Self {
		self.shared.settings.client_error = Some(error);
		self
	}

	pub fn identity_unavailable(mut self) -> Self {
		self.shared.settings.identity_unavailable = true;
		self
	}

	pub fn configuration_server(mut self, mode: ConfigurationServerMode) -> Self {
		self.shared.settings.configuration_server = mode;
		self
	}

	pub fn fail_client_close(mut self) -> Self {
		self.shared.settings.fail_client_close = true;
		self
	}

	/// Seeds history for `path`, newest change set first.
	pub fn history(self, path: impl Into<String>, changesets: Vec<ChangeSet>) -> Self {
		self.shared.state.history.lock().insert(path.into(), changesets);
		self
	}

	pub fn workspace(self, workspace: Workspace) -> Self {
		self.shared.state.workspaces.lock().push(workspace);
		self
	}

	/// Builds a connector plus a controller for inspecting what happened.
	pub fn build(self) -> (Arc<FakeConnector>, FakeServerController) {
		let shared = Arc::new(self.shared);
		(
			Arc::new(FakeConnector {
				shared: Arc::clone(&shared),
			}),
			FakeServerController { shared },
		)
	}

	/// Builds a collection directly, skipping the connector.
	pub fn build_collection(self) -> (Arc<dyn ProjectCollection>, FakeServerController) {
		let shared = Arc::new(self.shared);
		(
			Arc::new(FakeCollection {
				shared: Arc::clone(&shared),
			}),
			FakeServerController { shared },
		)
	}
}

/// Inspects and manipulates a fake server after it was built.
#[derive(Debug, Clone)]
pub struct FakeServerController {
	shared: Arc<Shared>,
}

impl FakeServerController {
	pub fn connect_calls(&self) -> usize {
		self.shared.state.connect_calls.load(Ordering::SeqCst)
	}

	/// Number of version control clients built.
	pub fn client_calls(&self) -> usize {
		self.shared.state.client_calls.load(Ordering::SeqCst)
	}

	pub fn history_queries(&self) -> usize {
		self.shared.state.history_queries.load(Ordering::SeqCst)
	}

	pub fn workspace_queries(&self) -> usize {
		self.shared.state.workspace_queries.load(Ordering::SeqCst)
	}

	pub fn client_closed(&self) -> bool {
		self.shared.state.client_closed.load(Ordering::SeqCst)
	}

	pub fn collection_closed(&self) -> bool {
		self.shared.state.collection_closed.load(Ordering::SeqCst)
	}

	pub fn configuration_server_closed(&self) -> bool {
		self.shared.state.configuration_server_closed.load(Ordering::SeqCst)
	}

	pub fn last_credentials(&self) -> Option<ResolvedCredentials> {
		self.shared.state.last_credentials.lock().clone()
	}

	pub fn last_proxy(&self) -> Option<ProxyDecision> {
		self.shared.state.last_proxy.lock().clone()
	}

	/// Registers a workspace behind the session's back.
	pub fn add_workspace(&self, workspace: Workspace) {
		self.shared.state.workspaces.lock().push(workspace);
	}
}

/// Connector half of the fake server.
#[derive(Debug)]
pub struct FakeConnector {
	shared: Arc<Shared>,
}

impl RemoteConnector for FakeConnector {
	fn connect(&self, endpoint: &Url, credentials: &ResolvedCredentials, proxy: &ProxyDecision) -> Result<Arc<dyn ProjectCollection>, RemoteError> {
		let state = &self.shared.state;
		state.connect_calls.fetch_add(1, Ordering::SeqCst);
		*state.last_credentials.lock() = Some(credentials.clone());
		*state.last_proxy.lock() = Some(proxy.clone());

		if let Some(error) = &self.shared.settings.connect_error {
			return Err(error.clone());
		}
		if self.shared.settings.reject_anonymous && *credentials == ResolvedCredentials::None {
			return Err(RemoteError::AnonymousRejected(endpoint.to_string()));
		}

		Ok(Arc::new(FakeCollection {
			shared: Arc::clone(&self.shared),
		}))
	}
}

struct FakeCollection {
	shared: Arc<Shared>,
}

impl Closable for FakeCollection {
	fn close(&self) -> Result<(), RemoteError> {
		self.shared.state.collection_closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}

impl ProjectCollection for FakeCollection {
	fn version_control_client(&self) -> Result<Arc<dyn VersionControlClient>, RemoteError> {
		self.shared.state.client_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.shared.settings.client_delay {
			thread::sleep(delay);
		}
		if let Some(error) = &self.shared.settings.client_error {
			return Err(error.clone());
		}
		Ok(Arc::new(FakeVersionControl {
			shared: Arc::clone(&self.shared),
		}))
	}

	fn identity_service(&self) -> Result<Arc<dyn IdentityService>, RemoteError> {
		if self.shared.settings.identity_unavailable {
			return Err(RemoteError::ServiceUnavailable("identity management".into()));
		}
		Ok(Arc::new(FakeIdentityService))
	}

	fn leaked_configuration_server(&self) -> Result<Option<Arc<dyn Closable>>, InternalAccessError> {
		let server = |fail_close| -> Arc<dyn Closable> {
			Arc::new(FakeConfigurationServer {
				shared: Arc::clone(&self.shared),
				fail_close,
			})
		};
		match self.shared.settings.configuration_server {
			ConfigurationServerMode::Open => Ok(Some(server(false))),
			ConfigurationServerMode::FailsToClose => Ok(Some(server(true))),
			ConfigurationServerMode::Unopened => Ok(None),
			ConfigurationServerMode::Missing => Err(InternalAccessError::NotFound),
		}
	}
}

struct FakeConfigurationServer {
	shared: Arc<Shared>,
	fail_close: bool,
}

impl Closable for FakeConfigurationServer {
	fn close(&self) -> Result<(), RemoteError> {
		if self.fail_close {
			return Err(RemoteError::Network("configuration server did not answer".into()));
		}
		self.shared.state.configuration_server_closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}

struct FakeVersionControl {
	shared: Arc<Shared>,
}

impl FakeVersionControl {
	fn ensure_open(&self) -> Result<(), RemoteError> {
		if self.shared.state.client_closed.load(Ordering::SeqCst) {
			return Err(RemoteError::Closed);
		}
		Ok(())
	}
}

impl Closable for FakeVersionControl {
	fn close(&self) -> Result<(), RemoteError> {
		if self.shared.settings.fail_client_close {
			return Err(RemoteError::Network("connection reset".into()));
		}
		self.shared.state.client_closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}

impl VersionControlClient for FakeVersionControl {
	fn query_history(&self, server_path: &str, max_count: usize) -> Result<Vec<ChangeSet>, RemoteError> {
		self.ensure_open()?;
		self.shared.state.history_queries.fetch_add(1, Ordering::SeqCst);
		let history = self.shared.state.history.lock();
		let changesets = history.get(server_path).ok_or_else(|| RemoteError::NotFound(server_path.to_string()))?;
		Ok(changesets.iter().take(max_count).cloned().collect())
	}

	fn query_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
		self.ensure_open()?;
		self.shared.state.workspace_queries.fetch_add(1, Ordering::SeqCst);
		Ok(self.shared.state.workspaces.lock().clone())
	}

	fn create_workspace(&self, name: &str, computer: &str, comment: &str) -> Result<Workspace, RemoteError> {
		self.ensure_open()?;
		let mut workspaces = self.shared.state.workspaces.lock();
		if workspaces.iter().any(|ws| ws.name == name) {
			return Err(RemoteError::Other(format!("workspace `{name}` already exists")));
		}
		let workspace = Workspace::new(name, computer, "fake-owner", comment);
		workspaces.push(workspace.clone());
		Ok(workspace)
	}

	fn delete_workspace(&self, name: &str) -> Result<(), RemoteError> {
		self.ensure_open()?;
		let mut workspaces = self.shared.state.workspaces.lock();
		let before = workspaces.len();
		workspaces.retain(|ws| ws.name != name);
		if workspaces.len() == before {
			return Err(RemoteError::NotFound(format!("workspace `{name}`")));
		}
		Ok(())
	}
}

struct FakeIdentityService;

impl IdentityService for FakeIdentityService {
	fn resolve(&self, account_name: &str) -> Result<Identity, RemoteError> {
		Ok(Identity {
			account_name: account_name.to_string(),
			display_name: format!("{account_name} (directory)"),
		})
	}
}
