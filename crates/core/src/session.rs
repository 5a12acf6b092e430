//! Connection session for one server endpoint.
//!
//! A [`ConnectionSession`] is opened from a [`ServerConfig`]. Opening only
//! validates the URL and resolves credentials and proxy routing; the remote
//! collection and the version control client are built on first use and at
//! most once. Project handles and the workspace registry are cached on the
//! session.
//!
//! The session is `Send + Sync` and cheap to clone; clones share state.
//! [`close`](ConnectionSession::close) releases remote resources exactly once,
//! whichever clone calls it and however many times it is called.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tfs_protocol::ServerConfig;
use tracing::{debug, info, warn};
use url::Url;

use crate::channel::{ExecutionChannel, LocalChannel, RemoteCall};
use crate::cleanup;
use crate::credentials::{PlatformCapabilities, ResolvedCredentials, resolve_credentials};
use crate::error::{Error, Result};
use crate::identity::{IdentityService, LegacyIdentityService};
use crate::lazy::{LazyHandle, LazyState};
use crate::project::ProjectHandle;
use crate::proxy::{ProxyDecision, ProxyResolver};
use crate::remote::{ProjectCollection, RemoteConnector, RemoteError, VersionControlClient};
use crate::workspaces::WorkspaceRegistry;

/// Collaborators and host facts a session is opened with.
#[derive(Clone)]
pub struct SessionOptions {
	pub platform: PlatformCapabilities,
	/// Opens the remote collection. Without one, every remote operation fails
	/// with a connection error.
	pub connector: Option<Arc<dyn RemoteConnector>>,
	pub channel: Arc<dyn ExecutionChannel>,
}

impl SessionOptions {
	pub fn with_platform(mut self, platform: PlatformCapabilities) -> Self {
		self.platform = platform;
		self
	}

	pub fn with_connector(mut self, connector: Arc<dyn RemoteConnector>) -> Self {
		self.connector = Some(connector);
		self
	}

	pub fn with_channel(mut self, channel: Arc<dyn ExecutionChannel>) -> Self {
		self.channel = channel;
		self
	}
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			platform: PlatformCapabilities::detect(),
			connector: None,
			channel: Arc::new(LocalChannel),
		}
	}
}

impl fmt::Debug for SessionOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionOptions")
			.field("platform", &self.platform)
			.field("connector", &self.connector.is_some())
			.finish_non_exhaustive()
	}
}

/// An authenticated link to one server endpoint.
#[derive(Clone)]
pub struct ConnectionSession {
	inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
	config: ServerConfig,
	endpoint: Url,
	credentials: ResolvedCredentials,
	proxy: ProxyDecision,
	connector: Option<Arc<dyn RemoteConnector>>,
	channel: Arc<dyn ExecutionChannel>,
	collection: LazyHandle<Arc<dyn ProjectCollection>, Error>,
	client: LazyHandle<Arc<dyn VersionControlClient>, Error>,
	projects: Mutex<HashMap<String, Arc<ProjectHandle>>>,
	workspaces: OnceLock<Arc<WorkspaceRegistry>>,
	closed: AtomicBool,
}

impl ConnectionSession {
	/// Validates `config` and resolves credentials and proxy routing.
	///
	/// No remote resource is created and no network traffic happens here.
	///
	/// # Errors
	///
	/// Returns [`Error::Configuration`] if the URL does not parse, has no host,
	/// or a no-proxy pattern does not compile.
	pub fn open(config: ServerConfig, options: SessionOptions) -> Result<Self> {
		let endpoint = Url::parse(&config.url).map_err(|e| Error::Configuration(format!("Invalid server URL `{}`: {e}", config.url)))?;
		let host = endpoint
			.host_str()
			.filter(|host| !host.is_empty())
			.ok_or_else(|| Error::Configuration(format!("Server URL `{}` has no host", config.url)))?
			.to_string();

		let credentials = resolve_credentials(config.username.as_deref(), config.password.as_ref(), options.platform);
		let proxy = ProxyResolver::new(config.proxy.as_ref())?.resolve(&host);

		info!(
			target = "tfs.session",
			url = %config.url,
			credentials = credentials.kind(),
			proxied = proxy.is_proxied(),
			"session opened"
		);

		Ok(Self {
			inner: Arc::new(SessionInner {
				config,
				endpoint,
				credentials,
				proxy,
				connector: options.connector,
				channel: options.channel,
				collection: LazyHandle::new(),
				client: LazyHandle::new(),
				projects: Mutex::new(HashMap::new()),
				workspaces: OnceLock::new(),
				closed: AtomicBool::new(false),
			}),
		})
	}

	/// Server URL exactly as configured.
	pub fn url(&self) -> &str {
		&self.inner.config.url
	}

	pub fn endpoint(&self) -> &Url {
		&self.inner.endpoint
	}

	pub fn config(&self) -> &ServerConfig {
		&self.inner.config
	}

	pub fn credentials(&self) -> &ResolvedCredentials {
		&self.inner.credentials
	}

	pub fn proxy_decision(&self) -> &ProxyDecision {
		&self.inner.proxy
	}

	/// Phase of the version control client's construction.
	pub fn client_state(&self) -> LazyState {
		self.inner.client.state()
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::Acquire)
	}

	/// Returns the handle for `path`, creating and caching it on first use.
	///
	/// Never fails; remote errors surface when the handle is used.
	pub fn project(&self, path: &str) -> Arc<ProjectHandle> {
		let mut projects = self.inner.projects.lock();
		let handle = projects
			.entry(path.to_string())
			.or_insert_with(|| Arc::new(ProjectHandle::new(path.to_string(), Arc::downgrade(&self.inner))));
		Arc::clone(handle)
	}

	/// Returns the workspace registry, creating it on first use.
	pub fn workspaces(&self) -> Arc<WorkspaceRegistry> {
		let registry = self
			.inner
			.workspaces
			.get_or_init(|| Arc::new(WorkspaceRegistry::new(Arc::downgrade(&self.inner))));
		Arc::clone(registry)
	}

	/// Returns the version control client, building it on first use.
	///
	/// Concurrent first callers block until one of them has built the client
	/// and then all receive the same instance. There is no timeout.
	///
	/// # Errors
	///
	/// Returns [`Error::Connection`] if the collection or client cannot be
	/// built, and [`Error::SessionClosed`] after [`close`](Self::close). A
	/// connection failure is final for this session: construction is never
	/// attempted again, and every later call returns the same error. Open a
	/// new session to retry.
	pub fn remote_client(&self) -> Result<Arc<dyn VersionControlClient>> {
		self.inner.remote_client()
	}

	/// Returns the identity service, falling back to
	/// [`LegacyIdentityService`] when the server has none.
	pub fn identity_service(&self) -> Result<Arc<dyn IdentityService>> {
		let collection = self.inner.collection()?;
		match collection.identity_service() {
			Ok(service) => Ok(service),
			Err(RemoteError::ServiceUnavailable(reason)) => {
				debug!(target = "tfs.session", %reason, "identity management unavailable; using legacy lookup");
				Ok(Arc::new(LegacyIdentityService))
			}
			Err(err) => Err(Error::Remote(err)),
		}
	}

	/// Runs `call` through the session's execution channel.
	///
	/// # Errors
	///
	/// Every failure, whether from the channel, the call, or decoding the
	/// result, is reported as [`Error::Execution`].
	pub fn execute<C: RemoteCall>(&self, call: C) -> Result<C::Output> {
		let task = call.name().to_string();
		debug!(target = "tfs.session", %task, "dispatching call");

		let value = self.inner.channel.dispatch(Box::new(call)).map_err(|e| Error::Execution {
			task: task.clone(),
			message: e.to_string(),
		})?;

		serde_json::from_value(value).map_err(|e| Error::Execution {
			task,
			message: format!("Failed to decode result: {e}"),
		})
	}

	/// Releases the version control client, the leaked configuration-server
	/// connection, and the collection.
	///
	/// Only the first call does any work; later and concurrent calls return
	/// `Ok(())` immediately. Safe to call when nothing was ever built.
	///
	/// # Errors
	///
	/// Returns [`Error::Cleanup`] listing every step that failed. All steps are
	/// attempted before the error is returned.
	pub fn close(&self) -> Result<()> {
		self.inner.close().map_err(Error::from)
	}
}

impl fmt::Debug for ConnectionSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectionSession")
			.field("url", &self.inner.config.url)
			.field("credentials", &self.inner.credentials.kind())
			.field("proxy", &self.inner.proxy)
			.field("client", &self.inner.client.state())
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl SessionInner {
	pub(crate) fn url(&self) -> &str {
		&self.config.url
	}

	fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::Acquire) {
			return Err(Error::SessionClosed(self.config.url.clone()));
		}
		Ok(())
	}

	fn connection_error(&self, source: RemoteError) -> Error {
		Error::Connection {
			url: self.config.url.clone(),
			source,
		}
	}

	pub(crate) fn collection(&self) -> Result<Arc<dyn ProjectCollection>> {
		self.ensure_open()?;
		let collection = self.collection.get_or_try_init(|| {
			self.ensure_open()?;
			let connector = self
				.connector
				.as_ref()
				.ok_or_else(|| self.connection_error(RemoteError::Other("no remote connector configured".into())))?;
			debug!(target = "tfs.session", endpoint = %self.endpoint, credentials = self.credentials.kind(), "connecting to project collection");
			connector
				.connect(&self.endpoint, &self.credentials, &self.proxy)
				.map_err(|e| self.connection_error(e))
		})?;
		Ok(Arc::clone(collection))
	}

	pub(crate) fn remote_client(&self) -> Result<Arc<dyn VersionControlClient>> {
		self.ensure_open()?;
		let client = self.client.get_or_try_init(|| {
			let collection = self.collection()?;
			debug!(target = "tfs.session", endpoint = %self.endpoint, "building version control client");
			collection.version_control_client().map_err(|e| self.connection_error(e))
		})?;
		Ok(Arc::clone(client))
	}

	fn close(&self) -> std::result::Result<(), crate::error::CleanupError> {
		if self.closed.swap(true, Ordering::AcqRel) {
			debug!(target = "tfs.session", url = %self.config.url, "session already closed");
			return Ok(());
		}

		let client = self.client.settle().cloned();
		let collection = self.collection.settle().cloned();
		let result = cleanup::release(client.as_deref(), collection.as_deref());
		match &result {
			Ok(()) => info!(target = "tfs.session", url = %self.config.url, "session closed"),
			Err(err) => warn!(target = "tfs.session", url = %self.config.url, error = %err, "session closed with cleanup failures"),
		}
		result
	}
}

impl Drop for SessionInner {
	fn drop(&mut self) {
		if !self.closed.load(Ordering::Acquire) {
			debug!(target = "tfs.session", url = %self.config.url, "session dropped without close; releasing resources");
			let _ = self.close();
		}
	}
}
