//! Boundary traits for the remote protocol client.
//!
//! The wire protocol itself lives outside this crate. A session only needs a
//! [`RemoteConnector`] that can open a [`ProjectCollection`] for an endpoint,
//! and from the collection a [`VersionControlClient`] and an identity service.
//!
//! Opening a collection is expected to be cheap; the version control client
//! is the expensive part and is built at most once per session.

use std::sync::Arc;

use tfs_protocol::{ChangeSet, Workspace};
use thiserror::Error;
use url::Url;

use crate::credentials::ResolvedCredentials;
use crate::identity::IdentityService;
use crate::proxy::ProxyDecision;

/// Failure reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
	#[error("Authentication rejected: {0}")]
	Unauthorized(String),

	#[error("Anonymous connections are not accepted by {0}")]
	AnonymousRejected(String),

	#[error("Network failure: {0}")]
	Network(String),

	/// The server does not offer the requested service (older server versions).
	#[error("Service unavailable: {0}")]
	ServiceUnavailable(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Already closed")]
	Closed,

	#[error("{0}")]
	Other(String),
}

/// Why a dependency-internal resource could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InternalAccessError {
	#[error("internal resource not present in this client version")]
	NotFound,
	#[error("internal resource exists but cannot be accessed")]
	NotAccessible,
}

/// Anything holding server-side or socket resources.
pub trait Closable: Send + Sync {
	fn close(&self) -> Result<(), RemoteError>;
}

/// Opens project collections.
pub trait RemoteConnector: Send + Sync {
	/// Builds a collection bound to `endpoint`. `credentials` may be
	/// [`ResolvedCredentials::None`]; connectors for servers that refuse
	/// anonymous access return [`RemoteError::AnonymousRejected`].
	fn connect(&self, endpoint: &Url, credentials: &ResolvedCredentials, proxy: &ProxyDecision) -> Result<Arc<dyn ProjectCollection>, RemoteError>;
}

/// A connection to one project collection.
pub trait ProjectCollection: Closable {
	/// Builds the version control client. A session calls this at most once.
	fn version_control_client(&self) -> Result<Arc<dyn VersionControlClient>, RemoteError>;

	/// Returns the identity management service. Servers without one answer
	/// [`RemoteError::ServiceUnavailable`].
	fn identity_service(&self) -> Result<Arc<dyn IdentityService>, RemoteError>;

	/// Compatibility hook for the configuration-server connection some client
	/// libraries open alongside a collection and never close.
	///
	/// `Ok(None)` means the resource exists in this client but was never
	/// opened. Implementations that cannot see it keep the default, which
	/// reports [`InternalAccessError::NotFound`] and turns the cleanup step
	/// into a no-op.
	fn leaked_configuration_server(&self) -> Result<Option<Arc<dyn Closable>>, InternalAccessError> {
		Err(InternalAccessError::NotFound)
	}
}

/// Version control operations used by project handles and the workspace
/// registry.
pub trait VersionControlClient: Closable {
	/// Change sets under `server_path`, newest first, at most `max_count`.
	fn query_history(&self, server_path: &str, max_count: usize) -> Result<Vec<ChangeSet>, RemoteError>;

	fn query_workspaces(&self) -> Result<Vec<Workspace>, RemoteError>;

	fn create_workspace(&self, name: &str, computer: &str, comment: &str) -> Result<Workspace, RemoteError>;

	fn delete_workspace(&self, name: &str) -> Result<(), RemoteError>;
}
