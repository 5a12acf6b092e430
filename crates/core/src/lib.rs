// tfs: Connection sessions for Team Foundation Server
//
// A session resolves credentials and proxy routing once, builds the remote
// version control client lazily and at most once, caches per-path project
// handles, and releases everything it created when closed.

pub mod browser;
pub mod channel;
mod cleanup;
pub mod credentials;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod identity;
pub mod lazy;
pub mod project;
pub mod proxy;
pub mod remote;
pub mod session;
pub mod workspaces;

pub use browser::{WebAccessBrowser, base_url};
pub use channel::{ChannelError, ExecutionChannel, LocalChannel, RemoteCall};
pub use credentials::{PlatformCapabilities, ResolvedCredentials, resolve_credentials};
pub use error::{CleanupError, CleanupFailure, CleanupStep, Error, Result};
pub use identity::{Identity, IdentityService, LegacyIdentityService};
pub use lazy::{LazyHandle, LazyState};
pub use project::ProjectHandle;
pub use proxy::{ProxyDecision, ProxyResolver, resolve_proxy};
pub use remote::{Closable, InternalAccessError, ProjectCollection, RemoteConnector, RemoteError, VersionControlClient};
pub use session::{ConnectionSession, SessionOptions};
pub use tfs_protocol;
pub use workspaces::WorkspaceRegistry;
