//! Error types for session management.

use std::fmt;

use thiserror::Error;

use crate::remote::RemoteError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`ConnectionSession`](crate::ConnectionSession) and its handles.
#[derive(Debug, Clone, Error)]
pub enum Error {
	/// Malformed endpoint URL, invalid no-proxy pattern, or missing link base.
	/// Raised before any remote resource is created.
	#[error("Invalid configuration: {0}")]
	Configuration(String),

	/// The remote collection or client could not be built. Fatal to the
	/// session: the failure is kept and returned again on every later call,
	/// and nothing is retried internally.
	#[error("Failed to connect to {url}: {source}")]
	Connection {
		url: String,
		#[source]
		source: RemoteError,
	},

	/// A task sent through the execution channel failed, the channel was
	/// unreachable, or the result could not be decoded.
	#[error("Remote execution of `{task}` failed: {message}")]
	Execution { task: String, message: String },

	/// An operation on an already-open client failed.
	#[error("Remote operation failed: {0}")]
	Remote(#[from] RemoteError),

	#[error(transparent)]
	Cleanup(#[from] CleanupError),

	/// A lazy accessor or handle was used after the session was closed.
	#[error("Session for {0} is closed")]
	SessionClosed(String),
}

/// Step of the close sequence that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
	VersionControlClient,
	ConfigurationServer,
	Collection,
}

impl fmt::Display for CleanupStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			CleanupStep::VersionControlClient => "version control client",
			CleanupStep::ConfigurationServer => "configuration server",
			CleanupStep::Collection => "project collection",
		};
		f.write_str(name)
	}
}

/// A single failed close step.
#[derive(Debug, Clone, Error)]
#[error("Failed to close {step}: {source}")]
pub struct CleanupFailure {
	pub step: CleanupStep,
	#[source]
	pub source: RemoteError,
}

/// All failures collected while closing a session. Every step of the close
/// sequence ran before this was returned.
#[derive(Debug, Clone, Error)]
pub struct CleanupError {
	pub failures: Vec<CleanupFailure>,
}

impl CleanupError {
	pub fn steps(&self) -> impl Iterator<Item = CleanupStep> + '_ {
		self.failures.iter().map(|failure| failure.step)
	}
}

impl fmt::Display for CleanupError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Session cleanup finished with {} failure(s)", self.failures.len())?;
		for failure in &self.failures {
			write!(f, "; {failure}")?;
		}
		Ok(())
	}
}
