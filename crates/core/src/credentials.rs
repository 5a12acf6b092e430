//! Credential selection.

use tfs_protocol::Secret;

/// Authentication strategy chosen for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredentials {
	/// Connect anonymously; the server may refuse.
	None,
	/// Integrated (single sign-on) credentials of the current OS user.
	PlatformDefault,
	UsernamePassword { username: String, password: Secret },
}

impl ResolvedCredentials {
	/// Short name used in logs and CLI output.
	pub fn kind(&self) -> &'static str {
		match self {
			ResolvedCredentials::None => "none",
			ResolvedCredentials::PlatformDefault => "platform-default",
			ResolvedCredentials::UsernamePassword { .. } => "username-password",
		}
	}

	pub fn username(&self) -> Option<&str> {
		match self {
			ResolvedCredentials::UsernamePassword { username, .. } => Some(username),
			_ => None,
		}
	}
}

/// What the host platform can do for authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
	pub supports_default_credentials: bool,
}

impl PlatformCapabilities {
	/// Integrated credentials are only available on Windows hosts.
	pub fn detect() -> Self {
		Self {
			supports_default_credentials: cfg!(windows),
		}
	}

	pub fn with_default_credentials(supported: bool) -> Self {
		Self {
			supports_default_credentials: supported,
		}
	}
}

impl Default for PlatformCapabilities {
	fn default() -> Self {
		Self::detect()
	}
}

/// Picks the credential strategy.
///
/// An empty or missing username selects platform-default credentials when the
/// platform offers them. Otherwise a non-empty username with a supplied
/// password (which may be empty) selects username/password. Anything else
/// resolves to [`ResolvedCredentials::None`].
pub fn resolve_credentials(username: Option<&str>, password: Option<&Secret>, platform: PlatformCapabilities) -> ResolvedCredentials {
	let username = username.filter(|name| !name.is_empty());

	match (username, password) {
		(None, _) if platform.supports_default_credentials => ResolvedCredentials::PlatformDefault,
		(Some(username), Some(password)) => ResolvedCredentials::UsernamePassword {
			username: username.to_string(),
			password: password.clone(),
		},
		_ => ResolvedCredentials::None,
	}
}
