//! Server and proxy configuration.

use serde::{Deserialize, Serialize};

use crate::secret::Secret;

/// Everything needed to open a session against one server endpoint.
///
/// The JSON form uses camelCase keys:
///
/// ```json
/// {
///   "url": "http://tfs.example.com:8080/tfs/DefaultCollection",
///   "username": "DOMAIN\\builder",
///   "password": "secret",
///   "proxy": { "host": "proxy.local", "port": 8080, "noProxyPatterns": ["internal\\.example\\.com"] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
	/// Collection URL of the server.
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<Secret>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proxy: Option<ProxyConfig>,
}

impl ServerConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			..Default::default()
		}
	}

	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self
	}

	pub fn with_password(mut self, password: impl Into<Secret>) -> Self {
		self.password = Some(password.into());
		self
	}

	pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
		self.proxy = Some(proxy);
		self
	}
}

/// Outbound HTTP proxy settings.
///
/// Proxy authentication is not part of this type: the remote protocol client
/// cannot authenticate against a proxy, so there is nothing to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
	pub host: String,
	pub port: u16,
	/// Regular expressions matched against the whole target host name,
	/// ignoring case. Evaluated in order; the first match exempts the host
	/// from proxying.
	#[serde(default)]
	pub no_proxy_patterns: Vec<String>,
}

impl ProxyConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			no_proxy_patterns: Vec::new(),
		}
	}

	pub fn with_no_proxy_patterns<I, S>(mut self, patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.no_proxy_patterns = patterns.into_iter().map(Into::into).collect();
		self
	}

	/// Builds a configuration from a host list in the form administrators
	/// usually type it: entries separated by whitespace, `,` or `|`, with `*`
	/// as a wildcard (`*.corp.local, build01 | 10.0.*`).
	///
	/// Each entry becomes one pattern where `.` is literal and `*` matches any
	/// run of characters.
	pub fn from_no_proxy_hosts(host: impl Into<String>, port: u16, no_proxy_hosts: &str) -> Self {
		let patterns = no_proxy_hosts
			.split(|c: char| c.is_whitespace() || c == ',' || c == '|')
			.filter(|entry| !entry.is_empty())
			.map(glob_to_pattern);
		Self::new(host, port).with_no_proxy_patterns(patterns)
	}
}

fn glob_to_pattern(glob: &str) -> String {
	glob.replace('.', "\\.").replace('*', ".*")
}
