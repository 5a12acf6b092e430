//! Proxy routing decisions.
//!
//! Proxy authentication is not supported: the remote protocol client has no
//! way to answer a proxy challenge, so only host and port are forwarded.

use regex::{Regex, RegexBuilder};
use tfs_protocol::ProxyConfig;
use tracing::debug;

use crate::error::{Error, Result};

/// Whether outbound traffic to the server goes through a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDecision {
	NoProxy,
	UseProxy { host: String, port: u16 },
}

impl ProxyDecision {
	pub fn is_proxied(&self) -> bool {
		matches!(self, ProxyDecision::UseProxy { .. })
	}
}

/// Proxy configuration with its no-proxy patterns compiled.
#[derive(Debug, Clone)]
pub struct ProxyResolver {
	proxy: Option<(String, u16)>,
	no_proxy: Vec<Regex>,
}

impl ProxyResolver {
	/// Compiles `config`. Each pattern must match the whole host name, so it
	/// is anchored on both ends. Host names are case-insensitive and arrive
	/// lowercased from URL parsing, so patterns match ignoring case.
	pub fn new(config: Option<&ProxyConfig>) -> Result<Self> {
		let Some(config) = config else {
			return Ok(Self {
				proxy: None,
				no_proxy: Vec::new(),
			});
		};

		let no_proxy = config
			.no_proxy_patterns
			.iter()
			.map(|pattern| {
				RegexBuilder::new(&format!("^(?:{pattern})$"))
					.case_insensitive(true)
					.build()
					.map_err(|e| Error::Configuration(format!("Invalid no-proxy pattern `{pattern}`: {e}")))
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			proxy: Some((config.host.clone(), config.port)),
			no_proxy,
		})
	}

	/// Returns `false` when no proxy is configured or `host` matches a
	/// no-proxy pattern.
	pub fn should_proxy(&self, host: &str) -> bool {
		if self.proxy.is_none() {
			return false;
		}
		match self.no_proxy.iter().find(|pattern| pattern.is_match(host)) {
			Some(pattern) => {
				debug!(target = "tfs.proxy", %host, pattern = pattern.as_str(), "host exempted from proxy");
				false
			}
			None => true,
		}
	}

	pub fn resolve(&self, host: &str) -> ProxyDecision {
		match &self.proxy {
			Some((proxy_host, port)) if self.should_proxy(host) => ProxyDecision::UseProxy {
				host: proxy_host.clone(),
				port: *port,
			},
			_ => ProxyDecision::NoProxy,
		}
	}
}

/// One-shot form of [`ProxyResolver::resolve`].
pub fn resolve_proxy(config: Option<&ProxyConfig>, host: &str) -> Result<ProxyDecision> {
	Ok(ProxyResolver::new(config)?.resolve(host))
}
