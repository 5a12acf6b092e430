//! Server configuration assembled from `--config` and override flags.

use std::fs;

use tfs::PlatformCapabilities;
use tfs_protocol::{ProxyConfig, ServerConfig};
use tracing::debug;

use crate::cli::ServerArgs;
use crate::error::{CliError, Result};

/// Reads the configuration file, if any, then applies flag overrides.
pub fn load_server_config(args: &ServerArgs) -> Result<ServerConfig> {
	let mut config = match &args.config {
		Some(path) => {
			let raw = fs::read_to_string(path).map_err(|source| CliError::Io { path: path.clone(), source })?;
			let config: ServerConfig = serde_json::from_str(&raw).map_err(|source| CliError::ConfigFile { path: path.clone(), source })?;
			debug!(target = "tfs.cli", path = %path.display(), "loaded server configuration");
			config
		}
		None => ServerConfig::default(),
	};

	if let Some(url) = &args.url {
		config.url = url.clone();
	}
	if let Some(username) = &args.username {
		config.username = Some(username.clone());
	}
	if let Some(password) = &args.password {
		config.password = Some(password.as_str().into());
	}
	config.proxy = proxy_config(args, config.proxy.take())?;

	Ok(config)
}

/// Fails unless the configuration names a server URL.
pub fn require_url(config: &ServerConfig) -> Result<()> {
	if config.url.trim().is_empty() {
		return Err(CliError::InvalidInput("No server URL; pass --url or a --config file with `url`".into()));
	}
	Ok(())
}

pub fn platform(args: &ServerArgs) -> PlatformCapabilities {
	if args.default_credentials {
		PlatformCapabilities::with_default_credentials(true)
	} else if args.no_default_credentials {
		PlatformCapabilities::with_default_credentials(false)
	} else {
		PlatformCapabilities::detect()
	}
}

fn proxy_config(args: &ServerArgs, from_file: Option<ProxyConfig>) -> Result<Option<ProxyConfig>> {
	let base = match &args.proxy {
		Some(spec) => {
			let (host, port) = parse_host_port(spec)?;
			let patterns = from_file.map(|proxy| proxy.no_proxy_patterns).unwrap_or_default();
			Some(ProxyConfig::new(host, port).with_no_proxy_patterns(patterns))
		}
		None => from_file,
	};

	match (&args.no_proxy, base) {
		(None, base) => Ok(base),
		(Some(_), None) => Err(CliError::InvalidInput("--no-proxy needs a proxy; pass --proxy or configure one".into())),
		(Some(hosts), Some(mut proxy)) => {
			let extra = ProxyConfig::from_no_proxy_hosts(proxy.host.clone(), proxy.port, hosts);
			proxy.no_proxy_patterns.extend(extra.no_proxy_patterns);
			Ok(Some(proxy))
		}
	}
}

fn parse_host_port(spec: &str) -> Result<(String, u16)> {
	let invalid = || CliError::InvalidInput(format!("Invalid proxy `{spec}`; expected HOST:PORT"));
	let (host, port) = spec.rsplit_once(':').ok_or_else(invalid)?;
	if host.is_empty() {
		return Err(invalid());
	}
	let port = port.parse::<u16>().map_err(|_| invalid())?;
	Ok((host.to_string(), port))
}
