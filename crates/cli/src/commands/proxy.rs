use serde::Serialize;
use serde_json::Value;
use tfs::ProxyResolver;

use super::ProxyView;
use crate::cli::ServerArgs;
use crate::config::load_server_config;
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutput {
	host: String,
	proxy: ProxyView,
}

pub(super) fn check(host: &str, server: &ServerArgs) -> Result<Value> {
	let host = host.trim();
	if host.is_empty() {
		return Err(CliError::InvalidInput("Host must not be empty".into()));
	}

	let config = load_server_config(server)?;
	let resolver = ProxyResolver::new(config.proxy.as_ref())?;
	let decision = resolver.resolve(host);

	Ok(serde_json::to_value(CheckOutput {
		host: host.to_string(),
		proxy: (&decision).into(),
	})?)
}
