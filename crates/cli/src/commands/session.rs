use serde::Serialize;
use serde_json::Value;
use tfs::{ConnectionSession, LazyState, SessionOptions};
use tracing::info;

use super::ProxyView;
use crate::cli::ServerArgs;
use crate::config::{load_server_config, platform, require_url};
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectOutput {
	url: String,
	endpoint: String,
	credentials: CredentialsView,
	proxy: ProxyView,
	client_state: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsView {
	kind: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	username: Option<String>,
}

/// Opens a session without a connector: nothing goes over the network.
pub(super) fn inspect(server: &ServerArgs) -> Result<Value> {
	let config = load_server_config(server)?;
	require_url(&config)?;

	let session = ConnectionSession::open(config, SessionOptions::default().with_platform(platform(server)))?;
	info!(target = "tfs.cli", url = %session.url(), "inspecting session");

	let output = InspectOutput {
		url: session.url().to_string(),
		endpoint: session.endpoint().to_string(),
		credentials: CredentialsView {
			kind: session.credentials().kind(),
			username: session.credentials().username().map(str::to_string),
		},
		proxy: session.proxy_decision().into(),
		client_state: match session.client_state() {
			LazyState::Uninitialized => "uninitialized",
			LazyState::Initializing => "initializing",
			LazyState::Ready => "ready",
			LazyState::Failed => "failed",
		},
	};
	session.close()?;

	Ok(serde_json::to_value(output)?)
}
