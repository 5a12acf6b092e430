mod link;
mod proxy;
mod session;

use serde::Serialize;
use serde_json::Value;
use tfs::ProxyDecision;

use crate::cli::{Commands, LinkTarget, ProxyAction, ServerArgs, SessionAction};
use crate::error::Result;

/// Dotted name reported in the output envelope.
pub fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Link { target } => match target {
			LinkTarget::Changeset(_) => "link.changeset",
			LinkTarget::File { .. } => "link.file",
			LinkTarget::Diff { .. } => "link.diff",
		},
		Commands::Session { action: SessionAction::Inspect } => "session.inspect",
		Commands::Proxy { action: ProxyAction::Check { .. } } => "proxy.check",
	}
}

pub fn dispatch(command: &Commands, server: &ServerArgs) -> Result<Value> {
	match command {
		Commands::Link { target } => link::run(target, server),
		Commands::Session { action: SessionAction::Inspect } => session::inspect(server),
		Commands::Proxy {
			action: ProxyAction::Check { host },
		} => proxy::check(host, server),
	}
}

/// JSON form of a proxy decision.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
enum ProxyView {
	Direct,
	Proxy { host: String, port: u16 },
}

impl From<&ProxyDecision> for ProxyView {
	fn from(decision: &ProxyDecision) -> Self {
		match decision {
			ProxyDecision::NoProxy => ProxyView::Direct,
			ProxyDecision::UseProxy { host, port } => ProxyView::Proxy {
				host: host.clone(),
				port: *port,
			},
		}
	}
}
