//! End-to-end behaviour of a session against the fake server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tfs::channel::{CallError, ErasedCall};
use tfs::fake::{ConfigurationServerMode, FakeServerBuilder};
use tfs::tfs_protocol::{ChangeSet, ChangeSetItem, ProxyConfig, ServerConfig, Workspace};
use tfs::{
	ChannelError, CleanupStep, ConnectionSession, Error, ExecutionChannel, PlatformCapabilities, ProxyDecision, RemoteCall, RemoteError, ResolvedCredentials,
	SessionOptions, WebAccessBrowser,
};

fn windows() -> SessionOptions {
	SessionOptions::default().with_platform(PlatformCapabilities::with_default_credentials(true))
}

fn unix() -> SessionOptions {
	SessionOptions::default().with_platform(PlatformCapabilities::with_default_credentials(false))
}

#[test]
fn empty_username_on_windows_uses_platform_default() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new().build();
	let config = ServerConfig::new("http://server:80").with_username("").with_password("secret");
	let session = ConnectionSession::open(config, windows().with_connector(connector))?;

	assert_eq!(session.credentials(), &ResolvedCredentials::PlatformDefault);
	assert_eq!(session.proxy_decision(), &ProxyDecision::NoProxy);

	session.remote_client()?;
	assert_eq!(controller.last_credentials(), Some(ResolvedCredentials::PlatformDefault));
	assert_eq!(controller.last_proxy(), Some(ProxyDecision::NoProxy));
	Ok(())
}

#[test]
fn explicit_user_wins_over_platform_default() -> anyhow::Result<()> {
	let config = ServerConfig::new("http://server:8080/tfs").with_username("DOMAIN\\builder").with_password("hunter2");
	let session = ConnectionSession::open(config, windows())?;

	assert_eq!(session.credentials().kind(), "username-password");
	assert_eq!(session.credentials().username(), Some("DOMAIN\\builder"));
	Ok(())
}

#[test]
fn anonymous_connection_can_be_rejected() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new().reject_anonymous().build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), unix().with_connector(connector))?;
	assert_eq!(session.credentials(), &ResolvedCredentials::None);

	assert!(matches!(
		session.remote_client(),
		Err(Error::Connection {
			source: RemoteError::AnonymousRejected(_),
			..
		})
	));
	assert_eq!(controller.client_calls(), 0);
	Ok(())
}

#[test]
fn proxy_decision_reaches_connector() -> anyhow::Result<()> {
	let proxy = ProxyConfig::new("proxy.local", 8080).with_no_proxy_patterns(["internal\\.example\\.com"]);

	let (connector, controller) = FakeServerBuilder::new().build();
	let internal = ServerConfig::new("http://internal.example.com:8080/tfs").with_proxy(proxy.clone());
	ConnectionSession::open(internal, windows().with_connector(connector))?.remote_client()?;
	assert_eq!(controller.last_proxy(), Some(ProxyDecision::NoProxy));

	let (connector, controller) = FakeServerBuilder::new().build();
	let external = ServerConfig::new("http://external.example.com:8080/tfs").with_proxy(proxy);
	ConnectionSession::open(external, windows().with_connector(connector))?.remote_client()?;
	assert_eq!(
		controller.last_proxy(),
		Some(ProxyDecision::UseProxy {
			host: "proxy.local".into(),
			port: 8080,
		})
	);
	Ok(())
}

#[test]
fn glob_host_list_exempts_matching_hosts() -> anyhow::Result<()> {
	let proxy = ProxyConfig::from_no_proxy_hosts("proxy.local", 3128, "localhost, *.corp.example.com");
	let session = ConnectionSession::open(ServerConfig::new("http://tfs.corp.example.com:8080/tfs").with_proxy(proxy.clone()), windows())?;
	assert_eq!(session.proxy_decision(), &ProxyDecision::NoProxy);

	let session = ConnectionSession::open(ServerConfig::new("http://tfs.example.com/tfs").with_proxy(proxy), windows())?;
	assert!(session.proxy_decision().is_proxied());
	Ok(())
}

#[test]
fn invalid_no_proxy_pattern_fails_open() {
	let proxy = ProxyConfig::new("proxy.local", 8080).with_no_proxy_patterns(["(unclosed"]);
	let result = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs").with_proxy(proxy), windows());
	assert!(matches!(result, Err(Error::Configuration(msg)) if msg.contains("(unclosed")));
}

#[test]
fn close_releases_everything_in_order() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new().build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_connector(connector))?;
	session.remote_client()?;

	session.close()?;
	assert!(controller.client_closed());
	assert!(controller.configuration_server_closed());
	assert!(controller.collection_closed());
	Ok(())
}

#[test]
fn close_after_identity_lookup_still_closes_configuration_server() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new().build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_connector(connector))?;
	session.identity_service()?;

	session.close()?;
	assert_eq!(controller.client_calls(), 0);
	assert!(!controller.client_closed());
	assert!(controller.configuration_server_closed());
	assert!(controller.collection_closed());
	Ok(())
}

#[test]
fn unreachable_configuration_server_is_not_a_failure() -> anyhow::Result<()> {
	for mode in [ConfigurationServerMode::Missing, ConfigurationServerMode::Unopened] {
		let (connector, controller) = FakeServerBuilder::new().configuration_server(mode).build();
		let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_connector(connector))?;
		session.remote_client()?;

		session.close()?;
		assert!(!controller.configuration_server_closed());
		assert!(controller.collection_closed());
	}
	Ok(())
}

#[test]
fn configuration_server_close_failure_is_reported() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new().configuration_server(ConfigurationServerMode::FailsToClose).build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_connector(connector))?;
	session.remote_client()?;

	match session.close() {
		Err(Error::Cleanup(err)) => assert_eq!(err.steps().collect::<Vec<_>>(), vec![CleanupStep::ConfigurationServer]),
		other => anyhow::bail!("expected cleanup failure, got {other:?}"),
	}
	assert!(controller.client_closed());
	assert!(controller.collection_closed());
	Ok(())
}

#[test]
fn history_feeds_repository_links() -> anyhow::Result<()> {
	let changeset = ChangeSet::new("62643", "builder", "fix build").with_item(ChangeSetItem::new("$/Project/src/main.cs", "edit"));
	let (connector, _controller) = FakeServerBuilder::new().history("$/Project", vec![changeset]).build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:80"), windows().with_connector(connector))?;

	let latest = session.project("$/Project").latest_changeset()?.ok_or_else(|| anyhow::anyhow!("no history"))?;
	let browser = WebAccessBrowser::new("");
	assert_eq!(browser.changeset_link(&latest)?, "http://server:80/_versionControl/changeset/62643");
	assert_eq!(
		browser.diff_link(&latest, &latest.items[0])?.as_deref(),
		Some("http://server:80/_versionControl/changeset/62643#path=%24%2FProject%2Fsrc%2Fmain.cs&_a=compare")
	);
	Ok(())
}

#[test]
fn workspaces_round_trip_through_registry() -> anyhow::Result<()> {
	let (connector, _controller) = FakeServerBuilder::new().workspace(Workspace::new("ci-main", "agent01", "builder", "")).build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_connector(connector))?;
	let registry = session.workspaces();

	registry.create("ci-hotfix", "agent01", "hotfix builds")?;
	let names: Vec<_> = registry.list()?.into_iter().map(|ws| ws.name).collect();
	assert_eq!(names, ["ci-hotfix", "ci-main"]);
	Ok(())
}

#[derive(Serialize, Deserialize)]
struct CountLines {
	text: String,
}

impl RemoteCall for CountLines {
	type Output = usize;

	fn name(&self) -> &str {
		"count-lines"
	}

	fn call(self) -> Result<usize, CallError> {
		if self.text.is_empty() {
			return Err("nothing to count".into());
		}
		Ok(self.text.lines().count())
	}
}

struct OfflineChannel;

impl ExecutionChannel for OfflineChannel {
	fn dispatch(&self, _call: Box<dyn ErasedCall>) -> Result<Value, ChannelError> {
		Err(ChannelError::Unreachable("agent01 went offline".into()))
	}
}

#[test]
fn execute_runs_calls_locally_by_default() -> anyhow::Result<()> {
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows())?;
	assert_eq!(session.execute(CountLines { text: "a\nb\nc".into() })?, 3);
	Ok(())
}

#[test]
fn execute_reports_task_failures() -> anyhow::Result<()> {
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows())?;
	match session.execute(CountLines { text: String::new() }) {
		Err(Error::Execution { task, message }) => {
			assert_eq!(task, "count-lines");
			assert!(message.contains("nothing to count"));
		}
		other => anyhow::bail!("expected execution failure, got {other:?}"),
	}
	Ok(())
}

#[test]
fn execute_reports_unreachable_channel() -> anyhow::Result<()> {
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), windows().with_channel(Arc::new(OfflineChannel)))?;
	assert!(matches!(
		session.execute(CountLines { text: "a".into() }),
		Err(Error::Execution { message, .. }) if message.contains("went offline")
	));
	Ok(())
}
