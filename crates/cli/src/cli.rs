use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tfs")]
#[command(about = "Team Foundation Server session and web access link tool")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(flatten)]
	pub server: ServerArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Where the server configuration comes from. Flags override the file.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
	/// Server configuration file (JSON, camelCase keys)
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Collection URL, e.g. http://tfs.example.com:8080/tfs/DefaultCollection
	#[arg(long, global = true)]
	pub url: Option<String>,

	#[arg(long, global = true)]
	pub username: Option<String>,

	#[arg(long, global = true)]
	pub password: Option<String>,

	/// Proxy as HOST:PORT
	#[arg(long, global = true, value_name = "HOST:PORT")]
	pub proxy: Option<String>,

	/// Hosts that bypass the proxy, separated by commas, spaces or `|`; `*` is a wildcard
	#[arg(long, global = true, value_name = "HOSTS")]
	pub no_proxy: Option<String>,

	/// Treat the host as able to use integrated (single sign-on) credentials
	#[arg(long, global = true, conflicts_with = "no_default_credentials")]
	pub default_credentials: bool,

	/// Treat the host as unable to use integrated credentials
	#[arg(long, global = true)]
	pub no_default_credentials: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Format Team System Web Access links
	Link {
		#[command(subcommand)]
		target: LinkTarget,
	},

	/// Session inspection
	Session {
		#[command(subcommand)]
		action: SessionAction,
	},

	/// Proxy routing
	Proxy {
		#[command(subcommand)]
		action: ProxyAction,
	},
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
	/// Change set number
	pub version: String,

	/// Web access URL; defaults to the server URL
	#[arg(long, value_name = "URL")]
	pub browser_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LinkTarget {
	/// Link to a change set
	Changeset(LinkArgs),

	/// Link to a file as of a change set
	File {
		#[command(flatten)]
		link: LinkArgs,
		/// Server path, e.g. $/Project/src/main.cs
		path: String,
	},

	/// Link comparing a file with its previous version (edits only)
	Diff {
		#[command(flatten)]
		link: LinkArgs,
		/// Server path, e.g. $/Project/src/main.cs
		path: String,
		/// Change action recorded for the file
		#[arg(long, default_value = "edit")]
		action: String,
	},
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
	/// Open a session without connecting and show resolved credentials and proxy routing
	Inspect,
}

#[derive(Subcommand, Debug)]
pub enum ProxyAction {
	/// Show whether traffic to HOST goes through the proxy
	Check { host: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn global_server_flags_parse_after_subcommand() {
		let cli = Cli::try_parse_from(["tfs", "proxy", "check", "tfs.corp", "--proxy", "proxy.local:8080", "-vv"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.server.proxy.as_deref(), Some("proxy.local:8080"));
		assert!(matches!(cli.command, Commands::Proxy { action: ProxyAction::Check { host } } if host == "tfs.corp"));
	}

	#[test]
	fn diff_action_defaults_to_edit() {
		let cli = Cli::try_parse_from(["tfs", "link", "diff", "99", "$/Project/a.cs"]).unwrap();
		match cli.command {
			Commands::Link {
				target: LinkTarget::Diff { link, path, action },
			} => {
				assert_eq!(link.version, "99");
				assert_eq!(path, "$/Project/a.cs");
				assert_eq!(action, "edit");
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}
}
