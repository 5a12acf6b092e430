use serde::Serialize;
use serde_json::Value;
use tfs::WebAccessBrowser;
use tfs_protocol::{ChangeSet, ChangeSetItem};

use crate::cli::{LinkArgs, LinkTarget, ServerArgs};
use crate::config::load_server_config;
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkOutput {
	version: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	path: Option<String>,
	/// `null` for a diff of anything but an edit.
	link: Option<String>,
}

pub(super) fn run(target: &LinkTarget, server: &ServerArgs) -> Result<Value> {
	let output = match target {
		LinkTarget::Changeset(args) => {
			let (browser, changeset) = prepare(args, server)?;
			LinkOutput {
				version: args.version.clone(),
				path: None,
				link: Some(browser.changeset_link(&changeset)?),
			}
		}
		LinkTarget::File { link, path } => {
			let (browser, changeset) = prepare(link, server)?;
			let item = ChangeSetItem::new(path.as_str(), "edit");
			LinkOutput {
				version: link.version.clone(),
				path: Some(path.clone()),
				link: Some(browser.file_link(&changeset, &item)?),
			}
		}
		LinkTarget::Diff { link, path, action } => {
			let (browser, changeset) = prepare(link, server)?;
			let item = ChangeSetItem::new(path.as_str(), action.as_str());
			LinkOutput {
				version: link.version.clone(),
				path: Some(path.clone()),
				link: browser.diff_link(&changeset, &item)?,
			}
		}
	};
	Ok(serde_json::to_value(output)?)
}

/// Builds the browser and a change set carrying the server URL as fallback base.
fn prepare(args: &LinkArgs, server: &ServerArgs) -> Result<(WebAccessBrowser, ChangeSet)> {
	if args.version.trim().is_empty() {
		return Err(CliError::InvalidInput("Change set version must not be empty".into()));
	}
	let config = load_server_config(server)?;
	let browser = WebAccessBrowser::new(args.browser_url.clone().unwrap_or_default());

	let mut changeset = ChangeSet::new(args.version.trim(), "", "");
	if !config.url.trim().is_empty() {
		changeset = changeset.with_server_url(config.url.trim());
	}
	Ok((browser, changeset))
}
