//! Links into the Team System Web Access repository browser.
//!
//! ```text
//! <base>_versionControl/changeset/<version>
//! <base>_versionControl/changeset/<version>#path=<encoded path>&_a=contents
//! <base>_versionControl/changeset/<version>#path=<encoded path>&_a=compare
//! ```
//!
//! Links are returned as strings: an explicitly configured port is kept even
//! when it is the scheme's default (`http://server:80/`), which [`Url`]
//! would normalize away.

use serde::{Deserialize, Serialize};
use tfs_protocol::{ChangeSet, ChangeSetItem, EditType};
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::error::{Error, Result};

/// Repository browser pointing at a web access site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAccessBrowser {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	url: Option<String>,
}

impl WebAccessBrowser {
	/// An empty or blank `url` means "use the server URL of each change set".
	pub fn new(url: impl Into<String>) -> Self {
		let url = url.into();
		let url = url.trim();
		Self {
			url: (!url.is_empty()).then(|| url.to_string()),
		}
	}

	pub fn url(&self) -> Option<&str> {
		self.url.as_deref()
	}

	/// Link to the change set summary page.
	pub fn changeset_link(&self, changeset: &ChangeSet) -> Result<String> {
		Ok(format!("{}_versionControl/changeset/{}", self.base_for(changeset)?, changeset.version))
	}

	/// Link to the content of `item` as of `changeset`.
	pub fn file_link(&self, changeset: &ChangeSet, item: &ChangeSetItem) -> Result<String> {
		self.item_link(changeset, item, "contents")
	}

	/// Link comparing `item` with its previous version. Only edits have one.
	pub fn diff_link(&self, changeset: &ChangeSet, item: &ChangeSetItem) -> Result<Option<String>> {
		if item.edit_type() != EditType::Edit {
			return Ok(None);
		}
		self.item_link(changeset, item, "compare").map(Some)
	}

	fn item_link(&self, changeset: &ChangeSet, item: &ChangeSetItem, action: &str) -> Result<String> {
		Ok(format!(
			"{}#path={}&_a={action}",
			self.changeset_link(changeset)?,
			byte_serialize(item.path.as_bytes()).collect::<String>()
		))
	}

	fn base_for(&self, changeset: &ChangeSet) -> Result<String> {
		if let Some(url) = &self.url {
			return base_url(url);
		}
		match changeset.server_url.as_deref() {
			Some(server) if server.ends_with('/') => Ok(server.to_string()),
			Some(server) => Ok(format!("{server}/")),
			None => Err(Error::Configuration(format!(
				"No web access URL configured and change set {} carries no server URL",
				changeset.version
			))),
		}
	}
}

/// Normalizes a web access URL to `scheme://host[:port]/path/`.
///
/// Query, fragment and user info are dropped. A trailing `/` is added to the
/// path when missing.
pub fn base_url(url: &str) -> Result<String> {
	let parsed = Url::parse(url).map_err(|e| Error::Configuration(format!("Invalid web access URL `{url}`: {e}")))?;
	let host = parsed
		.host_str()
		.ok_or_else(|| Error::Configuration(format!("Web access URL `{url}` has no host")))?;

	let port = match parsed.port() {
		Some(port) => Some(port),
		None if has_explicit_port(url) => parsed.port_or_known_default(),
		None => None,
	};

	let mut base = format!("{}://{host}", parsed.scheme());
	if let Some(port) = port {
		base.push_str(&format!(":{port}"));
	}
	base.push_str(parsed.path());
	if !base.ends_with('/') {
		base.push('/');
	}
	Ok(base)
}

/// Whether the authority of `url` spells out a port, even a default one.
fn has_explicit_port(url: &str) -> bool {
	let Some((_, rest)) = url.split_once("://") else {
		return false;
	};
	let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
	let host_port = authority.rsplit('@').next().unwrap_or_default();
	let after_host = match host_port.rfind(']') {
		Some(end) => &host_port[end + 1..],
		None => host_port,
	};
	after_host
		.rsplit_once(':')
		.is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
