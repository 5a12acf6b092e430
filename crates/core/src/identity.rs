//! Identity lookup for user accounts.

use serde::{Deserialize, Serialize};

use crate::remote::RemoteError;

/// A resolved user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	/// Account name as given, e.g. `DOMAIN\builder`.
	pub account_name: String,
	pub display_name: String,
}

/// Resolves account names to identities.
pub trait IdentityService: Send + Sync {
	fn resolve(&self, account_name: &str) -> Result<Identity, RemoteError>;
}

/// Fallback for servers that do not expose identity management.
///
/// Identities are derived from the account name alone: the display name is
/// the account without its `DOMAIN\` prefix or `@realm` suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyIdentityService;

impl IdentityService for LegacyIdentityService {
	fn resolve(&self, account_name: &str) -> Result<Identity, RemoteError> {
		let unqualified = account_name.rsplit_once('\\').map_or(account_name, |(_, name)| name);
		let unqualified = unqualified.split_once('@').map_or(unqualified, |(name, _)| name);
		if unqualified.is_empty() {
			return Err(RemoteError::NotFound(format!("identity `{account_name}`")));
		}
		Ok(Identity {
			account_name: account_name.to_string(),
			display_name: unqualified.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn legacy_service_strips_domain_and_realm() {
		let service = LegacyIdentityService;
		assert_eq!(service.resolve("CORP\\builder").unwrap().display_name, "builder");
		assert_eq!(service.resolve("builder@corp.local").unwrap().display_name, "builder");
		assert_eq!(service.resolve("builder").unwrap().account_name, "builder");
	}

	#[test]
	fn legacy_service_rejects_empty_names() {
		assert!(matches!(LegacyIdentityService.resolve("CORP\\"), Err(RemoteError::NotFound(_))));
	}
}
