//! Redacting wrapper for sensitive strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A string that never shows up in `Debug` or `Display` output.
///
/// Serializes transparently so configuration files can carry it as a plain
/// string.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the plain-text value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl fmt::Debug for Secret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Secret(****)")
	}
}

impl fmt::Display for Secret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("****")
	}
}
