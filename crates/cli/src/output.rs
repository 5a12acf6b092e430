//! JSON envelope printed on stdout by every command.

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}
}

impl CommandResult<()> {
	pub fn failure(command: impl Into<String>, err: &CliError) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(CommandError {
				code: err.code(),
				message: err.to_string(),
			}),
		}
	}
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	ConfigError,
	ConnectionFailed,
	ExecutionFailed,
	SessionError,
	IoError,
	InvalidInput,
	InternalError,
}

/// Prints `result` as pretty JSON on stdout.
pub fn print_result<T: Serialize>(result: &CommandResult<T>) -> Result<(), CliError> {
	println!("{}", serde_json::to_string_pretty(result)?);
	Ok(())
}
