use std::path::PathBuf;

use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Tfs(#[from] tfs::Error),

	#[error("Failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid configuration file {path}: {source}")]
	ConfigFile {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("{0}")]
	InvalidInput(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Tfs(tfs::Error::Configuration(_)) => ErrorCode::ConfigError,
			CliError::Tfs(tfs::Error::Connection { .. }) => ErrorCode::ConnectionFailed,
			CliError::Tfs(tfs::Error::Execution { .. }) => ErrorCode::ExecutionFailed,
			CliError::Tfs(_) => ErrorCode::SessionError,
			CliError::Io { .. } => ErrorCode::IoError,
			CliError::ConfigFile { .. } => ErrorCode::ConfigError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Json(_) => ErrorCode::InternalError,
		}
	}
}

pub type Result<T> = std::result::Result<T, CliError>;
