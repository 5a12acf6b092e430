//! Execution channel for work that runs on a build agent.
//!
//! A [`RemoteCall`] is a serializable description of a unit of work together
//! with the code that performs it. An [`ExecutionChannel`] ships the call to
//! wherever it should run and hands back the JSON-encoded result. The
//! session decodes the result and folds every channel-side failure into
//! [`Error::Execution`](crate::Error::Execution).
//!
//! Calls run to completion; there is no cancellation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Error type a call may fail with.
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// A unit of work that can be executed through an [`ExecutionChannel`].
pub trait RemoteCall: Serialize + Send + 'static {
	type Output: Serialize + DeserializeOwned + Send + 'static;

	/// Stable name identifying the kind of call.
	fn name(&self) -> &str;

	fn call(self) -> Result<Self::Output, CallError>;
}

/// Wire description of a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEnvelope {
	pub name: String,
	pub payload: Value,
}

/// Type-erased [`RemoteCall`] handed to channels.
pub trait ErasedCall: Send {
	fn describe(&self) -> Result<TaskEnvelope, ChannelError>;

	fn invoke(self: Box<Self>) -> Result<Value, ChannelError>;
}

impl<C: RemoteCall> ErasedCall for C {
	fn describe(&self) -> Result<TaskEnvelope, ChannelError> {
		Ok(TaskEnvelope {
			name: self.name().to_string(),
			payload: serde_json::to_value(self)?,
		})
	}

	fn invoke(self: Box<Self>) -> Result<Value, ChannelError> {
		let name = self.name().to_string();
		let output = (*self).call().map_err(|e| ChannelError::TaskFailed {
			task: name,
			message: e.to_string(),
		})?;
		Ok(serde_json::to_value(output)?)
	}
}

/// Failure kinds native to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
	#[error("Channel unreachable: {0}")]
	Unreachable(String),

	#[error("Task `{task}` failed: {message}")]
	TaskFailed { task: String, message: String },

	#[error("Serialization failed: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Carries calls to the place they execute.
pub trait ExecutionChannel: Send + Sync {
	fn dispatch(&self, call: Box<dyn ErasedCall>) -> Result<Value, ChannelError>;
}

/// Runs calls in the current process.
///
/// The call description is still serialized so that calls which would fail
/// to cross a real channel fail here too.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalChannel;

impl ExecutionChannel for LocalChannel {
	fn dispatch(&self, call: Box<dyn ErasedCall>) -> Result<Value, ChannelError> {
		let envelope = call.describe()?;
		trace!(target = "tfs.channel", task = %envelope.name, "running call locally");
		call.invoke()
	}
}
