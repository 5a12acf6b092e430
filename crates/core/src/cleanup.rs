//! Close sequence for a session's remote resources.
//!
//! Order matters: the version control client goes first, then the
//! configuration-server connection the collection leaks, then the collection
//! itself. Every step runs even if an earlier one failed.

use tracing::{debug, warn};

use crate::error::{CleanupError, CleanupFailure, CleanupStep};
use crate::remote::{ProjectCollection, RemoteError, VersionControlClient};

/// Releases whatever the session managed to create.
pub(crate) fn release(client: Option<&dyn VersionControlClient>, collection: Option<&dyn ProjectCollection>) -> Result<(), CleanupError> {
	let mut failures = Vec::new();

	if let Some(client) = client {
		record(&mut failures, CleanupStep::VersionControlClient, client.close());
	}

	if let Some(collection) = collection {
		close_leaked_configuration_server(collection, &mut failures);
		record(&mut failures, CleanupStep::Collection, collection.close());
	}

	if failures.is_empty() {
		debug!(target = "tfs.cleanup", "session resources released");
		Ok(())
	} else {
		Err(CleanupError { failures })
	}
}

/// Best-effort shim: the client library keeps a configuration-server
/// connection it never closes. When the collection cannot reach it the step
/// is skipped.
fn close_leaked_configuration_server(collection: &dyn ProjectCollection, failures: &mut Vec<CleanupFailure>) {
	match collection.leaked_configuration_server() {
		Ok(Some(server)) => record(failures, CleanupStep::ConfigurationServer, server.close()),
		Ok(None) => {}
		Err(reason) => {
			debug!(target = "tfs.cleanup", %reason, "configuration server not reachable; skipping");
		}
	}
}

fn record(failures: &mut Vec<CleanupFailure>, step: CleanupStep, result: Result<(), RemoteError>) {
	if let Err(source) = result {
		warn!(target = "tfs.cleanup", %step, error = %source, "close step failed");
		failures.push(CleanupFailure { step, source });
	}
}
