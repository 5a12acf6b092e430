//! Concurrent access to a shared session.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tfs::fake::FakeServerBuilder;
use tfs::tfs_protocol::{ChangeSet, ServerConfig};
use tfs::{ConnectionSession, Error, LazyState, PlatformCapabilities, RemoteError, SessionOptions};

const THREADS: usize = 12;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

fn options() -> SessionOptions {
	SessionOptions::default().with_platform(PlatformCapabilities::with_default_credentials(true))
}

#[test]
fn concurrent_first_use_builds_one_client() -> anyhow::Result<()> {
	init_tracing();
	let (connector, controller) = FakeServerBuilder::new().client_delay(Duration::from_millis(50)).build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options().with_connector(connector))?;
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let session = session.clone();
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				session.remote_client()
			})
		})
		.collect();

	let clients = handles
		.into_iter()
		.map(|h| h.join().map_err(|_| anyhow::anyhow!("worker panicked"))?.map_err(anyhow::Error::from))
		.collect::<anyhow::Result<Vec<_>>>()?;

	assert_eq!(controller.connect_calls(), 1);
	assert_eq!(controller.client_calls(), 1);
	assert!(clients.iter().all(|client| Arc::ptr_eq(client, &clients[0])));
	assert_eq!(session.client_state(), LazyState::Ready);
	Ok(())
}

#[test]
fn concurrent_project_lookups_share_one_handle() -> anyhow::Result<()> {
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options())?;
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let session = session.clone();
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				session.project("$/Shared/Main")
			})
		})
		.collect();

	let projects = handles
		.into_iter()
		.map(|h| h.join().map_err(|_| anyhow::anyhow!("worker panicked")))
		.collect::<anyhow::Result<Vec<_>>>()?;

	assert!(projects.iter().all(|p| Arc::ptr_eq(p, &projects[0])));
	Ok(())
}

#[test]
fn rejected_credentials_are_tried_once_under_contention() -> anyhow::Result<()> {
	init_tracing();
	let (connector, controller) = FakeServerBuilder::new()
		.client_delay(Duration::from_millis(50))
		.fail_client(RemoteError::Unauthorized("builder".into()))
		.build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options().with_connector(connector))?;
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let session = session.clone();
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				session.remote_client().err()
			})
		})
		.collect();

	for handle in handles {
		let err = handle.join().map_err(|_| anyhow::anyhow!("worker panicked"))?;
		assert!(matches!(
			err,
			Some(Error::Connection {
				source: RemoteError::Unauthorized(_),
				..
			})
		));
	}

	assert!(matches!(
		session.remote_client(),
		Err(Error::Connection {
			source: RemoteError::Unauthorized(_),
			..
		})
	));
	assert_eq!(session.client_state(), LazyState::Failed);
	assert_eq!(controller.connect_calls(), 1);
	assert_eq!(controller.client_calls(), 1);
	Ok(())
}

#[test]
fn concurrent_close_runs_cleanup_once() -> anyhow::Result<()> {
	init_tracing();
	let (connector, controller) = FakeServerBuilder::new().fail_client_close().build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options().with_connector(connector))?;
	session.remote_client()?;
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|_| {
			let session = session.clone();
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				session.close()
			})
		})
		.collect();

	let failures = handles
		.into_iter()
		.map(|h| h.join().map_err(|_| anyhow::anyhow!("worker panicked")))
		.collect::<anyhow::Result<Vec<_>>>()?
		.into_iter()
		.filter(Result::is_err)
		.count();

	// Client close always fails here, so exactly the one caller that ran cleanup sees it.
	assert_eq!(failures, 1);
	assert!(controller.collection_closed());
	Ok(())
}

#[test]
fn close_racing_with_first_use_never_leaks() -> anyhow::Result<()> {
	let (connector, controller) = FakeServerBuilder::new()
		.client_delay(Duration::from_millis(30))
		.history("$/Project", vec![ChangeSet::new("1", "builder", "initial")])
		.build();
	let session = ConnectionSession::open(ServerConfig::new("http://server:8080/tfs"), options().with_connector(connector))?;

	let worker = {
		let session = session.clone();
		thread::spawn(move || session.project("$/Project").history(5))
	};
	thread::sleep(Duration::from_millis(10));
	session.close()?;

	match worker.join().map_err(|_| anyhow::anyhow!("worker panicked"))? {
		Ok(history) => assert_eq!(history.len(), 1),
		Err(Error::SessionClosed(_)) | Err(Error::Remote(RemoteError::Closed)) => {}
		Err(other) => anyhow::bail!("unexpected error: {other}"),
	}

	// Whatever the worker managed to build was released by close.
	if controller.client_calls() > 0 {
		assert!(controller.client_closed());
	}
	if controller.connect_calls() > 0 {
		assert!(controller.collection_closed());
	}
	assert!(matches!(session.remote_client(), Err(Error::SessionClosed(_))));
	Ok(())
}
