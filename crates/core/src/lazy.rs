//! Construct-once cell for expensive remote handles.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──(first caller takes init lock)──▶ Initializing ──ok──▶ Ready
//!                                                        │
//!                                                        └──err──▶ Failed
//! ```
//!
//! Reads of a `Ready` or `Failed` handle never touch the lock. Callers that
//! arrive while another thread is `Initializing` block on the init lock, then
//! find the outcome already recorded and return it. Construction runs exactly
//! once, however many threads race for it: a failure is stored and handed
//! to every later caller instead of triggering another attempt.
//!
//! There is no timeout: if construction hangs, every waiting caller hangs
//! with it.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// Observable phase of a [`LazyHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
	Uninitialized,
	Initializing,
	Ready,
	/// Construction failed; the handle keeps returning that error.
	Failed,
}

/// Thread-safe lazily initialized value with double-checked locking.
///
/// `E` is the construction error. It is kept after a failed attempt so that
/// the handle never runs its initializer a second time.
pub struct LazyHandle<T, E> {
	value: OnceLock<T>,
	failure: OnceLock<E>,
	init_lock: Mutex<()>,
	state: AtomicU8,
}

impl<T, E> LazyHandle<T, E> {
	pub fn new() -> Self {
		Self {
			value: OnceLock::new(),
			failure: OnceLock::new(),
			init_lock: Mutex::new(()),
			state: AtomicU8::new(UNINITIALIZED),
		}
	}

	pub fn state(&self) -> LazyState {
		match self.state.load(Ordering::Acquire) {
			READY => LazyState::Ready,
			FAILED => LazyState::Failed,
			INITIALIZING => LazyState::Initializing,
			_ => LazyState::Uninitialized,
		}
	}

	/// Returns the value if it is ready, without blocking.
	pub fn get(&self) -> Option<&T> {
		self.value.get()
	}

	/// Returns the recorded construction error, without blocking.
	pub fn failure(&self) -> Option<&E> {
		self.failure.get()
	}

	/// Waits for any in-flight initialization, then returns the value if one
	/// was built.
	pub fn settle(&self) -> Option<&T> {
		let _guard = self.init_lock.lock();
		self.value.get()
	}

	/// Returns the value, running `init` first if nothing has been attempted
	/// yet.
	///
	/// Only one caller ever runs `init`. If it fails, the error is recorded,
	/// the handle moves to [`LazyState::Failed`], and that caller, every
	/// caller waiting on the lock, and every later caller receive a clone of
	/// the same error.
	pub fn get_or_try_init(&self, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E>
	where
		E: Clone,
	{
		if let Some(outcome) = self.recorded() {
			return outcome;
		}

		let _guard = self.init_lock.lock();
		if let Some(outcome) = self.recorded() {
			return outcome;
		}

		self.state.store(INITIALIZING, Ordering::Release);
		match init() {
			Ok(value) => {
				let value = self.value.get_or_init(|| value);
				self.state.store(READY, Ordering::Release);
				Ok(value)
			}
			Err(err) => {
				let err = self.failure.get_or_init(|| err);
				self.state.store(FAILED, Ordering::Release);
				Err(err.clone())
			}
		}
	}

	fn recorded(&self) -> Option<Result<&T, E>>
	where
		E: Clone,
	{
		if let Some(value) = self.value.get() {
			return Some(Ok(value));
		}
		self.failure.get().map(|err| Err(err.clone()))
	}
}

impl<T, E> Default for LazyHandle<T, E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for LazyHandle<T, E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LazyHandle")
			.field("state", &self.state())
			.field("value", &self.value.get())
			.field("failure", &self.failure.get())
			.finish()
	}
}
