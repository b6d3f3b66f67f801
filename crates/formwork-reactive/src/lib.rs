//! Fine-grained reactive cells for formwork
//!
//! This crate provides the reactive substrate the form engine is built on:
//!
//! - [`Signal`] — a value cell that records which computations read it
//! - [`Effect`] — a computation that re-runs when a signal it read changes
//! - a thread-local [`Runtime`] holding the dependency graph and the
//!   pending-update queue
//!
//! The model is deliberately single-threaded and cooperative: a `set()`
//! never re-runs dependents inline. It marks them pending, and they run
//! when [`flush`] drains the queue, always after the mutation that
//! triggered them has completed.

pub mod effect;
pub mod runtime;
pub mod signal;

pub use effect::Effect;
pub use runtime::{NodeId, Runtime, untracked, with_runtime};
pub use signal::Signal;

/// Drain the pending-update queue, re-running every scheduled effect.
///
/// Calling `flush` while a flush is already in progress is a no-op for
/// the outer call; effects scheduled during a flush are picked up by the
/// same flush.
///
/// # Examples
///
/// ```
/// use formwork_reactive::{Effect, Signal, flush};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let cell = Signal::new(1);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let seen2 = seen.clone();
/// let cell2 = cell.clone();
/// let _effect = Effect::new(move || {
///     seen2.borrow_mut().push(cell2.get());
/// });
///
/// cell.set(2);
/// flush();
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub fn flush() {
	with_runtime(|rt| rt.flush_updates());
}
