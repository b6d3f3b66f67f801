//! Thread-local reactive runtime.
//!
//! The runtime owns the dependency graph between signals and effects and
//! the queue of effects waiting to re-run. Reads register edges through
//! [`Runtime::track_dependency`]; writes schedule subscribers through
//! [`Runtime::notify_signal_change`]; [`Runtime::flush_updates`] drains
//! the queue in scheduling order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for reactive nodes (signals and effects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
	/// Allocate a fresh id. Ids are unique per process, not per thread.
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// One node's edges in the dependency graph.
#[derive(Debug, Default)]
pub(crate) struct DependencyNode {
	/// Effects that must re-run when this node changes.
	pub(crate) subscribers: Vec<NodeId>,
	/// Signals this node read during its last run.
	pub(crate) dependencies: Vec<NodeId>,
}

/// The reactive runtime for the current thread.
///
/// All state transitions in the form engine happen on one thread, so the
/// runtime lives in thread-local storage and needs no locking.
pub struct Runtime {
	/// Stack of effects currently executing; the top is the observer that
	/// reads are attributed to.
	observer_stack: RefCell<Vec<NodeId>>,
	/// Dependency graph, keyed by node id.
	pub(crate) graph: RefCell<BTreeMap<NodeId, DependencyNode>>,
	/// Effects waiting to re-run, in scheduling order.
	pub(crate) pending: RefCell<Vec<NodeId>>,
	/// Guards against re-entrant flushes.
	flushing: RefCell<bool>,
}

impl Runtime {
	pub fn new() -> Self {
		Self {
			observer_stack: RefCell::new(Vec::new()),
			graph: RefCell::new(BTreeMap::new()),
			pending: RefCell::new(Vec::new()),
			flushing: RefCell::new(false),
		}
	}

	/// The effect currently executing, if any.
	pub fn current_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow().last().copied()
	}

	/// Enter an effect's execution scope.
	pub fn push_observer(&self, id: NodeId) {
		self.observer_stack.borrow_mut().push(id);
	}

	/// Leave the innermost effect's execution scope.
	pub fn pop_observer(&self) -> Option<NodeId> {
		self.observer_stack.borrow_mut().pop()
	}

	/// Record that the current observer read `signal_id`.
	///
	/// No-op when nothing is observing (a plain read outside any effect).
	pub fn track_dependency(&self, signal_id: NodeId) {
		let Some(observer_id) = self.current_observer() else {
			return;
		};
		let mut graph = self.graph.borrow_mut();

		let signal_node = graph.entry(signal_id).or_default();
		if !signal_node.subscribers.contains(&observer_id) {
			signal_node.subscribers.push(observer_id);
		}

		let observer_node = graph.entry(observer_id).or_default();
		if !observer_node.dependencies.contains(&signal_id) {
			observer_node.dependencies.push(signal_id);
		}
	}

	/// Schedule every subscriber of `signal_id` for re-execution.
	pub fn notify_signal_change(&self, signal_id: NodeId) {
		let subscribers = {
			let graph = self.graph.borrow();
			match graph.get(&signal_id) {
				Some(node) => node.subscribers.clone(),
				None => return,
			}
		};
		for subscriber in subscribers {
			self.schedule_update(subscriber);
		}
	}

	/// Queue a node for the next flush, deduplicating repeats.
	pub fn schedule_update(&self, node_id: NodeId) {
		let mut pending = self.pending.borrow_mut();
		if !pending.contains(&node_id) {
			pending.push(node_id);
		}
	}

	/// Drain the pending queue, re-running each scheduled effect.
	///
	/// Effects scheduled while the flush is running are drained by the
	/// same flush. Re-entrant calls return immediately.
	pub fn flush_updates(&self) {
		if *self.flushing.borrow() {
			return;
		}
		*self.flushing.borrow_mut() = true;

		loop {
			let batch = std::mem::take(&mut *self.pending.borrow_mut());
			if batch.is_empty() {
				break;
			}
			for node_id in batch {
				crate::effect::run_effect(node_id);
			}
		}

		*self.flushing.borrow_mut() = false;
	}

	/// Drop every dependency edge recorded for `node_id`.
	///
	/// Called before re-running an effect so stale reads do not keep it
	/// subscribed.
	pub fn clear_dependencies(&self, node_id: NodeId) {
		let mut graph = self.graph.borrow_mut();

		if let Some(node) = graph.get(&node_id) {
			let dependencies = node.dependencies.clone();
			for dep_id in dependencies {
				if let Some(dep_node) = graph.get_mut(&dep_id) {
					dep_node.subscribers.retain(|&id| id != node_id);
				}
			}
		}

		if let Some(node) = graph.get_mut(&node_id) {
			node.dependencies.clear();
		}
	}

	/// Remove a node from the graph entirely (signal or effect dropped).
	pub fn remove_node(&self, node_id: NodeId) {
		self.clear_dependencies(node_id);
		self.graph.borrow_mut().remove(&node_id);
		self.pending.borrow_mut().retain(|&id| id != node_id);
	}

	/// Number of effects subscribed to a node.
	pub fn subscriber_count(&self, node_id: NodeId) -> usize {
		self.graph
			.borrow()
			.get(&node_id)
			.map(|node| node.subscribers.len())
			.unwrap_or(0)
	}
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

thread_local! {
	static RUNTIME: Runtime = Runtime::new();
}

/// Run a closure against the current thread's runtime.
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.with(f)
}

/// Safe runtime access for `Drop` implementations; `None` once the
/// thread-local storage has been torn down.
pub(crate) fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Runtime) -> R,
{
	RUNTIME.try_with(f).ok()
}

/// Run a closure with dependency tracking suspended.
///
/// Signal reads inside the closure do not subscribe the surrounding
/// effect. This is how form operations take a snapshot of the document
/// without creating reactive feedback loops.
///
/// # Examples
///
/// ```
/// use formwork_reactive::{Signal, untracked};
///
/// let cell = Signal::new(7);
/// let snapshot = untracked(|| cell.get());
/// assert_eq!(snapshot, 7);
/// ```
pub fn untracked<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	let saved = with_runtime(|rt| std::mem::take(&mut *rt.observer_stack.borrow_mut()));
	let result = f();
	with_runtime(|rt| *rt.observer_stack.borrow_mut() = saved);
	result
}
