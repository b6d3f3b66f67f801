//! `Effect` — a computation that re-runs when its inputs change.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::runtime::{NodeId, try_with_runtime, with_runtime};

type EffectFn = Box<dyn FnMut() + 'static>;

thread_local! {
	// Effect closures live outside the runtime so the runtime can stay
	// borrowed while an effect body runs.
	static EFFECT_FUNCTIONS: RefCell<BTreeMap<NodeId, EffectFn>> = const { RefCell::new(BTreeMap::new()) };
}

/// A reactive computation.
///
/// The closure runs once at construction. Every [`Signal`](crate::Signal)
/// it reads becomes a dependency; when any of them changes, the effect is
/// queued and re-runs on the next [`flush`](crate::flush). Dependencies
/// are re-collected on every run, so conditional reads behave correctly.
///
/// Dropping or [`dispose`](Effect::dispose)-ing the handle detaches the
/// effect permanently.
///
/// # Examples
///
/// ```
/// use formwork_reactive::{Effect, Signal, flush};
///
/// let count = Signal::new(2);
/// let doubled = Signal::new(0);
///
/// let count2 = count.clone();
/// let doubled2 = doubled.clone();
/// let _effect = Effect::new(move || {
///     doubled2.set(count2.get() * 2);
/// });
/// assert_eq!(doubled.get(), 4);
///
/// count.set(5);
/// flush();
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Effect {
	id: NodeId,
	disposed: Rc<RefCell<bool>>,
}

impl Effect {
	/// Create an effect and run it immediately.
	pub fn new<F>(mut f: F) -> Self
	where
		F: FnMut() + 'static,
	{
		let id = NodeId::new();
		let disposed = Rc::new(RefCell::new(false));

		let disposed_flag = disposed.clone();
		EFFECT_FUNCTIONS.with(|storage| {
			storage.borrow_mut().insert(
				id,
				Box::new(move || {
					if !*disposed_flag.borrow() {
						f();
					}
				}),
			);
		});

		run_effect(id);

		Self { id, disposed }
	}

	/// This effect's node id (used by the runtime and tests).
	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Detach the effect: it will never run again.
	pub fn dispose(&self) {
		*self.disposed.borrow_mut() = true;
		let _ = try_with_runtime(|rt| rt.remove_node(self.id));
		let _ = EFFECT_FUNCTIONS.try_with(|storage| {
			storage.borrow_mut().remove(&self.id);
		});
	}
}

impl Drop for Effect {
	fn drop(&mut self) {
		self.dispose();
	}
}

/// Execute one effect body, re-collecting its dependencies.
///
/// Called at construction and by the runtime's flush loop.
pub(crate) fn run_effect(effect_id: NodeId) {
	with_runtime(|rt| {
		rt.clear_dependencies(effect_id);
		rt.push_observer(effect_id);
	});

	// The closure is moved out for the duration of the call so an effect
	// that creates another effect cannot alias the storage borrow.
	let f = EFFECT_FUNCTIONS.with(|storage| storage.borrow_mut().remove(&effect_id));
	if let Some(mut f) = f {
		f();
		EFFECT_FUNCTIONS.with(|storage| {
			storage.borrow_mut().insert(effect_id, f);
		});
	}

	with_runtime(|rt| {
		rt.pop_observer();
	});
}
