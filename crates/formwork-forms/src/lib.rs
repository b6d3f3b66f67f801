//! Reactive form state and the lifecycle event bridge for formwork
//!
//! The pieces, inside out:
//!
//! - [`FormInstance`] — the per-form state machine: a reactive document,
//!   a reactive schema and an [`ErrorStore`], with the
//!   change/invalidate/validate/submit transitions
//! - [`FormScope`] — scoped event dispatch: handlers, the default
//!   merge/validate/submit cascade, and upward sub-document merge
//! - [`DataContext`] — the reactive `{doc, schema}` pair an enclosing
//!   template supplies; attaching it keeps a form seeded from outside
//!
//! Lifecycle events carry stable wire names: `propertyChange`,
//! `documentChange`, `propertyInvalid`, `documentInvalid` and
//! `documentSubmit`.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod form;
pub mod scope;
pub mod store;

pub use config::FormConfig;
pub use context::{ContextData, DataContext};
pub use error::FormError;
pub use events::{BridgeEvent, Changes, Lifecycle, SourceEvent};
pub use form::FormInstance;
pub use scope::{FormScope, Mount};
pub use store::{ErrorRecord, ErrorStore};
