//!
//! Domain events consumed by the engine and the trigger table that reacts to them.
//!
//! Every upstream mutation is described by a [`DomainEvent`] value carrying an
//! explicit [`Outcome`]; recomputation only runs for mutations that committed.

pub mod event;
pub mod router;

pub use event::{DomainEvent, EventKind, Outcome};
pub use router::{Handler, SkipReason, TriggerOutcome, TriggerRouter};
