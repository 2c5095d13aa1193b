#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Capa-Core resolves which product modules a user may use from the capabilities
//! held by the groups the user belongs to, and keeps the per-user module flags in sync
//! when memberships, group capabilities or the whole system change.
//!
//! The crate is synchronous and storage-agnostic: group capability blobs, memberships
//! and user records are reached through the traits in [`store`].

// Shared identifiers and the role ladder.
pub mod types;

// Crate error type.
pub mod error;

// Capability catalog (configuration-derived, read-only at runtime).
pub mod catalog;

// Engine configuration.
pub mod config;

// Collaborator traits and the stored blob format.
pub mod store;

// Cache, membership batching, resolver and applier.
pub mod resolution;

// Engine and batch context.
pub mod kernel;

// Domain events and the trigger table.
pub mod events;

// Caller-facing operations.
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testkit;

pub use catalog::{Capability, CapabilityConfig, Catalog, KeyLocalizer, Localizer};
pub use config::EngineConfig;
pub use error::CapaError;
pub use events::{DomainEvent, EventKind, Outcome, TriggerOutcome, TriggerRouter};
pub use kernel::{BatchReport, CapabilityEngine, ResolutionBatch};
pub use resolution::{ApplyOutcome, ModulePatch};
pub use service::CapabilitiesService;
pub use store::{Directory, GroupCapabilityStore, Membership, MembershipStore, User, UserStore};
pub use types::{Caller, GroupId, UserId, UserRole};
