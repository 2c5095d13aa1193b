//! Resolution pipeline: memberships → capability names → module patch → user record.
//!
//! Every stage here is synchronous and free of hidden state; per-batch memoization is
//! carried explicitly in [`GroupCapabilityCache`].

pub mod applier;
pub mod cache;
pub mod membership;
pub mod resolver;

pub use applier::{apply_patch, ApplyOutcome, EnablementApplier};
pub use cache::GroupCapabilityCache;
pub use membership::MembershipResolver;
pub use resolver::{build_patch, resolve_capability_names, resolve_patch, ModulePatch};
