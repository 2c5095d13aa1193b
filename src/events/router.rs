//! Trigger table: event kind → handler.
//!
//! Handlers are plain functions registered explicitly on a [`TriggerRouter`]; there
//! is no global subscriber list and no implicit ordering between handlers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::CapaError;
use crate::events::event::{DomainEvent, EventKind, Outcome};
use crate::kernel::{BatchReport, CapabilityEngine};
use crate::resolution::ApplyOutcome;
use crate::store::Directory;
use crate::types::UserId;

/// Why a trigger did not recompute anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The upstream mutation did not commit.
    NotCommitted(String),
    /// Login of a privileged account while privileged recompute is disabled.
    PrivilegedAccount,
    /// No handler is registered for the event kind.
    NoHandler,
    /// The handler was registered under a kind that does not match the event.
    UnexpectedPayload(EventKind),
    /// Event kind the service raises itself; refused when fed in from outside.
    ServiceOnly(EventKind),
}

/// What a dispatched event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Skipped(SkipReason),
    /// Single-user path result.
    User { user_id: UserId, outcome: ApplyOutcome },
    /// Batch path result.
    Batch(BatchReport),
}

impl TriggerOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TriggerOutcome::Skipped(_))
    }
}

/// Signature of a trigger handler.
pub type Handler<D> = fn(&CapabilityEngine<D>, &DomainEvent) -> Result<TriggerOutcome, CapaError>;

pub struct TriggerRouter<D: Directory> {
    handlers: BTreeMap<EventKind, Handler<D>>,
}

impl<D: Directory> fmt::Debug for TriggerRouter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRouter")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<D: Directory> Default for TriggerRouter<D> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<D: Directory> TriggerRouter<D> {
    /// A router with no handlers; every event is skipped.
    pub fn empty() -> Self {
        TriggerRouter { handlers: BTreeMap::new() }
    }

    /// A router with the standard trigger table registered.
    pub fn standard() -> Self {
        let mut router = Self::empty();
        router.register(EventKind::UserLoggedIn, on_user_logged_in::<D>);
        router.register(EventKind::GroupCapabilitiesSaved, on_group_capabilities_saved::<D>);
        router.register(EventKind::UsersAddedToGroup, on_users_added_to_group::<D>);
        router.register(EventKind::UsersRemovedFromGroup, on_users_removed_from_group::<D>);
        router.register(EventKind::GroupsDeleted, on_groups_deleted::<D>);
        router.register(EventKind::UserGroupsSaved, on_user_groups_saved::<D>);
        router.register(EventKind::InitCapas, on_init_capas::<D>);
        router
    }

    /// Registers `handler` for `kind`, returning the handler it replaced.
    pub fn register(&mut self, kind: EventKind, handler: Handler<D>) -> Option<Handler<D>> {
        self.handlers.insert(kind, handler)
    }

    /// Runs the handler registered for the event's kind.
    pub fn dispatch(&self, engine: &CapabilityEngine<D>, event: &DomainEvent) -> Result<TriggerOutcome, CapaError> {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::debug!(?kind, "no trigger registered for event");
            return Ok(TriggerOutcome::Skipped(SkipReason::NoHandler));
        };

        let outcome = handler(engine, event)?;
        if let TriggerOutcome::Skipped(reason) = &outcome {
            tracing::debug!(?kind, ?reason, "trigger skipped");
        }
        Ok(outcome)
    }
}

fn gate(outcome: &Outcome) -> Option<TriggerOutcome> {
    match outcome {
        Outcome::Committed => None,
        Outcome::Failed { reason } => Some(TriggerOutcome::Skipped(SkipReason::NotCommitted(reason.clone()))),
    }
}

fn unexpected(event: &DomainEvent) -> Result<TriggerOutcome, CapaError> {
    Ok(TriggerOutcome::Skipped(SkipReason::UnexpectedPayload(event.kind())))
}

fn recompute_batch<D: Directory>(
    engine: &CapabilityEngine<D>,
    users: &[UserId],
) -> Result<TriggerOutcome, CapaError> {
    let users: BTreeSet<UserId> = users.iter().copied().collect();
    engine.recompute_users(&users).map(TriggerOutcome::Batch)
}

fn on_user_logged_in<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::UserLoggedIn { user_id, role, outcome } = event else {
        return unexpected(event);
    };
    if let Some(skip) = gate(outcome) {
        return Ok(skip);
    }
    if role.is_privileged() && !engine.config().recompute_privileged_on_login {
        return Ok(TriggerOutcome::Skipped(SkipReason::PrivilegedAccount));
    }

    let outcome = engine.recompute_user(*user_id)?;
    Ok(TriggerOutcome::User { user_id: *user_id, outcome })
}

fn on_group_capabilities_saved<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::GroupCapabilitiesSaved { group_id, names, outcome } = event else {
        return unexpected(event);
    };
    if let Some(skip) = gate(outcome) {
        return Ok(skip);
    }

    engine.recompute_group(*group_id, Some(names.as_slice())).map(TriggerOutcome::Batch)
}

fn on_users_added_to_group<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::UsersAddedToGroup { user_ids, outcome, .. } = event else {
        return unexpected(event);
    };
    if let Some(skip) = gate(outcome) {
        return Ok(skip);
    }
    recompute_batch(engine, user_ids)
}

fn on_users_removed_from_group<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::UsersRemovedFromGroup { user_ids, outcome, .. } = event else {
        return unexpected(event);
    };
    if let Some(skip) = gate(outcome) {
        return Ok(skip);
    }
    recompute_batch(engine, user_ids)
}

fn on_groups_deleted<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::GroupsDeleted { affected_users, .. } = event else {
        return unexpected(event);
    };
    match affected_users {
        Ok(users) => recompute_batch(engine, users),
        Err(reason) => Ok(TriggerOutcome::Skipped(SkipReason::NotCommitted(reason.clone()))),
    }
}

fn on_user_groups_saved<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    let DomainEvent::UserGroupsSaved { user_id, outcome } = event else {
        return unexpected(event);
    };
    if let Some(skip) = gate(outcome) {
        return Ok(skip);
    }
    // Bulk path even for one user, same as the other membership triggers.
    recompute_batch(engine, std::slice::from_ref(user_id))
}

fn on_init_capas<D: Directory>(
    engine: &CapabilityEngine<D>,
    event: &DomainEvent,
) -> Result<TriggerOutcome, CapaError> {
    if !matches!(event, DomainEvent::InitCapas) {
        return unexpected(event);
    }
    engine.recompute_all().map(TriggerOutcome::Batch)
}
