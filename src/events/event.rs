//! Domain event values and their committed/failed outcome.

use crate::types::{CapabilityName, GroupId, UserId, UserRole};

/// Whether the upstream operation that produced an event actually committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Failed { reason: String },
}

impl Outcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed { reason: reason.into() }
    }
}

impl<T, E: std::fmt::Display> From<&Result<T, E>> for Outcome {
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Committed,
            Err(e) => Outcome::failed(e.to_string()),
        }
    }
}

/// Upstream domain events that can change a user's effective modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A user authenticated.
    UserLoggedIn { user_id: UserId, role: UserRole, outcome: Outcome },
    /// A group's capability list was written.
    GroupCapabilitiesSaved { group_id: GroupId, names: Vec<CapabilityName>, outcome: Outcome },
    UsersAddedToGroup { group_id: GroupId, user_ids: Vec<UserId>, outcome: Outcome },
    UsersRemovedFromGroup { group_id: GroupId, user_ids: Vec<UserId>, outcome: Outcome },
    /// Groups were deleted. On success the deletion reports the users that were
    /// members of the deleted groups.
    GroupsDeleted { group_ids: Vec<GroupId>, affected_users: Result<Vec<UserId>, String> },
    /// The full group list of one user was replaced.
    UserGroupsSaved { user_id: UserId, outcome: Outcome },
    /// Operator-requested re-sync of every user.
    InitCapas,
}

/// Discriminant used to key trigger handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    UserLoggedIn,
    GroupCapabilitiesSaved,
    UsersAddedToGroup,
    UsersRemovedFromGroup,
    GroupsDeleted,
    UserGroupsSaved,
    InitCapas,
}

impl EventKind {
    /// `false` for events only the capabilities service raises itself: the save of a
    /// group's capability list and the operator re-sync.
    pub fn is_upstream(self) -> bool {
        !matches!(self, EventKind::GroupCapabilitiesSaved | EventKind::InitCapas)
    }
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::UserLoggedIn { .. } => EventKind::UserLoggedIn,
            DomainEvent::GroupCapabilitiesSaved { .. } => EventKind::GroupCapabilitiesSaved,
            DomainEvent::UsersAddedToGroup { .. } => EventKind::UsersAddedToGroup,
            DomainEvent::UsersRemovedFromGroup { .. } => EventKind::UsersRemovedFromGroup,
            DomainEvent::GroupsDeleted { .. } => EventKind::GroupsDeleted,
            DomainEvent::UserGroupsSaved { .. } => EventKind::UserGroupsSaved,
            DomainEvent::InitCapas => EventKind::InitCapas,
        }
    }
}
