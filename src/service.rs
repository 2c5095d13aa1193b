//!
//! Caller-facing operations: catalog settings, reading and saving a group's
//! capabilities, and the administrative full re-sync.
//!
//! Each operation checks the caller's role first; nothing is read or written for an
//! unauthorized caller.

use crate::catalog::CatalogSettings;
use crate::error::CapaError;
use crate::events::{DomainEvent, Outcome, SkipReason, TriggerOutcome, TriggerRouter};
use crate::kernel::CapabilityEngine;
use crate::store::{decode_capability_blob, encode_capability_blob, Directory};
use crate::types::{Caller, CapabilityName, GroupId, UserRole};

/// Role gate used by every operation.
pub fn authorize(caller: &Caller, required: UserRole) -> Result<(), CapaError> {
    if caller.role.is_at_least(required) {
        Ok(())
    } else {
        Err(CapaError::Authorization { required, actual: caller.role })
    }
}

#[derive(Debug)]
pub struct CapabilitiesService<D: Directory> {
    engine: CapabilityEngine<D>,
    router: TriggerRouter<D>,
}

impl<D: Directory> CapabilitiesService<D> {
    /// Service wired with the standard trigger table.
    pub fn new(engine: CapabilityEngine<D>) -> Self {
        Self::with_router(engine, TriggerRouter::standard())
    }

    pub fn with_router(engine: CapabilityEngine<D>, router: TriggerRouter<D>) -> Self {
        CapabilitiesService { engine, router }
    }

    pub fn engine(&self) -> &CapabilityEngine<D> {
        &self.engine
    }

    /// Catalog metadata. Tenant admin or higher.
    pub fn get_settings(&self, caller: &Caller) -> Result<CatalogSettings<'_>, CapaError> {
        authorize(caller, UserRole::TenantAdmin)?;
        Ok(self.engine.catalog().settings())
    }

    /// Capability names stored on `group`, in stored order. Tenant admin or higher.
    ///
    /// Malformed stored data reads as an empty list.
    pub fn get_capabilities_of_group(&self, caller: &Caller, group: GroupId) -> Result<Vec<CapabilityName>, CapaError> {
        authorize(caller, UserRole::TenantAdmin)?;
        let raw = self.engine.directory().load_capabilities(group)?;
        Ok(decode_capability_blob(raw.as_deref()).unwrap_or_else(|e| {
            tracing::warn!(%group, error = %e, "malformed capability data on group, reporting none");
            Vec::new()
        }))
    }

    /// Replaces the capability list of `group` and re-syncs its current members.
    /// Tenant admin or higher.
    ///
    /// Returns `Ok(false)` when the store rejected the write; members are then left
    /// untouched. Per-member recompute failures do not change the result.
    pub fn save_capabilities_of_group(
        &self,
        caller: &Caller,
        group: GroupId,
        names: Vec<CapabilityName>,
    ) -> Result<bool, CapaError> {
        authorize(caller, UserRole::TenantAdmin)?;
        let directory = self.engine.directory();
        // Existence check; a missing group surfaces as GroupNotFound.
        directory.load_capabilities(group)?;

        let names = if self.engine.config().prune_unknown_capabilities_on_save {
            self.engine.catalog().retain_known(names)
        } else {
            names
        };
        let blob = encode_capability_blob(&names)?;
        let saved = directory.save_capabilities(group, &blob);
        if let Err(e) = &saved {
            tracing::warn!(%group, error = %e, "saving group capabilities failed");
        }

        let event = DomainEvent::GroupCapabilitiesSaved { group_id: group, names, outcome: Outcome::from(&saved) };
        if let Err(e) = self.router.dispatch(&self.engine, &event) {
            tracing::warn!(%group, error = %e, "member re-sync after capability save failed");
        }

        Ok(saved.is_ok())
    }

    /// Recomputes every user in the system. Super admin only.
    ///
    /// Returns `Ok(false)` if the re-sync could not run at all; individual user
    /// failures are only logged.
    pub fn init_capas(&self, caller: &Caller) -> Result<bool, CapaError> {
        authorize(caller, UserRole::SuperAdmin)?;
        match self.router.dispatch(&self.engine, &DomainEvent::InitCapas) {
            Ok(TriggerOutcome::Batch(report)) => {
                if !report.is_clean() {
                    tracing::warn!(failed = report.failed.len(), "full re-sync finished with user failures");
                }
                Ok(true)
            }
            Ok(other) => {
                tracing::warn!(outcome = ?other, "full re-sync did not run");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "full re-sync failed");
                Ok(false)
            }
        }
    }

    /// Feeds an upstream event (login, membership changes, group deletion) to the
    /// trigger table.
    ///
    /// `GroupCapabilitiesSaved` and `InitCapas` are skipped with
    /// [`SkipReason::ServiceOnly`]: they are raised by [`Self::save_capabilities_of_group`]
    /// and [`Self::init_capas`], which check the caller's role and persist first.
    pub fn handle(&self, event: &DomainEvent) -> Result<TriggerOutcome, CapaError> {
        let kind = event.kind();
        if !kind.is_upstream() {
            tracing::warn!(?kind, "refusing service-only event from outside the service");
            return Ok(TriggerOutcome::Skipped(SkipReason::ServiceOnly(kind)));
        }
        self.router.dispatch(&self.engine, event)
    }
}
