//!
//! Core engine logic: resolving module enablement for users and writing it back.
//!
//! Two code paths exist. The single-user path (used after login) resolves memberships
//! with one query for that user. The batch path prefetches memberships for every user
//! in one bulk query and shares one group capability cache across them, so a group
//! is read at most once per batch no matter how many of its members are processed.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::CapaError;
use crate::kernel::batch::ResolutionBatch;
use crate::resolution::{resolve_patch, ApplyOutcome, EnablementApplier, MembershipResolver, ModulePatch};
use crate::store::Directory;
use crate::types::{CapabilityName, GroupId, UserId};

/// Per-user results of one batch recompute.
///
/// Failures are collected rather than propagated: one user's failure never stops the
/// rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of distinct users the batch was asked to recompute.
    pub requested: usize,
    /// Users whose enablement changed and was persisted.
    pub updated: Vec<UserId>,
    /// Users whose enablement already matched.
    pub unchanged: Vec<UserId>,
    /// Requested users the user store does not know.
    pub missing: Vec<UserId>,
    /// Users whose resolution or persistence failed.
    pub failed: Vec<(UserId, CapaError)>,
}

impl BatchReport {
    fn new(requested: usize) -> Self {
        BatchReport { requested, ..Self::default() }
    }

    /// `true` when no user failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Users that went through resolve and apply, successfully or not.
    pub fn processed(&self) -> usize {
        self.updated.len() + self.unchanged.len() + self.failed.len()
    }
}

/// The capability resolution engine.
#[derive(Debug)]
pub struct CapabilityEngine<D: Directory> {
    catalog: Arc<Catalog>,
    directory: D,
    config: EngineConfig,
}

impl<D: Directory> CapabilityEngine<D> {
    pub fn new(catalog: Arc<Catalog>, directory: D, config: EngineConfig) -> Self {
        CapabilityEngine { catalog, directory, config }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Computes the module patch for `user` within `batch`.
    ///
    /// Uses the batch's prefetched memberships when the user is covered by them and
    /// falls back to a single-user membership query otherwise.
    pub fn resolve_user(&self, user: UserId, batch: &mut ResolutionBatch) -> Result<ModulePatch, CapaError> {
        // 1. groups of the user (batch or single path)
        let groups = match batch.groups_of(user) {
            Some(groups) => groups.to_vec(),
            None => MembershipResolver::new(&self.directory).resolve_one(user)?,
        };

        // 2.-5. union of cached capabilities, expanded into a full patch
        let directory = &self.directory;
        resolve_patch(&self.catalog, &groups, batch.cache_mut(), |group| {
            directory.load_capabilities(group)
        })
    }

    /// Single-user path: resolve and apply for exactly one user.
    pub fn recompute_user(&self, user_id: UserId) -> Result<ApplyOutcome, CapaError> {
        let mut user = self.directory.load_user(user_id)?;
        let mut batch = ResolutionBatch::cold();
        let patch = self.resolve_user(user_id, &mut batch)?;
        EnablementApplier::new(&self.directory).apply(&mut user, &patch)
    }

    /// Batch path: one fresh batch shared by every user in `users`.
    ///
    /// # Errors
    /// Only failures that prevent the whole batch (membership prefetch, bulk user
    /// load) are returned; per-user failures land in [`BatchReport::failed`].
    pub fn recompute_users(&self, users: &BTreeSet<UserId>) -> Result<BatchReport, CapaError> {
        let mut batch = ResolutionBatch::prefetch(&self.directory, users)?;
        self.recompute_users_in(&mut batch, users)
    }

    /// Recomputes the current members of `group`.
    ///
    /// `fresh` carries capability names that were just persisted for the group; they
    /// seed the batch cache instead of being read back.
    pub fn recompute_group(
        &self,
        group: GroupId,
        fresh: Option<&[CapabilityName]>,
    ) -> Result<BatchReport, CapaError> {
        let members: BTreeSet<UserId> = self.directory.users_of_group(group)?.into_iter().collect();
        let mut batch = ResolutionBatch::prefetch(&self.directory, &members)?;
        if let Some(names) = fresh {
            batch.seed_group(group, names.iter().cloned());
        }
        self.recompute_users_in(&mut batch, &members)
    }

    /// Recomputes every user known to the user store.
    pub fn recompute_all(&self) -> Result<BatchReport, CapaError> {
        let users: BTreeSet<UserId> = self.directory.all_user_ids()?.into_iter().collect();
        tracing::info!(users = users.len(), "full capability re-sync requested");
        self.recompute_users(&users)
    }

    /// Resolves and applies `users` inside an existing batch.
    pub fn recompute_users_in(
        &self,
        batch: &mut ResolutionBatch,
        users: &BTreeSet<UserId>,
    ) -> Result<BatchReport, CapaError> {
        let mut report = BatchReport::new(users.len());
        if users.is_empty() {
            return Ok(report);
        }

        let records = self.directory.load_users(users)?;
        let applier = EnablementApplier::new(&self.directory);
        let mut seen = BTreeSet::new();

        for mut user in records {
            let id = user.id;
            // Ignore rows for users we did not ask for, and duplicates.
            if !users.contains(&id) || !seen.insert(id) {
                continue;
            }

            let result = self
                .resolve_user(id, batch)
                .and_then(|patch| applier.apply(&mut user, &patch));

            match result {
                Ok(ApplyOutcome::Updated { .. }) => report.updated.push(id),
                Ok(ApplyOutcome::Unchanged) => report.unchanged.push(id),
                Err(e) => {
                    tracing::warn!(user = %id, error = %e, "capability recompute failed for user");
                    report.failed.push((id, e));
                }
            }
        }

        report.missing = users.difference(&seen).copied().collect();
        if !report.missing.is_empty() {
            tracing::debug!(missing = report.missing.len(), "requested users not found in user store");
        }

        tracing::info!(
            requested = report.requested,
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            group_reads = batch.cache().store_reads(),
            "capability batch recomputed"
        );
        Ok(report)
    }
}
