//! Diff-and-apply of a module patch onto a user record.

use crate::error::CapaError;
use crate::resolution::resolver::ModulePatch;
use crate::store::{User, UserStore};

/// Result of applying a patch to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Every flag already matched the patch; nothing was written.
    Unchanged,
    /// `toggled` flags changed and the user record was persisted.
    Updated { toggled: usize },
}

/// Sets every flag in `patch` on `user`, returning how many actually changed.
///
/// Modules that are not in the patch are never touched.
pub fn apply_patch(user: &mut User, patch: &ModulePatch) -> usize {
    patch
        .iter()
        .filter(|(module, enabled)| user.set_module(module, *enabled))
        .count()
}

/// Applies patches and persists the affected users.
#[derive(Debug, Clone, Copy)]
pub struct EnablementApplier<'a, U: UserStore + ?Sized> {
    store: &'a U,
}

impl<'a, U: UserStore + ?Sized> EnablementApplier<'a, U> {
    pub fn new(store: &'a U) -> Self {
        EnablementApplier { store }
    }

    /// Applies `patch` to `user` and persists the record when a flag changed.
    ///
    /// On a persistence failure the in-memory `user` keeps the new flags; the stored
    /// record is whatever the store left behind.
    pub fn apply(&self, user: &mut User, patch: &ModulePatch) -> Result<ApplyOutcome, CapaError> {
        let toggled = apply_patch(user, patch);
        if toggled == 0 {
            tracing::debug!(user = %user.id, "module enablement already up to date");
            return Ok(ApplyOutcome::Unchanged);
        }

        self.store.save_user(user)?;
        tracing::debug!(user = %user.id, toggled, "module enablement updated");
        Ok(ApplyOutcome::Updated { toggled })
    }
}
