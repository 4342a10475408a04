//! # Parley Installation Stores
//!
//! Pluggable backends for the [`pa_core::InstallationStore`] trait.
//!
//! Both backends implement the rich per-user lookup. Workspaces are keyed
//! by `(enterprise, team)`; enterprise-wide installs are keyed under the
//! enterprise alone, since one authorization there spans every team under
//! the org umbrella.

pub mod file;
pub mod memory;

pub use file::FileInstallationStore;
pub use memory::MemoryInstallationStore;

use pa_core::{EnterpriseId, TeamId};

/// Storage key for one workspace. `None` segments collapse to `"none"` so
/// single-workspace and org-wide installs share one addressing scheme.
pub(crate) fn workspace_key(
    enterprise_id: Option<&EnterpriseId>,
    team_id: Option<&TeamId>,
) -> String {
    format!(
        "{}-{}",
        enterprise_id.map_or("none", EnterpriseId::as_str),
        team_id.map_or("none", TeamId::as_str)
    )
}
