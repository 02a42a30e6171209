//! Installation steps.
//!
//! Each step is a free function over [`InstallSettings`](crate::config::InstallSettings)
//! and the host seams from [`crate::system`]; [`Installer`] chains them.

mod configurator;
mod error;
mod inspect;
mod lifecycle;
mod pipeline;
mod repository;
mod runtime;
mod service;

pub use configurator::{EnvOutcome, configure_env};
pub use error::InstallError;
pub(crate) use error::run_tool;
pub use inspect::{CheckItem, CheckStatus, InspectionReport, inspect_host};
pub use lifecycle::{ServiceOutcome, drive_service, is_active};
pub use pipeline::{InstallReport, Installer};
pub use repository::{RepoOutcome, sync_repository};
pub use runtime::{RuntimeOutcome, provision_runtime};
pub use service::{
    ServiceUnit, UnitOutcome, UnitState, apply_unit, inspect_unit, installed_unit_user,
};
