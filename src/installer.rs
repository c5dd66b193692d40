//! Install, uninstall and update reconciliation.

pub mod batch;
pub mod layout;
pub mod reconciler;

pub use batch::{BatchItem, BatchReport, Outcome};
pub use layout::InstallLayout;
pub use reconciler::{InstallOptions, Installer, UpdateCandidate, UpdateOptions};
