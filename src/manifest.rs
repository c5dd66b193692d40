//! Local record of installed agents.

pub mod contract;
pub mod json_file;

pub use contract::{InstalledAgentRecord, InstalledStore};
pub use json_file::JsonManifestStore;
