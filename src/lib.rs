//! agt: package manager for AI agent definitions
//!
//! Resolves agent references against a remote catalog, installs agent files
//! into per-tool directories, tracks what is installed in a local manifest,
//! and publishes new agents to the hub or a local staging registry.

pub mod agent;
pub mod config;
pub mod error;
pub mod hub;
pub mod installer;
pub mod logging;
pub mod manifest;
pub mod publish;
pub mod registry;
pub mod tooling;
pub mod types;
