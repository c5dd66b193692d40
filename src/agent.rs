//! Agent references, registry descriptors and authored agent documents.

pub mod descriptor;
pub mod document;
pub mod identity;

pub use descriptor::{AgentDescriptor, LocalizedText};
pub use document::{AgentDocument, AgentFrontmatter, AgentMetadata, CATEGORIES};
pub use identity::AgentIdentity;
