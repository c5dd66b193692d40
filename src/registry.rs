//! Remote agent catalog access.

pub mod cache;
pub mod client;
pub mod search;
pub mod transport;

pub use cache::ResourceCache;
pub use client::{CatalogIndex, CategorySummary, RegistryClient};
pub use search::{SearchFilters, SortKey};
pub use transport::{CatalogTransport, HttpTransport};
