pub mod relation_service;

pub use relation_service::{RebuildReport, RelationService, SyncConfig};
