//! Repository seam between the orchestrator and storage.

use spawnhub_core::Service;

use crate::error::StateResult;

/// Reads and writes service records by label.
///
/// Implementations must be safe to share across tasks. Writes replace the
/// whole record.
pub trait ServiceRepository: Send + Sync {
    fn get(&self, label: &str) -> StateResult<Option<Service>>;

    fn save(&self, service: &Service) -> StateResult<()>;

    /// All records, ordered by label.
    fn list(&self) -> StateResult<Vec<Service>>;

    /// Delete a record. Returns true if it existed.
    fn remove(&self, label: &str) -> StateResult<bool>;
}
