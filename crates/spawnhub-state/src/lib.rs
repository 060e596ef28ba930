//! spawnhub-state: persistence for service records.
//!
//! The orchestrator talks to storage only through [`ServiceRepository`]
//! (`get`/`save`/`list`/`remove`). [`ServiceStore`] implements it on top of
//! [redb](https://docs.rs/redb), storing each `Service` as JSON keyed by its
//! label. The store is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod repository;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use repository::ServiceRepository;
pub use store::ServiceStore;
