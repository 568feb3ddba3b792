pub mod canonical;
pub mod error;

pub use canonical::loader::{LoadSummary, SnapshotLoader};
pub use canonical::models::EventSnapshot;
pub use canonical::validator::{SnapshotValidator, ValidationReport};
pub use error::{ImporterError, Result};
