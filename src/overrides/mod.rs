//! # Overrides
//!
//! Developer-forced values per tool, observable by panels and host code.
//!
//! - **Subject**: explicit replay-one pub/sub
//! - **Registry**: in-memory authority, synchronized to storage
//! - **Catalog**: host-declared keys and defaults

pub mod catalog;
pub mod entry;
pub mod errors;
pub mod registry;
pub mod subject;

pub use catalog::{JsonKind, KnownOption, ToolCatalog, ToolDefinition};
pub use entry::OverrideEntry;
pub use errors::{OverrideError, OverrideResult};
pub use registry::{OverrideRegistry, PersistMode, WriteOutcome};
pub use subject::{Subject, Subscription};
