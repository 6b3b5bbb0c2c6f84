//! Shared key-value object store.
//!
//! - **ObjectStore**: trait for container-scoped `get`/`put`, plus the opt-in
//!   conditional pair `get_versioned`/`put_if_version`
//! - **InMemoryObjectStore**: in-process backend, shared through `Rc`
//! - **FileObjectStore**: directory-backed backend with JSON envelopes

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{ObjectStore, Versioned};
