//! Resolution backends.
//!
//! [`Backend`] is the seam every storage strategy implements. The lookup
//! algorithm in [`resolve`] is shared by all of them except the remote
//! backend, which forwards whole lookups.

mod traits;

pub mod factory;
pub mod loader;
pub mod memory;
#[cfg(feature = "remote")]
pub mod remote;
pub mod resolve;
#[cfg(feature = "sql")]
pub mod sql;

pub use factory::{open_backend, open_memory};
pub use loader::{RowValue, TsvDirectoryProvider};
pub use memory::{AttributeSource, MemoryBackend, MemoryBackendBuilder, PrefixMap, PrefixProvider};
#[cfg(feature = "remote")]
pub use remote::RemoteBackend;
pub use resolve::{LookupOptions, Resolver};
#[cfg(feature = "sql")]
pub use sql::SqlBackend;
pub use traits::{Backend, BackendKind};
