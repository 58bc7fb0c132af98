//! # biolookup - CURIE resolution over pluggable storage
//!
//! Resolves compact identifiers such as `doid:14330` into names,
//! definitions, species, synonyms, cross-references and relations.
//!
//! ## Core Concepts
//!
//! - **Backend**: a storage strategy answering per-attribute questions
//!   (in-memory maps, SQL tables, or a remote instance)
//! - **CurieNormalizer**: splits and normalizes CURIEs and builds provider URLs
//! - **Lookup**: the shared algorithm turning a CURIE into a [`LookupResult`],
//!   following alternate identifiers by one hop
//! - **SummaryCounter**: per-prefix counts of each attribute
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use biolookup::{MemoryBackend, Registry, Resolver};
//!
//! let backend = MemoryBackend::builder()
//!     .names_from_rows([("doid", "14330", "Parkinson's disease")])
//!     .build();
//! let resolver = Resolver::new(Arc::new(backend), Arc::new(Registry::permissive()));
//!
//! let result = resolver.lookup("DOID:14330").await?;
//! assert_eq!(result.name.as_deref(), Some("Parkinson's disease"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod curie;
pub mod error;
pub mod model;

// Re-export primary types at crate root for convenience
pub use backend::{
    open_backend, AttributeSource, Backend, BackendKind, LookupOptions, MemoryBackend,
    PrefixProvider, Resolver, TsvDirectoryProvider,
};
#[cfg(feature = "remote")]
pub use backend::RemoteBackend;
#[cfg(feature = "sql")]
pub use backend::SqlBackend;
pub use config::{BackendConfig, MemoryConfig, RemoteConfig, SqlConfig, TableNames};
pub use curie::{CurieNormalizer, Registry, Resource};
pub use error::{BackendError, BackendResult, ConfigError};
pub use model::{LookupResult, PrefixSummary, Relation, SummaryCounter, Xref};
