//! stashkit: in-process key/value caching with pluggable eviction
//! policies, per-entry TTLs, bounded cost, and file-backed snapshot
//! persistence.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod cache;
pub mod ds;
pub mod error;
pub mod policy;
pub mod store;
pub mod typed;

pub mod prelude;

pub use cache::{CacheConfig, RawCache};
pub use error::{CacheError, Result};
pub use policy::PolicyKind;
pub use store::Store;
pub use typed::Cache;
