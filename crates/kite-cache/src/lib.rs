//! Persistence building blocks and the bounded in-memory cache.
//!
//! ## On-disk layout
//!
//! Project-scoped caches live under `<cache_root>/<project_hash>/`:
//! - `members/`: flattened member sets keyed by class name ([`DiskStore`])
//! - `sources/`: parse snapshots keyed by canonical path, plus the
//!   [`ChecksumTable`] record
//! - `classpath/`: per-entry class stub caches (see `kite-classpath`)
//! - `cache.lock`: [`CacheLock`] guarding multi-writer metadata
//!
//! Every persisted record is a `serde` + `bincode` envelope carrying a schema
//! version, the Kite version and the record key. Anything that fails to decode
//! or does not match is deleted and treated as a miss.

mod cache_dir;
mod checksum;
mod error;
mod fingerprint;
mod lock;
mod memory;
mod store;
mod util;

pub use cache_dir::{CacheConfig, CacheDir, CACHE_DIR_ENV};
pub use checksum::{ChecksumTable, CHECKSUM_TABLE_KEY};
pub use error::{CacheError, Result};
pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use lock::CacheLock;
pub use memory::{CacheStats, MemoryCache, MemoryCachePolicy, RemovalCause};
pub use store::{DiskStore, DiskStorePolicy, DISK_STORE_SCHEMA_VERSION};
pub use util::{atomic_write, now_millis, BINCODE_PAYLOAD_LIMIT_BYTES};
