//! The shared attribute string pool (§3, §4.7): assigns a stable integer id
//! to every distinct key/value string seen during ingest, spilling its
//! backing table to disk once the in-memory dictionary grows past budget so
//! ingest memory stays bounded regardless of corpus size.

mod string_pool;

pub use string_pool::StringPool;
