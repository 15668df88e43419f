//! Feature spooling and the post-ingest index sort (§4.7).

mod index;
mod ingest;
mod mmap_index;
mod sort;
mod spooler;

pub use index::IndexEntry;
pub use ingest::{coerce_attribute, decode_attribute_cache_key, ingest_feature, promote_id, InputAttrValue, InputCoord, InputOp, RawFeature};
pub use mmap_index::MmappedIndex;
pub use sort::sort_index_entries;
pub use spooler::FeatureSpooler;
