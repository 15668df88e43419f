//! Shared primitives for the vector tile pipeline: the Web Mercator projection,
//! tile coordinates and bounding boxes, spatial index orderings, binary I/O
//! (varint/zigzag/PBF helpers and a length-prefixed `Blob`), zlib-compatible
//! deflate framing, best-effort progress reporting and concurrency sizing.
//!
//! Nothing in this crate knows about geometry clipping or MVT encoding; it is
//! the leaf layer every other crate in the workspace depends on.

pub mod blob;
pub mod compression;
pub mod concurrency;
pub mod io;
pub mod progress;
pub mod projection;
pub mod tile_coord;

pub use blob::Blob;
pub use compression::{compress_deflate, decompress_deflate};
pub use concurrency::ConcurrencyLimits;
pub use projection::{hilbert_index, quadkey_index, reverse_bits, wgs84_to_world, world_to_wgs84};
pub use tile_coord::{TileCoord, TileRect};
