//! The overzoom / tile-join operator (§4.10): synthesizes a child tile from
//! one or more already-built parent MVTs, and merges multiple tilesets into
//! one by re-clipping every source layer into the destination tile.

mod cache;
mod join;
mod project;

pub use cache::TileCache;
pub use join::{JoinedSource, OverzoomJoiner};
pub use project::{tile_local_to_world, world_to_tile_local};
