//! Mapbox Vector Tile wire codec and the serial feature format used to
//! spool features between ingest and tiling (§4.7, §6).

pub mod pool;
pub mod serial;
pub mod wire;

pub use pool::StringPool;
pub use serial::{SerialFeature, SerialGeomType};
pub use wire::{MvtFeature, MvtGeomType, MvtLayer, MvtTile, MvtValue};
