//! PBF encode/decode for MVT tiles, layers, features and values (§6),
//! grounded on the same `ValueReader`/`ValueWriter` field-key conventions
//! used throughout `tilekiln_core::io`.

mod feature;
mod geom_type;
mod geometry;
mod layer;
mod tile;
mod value;

pub use feature::MvtFeature;
pub use geom_type::MvtGeomType;
pub use layer::MvtLayer;
pub use tile::MvtTile;
pub use value::MvtValue;
