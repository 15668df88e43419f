//! The spooled feature format ingest workers write and zoom workers read
//! back (§4.7, §6): a compact varint-framed record independent of MVT,
//! carrying full-precision world-plane geometry and string-pool indices
//! instead of MVT's tile-local, dictionary-per-tile encoding.

mod feature;

pub use feature::{SerialFeature, SerialGeomType};
