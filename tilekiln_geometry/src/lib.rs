//! Integer drawvec geometry kernel: clipping, simplification, polygon
//! cleaning, label-point finding, stair-stepping and the tiny-polygon
//! accumulator described in §4.2–§4.6.
//!
//! Everything here operates on world- or tile-plane integer coordinates — a
//! [`Drawvec`] — never on floating-point `geo_types`. The tile worker is the
//! only caller that knows about zoom, extent or detail; this crate just
//! needs rectangles and thresholds.

mod area;
pub mod clean;
pub mod clip;
mod drawvec;
mod label;
mod noop;
pub mod simplify;
mod tiny;

pub use area::{area_of_ring, area_of_rings, area_scaled};
pub use drawvec::{split_rings, Draw, Drawvec, GeomType, Op};
pub use label::find_label_point;
pub use noop::remove_noop;
pub use tiny::{is_tiny, TinyPolygonAccumulator};
