//! Geometry clipping against a tile's buffered rectangle (§4.2).
//!
//! Points are a simple containment test; lines are clipped edge-by-edge with
//! Cohen–Sutherland region codes (producing possibly several disjoint
//! sub-lines); polygons are clipped one rectangle side at a time with
//! Sutherland–Hodgman, which always yields a single (possibly
//! self-touching) ring per input ring. Every synthesized intersection point
//! is marked `necessary` so later simplification never removes a
//! tile-boundary seam.

mod line;
mod point;
mod polygon;

pub use line::clip_lines;
pub use point::clip_points;
pub use polygon::clip_polygon_rings;

use tilekiln_core::tile_coord::TileRect;

/// A clip rectangle expressed in the same integer plane as the geometry.
pub type ClipRect = TileRect;
