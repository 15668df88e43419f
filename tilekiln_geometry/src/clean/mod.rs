//! Polygon cleaning (§4.3): ring winding correction, hole/outer nesting
//! classification and reassembly into the MVT-required structure (each
//! outer ring immediately followed by its holes, holes wound opposite the
//! outer).
//!
//! This is a practical scanline-free cleaner built from ring containment
//! tests rather than a full Vatti boolean-clip engine: after tile clipping,
//! rings never self-intersect (clipping only truncates), so classification
//! by point-in-ring containment and area sign is sufficient to rebuild valid
//! polygon structure, matching the ring-reassembly step of the source's
//! polygon cleaning (`polygon.cpp`) without its general-purpose scanline
//! union (which is only needed for true self-intersection removal upstream
//! of tiling, out of scope here).

mod nesting;
mod winding;

pub use nesting::clean_polygon_rings;
pub use winding::{is_clockwise, point_in_ring};
