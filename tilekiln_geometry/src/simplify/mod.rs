//! Line/ring simplification (§4.4–§4.5): Douglas–Peucker and
//! Visvalingam–Whyatt, shared-node protection across adjoining features, and
//! stair-step quantization for low zoom levels.

mod douglas_peucker;
mod shared_nodes;
mod stairstep;
mod visvalingam;

pub use douglas_peucker::{simplify_douglas_peucker, simplify_parts};
pub use shared_nodes::SharedNodeSet;
pub use stairstep::stairstep_quantize;
pub use visvalingam::simplify_visvalingam;
