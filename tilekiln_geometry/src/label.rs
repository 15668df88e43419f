//! Polygon label-point placement (§4.6): a point guaranteed to fall inside
//! the polygon, for renderers that place a single label glyph per feature.

use crate::clean::point_in_ring;
use crate::drawvec::{split_rings, Draw, GeomType, Op};

/// Picks a representative point for a polygon (or multipolygon's largest
/// part). Tries the vertex centroid first since it is cheap and almost
/// always correct for convex-ish rings; falls back to a coarse interior
/// grid search for concave shapes where the centroid falls outside, and
/// finally to the first vertex if nothing inside is found (a degenerate
/// sliver, which is rare after cleaning).
#[must_use]
pub fn find_label_point(geom: &[Draw], geom_type: GeomType) -> Option<(i64, i64)> {
	if geom_type != GeomType::Polygon {
		return geom.iter().find(|d| d.op != Op::ClosePath).map(|d| (d.x, d.y));
	}

	let rings = split_rings(geom);
	let outer = rings
		.iter()
		.max_by(|a, b| {
			bbox_area(a).partial_cmp(&bbox_area(b)).unwrap_or(std::cmp::Ordering::Equal)
		})?;

	let centroid = vertex_centroid(outer);
	if point_in_ring(outer, centroid.0, centroid.1) {
		return Some(centroid);
	}

	let bbox = bounding_box(outer);
	const STEPS: i64 = 16;
	let dx = (bbox.2 - bbox.0).max(1) / STEPS;
	let dy = (bbox.3 - bbox.1).max(1) / STEPS;
	for gy in 0..=STEPS {
		for gx in 0..=STEPS {
			let x = bbox.0 + gx * dx;
			let y = bbox.1 + gy * dy;
			if point_in_ring(outer, x, y) {
				return Some((x, y));
			}
		}
	}

	outer.iter().find(|d| d.op != Op::ClosePath).map(|d| (d.x, d.y))
}

fn vertex_centroid(ring: &[Draw]) -> (i64, i64) {
	let verts: Vec<&Draw> = ring.iter().filter(|d| d.op != Op::ClosePath).collect();
	let n = verts.len().max(1) as i64;
	let sx: i64 = verts.iter().map(|d| d.x).sum();
	let sy: i64 = verts.iter().map(|d| d.y).sum();
	(sx / n, sy / n)
}

fn bounding_box(ring: &[Draw]) -> (i64, i64, i64, i64) {
	let mut bbox = (i64::MAX, i64::MAX, i64::MIN, i64::MIN);
	for d in ring {
		if d.op == Op::ClosePath {
			continue;
		}
		bbox.0 = bbox.0.min(d.x);
		bbox.1 = bbox.1.min(d.y);
		bbox.2 = bbox.2.max(d.x);
		bbox.3 = bbox.3.max(d.y);
	}
	bbox
}

fn bbox_area(ring: &[Draw]) -> f64 {
	let (minx, miny, maxx, maxy) = bounding_box(ring);
	((maxx - minx) as f64) * ((maxy - miny) as f64)
}
