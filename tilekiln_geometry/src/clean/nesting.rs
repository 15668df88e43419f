use crate::area::area_of_ring;
use crate::clean::winding::{is_clockwise, point_in_ring};
use crate::drawvec::{split_rings, Draw, Op};

struct Ring<'a> {
	draws: &'a [Draw],
	area: f64,
	depth: usize,
}

/// Reclassifies a flat bag of polygon rings (as produced by clipping) into
/// valid MVT structure: every ring's nesting depth is the count of other
/// rings containing one of its points; even depth means an outer ring,
/// odd means a hole. Outer rings are wound counter-clockwise (positive
/// area) and holes clockwise, flipping any ring whose input winding
/// disagrees. Output order is outer-ring-then-its-holes, largest outer
/// rings first, matching the MVT convention of one exterior per polygon
/// followed immediately by its interiors.
#[must_use]
pub fn clean_polygon_rings(geom: &[Draw]) -> Vec<Draw> {
	let parts = split_rings(geom);
	let mut rings: Vec<Ring> = parts
		.iter()
		.filter(|r| r.len() >= 4)
		.map(|&r| Ring { draws: r, area: area_of_ring(r), depth: 0 })
		.collect();

	let n = rings.len();
	let mut depths = vec![0usize; n];
	for i in 0..n {
		let sample = first_vertex(rings[i].draws);
		for j in 0..n {
			if i == j {
				continue;
			}
			if point_in_ring(rings[j].draws, sample.0, sample.1) {
				depths[i] += 1;
			}
		}
	}
	for (i, d) in depths.into_iter().enumerate() {
		rings[i].depth = d;
	}

	// Sort so outer rings (even depth) come before their holes, and within
	// that, larger outers first, giving a stable and plausible output
	// order even when the input arrived in arbitrary ring order.
	rings.sort_by(|a, b| {
		let a_outer = a.depth % 2 == 0;
		let b_outer = b.depth % 2 == 0;
		match (a_outer, b_outer) {
			(true, false) => std::cmp::Ordering::Less,
			(false, true) => std::cmp::Ordering::Greater,
			_ => b.area.abs().partial_cmp(&a.area.abs()).unwrap_or(std::cmp::Ordering::Equal),
		}
	});

	let mut out = Vec::new();
	for ring in &rings {
		let want_cw = ring.depth % 2 == 1;
		let currently_cw = is_clockwise(ring.draws);
		if want_cw == currently_cw {
			out.extend_from_slice(ring.draws);
		} else {
			out.extend(reverse_ring(ring.draws));
		}
	}
	out
}

fn first_vertex(ring: &[Draw]) -> (i64, i64) {
	ring.iter().find(|d| d.op != Op::ClosePath).map(|d| (d.x, d.y)).unwrap_or((0, 0))
}

fn reverse_ring(ring: &[Draw]) -> Vec<Draw> {
	let verts: Vec<&Draw> = ring.iter().filter(|d| d.op != Op::ClosePath).collect();
	let mut out = Vec::with_capacity(ring.len());
	for (i, v) in verts.iter().rev().enumerate() {
		out.push(Draw {
			op: if i == 0 { Op::MoveTo } else { Op::LineTo },
			x: v.x,
			y: v.y,
			necessary: v.necessary,
		});
	}
	out.push(Draw::close_path());
	out
}
