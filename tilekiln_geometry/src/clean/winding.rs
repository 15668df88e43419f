use crate::area::area_of_ring;
use crate::drawvec::{Draw, Op};

/// True if `ring`'s signed doubled area is negative, matching the source's
/// "clockwise means negative area in a y-down plane" convention.
#[must_use]
pub fn is_clockwise(ring: &[Draw]) -> bool {
	area_of_ring(ring) < 0.0
}

/// Even-odd (ray-casting) point-in-ring test against the ring's vertices,
/// ignoring the `ClosePath` terminator.
#[must_use]
pub fn point_in_ring(ring: &[Draw], px: i64, py: i64) -> bool {
	let verts: Vec<&Draw> = ring.iter().filter(|d| d.op != Op::ClosePath).collect();
	let n = verts.len();
	if n < 3 {
		return false;
	}
	let mut inside = false;
	let mut j = n - 1;
	for i in 0..n {
		let (xi, yi) = (verts[i].x, verts[i].y);
		let (xj, yj) = (verts[j].x, verts[j].y);
		let intersects = (yi > py) != (yj > py)
			&& (px as f64) < (xj - xi) as f64 * (py - yi) as f64 / (yj - yi) as f64 + xi as f64;
		if intersects {
			inside = !inside;
		}
		j = i;
	}
	inside
}

#[cfg(test)]
mod tests {
	use super::*;

	fn square(side: i64) -> Vec<Draw> {
		vec![
			Draw::move_to(0, 0),
			Draw::line_to(side, 0),
			Draw::line_to(side, side),
			Draw::line_to(0, side),
			Draw::close_path(),
		]
	}

	#[test]
	fn ccw_ring_is_not_clockwise() {
		assert!(!is_clockwise(&square(10)));
	}

	#[test]
	fn reversed_ring_is_clockwise() {
		let mut ring = square(10);
		ring[1..4].reverse();
		assert!(is_clockwise(&ring));
	}

	#[test]
	fn point_inside_square_detected() {
		let ring = square(10);
		assert!(point_in_ring(&ring, 5, 5));
		assert!(!point_in_ring(&ring, 50, 50));
	}
}
