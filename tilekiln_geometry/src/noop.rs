//! Removal of degenerate (zero-length) segments, per the source's
//! `remove_noop` (geometry.cpp): a three-pass fixpoint that collapses
//! consecutive duplicate points, then drops rings collapsed below their
//! minimum vertex count, repeating until nothing more changes.

use crate::drawvec::{Draw, GeomType, Op};

/// Collapses consecutive duplicate points and removes degenerate rings/lines
/// left by clipping or coordinate rounding. `min_ring_len` is 4 for polygons
/// (3 distinct vertices plus the closing point) and 2 for lines.
#[must_use]
pub fn remove_noop(geom: Vec<Draw>, geom_type: GeomType) -> Vec<Draw> {
	let min_len = match geom_type {
		GeomType::Polygon => 4,
		GeomType::Line => 2,
		GeomType::Point => 1,
	};

	let mut current = geom;
	loop {
		let deduped = drop_consecutive_duplicates(&current);
		let pruned = drop_undersized_parts(deduped, geom_type, min_len);
		if pruned.len() == current.len() {
			return pruned;
		}
		current = pruned;
	}
}

fn drop_consecutive_duplicates(geom: &[Draw]) -> Vec<Draw> {
	let mut out: Vec<Draw> = Vec::with_capacity(geom.len());
	for &d in geom {
		if d.op == Op::LineTo {
			if let Some(last) = out.last() {
				if last.x == d.x && last.y == d.y && last.op != Op::MoveTo {
					continue;
				}
			}
		}
		out.push(d);
	}
	out
}

fn drop_undersized_parts(geom: Vec<Draw>, geom_type: GeomType, min_len: usize) -> Vec<Draw> {
	if geom_type == GeomType::Point {
		return geom;
	}
	let mut out = Vec::with_capacity(geom.len());
	let mut part_start = 0;
	for i in 0..=geom.len() {
		let boundary = i == geom.len() || geom[i].op == Op::MoveTo;
		if boundary {
			if i > part_start {
				let part = &geom[part_start..i];
				if part.len() >= min_len {
					out.extend_from_slice(part);
				}
			}
			part_start = i;
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collapses_repeated_point() {
		let geom = vec![
			Draw::move_to(0, 0),
			Draw::line_to(0, 0),
			Draw::line_to(5, 0),
			Draw::line_to(5, 0),
		];
		let out = remove_noop(geom, GeomType::Line);
		assert_eq!(out, vec![Draw::move_to(0, 0), Draw::line_to(5, 0)]);
	}

	#[test]
	fn drops_collapsed_polygon_ring() {
		let geom = vec![
			Draw::move_to(0, 0),
			Draw::line_to(0, 0),
			Draw::line_to(0, 0),
			Draw::close_path(),
		];
		let out = remove_noop(geom, GeomType::Polygon);
		assert!(out.is_empty());
	}

	#[test]
	fn keeps_valid_triangle() {
		let geom = vec![
			Draw::move_to(0, 0),
			Draw::line_to(10, 0),
			Draw::line_to(10, 10),
			Draw::close_path(),
		];
		let out = remove_noop(geom.clone(), GeomType::Polygon);
		assert_eq!(out, geom);
	}
}
