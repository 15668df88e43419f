//! The `drawvec`: an ordered sequence of draw ops forming a geometry (§3).

/// A single draw-op kind. Polygon rings are delimited by `MoveTo` followed
/// by one or more `LineTo`s and an explicit `ClosePath`; multi-geometries
/// separate members with another `MoveTo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
	MoveTo,
	LineTo,
	ClosePath,
}

/// One packed draw-op record. `necessary` marks vertices that must survive
/// simplification — ring closure points, tile-boundary intersections and
/// polygon shared nodes (§4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Draw {
	pub op: Op,
	pub x: i64,
	pub y: i64,
	pub necessary: bool,
}

impl Draw {
	#[must_use]
	pub fn new(op: Op, x: i64, y: i64) -> Draw {
		Draw { op, x, y, necessary: false }
	}

	#[must_use]
	pub fn move_to(x: i64, y: i64) -> Draw {
		Draw::new(Op::MoveTo, x, y)
	}

	#[must_use]
	pub fn line_to(x: i64, y: i64) -> Draw {
		Draw::new(Op::LineTo, x, y)
	}

	#[must_use]
	pub fn close_path() -> Draw {
		Draw::new(Op::ClosePath, 0, 0)
	}

	#[must_use]
	pub fn necessary(mut self) -> Draw {
		self.necessary = true;
		self
	}
}

/// A sequence of draw ops forming one feature's geometry.
pub type Drawvec = Vec<Draw>;

/// Which of the three MVT geometry classes a drawvec represents. Only these
/// three survive past ingest — the data model has no "GeometryCollection".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeomType {
	Point,
	Line,
	Polygon,
}

/// Splits a drawvec at every `MoveTo`/`ClosePath` boundary into the
/// sub-sequences ("rings" for polygons, "lines" for lines/multipoints) most
/// of the kernel's algorithms operate on independently.
#[must_use]
pub fn split_rings(geom: &[Draw]) -> Vec<&[Draw]> {
	let mut out = Vec::new();
	let mut start = 0;
	for (i, d) in geom.iter().enumerate() {
		if d.op == Op::MoveTo && i > start {
			out.push(&geom[start..i]);
			start = i;
		}
	}
	if start < geom.len() {
		out.push(&geom[start..]);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_rings_separates_on_moveto() {
		let geom = vec![
			Draw::move_to(0, 0),
			Draw::line_to(1, 0),
			Draw::line_to(1, 1),
			Draw::close_path(),
			Draw::move_to(5, 5),
			Draw::line_to(6, 5),
			Draw::close_path(),
		];
		let rings = split_rings(&geom);
		assert_eq!(rings.len(), 2);
		assert_eq!(rings[0].len(), 4);
		assert_eq!(rings[1].len(), 3);
	}
}
