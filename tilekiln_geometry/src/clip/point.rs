use crate::clip::ClipRect;
use crate::drawvec::Draw;

/// Keeps only `MoveTo` points (each a standalone feature part, per MVT's
/// multipoint encoding) that fall inside `rect`.
#[must_use]
pub fn clip_points(geom: &[Draw], rect: ClipRect) -> Vec<Draw> {
	geom.iter().copied().filter(|d| rect.contains_point(d.x, d.y)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::drawvec::Draw;

	#[test]
	fn drops_points_outside_rect() {
		let rect = ClipRect { min_x: 0, min_y: 0, max_x: 10, max_y: 10 };
		let geom = vec![Draw::move_to(5, 5), Draw::move_to(50, 50), Draw::move_to(-1, -1)];
		let out = clip_points(&geom, rect);
		assert_eq!(out, vec![Draw::move_to(5, 5)]);
	}
}
