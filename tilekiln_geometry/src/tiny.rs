//! Accumulates sub-pixel polygons that would otherwise vanish invisibly at
//! a given zoom, converting their aggregate area into a single synthetic
//! point once it crosses one pixel's worth of area — mirroring the source's
//! "include small polygons as points" fallback for features too small to
//! render as fills at low zoom.

use crate::drawvec::{Draw, GeomType, Op};
use crate::label::find_label_point;

/// Running accumulator of tiny polygons' area and a representative point,
/// emitting a synthetic point feature once the accumulated area would cover
/// at least one pixel.
pub struct TinyPolygonAccumulator {
	threshold: f64,
	accumulated_area: f64,
	representative: Option<(i64, i64)>,
}

impl TinyPolygonAccumulator {
	#[must_use]
	pub fn new(tile_extent: u32) -> TinyPolygonAccumulator {
		let px = f64::from(tile_extent) / 256.0;
		TinyPolygonAccumulator { threshold: px * px, accumulated_area: 0.0, representative: None }
	}

	/// Feeds one polygon's drawvec and area (already computed by the
	/// caller). Returns `Some(point)` the first time the running total
	/// crosses the pixel-area threshold, at which point the accumulator
	/// resets for the next batch.
	pub fn accumulate(&mut self, geom: &[Draw], area: f64) -> Option<(i64, i64)> {
		if self.representative.is_none() {
			self.representative = find_label_point(geom, GeomType::Polygon);
		}
		self.accumulated_area += area.abs();
		if self.accumulated_area >= self.threshold {
			let point = self.representative.take();
			self.accumulated_area = 0.0;
			point
		} else {
			None
		}
	}

	/// Flushes whatever has accumulated so far as a final point, regardless
	/// of whether it crossed the threshold — called once per layer/zoom at
	/// the end of a tile so leftover dust isn't silently dropped.
	pub fn flush(&mut self) -> Option<(i64, i64)> {
		if self.accumulated_area > 0.0 {
			self.accumulated_area = 0.0;
			self.representative.take()
		} else {
			None
		}
	}
}

#[must_use]
pub fn is_tiny(area: f64, tile_extent: u32) -> bool {
	let px = f64::from(tile_extent) / 256.0;
	area.abs() < px * px
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::drawvec::Draw;

	fn dust(x0: i64, y0: i64, side: i64) -> Vec<Draw> {
		vec![
			Draw::move_to(x0, y0),
			Draw::line_to(x0 + side, y0),
			Draw::line_to(x0 + side, y0 + side),
			Draw::line_to(x0, y0 + side),
			Draw::close_path(),
		]
	}

	#[test]
	fn emits_once_threshold_crossed() {
		let mut acc = TinyPolygonAccumulator::new(4096);
		let small = dust(0, 0, 4);
		assert!(acc.accumulate(&small, 8.0).is_none());
		// Threshold is (4096/256)^2 = 256; keep feeding until it crosses.
		let mut emitted = None;
		for _ in 0..40 {
			emitted = acc.accumulate(&small, 8.0);
			if emitted.is_some() {
				break;
			}
		}
		assert!(emitted.is_some());
	}

	#[test]
	fn is_tiny_detects_sub_pixel_area() {
		assert!(is_tiny(10.0, 4096));
		assert!(!is_tiny(1_000_000.0, 4096));
	}
}
