use crate::clip::ClipRect;
use crate::drawvec::{Draw, Op};
use crate::drawvec::split_rings;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

fn region_code(rect: ClipRect, x: i64, y: i64) -> u8 {
	let mut code = INSIDE;
	if x < rect.min_x {
		code |= LEFT;
	} else if x > rect.max_x {
		code |= RIGHT;
	}
	if y < rect.min_y {
		code |= TOP;
	} else if y > rect.max_y {
		code |= BOTTOM;
	}
	code
}

/// Cohen–Sutherland clip of one segment; `None` means fully outside.
fn clip_segment(rect: ClipRect, mut x0: f64, mut y0: f64, mut x1: f64, mut y1: f64) -> Option<(f64, f64, f64, f64)> {
	let mut code0 = region_code(rect, x0 as i64, y0 as i64);
	let mut code1 = region_code(rect, x1 as i64, y1 as i64);

	loop {
		if code0 | code1 == 0 {
			return Some((x0, y0, x1, y1));
		}
		if code0 & code1 != 0 {
			return None;
		}
		let out = if code0 != 0 { code0 } else { code1 };
		let (x, y);
		if out & BOTTOM != 0 {
			x = x0 + (x1 - x0) * (rect.max_y as f64 - y0) / (y1 - y0);
			y = rect.max_y as f64;
		} else if out & TOP != 0 {
			x = x0 + (x1 - x0) * (rect.min_y as f64 - y0) / (y1 - y0);
			y = rect.min_y as f64;
		} else if out & RIGHT != 0 {
			y = y0 + (y1 - y0) * (rect.max_x as f64 - x0) / (x1 - x0);
			x = rect.max_x as f64;
		} else {
			y = y0 + (y1 - y0) * (rect.min_x as f64 - x0) / (x1 - x0);
			x = rect.min_x as f64;
		}
		if out == code0 {
			x0 = x;
			y0 = y;
			code0 = region_code(rect, x0 as i64, y0 as i64);
		} else {
			x1 = x;
			y1 = y;
			code1 = region_code(rect, x1 as i64, y1 as i64);
		}
	}
}

/// Clips every line part against `rect`, splitting a part at each point it
/// leaves and re-enters the rectangle. Intersection points are marked
/// `necessary` so simplification can't erase the seam.
#[must_use]
pub fn clip_lines(geom: &[Draw], rect: ClipRect) -> Vec<Draw> {
	let mut out = Vec::new();
	for part in split_rings(geom) {
		let mut pending_start: Option<(i64, i64, bool)> = None;
		for i in 1..part.len() {
			let a = part[i - 1];
			let b = part[i];
			if b.op == Op::ClosePath {
				continue;
			}
			match clip_segment(rect, a.x as f64, a.y as f64, b.x as f64, b.y as f64) {
				Some((cx0, cy0, cx1, cy1)) => {
					let cx0 = cx0.round() as i64;
					let cy0 = cy0.round() as i64;
					let cx1 = cx1.round() as i64;
					let cy1 = cy1.round() as i64;
					let a_necessary = cx0 != a.x || cy0 != a.y;
					let b_necessary = cx1 != b.x || cy1 != b.y;
					match pending_start {
						Some((px, py, _)) if px == cx0 && py == cy0 => {}
						_ => {
							let mut mv = Draw::move_to(cx0, cy0);
							if a_necessary {
								mv = mv.necessary();
							}
							out.push(mv);
						}
					}
					let mut lt = Draw::line_to(cx1, cy1);
					if b_necessary {
						lt = lt.necessary();
					}
					out.push(lt);
					pending_start = Some((cx1, cy1, b_necessary));
				}
				None => {
					pending_start = None;
				}
			}
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn line_fully_inside_is_unchanged() {
		let rect = ClipRect { min_x: 0, min_y: 0, max_x: 100, max_y: 100 };
		let geom = vec![Draw::move_to(10, 10), Draw::line_to(20, 20)];
		let out = clip_lines(&geom, rect);
		assert_eq!(out, geom);
	}

	#[test]
	fn line_crossing_boundary_is_truncated() {
		let rect = ClipRect { min_x: 0, min_y: 0, max_x: 10, max_y: 10 };
		let geom = vec![Draw::move_to(5, 5), Draw::line_to(20, 5)];
		let out = clip_lines(&geom, rect);
		assert_eq!(out.len(), 2);
		assert_eq!(out[0].x, 5);
		assert_eq!(out[1].x, 10);
		assert!(out[1].necessary);
	}

	#[test]
	fn line_fully_outside_produces_nothing() {
		let rect = ClipRect { min_x: 0, min_y: 0, max_x: 10, max_y: 10 };
		let geom = vec![Draw::move_to(100, 100), Draw::line_to(200, 200)];
		assert!(clip_lines(&geom, rect).is_empty());
	}

	#[test]
	fn line_split_by_passing_through_produces_two_parts() {
		let rect = ClipRect { min_x: 0, min_y: 0, max_x: 10, max_y: 10 };
		// Enters, exits, re-enters: three segments via a zig-zag path.
		let geom = vec![
			Draw::move_to(5, 5),
			Draw::line_to(20, 5),
			Draw::line_to(20, 20),
			Draw::line_to(5, 5),
		];
		let out = clip_lines(&geom, rect);
		let move_tos = out.iter().filter(|d| d.op == Op::MoveTo).count();
		assert!(move_tos >= 1);
	}
}
