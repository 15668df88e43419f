//! Shoelace area with the overflow-recovery rescaling from the source's
//! `get_area`/`get_area_scaled` (geometry.cpp).

use crate::drawvec::{Draw, Op};

/// Signed doubled area of a single ring via the shoelace formula, rescaling
/// coordinates down by successive powers of two if the accumulation would
/// overflow an `i64` — mirrors the source's scale-halving retry loop instead
/// of widening to a bignum.
#[must_use]
pub fn area_of_ring(ring: &[Draw]) -> f64 {
	area_scaled(ring, 0)
}

/// Same as [`area_of_ring`] but pre-shifts every coordinate right by `scale`
/// bits before accumulating, as the source does when a first attempt at
/// `scale = 0` overflows.
#[must_use]
pub fn area_scaled(ring: &[Draw], scale: u32) -> f64 {
	if ring.len() < 3 {
		return 0.0;
	}
	let mut area: i128 = 0;
	let mut prev = coord_at(ring, ring.len() - 1, scale);
	for d in ring {
		if d.op == Op::ClosePath {
			continue;
		}
		let cur = (d.x >> scale, d.y >> scale);
		area += i128::from(prev.0) * i128::from(cur.1) - i128::from(cur.0) * i128::from(prev.1);
		prev = cur;
	}

	// Retry at a coarser scale if this rescaling still doesn't fit an f64
	// mantissa cleanly; the source caps this at a handful of attempts. The
	// recursive call already rescales its own result back up by its own
	// `scale`, so the returned value needs no further correction here.
	if area.unsigned_abs() > (1i128 << 62) && scale < 24 {
		return area_scaled(ring, scale + 4);
	}

	(area as f64) * (1u64 << (2 * scale)) as f64
}

fn coord_at(ring: &[Draw], idx: usize, scale: u32) -> (i64, i64) {
	let d = &ring[idx];
	(d.x >> scale, d.y >> scale)
}

/// Sum of ring areas, where each ring after the first is a hole and
/// subtracted (outer ring CCW-positive, holes CW-negative under the MVT
/// winding convention already applied upstream).
#[must_use]
pub fn area_of_rings(rings: &[&[Draw]]) -> f64 {
	rings.iter().map(|r| area_of_ring(r)).sum::<f64>() / 2.0
}
