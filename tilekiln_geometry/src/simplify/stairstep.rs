use crate::drawvec::Draw;

/// Snaps every coordinate to a `step`-sized grid, used at very low zooms
/// where full-precision simplification would otherwise leave visually
/// "staircased" diagonal lines uncorrected. Consecutive points landing on
/// the same cell are left for [`crate::remove_noop`] to collapse.
#[must_use]
pub fn stairstep_quantize(geom: &[Draw], step: i64) -> Vec<Draw> {
	if step <= 1 {
		return geom.to_vec();
	}
	geom.iter()
		.map(|&d| {
			if d.necessary {
				d
			} else {
				Draw { x: quantize(d.x, step), y: quantize(d.y, step), ..d }
			}
		})
		.collect()
}

fn quantize(v: i64, step: i64) -> i64 {
	(v as f64 / step as f64).round() as i64 * step
}
