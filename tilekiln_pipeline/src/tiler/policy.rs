//! Per-tile drop policies (§4.8 step 5): exactly one of these governs a
//! given tiling run, deciding which already dot-dropped candidates survive
//! into this specific tile once a budget is exceeded.

/// One candidate feature's inputs to a drop policy: its dot-dropping
/// minzoom, its position in the spatial order (for density-based
/// dropping) and its pseudo-area (for size-based dropping).
#[derive(Clone, Copy, Debug)]
pub struct DropInput {
	pub feature_minzoom: u8,
	pub spatial_index: u64,
	pub extent: f64,
}

/// `drop_fraction_as_needed` / `coalesce_fraction_as_needed`: the drop key
/// is the feature's minzoom if it has one, else the reciprocal of its
/// spatial index (so low-index, "early" features in the progressive order
/// are preferred); keep those whose key is at or above `threshold`.
#[must_use]
pub fn drop_fraction_as_needed(inputs: &[DropInput], threshold: f64) -> Vec<bool> {
	inputs
		.iter()
		.map(|c| {
			let key = if c.feature_minzoom > 0 {
				f64::from(c.feature_minzoom)
			} else {
				1.0 / (c.spatial_index as f64 + 1.0)
			};
			key >= threshold
		})
		.collect()
}

/// `drop_densest_as_needed` / `coalesce_densest_as_needed` /
/// `cluster_densest_as_needed`: rejects a feature whose spatial-index delta
/// from the previously *kept* feature is below `mingap`. Input must already
/// be in spatial order.
#[must_use]
pub fn drop_densest_as_needed(inputs: &[DropInput], mingap: f64) -> Vec<bool> {
	let mut keep = Vec::with_capacity(inputs.len());
	let mut last_kept: Option<u64> = None;
	for c in inputs {
		let keep_this = match last_kept {
			None => true,
			Some(prev) => (c.spatial_index.saturating_sub(prev)) as f64 >= mingap,
		};
		if keep_this {
			last_kept = Some(c.spatial_index);
		}
		keep.push(keep_this);
	}
	keep
}

/// `drop_smallest_as_needed` / `coalesce_smallest_as_needed`: rejects
/// features whose pseudo-area is below `minextent`.
#[must_use]
pub fn drop_smallest_as_needed(inputs: &[DropInput], minextent: f64) -> Vec<bool> {
	inputs.iter().map(|c| c.extent >= minextent).collect()
}

/// `increase_gamma_as_needed`: a density-compensated keep/drop decision,
/// ported from the source's `manage_gap`. Input must already be in spatial
/// order. Rather than a hard `mingap`, a rejected feature narrows a running
/// gap requirement instead of resetting it, and the next candidate only
/// needs to clear that narrowed requirement (its normalized distance from
/// the last *candidate*, raised to the `gamma`th power) to be kept — so a
/// dense run thins out geometrically rather than uniformly. `scale` is the
/// per-zoom spatial-index normalization factor (`64 - 2*(z+8)` bits of the
/// index span one unit of distance).
#[must_use]
pub fn increase_gamma_as_needed(inputs: &[DropInput], gamma: f64, scale: f64) -> Vec<bool> {
	if gamma <= 0.0 {
		return vec![true; inputs.len()];
	}
	let scale = scale.max(1.0);
	let mut keep = Vec::with_capacity(inputs.len());
	let mut prev_index = 0u64;
	let mut gap = 0.0f64;

	for c in inputs {
		let index = c.spatial_index;
		let keep_this = if gap > 0.0 {
			if index == prev_index {
				false
			} else if index < prev_index || ((index - prev_index) as f64 / scale).powf(gamma) >= gap {
				gap = 0.0;
				true
			} else {
				false
			}
		} else if index >= prev_index {
			gap = (index - prev_index) as f64 / scale;
			if gap == 0.0 {
				false
			} else if gap < 1.0 {
				false
			} else {
				gap = 0.0;
				true
			}
		} else {
			true
		};
		prev_index = index;
		keep.push(keep_this);
	}
	keep
}

#[cfg(test)]
mod tests {
	use super::*;

	fn input(spatial_index: u64) -> DropInput {
		DropInput { feature_minzoom: 0, spatial_index, extent: 1.0 }
	}

	#[test]
	fn densest_keeps_first_and_enforces_gap() {
		let inputs = vec![input(0), input(1), input(100), input(101)];
		let keep = drop_densest_as_needed(&inputs, 50.0);
		assert_eq!(keep, vec![true, false, true, false]);
	}

	#[test]
	fn fraction_prefers_higher_minzoom() {
		let inputs = vec![
			DropInput { feature_minzoom: 10, spatial_index: 0, extent: 1.0 },
			DropInput { feature_minzoom: 2, spatial_index: 0, extent: 1.0 },
		];
		let keep = drop_fraction_as_needed(&inputs, 5.0);
		assert_eq!(keep, vec![true, false]);
	}

	#[test]
	fn smallest_drops_below_threshold() {
		let inputs = vec![
			DropInput { feature_minzoom: 0, spatial_index: 0, extent: 0.5 },
			DropInput { feature_minzoom: 0, spatial_index: 0, extent: 5.0 },
		];
		let keep = drop_smallest_as_needed(&inputs, 1.0);
		assert_eq!(keep, vec![false, true]);
	}

	#[test]
	fn gamma_of_zero_keeps_everything() {
		let inputs = vec![input(50), input(60), input(200)];
		let keep = increase_gamma_as_needed(&inputs, 0.0, 100.0);
		assert_eq!(keep, vec![true, true, true]);
	}

	#[test]
	fn gamma_rejects_a_narrow_run_then_admits_a_wide_gap() {
		let inputs = vec![input(50), input(60), input(200)];
		let keep = increase_gamma_as_needed(&inputs, 1.0, 100.0);
		assert_eq!(keep, vec![false, false, true]);
	}

	#[test]
	fn gamma_admits_every_candidate_once_spacing_already_clears_scale() {
		let inputs = vec![input(0), input(200), input(400), input(600)];
		let keep = increase_gamma_as_needed(&inputs, 1.0, 100.0);
		assert_eq!(keep, vec![false, true, true, true]);
	}
}
