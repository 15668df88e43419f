//! Sizing helpers for the two thread pools the pipeline ever spins up: the
//! ingest readers (one per input shard) and the per-zoom tiling pool, whose
//! size must also respect how many shards actually carry work.

/// CPU-derived concurrency limits, mirroring the ingest/tiling split in §5.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
	/// Threads reading disjoint input shards during ingest.
	pub ingest: usize,
	/// Upper bound on the tiling pool for a single zoom level.
	pub tiling: usize,
}

impl ConcurrencyLimits {
	#[must_use]
	pub fn new(ingest: usize, tiling: usize) -> ConcurrencyLimits {
		ConcurrencyLimits {
			ingest: ingest.max(1),
			tiling: tiling.max(1),
		}
	}

	#[must_use]
	pub fn cpu_count() -> usize {
		num_cpus::get()
	}

	/// Thread pool size for one zoom level: bounded by CPU count, the number
	/// of shards that actually contain features, and `temp_files / 4` so the
	/// pool never exceeds the file-descriptor budget the shard layout assumes.
	#[must_use]
	pub fn zoom_pool_size(cpus: usize, non_empty_shards: usize, temp_files: usize) -> usize {
		let bound = cpus.min(non_empty_shards.max(1)).min((temp_files / 4).max(1));
		// round down to a power of two, minimum 1
		if bound == 0 {
			1
		} else {
			1usize << (usize::BITS - 1 - bound.leading_zeros())
		}
	}
}

impl Default for ConcurrencyLimits {
	fn default() -> ConcurrencyLimits {
		let cpus = num_cpus::get();
		ConcurrencyLimits { ingest: cpus, tiling: cpus }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_limits_at_least_one() {
		let limits = ConcurrencyLimits::default();
		assert!(limits.ingest >= 1);
		assert!(limits.tiling >= 1);
	}

	#[test]
	fn zoom_pool_rounds_down_to_power_of_two() {
		assert_eq!(ConcurrencyLimits::zoom_pool_size(7, 100, 1000), 4);
		assert_eq!(ConcurrencyLimits::zoom_pool_size(8, 100, 1000), 8);
		assert_eq!(ConcurrencyLimits::zoom_pool_size(8, 3, 1000), 2);
		assert_eq!(ConcurrencyLimits::zoom_pool_size(8, 100, 16), 4);
	}

	#[test]
	fn zoom_pool_never_zero() {
		assert_eq!(ConcurrencyLimits::zoom_pool_size(0, 0, 0), 1);
	}
}
