//! The explicit configuration object every worker is handed instead of
//! reaching for process-wide globals (§9: "Global mutable state").

use tilekiln_core::ConcurrencyLimits;

/// Attribute accumulation strategy used when a dropped feature is coalesced
/// onto a kept one (§4.8 step 7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulateOp {
	Sum,
	Product,
	Mean,
	Min,
	Max,
	Concat,
	Comma,
}

/// Which of the mutually exclusive per-tile drop strategies is active
/// (§4.8 step 5). Exactly one mode governs a given tiling run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropPolicy {
	DropFractionAsNeeded,
	CoalesceFractionAsNeeded,
	DropDensestAsNeeded,
	CoalesceDensestAsNeeded,
	ClusterDensestAsNeeded,
	DropSmallestAsNeeded,
	CoalesceSmallestAsNeeded,
	IncreaseGammaAsNeeded,
}

/// Spatial ordering used for the progressive index and dot-dropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialIndexKind {
	Hilbert,
	Quadkey,
}

/// Tunable thresholds the tile worker's size/count governor tightens on
/// retry (§4.8 step 12, §8 property 7: "budget monotonicity"). Each field
/// only ever moves in the direction that drops more features.
#[derive(Clone, Copy, Debug)]
pub struct RetryThresholds {
	pub gamma: f64,
	pub mingap: f64,
	pub minextent: f64,
	pub drop_sequence: f64,
	pub detail: u32,
}

impl Default for RetryThresholds {
	fn default() -> RetryThresholds {
		RetryThresholds { gamma: 1.0, mingap: 0.0, minextent: 0.0, drop_sequence: 0.0, detail: 12 }
	}
}

impl RetryThresholds {
	/// Tightens whichever threshold the active [`DropPolicy`] drives,
	/// returning `false` once nothing can be tightened further (the tile
	/// then fails per §7).
	#[must_use]
	pub fn tighten(&mut self, policy: DropPolicy) -> bool {
		match policy {
			DropPolicy::DropFractionAsNeeded | DropPolicy::CoalesceFractionAsNeeded => {
				if self.drop_sequence >= 1.0 {
					return false;
				}
				self.drop_sequence = (self.drop_sequence + 0.05).min(1.0);
				true
			}
			DropPolicy::DropDensestAsNeeded | DropPolicy::CoalesceDensestAsNeeded | DropPolicy::ClusterDensestAsNeeded => {
				if self.mingap > 1e12 {
					return false;
				}
				self.mingap = (self.mingap * 1.25).max(1.0);
				true
			}
			DropPolicy::DropSmallestAsNeeded | DropPolicy::CoalesceSmallestAsNeeded => {
				if self.minextent > 1e12 {
					return false;
				}
				self.minextent = (self.minextent * 1.25).max(1.0);
				true
			}
			DropPolicy::IncreaseGammaAsNeeded => {
				if self.gamma > 16.0 {
					return false;
				}
				self.gamma *= 1.25;
				true
			}
		}
	}
}

/// Top-level configuration passed by value (or shared `Arc`) to every
/// spooler, tile worker and driver stage, replacing the source's process
/// globals and layermap pointer.
#[derive(Clone, Debug)]
pub struct TilingContext {
	pub minzoom: u8,
	pub maxzoom: u8,
	pub extend_zooms_max: u8,
	pub extent: u32,
	pub buffer: i64,
	pub temp_files: u32,
	pub max_tile_bytes: usize,
	pub max_tile_features: usize,
	pub drop_policy: Option<DropPolicy>,
	pub spatial_index: SpatialIndexKind,
	pub retain_points_multiplier: u32,
	pub coalesce: bool,
	pub preserve_input_order: bool,
	pub droprate: f64,
	pub concurrency: ConcurrencyLimits,
}

impl Default for TilingContext {
	fn default() -> TilingContext {
		TilingContext {
			minzoom: 0,
			maxzoom: 14,
			extend_zooms_max: 0,
			extent: 4096,
			buffer: 8,
			temp_files: 64,
			max_tile_bytes: 500_000,
			max_tile_features: 200_000,
			drop_policy: None,
			spatial_index: SpatialIndexKind::Hilbert,
			retain_points_multiplier: 1,
			coalesce: false,
			preserve_input_order: false,
			droprate: 2.5,
			concurrency: ConcurrencyLimits::default(),
		}
	}
}
