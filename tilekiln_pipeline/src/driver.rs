//! The zoom-level driver (§4.9): starting from the minzoom-level bucketing
//! of the ingested candidates, fans each zoom's tiles out across a per-zoom
//! worker pool, shards the next zoom's candidates by child coordinate so
//! siblings land together, and decides whether to extend past `maxzoom`
//! when a worker is still dropping features under its drop policy.

use crate::context::{AccumulateOp, TilingContext};
use crate::metadata::{classify_mvt_geom_type, LayerMap};
use crate::tiler::{assign_minzooms, TileCandidate, TileWorker};
use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tilekiln_core::progress::ProgressTrait;
use tilekiln_core::tile_coord::TileCoord;
use tilekiln_core::{compress_deflate, reverse_bits, Blob, ConcurrencyLimits};
use tilekiln_mvt::{MvtValue, SerialFeature};

/// Where a zoom driver delivers each finished tile's compressed bytes.
/// Output containers (SQLite, a directory tree, PMTiles) are external
/// collaborators (§1) that implement this instead of living in this crate.
pub trait TileSink: Send + Sync {
	fn write_tile(&self, coord: TileCoord, bytes: Vec<u8>) -> Result<()>;
}

/// Summary of one full tiling run across every zoom from `ctx.minzoom` up to
/// the (possibly extended) maxzoom.
#[derive(Debug, Clone)]
pub struct ZoomDriverOutcome {
	pub tiles_written: u64,
	pub maxzoom_used: u8,
	pub largest_tile: Option<(TileCoord, usize)>,
	pub layer_map: LayerMap,
}

/// Computes the shard a child tile's data is written to so that every
/// sibling of a z+1 tile lands in the same shard as the others (required so
/// workers at z+1 see contiguous per-tile runs within a shard). Mirrors the
/// source's `rewrite` sharding math exactly: `k = log4(child_shards)`,
/// `shard = ((jx << k) | (jy & mask)) & (child_shards - 1)`.
#[must_use]
pub fn shard_for_child(jx: u32, jy: u32, child_shards: u32) -> u32 {
	debug_assert!(child_shards.is_power_of_two() && child_shards >= 4);
	let k = child_shards.trailing_zeros() / 2;
	let mask = (1u32 << k) - 1;
	((jx << k) | (jy & mask)) & (child_shards - 1)
}

/// Every tile at `z` whose buffered rect could hold a feature with this
/// bbox, used once to bucket the ingested candidates at `ctx.minzoom`
/// before the per-zoom driver loop takes over.
fn root_tiles_for_bbox(bbox: [i64; 4], buffer: i64, z: u8) -> Vec<TileCoord> {
	if z == 0 {
		return vec![TileCoord::new(0, 0, 0).expect("z0/0/0 is always valid")];
	}
	let n = 1u32 << z;
	let span = 1i64 << (32 - u32::from(z));
	let pad = span * buffer / 256;

	let x0 = ((bbox[0] - pad).max(0) / span).clamp(0, i64::from(n - 1)) as u32;
	let x1 = ((bbox[2] + pad).max(0) / span).clamp(0, i64::from(n - 1)) as u32;
	let y0 = ((bbox[1] - pad).max(0) / span).clamp(0, i64::from(n - 1)) as u32;
	let y1 = ((bbox[3] + pad).max(0) / span).clamp(0, i64::from(n - 1)) as u32;

	let mut out = Vec::new();
	for x in x0..=x1 {
		for y in y0..=y1 {
			if let Ok(coord) = TileCoord::new(z, x, y) {
				out.push(coord);
			}
		}
	}
	out
}

/// Dot-dropping (§4.8 step 4): walks the candidate set in a progressive
/// spatial order — sorted by `reverse_bits` of each feature's spatial
/// index, so the order visits the coarsest quadrants of the index space
/// before refining into them, the way an image built from every `n`th
/// feature first would — and assigns each feature the coarsest zoom at
/// which `assign_minzooms`' per-zoom density ledger lets it through.
/// `feature.minzoom` is overwritten unconditionally; this is the only
/// producer of a dot-dropped minzoom; the per-feature
/// `tippecanoe_minzoom`/`tippecanoe_maxzoom` bounds are applied later,
/// independently, by the tile worker.
fn assign_dotdrop_minzooms(candidates: &mut [TileCandidate], minzoom: u8, maxzoom: u8, droprate: f64) {
	let mut progressive_order: Vec<usize> = (0..candidates.len()).collect();
	progressive_order.sort_by_key(|&i| reverse_bits(candidates[i].spatial_ix));
	let minzooms = assign_minzooms(&progressive_order, candidates.len(), minzoom, maxzoom, droprate);
	for (c, mz) in candidates.iter_mut().zip(minzooms) {
		c.feature.minzoom = mz;
	}
}

/// Drives every zoom level of one layer's tile tree.
pub struct ZoomDriver {
	ctx: TilingContext,
}

impl ZoomDriver {
	#[must_use]
	pub fn new(ctx: TilingContext) -> ZoomDriver {
		ZoomDriver { ctx }
	}

	/// Runs the whole tree for `layer_name`, starting from `root_candidates`
	/// (world-plane, not yet bucketed to any tile) and writing every
	/// non-empty tile's compressed bytes to `sink`.
	///
	/// `resolve_tag`/`resolve_value` turn a spooled `(key_id, value_id)` pair
	/// into a named attribute; `keep` is the upstream expression filter.
	/// Both are shared read-only across the zoom's worker pool, which is why
	/// they are taken as `Sync` trait object references rather than as
	/// `impl Fn` — a reference to a `Sync` closure is itself `Fn`, so it can
	/// be passed straight through to [`TileWorker::build_tile`].
	pub fn run(
		&self,
		layer_name: &str,
		mut root_candidates: Vec<TileCandidate>,
		sink: &dyn TileSink,
		resolve_tag: &(dyn Fn(u32) -> String + Sync),
		resolve_value: &(dyn Fn(u32) -> MvtValue + Sync),
		accumulate_ops: &HashMap<String, AccumulateOp>,
		keep: &(dyn Fn(&SerialFeature) -> bool + Sync),
		progress: &mut dyn ProgressTrait,
	) -> Result<ZoomDriverOutcome> {
		assign_dotdrop_minzooms(&mut root_candidates, self.ctx.minzoom, self.ctx.maxzoom, self.ctx.droprate);

		let mut current: HashMap<TileCoord, Vec<TileCandidate>> = HashMap::new();
		for c in root_candidates {
			for coord in root_tiles_for_bbox(c.feature.bbox, self.ctx.buffer, self.ctx.minzoom) {
				current.entry(coord).or_default().push(c.clone());
			}
		}

		let tiles_written = AtomicU64::new(0);
		let largest_tile: Mutex<Option<(TileCoord, usize)>> = Mutex::new(None);
		let first_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);
		let mut layer_map = LayerMap::new();

		let hard_cap = self.ctx.maxzoom.saturating_add(self.ctx.extend_zooms_max);
		let mut maxzoom = self.ctx.maxzoom;
		let mut z = self.ctx.minzoom;
		progress.init(&format!("tiling {layer_name}"), u64::from(hard_cap.saturating_sub(self.ctx.minzoom)) + 1);

		loop {
			if current.is_empty() {
				break;
			}

			let child_shards = self.ctx.temp_files.next_power_of_two().max(4);
			let mut shard_buckets: Vec<HashMap<TileCoord, Vec<TileCandidate>>> = (0..child_shards).map(|_| HashMap::new()).collect();
			for (coord, candidates) in current.drain() {
				let shard = shard_for_child(coord.x, coord.y, child_shards) as usize;
				shard_buckets[shard].insert(coord, candidates);
			}
			let non_empty: Vec<HashMap<TileCoord, Vec<TileCandidate>>> = shard_buckets.into_iter().filter(|b| !b.is_empty()).collect();
			let pool_size = ConcurrencyLimits::zoom_pool_size(self.ctx.concurrency.tiling, non_empty.len(), self.ctx.temp_files as usize);

			let queue: Mutex<VecDeque<HashMap<TileCoord, Vec<TileCandidate>>>> = Mutex::new(non_empty.into());
			let next: Mutex<HashMap<TileCoord, Vec<TileCandidate>>> = Mutex::new(HashMap::new());
			let still_dropping = AtomicBool::new(false);
			let distribute_fanout = z < hard_cap;
			// One writable layer-map slot per tiling thread (§5); each worker
			// merges its slot into `round_layer_map` once, when its queue
			// empties, rather than taking the lock per tile.
			let round_layer_map: Mutex<LayerMap> = Mutex::new(LayerMap::new());

			std::thread::scope(|scope| {
				for _ in 0..pool_size {
					let ctx = self.ctx.clone();
					scope.spawn(|| {
						let worker = TileWorker::new(ctx);
						let mut thread_layer_map = LayerMap::new();
						loop {
							if first_error.lock().unwrap().is_some() {
								break;
							}
							let Some(shard) = queue.lock().unwrap().pop_front() else { break };
							for (coord, candidates) in shard {
								let outcome = match worker.build_tile(coord, layer_name, candidates, resolve_tag, resolve_value, accumulate_ops, keep) {
									Ok(outcome) => outcome,
									Err(e) => {
										*first_error.lock().unwrap() = Some(e);
										break;
									}
								};

								if outcome.dropped > 0 {
									still_dropping.store(true, Ordering::Relaxed);
								}

								if !outcome.layer.features.is_empty() {
									let compressed = match compress_deflate(&Blob::from(outcome.bytes), 6) {
										Ok(b) => b,
										Err(e) => {
											*first_error.lock().unwrap() = Some(e);
											break;
										}
									};
									let len = compressed.len();
									// `db_lock`: the sink is the one piece of shared
									// mutable state a single tile's work ever crosses.
									if let Err(e) = sink.write_tile(coord, compressed.into_vec()) {
										*first_error.lock().unwrap() = Some(e);
										break;
									}
									tiles_written.fetch_add(1, Ordering::Relaxed);

									// `var_lock`: guards progress/largest-tile tracking only.
									let mut largest = largest_tile.lock().unwrap();
									if largest.as_ref().map_or(true, |(_, l)| len > *l) {
										*largest = Some((coord, len));
									}
									drop(largest);

									for feature in &outcome.layer.features {
										let attrs: Vec<(String, MvtValue)> = feature
											.tags
											.chunks_exact(2)
											.map(|pair| (outcome.layer.keys[pair[0] as usize].clone(), outcome.layer.values[pair[1] as usize].clone()))
											.collect();
										thread_layer_map.record_feature(layer_name, coord.z, classify_mvt_geom_type(feature.geom_type), &attrs);
									}
								}

								if distribute_fanout && !outcome.fanout.is_empty() {
									let mut next_guard = next.lock().unwrap();
									for child in coord.children() {
										let rect = child.buffered_world_rect(self.ctx.buffer);
										let touched: Vec<TileCandidate> = outcome.fanout.iter().filter(|c| rect.intersects_bbox(c.feature.bbox)).cloned().collect();
										if !touched.is_empty() {
											next_guard.entry(child).or_default().extend(touched);
										}
									}
								}
							}
						}
						round_layer_map.lock().unwrap().merge(thread_layer_map);
					});
				}
			});

			if let Some(e) = first_error.into_inner().unwrap() {
				return Err(e);
			}

			layer_map.merge(round_layer_map.into_inner().unwrap());
			progress.inc(1);
			current = next.into_inner().unwrap();

			if z >= maxzoom {
				if still_dropping.into_inner() && maxzoom < hard_cap {
					maxzoom += 1;
				} else {
					break;
				}
			}
			z += 1;
		}

		progress.finish();
		Ok(ZoomDriverOutcome {
			tiles_written: tiles_written.into_inner(),
			maxzoom_used: maxzoom,
			largest_tile: largest_tile.into_inner().unwrap(),
			layer_map,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::TilingContext;
	use std::sync::Mutex as StdMutex;
	use tilekiln_core::progress::ProgressTrait as _;
	use tilekiln_geometry::Draw;
	use tilekiln_mvt::{MvtLayer, SerialGeomType};

	struct RecordingSink {
		written: StdMutex<Vec<(TileCoord, usize)>>,
	}

	impl TileSink for RecordingSink {
		fn write_tile(&self, coord: TileCoord, bytes: Vec<u8>) -> Result<()> {
			self.written.lock().unwrap().push((coord, bytes.len()));
			Ok(())
		}
	}

	fn point_candidate(x: i64, y: i64, seq: u32) -> TileCandidate {
		let geometry = vec![Draw::move_to(x, y)];
		TileCandidate {
			feature: SerialFeature {
				id: Some(seq.into()),
				geom_type: SerialGeomType::Point,
				bbox: SerialFeature::bbox_of(&geometry),
				geometry,
				extent: 1.0,
				tags: vec![],
				minzoom: 0,
				tippecanoe_minzoom: None,
				tippecanoe_maxzoom: None,
			},
			spatial_ix: tilekiln_core::hilbert_index(x as u32, y as u32),
			seq,
		}
	}

	#[test]
	fn shard_formula_keeps_children_of_one_tile_in_range() {
		// child_shards = 16 => k = 2; the four immediate children of any
		// tile must spread across distinct shards since (jx,jy) differ in
		// their low bit within the same (tx,ty) pair.
		let shards: Vec<u32> = [(0u32, 0u32), (1, 0), (0, 1), (1, 1)].iter().map(|&(x, y)| shard_for_child(x, y, 16)).collect();
		assert_eq!(shards.iter().copied().collect::<std::collections::HashSet<_>>().len(), 4);
	}

	#[test]
	fn single_point_at_z0_produces_one_tile_and_descends_to_requested_maxzoom() {
		let ctx = TilingContext { minzoom: 0, maxzoom: 2, temp_files: 64, ..TilingContext::default() };
		let driver = ZoomDriver::new(ctx);
		let sink = RecordingSink { written: StdMutex::new(Vec::new()) };
		let mut progress = tilekiln_core::progress::ProgressDummy::new();
		let candidates = vec![point_candidate(1i64 << 31, 1i64 << 31, 0)];

		let outcome = driver
			.run("points", candidates, &sink, &|_| "name".to_string(), &|_| MvtValue::String("x".to_string()), &HashMap::new(), &|_| true, &mut progress)
			.unwrap();

		assert_eq!(outcome.maxzoom_used, 2);
		assert!(outcome.tiles_written >= 1);
		let written = sink.written.lock().unwrap();
		assert!(written.iter().any(|(c, _)| c.z == 0));
		assert!(written.iter().any(|(c, _)| c.z == 2));
	}

	#[test]
	fn no_surviving_feature_anywhere_writes_nothing() {
		let ctx = TilingContext { minzoom: 0, maxzoom: 1, ..TilingContext::default() };
		let driver = ZoomDriver::new(ctx);
		let sink = RecordingSink { written: StdMutex::new(Vec::new()) };
		let mut progress = tilekiln_core::progress::ProgressDummy::new();
		let candidates = vec![point_candidate(1i64 << 31, 1i64 << 31, 0)];

		let outcome = driver.run("points", candidates, &sink, &|_| "name".to_string(), &|_| MvtValue::String("x".to_string()), &HashMap::new(), &|_| false, &mut progress).unwrap();

		assert_eq!(outcome.tiles_written, 0);
		assert!(sink.written.lock().unwrap().is_empty());
	}

	struct DecodingSink {
		written: StdMutex<Vec<(TileCoord, Vec<u8>)>>,
	}

	impl TileSink for DecodingSink {
		fn write_tile(&self, coord: TileCoord, bytes: Vec<u8>) -> Result<()> {
			self.written.lock().unwrap().push((coord, bytes));
			Ok(())
		}
	}

	#[test]
	fn written_tile_bytes_decode_back_to_the_same_layer() {
		let ctx = TilingContext { minzoom: 0, maxzoom: 0, ..TilingContext::default() };
		let driver = ZoomDriver::new(ctx);
		let sink = DecodingSink { written: StdMutex::new(Vec::new()) };
		let mut progress = tilekiln_core::progress::ProgressDummy::new();
		let candidates = vec![point_candidate(1i64 << 31, 1i64 << 31, 0)];

		driver.run("points", candidates, &sink, &|_| "name".to_string(), &|_| MvtValue::String("x".to_string()), &HashMap::new(), &|_| true, &mut progress).unwrap();

		let written = sink.written.lock().unwrap();
		assert_eq!(written.len(), 1);
		let raw = tilekiln_core::decompress_deflate(&Blob::from(written[0].1.clone())).unwrap();
		let mut reader = tilekiln_core::io::ValueReaderSlice::new(raw.as_slice());
		let layer = MvtLayer::read(&mut reader).unwrap();
		assert_eq!(layer.name, "points");
		assert_eq!(layer.features.len(), 1);
	}

	#[test]
	fn a_kept_feature_is_recorded_into_the_merged_layer_map() {
		let ctx = TilingContext { minzoom: 0, maxzoom: 1, ..TilingContext::default() };
		let driver = ZoomDriver::new(ctx);
		let sink = RecordingSink { written: StdMutex::new(Vec::new()) };
		let mut progress = tilekiln_core::progress::ProgressDummy::new();
		let candidates = vec![point_candidate(1i64 << 31, 1i64 << 31, 0)];

		let outcome = driver
			.run("points", candidates, &sink, &|_| "name".to_string(), &|_| MvtValue::String("x".to_string()), &HashMap::new(), &|_| true, &mut progress)
			.unwrap();

		let layers = outcome.layer_map.layers();
		let entry = &layers["points"];
		assert_eq!(entry.minzoom, 0);
		assert_eq!(entry.maxzoom, 1);
		assert!(entry.points >= 2);
	}
}
