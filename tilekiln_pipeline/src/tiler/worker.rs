//! The per-tile worker (§4.8 steps 1-12): fetch, clip, filter, dot-drop,
//! drop-policy, cluster, accumulate, simplify/clean, order, assemble and the
//! size/count governor retry loop, wired together from the building blocks
//! in the sibling modules.

use super::accumulate::{accumulate_value, MeanState};
use super::assemble::{assemble_layer, FinishedFeature};
use super::cluster::assign_clusters;
use super::order::{order_features, OrderMode};
use super::policy::{drop_densest_as_needed, drop_fraction_as_needed, drop_smallest_as_needed, increase_gamma_as_needed, DropInput};
use crate::context::{AccumulateOp, DropPolicy, RetryThresholds, TilingContext};
use anyhow::Result;
use std::collections::HashMap;
use tilekiln_core::tile_coord::TileCoord;
use tilekiln_geometry::simplify::{stairstep_quantize, SharedNodeSet};
use tilekiln_geometry::{area_of_rings, clean, clip, remove_noop, simplify, split_rings, Draw, GeomType, TinyPolygonAccumulator};
use tilekiln_mvt::{MvtGeomType, MvtLayer, MvtValue, SerialFeature, SerialGeomType};

/// Below this zoom, kept geometry is stair-step quantized to the pixel grid
/// before simplification (§4.5: "for very low zooms... deliberate
/// stair-step output").
const STAIRSTEP_MAX_ZOOM: u8 = 6;

/// One feature competing for a slot in a tile, in world-plane coordinates
/// with its spooled attributes still unresolved (key/value ids into a
/// string pool the caller owns).
#[derive(Clone)]
pub struct TileCandidate {
	pub feature: SerialFeature,
	pub spatial_ix: u64,
	pub seq: u32,
}

/// The result of building one tile: the assembled layer, its encoded size,
/// how many of the original candidates were dropped along the way, and
/// (unclipped, world-coordinate) copies of the candidates the zoom driver
/// should rewrite into the next zoom's child-tile shards.
///
/// `fanout` is independent of the drop policy and of `feature_minzoom`: a
/// feature not yet due to appear at this zoom must still propagate to finer
/// zooms where it may become due, so only the buffered bbox test, the
/// expression filter and `tippecanoe_maxzoom` gate it (§4.9, mirroring the
/// source's `rewrite` call happening before the minzoom check in
/// `next_feature`).
pub struct TileWorkerOutcome {
	pub layer: MvtLayer,
	pub bytes: Vec<u8>,
	pub kept: usize,
	pub dropped: usize,
	pub fanout: Vec<TileCandidate>,
}

/// Drives the whole per-tile pipeline for a single layer.
pub struct TileWorker {
	ctx: TilingContext,
}

impl TileWorker {
	#[must_use]
	pub fn new(ctx: TilingContext) -> TileWorker {
		TileWorker { ctx }
	}

	/// Builds one tile's layer from `candidates`, retrying with
	/// progressively tighter [`RetryThresholds`] while the assembled layer
	/// exceeds `max_tile_bytes`/`max_tile_features` and a [`DropPolicy`] is
	/// configured to relieve it.
	///
	/// `resolve_tag` turns a spooled `(key_id, value_id)` pair into a named
	/// attribute; `accumulate_ops` maps an attribute name to the op used
	/// when a cluster follower's value is folded into its leader's (an
	/// attribute absent from the map keeps the leader's value unchanged).
	/// `keep` is the upstream expression filter (§4.8 step 3); features it
	/// rejects never reach clipping.
	pub fn build_tile(
		&self,
		coord: TileCoord,
		layer_name: &str,
		candidates: Vec<TileCandidate>,
		resolve_tag: impl Fn(u32) -> String,
		resolve_value: impl Fn(u32) -> MvtValue,
		accumulate_ops: &HashMap<String, AccumulateOp>,
		keep: impl Fn(&SerialFeature) -> bool,
	) -> Result<TileWorkerOutcome> {
		let total = candidates.len();
		let buffered = coord.buffered_world_rect(self.ctx.buffer);

		let fanout: Vec<TileCandidate> = candidates
			.iter()
			.filter(|c| {
				let f = &c.feature;
				buffered.intersects_bbox(f.bbox) && f.tippecanoe_maxzoom.map_or(true, |mz| mz > coord.z) && keep(f)
			})
			.cloned()
			.collect();

		let survivors: Vec<TileCandidate> = candidates
			.into_iter()
			.filter(|c| {
				let f = &c.feature;
				let effective_minzoom = f.minzoom.max(f.tippecanoe_minzoom.unwrap_or(0));
				coord.z >= effective_minzoom
					&& coord.z <= f.tippecanoe_maxzoom.unwrap_or(u8::MAX)
					&& buffered.intersects_bbox(f.bbox)
					&& keep(f)
			})
			.collect();

		let mut thresholds = RetryThresholds::default();
		loop {
			let outcome = self.assemble_once(coord, layer_name, &survivors, &resolve_tag, &resolve_value, accumulate_ops, &thresholds)?;
			let over_budget = outcome.bytes.len() > self.ctx.max_tile_bytes || outcome.kept > self.ctx.max_tile_features;
			if !over_budget {
				return Ok(TileWorkerOutcome { dropped: total - outcome.kept, fanout, ..outcome });
			}
			let Some(policy) = self.ctx.drop_policy else {
				return Ok(TileWorkerOutcome { dropped: total - outcome.kept, fanout, ..outcome });
			};
			if !thresholds.tighten(policy) {
				return Ok(TileWorkerOutcome { dropped: total - outcome.kept, fanout, ..outcome });
			}
		}
	}

	fn assemble_once(
		&self,
		coord: TileCoord,
		layer_name: &str,
		survivors: &[TileCandidate],
		resolve_tag: &impl Fn(u32) -> String,
		resolve_value: &impl Fn(u32) -> MvtValue,
		accumulate_ops: &HashMap<String, AccumulateOp>,
		thresholds: &RetryThresholds,
	) -> Result<TileWorkerOutcome> {
		let rect = coord.buffered_world_rect(self.ctx.buffer);
		let span = coord.world_span();

		let mut clipped: Vec<(usize, SerialFeature)> = Vec::new();
		for (i, c) in survivors.iter().enumerate() {
			let geom = clip_in_world(&c.feature, rect);
			if geom.is_empty() {
				continue;
			}
			let mut f = c.feature.clone();
			f.geometry = translate_to_tile(&geom, rect, span, self.ctx.extent);
			clipped.push((i, f));
		}

		let keep_mask = apply_drop_policy(self.ctx.drop_policy, coord.z, survivors, &clipped, thresholds);
		let kept: Vec<(usize, SerialFeature)> = clipped.into_iter().filter(|(i, _)| keep_mask[*i]).collect();

		// Shared-node protection (§4.5): any vertex touched by more than one
		// surviving feature is marked necessary before any feature's geometry
		// is simplified, so independently-simplified features never drift
		// apart at the seam they used to share.
		let mut shared_nodes = SharedNodeSet::new();
		for (_, f) in &kept {
			shared_nodes.observe(&f.geometry);
		}

		let order: Vec<usize> = (0..kept.len()).collect();
		let clusters = assign_clusters(&order, self.ctx.retain_points_multiplier);

		let mut finished: Vec<(FinishedFeature, u32)> = Vec::with_capacity(clusters.len());
		let mut tiny_acc = TinyPolygonAccumulator::new(self.ctx.extent);
		let mut tiny_best_area = 0.0_f64;
		let mut tiny_best_attrs: Option<Vec<(String, MvtValue)>> = None;

		for cluster in &clusters {
			let (leader_ix, leader_feature) = &kept[cluster.leader];
			let leader_seq = survivors[*leader_ix].seq;
			let mut attrs: Vec<(String, MvtValue)> = leader_feature
				.tags
				.iter()
				.map(|&(k, v)| (resolve_tag(k), resolve_value(v)))
				.collect();
			let mut mean_state: HashMap<String, MeanState> = HashMap::new();

			for &follower_ix in &cluster.followers {
				let (_, follower) = &kept[follower_ix];
				for &(k, v) in &follower.tags {
					let key = resolve_tag(k);
					let value = resolve_value(v);
					let Some(op) = accumulate_ops.get(&key) else { continue };
					if let Some(slot) = attrs.iter_mut().find(|(ak, _)| ak == &key) {
						slot.1 = if *op == AccumulateOp::Mean {
							mean_state.entry(key).or_insert_with(|| MeanState::seeded(&slot.1)).fold(&value)
						} else {
							accumulate_value(*op, &slot.1, &value)
						};
					} else {
						attrs.push((key, value));
					}
				}
			}

			let marked = shared_nodes.mark_necessary(leader_feature.geometry.clone());
			let cleaned = clean_and_simplify(leader_feature.geom_type, marked, coord.z, thresholds.detail);

			if leader_feature.geom_type == SerialGeomType::Polygon {
				let area = area_of_rings(&split_rings(&cleaned)).abs();
				if is_tiny(area, self.ctx.extent) {
					if area > tiny_best_area {
						tiny_best_area = area;
						tiny_best_attrs = Some(attrs.clone());
					}
					if let Some(point) = tiny_acc.accumulate(&cleaned, area) {
						finished.push((
							FinishedFeature {
								id: leader_feature.id,
								geom_type: MvtGeomType::Point,
								geometry: vec![Draw::move_to(point.0, point.1)],
								attributes: tiny_best_attrs.take().unwrap_or_default(),
							},
							leader_seq,
						));
						tiny_best_area = 0.0;
					}
					continue;
				}
			}

			let geom_type = geometry_class(leader_feature.geom_type);
			finished.push((FinishedFeature { id: leader_feature.id, geom_type, geometry: cleaned, attributes: attrs }, leader_seq));
		}

		if let Some(point) = tiny_acc.flush() {
			finished.push((
				FinishedFeature {
					id: None,
					geom_type: MvtGeomType::Point,
					geometry: vec![Draw::move_to(point.0, point.1)],
					attributes: tiny_best_attrs.take().unwrap_or_default(),
				},
				0,
			));
		}

		let seq: Vec<u32> = finished.iter().map(|(_, s)| *s).collect();
		let order_mode = if self.ctx.preserve_input_order { OrderMode::PreserveInput } else { OrderMode::AsCoalesced };
		let final_order = order_features(&(0..finished.len()).collect::<Vec<_>>(), &order_mode, &seq, |c, _| finished[c].0.attributes.first().map(|(_, v)| v.clone()));
		let ordered: Vec<FinishedFeature> = final_order
			.into_iter()
			.map(|i| {
				let (f, _) = &finished[i];
				FinishedFeature { id: f.id, geom_type: f.geom_type, geometry: f.geometry.clone(), attributes: f.attributes.clone() }
			})
			.collect();

		let finished = if self.ctx.coalesce { coalesce_adjacent(ordered, coord.z, thresholds.detail) } else { ordered };

		let kept_count = finished.len();
		let layer = assemble_layer(layer_name, self.ctx.extent, finished);
		let bytes = layer.to_blob()?.into_vec();
		Ok(TileWorkerOutcome { layer, bytes, kept: kept_count, dropped: 0, fanout: Vec::new() })
	}
}

/// Coalesces adjacent features sharing (type, id, attributes) into one
/// (§4.8 step 9, §8 property 5: "no two identical adjacent features after
/// coalesce"), re-simplifying and re-cleaning the merged geometry since a
/// union of two already-simplified parts can introduce redundant vertices
/// at the seam.
fn coalesce_adjacent(features: Vec<FinishedFeature>, z: u8, detail: u32) -> Vec<FinishedFeature> {
	let mut out: Vec<FinishedFeature> = Vec::with_capacity(features.len());
	for f in features {
		if let Some(prev) = out.last_mut() {
			if prev.geom_type == f.geom_type && prev.id == f.id && prev.attributes == f.attributes {
				prev.geometry.extend(f.geometry);
				let geom_type = match prev.geom_type {
					MvtGeomType::Point => SerialGeomType::Point,
					MvtGeomType::LineString => SerialGeomType::Line,
					MvtGeomType::Polygon | MvtGeomType::Unknown => SerialGeomType::Polygon,
				};
				prev.geometry = clean_and_simplify(geom_type, std::mem::take(&mut prev.geometry), z, detail);
				continue;
			}
		}
		out.push(f);
	}
	out
}

fn geometry_class(g: SerialGeomType) -> MvtGeomType {
	match g {
		SerialGeomType::Point => MvtGeomType::Point,
		SerialGeomType::Line => MvtGeomType::LineString,
		SerialGeomType::Polygon => MvtGeomType::Polygon,
	}
}

fn clip_in_world(feature: &SerialFeature, rect: tilekiln_core::tile_coord::TileRect) -> Vec<Draw> {
	match feature.geom_type {
		SerialGeomType::Point => clip::clip_points(&feature.geometry, rect),
		SerialGeomType::Line => clip::clip_lines(&feature.geometry, rect),
		SerialGeomType::Polygon => clip::clip_polygon_rings(&feature.geometry, rect),
	}
}

fn translate_to_tile(geom: &[Draw], rect: tilekiln_core::tile_coord::TileRect, span: u64, extent: u32) -> Vec<Draw> {
	let span = span as f64;
	let extent = f64::from(extent);
	geom
		.iter()
		.map(|d| {
			let tx = ((d.x - rect.min_x) as f64 / span * extent).round() as i64;
			let ty = ((d.y - rect.min_y) as f64 / span * extent).round() as i64;
			let translated = Draw::new(d.op, tx, ty);
			if d.necessary {
				translated.necessary()
			} else {
				translated
			}
		})
		.collect()
}

fn clean_and_simplify(geom_type: SerialGeomType, geom: Vec<Draw>, z: u8, detail: u32) -> Vec<Draw> {
	let geom = if z < STAIRSTEP_MAX_ZOOM && geom_type != SerialGeomType::Point {
		let step = 1i64 << (STAIRSTEP_MAX_ZOOM - z);
		stairstep_quantize(&geom, step)
	} else {
		geom
	};

	let tolerance = 1.0 / f64::from(1u32 << detail.min(20));
	let gtype = match geom_type {
		SerialGeomType::Point => GeomType::Point,
		SerialGeomType::Line => GeomType::Line,
		SerialGeomType::Polygon => GeomType::Polygon,
	};
	let simplified = match geom_type {
		SerialGeomType::Point => geom,
		SerialGeomType::Line => simplify::simplify_parts(&geom, tolerance),
		SerialGeomType::Polygon => simplify::simplify_parts(&geom, tolerance),
	};
	let noop_free = remove_noop(simplified, gtype);
	if geom_type == SerialGeomType::Polygon {
		clean::clean_polygon_rings(&noop_free)
	} else {
		noop_free
	}
}

/// Per-zoom spatial-index normalization factor for [`increase_gamma_as_needed`]
/// (the source's `scale = (double)(1LL << (64 - 2*(z+8)))`): at zoom `z`
/// each tile covers `64 - 2*(z+8)` bits of the 64-bit spatial index, so that
/// many bits of index span one "pixel" of gap distance.
fn gamma_scale(z: u8) -> f64 {
	2f64.powi(64 - 2 * (i32::from(z) + 8))
}

fn apply_drop_policy(policy: Option<DropPolicy>, z: u8, survivors: &[TileCandidate], clipped: &[(usize, SerialFeature)], thresholds: &RetryThresholds) -> Vec<bool> {
	let mut keep = vec![true; survivors.len()];
	let Some(policy) = policy else {
		return keep;
	};

	let inputs: Vec<DropInput> = clipped
		.iter()
		.map(|(i, f)| DropInput { feature_minzoom: f.minzoom, spatial_index: survivors[*i].spatial_ix, extent: survivors[*i].feature.extent })
		.collect();

	let decisions = match policy {
		DropPolicy::DropFractionAsNeeded | DropPolicy::CoalesceFractionAsNeeded => drop_fraction_as_needed(&inputs, thresholds.drop_sequence),
		DropPolicy::DropDensestAsNeeded | DropPolicy::CoalesceDensestAsNeeded | DropPolicy::ClusterDensestAsNeeded => {
			drop_densest_as_needed(&inputs, thresholds.mingap)
		}
		DropPolicy::DropSmallestAsNeeded | DropPolicy::CoalesceSmallestAsNeeded => drop_smallest_as_needed(&inputs, thresholds.minextent),
		DropPolicy::IncreaseGammaAsNeeded => increase_gamma_as_needed(&inputs, thresholds.gamma, gamma_scale(z)),
	};

	for (slot, (i, _)) in decisions.into_iter().zip(clipped.iter()) {
		keep[*i] = slot;
	}
	keep
}
