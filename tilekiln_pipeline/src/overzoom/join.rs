//! Tile-join core (§4.10): decode each source tile's layers, project them
//! from their own local extent into world units, clip into the destination
//! tile, re-simplify and re-emit. Layers of the same name across sources
//! merge into one destination layer; an optional "bin by id" layer groups
//! features sharing an id under one accumulated feature instead of
//! duplicating each source's geometry.

use super::cache::TileCache;
use super::project::{tile_local_to_world, world_to_tile_local};
use crate::context::{AccumulateOp, TilingContext};
use crate::tiler::{accumulate_value, MeanState};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tilekiln_core::tile_coord::{TileCoord, TileRect};
use tilekiln_geometry::{clean, clip, remove_noop, simplify, Draw, GeomType};
use tilekiln_mvt::{MvtFeature, MvtGeomType, MvtLayer, MvtTile, MvtValue};

/// One source tile feeding a join: its own coordinate (needed to project
/// its geometry back to world units) and the already-decoded tile.
pub struct JoinedSource {
	pub coord: TileCoord,
	pub tile: Arc<MvtTile>,
}

/// Drives overzoom/tile-join for one destination tile at a time, reusing a
/// [`TileCache`] of decoded parents across a 2x2 fan-out.
pub struct OverzoomJoiner {
	ctx: TilingContext,
	cache: TileCache,
}

impl OverzoomJoiner {
	#[must_use]
	pub fn new(ctx: TilingContext, cache_capacity: usize) -> OverzoomJoiner {
		OverzoomJoiner { ctx, cache: TileCache::new(cache_capacity) }
	}

	/// Caches a decoded parent tile so a later [`synthesize`](Self::synthesize)
	/// call covering one of its children can skip re-decoding it.
	pub fn cache_parent(&mut self, coord: TileCoord, tile: Arc<MvtTile>) {
		self.cache.insert(coord, tile);
	}

	#[must_use]
	pub fn cached(&mut self, coord: TileCoord) -> Option<Arc<MvtTile>> {
		self.cache.get(coord)
	}

	/// Synthesizes the tile at `dest` from `sources`, merging same-named
	/// layers and, when `bin_by_id_layer` names one of them, accumulating
	/// the attributes of features sharing an id within that layer instead
	/// of emitting one feature per source.
	pub fn synthesize(
		&self,
		dest: TileCoord,
		sources: &[JoinedSource],
		accumulate_ops: &HashMap<String, AccumulateOp>,
		bin_by_id_layer: Option<&str>,
	) -> Result<MvtTile> {
		let rect = dest.buffered_world_rect(self.ctx.buffer);
		let mut layers: HashMap<String, MvtLayer> = HashMap::new();
		let mut mean_state: HashMap<(String, u64, String), MeanState> = HashMap::new();

		for source in sources {
			for layer in &source.tile.layers {
				let bin = bin_by_id_layer == Some(layer.name.as_str());
				let dest_layer = layers.entry(layer.name.clone()).or_insert_with(|| MvtLayer::new(layer.name.clone(), self.ctx.extent));

				for feature in &layer.features {
					let world = tile_local_to_world(&feature.geometry, source.coord, layer.extent);
					let clipped = clip_in_world(feature.geom_type, &world, rect);
					if clipped.is_empty() {
						continue;
					}
					let local = world_to_tile_local(&clipped, dest, self.ctx.extent);
					let cleaned = clean_and_simplify(feature.geom_type, local);

					let attrs: Vec<(String, MvtValue)> = feature
						.tags
						.chunks_exact(2)
						.map(|pair| (layer.keys[pair[0] as usize].clone(), layer.values[pair[1] as usize].clone()))
						.collect();

					push_or_accumulate(dest_layer, feature.id, feature.geom_type, cleaned, attrs, accumulate_ops, bin, &mut mean_state);
				}
			}
		}

		Ok(MvtTile { layers: layers.into_values().collect() })
	}
}

fn clip_in_world(geom_type: MvtGeomType, geom: &[Draw], rect: TileRect) -> Vec<Draw> {
	match geom_type {
		MvtGeomType::Point => clip::clip_points(geom, rect),
		MvtGeomType::LineString => clip::clip_lines(geom, rect),
		MvtGeomType::Polygon | MvtGeomType::Unknown => clip::clip_polygon_rings(geom, rect),
	}
}

fn clean_and_simplify(geom_type: MvtGeomType, geom: Vec<Draw>) -> Vec<Draw> {
	let tolerance = 1.0 / f64::from(1u32 << 12);
	let gtype = match geom_type {
		MvtGeomType::Point => GeomType::Point,
		MvtGeomType::LineString => GeomType::Line,
		MvtGeomType::Polygon | MvtGeomType::Unknown => GeomType::Polygon,
	};
	let simplified = match geom_type {
		MvtGeomType::Point => geom,
		_ => simplify::simplify_parts(&geom, tolerance),
	};
	let noop_free = remove_noop(simplified, gtype);
	if geom_type == MvtGeomType::Polygon {
		clean::clean_polygon_rings(&noop_free)
	} else {
		noop_free
	}
}

/// Appends `attrs`/`geometry` as a new feature in `layer`, or — when `bin`
/// is set and a feature sharing `id` already exists — folds `attrs` onto
/// it under `accumulate_ops` instead of duplicating the feature (§4.10:
/// "bin by id"). `mean_state` carries the running `(sum, count)` for
/// `AccumulateOp::Mean`, keyed by `(layer name, id, attribute key)`, across
/// however many sources bin onto the same id.
fn push_or_accumulate(
	layer: &mut MvtLayer,
	id: Option<u64>,
	geom_type: MvtGeomType,
	geometry: Vec<Draw>,
	attrs: Vec<(String, MvtValue)>,
	accumulate_ops: &HashMap<String, AccumulateOp>,
	bin: bool,
	mean_state: &mut HashMap<(String, u64, String), MeanState>,
) {
	if bin {
		if let Some(id) = id {
			if let Some(pos) = layer.features.iter().position(|f| f.id == Some(id)) {
				let mut existing_attrs: Vec<(String, MvtValue)> = layer.features[pos]
					.tags
					.chunks_exact(2)
					.map(|pair| (layer.keys[pair[0] as usize].clone(), layer.values[pair[1] as usize].clone()))
					.collect();

				for (key, value) in attrs {
					if let Some(slot) = existing_attrs.iter_mut().find(|(k, _)| *k == key) {
						slot.1 = match accumulate_ops.get(&key) {
							Some(AccumulateOp::Mean) => {
								let state_key = (layer.name.clone(), id, key.clone());
								mean_state.entry(state_key).or_insert_with(|| MeanState::seeded(&slot.1)).fold(&value)
							}
							Some(op) => accumulate_value(*op, &slot.1, &value),
							None => value,
						};
					} else {
						existing_attrs.push((key, value));
					}
				}

				let tags = existing_attrs
					.into_iter()
					.flat_map(|(key, value)| {
						let key_ix = layer.intern_key(&key);
						let value_ix = layer.intern_value(value);
						[key_ix, value_ix]
					})
					.collect();
				layer.features[pos].tags = tags;
				return;
			}
		}
	}

	let tags = attrs
		.into_iter()
		.flat_map(|(key, value)| {
			let key_ix = layer.intern_key(&key);
			let value_ix = layer.intern_value(value);
			[key_ix, value_ix]
		})
		.collect();
	layer.features.push(MvtFeature { id, tags, geom_type, geometry });
}
