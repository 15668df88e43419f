//! A small LRU cache of decoded parent tiles (§4.10: "operates on an LRU
//! cache of decoded parent tiles so child synthesis of a 2x2 fan-out
//! re-uses the parent decode").

use std::collections::HashMap;
use std::sync::Arc;
use tilekiln_core::tile_coord::TileCoord;
use tilekiln_mvt::MvtTile;

/// Caches decoded [`MvtTile`]s by coordinate, evicting the least recently
/// touched entry once `capacity` is exceeded. Recency is tracked as a
/// logical tick counter rather than an intrusive linked list, which keeps
/// the implementation a handful of lines at the cost of an O(n) eviction
/// scan — fine at the small capacities (tens of parent tiles) this cache is
/// sized for.
pub struct TileCache {
	capacity: usize,
	tick: u64,
	entries: HashMap<TileCoord, (Arc<MvtTile>, u64)>,
}

impl TileCache {
	#[must_use]
	pub fn new(capacity: usize) -> TileCache {
		TileCache { capacity: capacity.max(1), tick: 0, entries: HashMap::new() }
	}

	#[must_use]
	pub fn get(&mut self, coord: TileCoord) -> Option<Arc<MvtTile>> {
		self.tick += 1;
		let tick = self.tick;
		self.entries.get_mut(&coord).map(|(tile, last_used)| {
			*last_used = tick;
			Arc::clone(tile)
		})
	}

	pub fn insert(&mut self, coord: TileCoord, tile: Arc<MvtTile>) {
		self.tick += 1;
		if !self.entries.contains_key(&coord) && self.entries.len() >= self.capacity {
			if let Some(&lru_coord) = self.entries.iter().min_by_key(|(_, (_, last_used))| *last_used).map(|(c, _)| c) {
				self.entries.remove(&lru_coord);
			}
		}
		self.entries.insert(coord, (tile, self.tick));
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
