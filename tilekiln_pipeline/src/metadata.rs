//! Layer map and tilestats (§3 "Layer map"): per-layer feature counts and
//! per-attribute value statistics, one writable slot per tiling thread
//! (§5), merged into the run-wide [`RunMetadata`] record a post-pass emits
//! after the zoom driver finishes (§6).

use crate::context::DropPolicy;
use std::collections::HashMap;
use tilekiln_mvt::{MvtGeomType, MvtValue, SerialGeomType};

/// Classifies an assembled MVT feature's geometry type into the same
/// three-way split [`LayerMapEntry`] counts by (`Unknown` is never produced
/// by this crate's own assembly, but folds into polygon counts rather than
/// panicking if a foreign-built tile is ever recorded).
#[must_use]
pub fn classify_mvt_geom_type(geom_type: MvtGeomType) -> SerialGeomType {
	match geom_type {
		MvtGeomType::Point => SerialGeomType::Point,
		MvtGeomType::LineString => SerialGeomType::Line,
		MvtGeomType::Polygon | MvtGeomType::Unknown => SerialGeomType::Polygon,
	}
}

/// Caps `AttributeStats::sample_values`, mirroring the source's
/// `max_tilestats_sample_values` default.
const MAX_SAMPLE_VALUES: usize = 1000;

const TYPE_STRING: u8 = 1;
const TYPE_NUMBER: u8 = 1 << 1;
const TYPE_BOOL: u8 = 1 << 2;

/// Which MVT value kinds have been observed for one attribute, OR'd
/// together the way the source packs `1 << val.type` into a single int.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttrTypeUnion(u8);

impl AttrTypeUnion {
	fn observe(&mut self, value: &MvtValue) {
		self.0 |= match value {
			MvtValue::String(_) => TYPE_STRING,
			MvtValue::Float(_) | MvtValue::Double(_) | MvtValue::Int(_) | MvtValue::UInt(_) | MvtValue::SInt(_) => TYPE_NUMBER,
			MvtValue::Bool(_) => TYPE_BOOL,
		};
	}

	#[must_use]
	pub fn has_string(self) -> bool {
		self.0 & TYPE_STRING != 0
	}

	#[must_use]
	pub fn has_number(self) -> bool {
		self.0 & TYPE_NUMBER != 0
	}

	#[must_use]
	pub fn has_bool(self) -> bool {
		self.0 & TYPE_BOOL != 0
	}

	fn merge(&mut self, other: AttrTypeUnion) {
		self.0 |= other.0;
	}
}

fn numeric(value: &MvtValue) -> Option<f64> {
	match *value {
		MvtValue::Double(d) => Some(d),
		MvtValue::Float(f) => Some(f64::from(f)),
		MvtValue::Int(i) | MvtValue::SInt(i) => Some(i as f64),
		MvtValue::UInt(u) => Some(u as f64),
		MvtValue::String(_) | MvtValue::Bool(_) => None,
	}
}

/// Sort/dedup key for a sample value: type rank first (so the sorted vector
/// groups by type the way the source's `type_and_string` ordering does),
/// then its formatted content.
fn sample_key(value: &MvtValue) -> (u8, String) {
	match value {
		MvtValue::Bool(b) => (0, b.to_string()),
		MvtValue::String(s) => (1, s.clone()),
		MvtValue::Double(d) => (2, d.to_string()),
		MvtValue::Float(f) => (2, f.to_string()),
		MvtValue::Int(i) | MvtValue::SInt(i) => (2, i.to_string()),
		MvtValue::UInt(u) => (2, u.to_string()),
	}
}

/// Running statistics for one attribute name within one layer: a sorted,
/// deduplicated sample of observed values (capped), the numeric min/max
/// across any numeric-typed observation, and the union of value kinds seen.
#[derive(Clone, Debug)]
pub struct AttributeStats {
	pub sample_values: Vec<MvtValue>,
	pub min: f64,
	pub max: f64,
	pub type_union: AttrTypeUnion,
}

impl Default for AttributeStats {
	fn default() -> AttributeStats {
		AttributeStats { sample_values: Vec::new(), min: f64::INFINITY, max: f64::NEG_INFINITY, type_union: AttrTypeUnion::default() }
	}
}

impl AttributeStats {
	pub fn observe(&mut self, value: &MvtValue) {
		self.type_union.observe(value);
		if let Some(n) = numeric(value) {
			self.min = self.min.min(n);
			self.max = self.max.max(n);
		}
		let key = sample_key(value);
		if let Err(pos) = self.sample_values.binary_search_by_key(&key, sample_key) {
			self.sample_values.insert(pos, value.clone());
			if self.sample_values.len() > MAX_SAMPLE_VALUES {
				self.sample_values.pop();
			}
		}
	}

	fn merge(&mut self, other: AttributeStats) {
		self.type_union.merge(other.type_union);
		self.min = self.min.min(other.min);
		self.max = self.max.max(other.max);
		for value in other.sample_values {
			self.observe(&value);
		}
	}
}

/// One layer's entry in the [`LayerMap`]: its stable id (assignment order),
/// observed minzoom/maxzoom, per-geometry-type feature counts, and
/// per-attribute [`AttributeStats`].
#[derive(Clone, Debug)]
pub struct LayerMapEntry {
	pub id: usize,
	pub minzoom: u8,
	pub maxzoom: u8,
	pub points: u64,
	pub lines: u64,
	pub polygons: u64,
	pub attributes: HashMap<String, AttributeStats>,
}

impl LayerMapEntry {
	fn new(id: usize, z: u8) -> LayerMapEntry {
		LayerMapEntry { id, minzoom: z, maxzoom: z, points: 0, lines: 0, polygons: 0, attributes: HashMap::new() }
	}

	fn observe(&mut self, z: u8, geom_type: SerialGeomType) {
		self.minzoom = self.minzoom.min(z);
		self.maxzoom = self.maxzoom.max(z);
		match geom_type {
			SerialGeomType::Point => self.points += 1,
			SerialGeomType::Line => self.lines += 1,
			SerialGeomType::Polygon => self.polygons += 1,
		}
	}

	fn merge(&mut self, other: LayerMapEntry) {
		self.minzoom = self.minzoom.min(other.minzoom);
		self.maxzoom = self.maxzoom.max(other.maxzoom);
		self.points += other.points;
		self.lines += other.lines;
		self.polygons += other.polygons;
		for (name, stats) in other.attributes {
			self.attributes.entry(name).or_default().merge(stats);
		}
	}
}

/// One tiling thread's writable layer-map slot (§5: "Layer map has one
/// writable slot per tiling thread and is merged post-zoom"). A thread
/// records every feature it finishes into its own `LayerMap`; the driver
/// merges all slots once the zoom pyramid is complete.
#[derive(Clone, Debug, Default)]
pub struct LayerMap {
	layers: HashMap<String, LayerMapEntry>,
}

impl LayerMap {
	#[must_use]
	pub fn new() -> LayerMap {
		LayerMap::default()
	}

	pub fn record_feature(&mut self, layer_name: &str, z: u8, geom_type: SerialGeomType, attributes: &[(String, MvtValue)]) {
		let next_id = self.layers.len();
		let entry = self.layers.entry(layer_name.to_string()).or_insert_with(|| LayerMapEntry::new(next_id, z));
		entry.observe(z, geom_type);
		for (name, value) in attributes {
			entry.attributes.entry(name.clone()).or_default().observe(value);
		}
	}

	pub fn merge(&mut self, other: LayerMap) {
		for (name, entry) in other.layers {
			match self.layers.get_mut(&name) {
				Some(existing) => existing.merge(entry),
				None => {
					self.layers.insert(name, entry);
				}
			}
		}
	}

	#[must_use]
	pub fn into_layers(self) -> HashMap<String, LayerMapEntry> {
		self.layers
	}

	#[must_use]
	pub fn layers(&self) -> &HashMap<String, LayerMapEntry> {
		&self.layers
	}
}

/// How many times each retry threshold (§4.8 step 12) was tightened across
/// the whole run, plus how many tiles that forced a retry and how many
/// exhausted every threshold and failed (§7).
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryCounters {
	pub gamma_tightened: u64,
	pub mingap_tightened: u64,
	pub minextent_tightened: u64,
	pub drop_sequence_tightened: u64,
	pub tiles_retried: u64,
	pub tiles_failed: u64,
}

impl RetryCounters {
	pub fn record_tighten(&mut self, policy: DropPolicy) {
		match policy {
			DropPolicy::DropFractionAsNeeded | DropPolicy::CoalesceFractionAsNeeded => self.drop_sequence_tightened += 1,
			DropPolicy::DropDensestAsNeeded | DropPolicy::CoalesceDensestAsNeeded | DropPolicy::ClusterDensestAsNeeded => self.mingap_tightened += 1,
			DropPolicy::DropSmallestAsNeeded | DropPolicy::CoalesceSmallestAsNeeded => self.minextent_tightened += 1,
			DropPolicy::IncreaseGammaAsNeeded => self.gamma_tightened += 1,
		}
	}

	fn merge(&mut self, other: RetryCounters) {
		self.gamma_tightened += other.gamma_tightened;
		self.mingap_tightened += other.mingap_tightened;
		self.minextent_tightened += other.minextent_tightened;
		self.drop_sequence_tightened += other.drop_sequence_tightened;
		self.tiles_retried += other.tiles_retried;
		self.tiles_failed += other.tiles_failed;
	}
}

/// The run-wide post-pass record (§6: "bounds, center, per-layer stats,
/// retry strategy counters"), built once after the zoom driver has finished
/// and all per-thread [`LayerMap`] slots have been merged.
#[derive(Clone, Debug)]
pub struct RunMetadata {
	pub bounds: [f64; 4],
	pub center: (f64, f64, u8),
	pub minzoom: u8,
	pub maxzoom: u8,
	pub layers: HashMap<String, LayerMapEntry>,
	pub retry_counters: RetryCounters,
}

impl RunMetadata {
	#[must_use]
	pub fn build(bounds: [f64; 4], minzoom: u8, maxzoom: u8, layer_map: LayerMap, retry_counters: RetryCounters) -> RunMetadata {
		let center = ((bounds[0] + bounds[2]) / 2.0, (bounds[1] + bounds[3]) / 2.0, minzoom + (maxzoom - minzoom) / 2);
		RunMetadata { bounds, center, minzoom, maxzoom, layers: layer_map.into_layers(), retry_counters }
	}
}

/// Merges per-thread layer maps and retry counters gathered across a zoom
/// pyramid's worker pool into one set before [`RunMetadata::build`] runs.
#[derive(Default)]
pub struct MetadataAccumulator {
	pub layer_map: LayerMap,
	pub retry_counters: RetryCounters,
}

impl MetadataAccumulator {
	#[must_use]
	pub fn new() -> MetadataAccumulator {
		MetadataAccumulator::default()
	}

	pub fn merge(&mut self, layer_map: LayerMap, retry_counters: RetryCounters) {
		self.layer_map.merge(layer_map);
		self.retry_counters.merge(retry_counters);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_observation_sets_both_minzoom_and_maxzoom() {
		let mut map = LayerMap::new();
		map.record_feature("roads", 5, SerialGeomType::Line, &[]);
		let entry = &map.layers()["roads"];
		assert_eq!(entry.minzoom, 5);
		assert_eq!(entry.maxzoom, 5);
		assert_eq!(entry.lines, 1);
	}

	#[test]
	fn wider_zoom_range_expands_the_bounds_not_narrows_them() {
		let mut map = LayerMap::new();
		map.record_feature("roads", 5, SerialGeomType::Line, &[]);
		map.record_feature("roads", 2, SerialGeomType::Line, &[]);
		map.record_feature("roads", 9, SerialGeomType::Line, &[]);
		let entry = &map.layers()["roads"];
		assert_eq!(entry.minzoom, 2);
		assert_eq!(entry.maxzoom, 9);
		assert_eq!(entry.lines, 3);
	}

	#[test]
	fn numeric_values_update_min_and_max_but_strings_do_not() {
		let mut stats = AttributeStats::default();
		stats.observe(&MvtValue::Double(3.0));
		stats.observe(&MvtValue::Double(-1.0));
		stats.observe(&MvtValue::String("unrelated".to_string()));
		assert_eq!(stats.min, -1.0);
		assert_eq!(stats.max, 3.0);
		assert!(stats.type_union.has_number());
		assert!(stats.type_union.has_string());
		assert!(!stats.type_union.has_bool());
	}

	#[test]
	fn duplicate_sample_values_are_not_stored_twice() {
		let mut stats = AttributeStats::default();
		stats.observe(&MvtValue::String("a".to_string()));
		stats.observe(&MvtValue::String("a".to_string()));
		stats.observe(&MvtValue::String("b".to_string()));
		assert_eq!(stats.sample_values.len(), 2);
	}

	#[test]
	fn sample_values_beyond_the_cap_are_trimmed() {
		let mut stats = AttributeStats::default();
		for i in 0..(MAX_SAMPLE_VALUES + 10) {
			stats.observe(&MvtValue::String(format!("v{i:05}")));
		}
		assert_eq!(stats.sample_values.len(), MAX_SAMPLE_VALUES);
	}

	#[test]
	fn merging_two_thread_local_maps_sums_counts_and_widens_zoom_range() {
		let mut a = LayerMap::new();
		a.record_feature("poi", 4, SerialGeomType::Point, &[("name".to_string(), MvtValue::String("x".to_string()))]);
		let mut b = LayerMap::new();
		b.record_feature("poi", 8, SerialGeomType::Point, &[("name".to_string(), MvtValue::String("y".to_string()))]);

		a.merge(b);
		let entry = &a.layers()["poi"];
		assert_eq!(entry.points, 2);
		assert_eq!(entry.minzoom, 4);
		assert_eq!(entry.maxzoom, 8);
		assert_eq!(entry.attributes["name"].sample_values.len(), 2);
	}

	#[test]
	fn run_metadata_center_is_the_bounds_midpoint() {
		let bounds = [-10.0, -5.0, 10.0, 5.0];
		let meta = RunMetadata::build(bounds, 0, 14, LayerMap::new(), RetryCounters::default());
		assert_eq!(meta.center, (0.0, 0.0, 7));
	}

	#[test]
	fn retry_counters_route_to_the_matching_threshold_bucket() {
		let mut counters = RetryCounters::default();
		counters.record_tighten(DropPolicy::DropDensestAsNeeded);
		counters.record_tighten(DropPolicy::IncreaseGammaAsNeeded);
		assert_eq!(counters.mingap_tightened, 1);
		assert_eq!(counters.gamma_tightened, 1);
		assert_eq!(counters.drop_sequence_tightened, 0);
	}
}
