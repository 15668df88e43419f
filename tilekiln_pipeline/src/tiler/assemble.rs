//! Layer assembly (§4.8 step 11): the last step before a tile's bytes are
//! final — pack each surviving feature's geometry and attributes into an
//! [`MvtLayer`], interning attribute keys and values into the layer's
//! shared dictionaries as it goes.

use tilekiln_geometry::Draw;
use tilekiln_mvt::{MvtFeature, MvtGeomType, MvtLayer, MvtValue};

/// A feature ready for wire encoding: tile-local geometry plus its
/// resolved (not yet interned) attributes.
pub struct FinishedFeature {
	pub id: Option<u64>,
	pub geom_type: MvtGeomType,
	pub geometry: Vec<Draw>,
	pub attributes: Vec<(String, MvtValue)>,
}

/// Builds one named layer from a set of finished features, deduplicating
/// attribute keys and values via [`MvtLayer::intern_key`]/[`intern_value`](MvtLayer::intern_value).
#[must_use]
pub fn assemble_layer(name: &str, extent: u32, features: Vec<FinishedFeature>) -> MvtLayer {
	let mut layer = MvtLayer::new(name.to_string(), extent);
	for f in features {
		let mut tags = Vec::with_capacity(f.attributes.len() * 2);
		for (key, value) in f.attributes {
			let k = layer.intern_key(&key);
			let v = layer.intern_value(value);
			tags.push(k);
			tags.push(v);
		}
		layer.features.push(MvtFeature { id: f.id, tags, geom_type: f.geom_type, geometry: f.geometry });
	}
	layer
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shared_attribute_is_interned_once() {
		let features = vec![
			FinishedFeature {
				id: Some(1),
				geom_type: MvtGeomType::Point,
				geometry: vec![Draw::move_to(0, 0)],
				attributes: vec![("class".to_string(), MvtValue::String("road".to_string()))],
			},
			FinishedFeature {
				id: Some(2),
				geom_type: MvtGeomType::Point,
				geometry: vec![Draw::move_to(1, 1)],
				attributes: vec![("class".to_string(), MvtValue::String("road".to_string()))],
			},
		];
		let layer = assemble_layer("points", 4096, features);
		assert_eq!(layer.keys.len(), 1);
		assert_eq!(layer.values.len(), 1);
		assert_eq!(layer.features[0].tags, layer.features[1].tags);
	}

	#[test]
	fn distinct_values_get_distinct_entries() {
		let features = vec![
			FinishedFeature {
				id: None,
				geom_type: MvtGeomType::Point,
				geometry: vec![Draw::move_to(0, 0)],
				attributes: vec![("name".to_string(), MvtValue::String("a".to_string()))],
			},
			FinishedFeature {
				id: None,
				geom_type: MvtGeomType::Point,
				geometry: vec![Draw::move_to(1, 1)],
				attributes: vec![("name".to_string(), MvtValue::String("b".to_string()))],
			},
		];
		let layer = assemble_layer("points", 4096, features);
		assert_eq!(layer.keys.len(), 1);
		assert_eq!(layer.values.len(), 2);
	}
}
