use super::feature::MvtFeature;
use super::value::MvtValue;
use anyhow::{bail, Context, Result};
use tilekiln_core::io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob};

/// One named layer of a tile, with its own coordinate extent and shared
/// key/value dictionaries (§4.4 of the vector tile spec: `String key_id`/
/// `Value value_id` pairs in each feature's `tags` index into these).
#[derive(Debug, Default, PartialEq)]
pub struct MvtLayer {
	pub name: String,
	pub extent: u32,
	pub version: u32,
	pub features: Vec<MvtFeature>,
	pub keys: Vec<String>,
	pub values: Vec<MvtValue>,
}

impl MvtLayer {
	#[must_use]
	pub fn new(name: String, extent: u32) -> MvtLayer {
		MvtLayer { name, extent, version: 1, features: Vec::new(), keys: Vec::new(), values: Vec::new() }
	}

	pub fn read(reader: &mut dyn ValueReader<'_>) -> Result<MvtLayer> {
		let mut layer = MvtLayer { version: 1, extent: 4096, ..MvtLayer::default() };
		while reader.has_remaining() {
			match reader.read_pbf_key().context("reading MVT layer key")? {
				(1, 2) => layer.name = reader.read_pbf_string().context("reading layer name")?,
				(2, 2) => {
					let mut sub = reader.get_pbf_sub_reader().context("reading feature sub-message")?;
					layer.features.push(MvtFeature::read(&mut sub)?);
				}
				(3, 2) => layer.keys.push(reader.read_pbf_string().context("reading layer key")?),
				(4, 2) => {
					let mut sub = reader.get_pbf_sub_reader().context("reading value sub-message")?;
					layer.values.push(MvtValue::read(&mut sub)?);
				}
				(5, 0) => layer.extent = reader.read_varint().context("reading layer extent")? as u32,
				(15, 0) => layer.version = reader.read_varint().context("reading layer version")? as u32,
				(f, w) => bail!("unexpected MVT layer field {f} wire type {w}"),
			}
		}
		Ok(layer)
	}

	pub fn to_blob(&self) -> Result<tilekiln_core::Blob> {
		let mut writer = ValueWriterBlob::new();
		writer.write_pbf_key(1, 2)?;
		writer.write_pbf_string(&self.name)?;
		for feature in &self.features {
			writer.write_pbf_key(2, 2)?;
			writer.write_pbf_blob(&feature.to_blob()?)?;
		}
		for key in &self.keys {
			writer.write_pbf_key(3, 2)?;
			writer.write_pbf_string(key)?;
		}
		for value in &self.values {
			writer.write_pbf_key(4, 2)?;
			writer.write_pbf_blob(&value.to_blob()?)?;
		}
		writer.write_pbf_key(5, 0)?;
		writer.write_varint(u64::from(self.extent))?;
		writer.write_pbf_key(15, 0)?;
		writer.write_varint(u64::from(self.version))?;
		Ok(writer.into_blob())
	}

	/// Interns `key` into the layer's key table, returning its index.
	pub fn intern_key(&mut self, key: &str) -> u32 {
		if let Some(pos) = self.keys.iter().position(|k| k == key) {
			return pos as u32;
		}
		self.keys.push(key.to_string());
		(self.keys.len() - 1) as u32
	}

	/// Interns `value` into the layer's value table, returning its index.
	pub fn intern_value(&mut self, value: MvtValue) -> u32 {
		if let Some(pos) = self.values.iter().position(|v| v == &value) {
			return pos as u32;
		}
		self.values.push(value);
		(self.values.len() - 1) as u32
	}
}

pub(crate) fn read_layer_from_slice(data: &[u8]) -> Result<MvtLayer> {
	let mut reader = ValueReaderSlice::new(data);
	MvtLayer::read(&mut reader)
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::geom_type::MvtGeomType;
	use tilekiln_geometry::Draw;

	#[test]
	fn layer_roundtrips() {
		let mut layer = MvtLayer::new("roads".to_string(), 4096);
		let k = layer.intern_key("name");
		let v = layer.intern_value(MvtValue::String("Main St".to_string()));
		layer.features.push(MvtFeature {
			id: Some(1),
			tags: vec![k, v],
			geom_type: MvtGeomType::LineString,
			geometry: vec![Draw::move_to(0, 0), Draw::line_to(100, 100)],
		});
		let blob = layer.to_blob().unwrap();
		let decoded = read_layer_from_slice(blob.as_slice()).unwrap();
		assert_eq!(decoded.name, "roads");
		assert_eq!(decoded.extent, 4096);
		assert_eq!(decoded.features.len(), 1);
		assert_eq!(decoded.keys, vec!["name".to_string()]);
	}

	#[test]
	fn intern_key_deduplicates() {
		let mut layer = MvtLayer::new("l".to_string(), 4096);
		let a = layer.intern_key("x");
		let b = layer.intern_key("x");
		assert_eq!(a, b);
		assert_eq!(layer.keys.len(), 1);
	}
}
