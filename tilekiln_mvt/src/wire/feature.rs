use super::geom_type::MvtGeomType;
use super::geometry::{decode_geometry, encode_geometry};
use anyhow::{bail, Context, Result};
use tilekiln_core::io::{ValueReader, ValueWriter, ValueWriterBlob};
use tilekiln_geometry::Draw;

/// One feature within a [`super::MvtLayer`]: an optional id, a flat list of
/// `(key_index, value_index)` pairs into the layer's shared tag tables, a
/// geometry class and the encoded geometry command stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MvtFeature {
	pub id: Option<u64>,
	pub tags: Vec<u32>,
	pub geom_type: MvtGeomType,
	pub geometry: Vec<Draw>,
}

impl MvtFeature {
	pub fn read(reader: &mut dyn ValueReader<'_>) -> Result<MvtFeature> {
		let mut f = MvtFeature::default();
		let mut raw_commands: Vec<u32> = Vec::new();
		while reader.has_remaining() {
			match reader.read_pbf_key().context("reading MVT feature key")? {
				(1, 0) => f.id = Some(reader.read_varint().context("reading feature id")?),
				(2, 2) => f.tags = reader.read_pbf_packed_uint32().context("reading feature tags")?,
				(3, 0) => f.geom_type = MvtGeomType::from(reader.read_varint().context("reading geom type")?),
				(4, 2) => raw_commands = reader.read_pbf_packed_uint32().context("reading geometry commands")?,
				(f, w) => bail!("unexpected MVT feature field {f} wire type {w}"),
			}
		}
		f.geometry = decode_geometry(&raw_commands);
		Ok(f)
	}

	pub fn to_blob(&self) -> Result<tilekiln_core::Blob> {
		let mut writer = ValueWriterBlob::new();
		if let Some(id) = self.id {
			writer.write_pbf_key(1, 0)?;
			writer.write_varint(id)?;
		}
		if !self.tags.is_empty() {
			writer.write_pbf_key(2, 2)?;
			writer.write_pbf_packed_uint32(&self.tags)?;
		}
		writer.write_pbf_key(3, 0)?;
		writer.write_varint(self.geom_type.as_u64())?;

		let commands = encode_geometry(&self.geometry);
		if !commands.is_empty() {
			writer.write_pbf_key(4, 2)?;
			writer.write_pbf_packed_uint32(&commands)?;
		}
		Ok(writer.into_blob())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tilekiln_core::io::ValueReaderSlice;

	#[test]
	fn feature_roundtrips() {
		let f = MvtFeature {
			id: Some(7),
			tags: vec![0, 0, 1, 1],
			geom_type: MvtGeomType::LineString,
			geometry: vec![Draw::move_to(0, 0), Draw::line_to(10, 10)],
		};
		let blob = f.to_blob().unwrap();
		let mut reader = ValueReaderSlice::new(blob.as_slice());
		let decoded = MvtFeature::read(&mut reader).unwrap();
		assert_eq!(decoded, f);
	}

	#[test]
	fn feature_without_id_omits_the_field() {
		let f = MvtFeature { id: None, tags: vec![], geom_type: MvtGeomType::Point, geometry: vec![Draw::move_to(1, 1)] };
		let blob = f.to_blob().unwrap();
		let mut reader = ValueReaderSlice::new(blob.as_slice());
		let decoded = MvtFeature::read(&mut reader).unwrap();
		assert_eq!(decoded.id, None);
	}
}
