use super::layer::MvtLayer;
use anyhow::{bail, Context, Result};
use tilekiln_core::io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob};

/// A full MVT tile: an ordered list of layers, each independently PBF
/// length-delimited (field 3, wire type 2, repeated) per the top-level
/// `vector_tile.proto` message.
#[derive(Debug, Default, PartialEq)]
pub struct MvtTile {
	pub layers: Vec<MvtLayer>,
}

impl MvtTile {
	#[must_use]
	pub fn new() -> MvtTile {
		MvtTile::default()
	}

	pub fn from_bytes(data: &[u8]) -> Result<MvtTile> {
		let mut reader = ValueReaderSlice::new(data);
		let mut tile = MvtTile::default();
		while reader.has_remaining() {
			match reader.read_pbf_key().context("reading MVT tile key")? {
				(3, 2) => {
					let mut sub = reader.get_pbf_sub_reader().context("reading layer sub-message")?;
					tile.layers.push(MvtLayer::read(&mut sub)?);
				}
				(f, w) => bail!("unexpected MVT tile field {f} wire type {w}"),
			}
		}
		Ok(tile)
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		let mut writer = ValueWriterBlob::new();
		for layer in &self.layers {
			writer.write_pbf_key(3, 2)?;
			writer.write_pbf_blob(&layer.to_blob()?)?;
		}
		Ok(writer.into_blob().into_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_tile_roundtrips() {
		let tile = MvtTile::new();
		let bytes = tile.to_bytes().unwrap();
		assert!(bytes.is_empty());
		assert_eq!(MvtTile::from_bytes(&bytes).unwrap(), tile);
	}

	#[test]
	fn tile_with_layer_roundtrips() {
		let mut tile = MvtTile::new();
		tile.layers.push(MvtLayer::new("water".to_string(), 4096));
		let bytes = tile.to_bytes().unwrap();
		let decoded = MvtTile::from_bytes(&bytes).unwrap();
		assert_eq!(decoded.layers.len(), 1);
		assert_eq!(decoded.layers[0].name, "water");
	}
}
