use anyhow::{bail, Context, Result};
use tilekiln_core::io::{ValueReader, ValueWriter, ValueWriterBlob};

/// The MVT attribute value union (vector_tile.proto's `Value` message).
#[derive(Clone, Debug, PartialEq)]
pub enum MvtValue {
	String(String),
	Float(f32),
	Double(f64),
	Int(i64),
	UInt(u64),
	SInt(i64),
	Bool(bool),
}

impl MvtValue {
	pub fn read(reader: &mut dyn ValueReader<'_>) -> Result<MvtValue> {
		let mut value = None;
		while reader.has_remaining() {
			value = Some(match reader.read_pbf_key().context("reading MVT value key")? {
				(1, 2) => MvtValue::String(reader.read_pbf_string().context("reading string value")?),
				(2, 5) => MvtValue::Float(reader.read_f32().context("reading float value")?),
				(3, 1) => MvtValue::Double(reader.read_f64().context("reading double value")?),
				(4, 0) => MvtValue::Int(reader.read_varint().context("reading int value")? as i64),
				(5, 0) => MvtValue::UInt(reader.read_varint().context("reading uint value")?),
				(6, 0) => MvtValue::SInt(reader.read_svarint().context("reading sint value")?),
				(7, 0) => MvtValue::Bool(reader.read_varint().context("reading bool value")? != 0),
				(f, w) => bail!("unexpected MVT value field {f} wire type {w}"),
			});
		}
		value.context("MVT value message had no fields")
	}

	pub fn to_blob(&self) -> Result<tilekiln_core::Blob> {
		let mut writer = ValueWriterBlob::new();
		match self {
			MvtValue::String(s) => {
				writer.write_pbf_key(1, 2)?;
				writer.write_pbf_string(s)?;
			}
			MvtValue::Float(v) => {
				writer.write_pbf_key(2, 5)?;
				writer.write_f32(*v)?;
			}
			MvtValue::Double(v) => {
				writer.write_pbf_key(3, 1)?;
				writer.write_f64(*v)?;
			}
			MvtValue::Int(v) => {
				writer.write_pbf_key(4, 0)?;
				writer.write_varint(*v as u64)?;
			}
			MvtValue::UInt(v) => {
				writer.write_pbf_key(5, 0)?;
				writer.write_varint(*v)?;
			}
			MvtValue::SInt(v) => {
				writer.write_pbf_key(6, 0)?;
				writer.write_svarint(*v)?;
			}
			MvtValue::Bool(v) => {
				writer.write_pbf_key(7, 0)?;
				writer.write_varint(u64::from(*v))?;
			}
		}
		Ok(writer.into_blob())
	}
}
