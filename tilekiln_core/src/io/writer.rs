use crate::Blob;
use anyhow::Result;
use byteorder::{LE, WriteBytesExt};

/// Mirror-image of [`super::ValueReader`]: writes varints, zigzag svarints
/// and PBF keys to a growable buffer.
pub trait ValueWriter {
	fn get_buffer(&mut self) -> &mut Vec<u8>;

	fn write_u8(&mut self, v: u8) -> Result<()> {
		self.get_buffer().push(v);
		Ok(())
	}

	fn write_varint(&mut self, mut value: u64) -> Result<()> {
		loop {
			let mut byte = (value & 0x7F) as u8;
			value >>= 7;
			if value != 0 {
				byte |= 0x80;
			}
			self.write_u8(byte)?;
			if value == 0 {
				break;
			}
		}
		Ok(())
	}

	fn write_svarint(&mut self, value: i64) -> Result<()> {
		let zigzag = ((value << 1) ^ (value >> 63)) as u64;
		self.write_varint(zigzag)
	}

	fn write_f32(&mut self, v: f32) -> Result<()> {
		self.get_buffer().write_f32::<LE>(v)?;
		Ok(())
	}

	fn write_f64(&mut self, v: f64) -> Result<()> {
		self.get_buffer().write_f64::<LE>(v)?;
		Ok(())
	}

	fn write_u32_le(&mut self, v: u32) -> Result<()> {
		self.get_buffer().write_u32::<LE>(v)?;
		Ok(())
	}

	fn write_u64_le(&mut self, v: u64) -> Result<()> {
		self.get_buffer().write_u64::<LE>(v)?;
		Ok(())
	}

	fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
		self.get_buffer().extend_from_slice(bytes);
		Ok(())
	}

	/// Writes a PBF `(field_number, wire_type)` tag.
	fn write_pbf_key(&mut self, field: u32, wire_type: u32) -> Result<()> {
		self.write_varint(((field as u64) << 3) | (wire_type as u64))
	}

	fn write_pbf_string(&mut self, s: &str) -> Result<()> {
		self.write_varint(s.len() as u64)?;
		self.write_bytes(s.as_bytes())
	}

	fn write_pbf_blob(&mut self, blob: &Blob) -> Result<()> {
		self.write_varint(blob.len() as u64)?;
		self.write_bytes(blob.as_slice())
	}

	fn write_pbf_packed_uint32(&mut self, values: &[u32]) -> Result<()> {
		let mut inner = ValueWriterBlob::new();
		for v in values {
			inner.write_varint(u64::from(*v))?;
		}
		self.write_pbf_blob(&inner.into_blob())
	}
}

/// A [`ValueWriter`] that accumulates into an owned buffer.
#[derive(Default)]
pub struct ValueWriterBlob {
	buffer: Vec<u8>,
}

impl ValueWriterBlob {
	#[must_use]
	pub fn new() -> ValueWriterBlob {
		ValueWriterBlob::default()
	}

	#[must_use]
	pub fn into_blob(self) -> Blob {
		Blob::from(self.buffer)
	}
}

impl ValueWriter for ValueWriterBlob {
	fn get_buffer(&mut self) -> &mut Vec<u8> {
		&mut self.buffer
	}
}

#[cfg(test)]
mod tests {
	use super::super::ValueReader;
	use super::super::ValueReaderSlice;
	use super::*;

	#[test]
	fn varint_roundtrip() {
		for v in [0u64, 1, 127, 128, 300, u64::MAX / 2] {
			let mut w = ValueWriterBlob::new();
			w.write_varint(v).unwrap();
			let blob = w.into_blob();
			let mut r = ValueReaderSlice::new(blob.as_slice());
			assert_eq!(r.read_varint().unwrap(), v);
		}
	}

	#[test]
	fn svarint_roundtrip() {
		for v in [0i64, 1, -1, 1000, -1000, i64::MIN / 2] {
			let mut w = ValueWriterBlob::new();
			w.write_svarint(v).unwrap();
			let blob = w.into_blob();
			let mut r = ValueReaderSlice::new(blob.as_slice());
			assert_eq!(r.read_svarint().unwrap(), v);
		}
	}

	#[test]
	fn pbf_key_roundtrip() {
		let mut w = ValueWriterBlob::new();
		w.write_pbf_key(15, 2).unwrap();
		let blob = w.into_blob();
		let mut r = ValueReaderSlice::new(blob.as_slice());
		assert_eq!(r.read_pbf_key().unwrap(), (15, 2));
	}
}
