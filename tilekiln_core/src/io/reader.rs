use crate::Blob;
use anyhow::{Result, bail, ensure};
use byteorder::{LE, ReadBytesExt};

/// Reads varints, zigzag-encoded svarints and PBF-style keys from an
/// in-memory byte slice. Geometry streams, index entries and MVT layers all
/// go through this trait so the framing rules only need to be correct once.
pub trait ValueReader<'a> {
	fn get_slice(&self) -> &'a [u8];
	fn position(&self) -> usize;
	fn set_position(&mut self, position: usize);

	fn len(&self) -> usize {
		self.get_slice().len()
	}

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn remaining(&self) -> usize {
		self.len() - self.position()
	}

	fn has_remaining(&self) -> bool {
		self.remaining() > 0
	}

	fn read_u8(&mut self) -> Result<u8> {
		let pos = self.position();
		ensure!(pos < self.len(), "unexpected end of data reading u8");
		self.set_position(pos + 1);
		Ok(self.get_slice()[pos])
	}

	fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
		let pos = self.position();
		ensure!(pos + n <= self.len(), "unexpected end of data reading {n} bytes");
		self.set_position(pos + n);
		Ok(&self.get_slice()[pos..pos + n])
	}

	/// Reads a base-128 varint (protobuf / MVT encoding).
	fn read_varint(&mut self) -> Result<u64> {
		let mut value: u64 = 0;
		let mut shift = 0;
		loop {
			let byte = self.read_u8()?;
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("varint too long");
			}
		}
		Ok(value)
	}

	/// Reads a zigzag-encoded signed varint.
	fn read_svarint(&mut self) -> Result<i64> {
		let value = self.read_varint()?;
		Ok(((value >> 1) as i64) ^ -((value & 1) as i64))
	}

	fn read_u32_le(&mut self) -> Result<u32> {
		let mut slice = self.read_bytes(4)?;
		Ok(slice.read_u32::<LE>()?)
	}

	fn read_u64_le(&mut self) -> Result<u64> {
		let mut slice = self.read_bytes(8)?;
		Ok(slice.read_u64::<LE>()?)
	}

	fn read_f32(&mut self) -> Result<f32> {
		let mut slice = self.read_bytes(4)?;
		Ok(slice.read_f32::<LE>()?)
	}

	fn read_f64(&mut self) -> Result<f64> {
		let mut slice = self.read_bytes(8)?;
		Ok(slice.read_f64::<LE>()?)
	}

	fn read_string(&mut self, len: u64) -> Result<String> {
		let bytes = self.read_bytes(len as usize)?;
		Ok(String::from_utf8(bytes.to_vec())?)
	}

	/// Reads a PBF `(field_number, wire_type)` tag.
	fn read_pbf_key(&mut self) -> Result<(u32, u32)> {
		let value = self.read_varint()?;
		Ok(((value >> 3) as u32, (value & 0x07) as u32))
	}

	/// Reads a length-prefixed PBF blob (wire type 2).
	fn read_pbf_blob(&mut self) -> Result<Blob> {
		let len = self.read_varint()?;
		Ok(Blob::from(self.read_bytes(len as usize)?))
	}

	fn read_pbf_string(&mut self) -> Result<String> {
		let len = self.read_varint()?;
		self.read_string(len)
	}

	/// Returns a sub-reader scoped to the next length-prefixed PBF message.
	fn get_pbf_sub_reader(&mut self) -> Result<ValueReaderSlice<'a>> {
		let len = self.read_varint()?;
		let slice = self.read_bytes(len as usize)?;
		Ok(ValueReaderSlice::new(slice))
	}

	fn read_pbf_packed_uint32(&mut self) -> Result<Vec<u32>> {
		let len = self.read_varint()?;
		let end = self.position() + len as usize;
		let mut out = Vec::new();
		while self.position() < end {
			out.push(self.read_varint()? as u32);
		}
		Ok(out)
	}
}

/// A [`ValueReader`] backed by a borrowed byte slice.
#[derive(Clone, Copy)]
pub struct ValueReaderSlice<'a> {
	slice: &'a [u8],
	pos: usize,
}

impl<'a> ValueReaderSlice<'a> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a> {
		ValueReaderSlice { slice, pos: 0 }
	}
}

impl<'a> ValueReader<'a> for ValueReaderSlice<'a> {
	fn get_slice(&self) -> &'a [u8] {
		self.slice
	}

	fn position(&self) -> usize {
		self.pos
	}

	fn set_position(&mut self, position: usize) {
		self.pos = position;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn varint_roundtrip() {
		let mut reader = ValueReaderSlice::new(&[0x96, 0x01]);
		assert_eq!(reader.read_varint().unwrap(), 150);
	}

	#[test]
	fn svarint_zigzag() {
		// zigzag(-1) = 1, zigzag(1) = 2
		let mut reader = ValueReaderSlice::new(&[0x01]);
		assert_eq!(reader.read_svarint().unwrap(), -1);
		let mut reader = ValueReaderSlice::new(&[0x02]);
		assert_eq!(reader.read_svarint().unwrap(), 1);
	}

	#[test]
	fn pbf_key() {
		// field 3, wire type 2 -> (3 << 3) | 2 = 26
		let mut reader = ValueReaderSlice::new(&[26]);
		assert_eq!(reader.read_pbf_key().unwrap(), (3, 2));
	}

	#[test]
	fn read_past_end_fails() {
		let mut reader = ValueReaderSlice::new(&[]);
		assert!(reader.read_u8().is_err());
	}
}
