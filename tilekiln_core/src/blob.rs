//! A simple wrapper around [`Vec<u8>`] that provides additional methods for
//! working with byte data, mirroring the ergonomics callers expect from a
//! length-prefixed buffer without pulling in `bytes::Bytes`.

use std::fmt::Debug;
use std::ops::Range;

/// Owned byte buffer, cheap to pass around by value-on-move.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Blob(Vec<u8>);

impl Blob {
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	#[must_use]
	pub fn as_mut_vec(&mut self) -> &mut Vec<u8> {
		&mut self.0
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	#[must_use]
	pub fn range(&self, range: Range<usize>) -> &[u8] {
		&self.0[range]
	}
}

impl From<Vec<u8>> for Blob {
	fn from(v: Vec<u8>) -> Blob {
		Blob(v)
	}
}

impl From<&[u8]> for Blob {
	fn from(v: &[u8]) -> Blob {
		Blob(v.to_vec())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Blob").field(&self.0.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip() {
		let blob = Blob::from(vec![1u8, 2, 3]);
		assert_eq!(blob.len(), 3);
		assert_eq!(blob.range(1..3), &[2, 3]);
		assert_eq!(blob.into_vec(), vec![1, 2, 3]);
	}
}
