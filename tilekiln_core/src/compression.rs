//! zlib-compatible deflate framing for MVT output. The core only needs one
//! compression algorithm — whatever the sink ultimately stores it as is the
//! sink's problem, per the pipeline's external-collaborator boundary.

use crate::Blob;
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Compresses `blob` with zlib-framed deflate at the given level (0-9).
pub fn compress_deflate(blob: &Blob, level: u32) -> Result<Blob> {
	let mut encoder = ZlibEncoder::new(blob.as_slice(), Compression::new(level));
	let mut out = Vec::new();
	encoder
		.read_to_end(&mut out)
		.context("failed to deflate-compress tile data")?;
	Ok(Blob::from(out))
}

/// Decompresses a zlib-framed deflate blob.
pub fn decompress_deflate(blob: &Blob) -> Result<Blob> {
	let mut decoder = ZlibDecoder::new(blob.as_slice());
	let mut out = Vec::new();
	decoder
		.read_to_end(&mut out)
		.context("failed to inflate tile data")?;
	Ok(Blob::from(out))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip() {
		let data = Blob::from(b"the quick brown fox jumps over the lazy dog".repeat(50));
		let compressed = compress_deflate(&data, 6).unwrap();
		assert!(compressed.len() < data.len());
		let decompressed = decompress_deflate(&compressed).unwrap();
		assert_eq!(decompressed, data);
	}

	#[test]
	fn empty_blob() {
		let data = Blob::new_empty();
		let compressed = compress_deflate(&data, 6).unwrap();
		let decompressed = decompress_deflate(&compressed).unwrap();
		assert_eq!(decompressed, data);
	}
}
