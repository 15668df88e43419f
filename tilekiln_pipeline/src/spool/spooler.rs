//! Per-ingest-thread spooling (§4.7): one geometry file, one index vector
//! and one string pool per thread, appended to as features arrive.

use super::index::IndexEntry;
use anyhow::{Context, Result};
use std::io::Write;
use tempfile::NamedTempFile;
use tilekiln_mvt::{SerialFeature, StringPool};

/// Owns one ingest thread's geometry stream and index. The geometry file is
/// varint-length-prefixed [`SerialFeature`] records (§6); the index grows
/// one [`IndexEntry`] per record.
pub struct FeatureSpooler {
	thread_id: u16,
	geometry_file: NamedTempFile,
	offset: u64,
	index: Vec<IndexEntry>,
	pub string_pool: StringPool,
}

impl FeatureSpooler {
	pub fn new(thread_id: u16, string_pool_memory_budget: usize) -> Result<FeatureSpooler> {
		Ok(FeatureSpooler {
			thread_id,
			geometry_file: NamedTempFile::new().context("creating spooler geometry file")?,
			offset: 0,
			index: Vec::new(),
			string_pool: StringPool::new(string_pool_memory_budget)?,
		})
	}

	/// Appends one feature's encoded record, recording its byte range and
	/// an index entry keyed by `spatial_ix`.
	pub fn append(&mut self, feature: &SerialFeature, spatial_ix: u64, seq: u32) -> Result<()> {
		let body = feature.encode().context("encoding serial feature")?;
		let mut framed = Vec::with_capacity(body.len() + 5);
		write_varint(&mut framed, body.len() as u64);
		framed.extend_from_slice(&body);

		self.geometry_file.write_all(&framed).context("writing spooled feature")?;
		let start = self.offset;
		self.offset += framed.len() as u64;

		self.index.push(IndexEntry {
			file_off_start: start,
			file_off_end: self.offset,
			spatial_ix,
			seq,
			thread: self.thread_id,
			geom_type: feature.geom_type as u8,
		});
		Ok(())
	}

	#[must_use]
	pub fn index(&self) -> &[IndexEntry] {
		&self.index
	}

	/// Reads back the exact byte range an [`IndexEntry`] points to and
	/// decodes it, skipping the length prefix.
	pub fn read_feature(&self, entry: &IndexEntry) -> Result<SerialFeature> {
		use std::io::{Read, Seek, SeekFrom};
		let mut file = self.geometry_file.reopen().context("reopening geometry file for read")?;
		file.seek(SeekFrom::Start(entry.file_off_start)).context("seeking geometry file")?;
		let total_len = (entry.file_off_end - entry.file_off_start) as usize;
		let mut buf = vec![0u8; total_len];
		file.read_exact(&mut buf).context("reading spooled feature range")?;

		let (len, header_len) = read_varint(&buf)?;
		let body = &buf[header_len..header_len + len as usize];
		SerialFeature::decode(body)
	}
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
	loop {
		let mut byte = (value & 0x7F) as u8;
		value >>= 7;
		if value != 0 {
			byte |= 0x80;
		}
		out.push(byte);
		if value == 0 {
			break;
		}
	}
}

fn read_varint(buf: &[u8]) -> Result<(u64, usize)> {
	let mut value = 0u64;
	let mut shift = 0;
	for (i, &byte) in buf.iter().enumerate() {
		value |= (u64::from(byte) & 0x7F) << shift;
		if byte & 0x80 == 0 {
			return Ok((value, i + 1));
		}
		shift += 7;
	}
	anyhow::bail!("truncated varint in spooled record")
}

#[cfg(test)]
mod tests {
	use super::*;
	use tilekiln_geometry::Draw;
	use tilekiln_mvt::SerialGeomType;

	fn sample_feature() -> SerialFeature {
		let geometry = vec![Draw::move_to(10, 20)];
		SerialFeature {
			id: Some(1),
			geom_type: SerialGeomType::Point,
			bbox: SerialFeature::bbox_of(&geometry),
			geometry,
			extent: 1.0,
			tags: vec![(0, 0)],
			minzoom: 3,
			tippecanoe_minzoom: None,
			tippecanoe_maxzoom: None,
		}
	}

	#[test]
	fn appended_feature_reads_back_identical() {
		let mut spooler = FeatureSpooler::new(0, 1 << 16).unwrap();
		let f = sample_feature();
		spooler.append(&f, 42, 0).unwrap();
		let entry = spooler.index()[0];
		let back = spooler.read_feature(&entry).unwrap();
		assert_eq!(back, f);
	}

	#[test]
	fn multiple_appends_keep_disjoint_ranges() {
		let mut spooler = FeatureSpooler::new(0, 1 << 16).unwrap();
		for i in 0..5u32 {
			spooler.append(&sample_feature(), u64::from(i), i).unwrap();
		}
		let idx = spooler.index();
		for w in idx.windows(2) {
			assert!(w[0].file_off_end <= w[1].file_off_start);
		}
		for entry in idx {
			assert_eq!(spooler.read_feature(entry).unwrap(), sample_feature());
		}
	}
}
