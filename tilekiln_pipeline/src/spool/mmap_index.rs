//! Memory-mapped view of a sorted index stream (§3: "The full index array
//! is memory-mapped and sorted by `spatial_ix` then `seq`"): once
//! [`sort_index_entries`](super::sort::sort_index_entries) has produced the
//! final order, a caller driving many zoom passes over the same ingest can
//! avoid re-reading the whole array into the heap by mapping it once and
//! indexing into the mapping directly.

use super::index::{IndexEntry, INDEX_ENTRY_SIZE};
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::io::Write;
use tempfile::NamedTempFile;

/// A sorted index array backed by a memory-mapped temp file rather than a
/// `Vec<IndexEntry>`, so its pages can be paged out under memory pressure
/// instead of pinning the whole array resident.
pub struct MmappedIndex {
	mmap: Mmap,
}

impl MmappedIndex {
	/// Writes `entries` (assumed already sorted by [`IndexEntry::sort_key`])
	/// to a temp file and maps it read-only.
	pub fn build(entries: &[IndexEntry]) -> Result<MmappedIndex> {
		let mut file = NamedTempFile::new().context("creating mmapped index file")?;
		for e in entries {
			file.write_all(&e.to_bytes()).context("writing index entry to mmap-backed file")?;
		}
		file.flush().context("flushing mmap-backed index file")?;
		let file = file.reopen().context("reopening mmap-backed index file")?;
		// Safety: the temp file is exclusively owned by this process and not
		// truncated or written to again after this point.
		let mmap = unsafe { Mmap::map(&file) }.context("memory-mapping sorted index file")?;
		Ok(MmappedIndex { mmap })
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.mmap.len() / INDEX_ENTRY_SIZE
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Decodes the entry at `i`, panicking on an out-of-range index like a
	/// slice index would.
	#[must_use]
	pub fn get(&self, i: usize) -> IndexEntry {
		let start = i * INDEX_ENTRY_SIZE;
		let bytes: &[u8; INDEX_ENTRY_SIZE] = self.mmap[start..start + INDEX_ENTRY_SIZE].try_into().expect("slice has exactly INDEX_ENTRY_SIZE bytes");
		IndexEntry::from_bytes(bytes)
	}

	pub fn iter(&self) -> impl Iterator<Item = IndexEntry> + '_ {
		(0..self.len()).map(move |i| self.get(i))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(spatial_ix: u64, seq: u32) -> IndexEntry {
		IndexEntry { file_off_start: 0, file_off_end: 10, spatial_ix, seq, thread: 0, geom_type: 0 }
	}

	#[test]
	fn mapped_entries_read_back_identical_and_in_order() {
		let entries = vec![entry(1, 0), entry(2, 0), entry(3, 0)];
		let mapped = MmappedIndex::build(&entries).unwrap();
		assert_eq!(mapped.len(), 3);
		let back: Vec<IndexEntry> = mapped.iter().collect();
		assert_eq!(back, entries);
	}

	#[test]
	fn empty_input_maps_to_an_empty_index() {
		let mapped = MmappedIndex::build(&[]).unwrap();
		assert!(mapped.is_empty());
		assert_eq!(mapped.len(), 0);
	}

	#[test]
	fn get_matches_iter_at_every_position() {
		let entries: Vec<IndexEntry> = (0..50).map(|i| entry(i, i as u32)).collect();
		let mapped = MmappedIndex::build(&entries).unwrap();
		for (i, e) in entries.iter().enumerate() {
			assert_eq!(mapped.get(i), *e);
		}
	}
}
