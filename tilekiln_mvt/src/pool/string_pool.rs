use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

/// Assigns stable `u32` ids to distinct strings (attribute keys and values),
/// deduplicating against a recently-seen window in memory and spilling the
/// full id→string table to a temp file once that window is flushed, rather
/// than keeping every distinct string resident for the life of a large
/// ingest. Perfect cross-flush dedup is not attempted — a string seen again
/// long after its window was flushed gets a fresh id — trading a few
/// duplicate dictionary entries in the output tile for bounded memory,
/// consistent with the source's willingness to spill intermediate state to
/// disk rather than hold it all in the heap (`sort.cpp`'s external merge).
pub struct StringPool {
	recent: HashMap<String, u32>,
	next_id: u32,
	memory_used: usize,
	memory_budget: usize,
	spill: NamedTempFile,
}

impl StringPool {
	pub fn new(memory_budget: usize) -> Result<StringPool> {
		let spill = NamedTempFile::new().context("creating string pool spill file")?;
		Ok(StringPool { recent: HashMap::new(), next_id: 0, memory_used: 0, memory_budget, spill })
	}

	/// Interns `s`, returning its id. Ids are assigned in increasing order
	/// of first appearance (after the last flush), `0`-based.
	pub fn intern(&mut self, s: &str) -> Result<u32> {
		if let Some(&id) = self.recent.get(s) {
			return Ok(id);
		}
		let id = self.next_id;
		self.next_id += 1;
		self.append_spill_record(id, s)?;

		self.memory_used += s.len() + std::mem::size_of::<u32>();
		self.recent.insert(s.to_string(), id);
		if self.memory_used > self.memory_budget {
			self.recent.clear();
			self.memory_used = 0;
		}
		Ok(id)
	}

	fn append_spill_record(&mut self, id: u32, s: &str) -> Result<()> {
		let bytes = s.as_bytes();
		self.spill.write_all(&id.to_le_bytes()).context("writing spill id")?;
		self.spill.write_all(&(bytes.len() as u32).to_le_bytes()).context("writing spill length")?;
		self.spill.write_all(bytes).context("writing spill bytes")?;
		Ok(())
	}

	/// Reads the full spill file back and returns the id→string table as a
	/// dense vector indexed by id, for final tile assembly once ingest has
	/// finished interning.
	pub fn resolve_all(&mut self) -> Result<Vec<String>> {
		self.spill.flush().context("flushing string pool spill file")?;
		let mut file = self.spill.reopen().context("reopening string pool spill file")?;
		file.seek(SeekFrom::Start(0)).context("seeking string pool spill file")?;
		let mut reader = BufReader::new(file);

		let mut out: Vec<Option<String>> = vec![None; self.next_id as usize];
		let mut id_buf = [0u8; 4];
		let mut len_buf = [0u8; 4];
		loop {
			if reader.read_exact(&mut id_buf).is_err() {
				break;
			}
			reader.read_exact(&mut len_buf).context("reading spill record length")?;
			let id = u32::from_le_bytes(id_buf);
			let len = u32::from_le_bytes(len_buf) as usize;
			let mut buf = vec![0u8; len];
			reader.read_exact(&mut buf).context("reading spill record bytes")?;
			let s = String::from_utf8(buf).context("spill record was not valid UTF-8")?;
			if (id as usize) < out.len() {
				out[id as usize] = Some(s);
			}
		}
		out.into_iter()
			.enumerate()
			.map(|(i, v)| v.with_context(|| format!("string pool id {i} was never spilled")))
			.collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.next_id as usize
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.next_id == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn repeated_string_gets_same_id_within_window() {
		let mut pool = StringPool::new(1 << 20).unwrap();
		let a = pool.intern("highway").unwrap();
		let b = pool.intern("highway").unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn distinct_strings_get_distinct_ids() {
		let mut pool = StringPool::new(1 << 20).unwrap();
		let a = pool.intern("foo").unwrap();
		let b = pool.intern("bar").unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn resolve_all_recovers_every_interned_string() {
		let mut pool = StringPool::new(1 << 20).unwrap();
		let names = ["alpha", "beta", "gamma", "alpha"];
		let ids: Vec<u32> = names.iter().map(|n| pool.intern(n).unwrap()).collect();
		let table = pool.resolve_all().unwrap();
		assert_eq!(table[ids[0] as usize], "alpha");
		assert_eq!(table[ids[1] as usize], "beta");
		assert_eq!(table[ids[2] as usize], "gamma");
		assert_eq!(ids[0], ids[3]);
	}

	#[test]
	fn tiny_budget_still_resolves_every_id_after_flush() {
		let mut pool = StringPool::new(1).unwrap();
		let a = pool.intern("x").unwrap();
		let b = pool.intern("y").unwrap();
		assert_ne!(a, b);
		let table = pool.resolve_all().unwrap();
		assert_eq!(table[a as usize], "x");
		assert_eq!(table[b as usize], "y");
	}
}
