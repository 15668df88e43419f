use crate::drawvec::Draw;
use std::collections::HashSet;

/// Tracks vertex coordinates that are shared by more than one input feature
/// (adjoining administrative boundaries, shared street segments) so that
/// independent per-feature simplification never introduces a gap or sliver
/// between them — each such vertex is marked `necessary` for every feature
/// that touches it.
#[derive(Default)]
pub struct SharedNodeSet {
	seen_once: HashSet<(i64, i64)>,
	shared: HashSet<(i64, i64)>,
}

impl SharedNodeSet {
	#[must_use]
	pub fn new() -> SharedNodeSet {
		SharedNodeSet::default()
	}

	/// Records every vertex of `geom` as having been seen; the second time a
	/// coordinate is observed (from a different feature) it is promoted to
	/// "shared".
	pub fn observe(&mut self, geom: &[Draw]) {
		for d in geom {
			let key = (d.x, d.y);
			if !self.seen_once.insert(key) {
				self.shared.insert(key);
			}
		}
	}

	#[must_use]
	pub fn is_shared(&self, x: i64, y: i64) -> bool {
		self.shared.contains(&(x, y))
	}

	/// Marks every vertex of `geom` that is in the shared set as
	/// `necessary`, protecting it from simplification.
	#[must_use]
	pub fn mark_necessary(&self, geom: Vec<Draw>) -> Vec<Draw> {
		geom.into_iter()
			.map(|d| if self.is_shared(d.x, d.y) { d.necessary() } else { d })
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vertex_seen_twice_becomes_shared() {
		let mut set = SharedNodeSet::new();
		let a = vec![Draw::move_to(0, 0), Draw::line_to(10, 10)];
		let b = vec![Draw::move_to(10, 10), Draw::line_to(20, 20)];
		set.observe(&a);
		assert!(!set.is_shared(10, 10));
		set.observe(&b);
		assert!(set.is_shared(10, 10));
		assert!(!set.is_shared(0, 0));
	}

	#[test]
	fn mark_necessary_protects_shared_vertices_only() {
		let mut set = SharedNodeSet::new();
		set.observe(&[Draw::move_to(5, 5)]);
		set.observe(&[Draw::move_to(5, 5)]);
		let geom = vec![Draw::move_to(5, 5), Draw::line_to(6, 6)];
		let marked = set.mark_necessary(geom);
		assert!(marked[0].necessary);
		assert!(!marked[1].necessary);
	}
}
