//! Final feature ordering within a tile (§4.8 step 10): either the input's
//! original sequence is restored, features are sorted on one or more
//! `--order-by` attribute keys, or the order the drop/coalesce stage left
//! them in is kept as-is.

use tilekiln_mvt::MvtValue;

/// One `--order-by` sort key: which tag key to compare on, and whether the
/// comparison is descending.
#[derive(Clone, Debug)]
pub struct OrderKey {
	pub key_index: u32,
	pub descending: bool,
}

/// Which of the three mutually exclusive orderings governs a tile.
#[derive(Clone, Debug)]
pub enum OrderMode {
	/// Leaves the candidates in whatever order the coalesce/cluster stage
	/// produced them in.
	AsCoalesced,
	/// Restores the order features were spooled in, via their sequence
	/// numbers.
	PreserveInput,
	/// Sorts lexicographically on a list of attribute keys.
	ByKeys(Vec<OrderKey>),
}

/// Reorders `candidates` (indices into some parallel feature array) under
/// `mode`. `seq` gives each candidate's original spool sequence number;
/// `tag_lookup(candidate, key_index)` resolves a candidate's value for an
/// order-by key, if it has one.
pub fn order_features(candidates: &[usize], mode: &OrderMode, seq: &[u32], tag_lookup: impl Fn(usize, u32) -> Option<MvtValue>) -> Vec<usize> {
	let mut ordered = candidates.to_vec();
	match mode {
		OrderMode::AsCoalesced => {}
		OrderMode::PreserveInput => ordered.sort_by_key(|&c| seq[c]),
		OrderMode::ByKeys(keys) => ordered.sort_by(|&a, &b| {
			for key in keys {
				let va = tag_lookup(a, key.key_index);
				let vb = tag_lookup(b, key.key_index);
				let ord = compare_values(&va, &vb);
				let ord = if key.descending { ord.reverse() } else { ord };
				if ord != std::cmp::Ordering::Equal {
					return ord;
				}
			}
			std::cmp::Ordering::Equal
		}),
	}
	ordered
}

/// SQL-like ordering: absent/null sorts before every present value.
fn compare_values(a: &Option<MvtValue>, b: &Option<MvtValue>) -> std::cmp::Ordering {
	use std::cmp::Ordering;
	match (a, b) {
		(None, None) => Ordering::Equal,
		(None, Some(_)) => Ordering::Less,
		(Some(_), None) => Ordering::Greater,
		(Some(va), Some(vb)) => value_as_sort_key(va).partial_cmp(&value_as_sort_key(vb)).unwrap_or(Ordering::Equal).then_with(|| {
			if let (MvtValue::String(sa), MvtValue::String(sb)) = (va, vb) {
				sa.cmp(sb)
			} else {
				Ordering::Equal
			}
		}),
	}
}

fn value_as_sort_key(v: &MvtValue) -> f64 {
	match v {
		MvtValue::Double(d) => *d,
		MvtValue::Float(f) => f64::from(*f),
		MvtValue::Int(i) | MvtValue::SInt(i) => *i as f64,
		MvtValue::UInt(u) => *u as f64,
		MvtValue::Bool(b) => f64::from(u8::from(*b)),
		MvtValue::String(_) => 0.0,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preserve_input_restores_sequence_order() {
		let candidates = vec![2, 0, 1];
		let seq = vec![10, 20, 30];
		let ordered = order_features(&candidates, &OrderMode::PreserveInput, &seq, |_, _| None);
		assert_eq!(ordered, vec![0, 1, 2]);
	}

	#[test]
	fn as_coalesced_leaves_order_untouched() {
		let candidates = vec![2, 0, 1];
		let ordered = order_features(&candidates, &OrderMode::AsCoalesced, &[0, 0, 0], |_, _| None);
		assert_eq!(ordered, candidates);
	}

	#[test]
	fn by_keys_sorts_ascending_with_nulls_first() {
		let candidates = vec![0, 1, 2];
		let lookup = |c: usize, _k: u32| match c {
			0 => Some(MvtValue::Double(5.0)),
			1 => None,
			2 => Some(MvtValue::Double(1.0)),
			_ => None,
		};
		let mode = OrderMode::ByKeys(vec![OrderKey { key_index: 0, descending: false }]);
		let ordered = order_features(&candidates, &mode, &[0, 0, 0], lookup);
		assert_eq!(ordered, vec![1, 2, 0]);
	}
}
