//! Attribute accumulation (§4.8 step 7): when a feature is coalesced onto a
//! kept neighbor rather than dropped outright, its attributes are folded
//! into the survivor's according to the per-attribute [`AccumulateOp`].

use crate::context::AccumulateOp;
use tilekiln_mvt::MvtValue;

/// Running mean for `AccumulateOp::Mean` (§4.8 step 7): a pairwise fold
/// can't recover the true mean once more than two values land on one key,
/// so the `(sum, count)` pair is carried alongside the attribute for the
/// life of the fold and only divided when the value is read out.
#[derive(Clone, Copy, Debug)]
pub struct MeanState {
	sum: f64,
	count: u32,
}

impl MeanState {
	#[must_use]
	pub fn seeded(base: &MvtValue) -> MeanState {
		MeanState { sum: as_f64(base), count: 1 }
	}

	pub fn fold(&mut self, incoming: &MvtValue) -> MvtValue {
		self.sum += as_f64(incoming);
		self.count += 1;
		MvtValue::Double(self.sum / f64::from(self.count))
	}
}

/// Folds `incoming` onto `base` under `op`, returning the new accumulated
/// value. Numeric ops coerce non-numeric operands to `0.0` rather than
/// failing, since a coalesce pass must never abort a tile.
///
/// `AccumulateOp::Mean` here only has `base` and `incoming` to go on, so it
/// folds as if `base` were the only prior sample; a caller accumulating more
/// than one value onto a key must instead keep a [`MeanState`] across folds
/// (as [`super::worker`] and the overzoom joiner do) rather than call this
/// repeatedly, or the result degrades to a pairwise average.
#[must_use]
pub fn accumulate_value(op: AccumulateOp, base: &MvtValue, incoming: &MvtValue) -> MvtValue {
	match op {
		AccumulateOp::Sum => numeric_op(base, incoming, |a, b| a + b),
		AccumulateOp::Product => numeric_op(base, incoming, |a, b| a * b),
		AccumulateOp::Min => numeric_op(base, incoming, f64::min),
		AccumulateOp::Max => numeric_op(base, incoming, f64::max),
		AccumulateOp::Mean => MeanState::seeded(base).fold(incoming),
		AccumulateOp::Concat => MvtValue::String(format!("{}{}", as_string(base), as_string(incoming))),
		AccumulateOp::Comma => {
			let a = as_string(base);
			let b = as_string(incoming);
			if a.split(',').any(|part| part == b) {
				MvtValue::String(a)
			} else {
				MvtValue::String(format!("{a},{b}"))
			}
		}
	}
}

fn numeric_op(base: &MvtValue, incoming: &MvtValue, f: impl Fn(f64, f64) -> f64) -> MvtValue {
	MvtValue::Double(f(as_f64(base), as_f64(incoming)))
}

pub(crate) fn as_f64(v: &MvtValue) -> f64 {
	match v {
		MvtValue::Double(d) => *d,
		MvtValue::Float(f) => f64::from(*f),
		MvtValue::Int(i) | MvtValue::SInt(i) => *i as f64,
		MvtValue::UInt(u) => *u as f64,
		MvtValue::Bool(b) => f64::from(u8::from(*b)),
		MvtValue::String(s) => s.parse().unwrap_or(0.0),
	}
}

fn as_string(v: &MvtValue) -> String {
	match v {
		MvtValue::String(s) => s.clone(),
		MvtValue::Double(d) => d.to_string(),
		MvtValue::Float(f) => f.to_string(),
		MvtValue::Int(i) | MvtValue::SInt(i) => i.to_string(),
		MvtValue::UInt(u) => u.to_string(),
		MvtValue::Bool(b) => b.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sum_adds_numeric_values() {
		let r = accumulate_value(AccumulateOp::Sum, &MvtValue::Double(2.0), &MvtValue::Int(3));
		assert_eq!(r, MvtValue::Double(5.0));
	}

	#[test]
	fn max_picks_larger_value() {
		let r = accumulate_value(AccumulateOp::Max, &MvtValue::Double(2.0), &MvtValue::Double(9.0));
		assert_eq!(r, MvtValue::Double(9.0));
	}

	#[test]
	fn concat_joins_strings() {
		let r = accumulate_value(AccumulateOp::Concat, &MvtValue::String("a".into()), &MvtValue::String("b".into()));
		assert_eq!(r, MvtValue::String("ab".into()));
	}

	#[test]
	fn comma_avoids_duplicate_members() {
		let base = MvtValue::String("red,blue".into());
		let r = accumulate_value(AccumulateOp::Comma, &base, &MvtValue::String("red".into()));
		assert_eq!(r, MvtValue::String("red,blue".into()));
		let r2 = accumulate_value(AccumulateOp::Comma, &base, &MvtValue::String("green".into()));
		assert_eq!(r2, MvtValue::String("red,blue,green".into()));
	}

	#[test]
	fn mean_state_keeps_the_true_mean_across_three_or_more_folds() {
		let mut state = MeanState::seeded(&MvtValue::Double(10.0));
		state.fold(&MvtValue::Double(20.0));
		let r = state.fold(&MvtValue::Double(30.0));
		assert_eq!(r, MvtValue::Double(20.0));
	}

	#[test]
	fn mean_accumulate_value_matches_a_single_pairwise_fold() {
		let r = accumulate_value(AccumulateOp::Mean, &MvtValue::Double(10.0), &MvtValue::Double(20.0));
		assert_eq!(r, MvtValue::Double(15.0));
	}
}
