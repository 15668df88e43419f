//! Once-per-kind warning gate for per-feature policy violations (§7:
//! "attribute not found for comparison, mismatched types, non-numeric id →
//! warn once per kind, continue"). These are not fatal: a run with a
//! thousand features missing the same attribute should produce one log
//! line, not a thousand.

use std::sync::atomic::{AtomicBool, Ordering};

/// Which class of per-feature policy violation fired. New kinds are added
/// here as the expression evaluator and ingest path grow more of §7's
/// named violation categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarnKind {
	AttributeNotFoundForComparison,
	MismatchedComparisonType,
	NonNumericId,
}

/// One flag per [`WarnKind`], each fired at most once over the gate's
/// lifetime. Shared (by reference or `Arc`) across every worker touching
/// the same run so the "once" is run-wide, not per-thread.
#[derive(Default)]
pub struct WarnOnce {
	attribute_not_found: AtomicBool,
	mismatched_type: AtomicBool,
	non_numeric_id: AtomicBool,
}

impl WarnOnce {
	#[must_use]
	pub fn new() -> WarnOnce {
		WarnOnce::default()
	}

	/// Logs `detail` at `warn` level the first time `kind` fires; every
	/// later call with the same `kind` is a silent no-op.
	pub fn warn(&self, kind: WarnKind, detail: &str) {
		let flag = match kind {
			WarnKind::AttributeNotFoundForComparison => &self.attribute_not_found,
			WarnKind::MismatchedComparisonType => &self.mismatched_type,
			WarnKind::NonNumericId => &self.non_numeric_id,
		};
		if !flag.swap(true, Ordering::Relaxed) {
			log::warn!("{detail}");
		}
	}
}
