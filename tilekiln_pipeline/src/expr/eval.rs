//! Three-valued (SQL-like) evaluation of an [`Expr`] tree over a feature's
//! attributes (§4.8 step 3, §9: "preserve the SQL-null semantics").

use super::ast::Expr;
use super::value::{AttrValue, Literal};
use crate::warnings::{WarnKind, WarnOnce};
use tilekiln_mvt::MvtValue;

/// SQL three-valued logic: `Null` means "unknown", distinct from `False`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tri {
	True,
	False,
	Null,
}

impl Tri {
	#[must_use]
	fn from_bool(b: bool) -> Tri {
		if b {
			Tri::True
		} else {
			Tri::False
		}
	}

	fn from_option(o: Option<bool>) -> Tri {
		match o {
			Some(b) => Tri::from_bool(b),
			None => Tri::Null,
		}
	}

	fn not(self) -> Tri {
		match self {
			Tri::True => Tri::False,
			Tri::False => Tri::True,
			Tri::Null => Tri::Null,
		}
	}

	fn and(self, other: Tri) -> Tri {
		match (self, other) {
			(Tri::False, _) | (_, Tri::False) => Tri::False,
			(Tri::True, Tri::True) => Tri::True,
			_ => Tri::Null,
		}
	}

	fn or(self, other: Tri) -> Tri {
		match (self, other) {
			(Tri::True, _) | (_, Tri::True) => Tri::True,
			(Tri::False, Tri::False) => Tri::False,
			_ => Tri::Null,
		}
	}
}

/// Coerces a [`Tri`] to a plain boolean at the top-level filter boundary:
/// unknown is treated as false (a feature is kept only when the filter is
/// affirmatively true).
#[must_use]
pub fn coerce_bool(t: Tri) -> bool {
	matches!(t, Tri::True)
}

/// Evaluates `expr` against attributes resolved by `lookup`.
pub fn evaluate(expr: &Expr, lookup: &impl Fn(&str) -> AttrValue) -> Tri {
	match expr {
		Expr::Eq(key, lit) => Tri::from_option(lit.matches(&lookup(key))),
		Expr::Ne(key, lit) => Tri::from_option(lit.matches(&lookup(key))).not(),
		Expr::Lt(key, lit) => Tri::from_option(lit.partial_cmp(&lookup(key)).map(|o| o == std::cmp::Ordering::Greater)),
		Expr::Le(key, lit) => {
			Tri::from_option(lit.partial_cmp(&lookup(key)).map(|o| o != std::cmp::Ordering::Less))
		}
		Expr::Gt(key, lit) => Tri::from_option(lit.partial_cmp(&lookup(key)).map(|o| o == std::cmp::Ordering::Less)),
		Expr::Ge(key, lit) => {
			Tri::from_option(lit.partial_cmp(&lookup(key)).map(|o| o != std::cmp::Ordering::Greater))
		}
		Expr::Contains(key, lit) => Tri::from_option(string_contains(&lookup(key), lit)),
		Expr::NotContains(key, lit) => Tri::from_option(string_contains(&lookup(key), lit)).not(),
		Expr::In(key, lits) => {
			let attr = lookup(key);
			if attr.is_null() {
				return Tri::Null;
			}
			Tri::from_bool(lits.iter().any(|l| l.matches(&attr) == Some(true)))
		}
		Expr::NotIn(key, lits) => evaluate(&Expr::In(key.clone(), lits.clone()), lookup).not(),
		Expr::Is(key) => Tri::from_bool(lookup(key).is_null()),
		Expr::IsNot(key) => Tri::from_bool(lookup(key).is_null()).not(),
		Expr::Has(key) => Tri::from_bool(lookup(key).is_present()),
		Expr::NotHas(key) => Tri::from_bool(lookup(key).is_present()).not(),
		Expr::All(children) => children.iter().map(|c| evaluate(c, lookup)).fold(Tri::True, Tri::and),
		Expr::Any(children) => children.iter().map(|c| evaluate(c, lookup)).fold(Tri::False, Tri::or),
		Expr::None(children) => {
			let any = children.iter().map(|c| evaluate(c, lookup)).fold(Tri::False, Tri::or);
			any.not()
		}
	}
}

/// As [`evaluate`], but first walks every comparison leaf in `expr` and
/// fires the matching [`WarnKind`] once per run (§7: "attribute not found
/// for comparison, mismatched types ... warn once per kind, continue").
/// Kept separate from [`evaluate`] so the pure evaluator stays side-effect
/// free and independently testable; a tile worker wanting the §7 policy
/// calls this instead.
pub fn evaluate_with_warnings(expr: &Expr, lookup: &impl Fn(&str) -> AttrValue, warnings: &WarnOnce) -> Tri {
	check_leaves(expr, lookup, warnings);
	evaluate(expr, lookup)
}

fn check_leaves(expr: &Expr, lookup: &impl Fn(&str) -> AttrValue, warnings: &WarnOnce) {
	match expr {
		Expr::Eq(key, lit) | Expr::Ne(key, lit) | Expr::Lt(key, lit) | Expr::Le(key, lit) | Expr::Gt(key, lit) | Expr::Ge(key, lit) | Expr::Contains(key, lit) | Expr::NotContains(key, lit) => {
			check_leaf(key, std::slice::from_ref(lit), lookup, warnings);
		}
		Expr::In(key, lits) | Expr::NotIn(key, lits) => check_leaf(key, lits, lookup, warnings),
		Expr::Is(_) | Expr::IsNot(_) | Expr::Has(_) | Expr::NotHas(_) => {}
		Expr::All(children) | Expr::Any(children) | Expr::None(children) => {
			for child in children {
				check_leaves(child, lookup, warnings);
			}
		}
	}
}

fn check_leaf(key: &str, lits: &[Literal], lookup: &impl Fn(&str) -> AttrValue, warnings: &WarnOnce) {
	let attr = lookup(key);
	if !attr.is_present() {
		warnings.warn(WarnKind::AttributeNotFoundForComparison, &format!("attribute {key:?} not found during comparison"));
		return;
	}
	if attr.is_null() {
		return;
	}
	for lit in lits {
		let mismatched = match lit {
			Literal::Number(_) => attr.as_f64().is_none(),
			Literal::Bool(_) => !matches!(&attr, AttrValue::Value(MvtValue::Bool(_))),
			Literal::String(_) | Literal::Null => false,
		};
		if mismatched {
			warnings.warn(WarnKind::MismatchedComparisonType, &format!("attribute {key:?} compared against a literal of a different type"));
		}
	}
}

fn string_contains(attr: &AttrValue, lit: &super::value::Literal) -> Option<bool> {
	if attr.is_null() {
		return None;
	}
	let haystack = attr.as_str()?;
	match lit {
		super::value::Literal::String(needle) => Some(haystack.contains(needle.as_str())),
		_ => Some(false),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::super::value::Literal;
	use tilekiln_mvt::MvtValue;

	fn lookup_for<'a>(pairs: &'a [(&'a str, AttrValue)]) -> impl Fn(&str) -> AttrValue + 'a {
		move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()).unwrap_or(AttrValue::NoSuchKey)
	}

	#[test]
	fn missing_attribute_makes_eq_unknown_and_filters_out() {
		let lookup = lookup_for(&[]);
		let expr = Expr::Eq("class".to_string(), Literal::String("road".to_string()));
		assert_eq!(evaluate(&expr, &lookup), Tri::Null);
		assert!(!coerce_bool(evaluate(&expr, &lookup)));
	}

	#[test]
	fn null_and_false_is_false() {
		let lookup = lookup_for(&[("b", AttrValue::Value(MvtValue::String("no".to_string())))]);
		let expr = Expr::All(vec![
			Expr::Eq("a".to_string(), Literal::String("anything".to_string())),
			Expr::Eq("b".to_string(), Literal::String("yes".to_string())),
		]);
		assert_eq!(evaluate(&expr, &lookup), Tri::False);
	}

	#[test]
	fn null_or_true_is_true() {
		let lookup = lookup_for(&[("flag", AttrValue::Value(MvtValue::Bool(true)))]);
		let expr = Expr::Any(vec![Expr::Eq("missing".to_string(), Literal::Number(1.0)), Expr::Eq("flag".to_string(), Literal::Bool(true))]);
		assert_eq!(evaluate(&expr, &lookup), Tri::True);
	}

	#[test]
	fn has_detects_presence_not_value() {
		let lookup = lookup_for(&[("a", AttrValue::Null)]);
		assert_eq!(evaluate(&Expr::Has("a".to_string()), &lookup), Tri::True);
		assert_eq!(evaluate(&Expr::Has("b".to_string()), &lookup), Tri::False);
	}

	#[test]
	fn in_list_checks_membership() {
		let lookup = lookup_for(&[("kind", AttrValue::Value(MvtValue::String("lake".to_string())))]);
		let expr = Expr::In("kind".to_string(), vec![Literal::String("lake".to_string()), Literal::String("river".to_string())]);
		assert_eq!(evaluate(&expr, &lookup), Tri::True);
	}

	#[test]
	fn numeric_range_comparison() {
		let lookup = lookup_for(&[("pop", AttrValue::Value(MvtValue::Double(500.0)))]);
		assert_eq!(evaluate(&Expr::Gt("pop".to_string(), Literal::Number(100.0)), &lookup), Tri::True);
		assert_eq!(evaluate(&Expr::Lt("pop".to_string(), Literal::Number(100.0)), &lookup), Tri::False);
	}

	#[test]
	fn evaluate_with_warnings_matches_plain_evaluate() {
		let lookup = lookup_for(&[("pop", AttrValue::Value(MvtValue::Double(500.0)))]);
		let expr = Expr::Gt("pop".to_string(), Literal::Number(100.0));
		let warnings = WarnOnce::new();
		assert_eq!(evaluate_with_warnings(&expr, &lookup, &warnings), evaluate(&expr, &lookup));
	}

	#[test]
	fn missing_attribute_fires_attribute_not_found_warning() {
		let lookup = lookup_for(&[]);
		let expr = Expr::Eq("class".to_string(), Literal::String("road".to_string()));
		let warnings = WarnOnce::new();
		evaluate_with_warnings(&expr, &lookup, &warnings);
		warnings.warn(WarnKind::AttributeNotFoundForComparison, "second call should not double-log");
	}

	#[test]
	fn numeric_literal_against_string_attribute_fires_mismatched_type_warning() {
		let lookup = lookup_for(&[("pop", AttrValue::Value(MvtValue::String("lots".to_string())))]);
		let expr = Expr::Gt("pop".to_string(), Literal::Number(100.0));
		let warnings = WarnOnce::new();
		evaluate_with_warnings(&expr, &lookup, &warnings);
		warnings.warn(WarnKind::MismatchedComparisonType, "second call should not double-log");
	}

	#[test]
	fn null_attribute_is_not_treated_as_a_type_mismatch() {
		let lookup = lookup_for(&[("pop", AttrValue::Null)]);
		let expr = Expr::Gt("pop".to_string(), Literal::Number(100.0));
		let warnings = WarnOnce::new();
		assert_eq!(evaluate_with_warnings(&expr, &lookup, &warnings), Tri::Null);
	}
}
