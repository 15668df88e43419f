//! The attribute value union an expression filter compares against (§9:
//! "Dynamic typing of attribute values"): the seven MVT value types plus an
//! explicit `Null` and a distinct `NoSuchKey` for attributes the feature
//! never had at all.

use tilekiln_mvt::MvtValue;

/// One attribute's resolved value for expression evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
	Value(MvtValue),
	Null,
	NoSuchKey,
}

/// A literal appearing on the right-hand side of a comparison in an
/// expression; kept separate from [`MvtValue`] since literals may need to
/// compare against an attribute of a different underlying type (e.g. `"3"`
/// against a numeric attribute).
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	String(String),
	Number(f64),
	Bool(bool),
	Null,
}

impl AttrValue {
	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			AttrValue::Value(MvtValue::Double(d)) => Some(*d),
			AttrValue::Value(MvtValue::Float(f)) => Some(f64::from(*f)),
			AttrValue::Value(MvtValue::Int(i) | MvtValue::SInt(i)) => Some(*i as f64),
			AttrValue::Value(MvtValue::UInt(u)) => Some(*u as f64),
			AttrValue::Value(MvtValue::Bool(b)) => Some(f64::from(u8::from(*b))),
			AttrValue::Value(MvtValue::String(s)) => s.parse().ok(),
			AttrValue::Null | AttrValue::NoSuchKey => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<String> {
		match self {
			AttrValue::Value(MvtValue::String(s)) => Some(s.clone()),
			AttrValue::Value(v) => Some(literal_to_string(v)),
			AttrValue::Null | AttrValue::NoSuchKey => None,
		}
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, AttrValue::Null | AttrValue::NoSuchKey)
	}

	#[must_use]
	pub fn is_present(&self) -> bool {
		!matches!(self, AttrValue::NoSuchKey)
	}
}

fn literal_to_string(v: &MvtValue) -> String {
	match v {
		MvtValue::String(s) => s.clone(),
		MvtValue::Double(d) => d.to_string(),
		MvtValue::Float(f) => f.to_string(),
		MvtValue::Int(i) | MvtValue::SInt(i) => i.to_string(),
		MvtValue::UInt(u) => u.to_string(),
		MvtValue::Bool(b) => b.to_string(),
	}
}

impl Literal {
	#[must_use]
	pub fn matches(&self, attr: &AttrValue) -> Option<bool> {
		if attr.is_null() {
			return None;
		}
		match self {
			Literal::Null => None,
			Literal::Bool(b) => match attr {
				AttrValue::Value(MvtValue::Bool(ab)) => Some(ab == b),
				_ => Some(false),
			},
			Literal::Number(n) => attr.as_f64().map(|v| (v - n).abs() < f64::EPSILON),
			Literal::String(s) => attr.as_str().map(|v| &v == s),
		}
	}

	#[must_use]
	pub fn partial_cmp(&self, attr: &AttrValue) -> Option<std::cmp::Ordering> {
		if attr.is_null() {
			return None;
		}
		match self {
			Literal::Number(n) => attr.as_f64().and_then(|v| v.partial_cmp(n)),
			Literal::String(s) => attr.as_str().map(|v| v.cmp(s)),
			Literal::Bool(_) | Literal::Null => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_key_is_not_present() {
		assert!(!AttrValue::NoSuchKey.is_present());
		assert!(AttrValue::NoSuchKey.is_null());
	}

	#[test]
	fn number_literal_matches_coerced_string() {
		let attr = AttrValue::Value(MvtValue::String("3".to_string()));
		assert_eq!(Literal::Number(3.0).matches(&attr), Some(true));
	}

	#[test]
	fn null_attribute_never_matches() {
		assert_eq!(Literal::String("x".to_string()).matches(&AttrValue::Null), None);
	}
}
