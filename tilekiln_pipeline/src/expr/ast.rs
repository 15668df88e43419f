//! Expression tree for the per-tile attribute filter (§4.8 step 3),
//! covering both FSL-style (`eq/ne/lt/le/gt/ge/cn/nc/in/ni/is/isnt`) and
//! Mapbox-GL-style (`==, !=, has, !has, all, any, none, in, !in`) operators
//! under one representation.

use super::value::Literal;

/// A boolean expression over feature attributes.
#[derive(Clone, Debug)]
pub enum Expr {
	Eq(String, Literal),
	Ne(String, Literal),
	Lt(String, Literal),
	Le(String, Literal),
	Gt(String, Literal),
	Ge(String, Literal),
	/// `cn`: string attribute contains the literal as a substring.
	Contains(String, Literal),
	/// `nc`: negation of [`Expr::Contains`].
	NotContains(String, Literal),
	In(String, Vec<Literal>),
	NotIn(String, Vec<Literal>),
	/// `is`: the attribute is present and null, or simply present depending
	/// on the source dialect; here, true iff the attribute resolves to null
	/// (absent or explicit `Null`).
	Is(String),
	/// `isnt`: negation of [`Expr::Is`].
	IsNot(String),
	Has(String),
	NotHas(String),
	All(Vec<Expr>),
	Any(Vec<Expr>),
	None(Vec<Expr>),
}
