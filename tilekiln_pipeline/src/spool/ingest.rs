//! Frontend-agnostic input feature contract (§6: "Input feature stream
//! (core contract)") → [`SerialFeature`] conversion: attribute coercion, id
//! promotion, projection and the antimeridian split a spooler needs before
//! a record can be appended.

use crate::warnings::{WarnKind, WarnOnce};
use anyhow::Result;
use tilekiln_core::projection::wgs84_to_world;
use tilekiln_geometry::{area_of_rings, split_rings, Draw, Op};
use tilekiln_mvt::{MvtValue, SerialFeature, SerialGeomType, StringPool};

/// One input coordinate: already-projected world units, or raw lon/lat to
/// be projected on ingest. The frontends that parse GeoJSON/CSV/PBF (out of
/// scope here, §1) hand either form to the same ingest path.
#[derive(Clone, Copy, Debug)]
pub enum InputCoord {
	World(i64, i64),
	LonLat(f64, f64),
}

/// One draw op in the input stream's own coordinate space, mirroring the
/// wire contract's `sequence of (op, x, y)`.
#[derive(Clone, Copy, Debug)]
pub enum InputOp {
	MoveTo(InputCoord),
	LineTo(InputCoord),
	ClosePath,
}

/// An attribute's source-typed value, before coercion to [`MvtValue`].
#[derive(Clone, Debug, PartialEq)]
pub enum InputAttrValue {
	String(String),
	Number(f64),
	Bool(bool),
	Null,
}

/// One record of the core input contract (§6).
#[derive(Clone, Debug)]
pub struct RawFeature {
	pub geom_type: SerialGeomType,
	pub geometry: Vec<InputOp>,
	pub id: Option<u64>,
	pub layer_name: String,
	pub attributes: Vec<(String, InputAttrValue)>,
	pub tippecanoe_minzoom: Option<u8>,
	pub tippecanoe_maxzoom: Option<u8>,
	pub sequence: u64,
}

/// Coerces a source-typed attribute value to the MVT value union (§6: "type:
/// string|number|bool|null"). `Null` attributes are dropped by the caller
/// rather than represented, since MVT has no null value variant.
#[must_use]
pub fn coerce_attribute(value: &InputAttrValue) -> Option<MvtValue> {
	match value {
		InputAttrValue::String(s) => Some(MvtValue::String(s.clone())),
		InputAttrValue::Number(n) => Some(MvtValue::Double(*n)),
		InputAttrValue::Bool(b) => Some(MvtValue::Bool(*b)),
		InputAttrValue::Null => None,
	}
}

/// If `promote_id_from` names an attribute, parses its value as a `u64` and
/// returns it; a non-numeric or absent value is a per-feature policy
/// violation the caller warns on and skips (§7: "Per-feature policy
/// violations ... warn once per kind, continue").
#[must_use]
pub fn promote_id(feature: &RawFeature, promote_id_from: Option<&str>) -> Option<u64> {
	let Some(name) = promote_id_from else {
		return feature.id;
	};
	feature.attributes.iter().find(|(k, _)| k == name).and_then(|(_, v)| match v {
		InputAttrValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
		InputAttrValue::String(s) => s.parse().ok(),
		_ => None,
	})
}

fn project_coord(c: InputCoord) -> (i64, i64) {
	match c {
		InputCoord::World(x, y) => (x, y),
		InputCoord::LonLat(lon, lat) => {
			let (x, y) = wgs84_to_world(lon, lat);
			(i64::from(x), i64::from(y))
		}
	}
}

fn project_geometry(ops: &[InputOp]) -> Vec<Draw> {
	ops.iter()
		.map(|op| match op {
			InputOp::MoveTo(c) => {
				let (x, y) = project_coord(*c);
				Draw::move_to(x, y)
			}
			InputOp::LineTo(c) => {
				let (x, y) = project_coord(*c);
				Draw::line_to(x, y)
			}
			InputOp::ClosePath => Draw::close_path(),
		})
		.collect()
}

/// Splits a feature whose geometry crosses the antimeridian into its two
/// contiguous halves (§8 scenario 6: "Polygon crossing ±180°... Emitted as
/// two parts"), each with its own narrow bbox. A bbox wider than half the
/// world signals wraparound rather than genuine extent, mirroring the
/// western-hemisphere shift the source performs before computing its own
/// file-wide bbox (`serial.cpp`'s `serialize_feature`); here the shift is
/// applied per feature so both halves can be clipped independently instead
/// of widening the whole run's bbox.
fn split_dateline_crossing(geometry: Vec<Draw>) -> Vec<Vec<Draw>> {
	const HALF_WORLD: i64 = 1i64 << 31;
	const FULL_WORLD: i64 = 1i64 << 32;

	let width = {
		let mut lo = i64::MAX;
		let mut hi = i64::MIN;
		for d in &geometry {
			if d.op == Op::ClosePath {
				continue;
			}
			lo = lo.min(d.x);
			hi = hi.max(d.x);
		}
		if lo > hi {
			0
		} else {
			hi - lo
		}
	};
	if width < HALF_WORLD || geometry.is_empty() {
		return vec![geometry];
	}

	let east: Vec<Draw> = geometry
		.iter()
		.map(|d| if d.op == Op::ClosePath || d.x >= HALF_WORLD { *d } else { Draw { x: d.x + FULL_WORLD, ..*d } })
		.collect();
	let west: Vec<Draw> = east
		.iter()
		.map(|d| if d.op == Op::ClosePath { *d } else { Draw { x: d.x - FULL_WORLD, ..*d } })
		.collect();
	vec![east, west]
}

/// Converts one input record into the spooled [`SerialFeature`] form(s): the
/// geometry is projected, attributes are coerced and interned into
/// `strings`, the id is optionally promoted from a named attribute, and a
/// dateline-crossing geometry is split into two independently-clippable
/// copies. Returns one feature normally, two when the antimeridian split
/// fires.
///
/// `warnings` fires [`WarnKind::NonNumericId`] once if `promote_id_from`
/// names an attribute that is present but not parseable as a `u64` (§7).
pub fn ingest_feature(raw: &RawFeature, promote_id_from: Option<&str>, strings: &mut StringPool, warnings: &WarnOnce) -> Result<Vec<SerialFeature>> {
	let id = promote_id(raw, promote_id_from);
	if id.is_none() {
		if let Some(name) = promote_id_from {
			if raw.attributes.iter().any(|(k, _)| k == name) {
				warnings.warn(WarnKind::NonNumericId, &format!("attribute {name:?} is not a non-negative integer, cannot promote to feature id"));
			}
		}
	}
	let geometry = project_geometry(&raw.geometry);

	let mut tags = Vec::with_capacity(raw.attributes.len());
	for (key, value) in &raw.attributes {
		let Some(mvt_value) = coerce_attribute(value) else {
			continue;
		};
		let key_id = strings.intern(key)?;
		let value_id = strings.intern(&attribute_cache_key(&mvt_value))?;
		tags.push((key_id, value_id));
	}

	let parts = if raw.geom_type == SerialGeomType::Point { vec![geometry] } else { split_dateline_crossing(geometry) };

	parts
		.into_iter()
		.map(|geometry| {
			let extent = area_of_rings(&split_rings(&geometry)).abs();
			Ok(SerialFeature {
				id,
				geom_type: raw.geom_type,
				bbox: SerialFeature::bbox_of(&geometry),
				geometry,
				extent,
				tags: tags.clone(),
				minzoom: 0,
				tippecanoe_minzoom: raw.tippecanoe_minzoom,
				tippecanoe_maxzoom: raw.tippecanoe_maxzoom,
			})
		})
		.collect()
}

/// A string-pool key for an attribute value, distinct per underlying type
/// and content so `"3"` (string) and `3` (number) intern separately. The
/// thread-local [`StringPool`] only ever stores strings, so a typed value is
/// round-tripped through a one-letter type tag rather than through a
/// separate value pool keyed by hash like the source's `pool.cpp`.
fn attribute_cache_key(value: &MvtValue) -> String {
	match value {
		MvtValue::String(s) => format!("s:{s}"),
		MvtValue::Double(d) => format!("d:{d}"),
		MvtValue::Float(f) => format!("f:{f}"),
		MvtValue::Int(i) | MvtValue::SInt(i) => format!("i:{i}"),
		MvtValue::UInt(u) => format!("u:{u}"),
		MvtValue::Bool(b) => format!("b:{b}"),
	}
}

/// Inverse of [`attribute_cache_key`], used to build a tile worker's
/// `resolve_value` closure from a resolved string-pool entry.
#[must_use]
pub fn decode_attribute_cache_key(s: &str) -> MvtValue {
	let Some((tag, rest)) = s.split_once(':') else {
		return MvtValue::String(s.to_string());
	};
	match tag {
		"s" => MvtValue::String(rest.to_string()),
		"d" => rest.parse().map(MvtValue::Double).unwrap_or_else(|_| MvtValue::String(rest.to_string())),
		"f" => rest.parse().map(MvtValue::Float).unwrap_or_else(|_| MvtValue::String(rest.to_string())),
		"i" => rest.parse().map(MvtValue::Int).unwrap_or_else(|_| MvtValue::String(rest.to_string())),
		"u" => rest.parse().map(MvtValue::UInt).unwrap_or_else(|_| MvtValue::String(rest.to_string())),
		"b" => rest.parse().map(MvtValue::Bool).unwrap_or_else(|_| MvtValue::String(rest.to_string())),
		_ => MvtValue::String(s.to_string()),
	}
}
