use tilekiln_geometry::GeomType;

/// The three geometry classes the MVT spec's `GeomType` enum encodes
/// (`UNKNOWN` = 0 is never produced by this codec).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MvtGeomType {
	#[default]
	Unknown,
	Point,
	LineString,
	Polygon,
}

impl MvtGeomType {
	#[must_use]
	pub fn as_u64(self) -> u64 {
		match self {
			MvtGeomType::Unknown => 0,
			MvtGeomType::Point => 1,
			MvtGeomType::LineString => 2,
			MvtGeomType::Polygon => 3,
		}
	}
}

impl From<u64> for MvtGeomType {
	fn from(v: u64) -> MvtGeomType {
		match v {
			1 => MvtGeomType::Point,
			2 => MvtGeomType::LineString,
			3 => MvtGeomType::Polygon,
			_ => MvtGeomType::Unknown,
		}
	}
}

impl From<GeomType> for MvtGeomType {
	fn from(g: GeomType) -> MvtGeomType {
		match g {
			GeomType::Point => MvtGeomType::Point,
			GeomType::Line => MvtGeomType::LineString,
			GeomType::Polygon => MvtGeomType::Polygon,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrips_through_u64() {
		for t in [MvtGeomType::Point, MvtGeomType::LineString, MvtGeomType::Polygon] {
			assert_eq!(MvtGeomType::from(t.as_u64()), t);
		}
	}

	#[test]
	fn unknown_is_the_zero_fallback() {
		assert_eq!(MvtGeomType::from(99), MvtGeomType::Unknown);
	}
}
