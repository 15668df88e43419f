use anyhow::{bail, ensure, Context, Result};
use tilekiln_core::io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob};
use tilekiln_geometry::{Draw, Op};

/// Geometry class of a spooled feature, matching [`tilekiln_geometry::GeomType`]
/// but kept as its own enum so the wire tag values are a stable format
/// detail rather than an alias of the geometry crate's internal enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SerialGeomType {
	Point = 0,
	Line = 1,
	Polygon = 2,
}

impl SerialGeomType {
	fn from_tag(tag: u8) -> Result<SerialGeomType> {
		match tag {
			0 => Ok(SerialGeomType::Point),
			1 => Ok(SerialGeomType::Line),
			2 => Ok(SerialGeomType::Polygon),
			_ => bail!("unknown serial geometry tag {tag}"),
		}
	}
}

const OP_MOVE_TO: u8 = 0;
const OP_LINE_TO: u8 = 1;
const OP_CLOSE_PATH: u8 = 2;
const OP_END: u8 = 3;

const FLAG_HAS_ID: u8 = 0x01;
const GEOM_TYPE_SHIFT: u8 = 1;
const FLAG_HAS_TC_MINZOOM: u8 = 0x08;
const FLAG_HAS_TC_MAXZOOM: u8 = 0x10;

/// One feature as spooled to disk between the ingest and tiling stages:
/// world-plane geometry (not yet clipped to any tile), the feature id if
/// the source provided one, `(key_id, value_id)` pairs into the shared
/// string pool, and the minzoom the dot-dropping pass assigned it.
///
/// `bbox` is the geometry's world-plane bounding box, computed once at
/// spool time (§4.7) so a tile worker can reject a feature with a single
/// rectangle test before ever touching its draw ops (§4.8 step 1).
/// `extent` is the feature's own pseudo-area (§3), likewise computed once
/// at spool time from the unclipped world-plane geometry, so size-based
/// dropping judges a feature by a stable attribute rather than by however
/// much of it happens to survive clipping into a given tile.
/// `tippecanoe_minzoom`/`tippecanoe_maxzoom` are the feature's own
/// source-specified visibility window (§3, §6) and bound the computed
/// `minzoom` independently of dot-dropping.
#[derive(Clone, Debug, PartialEq)]
pub struct SerialFeature {
	pub id: Option<u64>,
	pub geom_type: SerialGeomType,
	pub geometry: Vec<Draw>,
	pub tags: Vec<(u32, u32)>,
	pub minzoom: u8,
	pub bbox: [i64; 4],
	pub extent: f64,
	pub tippecanoe_minzoom: Option<u8>,
	pub tippecanoe_maxzoom: Option<u8>,
}

impl SerialFeature {
	/// Builds a feature's bbox from its own geometry; called by the spooler
	/// at ingest time rather than stored redundantly by the frontend.
	#[must_use]
	pub fn bbox_of(geom: &[Draw]) -> [i64; 4] {
		let mut bbox = [i64::MAX, i64::MAX, i64::MIN, i64::MIN];
		for d in geom {
			if d.op == Op::ClosePath {
				continue;
			}
			bbox[0] = bbox[0].min(d.x);
			bbox[1] = bbox[1].min(d.y);
			bbox[2] = bbox[2].max(d.x);
			bbox[3] = bbox[3].max(d.y);
		}
		if bbox[0] > bbox[2] {
			bbox = [0, 0, 0, 0];
		}
		bbox
	}

	pub fn encode(&self) -> Result<Vec<u8>> {
		let mut w = ValueWriterBlob::new();

		let flags = (u8::from(self.id.is_some()) * FLAG_HAS_ID)
			| ((self.geom_type as u8) << GEOM_TYPE_SHIFT)
			| (u8::from(self.tippecanoe_minzoom.is_some()) * FLAG_HAS_TC_MINZOOM)
			| (u8::from(self.tippecanoe_maxzoom.is_some()) * FLAG_HAS_TC_MAXZOOM);
		w.write_u8(flags)?;
		if let Some(id) = self.id {
			w.write_varint(id)?;
		}
		for c in self.bbox {
			w.write_svarint(c)?;
		}
		w.write_f64(self.extent)?;

		let (mut px, mut py) = (0i64, 0i64);
		for d in &self.geometry {
			match d.op {
				Op::MoveTo => {
					w.write_u8(OP_MOVE_TO)?;
					w.write_svarint(d.x - px)?;
					w.write_svarint(d.y - py)?;
					px = d.x;
					py = d.y;
				}
				Op::LineTo => {
					w.write_u8(OP_LINE_TO)?;
					w.write_svarint(d.x - px)?;
					w.write_svarint(d.y - py)?;
					px = d.x;
					py = d.y;
				}
				Op::ClosePath => {
					w.write_u8(OP_CLOSE_PATH)?;
				}
			}
		}
		w.write_u8(OP_END)?;

		w.write_varint(self.tags.len() as u64)?;
		for (k, v) in &self.tags {
			w.write_varint(u64::from(*k))?;
			w.write_varint(u64::from(*v))?;
		}

		if let Some(z) = self.tippecanoe_minzoom {
			w.write_u8(z)?;
		}
		if let Some(z) = self.tippecanoe_maxzoom {
			w.write_u8(z)?;
		}
		w.write_u8(self.minzoom)?;

		Ok(w.into_blob().into_vec())
	}

	pub fn decode(data: &[u8]) -> Result<SerialFeature> {
		let mut r = ValueReaderSlice::new(data);

		let flags = r.read_u8().context("reading serial feature flags")?;
		let has_id = flags & FLAG_HAS_ID != 0;
		let geom_type = SerialGeomType::from_tag((flags >> GEOM_TYPE_SHIFT) & 0x3)?;
		let id = if has_id { Some(r.read_varint().context("reading serial feature id")?) } else { None };
		let mut bbox = [0i64; 4];
		for c in &mut bbox {
			*c = r.read_svarint().context("reading serial feature bbox")?;
		}
		let extent = r.read_f64().context("reading serial feature extent")?;

		let (mut px, mut py) = (0i64, 0i64);
		let mut geometry = Vec::new();
		loop {
			let op = r.read_u8().context("reading serial geometry op")?;
			match op {
				OP_MOVE_TO => {
					px += r.read_svarint()?;
					py += r.read_svarint()?;
					geometry.push(Draw::move_to(px, py));
				}
				OP_LINE_TO => {
					px += r.read_svarint()?;
					py += r.read_svarint()?;
					geometry.push(Draw::line_to(px, py));
				}
				OP_CLOSE_PATH => geometry.push(Draw::close_path()),
				OP_END => break,
				other => bail!("unknown serial geometry op {other}"),
			}
		}

		let tag_count = r.read_varint().context("reading serial tag count")?;
		let mut tags = Vec::with_capacity(tag_count as usize);
		for _ in 0..tag_count {
			let k = r.read_varint()? as u32;
			let v = r.read_varint()? as u32;
			tags.push((k, v));
		}

		let tippecanoe_minzoom = if flags & FLAG_HAS_TC_MINZOOM != 0 {
			Some(r.read_u8().context("reading serial feature tippecanoe_minzoom")?)
		} else {
			None
		};
		let tippecanoe_maxzoom = if flags & FLAG_HAS_TC_MAXZOOM != 0 {
			Some(r.read_u8().context("reading serial feature tippecanoe_maxzoom")?)
		} else {
			None
		};
		let minzoom = r.read_u8().context("reading serial feature minzoom")?;
		ensure!(!r.has_remaining(), "trailing bytes after serial feature record");

		Ok(SerialFeature { id, geom_type, geometry, tags, minzoom, bbox, extent, tippecanoe_minzoom, tippecanoe_maxzoom })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_feature_roundtrips() {
		let geometry = vec![Draw::move_to(100, 200)];
		let f = SerialFeature {
			id: Some(42),
			geom_type: SerialGeomType::Point,
			bbox: SerialFeature::bbox_of(&geometry),
			geometry,
			extent: 1.0,
			tags: vec![(0, 0), (1, 3)],
			minzoom: 5,
			tippecanoe_minzoom: Some(3),
			tippecanoe_maxzoom: None,
		};
		let bytes = f.encode().unwrap();
		assert_eq!(SerialFeature::decode(&bytes).unwrap(), f);
	}

	#[test]
	fn feature_without_id_roundtrips() {
		let geometry = vec![Draw::move_to(0, 0), Draw::line_to(-50, 75)];
		let f = SerialFeature {
			id: None,
			geom_type: SerialGeomType::Line,
			bbox: SerialFeature::bbox_of(&geometry),
			geometry,
			extent: 1.0,
			tags: vec![],
			minzoom: 0,
			tippecanoe_minzoom: None,
			tippecanoe_maxzoom: None,
		};
		let bytes = f.encode().unwrap();
		assert_eq!(SerialFeature::decode(&bytes).unwrap(), f);
	}

	#[test]
	fn polygon_with_close_path_roundtrips() {
		let geometry = vec![
			Draw::move_to(0, 0),
			Draw::line_to(10, 0),
			Draw::line_to(10, 10),
			Draw::close_path(),
		];
		let f = SerialFeature {
			id: None,
			geom_type: SerialGeomType::Polygon,
			bbox: SerialFeature::bbox_of(&geometry),
			geometry,
			extent: 100.0,
			tags: vec![(2, 2)],
			minzoom: 14,
			tippecanoe_minzoom: None,
			tippecanoe_maxzoom: Some(16),
		};
		let bytes = f.encode().unwrap();
		assert_eq!(SerialFeature::decode(&bytes).unwrap(), f);
	}

	#[test]
	fn extent_roundtrips_without_precision_loss() {
		let geometry = vec![Draw::move_to(0, 0), Draw::line_to(1, 1)];
		let f = SerialFeature {
			id: None,
			geom_type: SerialGeomType::Line,
			bbox: SerialFeature::bbox_of(&geometry),
			geometry,
			extent: 123_456_789.987_654,
			tags: vec![],
			minzoom: 0,
			tippecanoe_minzoom: None,
			tippecanoe_maxzoom: None,
		};
		let bytes = f.encode().unwrap();
		assert_eq!(SerialFeature::decode(&bytes).unwrap().extent, f.extent);
	}

	#[test]
	fn rejects_unknown_geom_tag() {
		assert!(SerialGeomType::from_tag(9).is_err());
	}

	#[test]
	fn bbox_of_empty_geometry_is_zeroed() {
		assert_eq!(SerialFeature::bbox_of(&[]), [0, 0, 0, 0]);
	}

	#[test]
	fn bbox_of_tracks_extremes() {
		let geometry = vec![Draw::move_to(-5, 10), Draw::line_to(20, -3), Draw::close_path()];
		assert_eq!(SerialFeature::bbox_of(&geometry), [-5, -3, 20, 10]);
	}
}
