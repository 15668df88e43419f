//! Tile coordinates and the rectangle of world-plane units a tile covers,
//! with or without a seam buffer.

use anyhow::{Result, ensure};
use std::fmt;

/// A quadtree cell `(z, x, y)`, `x, y ∈ [0, 2^z)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
	pub z: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	pub fn new(z: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(z <= 31, "zoom {z} exceeds the 31-level limit");
		let max = 1u32.checked_shl(u32::from(z)).unwrap_or(u32::MAX);
		ensure!(x < max && y < max, "tile {z}/{x}/{y} out of range");
		Ok(TileCoord { z, x, y })
	}

	/// World-plane span of one tile at this zoom: `2^(32 - z)`.
	#[must_use]
	pub fn world_span(&self) -> u64 {
		1u64 << (32 - u32::from(self.z))
	}

	/// The tile's unbuffered rectangle in 32-bit world units.
	#[must_use]
	pub fn world_rect(&self) -> TileRect {
		let span = self.world_span();
		let x0 = u64::from(self.x) * span;
		let y0 = u64::from(self.y) * span;
		TileRect {
			min_x: x0 as i64,
			min_y: y0 as i64,
			max_x: (x0 + span) as i64,
			max_y: (y0 + span) as i64,
		}
	}

	/// The buffered rectangle, per the §3 invariant:
	/// `-buf*span/256 <= c <= span*(1 + buf/256)`.
	#[must_use]
	pub fn buffered_world_rect(&self, buffer: i64) -> TileRect {
		let span = self.world_span() as i64;
		let pad = span * buffer / 256;
		let r = self.world_rect();
		TileRect {
			min_x: r.min_x - pad,
			min_y: r.min_y - pad,
			max_x: r.max_x + pad,
			max_y: r.max_y + pad,
		}
	}

	/// The four children at `z+1`.
	#[must_use]
	pub fn children(&self) -> [TileCoord; 4] {
		let z = self.z + 1;
		let x = self.x * 2;
		let y = self.y * 2;
		[
			TileCoord { z, x, y },
			TileCoord { z, x: x + 1, y },
			TileCoord { z, x, y: y + 1 },
			TileCoord { z, x: x + 1, y: y + 1 },
		]
	}

	/// Which of the four children (by `(dx, dy) ∈ {0,1}²`) contains the
	/// world-unit point `(wx, wy)` once projected to `z+1`.
	#[must_use]
	pub fn child_for_point(&self, wx: i64, wy: i64) -> (u32, u32) {
		let span_next = (self.world_span() / 2) as i64;
		let origin = self.world_rect();
		let dx = ((wx - origin.min_x).max(0) / span_next).min(1) as u32;
		let dy = ((wy - origin.min_y).max(0) / span_next).min(1) as u32;
		(self.x * 2 + dx, self.y * 2 + dy)
	}
}

impl fmt::Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}

impl fmt::Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}

/// An axis-aligned rectangle in integer world-plane (or tile-plane) units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
	pub min_x: i64,
	pub min_y: i64,
	pub max_x: i64,
	pub max_y: i64,
}

impl TileRect {
	#[must_use]
	pub fn contains_point(&self, x: i64, y: i64) -> bool {
		x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
	}

	#[must_use]
	pub fn intersects_bbox(&self, bbox: [i64; 4]) -> bool {
		bbox[0] <= self.max_x && bbox[2] >= self.min_x && bbox[1] <= self.max_y && bbox[3] >= self.min_y
	}
}
