//! Coordinate projection between a source tile's local extent and world
//! units, and back down into a destination tile's local extent — the two
//! conversions overzoom needs that the ingest-side tiler never does (it
//! only ever goes world -> tile-local).

use tilekiln_core::tile_coord::TileCoord;
use tilekiln_geometry::Draw;

/// Projects tile-local coordinates (as decoded straight off the wire, in
/// `[0, extent]`) back into 32-bit world units.
#[must_use]
pub fn tile_local_to_world(geom: &[Draw], coord: TileCoord, extent: u32) -> Vec<Draw> {
	let rect = coord.world_rect();
	let span = coord.world_span() as f64;
	let extent = f64::from(extent);
	geom
		.iter()
		.map(|d| {
			let wx = rect.min_x + (d.x as f64 / extent * span).round() as i64;
			let wy = rect.min_y + (d.y as f64 / extent * span).round() as i64;
			Draw::new(d.op, wx, wy)
		})
		.collect()
}

/// Projects world-unit coordinates down into a destination tile's local
/// extent, mirroring the tiler's own world -> tile-local step.
#[must_use]
pub fn world_to_tile_local(geom: &[Draw], coord: TileCoord, extent: u32) -> Vec<Draw> {
	let rect = coord.world_rect();
	let span = coord.world_span() as f64;
	let extent = f64::from(extent);
	geom
		.iter()
		.map(|d| {
			let tx = ((d.x - rect.min_x) as f64 / span * extent).round() as i64;
			let ty = ((d.y - rect.min_y) as f64 / span * extent).round() as i64;
			Draw::new(d.op, tx, ty)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrips_through_world_and_back() {
		let coord = TileCoord::new(6, 10, 20).unwrap();
		let geom = vec![Draw::move_to(100, 200), Draw::line_to(4000, 10)];
		let world = tile_local_to_world(&geom, coord, 4096);
		let back = world_to_tile_local(&world, coord, 4096);
		for (a, b) in geom.iter().zip(back.iter()) {
			assert!((a.x - b.x).abs() <= 1);
			assert!((a.y - b.y).abs() <= 1);
		}
	}

	#[test]
	fn child_tile_maps_into_half_the_parent_extent() {
		let parent = TileCoord::new(3, 1, 1).unwrap();
		let child = parent.children()[0];
		let world = tile_local_to_world(&[Draw::move_to(0, 0)], parent, 4096);
		let local = world_to_tile_local(&world, child, 4096);
		assert_eq!(local[0].x, 0);
		assert_eq!(local[0].y, 0);
	}
}
