//! Geometry command encoding: the delta-zigzag `MoveTo`/`LineTo`/`ClosePath`
//! stream from the MVT spec (§4.3 of the vector tile spec, §6 here).

use tilekiln_geometry::{Draw, Op};

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

fn command(id: u32, count: u32) -> u32 {
	(id & 0x7) | (count << 3)
}

fn zigzag_encode(v: i64) -> u32 {
	((v << 1) ^ (v >> 63)) as u32
}

fn zigzag_decode(v: u32) -> i64 {
	((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Packs a drawvec into the raw command/parameter `u32` stream MVT wants in
/// its packed-varint `geometry` field.
#[must_use]
pub fn encode_geometry(geom: &[Draw]) -> Vec<u32> {
	let mut out = Vec::with_capacity(geom.len() * 2);
	let (mut cx, mut cy) = (0i64, 0i64);
	let mut i = 0;
	while i < geom.len() {
		match geom[i].op {
			Op::MoveTo => {
				out.push(command(CMD_MOVE_TO, 1));
				out.push(zigzag_encode(geom[i].x - cx));
				out.push(zigzag_encode(geom[i].y - cy));
				cx = geom[i].x;
				cy = geom[i].y;
				i += 1;
			}
			Op::LineTo => {
				let start = i;
				while i < geom.len() && geom[i].op == Op::LineTo {
					i += 1;
				}
				let count = (i - start) as u32;
				out.push(command(CMD_LINE_TO, count));
				for d in &geom[start..i] {
					out.push(zigzag_encode(d.x - cx));
					out.push(zigzag_encode(d.y - cy));
					cx = d.x;
					cy = d.y;
				}
			}
			Op::ClosePath => {
				out.push(command(CMD_CLOSE_PATH, 1));
				i += 1;
			}
		}
	}
	out
}

/// Inverse of [`encode_geometry`].
#[must_use]
pub fn decode_geometry(commands: &[u32]) -> Vec<Draw> {
	let mut out = Vec::new();
	let (mut cx, mut cy) = (0i64, 0i64);
	let mut i = 0;
	while i < commands.len() {
		let cmd = commands[i];
		i += 1;
		let id = cmd & 0x7;
		let count = cmd >> 3;
		match id {
			1 => {
				for _ in 0..count {
					if i + 1 >= commands.len() {
						break;
					}
					cx += zigzag_decode(commands[i]);
					cy += zigzag_decode(commands[i + 1]);
					i += 2;
					out.push(Draw::move_to(cx, cy));
				}
			}
			2 => {
				for _ in 0..count {
					if i + 1 >= commands.len() {
						break;
					}
					cx += zigzag_decode(commands[i]);
					cy += zigzag_decode(commands[i + 1]);
					i += 2;
					out.push(Draw::line_to(cx, cy));
				}
			}
			7 => {
				out.push(Draw::close_path());
			}
			_ => break,
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_roundtrips() {
		let geom = vec![Draw::move_to(10, 20)];
		let commands = encode_geometry(&geom);
		assert_eq!(decode_geometry(&commands), geom);
	}

	#[test]
	fn line_roundtrips() {
		let geom = vec![Draw::move_to(0, 0), Draw::line_to(10, 0), Draw::line_to(10, 10)];
		let commands = encode_geometry(&geom);
		assert_eq!(decode_geometry(&commands), geom);
	}

	#[test]
	fn polygon_with_close_path_roundtrips() {
		let geom = vec![
			Draw::move_to(0, 0),
			Draw::line_to(10, 0),
			Draw::line_to(10, 10),
			Draw::close_path(),
		];
		let commands = encode_geometry(&geom);
		let decoded = decode_geometry(&commands);
		assert_eq!(decoded.len(), geom.len());
		assert_eq!(decoded[..3], geom[..3]);
	}

	#[test]
	fn negative_deltas_zigzag_correctly() {
		let geom = vec![Draw::move_to(100, 100), Draw::line_to(0, 0)];
		let commands = encode_geometry(&geom);
		assert_eq!(decode_geometry(&commands), geom);
	}
}
