use super::ProgressTrait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Emits a `log::info!` line at most once every [`Self::MIN_INTERVAL`], no
/// matter how fast `inc`/`set_position` are called. Progress must never
/// become a throughput bottleneck for the tile worker's hot loop.
pub struct ProgressLogDrain {
	message: String,
	max_value: u64,
	position: AtomicU64,
	last_emit: Option<Instant>,
}

impl ProgressLogDrain {
	const MIN_INTERVAL: Duration = Duration::from_millis(500);

	fn maybe_emit(&mut self) {
		let now = Instant::now();
		let due = match self.last_emit {
			Some(t) => now.duration_since(t) >= Self::MIN_INTERVAL,
			None => true,
		};
		if due {
			let pos = self.position.load(Ordering::Relaxed);
			log::info!("{}: {pos}/{}", self.message, self.max_value);
			self.last_emit = Some(now);
		}
	}
}

impl ProgressTrait for ProgressLogDrain {
	fn new() -> Self {
		ProgressLogDrain {
			message: String::new(),
			max_value: 0,
			position: AtomicU64::new(0),
			last_emit: None,
		}
	}

	fn init(&mut self, message: &str, max_value: u64) {
		self.message = message.to_string();
		self.max_value = max_value;
		self.position.store(0, Ordering::Relaxed);
		self.last_emit = None;
	}

	fn set_position(&mut self, value: u64) {
		self.position.store(value, Ordering::Relaxed);
		self.maybe_emit();
	}

	fn inc(&mut self, value: u64) {
		self.position.fetch_add(value, Ordering::Relaxed);
		self.maybe_emit();
	}

	fn finish(&mut self) {
		log::info!("{}: done ({}/{})", self.message, self.max_value, self.max_value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn init_resets_position() {
		let mut p = ProgressLogDrain::new();
		p.init("ingest", 100);
		p.inc(10);
		assert_eq!(p.position.load(Ordering::Relaxed), 10);
		p.init("tiling", 50);
		assert_eq!(p.position.load(Ordering::Relaxed), 0);
	}
}
