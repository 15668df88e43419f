//! Best-effort progress reporting (§7: "Progress reporting is best-effort and
//! must not block the pipeline"). The zoom driver and the spooler report
//! through [`ProgressTrait`] without caring whether anything is listening.

mod dummy;
mod log_drain;

pub use dummy::ProgressDummy;
pub use log_drain::ProgressLogDrain;

/// Interface for progress indicators. Implementations must be cheap enough
/// to call from the hot loop of a tile worker and must never panic.
pub trait ProgressTrait: Send + Sync {
	fn new() -> Self
	where
		Self: Sized;
	fn init(&mut self, message: &str, max_value: u64);
	fn set_position(&mut self, value: u64);
	fn inc(&mut self, value: u64);
	fn finish(&mut self);
}

/// Returns the default progress indicator: a throttled log-line drain. A
/// caller embedding this crate in a UI can swap in its own implementation by
/// constructing a `TilingContext` with a different `Box<dyn ProgressTrait>`.
#[must_use]
pub fn get_progress(message: &str, max_value: u64) -> Box<dyn ProgressTrait> {
	let mut progress = ProgressLogDrain::new();
	progress.init(message, max_value);
	Box::new(progress)
}
