use super::ProgressTrait;

/// No-op progress indicator, used in tests and embeddings that don't want
/// any output at all.
pub struct ProgressDummy {}

impl ProgressTrait for ProgressDummy {
	fn new() -> Self {
		ProgressDummy {}
	}
	fn init(&mut self, _message: &str, _max_value: u64) {}
	fn set_position(&mut self, _value: u64) {}
	fn inc(&mut self, _value: u64) {}
	fn finish(&mut self) {}
}
