//! Progress reporting hooks for dataset loading and pipeline stages.
//!
//! Rendering lives elsewhere (`indicatif` bars in the CLI crates); library
//! code only talks to [`ProgressCallback`].

/// Receives progress updates from a long-running step.
pub trait ProgressCallback: Send + Sync {
    /// Total units of work, once known.
    fn set_total(&self, total: u64);

    /// Advance by `delta` units.
    fn inc(&self, delta: u64);

    fn set_message(&self, msg: String);

    /// Step finished; keep the indicator with a final message.
    fn finish(&self, msg: String);

    /// Step finished; remove the indicator.
    fn finish_and_clear(&self);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

