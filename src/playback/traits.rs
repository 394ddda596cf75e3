//! Recordable - the seam between a model and the record/playback controller
//!
//! The controller never looks inside a model. It asks for a snapshot after
//! each recorded step and hands snapshots back during playback. What a
//! snapshot holds, and what "applying" one means, is the model's business.
//!
//! ## Contract
//!
//! - `capture_state` is a pure read
//! - `apply_playback_state` must make the model *look* exactly like the
//!   captured moment without running any physics
//! - `exit_playback` hands control back to the live model; the next
//!   `step_in_time` continues from whatever state was applied last

/// A model the record/playback controller can drive
pub trait Recordable {
    /// Everything needed to redraw one moment
    type State: Clone;

    /// Advance the live model by `dt` seconds
    fn step_in_time(&mut self, dt: f64);

    /// Snapshot the current moment
    fn capture_state(&self) -> Self::State;

    /// Show a previously captured moment
    fn apply_playback_state(&mut self, state: &Self::State);

    /// Leave playback and resume live simulation
    fn exit_playback(&mut self);

    /// Return to initial conditions
    fn reset(&mut self);
}
