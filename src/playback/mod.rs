//! Record and playback
//!
//! - `traits`: the `Recordable` seam a model implements
//! - `controller`: Live / Record / Playback state machine over a bounded history

pub mod controller;
pub mod traits;

pub use controller::{DataPoint, Mode, RecordAndPlayback};
pub use traits::Recordable;
