//! Neuron model
//!
//! - `model`: the axon cross-section, stepping integrator, channels and particles together
//! - `snapshot`: recorded state for playback

pub mod model;
pub mod snapshot;

pub use model::NeuronModel;
pub use snapshot::{AxonMembraneState, Concentrations, NeuronModelState};
