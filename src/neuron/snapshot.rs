//! Snapshot Types for Playback
//!
//! A `NeuronModelState` is everything needed to redraw one recorded moment
//! and, when recording resumes from it, to continue the physics. Particle
//! motion is not part of it: transient particles come back as drawable
//! mementos only, and background particles are not recorded at all.

use crate::membrane::{HodgkinHuxleyState, MembraneChannelState, TravelingActionPotential};
use crate::particles::{IonTallies, ParticlePlaybackMemento};
use serde::{Deserialize, Serialize};

/// Membrane-level state outside the integrator
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxonMembraneState {
    /// Pulse on its way to, or lingering at, the cross-section
    pub traveling_action_potential: Option<TravelingActionPotential>,
}

/// Concentrations derived from the tallies (mM)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Concentrations {
    pub sodium_interior: f64,
    pub sodium_exterior: f64,
    pub potassium_interior: f64,
    pub potassium_exterior: f64,
}

/// One recorded moment of the neuron model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronModelState {
    pub axon_membrane: AxonMembraneState,

    /// Full integrator state, delay buffers included
    pub hodgkin_huxley: HodgkinHuxleyState,

    /// Membrane potential at capture time (mV), duplicated for readouts
    pub membrane_potential: f32,

    pub concentrations: Concentrations,
    pub tallies: IonTallies,

    /// One entry per channel, in channel index order
    pub channel_states: Vec<MembraneChannelState>,

    /// Transient particles, drawable state only
    pub particle_mementos: Vec<ParticlePlaybackMemento>,
}
