//! # Axonsim - Axon Membrane Electrophysiology
//!
//! A cross-section of an axon: a circular membrane studded with sodium and
//! potassium channels, ions diffusing on both sides, and a Hodgkin-Huxley
//! integrator driving the membrane potential.
//!
//! ## Core Components
//!
//! - **HodgkinHuxleyIntegrator**: membrane voltage with sub-stepped HH kinetics
//!   and time-delayed gating products
//! - **MembraneChannel**: leak and voltage-gated channels that capture ions and
//!   pull them across the membrane
//! - **ParticleLifecycleManager**: ion particles and the per-side tallies that
//!   concentrations derive from
//! - **RecordAndPlayback**: Live / Record / Playback over a bounded history of
//!   model snapshots
//! - **AxonSimulation**: the whole thing behind one boundary object
//!
//! ## Units
//!
//! - Time: seconds of simulated time (the HH kinetics run in ms internally)
//! - Distance: nanometers
//! - Voltage: millivolts
//! - Concentration: millimolar
//!
//! ## Example
//!
//! ```no_run
//! use axonsim::{AxonSimulation, SimConfig};
//!
//! let config = SimConfig::default();
//! let dt = config.frame_dt;
//! let mut sim = AxonSimulation::new(config)?;
//!
//! sim.set_mode_record();
//! sim.stimulate();
//! for _ in 0..600 {
//!     sim.step(dt);
//! }
//! println!("V = {:.2} mV", sim.membrane_voltage());
//!
//! // Scrub back through the recording
//! sim.rewind()?;
//! sim.step(dt);
//! # Ok::<(), axonsim::NeuronError>(())
//! ```

// Configuration
pub mod config;
pub use config::{
    ActionPotentialConfig, EndOfPlaybackPolicy, IntegratorConfig, MembraneConfig,
    OverflowPolicy, ParticleConfig, RecordingConfig, SimConfig,
};

// Error types
mod error;
pub use error::{NeuronError, Result};

// Planar geometry
pub mod geometry;
pub use geometry::Vec2;

// Membrane: integrator, channels, capture zones, traveling action potential
pub mod membrane;
pub use membrane::{
    ActionPotentialShape, CaptureZone, ChannelIndex, ChannelKind, ConductanceProfile,
    Conductances, DelayBuffer, GatingPhase, HodgkinHuxleyIntegrator, HodgkinHuxleyState,
    MembraneChannel, MembraneChannelState, TravelingActionPotential,
};

// Particles
pub mod particles;
pub use particles::{
    CrossingDirection, FadeStrategy, IonType, MembraneSide, MotionStrategy, Particle,
    ParticleId, ParticleLifecycleManager, ParticlePlaybackMemento, PlaybackParticle,
};

// Record and playback
pub mod playback;
pub use playback::{DataPoint, Mode, RecordAndPlayback, Recordable};

// Neuron model
pub mod neuron;
pub use neuron::{NeuronModel, NeuronModelState};

// Boundary object
pub mod sim;
pub use sim::AxonSimulation;
