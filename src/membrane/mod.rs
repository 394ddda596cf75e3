//! Axon membrane
//!
//! - `hodgkin_huxley`: membrane potential integrator with delayed gating products
//! - `delay_buffer`: bounded time-lagged scalar history
//! - `profiles`: named conductance presets
//! - `channel`: leak and gated channels with their gating state machine
//! - `capture_zone`: regions a channel draws ions from
//! - `action_potential`: pulse traveling toward the cross-section

pub mod action_potential;
pub mod capture_zone;
pub mod channel;
pub mod delay_buffer;
pub mod hodgkin_huxley;
pub mod profiles;

pub use action_potential::{
    ActionPotentialEvent, ActionPotentialPhase, ActionPotentialShape, TravelingActionPotential,
};
pub use capture_zone::{CaptureScan, CaptureZone, WedgeCaptureZone};
pub use channel::{
    layout_channels, ChannelIndex, ChannelKind, GatingInputs, GatingPhase, MembraneChannel,
    MembraneChannelState, TransportRequest,
};
pub use delay_buffer::DelayBuffer;
pub use hodgkin_huxley::{GatingVariables, HodgkinHuxleyIntegrator, HodgkinHuxleyState};
pub use profiles::{ConductanceProfile, Conductances};
