//! Ion particles
//!
//! - `particle`: particle, ion species, playback mementos
//! - `motion`: random walk, membrane traversal and linear motion strategies
//! - `fade`: opacity strategies
//! - `manager`: lifecycle and per-side ion tallies

pub mod fade;
pub mod manager;
pub mod motion;
pub mod particle;

pub use fade::{FadeOutcome, FadeStrategy};
pub use manager::{CompletedTraversal, IonTallies, ParticleLifecycleManager};
pub use motion::{
    DiffusionBounds, LinearMotion, MembraneTraversal, MotionContext, MotionOutcome,
    MotionStrategy, RandomWalk,
};
pub use particle::{
    CrossingDirection, IonType, MembraneSide, Particle, ParticleId, ParticlePlaybackMemento,
    PlaybackParticle, Rgb,
};
