//! Particle Lifecycle Manager
//!
//! Owns every live particle and the per-side ion tallies the concentration
//! readouts come from.
//!
//! ## Populations
//!
//! - **Transient**: particles that take part in transport. Created near a
//!   channel when it asks for a crossing (or added directly), fade out after
//!   their crossing and disappear. These are what snapshots record.
//! - **Background**: decorative particles diffusing on both sides, confined
//!   to the world. Not recorded; frozen while playback is active.
//!
//! ## Tallies
//!
//! Each ion has an interior and exterior count, seeded from the nominal
//! concentrations. Every completed traversal moves exactly one count from
//! the source side to the destination side, so the per-ion total never
//! changes.

use super::{
    CrossingDirection, FadeOutcome, FadeStrategy, IonType, MembraneSide, MembraneTraversal,
    MotionContext, MotionOutcome, MotionStrategy, Particle, ParticleId, RandomWalk,
};
use crate::config::{ParticleConfig, SimConfig};
use crate::geometry::{polar, Vec2};
use crate::membrane::{ChannelIndex, MembraneChannel, TransportRequest};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Ion counts per side, indexed by ion then side
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IonTallies {
    counts: [[u64; 2]; 2],
}

impl IonTallies {
    /// Seed from nominal concentrations
    pub fn from_config(config: &ParticleConfig) -> Self {
        let count = |mm: f64| (mm * config.counts_per_millimolar).round().max(0.0) as u64;
        let mut tallies = Self::default();
        tallies.set(IonType::Sodium, MembraneSide::Interior, count(config.sodium_interior_concentration));
        tallies.set(IonType::Sodium, MembraneSide::Exterior, count(config.sodium_exterior_concentration));
        tallies.set(IonType::Potassium, MembraneSide::Interior, count(config.potassium_interior_concentration));
        tallies.set(IonType::Potassium, MembraneSide::Exterior, count(config.potassium_exterior_concentration));
        tallies
    }

    pub fn count(&self, ion: IonType, side: MembraneSide) -> u64 {
        self.counts[ion.slot()][side.slot()]
    }

    pub fn set(&mut self, ion: IonType, side: MembraneSide, count: u64) {
        self.counts[ion.slot()][side.slot()] = count;
    }

    /// Interior plus exterior
    pub fn total(&self, ion: IonType) -> u64 {
        self.count(ion, MembraneSide::Interior) + self.count(ion, MembraneSide::Exterior)
    }

    /// Move one count across the membrane
    ///
    /// Returns false (and changes nothing) when the source side is empty.
    pub fn transfer(&mut self, ion: IonType, direction: CrossingDirection) -> bool {
        let source = direction.source().slot();
        let destination = direction.destination().slot();
        let counts = &mut self.counts[ion.slot()];
        if counts[source] == 0 {
            return false;
        }
        counts[source] -= 1;
        counts[destination] += 1;
        true
    }
}

/// A traversal that finished during the last `step`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedTraversal {
    pub particle: ParticleId,
    pub ion: IonType,
    pub channel: ChannelIndex,
    pub direction: CrossingDirection,
}

/// Owner of all live particles
#[derive(Clone, Debug)]
pub struct ParticleLifecycleManager {
    // === Populations ===
    transient: Vec<Particle>,
    background: Vec<Particle>,
    next_id: u64,

    // === Concentrations ===
    tallies: IonTallies,

    // === Settings ===
    config: ParticleConfig,
    context: MotionContext,
}

impl ParticleLifecycleManager {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            transient: Vec::with_capacity(config.particles.max_transient_particles),
            background: Vec::with_capacity(config.particles.background_particle_count),
            next_id: 0,
            tallies: IonTallies::from_config(&config.particles),
            config: config.particles.clone(),
            context: MotionContext::from_config(config),
        }
    }

    fn allocate_id(&mut self) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a free transient particle diffusing on whichever side `position` is
    ///
    /// Returns `None` when the transient population is at capacity.
    pub fn add_free_particle(&mut self, ion: IonType, position: Vec2) -> Option<ParticleId> {
        if self.transient.len() >= self.config.max_transient_particles {
            log::debug!("Transient particle cap reached, {} not added", ion.symbol());
            return None;
        }
        let side = self.context.bounds.side_of(position);
        let id = self.allocate_id();
        self.transient.push(Particle::new(
            id,
            ion,
            position,
            1.0,
            MotionStrategy::RandomWalk(RandomWalk::new(side, false)),
            FadeStrategy::Null,
        ));
        Some(id)
    }

    /// Start a particle crossing the membrane through `channel`
    ///
    /// Repurposes the request's candidate when it is still a free transient
    /// particle of the right ion. Otherwise spawns a new, fully transparent
    /// particle at a random point in the channel's source-side capture zone.
    /// Either way the particle is marked captured, fades in, and follows the
    /// channel's traversal path.
    ///
    /// Returns `None` when no particle could be provided (population cap,
    /// or a source zone with no area).
    pub fn request_particle_through_channel<R: Rng + ?Sized>(
        &mut self,
        request: &TransportRequest,
        channel: &MembraneChannel,
        rng: &mut R,
    ) -> Option<ParticleId> {
        let existing = request.candidate.and_then(|id| {
            self.transient
                .iter()
                .position(|p| p.id == id && p.ion == request.ion && !p.captured)
        });

        let index = match existing {
            Some(index) => index,
            None => {
                if self.transient.len() >= self.config.max_transient_particles {
                    log::debug!(
                        "Transient particle cap reached, channel {} transport dropped",
                        request.channel.0
                    );
                    return None;
                }
                let position = channel
                    .capture_zone(request.direction.source())
                    .random_point_in_zone(rng)?;
                let id = self.allocate_id();
                self.transient.push(Particle::new(
                    id,
                    request.ion,
                    position,
                    0.0,
                    MotionStrategy::RandomWalk(RandomWalk::new(request.direction.source(), false)),
                    FadeStrategy::Null,
                ));
                self.transient.len() - 1
            }
        };

        let exit_distance = self.config.traversal_exit_distance;
        let fade_in = FadeStrategy::FadeIn {
            duration: self.config.fade_in_time,
        };
        let particle = &mut self.transient[index];
        particle.captured = true;
        particle.motion = MotionStrategy::MembraneTraversal(MembraneTraversal::new(
            channel.traversal_waypoints(request.direction, exit_distance),
            request.max_velocity,
            request.channel,
            request.direction,
        ));
        particle.fade = fade_in;
        Some(particle.id)
    }

    /// Advance every particle by `dt` seconds
    ///
    /// Transient particles that finish a traversal are released into a random
    /// walk on the destination side and start fading out; they are returned
    /// so the caller can update tallies and channel bookkeeping. Particles
    /// that fade away or drift past the world edge are removed.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Vec<CompletedTraversal> {
        let ctx = self.context;
        let fade_out = FadeStrategy::FadeOut {
            duration: self.config.fade_out_time,
        };
        let mut completed = Vec::new();

        self.transient.retain_mut(|particle| {
            let outcome = particle.motion.advance(&mut particle.position, dt, &ctx, &mut *rng);
            if let MotionOutcome::TraversalComplete { channel, direction } = outcome {
                particle.captured = false;
                particle.motion =
                    MotionStrategy::RandomWalk(RandomWalk::new(direction.destination(), false));
                particle.fade = fade_out;
                completed.push(CompletedTraversal {
                    particle: particle.id,
                    ion: particle.ion,
                    channel,
                    direction,
                });
            }

            match particle.fade.update_opacity(&mut particle.opacity, dt) {
                FadeOutcome::Continue(next) => particle.fade = next,
                FadeOutcome::Vanished => return false,
            }

            particle.captured || particle.position.length() <= ctx.bounds.world_radius
        });

        for particle in &mut self.background {
            particle.motion.advance(&mut particle.position, dt, &ctx, &mut *rng);
        }

        completed
    }

    /// Move one tally count per completed traversal
    pub fn apply_traversals(&mut self, completed: &[CompletedTraversal]) {
        for traversal in completed {
            if !self.tallies.transfer(traversal.ion, traversal.direction) {
                log::warn!(
                    "{} traversal through channel {} with empty source tally",
                    traversal.ion.symbol(),
                    traversal.channel.0
                );
            }
        }
    }

    /// Replace the background population
    ///
    /// Each background ion lands on a side with probability proportional to
    /// its nominal concentration there.
    pub fn populate_background<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.background.clear();
        let bounds = self.context.bounds;
        for i in 0..self.config.background_particle_count {
            let ion = if i % 2 == 0 {
                IonType::Sodium
            } else {
                IonType::Potassium
            };
            let (interior, exterior) = match ion {
                IonType::Sodium => (
                    self.config.sodium_interior_concentration,
                    self.config.sodium_exterior_concentration,
                ),
                IonType::Potassium => (
                    self.config.potassium_interior_concentration,
                    self.config.potassium_exterior_concentration,
                ),
            };
            let total = interior + exterior;
            let exterior_share = if total > 0.0 { exterior / total } else { 0.5 };
            let side = if rng.gen_bool(exterior_share.clamp(0.0, 1.0)) {
                MembraneSide::Exterior
            } else {
                MembraneSide::Interior
            };

            // Area-uniform radius within the side's annulus
            let (r_min, r_max) = match side {
                MembraneSide::Interior => (0.0, bounds.interior_limit),
                MembraneSide::Exterior => (bounds.exterior_limit, bounds.world_radius),
            };
            let u: f32 = rng.gen();
            let r = (r_min * r_min + u * (r_max * r_max - r_min * r_min)).sqrt();
            let position = polar(r, rng.gen_range(0.0..TAU));

            let id = self.allocate_id();
            self.background.push(Particle::new(
                id,
                ion,
                position,
                1.0,
                MotionStrategy::RandomWalk(RandomWalk::new(side, true)),
                FadeStrategy::Null,
            ));
        }
    }

    /// Drop all transient particles
    pub fn clear_transient(&mut self) {
        self.transient.clear();
    }

    /// Back to nominal tallies with a fresh background
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.transient.clear();
        self.tallies = IonTallies::from_config(&self.config);
        self.populate_background(rng);
    }

    pub fn transient_particles(&self) -> &[Particle] {
        &self.transient
    }

    pub fn background_particles(&self) -> &[Particle] {
        &self.background
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.transient
            .iter()
            .chain(self.background.iter())
            .find(|p| p.id == id)
    }

    pub fn tallies(&self) -> IonTallies {
        self.tallies
    }

    pub fn set_tallies(&mut self, tallies: IonTallies) {
        self.tallies = tallies;
    }

    /// Concentration (mM) derived from the tally
    pub fn concentration(&self, ion: IonType, side: MembraneSide) -> f64 {
        self.tallies.count(ion, side) as f64 / self.config.counts_per_millimolar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membrane::ChannelKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sodium_channel(config: &SimConfig) -> MembraneChannel {
        MembraneChannel::new(ChannelIndex(0), ChannelKind::SodiumGated, 0.0, config)
    }

    fn inward_request(candidate: Option<ParticleId>) -> TransportRequest {
        TransportRequest {
            channel: ChannelIndex(0),
            ion: IonType::Sodium,
            direction: CrossingDirection::Inward,
            candidate,
            max_velocity: 200_000.0,
        }
    }

    #[test]
    fn test_tallies_from_nominal_concentrations() {
        let config = SimConfig::default();
        let manager = ParticleLifecycleManager::new(&config);
        assert_eq!(manager.tallies().count(IonType::Sodium, MembraneSide::Exterior), 14_500);
        assert!((manager.concentration(IonType::Potassium, MembraneSide::Interior) - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_transfer_conserves_total() {
        let mut tallies = IonTallies::default();
        tallies.set(IonType::Sodium, MembraneSide::Exterior, 2);
        assert!(tallies.transfer(IonType::Sodium, CrossingDirection::Inward));
        assert!(tallies.transfer(IonType::Sodium, CrossingDirection::Inward));
        assert!(!tallies.transfer(IonType::Sodium, CrossingDirection::Inward));
        assert_eq!(tallies.count(IonType::Sodium, MembraneSide::Interior), 2);
        assert_eq!(tallies.total(IonType::Sodium), 2);
    }

    #[test]
    fn test_request_repurposes_candidate() {
        let config = SimConfig::default();
        let mut manager = ParticleLifecycleManager::new(&config);
        let mut rng = StdRng::seed_from_u64(11);
        let channel = sodium_channel(&config);

        let id = manager
            .add_free_particle(IonType::Sodium, channel.center() + Vec2::new(8.0, 0.0))
            .unwrap();
        let granted = manager
            .request_particle_through_channel(&inward_request(Some(id)), &channel, &mut rng)
            .unwrap();

        assert_eq!(granted, id);
        assert_eq!(manager.transient_particles().len(), 1);
        let particle = manager.particle(id).unwrap();
        assert!(particle.is_captured());
        assert!(particle.motion().is_traversal());
        assert!(matches!(particle.fade(), FadeStrategy::FadeIn { .. }));
    }

    #[test]
    fn test_request_spawns_transparent_particle_in_zone() {
        let config = SimConfig::default();
        let mut manager = ParticleLifecycleManager::new(&config);
        let mut rng = StdRng::seed_from_u64(12);
        let channel = sodium_channel(&config);

        let id = manager
            .request_particle_through_channel(&inward_request(None), &channel, &mut rng)
            .unwrap();
        let particle = manager.particle(id).unwrap();
        assert_eq!(particle.opacity(), 0.0);
        assert!(channel
            .capture_zone(MembraneSide::Exterior)
            .is_point_in_zone(particle.position()));
    }

    #[test]
    fn test_traversal_completes_and_moves_tally() {
        let config = SimConfig::default();
        let mut manager = ParticleLifecycleManager::new(&config);
        let mut rng = StdRng::seed_from_u64(13);
        let channel = sodium_channel(&config);
        let before = manager.tallies();

        let id = manager
            .request_particle_through_channel(&inward_request(None), &channel, &mut rng)
            .unwrap();

        let mut completed = Vec::new();
        for _ in 0..100 {
            completed = manager.step(1.0e-5, &mut rng);
            if !completed.is_empty() {
                break;
            }
        }
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].particle, id);
        manager.apply_traversals(&completed);

        let after = manager.tallies();
        assert_eq!(
            after.count(IonType::Sodium, MembraneSide::Interior),
            before.count(IonType::Sodium, MembraneSide::Interior) + 1
        );
        assert_eq!(after.total(IonType::Sodium), before.total(IonType::Sodium));

        let particle = manager.particle(id).unwrap();
        assert!(!particle.is_captured());
        assert!(particle.position().length() < config.membrane.inner_surface());
        assert!(matches!(particle.fade(), FadeStrategy::FadeOut { .. }));
    }

    #[test]
    fn test_faded_particles_are_removed() {
        let config = SimConfig::default();
        let mut manager = ParticleLifecycleManager::new(&config);
        let mut rng = StdRng::seed_from_u64(14);
        let channel = sodium_channel(&config);

        manager
            .request_particle_through_channel(&inward_request(None), &channel, &mut rng)
            .unwrap();
        // Crossing plus fade-out is well under 5 ms
        for _ in 0..500 {
            manager.step(1.0e-5, &mut rng);
        }
        assert!(manager.transient_particles().is_empty());
    }

    #[test]
    fn test_transient_cap() {
        let mut config = SimConfig::default();
        config.particles.max_transient_particles = 2;
        let mut manager = ParticleLifecycleManager::new(&config);

        assert!(manager.add_free_particle(IonType::Sodium, Vec2::ZERO).is_some());
        assert!(manager.add_free_particle(IonType::Sodium, Vec2::ZERO).is_some());
        assert!(manager.add_free_particle(IonType::Sodium, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_background_population() {
        let config = SimConfig::default();
        let mut manager = ParticleLifecycleManager::new(&config);
        let mut rng = StdRng::seed_from_u64(15);
        manager.populate_background(&mut rng);

        assert_eq!(manager.background_particles().len(), config.particles.background_particle_count);
        let bounds = MotionContext::from_config(&config).bounds;
        for _ in 0..100 {
            manager.step(1.0e-5, &mut rng);
        }
        for particle in manager.background_particles() {
            let r = particle.position().length();
            assert!(r <= bounds.world_radius + 1e-3);
            assert!(r <= bounds.interior_limit + 1e-3 || r >= bounds.exterior_limit - 1e-3);
        }
    }
}
