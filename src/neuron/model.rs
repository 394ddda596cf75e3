//! Neuron Model - the axon cross-section as one simulated system
//!
//! Owns the integrator, the channels, the particles and the traveling
//! action potential, and advances them together.
//!
//! ## Tick order
//!
//! 1. Traveling action potential countdown; arrival stimulates the integrator
//! 2. Hodgkin-Huxley step
//! 3. Channels in index order, each reading the delayed gating products.
//!    A transport request is served immediately, so a later channel already
//!    sees an earlier channel's capture.
//! 4. Particle motion and fading
//! 5. Completed traversals: tallies move, channel in-transit flags clear
//!
//! Recording (the controller's job) happens after all of the above.

use super::snapshot::{AxonMembraneState, Concentrations, NeuronModelState};
use crate::config::SimConfig;
use crate::error::Result;
use crate::geometry::Vec2;
use crate::membrane::{
    layout_channels, ActionPotentialEvent, ActionPotentialShape, Conductances, GatingInputs,
    HodgkinHuxleyIntegrator, MembraneChannel, TravelingActionPotential,
};
use crate::particles::{
    IonType, MembraneSide, ParticleId, ParticleLifecycleManager, ParticlePlaybackMemento,
    PlaybackParticle,
};
use crate::playback::Recordable;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Axon cross-section model
#[derive(Clone, Debug)]
pub struct NeuronModel {
    config: SimConfig,

    // === Physics ===
    integrator: HodgkinHuxleyIntegrator,
    channels: Vec<MembraneChannel>,
    particles: ParticleLifecycleManager,
    traveling_action_potential: Option<TravelingActionPotential>,

    // === Playback ===
    playback_particles: Vec<PlaybackParticle>,
    playback_active: bool,

    rng: StdRng,
}

impl NeuronModel {
    /// Build a resting model; fails on an invalid config
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut particles = ParticleLifecycleManager::new(&config);
        particles.populate_background(&mut rng);

        log::debug!(
            "Neuron model: {} channels, profile {:?}",
            config.membrane.channel_count(),
            config.integrator.profile
        );

        Ok(Self {
            integrator: HodgkinHuxleyIntegrator::new(&config.integrator),
            channels: layout_channels(&config),
            particles,
            traveling_action_potential: None,
            playback_particles: Vec::new(),
            playback_active: false,
            rng,
            config,
        })
    }

    /// Advance the live model by `dt` seconds
    pub fn step_in_time(&mut self, dt: f64) {
        if dt <= 0.0 || self.playback_active {
            return;
        }
        let dt_f32 = dt as f32;

        if let Some(ap) = self.traveling_action_potential.as_mut() {
            match ap.advance(dt) {
                ActionPotentialEvent::ReachedCrossSection => {
                    let accepted = self.integrator.stimulate();
                    log::debug!("Action potential reached cross-section (stimulus accepted: {})", accepted);
                }
                ActionPotentialEvent::Faded => {
                    self.traveling_action_potential = None;
                }
                ActionPotentialEvent::None => {}
            }
        }

        self.integrator.step(dt);

        let delay = self.config.integrator.gating_delay;
        let inputs = GatingInputs {
            m3h: self.integrator.delayed_m3h(delay),
            n4: self.integrator.delayed_n4(delay),
        };
        for channel in self.channels.iter_mut() {
            let Some(request) = channel.step(inputs, dt_f32, self.particles.transient_particles())
            else {
                continue;
            };
            if let Some(id) =
                self.particles
                    .request_particle_through_channel(&request, channel, &mut self.rng)
            {
                channel.begin_traversal(request.direction);
                log::trace!(
                    "Channel {} captured {} {:?} ({:?})",
                    request.channel.0,
                    request.ion.symbol(),
                    id,
                    request.direction
                );
            }
        }

        let completed = self.particles.step(dt_f32, &mut self.rng);
        for traversal in &completed {
            if let Some(channel) = self.channels.get_mut(traversal.channel.0) {
                channel.end_traversal(traversal.direction);
            }
            log::trace!(
                "{} {:?} completed {:?} crossing",
                traversal.ion.symbol(),
                traversal.particle,
                traversal.direction
            );
        }
        self.particles.apply_traversals(&completed);
    }

    /// Launch an action potential toward the cross-section
    ///
    /// Returns false, changing nothing, while a pulse is already traveling
    /// or lingering, or the membrane is refractory.
    pub fn stimulate(&mut self) -> bool {
        if !self.is_ready_for_stimulus() {
            return false;
        }
        self.traveling_action_potential =
            Some(TravelingActionPotential::new(&self.config.action_potential));
        log::info!("Stimulus accepted, action potential launched");
        true
    }

    pub fn is_ready_for_stimulus(&self) -> bool {
        !self.playback_active
            && self.traveling_action_potential.is_none()
            && !self.integrator.is_refractory()
    }

    /// Back to rest with nominal concentrations and a fresh particle field
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.integrator.reset();
        for channel in &mut self.channels {
            channel.reset();
        }
        self.particles.reset(&mut self.rng);
        self.traveling_action_potential = None;
        self.playback_particles.clear();
        self.playback_active = false;
        log::info!("Neuron model reset");
    }

    /// Add a free ion at `position`; `None` when the particle cap is reached
    pub fn add_free_particle(&mut self, ion: IonType, position: Vec2) -> Option<ParticleId> {
        self.particles.add_free_particle(ion, position)
    }

    /// Override the integrator conductances until the next reset
    pub fn set_conductances(&mut self, conductances: Conductances) {
        self.integrator.set_conductances(conductances);
    }

    // === Readouts ===

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn integrator(&self) -> &HodgkinHuxleyIntegrator {
        &self.integrator
    }

    /// Membrane potential (mV)
    pub fn membrane_voltage(&self) -> f32 {
        self.integrator.membrane_voltage()
    }

    /// Concentration (mM) on one side of the membrane
    pub fn concentration(&self, ion: IonType, side: MembraneSide) -> f64 {
        self.particles.concentration(ion, side)
    }

    pub fn concentrations(&self) -> Concentrations {
        Concentrations {
            sodium_interior: self.concentration(IonType::Sodium, MembraneSide::Interior),
            sodium_exterior: self.concentration(IonType::Sodium, MembraneSide::Exterior),
            potassium_interior: self.concentration(IonType::Potassium, MembraneSide::Interior),
            potassium_exterior: self.concentration(IonType::Potassium, MembraneSide::Exterior),
        }
    }

    pub fn channels(&self) -> &[MembraneChannel] {
        &self.channels
    }

    pub fn particles(&self) -> &ParticleLifecycleManager {
        &self.particles
    }

    pub fn playback_particles(&self) -> &[PlaybackParticle] {
        &self.playback_particles
    }

    pub fn is_playback_active(&self) -> bool {
        self.playback_active
    }

    /// What should be drawn for the transient population right now
    pub fn displayed_particles(&self) -> Vec<ParticlePlaybackMemento> {
        if self.playback_active {
            self.playback_particles.iter().map(|p| p.memento()).collect()
        } else {
            self.particles
                .transient_particles()
                .iter()
                .map(|p| p.memento())
                .collect()
        }
    }

    pub fn action_potential(&self) -> ActionPotentialShape {
        self.traveling_action_potential
            .map_or(ActionPotentialShape::ABSENT, |ap| ap.shape())
    }
}

impl Recordable for NeuronModel {
    type State = NeuronModelState;

    fn step_in_time(&mut self, dt: f64) {
        NeuronModel::step_in_time(self, dt);
    }

    fn capture_state(&self) -> NeuronModelState {
        NeuronModelState {
            axon_membrane: AxonMembraneState {
                traveling_action_potential: self.traveling_action_potential,
            },
            hodgkin_huxley: self.integrator.state(),
            membrane_potential: self.integrator.membrane_voltage(),
            concentrations: self.concentrations(),
            tallies: self.particles.tallies(),
            channel_states: self.channels.iter().map(MembraneChannel::state).collect(),
            particle_mementos: self
                .particles
                .transient_particles()
                .iter()
                .map(|p| p.memento())
                .collect(),
        }
    }

    fn apply_playback_state(&mut self, state: &NeuronModelState) {
        if !self.playback_active {
            // Live particles cannot be reconstructed from mementos
            self.particles.clear_transient();
            self.playback_active = true;
        }

        self.traveling_action_potential = state.axon_membrane.traveling_action_potential;
        self.integrator.set_state(&state.hodgkin_huxley);
        self.particles.set_tallies(state.tallies);
        for (channel, channel_state) in self.channels.iter_mut().zip(&state.channel_states) {
            channel.restore(channel_state);
        }

        let mementos = &state.particle_mementos;
        self.playback_particles.truncate(mementos.len());
        for (particle, memento) in self.playback_particles.iter_mut().zip(mementos) {
            particle.restore_from_memento(memento);
        }
        let reused = self.playback_particles.len();
        self.playback_particles
            .extend(mementos[reused..].iter().map(PlaybackParticle::from_memento));
    }

    fn exit_playback(&mut self) {
        self.playback_active = false;
        self.playback_particles.clear();
    }

    fn reset(&mut self) {
        NeuronModel::reset(self);
    }
}
