//! Axon Simulation - the boundary object
//!
//! `AxonSimulation` is what a front end holds: a `NeuronModel` behind a
//! record/playback controller, with read accessors for everything that gets
//! drawn. Mutating the model directly is not exposed; stimuli are refused
//! during playback.

use crate::config::SimConfig;
use crate::error::Result;
use crate::membrane::{ActionPotentialShape, MembraneChannel};
use crate::neuron::{Concentrations, NeuronModel, NeuronModelState};
use crate::particles::{IonType, MembraneSide, Particle, ParticlePlaybackMemento};
use crate::playback::{DataPoint, Mode, RecordAndPlayback};

/// Neuron model with record and playback
pub struct AxonSimulation {
    controller: RecordAndPlayback<NeuronModel>,
}

impl AxonSimulation {
    /// Build a resting simulation in live mode
    pub fn new(config: SimConfig) -> Result<Self> {
        let recording = config.recording.clone();
        let model = NeuronModel::new(config)?;
        Ok(Self {
            controller: RecordAndPlayback::new(model, recording),
        })
    }

    /// Advance by one clock tick of `dt` seconds
    pub fn step(&mut self, dt: f64) {
        self.controller.step(dt);
    }

    /// Launch an action potential; false during playback or while one is in progress
    pub fn stimulate(&mut self) -> bool {
        if self.controller.is_playback() {
            return false;
        }
        self.controller.model_mut().stimulate()
    }

    /// Rest state, empty history, time zero, live mode
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    // === Model readouts ===

    pub fn model(&self) -> &NeuronModel {
        self.controller.model()
    }

    /// Membrane potential (mV)
    pub fn membrane_voltage(&self) -> f32 {
        self.model().membrane_voltage()
    }

    /// Concentration (mM) of `ion` on `side`
    pub fn concentration(&self, ion: IonType, side: MembraneSide) -> f64 {
        self.model().concentration(ion, side)
    }

    pub fn concentrations(&self) -> Concentrations {
        self.model().concentrations()
    }

    pub fn channels(&self) -> &[MembraneChannel] {
        self.model().channels()
    }

    /// Live transient particles (empty during playback)
    pub fn particles(&self) -> &[Particle] {
        self.model().particles().transient_particles()
    }

    pub fn background_particles(&self) -> &[Particle] {
        self.model().particles().background_particles()
    }

    /// Transient particles as they should be drawn, live or played back
    pub fn displayed_particles(&self) -> Vec<ParticlePlaybackMemento> {
        self.model().displayed_particles()
    }

    pub fn action_potential(&self) -> ActionPotentialShape {
        self.model().action_potential()
    }

    pub fn is_ready_for_stimulus(&self) -> bool {
        !self.controller.is_playback() && self.model().is_ready_for_stimulus()
    }

    // === Record / playback ===

    pub fn set_mode_record(&mut self) {
        self.controller.set_mode_record();
    }

    pub fn set_mode_live(&mut self) {
        self.controller.set_mode_live();
    }

    pub fn set_playback(&mut self, speed: f64) -> Result<()> {
        self.controller.set_playback(speed)
    }

    pub fn set_time(&mut self, time: f64) -> Result<()> {
        self.controller.set_time(time)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.controller.rewind()
    }

    pub fn clear_history(&mut self) {
        self.controller.clear_history();
    }

    pub fn time(&self) -> f64 {
        self.controller.time()
    }

    pub fn min_recorded_time(&self) -> f64 {
        self.controller.min_recorded_time()
    }

    pub fn max_recorded_time(&self) -> f64 {
        self.controller.max_recorded_time()
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn is_playback(&self) -> bool {
        self.controller.is_playback()
    }

    pub fn is_record(&self) -> bool {
        self.controller.is_record()
    }

    pub fn is_live(&self) -> bool {
        self.controller.is_live()
    }

    pub fn is_recording_full(&self) -> bool {
        self.controller.is_recording_full()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.controller.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    pub fn history_len(&self) -> usize {
        self.controller.history_len()
    }

    pub fn data_point(&self, index: usize) -> Result<&DataPoint<NeuronModelState>> {
        self.controller.data_point(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NeuronError;

    fn sim() -> AxonSimulation {
        AxonSimulation::new(SimConfig::default()).unwrap()
    }

    fn frame(sim: &AxonSimulation) -> f64 {
        sim.model().config().frame_dt
    }

    #[test]
    fn test_record_rewind_replays_voltage() {
        let mut sim = sim();
        let dt = frame(&sim);
        sim.set_mode_record();
        assert!(sim.stimulate());

        let mut recorded = Vec::new();
        for _ in 0..300 {
            sim.step(dt);
            recorded.push(sim.membrane_voltage());
        }
        assert_eq!(sim.history_len(), 300);

        sim.rewind().unwrap();
        assert!(sim.is_playback());
        let mut replayed = vec![sim.membrane_voltage()];
        for _ in 1..300 {
            sim.step(dt);
            replayed.push(sim.membrane_voltage());
        }

        for (a, b) in recorded.iter().zip(&replayed) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
        assert!(!sim.is_paused());
        sim.step(dt);
        assert!(sim.is_paused());
    }

    #[test]
    fn test_playback_shows_recorded_particles() {
        let mut sim = sim();
        let dt = frame(&sim);
        sim.set_mode_record();
        sim.stimulate();
        for _ in 0..250 {
            sim.step(dt);
        }
        let live = sim.displayed_particles();

        sim.set_playback(1.0).unwrap();
        assert!(sim.particles().is_empty());
        assert_eq!(sim.displayed_particles(), live);
        assert_eq!(
            sim.data_point(sim.history_len() - 1).unwrap().state().particle_mementos,
            live
        );
    }

    #[test]
    fn test_stimulate_refused_in_playback() {
        let mut sim = sim();
        let dt = frame(&sim);
        sim.set_mode_record();
        sim.step(dt);
        sim.set_playback(1.0).unwrap();
        assert!(!sim.stimulate());
        assert!(!sim.is_ready_for_stimulus());

        sim.set_mode_live();
        assert!(sim.stimulate());
        assert!(!sim.stimulate());
    }

    #[test]
    fn test_recording_full() {
        let mut config = SimConfig::default();
        config.recording.max_record_points = 10;
        let mut sim = AxonSimulation::new(config).unwrap();
        let dt = frame(&sim);

        sim.set_mode_record();
        for _ in 0..25 {
            sim.step(dt);
        }
        assert!(sim.is_recording_full());
        assert_eq!(sim.history_len(), 10);
        assert!(sim.time() > sim.max_recorded_time());
    }

    #[test]
    fn test_live_then_record_after_scrubbing_keeps_time_order() {
        let mut sim = sim();
        let dt = frame(&sim);
        sim.set_mode_record();
        for _ in 0..10 {
            sim.step(dt);
        }
        sim.set_playback(1.0).unwrap();
        sim.set_time(4.0 * dt).unwrap();
        sim.set_mode_live();
        sim.set_mode_record();
        sim.step(dt);

        let times: Vec<f64> = (0..sim.history_len())
            .map(|i| sim.data_point(i).unwrap().time())
            .collect();
        assert_eq!(times.len(), 5);
        assert!(times.windows(2).all(|w| w[0] < w[1]), "{:?}", times);
        assert_eq!(sim.max_recorded_time(), times[4]);
    }

    #[test]
    fn test_errors() {
        let mut sim = sim();
        assert_eq!(sim.set_playback(1.0), Err(NeuronError::EmptyHistory));
        assert_eq!(sim.set_time(0.0), Err(NeuronError::NotInPlayback));
        assert!(matches!(
            sim.data_point(0),
            Err(NeuronError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_reset_returns_to_live_rest() {
        let mut sim = sim();
        let dt = frame(&sim);
        let rest = sim.concentrations();
        sim.set_mode_record();
        sim.stimulate();
        for _ in 0..600 {
            sim.step(dt);
        }
        sim.set_playback(-1.0).unwrap();
        sim.reset();

        assert!(sim.is_live());
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.history_len(), 0);
        assert_eq!(sim.concentrations(), rest);
        assert!(sim.is_ready_for_stimulus());
        assert!((sim.membrane_voltage() + 65.0).abs() < 1e-6);
    }
}
