//! Simulation Configuration
//!
//! Every tunable constant of the engine lives here and is handed to
//! constructors once. Nothing reads global state.
//!
//! Time values are seconds of *simulated* time. The membrane model runs in
//! milliseconds internally, so 0.001 s here is 1 ms of membrane time.
//! Distances are nanometers.

use crate::error::{NeuronError, Result};
use crate::membrane::ConductanceProfile;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::path::Path;

/// Axon cross-section geometry and channel population
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneConfig {
    /// Radius of the membrane circle (nm)
    pub radius: f32,
    /// Membrane thickness (nm)
    pub thickness: f32,
    /// Particles beyond this radius leave the simulation (nm)
    pub world_radius: f32,
    /// Number of voltage-gated sodium channels
    pub sodium_gated_channels: usize,
    /// Number of voltage-gated potassium channels
    pub potassium_gated_channels: usize,
    /// Number of sodium leak channels
    pub sodium_leak_channels: usize,
    /// Number of potassium leak channels
    pub potassium_leak_channels: usize,
    /// Channel extent along the membrane (nm)
    pub channel_width: f32,
    /// Channel extent through the membrane (nm)
    pub channel_height: f32,
    /// Capture zone reach from the channel center (nm)
    pub capture_zone_radius: f32,
    /// Capture zone angular span (radians)
    pub capture_zone_span: f32,
    /// Constant openness of leak channels
    pub leak_openness: f32,
}

impl Default for MembraneConfig {
    fn default() -> Self {
        Self {
            radius: 75.0,
            thickness: 4.0,
            world_radius: 180.0,
            sodium_gated_channels: 20,
            potassium_gated_channels: 20,
            sodium_leak_channels: 3,
            potassium_leak_channels: 7,
            channel_width: 8.0,
            channel_height: 8.0,
            capture_zone_radius: 15.0,
            capture_zone_span: 0.6 * std::f32::consts::PI,
            leak_openness: 0.5,
        }
    }
}

impl MembraneConfig {
    /// Total number of channels of all kinds
    pub fn channel_count(&self) -> usize {
        self.sodium_gated_channels
            + self.potassium_gated_channels
            + self.sodium_leak_channels
            + self.potassium_leak_channels
    }

    /// Innermost radius still counted as membrane
    pub fn inner_surface(&self) -> f32 {
        self.radius - self.thickness / 2.0
    }

    /// Outermost radius still counted as membrane
    pub fn outer_surface(&self) -> f32 {
        self.radius + self.thickness / 2.0
    }
}

/// Hodgkin-Huxley integrator settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Conductance preset
    pub profile: ConductanceProfile,
    /// Longest allowed integration sub-step (s)
    pub max_substep: f64,
    /// Depolarization applied by a stimulus (mV)
    pub stimulus_voltage: f32,
    /// Window after a stimulus during which further stimuli are ignored (s)
    pub refractory_period: f64,
    /// Lag applied to the gating products that drive channel visuals (s)
    pub gating_delay: f32,
    /// Samples kept per delayed gating product
    pub delay_buffer_capacity: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            profile: ConductanceProfile::Standard,
            max_substep: 1.0e-5,
            stimulus_voltage: 25.0,
            refractory_period: 0.02,
            gating_delay: 5.0e-5,
            delay_buffer_capacity: 64,
        }
    }
}

/// Particle population and transport settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Upper bound on simultaneously simulated transient particles
    pub max_transient_particles: usize,
    /// Decorative particles spread over both sides
    pub background_particle_count: usize,
    /// Random walk speed (nm/s)
    pub diffusion_speed: f32,
    /// Shortest interval between random walk direction changes (s)
    pub min_direction_change_interval: f32,
    /// Longest interval between random walk direction changes (s)
    pub max_direction_change_interval: f32,
    /// Velocity cap while crossing the membrane (nm/s)
    pub traversal_velocity: f32,
    /// How far past the channel mouth a traversal ends (nm)
    pub traversal_exit_distance: f32,
    /// Fade-in duration for captured particles (s)
    pub fade_in_time: f32,
    /// Fade-out duration after a completed traversal (s)
    pub fade_out_time: f32,
    /// Capture interval of a fully open channel (s)
    pub min_capture_interval: f32,
    /// Capture interval of a barely open channel (s)
    pub max_capture_interval: f32,
    /// Tally counts per millimolar of concentration
    pub counts_per_millimolar: f64,
    /// Nominal sodium concentration inside the axon (mM)
    pub sodium_interior_concentration: f64,
    /// Nominal sodium concentration outside the axon (mM)
    pub sodium_exterior_concentration: f64,
    /// Nominal potassium concentration inside the axon (mM)
    pub potassium_interior_concentration: f64,
    /// Nominal potassium concentration outside the axon (mM)
    pub potassium_exterior_concentration: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_transient_particles: 120,
            background_particle_count: 160,
            diffusion_speed: 40_000.0,
            min_direction_change_interval: 1.0e-4,
            max_direction_change_interval: 4.0e-4,
            traversal_velocity: 200_000.0,
            traversal_exit_distance: 6.0,
            fade_in_time: 5.0e-5,
            fade_out_time: 6.0e-4,
            min_capture_interval: 5.0e-5,
            max_capture_interval: 3.0e-4,
            counts_per_millimolar: 100.0,
            sodium_interior_concentration: 10.0,
            sodium_exterior_concentration: 145.0,
            potassium_interior_concentration: 140.0,
            potassium_exterior_concentration: 4.0,
        }
    }
}

/// Traveling action potential timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPotentialConfig {
    /// Time for the pulse to reach the cross-section (s)
    pub travel_time: f64,
    /// Time the pulse lingers at the cross-section after arrival (s)
    pub linger_time: f64,
}

impl Default for ActionPotentialConfig {
    fn default() -> Self {
        Self {
            travel_time: 0.002,
            linger_time: 0.0005,
        }
    }
}

/// What recording does once the history reaches capacity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Keep simulating but stop appending; `is_recording_full()` turns true
    #[default]
    StopRecording,
    /// Drop the oldest point to make room for each new one
    EvictOldest,
}

/// What playback does when it reaches the newest recorded point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndOfPlaybackPolicy {
    /// Pause the controller
    #[default]
    Pause,
    /// Switch to record mode and resume the physics from the last point
    Record,
}

/// Record/playback buffer settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Maximum number of recorded data points
    pub max_record_points: usize,
    pub overflow_policy: OverflowPolicy,
    pub end_of_playback: EndOfPlaybackPolicy,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_record_points: 5000,
            overflow_policy: OverflowPolicy::StopRecording,
            end_of_playback: EndOfPlaybackPolicy::Pause,
        }
    }
}

/// Full engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub membrane: MembraneConfig,
    pub integrator: IntegratorConfig,
    pub particles: ParticleConfig,
    pub action_potential: ActionPotentialConfig,
    pub recording: RecordingConfig,
    /// Seed for the particle random number generator
    pub seed: u64,
    /// Nominal clock tick (s); the outer clock may scale it
    pub frame_dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            membrane: MembraneConfig::default(),
            integrator: IntegratorConfig::default(),
            particles: ParticleConfig::default(),
            action_potential: ActionPotentialConfig::default(),
            recording: RecordingConfig::default(),
            seed: 7,
            frame_dt: 1.0 / 60.0 / 1000.0,
        }
    }
}

impl SimConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let m = &self.membrane;
        ensure(m.radius > 0.0, "membrane.radius must be positive")?;
        ensure(
            m.thickness > 0.0 && m.thickness < m.radius,
            "membrane.thickness must be positive and smaller than the radius",
        )?;
        ensure(
            m.world_radius > m.outer_surface() + m.capture_zone_radius,
            "membrane.world_radius must leave room for exterior capture zones",
        )?;
        ensure(
            m.channel_width > 0.0 && m.channel_height > 0.0,
            "membrane channel dimensions must be positive",
        )?;
        ensure(
            m.channel_count() as f32 * m.channel_width <= TAU * m.radius,
            "membrane channels do not fit around the circumference",
        )?;
        ensure(m.capture_zone_radius > 0.0, "membrane.capture_zone_radius must be positive")?;
        ensure(
            m.capture_zone_span > 0.0 && m.capture_zone_span <= TAU,
            "membrane.capture_zone_span must be within (0, 2π]",
        )?;
        ensure(
            (0.0..=1.0).contains(&m.leak_openness),
            "membrane.leak_openness must be within [0, 1]",
        )?;

        let i = &self.integrator;
        ensure(i.max_substep > 0.0, "integrator.max_substep must be positive")?;
        ensure(i.refractory_period >= 0.0, "integrator.refractory_period must not be negative")?;
        ensure(i.gating_delay >= 0.0, "integrator.gating_delay must not be negative")?;
        ensure(i.delay_buffer_capacity > 0, "integrator.delay_buffer_capacity must be positive")?;

        let p = &self.particles;
        ensure(p.diffusion_speed >= 0.0, "particles.diffusion_speed must not be negative")?;
        ensure(
            p.min_direction_change_interval > 0.0
                && p.min_direction_change_interval <= p.max_direction_change_interval,
            "particles direction change interval must satisfy 0 < min <= max",
        )?;
        ensure(p.traversal_velocity > 0.0, "particles.traversal_velocity must be positive")?;
        ensure(p.traversal_exit_distance >= 0.0, "particles.traversal_exit_distance must not be negative")?;
        ensure(
            p.fade_in_time > 0.0 && p.fade_out_time > 0.0,
            "particles fade times must be positive",
        )?;
        ensure(
            p.min_capture_interval >= 0.0 && p.min_capture_interval <= p.max_capture_interval,
            "particles capture interval must satisfy 0 <= min <= max",
        )?;
        ensure(p.counts_per_millimolar > 0.0, "particles.counts_per_millimolar must be positive")?;
        ensure(
            [
                p.sodium_interior_concentration,
                p.sodium_exterior_concentration,
                p.potassium_interior_concentration,
                p.potassium_exterior_concentration,
            ]
            .iter()
            .all(|c| *c >= 0.0),
            "particles concentrations must not be negative",
        )?;

        let ap = &self.action_potential;
        ensure(
            ap.travel_time >= 0.0 && ap.linger_time >= 0.0,
            "action_potential times must not be negative",
        )?;

        ensure(
            self.recording.max_record_points > 0,
            "recording.max_record_points must be positive",
        )?;
        ensure(self.frame_dt > 0.0, "frame_dt must be positive")?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(NeuronError::InvalidConfig(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_thick_membrane() {
        let mut config = SimConfig::default();
        config.membrane.thickness = 100.0;
        assert!(matches!(config.validate(), Err(NeuronError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_overcrowded_membrane() {
        let mut config = SimConfig::default();
        config.membrane.sodium_gated_channels = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_capture_interval() {
        let mut config = SimConfig::default();
        config.particles.min_capture_interval = 1.0;
        config.particles.max_capture_interval = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "seed": 42, "integrator": {{ "profile": "PotassiumBlocked" }} }}"#
        )
        .unwrap();

        let config = SimConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.integrator.profile, ConductanceProfile::PotassiumBlocked);
        // Untouched sections keep defaults
        assert_eq!(config.membrane, MembraneConfig::default());
        assert_eq!(config.integrator.max_substep, IntegratorConfig::default().max_substep);
    }

    #[test]
    fn test_load_invalid_json_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = SimConfig::from_json_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "frame_dt": 0.0 }}"#).unwrap();
        assert!(SimConfig::from_json_file(file.path()).is_err());
    }
}
