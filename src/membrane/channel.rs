//! Membrane Channels
//!
//! Four kinds sit in the membrane: sodium and potassium, each as a leak
//! channel or a voltage-gated channel.
//!
//! ## Gated state machine
//!
//! ```text
//! Closed ──conductance > 0.1──► Opening ──≥ 0.99──► Open
//!                                  │                  │
//!                                  └──── falling ─────┴──► Inactivating ──► Closed
//! ```
//!
//! Openness follows the normalized conductance derived from the delayed
//! gating products (m³h for sodium, n⁴ for potassium). While inactivating,
//! a sodium channel's inactivation gate swings shut as the conductance
//! falls, then recovers over a fixed time before the channel reports
//! `Closed` again. Potassium channels have no inactivation gate and close
//! as soon as the conductance falls below the closed threshold.
//!
//! ## Transport
//!
//! A sufficiently open gated channel periodically asks for a crossing in its
//! natural direction (sodium inward, potassium outward). At most one particle
//! may be in transit per direction. Leak channels are drawn open but do not
//! move ions; the leak conductance lives in the integrator.

use super::CaptureZone;
use crate::config::SimConfig;
use crate::geometry::{polar, Vec2};
use crate::particles::{CrossingDirection, IonType, MembraneSide, Particle, ParticleId};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// m³h at which a sodium channel draws fully open
const SODIUM_FULL_CONDUCTANCE: f32 = 0.25;
/// n⁴ at which a potassium channel draws fully open
const POTASSIUM_FULL_CONDUCTANCE: f32 = 0.35;
const OPENING_THRESHOLD: f32 = 0.1;
const FULLY_OPEN_THRESHOLD: f32 = 0.99;
const CLOSED_THRESHOLD: f32 = 0.05;
/// Minimum openness before a channel moves ions
const CAPTURE_THRESHOLD: f32 = 0.3;
/// Sodium inactivation gate recovery (s)
const INACTIVATION_RECOVERY_TIME: f32 = 0.002;

/// Position of a channel in the membrane's channel list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelIndex(pub usize);

/// Channel variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    SodiumLeak,
    SodiumGated,
    PotassiumLeak,
    PotassiumGated,
}

impl ChannelKind {
    pub fn ion(self) -> IonType {
        match self {
            Self::SodiumLeak | Self::SodiumGated => IonType::Sodium,
            Self::PotassiumLeak | Self::PotassiumGated => IonType::Potassium,
        }
    }

    pub fn is_gated(self) -> bool {
        matches!(self, Self::SodiumGated | Self::PotassiumGated)
    }

    /// Direction the ion is driven by its gradient at rest
    pub fn natural_direction(self) -> CrossingDirection {
        match self.ion() {
            IonType::Sodium => CrossingDirection::Inward,
            IonType::Potassium => CrossingDirection::Outward,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SodiumLeak => "Na+ leak",
            Self::SodiumGated => "Na+ gated",
            Self::PotassiumLeak => "K+ leak",
            Self::PotassiumGated => "K+ gated",
        }
    }
}

/// Gated channel phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatingPhase {
    Closed,
    Opening,
    Open,
    Inactivating,
}

/// Gating products the channels read each tick, already delayed
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GatingInputs {
    pub m3h: f32,
    pub n4: f32,
}

/// A channel asking the lifecycle manager for a crossing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportRequest {
    pub channel: ChannelIndex,
    pub ion: IonType,
    pub direction: CrossingDirection,
    /// Free particle in the source zone to repurpose, if any
    pub candidate: Option<ParticleId>,
    /// Speed cap for the crossing (nm/s)
    pub max_velocity: f32,
}

/// Restorable channel state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MembraneChannelState {
    pub phase: GatingPhase,
    pub openness: f32,
    pub inactivation_amount: f32,
    pub previous_conductance: f32,
    pub recovery_remaining: f32,
    pub capture_countdown: f32,
}

/// One channel in the membrane
#[derive(Clone, Debug)]
pub struct MembraneChannel {
    // === Identity ===
    index: ChannelIndex,
    kind: ChannelKind,

    // === Geometry ===
    center: Vec2,
    /// Bearing of the outward normal (radians)
    rotation: f32,
    width: f32,
    height: f32,
    interior_zone: CaptureZone,
    exterior_zone: CaptureZone,

    // === Gating ===
    phase: GatingPhase,
    openness: f32,
    inactivation: f32,
    previous_conductance: f32,
    recovery_remaining: f32,

    // === Transport ===
    capture_countdown: f32,
    in_transit: [bool; 2],
    max_velocity: f32,
    min_capture_interval: f32,
    max_capture_interval: f32,
    leak_openness: f32,
}

impl MembraneChannel {
    /// Channel centered on the membrane at bearing `angle`
    pub fn new(index: ChannelIndex, kind: ChannelKind, angle: f32, config: &SimConfig) -> Self {
        let m = &config.membrane;
        let center = polar(m.radius, angle);
        let (interior_zone, exterior_zone) = if kind.is_gated() {
            (
                CaptureZone::wedge(center, angle + PI, m.capture_zone_radius, m.capture_zone_span),
                CaptureZone::wedge(center, angle, m.capture_zone_radius, m.capture_zone_span),
            )
        } else {
            (CaptureZone::Null, CaptureZone::Null)
        };

        let mut channel = Self {
            index,
            kind,
            center,
            rotation: angle,
            width: m.channel_width,
            height: m.channel_height,
            interior_zone,
            exterior_zone,
            phase: GatingPhase::Closed,
            openness: 0.0,
            inactivation: 0.0,
            previous_conductance: 0.0,
            recovery_remaining: 0.0,
            capture_countdown: 0.0,
            in_transit: [false; 2],
            max_velocity: config.particles.traversal_velocity,
            min_capture_interval: config.particles.min_capture_interval,
            max_capture_interval: config.particles.max_capture_interval,
            leak_openness: m.leak_openness,
        };
        channel.reset();
        channel
    }

    /// Back to the resting state with nothing in transit
    pub fn reset(&mut self) {
        if self.kind.is_gated() {
            self.phase = GatingPhase::Closed;
            self.openness = 0.0;
        } else {
            self.phase = GatingPhase::Open;
            self.openness = self.leak_openness;
        }
        self.inactivation = 0.0;
        self.previous_conductance = 0.0;
        self.recovery_remaining = 0.0;
        self.capture_countdown = 0.0;
        self.in_transit = [false; 2];
    }

    /// Advance gating by `dt` seconds and maybe ask for a crossing
    ///
    /// `particles` are the transient particles, scanned for a capture
    /// candidate in the source-side zone.
    pub fn step(
        &mut self,
        inputs: GatingInputs,
        dt: f32,
        particles: &[Particle],
    ) -> Option<TransportRequest> {
        if !self.kind.is_gated() {
            return None;
        }
        self.update_gating(inputs, dt);
        self.try_capture(dt, particles)
    }

    /// Normalized conductance in 0..=1 for this channel's ion
    fn normalized_conductance(&self, inputs: GatingInputs) -> f32 {
        let raw = match self.kind.ion() {
            IonType::Sodium => inputs.m3h / SODIUM_FULL_CONDUCTANCE,
            IonType::Potassium => inputs.n4 / POTASSIUM_FULL_CONDUCTANCE,
        };
        raw.clamp(0.0, 1.0)
    }

    fn update_gating(&mut self, inputs: GatingInputs, dt: f32) {
        let conductance = self.normalized_conductance(inputs);
        let falling = conductance < self.previous_conductance;

        match self.phase {
            GatingPhase::Closed => {
                self.openness = 0.0;
                if conductance > OPENING_THRESHOLD {
                    self.phase = GatingPhase::Opening;
                    self.openness = conductance;
                    self.capture_countdown = 0.0;
                }
            }
            GatingPhase::Opening => {
                self.openness = conductance;
                if conductance >= FULLY_OPEN_THRESHOLD {
                    self.phase = GatingPhase::Open;
                } else if falling {
                    self.phase = GatingPhase::Inactivating;
                    self.inactivate(conductance, dt);
                }
            }
            GatingPhase::Open => {
                self.openness = conductance;
                if falling {
                    self.phase = GatingPhase::Inactivating;
                    self.inactivate(conductance, dt);
                }
            }
            GatingPhase::Inactivating => self.inactivate(conductance, dt),
        }

        self.previous_conductance = conductance;
    }

    fn inactivate(&mut self, conductance: f32, dt: f32) {
        match self.kind.ion() {
            IonType::Sodium => self.inactivate_sodium(conductance, dt),
            IonType::Potassium => {
                self.openness = conductance;
                if conductance < CLOSED_THRESHOLD {
                    self.openness = 0.0;
                    self.phase = GatingPhase::Closed;
                }
            }
        }
    }

    fn inactivate_sodium(&mut self, conductance: f32, dt: f32) {
        if self.recovery_remaining > 0.0 {
            self.openness = 0.0;
            self.recovery_remaining -= dt;
            if self.recovery_remaining <= 0.0 {
                self.recovery_remaining = 0.0;
                self.inactivation = 0.0;
                self.phase = GatingPhase::Closed;
            } else {
                self.inactivation = self.recovery_remaining / INACTIVATION_RECOVERY_TIME;
            }
            return;
        }

        self.openness = conductance;
        self.inactivation = 1.0 - conductance;
        if conductance < CLOSED_THRESHOLD {
            self.openness = 0.0;
            self.inactivation = 1.0;
            self.recovery_remaining = INACTIVATION_RECOVERY_TIME;
        }
    }

    fn try_capture(&mut self, dt: f32, particles: &[Particle]) -> Option<TransportRequest> {
        if self.capture_countdown > 0.0 {
            self.capture_countdown -= dt;
        }

        let direction = self.kind.natural_direction();
        if self.openness < CAPTURE_THRESHOLD
            || self.in_transit[direction.slot()]
            || self.capture_countdown > 0.0
        {
            return None;
        }

        let ion = self.kind.ion();
        let scan = self
            .capture_zone(direction.source())
            .scan_for_capture(particles, ion);

        // Wider open and more crowded both shorten the wait
        let span = self.max_capture_interval - self.min_capture_interval;
        let interval = self.min_capture_interval + span * (1.0 - self.openness);
        self.capture_countdown = interval / (1 + scan.count_in_zone) as f32;

        Some(TransportRequest {
            channel: self.index,
            ion,
            direction,
            candidate: scan.closest_free,
            max_velocity: self.max_velocity,
        })
    }

    /// Mark a crossing as started in `direction`
    pub fn begin_traversal(&mut self, direction: CrossingDirection) {
        self.in_transit[direction.slot()] = true;
    }

    /// Mark a crossing as finished in `direction`
    pub fn end_traversal(&mut self, direction: CrossingDirection) {
        self.in_transit[direction.slot()] = false;
    }

    pub fn is_in_transit(&self, direction: CrossingDirection) -> bool {
        self.in_transit[direction.slot()]
    }

    /// Path from the source mouth through the channel to `exit_distance`
    /// past the destination mouth
    pub fn traversal_waypoints(&self, direction: CrossingDirection, exit_distance: f32) -> Vec<Vec2> {
        let outward = Vec2::from_angle(self.rotation);
        let normal = match direction {
            CrossingDirection::Inward => outward * -1.0,
            CrossingDirection::Outward => outward,
        };
        let half = self.height / 2.0;
        vec![
            self.center - normal * half,
            self.center + normal * half,
            self.center + normal * (half + exit_distance),
        ]
    }

    pub fn capture_zone(&self, side: MembraneSide) -> &CaptureZone {
        match side {
            MembraneSide::Interior => &self.interior_zone,
            MembraneSide::Exterior => &self.exterior_zone,
        }
    }

    /// Snapshot of the gating and transport timers
    pub fn state(&self) -> MembraneChannelState {
        MembraneChannelState {
            phase: self.phase,
            openness: self.openness,
            inactivation_amount: self.inactivation,
            previous_conductance: self.previous_conductance,
            recovery_remaining: self.recovery_remaining,
            capture_countdown: self.capture_countdown,
        }
    }

    /// Restore a snapshot; in-transit flags are cleared
    pub fn restore(&mut self, state: &MembraneChannelState) {
        self.phase = state.phase;
        self.openness = state.openness;
        self.inactivation = state.inactivation_amount;
        self.previous_conductance = state.previous_conductance;
        self.recovery_remaining = state.recovery_remaining;
        self.capture_countdown = state.capture_countdown;
        self.in_transit = [false; 2];
    }

    pub fn index(&self) -> ChannelIndex {
        self.index
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn phase(&self) -> GatingPhase {
        self.phase
    }

    /// 0 = closed, 1 = fully open
    pub fn openness(&self) -> f32 {
        self.openness
    }

    /// 0 = inactivation gate clear, 1 = fully blocking
    pub fn inactivation_amount(&self) -> f32 {
        self.inactivation
    }
}

/// Lay out the configured channel population evenly around the membrane
///
/// Kinds are interleaved so each kind is spread around the circle rather
/// than clumped together.
pub fn layout_channels(config: &SimConfig) -> Vec<MembraneChannel> {
    let m = &config.membrane;
    let quotas = [
        (ChannelKind::SodiumGated, m.sodium_gated_channels),
        (ChannelKind::PotassiumGated, m.potassium_gated_channels),
        (ChannelKind::SodiumLeak, m.sodium_leak_channels),
        (ChannelKind::PotassiumLeak, m.potassium_leak_channels),
    ];
    let total = m.channel_count();

    // Smooth weighted round-robin
    let mut credit = [0_i64; 4];
    let mut remaining: Vec<usize> = quotas.iter().map(|(_, n)| *n).collect();
    let mut channels = Vec::with_capacity(total);
    for i in 0..total {
        let mut pick = None;
        for (k, (_, quota)) in quotas.iter().enumerate() {
            if remaining[k] == 0 {
                continue;
            }
            credit[k] += *quota as i64;
            if pick.map_or(true, |p: usize| credit[k] > credit[p]) {
                pick = Some(k);
            }
        }
        let Some(k) = pick else { break };
        credit[k] -= total as i64;
        remaining[k] -= 1;

        let angle = 2.0 * PI * i as f32 / total as f32;
        channels.push(MembraneChannel::new(ChannelIndex(i), quotas[k].0, angle, config));
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{FadeStrategy, MotionStrategy, RandomWalk};

    fn gated(kind: ChannelKind) -> MembraneChannel {
        MembraneChannel::new(ChannelIndex(0), kind, 0.0, &SimConfig::default())
    }

    fn sodium(m3h: f32) -> GatingInputs {
        GatingInputs { m3h, n4: 0.0 }
    }

    fn potassium(n4: f32) -> GatingInputs {
        GatingInputs { m3h: 0.0, n4 }
    }

    const DT: f32 = 1.0e-5;

    #[test]
    fn test_sodium_cycle() {
        let mut channel = gated(ChannelKind::SodiumGated);
        assert_eq!(channel.phase(), GatingPhase::Closed);

        channel.step(sodium(0.01), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Closed);

        channel.step(sodium(0.05), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Opening);
        assert!((channel.openness() - 0.2).abs() < 1e-6);

        channel.step(sodium(0.25), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Open);
        assert_eq!(channel.openness(), 1.0);

        channel.step(sodium(0.2), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Inactivating);
        assert!(channel.inactivation_amount() > 0.0);

        channel.step(sodium(0.001), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Inactivating);
        assert_eq!(channel.openness(), 0.0);
        assert_eq!(channel.inactivation_amount(), 1.0);

        // Recovery takes INACTIVATION_RECOVERY_TIME regardless of inputs
        let steps = (INACTIVATION_RECOVERY_TIME / DT) as usize + 2;
        for _ in 0..steps {
            channel.step(sodium(0.001), DT, &[]);
        }
        assert_eq!(channel.phase(), GatingPhase::Closed);
        assert_eq!(channel.inactivation_amount(), 0.0);
    }

    #[test]
    fn test_potassium_closes_without_inactivation() {
        let mut channel = gated(ChannelKind::PotassiumGated);
        channel.step(potassium(0.2), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Opening);
        channel.step(potassium(0.3), DT, &[]);
        channel.step(potassium(0.1), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Inactivating);
        assert_eq!(channel.inactivation_amount(), 0.0);
        channel.step(potassium(0.01), DT, &[]);
        assert_eq!(channel.phase(), GatingPhase::Closed);
    }

    #[test]
    fn test_leak_channel_never_transports() {
        let mut channel = gated(ChannelKind::PotassiumLeak);
        assert_eq!(channel.phase(), GatingPhase::Open);
        assert_eq!(channel.openness(), SimConfig::default().membrane.leak_openness);
        for _ in 0..10 {
            assert!(channel.step(potassium(1.0), DT, &[]).is_none());
        }
        assert_eq!(*channel.capture_zone(MembraneSide::Interior), CaptureZone::Null);
    }

    #[test]
    fn test_open_channel_requests_with_candidate() {
        let mut channel = gated(ChannelKind::SodiumGated);
        let near = Particle::new(
            ParticleId(5),
            IonType::Sodium,
            channel.center() + Vec2::new(8.0, 0.0),
            1.0,
            MotionStrategy::RandomWalk(RandomWalk::new(MembraneSide::Exterior, false)),
            FadeStrategy::Null,
        );

        let request = channel.step(sodium(0.25), DT, &[near]).unwrap();
        assert_eq!(request.direction, CrossingDirection::Inward);
        assert_eq!(request.ion, IonType::Sodium);
        assert_eq!(request.candidate, Some(ParticleId(5)));
    }

    #[test]
    fn test_one_transit_per_direction() {
        let mut channel = gated(ChannelKind::PotassiumGated);
        let request = channel.step(potassium(0.35), DT, &[]).unwrap();
        assert_eq!(request.direction, CrossingDirection::Outward);
        channel.begin_traversal(request.direction);

        // Long enough for the capture countdown to run out several times
        for _ in 0..100 {
            assert!(channel.step(potassium(0.35), DT, &[]).is_none());
        }

        channel.end_traversal(CrossingDirection::Outward);
        assert!(channel.step(potassium(0.35), DT, &[]).is_some());
    }

    #[test]
    fn test_state_restore_clears_transit() {
        let mut channel = gated(ChannelKind::SodiumGated);
        channel.step(sodium(0.25), DT, &[]);
        let state = channel.state();

        channel.begin_traversal(CrossingDirection::Inward);
        channel.reset();
        channel.begin_traversal(CrossingDirection::Inward);
        channel.restore(&state);

        assert_eq!(channel.state(), state);
        assert!(!channel.is_in_transit(CrossingDirection::Inward));
    }

    #[test]
    fn test_traversal_waypoints_cross_membrane() {
        let config = SimConfig::default();
        let channel = gated(ChannelKind::SodiumGated);
        let path = channel.traversal_waypoints(CrossingDirection::Inward, 6.0);
        assert_eq!(path.len(), 3);
        assert!(path[0].length() > config.membrane.radius);
        assert!(path[2].length() < config.membrane.inner_surface());

        let path = channel.traversal_waypoints(CrossingDirection::Outward, 6.0);
        assert!(path[2].length() > config.membrane.outer_surface());
    }

    #[test]
    fn test_layout_interleaves_kinds() {
        let config = SimConfig::default();
        let channels = layout_channels(&config);
        assert_eq!(channels.len(), config.membrane.channel_count());

        let count = |kind| channels.iter().filter(|c| c.kind() == kind).count();
        assert_eq!(count(ChannelKind::SodiumGated), 20);
        assert_eq!(count(ChannelKind::PotassiumGated), 20);
        assert_eq!(count(ChannelKind::SodiumLeak), 3);
        assert_eq!(count(ChannelKind::PotassiumLeak), 7);

        // No long run of a single kind
        let longest_run = channels
            .windows(4)
            .filter(|w| w.iter().all(|c| c.kind() == w[0].kind()))
            .count();
        assert_eq!(longest_run, 0);

        for (i, channel) in channels.iter().enumerate() {
            assert_eq!(channel.index(), ChannelIndex(i));
            assert!((channel.center().length() - config.membrane.radius).abs() < 1e-3);
        }
    }
}
