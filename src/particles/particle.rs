//! Particles - ions drawn on either side of the membrane
//!
//! A live `Particle` carries its motion and fade strategies. Playback only
//! needs what is drawn, so snapshots store `ParticlePlaybackMemento` and
//! playback redraws `PlaybackParticle`s restored from them.

use super::{FadeStrategy, MotionStrategy};
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};

/// Ion species
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IonType {
    Sodium,
    Potassium,
}

impl IonType {
    /// Drawn radius (nm)
    pub fn radius(self) -> f32 {
        match self {
            Self::Sodium => 2.0,
            Self::Potassium => 2.4,
        }
    }

    /// Representation color
    pub fn color(self) -> Rgb {
        match self {
            Self::Sodium => Rgb::new(0, 204, 255),
            Self::Potassium => Rgb::new(90, 215, 50),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Sodium => "Na+",
            Self::Potassium => "K+",
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Sodium => 0,
            Self::Potassium => 1,
        }
    }
}

/// Side of the membrane
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembraneSide {
    Interior,
    Exterior,
}

impl MembraneSide {
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Interior => 0,
            Self::Exterior => 1,
        }
    }
}

/// Direction of a membrane crossing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingDirection {
    /// Exterior to interior
    Inward,
    /// Interior to exterior
    Outward,
}

impl CrossingDirection {
    /// Side the particle leaves
    pub fn source(self) -> MembraneSide {
        match self {
            Self::Inward => MembraneSide::Exterior,
            Self::Outward => MembraneSide::Interior,
        }
    }

    /// Side the particle arrives on
    pub fn destination(self) -> MembraneSide {
        match self {
            Self::Inward => MembraneSide::Interior,
            Self::Outward => MembraneSide::Exterior,
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Inward => 0,
            Self::Outward => 1,
        }
    }
}

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Stable particle identifier, never reused within a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Simulated ion
#[derive(Clone, Debug)]
pub struct Particle {
    pub(crate) id: ParticleId,
    pub(crate) ion: IonType,
    pub(crate) position: Vec2,
    pub(crate) opacity: f32,
    /// In transit through a channel
    pub(crate) captured: bool,
    pub(crate) motion: MotionStrategy,
    pub(crate) fade: FadeStrategy,
}

impl Particle {
    pub fn new(
        id: ParticleId,
        ion: IonType,
        position: Vec2,
        opacity: f32,
        motion: MotionStrategy,
        fade: FadeStrategy,
    ) -> Self {
        Self {
            id,
            ion,
            position,
            opacity: opacity.clamp(0.0, 1.0),
            captured: false,
            motion,
            fade,
        }
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    pub fn ion(&self) -> IonType {
        self.ion
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.ion.radius()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn color(&self) -> Rgb {
        self.ion.color()
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn motion(&self) -> &MotionStrategy {
        &self.motion
    }

    pub fn fade(&self) -> FadeStrategy {
        self.fade
    }

    /// Drawable state only
    pub fn memento(&self) -> ParticlePlaybackMemento {
        ParticlePlaybackMemento {
            position: self.position,
            opacity: self.opacity,
            ion: self.ion,
            radius: self.radius(),
            color: self.color(),
        }
    }
}

/// Compact drawable copy of a particle, stored in snapshots
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticlePlaybackMemento {
    pub position: Vec2,
    pub opacity: f32,
    pub ion: IonType,
    pub radius: f32,
    pub color: Rgb,
}

/// Particle redrawn during playback; never simulated
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackParticle {
    position: Vec2,
    opacity: f32,
    ion: IonType,
    radius: f32,
    color: Rgb,
}

impl PlaybackParticle {
    pub fn from_memento(memento: &ParticlePlaybackMemento) -> Self {
        Self {
            position: memento.position,
            opacity: memento.opacity,
            ion: memento.ion,
            radius: memento.radius,
            color: memento.color,
        }
    }

    /// Overwrite in place so playback can reuse its particle list
    pub fn restore_from_memento(&mut self, memento: &ParticlePlaybackMemento) {
        self.position = memento.position;
        self.opacity = memento.opacity;
        self.ion = memento.ion;
        self.radius = memento.radius;
        self.color = memento.color;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn ion(&self) -> IonType {
        self.ion
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn memento(&self) -> ParticlePlaybackMemento {
        ParticlePlaybackMemento {
            position: self.position,
            opacity: self.opacity,
            ion: self.ion,
            radius: self.radius,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{LinearMotion, RandomWalk};

    #[test]
    fn test_memento_round_trip() {
        let particle = Particle::new(
            ParticleId(3),
            IonType::Potassium,
            Vec2::new(12.5, -4.0),
            0.4,
            MotionStrategy::RandomWalk(RandomWalk::new(MembraneSide::Exterior, false)),
            FadeStrategy::FadeIn { duration: 0.1 },
        );

        let memento = particle.memento();
        let mut playback = PlaybackParticle::from_memento(&Particle::new(
            ParticleId(9),
            IonType::Sodium,
            Vec2::ZERO,
            1.0,
            MotionStrategy::Linear(LinearMotion::new(Vec2::ZERO)),
            FadeStrategy::Null,
        )
        .memento());
        playback.restore_from_memento(&memento);

        assert_eq!(playback.position(), particle.position());
        assert_eq!(playback.opacity(), particle.opacity());
        assert_eq!(playback.ion(), particle.ion());
        assert_eq!(playback.radius(), particle.radius());
        assert_eq!(playback.color(), particle.color());
        assert_eq!(playback.memento(), memento);
    }

    #[test]
    fn test_crossing_sides() {
        assert_eq!(CrossingDirection::Inward.source(), MembraneSide::Exterior);
        assert_eq!(CrossingDirection::Inward.destination(), MembraneSide::Interior);
        assert_eq!(CrossingDirection::Outward.source(), MembraneSide::Interior);
        assert_eq!(CrossingDirection::Outward.destination(), MembraneSide::Exterior);
    }

    #[test]
    fn test_opacity_clamped() {
        let particle = Particle::new(
            ParticleId(0),
            IonType::Sodium,
            Vec2::ZERO,
            3.0,
            MotionStrategy::Linear(LinearMotion::new(Vec2::ZERO)),
            FadeStrategy::Null,
        );
        assert_eq!(particle.opacity(), 1.0);
        assert_ne!(IonType::Sodium.color(), IonType::Potassium.color());
    }
}
