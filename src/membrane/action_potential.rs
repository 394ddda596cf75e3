//! Traveling action potential
//!
//! A stimulus does not depolarize the cross-section directly. It launches a
//! pulse that travels along the axon for `travel_time`, stimulates the
//! integrator on arrival, then lingers at the cross-section for
//! `linger_time` before it is gone.

use crate::config::ActionPotentialConfig;
use serde::{Deserialize, Serialize};

/// Where the pulse is in its life
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionPotentialPhase {
    Traveling,
    Lingering,
    Absent,
}

/// Something that happened during `advance`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionPotentialEvent {
    None,
    /// Arrived at the cross-section this step
    ReachedCrossSection,
    /// Finished lingering this step
    Faded,
}

/// Drawing parameters for the pulse
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionPotentialShape {
    pub phase: ActionPotentialPhase,
    /// 0 at launch, 1 at the cross-section
    pub travel_fraction: f32,
    /// 0 on arrival, 1 when gone
    pub linger_fraction: f32,
}

impl ActionPotentialShape {
    pub const ABSENT: Self = Self {
        phase: ActionPotentialPhase::Absent,
        travel_fraction: 1.0,
        linger_fraction: 1.0,
    };
}

/// Pulse traveling along the axon toward the cross-section
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TravelingActionPotential {
    phase: ActionPotentialPhase,
    travel_time: f64,
    travel_countdown: f64,
    linger_time: f64,
    linger_countdown: f64,
}

impl TravelingActionPotential {
    pub fn new(config: &ActionPotentialConfig) -> Self {
        Self {
            phase: ActionPotentialPhase::Traveling,
            travel_time: config.travel_time,
            travel_countdown: config.travel_time,
            linger_time: config.linger_time,
            linger_countdown: config.linger_time,
        }
    }

    /// Advance by `dt` seconds
    pub fn advance(&mut self, dt: f64) -> ActionPotentialEvent {
        match self.phase {
            ActionPotentialPhase::Traveling => {
                self.travel_countdown = (self.travel_countdown - dt).max(0.0);
                if self.travel_countdown <= 0.0 {
                    self.phase = ActionPotentialPhase::Lingering;
                    ActionPotentialEvent::ReachedCrossSection
                } else {
                    ActionPotentialEvent::None
                }
            }
            ActionPotentialPhase::Lingering => {
                self.linger_countdown = (self.linger_countdown - dt).max(0.0);
                if self.linger_countdown <= 0.0 {
                    self.phase = ActionPotentialPhase::Absent;
                    ActionPotentialEvent::Faded
                } else {
                    ActionPotentialEvent::None
                }
            }
            ActionPotentialPhase::Absent => ActionPotentialEvent::None,
        }
    }

    pub fn phase(&self) -> ActionPotentialPhase {
        self.phase
    }

    pub fn shape(&self) -> ActionPotentialShape {
        let fraction = |remaining: f64, total: f64| {
            if total > 0.0 {
                (1.0 - remaining / total).clamp(0.0, 1.0) as f32
            } else {
                1.0
            }
        };
        ActionPotentialShape {
            phase: self.phase,
            travel_fraction: fraction(self.travel_countdown, self.travel_time),
            linger_fraction: fraction(self.linger_countdown, self.linger_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(travel_time: f64, linger_time: f64) -> ActionPotentialConfig {
        ActionPotentialConfig {
            travel_time,
            linger_time,
        }
    }

    #[test]
    fn test_travel_then_linger() {
        let mut ap = TravelingActionPotential::new(&config(0.002, 0.001));
        assert_eq!(ap.advance(0.001), ActionPotentialEvent::None);
        assert!((ap.shape().travel_fraction - 0.5).abs() < 1e-6);

        assert_eq!(ap.advance(0.001), ActionPotentialEvent::ReachedCrossSection);
        assert_eq!(ap.phase(), ActionPotentialPhase::Lingering);

        assert_eq!(ap.advance(0.0005), ActionPotentialEvent::None);
        assert_eq!(ap.advance(0.0006), ActionPotentialEvent::Faded);
        assert_eq!(ap.phase(), ActionPotentialPhase::Absent);
        assert_eq!(ap.advance(1.0), ActionPotentialEvent::None);
    }

    #[test]
    fn test_zero_travel_arrives_on_first_step() {
        let mut ap = TravelingActionPotential::new(&config(0.0, 0.0));
        assert_eq!(ap.advance(1.0e-5), ActionPotentialEvent::ReachedCrossSection);
        assert_eq!(ap.advance(1.0e-5), ActionPotentialEvent::Faded);
    }
}
