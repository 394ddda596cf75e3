//! Capture zones - where a channel looks for ions to pull through
//!
//! A wedge hangs off each mouth of a gated channel: points within `radius`
//! of the channel center whose bearing is within half the `span` of the
//! wedge direction. Leak channels never transport and carry `Null` zones.

use crate::geometry::{angle_difference, polar, Vec2};
use crate::particles::{IonType, Particle, ParticleId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pie-slice region anchored at a channel center
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WedgeCaptureZone {
    pub origin: Vec2,
    /// Bearing of the wedge's center line (radians)
    pub rotation: f32,
    pub radius: f32,
    /// Full angular width (radians)
    pub span: f32,
}

/// Capture zone variants
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CaptureZone {
    Wedge(WedgeCaptureZone),
    /// Contains nothing
    Null,
}

/// Result of scanning particles against a zone
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureScan {
    /// Free particle of the requested ion nearest the zone origin
    pub closest_free: Option<ParticleId>,
    /// Free particles of the requested ion inside the zone
    pub count_in_zone: usize,
}

impl CaptureZone {
    pub fn wedge(origin: Vec2, rotation: f32, radius: f32, span: f32) -> Self {
        Self::Wedge(WedgeCaptureZone {
            origin,
            rotation,
            radius,
            span,
        })
    }

    pub fn is_point_in_zone(&self, point: Vec2) -> bool {
        match self {
            Self::Null => false,
            Self::Wedge(w) => {
                let offset = point - w.origin;
                let distance = offset.length();
                if distance > w.radius {
                    return false;
                }
                distance <= f32::EPSILON
                    || angle_difference(offset.to_angle(), w.rotation).abs() <= w.span / 2.0
            }
        }
    }

    pub fn origin(&self) -> Option<Vec2> {
        match self {
            Self::Wedge(w) => Some(w.origin),
            Self::Null => None,
        }
    }

    /// Find uncaptured `ion` particles inside the zone
    ///
    /// Ties on distance keep the earlier particle.
    pub fn scan_for_capture(&self, particles: &[Particle], ion: IonType) -> CaptureScan {
        let Some(origin) = self.origin() else {
            return CaptureScan::default();
        };

        let mut scan = CaptureScan::default();
        let mut best = f32::INFINITY;
        for particle in particles {
            if particle.is_captured() || particle.ion() != ion {
                continue;
            }
            if !self.is_point_in_zone(particle.position()) {
                continue;
            }
            scan.count_in_zone += 1;
            let distance = particle.position().distance(origin);
            if distance < best {
                best = distance;
                scan.closest_free = Some(particle.id());
            }
        }
        scan
    }

    /// Random point in the outer half of the wedge; `None` for `Null`
    pub fn random_point_in_zone<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        match self {
            Self::Null => None,
            Self::Wedge(w) => {
                let half = w.span / 2.0;
                let bearing = w.rotation + rng.gen_range(-half..=half);
                let distance = rng.gen_range(w.radius * 0.5..=w.radius);
                Some(w.origin + polar(distance, bearing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{FadeStrategy, LinearMotion, MotionStrategy};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    fn free(id: u64, ion: IonType, position: Vec2) -> Particle {
        Particle::new(
            ParticleId(id),
            ion,
            position,
            1.0,
            MotionStrategy::Linear(LinearMotion::new(Vec2::ZERO)),
            FadeStrategy::Null,
        )
    }

    fn zone() -> CaptureZone {
        // Opens along +x from (10, 0)
        CaptureZone::wedge(Vec2::new(10.0, 0.0), 0.0, 5.0, PI / 2.0)
    }

    #[test]
    fn test_point_in_wedge() {
        let zone = zone();
        assert!(zone.is_point_in_zone(Vec2::new(13.0, 0.0)));
        assert!(zone.is_point_in_zone(Vec2::new(12.0, 1.0)));
        // Behind the origin
        assert!(!zone.is_point_in_zone(Vec2::new(8.0, 0.0)));
        // Outside the span
        assert!(!zone.is_point_in_zone(Vec2::new(10.5, 3.0)));
        // Too far
        assert!(!zone.is_point_in_zone(Vec2::new(16.0, 0.0)));
    }

    #[test]
    fn test_null_zone_contains_nothing() {
        let zone = CaptureZone::Null;
        assert!(!zone.is_point_in_zone(Vec2::ZERO));
        assert_eq!(zone.origin(), None);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(zone.random_point_in_zone(&mut rng), None);
    }

    #[test]
    fn test_scan_picks_closest_matching_ion() {
        let zone = zone();
        let mut captured = free(1, IonType::Sodium, Vec2::new(11.0, 0.0));
        captured.captured = true;
        let particles = vec![
            captured,
            free(2, IonType::Potassium, Vec2::new(11.5, 0.0)),
            free(3, IonType::Sodium, Vec2::new(14.0, 0.0)),
            free(4, IonType::Sodium, Vec2::new(12.0, 0.0)),
            free(5, IonType::Sodium, Vec2::new(30.0, 0.0)),
        ];

        let scan = zone.scan_for_capture(&particles, IonType::Sodium);
        assert_eq!(scan.closest_free, Some(ParticleId(4)));
        assert_eq!(scan.count_in_zone, 2);
    }

    #[test]
    fn test_scan_tie_keeps_first() {
        let zone = zone();
        let particles = vec![
            free(7, IonType::Sodium, Vec2::new(12.0, 1.0)),
            free(8, IonType::Sodium, Vec2::new(12.0, -1.0)),
        ];
        let scan = zone.scan_for_capture(&particles, IonType::Sodium);
        assert_eq!(scan.closest_free, Some(ParticleId(7)));
    }

    #[test]
    fn test_random_points_land_in_zone() {
        let zone = zone();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let point = zone.random_point_in_zone(&mut rng).unwrap();
            // Allow for rounding on the wedge edges
            let origin = zone.origin().unwrap();
            assert!(point.distance(origin) <= 5.0 + 1e-4);
            assert!(point.distance(origin) >= 2.5 - 1e-4);
        }
    }
}
