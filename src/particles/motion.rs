//! Motion strategies
//!
//! Each particle owns exactly one strategy, replaced wholesale when its
//! situation changes (captured, released, drifting away):
//!
//! - `RandomWalk`: diffusion on one side of the membrane, reflected off the
//!   membrane surface and, when confined, off the world edge
//! - `MembraneTraversal`: waypoint path through a channel at capped speed
//! - `Linear`: constant velocity, no bounds
//!
//! Strategies never touch the particle list. A finished traversal is
//! reported through `MotionOutcome` and the lifecycle manager reacts.

use super::{CrossingDirection, MembraneSide};
use crate::config::SimConfig;
use crate::geometry::{polar, Vec2};
use crate::membrane::ChannelIndex;
use rand::Rng;
use std::f32::consts::TAU;

/// Clearance kept between diffusing particles and the membrane (nm)
const SURFACE_CLEARANCE: f32 = 2.5;

/// Where free particles may diffuse
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffusionBounds {
    /// Interior particles stay within this radius
    pub interior_limit: f32,
    /// Exterior particles stay beyond this radius
    pub exterior_limit: f32,
    /// Confined exterior particles stay within this radius
    pub world_radius: f32,
    /// Membrane center line, separates the two sides
    pub membrane_radius: f32,
}

impl DiffusionBounds {
    pub fn from_config(config: &SimConfig) -> Self {
        let m = &config.membrane;
        Self {
            interior_limit: (m.inner_surface() - SURFACE_CLEARANCE).max(0.0),
            exterior_limit: m.outer_surface() + SURFACE_CLEARANCE,
            world_radius: m.world_radius,
            membrane_radius: m.radius,
        }
    }

    /// Side of the membrane a point lies on
    pub fn side_of(&self, point: Vec2) -> MembraneSide {
        if point.length() <= self.membrane_radius {
            MembraneSide::Interior
        } else {
            MembraneSide::Exterior
        }
    }
}

/// Everything a strategy needs besides its own state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionContext {
    pub bounds: DiffusionBounds,
    /// Random walk speed (nm/s)
    pub diffusion_speed: f32,
    pub min_turn_interval: f32,
    pub max_turn_interval: f32,
}

impl MotionContext {
    pub fn from_config(config: &SimConfig) -> Self {
        let p = &config.particles;
        Self {
            bounds: DiffusionBounds::from_config(config),
            diffusion_speed: p.diffusion_speed,
            min_turn_interval: p.min_direction_change_interval,
            max_turn_interval: p.max_direction_change_interval,
        }
    }
}

/// Result of advancing a strategy
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionOutcome {
    Moving,
    /// The final waypoint of a traversal was reached this step
    TraversalComplete {
        channel: ChannelIndex,
        direction: CrossingDirection,
    },
}

/// Diffusion confined to one side of the membrane
#[derive(Clone, Debug, PartialEq)]
pub struct RandomWalk {
    pub side: MembraneSide,
    /// Reflect off the world edge instead of drifting out of the simulation
    pub confined: bool,
    velocity: Vec2,
    time_to_turn: f32,
}

impl RandomWalk {
    /// New walk; a heading is picked on the first step
    pub fn new(side: MembraneSide, confined: bool) -> Self {
        Self {
            side,
            confined,
            velocity: Vec2::ZERO,
            time_to_turn: 0.0,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        position: &mut Vec2,
        dt: f32,
        ctx: &MotionContext,
        rng: &mut R,
    ) {
        self.time_to_turn -= dt;
        if self.time_to_turn <= 0.0 {
            let heading = rng.gen_range(0.0..TAU);
            self.velocity = polar(ctx.diffusion_speed, heading);
            self.time_to_turn = rng.gen_range(ctx.min_turn_interval..=ctx.max_turn_interval);
        }

        *position += self.velocity * dt;

        let bounds = &ctx.bounds;
        let r = position.length();
        let radial = position.normalize_or_zero();
        match self.side {
            MembraneSide::Interior => {
                if r > bounds.interior_limit {
                    *position = radial * bounds.interior_limit;
                    self.reflect(radial, true);
                }
            }
            MembraneSide::Exterior => {
                if r < bounds.exterior_limit {
                    // Dead center can only happen for a misplaced particle
                    let radial = if radial == Vec2::ZERO {
                        Vec2::new(1.0, 0.0)
                    } else {
                        radial
                    };
                    *position = radial * bounds.exterior_limit;
                    self.reflect(radial, false);
                } else if self.confined && r > bounds.world_radius {
                    *position = radial * bounds.world_radius;
                    self.reflect(radial, true);
                }
            }
        }
    }

    /// Mirror the radial velocity component when it points `outward` (or inward)
    fn reflect(&mut self, radial: Vec2, outward: bool) {
        let v_r = self.velocity.dot(radial);
        if (outward && v_r > 0.0) || (!outward && v_r < 0.0) {
            self.velocity = self.velocity - radial * (2.0 * v_r);
        }
    }
}

/// Waypoint path through a channel
#[derive(Clone, Debug, PartialEq)]
pub struct MembraneTraversal {
    waypoints: Vec<Vec2>,
    next: usize,
    max_velocity: f32,
    pub channel: ChannelIndex,
    pub direction: CrossingDirection,
}

impl MembraneTraversal {
    pub fn new(
        waypoints: Vec<Vec2>,
        max_velocity: f32,
        channel: ChannelIndex,
        direction: CrossingDirection,
    ) -> Self {
        Self {
            waypoints,
            next: 0,
            max_velocity,
            channel,
            direction,
        }
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Waypoints not yet reached
    pub fn remaining(&self) -> usize {
        self.waypoints.len().saturating_sub(self.next)
    }

    /// Returns true when the last waypoint is reached
    fn advance(&mut self, position: &mut Vec2, dt: f32) -> bool {
        let mut budget = self.max_velocity * dt.max(0.0);
        while let Some(&target) = self.waypoints.get(self.next) {
            let gap = target.distance(*position);
            if gap <= budget {
                *position = target;
                budget -= gap;
                self.next += 1;
            } else {
                *position += (target - *position).normalize_or_zero() * budget;
                return false;
            }
        }
        true
    }
}

/// Constant velocity drift
#[derive(Clone, Debug, PartialEq)]
pub struct LinearMotion {
    pub velocity: Vec2,
}

impl LinearMotion {
    pub fn new(velocity: Vec2) -> Self {
        Self { velocity }
    }
}

/// Per-particle motion behavior
#[derive(Clone, Debug, PartialEq)]
pub enum MotionStrategy {
    RandomWalk(RandomWalk),
    MembraneTraversal(MembraneTraversal),
    Linear(LinearMotion),
}

impl MotionStrategy {
    /// Move `position` by one step of `dt` seconds
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        position: &mut Vec2,
        dt: f32,
        ctx: &MotionContext,
        rng: &mut R,
    ) -> MotionOutcome {
        match self {
            Self::RandomWalk(walk) => {
                walk.advance(position, dt, ctx, rng);
                MotionOutcome::Moving
            }
            Self::MembraneTraversal(traversal) => {
                if traversal.advance(position, dt) {
                    MotionOutcome::TraversalComplete {
                        channel: traversal.channel,
                        direction: traversal.direction,
                    }
                } else {
                    MotionOutcome::Moving
                }
            }
            Self::Linear(linear) => {
                *position += linear.velocity * dt;
                MotionOutcome::Moving
            }
        }
    }

    pub fn is_traversal(&self) -> bool {
        matches!(self, Self::MembraneTraversal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context() -> MotionContext {
        MotionContext::from_config(&SimConfig::default())
    }

    #[test]
    fn test_interior_walk_stays_inside() {
        let ctx = context();
        let mut rng = StdRng::seed_from_u64(1);
        let mut motion = MotionStrategy::RandomWalk(RandomWalk::new(MembraneSide::Interior, false));
        let mut position = Vec2::new(60.0, 0.0);

        for _ in 0..5000 {
            motion.advance(&mut position, 1.0e-5, &ctx, &mut rng);
            assert!(position.length() <= ctx.bounds.interior_limit + 1e-3);
        }
    }

    #[test]
    fn test_confined_exterior_walk_stays_in_band() {
        let ctx = context();
        let mut rng = StdRng::seed_from_u64(2);
        let mut motion = MotionStrategy::RandomWalk(RandomWalk::new(MembraneSide::Exterior, true));
        let mut position = Vec2::new(0.0, 100.0);

        for _ in 0..5000 {
            motion.advance(&mut position, 1.0e-5, &ctx, &mut rng);
            let r = position.length();
            assert!(r >= ctx.bounds.exterior_limit - 1e-3);
            assert!(r <= ctx.bounds.world_radius + 1e-3);
        }
    }

    #[test]
    fn test_walk_speed_matches_config() {
        let ctx = context();
        let mut rng = StdRng::seed_from_u64(3);
        let mut walk = RandomWalk::new(MembraneSide::Interior, false);
        let mut position = Vec2::ZERO;
        walk.advance(&mut position, 1.0e-6, &ctx, &mut rng);
        assert!((walk.velocity().length() - ctx.diffusion_speed).abs() < 1.0);
    }

    #[test]
    fn test_traversal_follows_waypoints() {
        let ctx = context();
        let mut rng = StdRng::seed_from_u64(4);
        let waypoints = vec![Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let mut motion = MotionStrategy::MembraneTraversal(MembraneTraversal::new(
            waypoints,
            100.0,
            ChannelIndex(2),
            CrossingDirection::Inward,
        ));
        let mut position = Vec2::ZERO;

        // 5 nm per step; 20 nm of path
        for _ in 0..3 {
            assert_eq!(motion.advance(&mut position, 0.05, &ctx, &mut rng), MotionOutcome::Moving);
        }
        assert!((position.x - 10.0).abs() < 1e-4 && (position.y - 5.0).abs() < 1e-4);

        let outcome = motion.advance(&mut position, 0.05, &ctx, &mut rng);
        assert_eq!(
            outcome,
            MotionOutcome::TraversalComplete {
                channel: ChannelIndex(2),
                direction: CrossingDirection::Inward,
            }
        );
        assert_eq!(position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_linear_motion() {
        let ctx = context();
        let mut rng = StdRng::seed_from_u64(5);
        let mut motion = MotionStrategy::Linear(LinearMotion::new(Vec2::new(2.0, -1.0)));
        let mut position = Vec2::new(1.0, 1.0);
        motion.advance(&mut position, 0.5, &ctx, &mut rng);
        assert_eq!(position, Vec2::new(2.0, 0.5));
        assert!(!motion.is_traversal());
    }

    #[test]
    fn test_side_of() {
        let bounds = context().bounds;
        assert_eq!(bounds.side_of(Vec2::new(10.0, 0.0)), MembraneSide::Interior);
        assert_eq!(bounds.side_of(Vec2::new(0.0, -120.0)), MembraneSide::Exterior);
    }
}
