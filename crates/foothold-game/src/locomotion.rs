//! Grounded state, gravity, jumping and step-down snapping
//!
//! Grounding is debounced: right after a jump the ground check is suppressed
//! for the minimum air time, and an ascending character is never grounded, so
//! geometry directly underfoot cannot cut a jump short.

use foothold_core::FrameTime;
use foothold_physics::{CharacterBody, CollisionQuery, LayerMask};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lowest accepted minimum air time between jumps
pub const MIN_JUMP_AIR_TIME_FLOOR: f32 = 0.6;

/// Locomotion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Vertical acceleration in m/s² (negative is down)
    pub gravity: f32,
    /// Apex height of a jump in meters
    pub jump_height: f32,
    /// Seconds after a jump before grounding or another jump is allowed
    pub min_jump_air_time: f32,
    /// Extra radius added to the ground check sphere
    pub ground_check_distance: f32,
    /// Layers that count as ground
    pub ground_mask: LayerMask,
    /// Seconds the character must stay grounded before it may jump
    pub settle_delay: f32,
    /// Upward speed still treated as "not ascending" for grounding
    pub ascending_tolerance: f32,
    /// Vertical velocity held while standing on the ground
    pub landing_velocity: f32,
    /// Gaps at or below this are left alone by step-down
    pub step_down_dead_zone: f32,
    /// Extra length added to the step-down cast
    pub step_down_margin: f32,
    /// Step-down sphere radius as a fraction of the capsule radius
    pub step_down_radius_scale: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            gravity: -15.0,
            jump_height: 2.0,
            min_jump_air_time: 1.0,
            ground_check_distance: 0.2,
            ground_mask: LayerMask::GROUND,
            settle_delay: 0.05,
            ascending_tolerance: 0.1,
            landing_velocity: -2.0,
            step_down_dead_zone: 0.02,
            step_down_margin: 0.1,
            step_down_radius_scale: 0.9,
        }
    }
}

impl LocomotionConfig {
    /// Clamp tunables to safe values
    pub fn sanitized(&self) -> Self {
        Self {
            gravity: self.gravity.min(-0.01),
            jump_height: self.jump_height.max(0.0),
            min_jump_air_time: self.min_jump_air_time.max(MIN_JUMP_AIR_TIME_FLOOR),
            ground_check_distance: self.ground_check_distance.max(0.0),
            ground_mask: self.ground_mask,
            settle_delay: self.settle_delay.max(0.0),
            ascending_tolerance: self.ascending_tolerance.max(0.0),
            landing_velocity: self.landing_velocity.min(0.0),
            step_down_dead_zone: self.step_down_dead_zone.max(0.0),
            step_down_margin: self.step_down_margin.max(0.0),
            step_down_radius_scale: self.step_down_radius_scale.clamp(0.01, 1.0),
        }
    }

    /// Launch speed that reaches `jump_height` under `gravity`
    pub fn jump_velocity(&self) -> f32 {
        (self.jump_height * -2.0 * self.gravity).sqrt()
    }
}

/// Capsule geometry needed by the ground queries, feet-anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleProbe {
    pub position: Vec3,
    pub radius: f32,
    pub step_offset: f32,
    pub skin_width: f32,
    /// Height the body settles at above a supporting surface
    pub rest_height: f32,
}

impl CapsuleProbe {
    /// Probe for a body moved by the character controller, which rests one skin width up
    pub fn from_body(body: &CharacterBody) -> Self {
        Self {
            position: body.position,
            radius: body.config.radius,
            step_offset: body.config.step_offset,
            skin_width: body.config.skin_width,
            rest_height: body.config.skin_width,
        }
    }

    /// Center of the bottom hemisphere
    pub fn bottom_center(&self) -> Vec3 {
        self.position + Vec3::Y * self.radius
    }
}

/// Grounding and jump bookkeeping for one character
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundedMotionState {
    pub is_grounded: bool,
    pub vertical_velocity: f32,
    /// When the current grounded streak began
    pub grounded_since: Option<f64>,
    pub last_jump_time: Option<f64>,
    /// Ground contacts are ignored before this time
    pub ground_check_suppressed_until: f64,
    /// Set by a jump; cleared once the character has settled after landing
    pub jump_locked: bool,
}

/// What one locomotion tick decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundedMotion {
    pub is_grounded: bool,
    pub vertical_velocity: f32,
    /// Downward snap the body should apply this frame
    pub step_down: Option<f32>,
    pub jumped: bool,
    pub landed: bool,
}

/// Gravity, jump and grounding state machine
#[derive(Debug, Clone)]
pub struct GroundedLocomotionState {
    config: LocomotionConfig,
    state: GroundedMotionState,
}

impl GroundedLocomotionState {
    pub fn new(config: LocomotionConfig) -> Self {
        let config = config.sanitized();
        debug!("Locomotion config | min_jump_air_time={:.2}", config.min_jump_air_time);
        Self {
            config,
            state: GroundedMotionState::default(),
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &GroundedMotionState {
        &self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.state.is_grounded
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.state.vertical_velocity
    }

    /// Forget velocity and timers, e.g. after a teleport
    pub fn reset(&mut self) {
        self.state = GroundedMotionState::default();
    }

    /// Run one frame: ground check, gravity, then the jump request
    pub fn tick<W: CollisionQuery + ?Sized>(
        &mut self,
        time: FrameTime,
        capsule: &CapsuleProbe,
        world: &W,
        jump_requested: bool,
    ) -> GroundedMotion {
        let was_grounded = self.state.is_grounded;
        let step_down = self.check_ground(time, capsule, world);
        let landed = !was_grounded && self.state.is_grounded;

        self.integrate_gravity(time.delta);

        let jumped = jump_requested && self.request_jump(time);

        GroundedMotion {
            is_grounded: self.state.is_grounded,
            vertical_velocity: self.state.vertical_velocity,
            step_down,
            jumped,
            landed,
        }
    }

    /// Update the grounded flag and return the step-down gap to close, if any
    pub fn check_ground<W: CollisionQuery + ?Sized>(
        &mut self,
        time: FrameTime,
        capsule: &CapsuleProbe,
        world: &W,
    ) -> Option<f32> {
        let config = &self.config;
        let state = &mut self.state;

        let ground_hit = world.overlap_sphere(
            capsule.bottom_center(),
            capsule.radius + config.ground_check_distance,
            config.ground_mask,
        );
        let allow_grounding = time.now >= state.ground_check_suppressed_until
            && state.vertical_velocity <= config.ascending_tolerance;
        let was_grounded = state.is_grounded;
        state.is_grounded = allow_grounding && ground_hit;

        if state.is_grounded {
            let since = *state.grounded_since.get_or_insert(time.now);
            if !was_grounded {
                debug!("Landed | velocity_y={:.2}", state.vertical_velocity);
            }
            if time.since(since) > config.settle_delay && air_time_satisfied(config, state, time) {
                state.jump_locked = false;
            }
        } else {
            state.grounded_since = None;
        }

        if state.is_grounded && state.vertical_velocity < 0.0 {
            state.vertical_velocity = config.landing_velocity;
        }

        if state.is_grounded && state.vertical_velocity <= 0.0 {
            self.step_down(capsule, world)
        } else {
            None
        }
    }

    /// Gap between the capsule bottom and the ground below, when it is worth snapping
    pub fn step_down<W: CollisionQuery + ?Sized>(&self, capsule: &CapsuleProbe, world: &W) -> Option<f32> {
        let config = &self.config;
        let length = capsule.step_offset + capsule.skin_width + config.step_down_margin;
        let hit = world.sphere_cast(
            capsule.bottom_center(),
            capsule.radius * config.step_down_radius_scale,
            Vec3::NEG_Y,
            length,
            config.ground_mask,
        )?;

        let gap = capsule.position.y - hit.point.y - capsule.rest_height;
        if gap > config.step_down_dead_zone && gap < capsule.step_offset {
            debug!("Step down | gap={:.3}m", gap);
            Some(gap)
        } else {
            None
        }
    }

    /// Apply gravity for one frame; runs whether grounded or not
    pub fn integrate_gravity(&mut self, delta_time: f32) {
        self.state.vertical_velocity += self.config.gravity * delta_time;
    }

    /// Whether a jump request would be granted right now
    pub fn can_jump(&self, time: FrameTime) -> bool {
        let state = &self.state;
        let settled = state
            .grounded_since
            .is_some_and(|since| time.since(since) > self.config.settle_delay);
        state.is_grounded && settled && !state.jump_locked && air_time_satisfied(&self.config, state, time)
    }

    /// Launch a jump if allowed; a refused request changes nothing
    pub fn request_jump(&mut self, time: FrameTime) -> bool {
        if !self.can_jump(time) {
            return false;
        }

        let config = &self.config;
        let state = &mut self.state;
        state.vertical_velocity = config.jump_velocity();
        state.last_jump_time = Some(time.now);
        state.ground_check_suppressed_until = time.now + config.min_jump_air_time as f64;
        state.is_grounded = false;
        state.grounded_since = None;
        state.jump_locked = true;
        debug!("Jump | velocity_y={:.2}", state.vertical_velocity);
        true
    }
}

fn air_time_satisfied(config: &LocomotionConfig, state: &GroundedMotionState, time: FrameTime) -> bool {
    state
        .last_jump_time
        .map_or(true, |last| time.since(last) > config.min_jump_air_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foothold_physics::GroundProbe;

    const DT: f32 = 1.0 / 60.0;

    /// Flat floor at `height`; `always_overlap` makes every overlap test hit
    struct Floor {
        height: Option<f32>,
        always_overlap: bool,
    }

    impl Floor {
        fn at(height: f32) -> Self {
            Self {
                height: Some(height),
                always_overlap: false,
            }
        }

        fn none() -> Self {
            Self {
                height: None,
                always_overlap: false,
            }
        }
    }

    impl CollisionQuery for Floor {
        fn raycast(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            mask: LayerMask,
        ) -> Option<GroundProbe> {
            self.sphere_cast(origin, 0.0, direction, max_distance, mask)
        }

        fn sphere_cast(
            &self,
            origin: Vec3,
            radius: f32,
            direction: Vec3,
            max_distance: f32,
            _mask: LayerMask,
        ) -> Option<GroundProbe> {
            let height = self.height?;
            if direction.y >= 0.0 {
                return None;
            }
            let distance = origin.y - radius - height;
            (distance >= 0.0 && distance <= max_distance).then(|| GroundProbe {
                point: Vec3::new(origin.x, height, origin.z),
                normal: Vec3::Y,
                distance,
            })
        }

        fn overlap_sphere(&self, center: Vec3, radius: f32, _mask: LayerMask) -> bool {
            self.always_overlap
                || self
                    .height
                    .is_some_and(|height| center.y - radius <= height)
        }
    }

    fn capsule_at(y: f32) -> CapsuleProbe {
        CapsuleProbe {
            position: Vec3::new(0.0, y, 0.0),
            radius: 0.5,
            step_offset: 0.3,
            skin_width: 0.08,
            rest_height: 0.0,
        }
    }

    fn frame(now: f64) -> FrameTime {
        FrameTime::new(now, DT)
    }

    /// Tick on the floor until grounded long enough to jump; returns the time reached
    fn settle(loco: &mut GroundedLocomotionState, floor: &Floor, start: f64) -> f64 {
        let mut now = start;
        for _ in 0..10 {
            now += DT as f64;
            loco.tick(frame(now), &capsule_at(0.0), floor, false);
        }
        now
    }

    #[test]
    fn test_config_defaults_and_floor() {
        let config = LocomotionConfig::default();
        assert_eq!(config.gravity, -15.0);
        assert_eq!(config.min_jump_air_time, 1.0);

        let config = LocomotionConfig {
            min_jump_air_time: 0.1,
            gravity: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.min_jump_air_time, MIN_JUMP_AIR_TIME_FLOOR);
        assert!(config.gravity < 0.0);
    }

    #[test]
    fn test_jump_velocity_reaches_apex() {
        let config = LocomotionConfig::default();
        let v = config.jump_velocity();
        let apex = v * v / (2.0 * -config.gravity);
        assert!((apex - config.jump_height).abs() < 1e-4);
    }

    #[test]
    fn test_free_fall_is_monotonic() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::none();
        let mut previous = loco.vertical_velocity();
        let mut now = 0.0;
        for i in 0..120 {
            let delta = if i % 2 == 0 { DT } else { DT * 0.5 };
            now += delta as f64;
            let motion = loco.tick(FrameTime::new(now, delta), &capsule_at(10.0), &floor, i % 7 == 0);
            assert!(!motion.is_grounded);
            assert!(!motion.jumped);
            assert!(motion.vertical_velocity < previous);
            previous = motion.vertical_velocity;
        }
    }

    #[test]
    fn test_landing_clamps_velocity() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);
        let motion = loco.tick(frame(0.1), &capsule_at(0.0), &floor, false);
        assert!(motion.is_grounded);
        assert!(motion.landed);
        // Resting velocity is zero here, so only gravity applies.
        assert!((motion.vertical_velocity + 15.0 * DT).abs() < 1e-5);

        // Clamp happens at the ground check, gravity is added afterwards.

        let motion = loco.tick(frame(0.2), &capsule_at(0.0), &floor, false);
        assert!(!motion.landed);
        assert!((motion.vertical_velocity - (-2.0 - 15.0 * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_jump_requires_settle_delay() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);

        // First grounded frame: grounded, but not settled.
        let motion = loco.tick(frame(2.0), &capsule_at(0.0), &floor, true);
        assert!(motion.is_grounded);
        assert!(!motion.jumped);
        assert!(motion.vertical_velocity < 0.0);

        let now = settle(&mut loco, &floor, 2.0);
        let motion = loco.tick(frame(now + DT as f64), &capsule_at(0.0), &floor, true);
        assert!(motion.jumped);
        assert!((motion.vertical_velocity - LocomotionConfig::default().jump_velocity()).abs() < 1e-5);
        assert!(!motion.is_grounded);
    }

    #[test]
    fn test_jump_refused_while_airborne() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::none();
        loco.tick(frame(1.0), &capsule_at(3.0), &floor, false);
        let before = loco.vertical_velocity();
        assert!(!loco.request_jump(frame(1.1)));
        assert_eq!(loco.vertical_velocity(), before);
    }

    #[test]
    fn test_grounding_suppressed_after_jump() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor {
            height: Some(0.0),
            always_overlap: true,
        };
        let mut now = settle(&mut loco, &floor, 0.0);
        now += DT as f64;
        assert!(loco.tick(frame(now), &capsule_at(0.0), &floor, true).jumped);
        let jump_time = now;

        // Overlap says "ground" every frame, yet the character stays airborne for the air time.
        while now + (DT as f64) < jump_time + 1.0 {
            now += DT as f64;
            let motion = loco.tick(frame(now), &capsule_at(0.0), &floor, false);
            assert!(!motion.is_grounded, "grounded {:.3}s after jump", now - jump_time);
        }
    }

    #[test]
    fn test_rejump_needs_air_time_and_settle() {
        let config = LocomotionConfig::default();
        let mut loco = GroundedLocomotionState::new(config.clone());
        let floor = Floor::at(0.0);
        let mut now = settle(&mut loco, &floor, 0.0);
        now += DT as f64;
        assert!(loco.request_jump(frame(now)));
        let jump_time = now;

        // Pretend the character dropped straight back down.
        let mut jumped_again_at = None;
        while now < jump_time + 3.0 {
            now += DT as f64;
            let motion = loco.tick(frame(now), &capsule_at(0.0), &floor, true);
            if motion.jumped {
                jumped_again_at = Some(now);
                break;
            }
        }

        let again = jumped_again_at.expect("second jump should be granted eventually");
        assert!(again - jump_time > config.min_jump_air_time as f64);
    }

    #[test]
    fn test_step_down_snaps_inside_window() {
        let loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);
        let gap = loco.step_down(&capsule_at(0.15), &floor).unwrap();
        assert!((gap - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_step_down_ignores_dead_zone_and_large_drops() {
        let loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);
        assert!(loco.step_down(&capsule_at(0.0), &floor).is_none());
        assert!(loco.step_down(&capsule_at(0.02), &floor).is_none());
        assert!(loco.step_down(&capsule_at(0.3), &floor).is_none());
        assert!(loco.step_down(&capsule_at(0.4), &floor).is_none());
    }

    #[test]
    fn test_step_down_measures_from_rest_height() {
        let loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);
        let resting = CapsuleProbe {
            rest_height: 0.08,
            ..capsule_at(0.08)
        };
        assert!(loco.step_down(&resting, &floor).is_none());

        let above_step = CapsuleProbe {
            rest_height: 0.08,
            ..capsule_at(0.28)
        };
        let gap = loco.step_down(&above_step, &floor).unwrap();
        assert!((gap - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_step_down_only_when_grounded_and_not_rising() {
        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let floor = Floor::at(0.0);
        let motion = loco.tick(frame(0.5), &capsule_at(0.1), &floor, false);
        assert!(motion.is_grounded);
        assert!(motion.step_down.is_some());

        let mut loco = GroundedLocomotionState::new(LocomotionConfig::default());
        let now = settle(&mut loco, &floor, 0.0);
        loco.request_jump(frame(now + DT as f64));
        let motion = loco.tick(frame(now + 2.0 * DT as f64), &capsule_at(0.1), &floor, false);
        assert!(motion.step_down.is_none());
    }
}
