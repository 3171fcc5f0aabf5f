//! Test course and scripted input for the headless run

use foothold_game::LocomotionInput;
use foothold_physics::PhysicsWorld;
use glam::{Vec2, Vec3};
use tracing::info;

/// Where the player starts
pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// Build the course along -Z: flat ground, a gentle ramp, a curb, then a flight of stairs
pub fn build_course(physics: &mut PhysicsWorld) {
    physics.create_ground(0.0);

    // 8 degree ramp, its near edge buried in the ground
    physics.create_ramp(Vec3::new(1.5, 0.1, 2.0), Vec3::new(0.0, 0.18, -5.0), 8.0);

    // Curb between the ramp and the stairs, low enough to step over
    physics.create_static_box(Vec3::new(1.5, 0.05, 0.3), Vec3::new(0.0, 0.05, -7.8));

    let steps = physics.create_stairs(
        Vec3::new(0.0, 0.0, -9.0),
        Vec3::NEG_Z,
        Vec3::new(2.0, 0.15, 0.4),
        5,
    );

    physics.refresh_queries();
    info!(
        "Course built: {} colliders ({} stair steps)",
        physics.collider_set.len(),
        steps.len()
    );
}

/// One segment of the scripted input track
#[derive(Debug, Clone, Copy)]
pub struct ScriptSegment {
    pub label: &'static str,
    pub duration: f32,
    pub move_input: Vec2,
    pub sprint: bool,
    /// Press jump on the first frame of the segment
    pub jump: bool,
    pub camera_yaw: f32,
}

impl ScriptSegment {
    const fn idle(label: &'static str, duration: f32) -> Self {
        Self {
            label,
            duration,
            move_input: Vec2::ZERO,
            sprint: false,
            jump: false,
            camera_yaw: 0.0,
        }
    }

    const fn walk(label: &'static str, duration: f32, move_input: Vec2) -> Self {
        Self {
            move_input,
            ..Self::idle(label, duration)
        }
    }
}

/// Idle, walk over the ramp and up the stairs, drop off the top, jump, idle
pub const SCRIPT: &[ScriptSegment] = &[
    ScriptSegment::idle("settle", 1.0),
    ScriptSegment::walk("ramp", 1.8, Vec2::new(0.0, 1.0)),
    ScriptSegment::walk("stairs", 1.2, Vec2::new(0.0, 1.0)),
    ScriptSegment::walk("drop", 0.8, Vec2::new(0.0, 1.0)),
    ScriptSegment::idle("land", 1.5),
    ScriptSegment {
        jump: true,
        ..ScriptSegment::idle("jump", 2.0)
    },
    ScriptSegment {
        sprint: true,
        camera_yaw: std::f32::consts::PI,
        ..ScriptSegment::walk("return", 1.5, Vec2::new(0.0, 1.0))
    },
    ScriptSegment::idle("rest", 1.0),
];

/// Total scripted time in seconds
pub fn script_duration(script: &[ScriptSegment]) -> f32 {
    script.iter().map(|segment| segment.duration).sum()
}

/// Walks through a script as simulated time advances
#[derive(Debug, Clone)]
pub struct ScriptPlayer<'a> {
    script: &'a [ScriptSegment],
    index: usize,
    segment_start: f64,
    jump_pending: bool,
}

impl<'a> ScriptPlayer<'a> {
    pub fn new(script: &'a [ScriptSegment]) -> Self {
        Self {
            script,
            index: 0,
            segment_start: 0.0,
            jump_pending: script.first().is_some_and(|segment| segment.jump),
        }
    }

    pub fn current_label(&self) -> Option<&'static str> {
        self.script.get(self.index).map(|segment| segment.label)
    }

    /// Input for the step ending at `now`; `None` once the script is over
    pub fn input_at(&mut self, now: f64) -> Option<LocomotionInput> {
        while let Some(segment) = self.script.get(self.index) {
            if now - self.segment_start <= segment.duration as f64 {
                break;
            }
            self.segment_start += segment.duration as f64;
            self.index += 1;
            if let Some(next) = self.script.get(self.index) {
                info!("Script segment: {}", next.label);
                self.jump_pending = next.jump;
            }
        }

        let segment = self.script.get(self.index)?;
        let jump = std::mem::take(&mut self.jump_pending);
        Some(LocomotionInput {
            move_input: segment.move_input,
            sprint: segment.sprint,
            jump,
            camera_yaw: segment.camera_yaw,
            toggle_turn_in_place: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &[ScriptSegment] = &[
        ScriptSegment::idle("a", 1.0),
        ScriptSegment {
            jump: true,
            ..ScriptSegment::walk("b", 0.5, Vec2::new(0.0, 1.0))
        },
    ];

    #[test]
    fn test_script_duration() {
        assert!((script_duration(TRACK) - 1.5).abs() < 1e-6);
        assert!(script_duration(SCRIPT) > 10.0);
    }

    #[test]
    fn test_segments_advance_with_time() {
        let mut player = ScriptPlayer::new(TRACK);
        assert_eq!(player.input_at(0.5).unwrap().move_input, Vec2::ZERO);
        assert_eq!(player.current_label(), Some("a"));

        let walking = player.input_at(1.1).unwrap();
        assert_eq!(walking.move_input, Vec2::new(0.0, 1.0));
        assert!(walking.jump);
        assert!(!player.input_at(1.2).unwrap().jump);

        assert!(player.input_at(2.0).is_none());
        assert_eq!(player.current_label(), None);
    }

    #[test]
    fn test_course_has_stairs_and_ramp() {
        let mut physics = PhysicsWorld::new();
        build_course(&mut physics);
        // ground + ramp + curb + 5 steps
        assert_eq!(physics.collider_set.len(), 8);
    }
}
