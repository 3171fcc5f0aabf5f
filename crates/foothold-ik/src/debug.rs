//! Diagnostics for the foot IK pass
//!
//! The solver never draws anything itself. It reports what it did to an
//! [`IkDebugObserver`]; [`DebugLines`] turns those reports into colored line
//! segments a renderer can draw, and [`FootDistanceLogger`] logs how far the
//! animated feet are from their goals.

use foothold_core::Color;
use glam::Vec3;
use tracing::info;

use crate::foot_ik::FootIkFrame;
use crate::rig::Side;

const HIT_CROSS: f32 = 0.05;
const TARGET_CROSS: f32 = 0.08;
const FOOT_MARKER: f32 = 0.1;
const OFFSET_EPSILON: f32 = 1e-3;

/// What happened under one foot this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootDebugSample {
    pub side: Side,
    pub ray_origin: Vec3,
    pub ray_length: f32,
    pub hit_point: Option<Vec3>,
    /// Ankle goal after pelvis compensation
    pub ik_target: Vec3,
    pub foot_position: Vec3,
}

/// Receives per-frame solver output
pub trait IkDebugObserver {
    fn foot(&mut self, sample: &FootDebugSample);

    fn pelvis(&mut self, _pelvis_position: Vec3, _offset: f32) {}
}

/// One colored line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
}

/// Collects debug lines for a single frame
#[derive(Debug, Clone, Default)]
pub struct DebugLines {
    pub lines: Vec<DebugLine>,
}

impl DebugLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn line(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.lines.push(DebugLine { start, end, color });
    }

    /// Horizontal cross centered on `at`
    pub fn cross(&mut self, at: Vec3, half_size: f32, color: Color) {
        self.line(at - Vec3::X * half_size, at + Vec3::X * half_size, color);
        self.line(at - Vec3::Z * half_size, at + Vec3::Z * half_size, color);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl IkDebugObserver for DebugLines {
    fn foot(&mut self, sample: &FootDebugSample) {
        let (hit_color, target_color, marker_color) = match sample.side {
            Side::Left => (Color::CYAN, Color::BLUE, Color::BLUE),
            Side::Right => (Color::MAGENTA, Color::RED, Color::RED),
        };

        match sample.hit_point {
            Some(hit) => {
                self.line(sample.ray_origin, hit, Color::GREEN);
                self.line(sample.foot_position, sample.ik_target, Color::YELLOW);
                self.cross(hit, HIT_CROSS, hit_color);
                self.cross(sample.ik_target, TARGET_CROSS, target_color);
            }
            None => {
                let end = sample.ray_origin + Vec3::NEG_Y * sample.ray_length;
                self.line(sample.ray_origin, end, Color::RED);
            }
        }

        self.line(
            sample.foot_position,
            sample.foot_position + Vec3::Y * FOOT_MARKER,
            marker_color,
        );
    }

    fn pelvis(&mut self, pelvis_position: Vec3, offset: f32) {
        if offset.abs() > OFFSET_EPSILON {
            self.line(
                pelvis_position,
                pelvis_position + Vec3::NEG_Y * offset.abs(),
                Color::WHITE,
            );
        }
    }
}

/// Logs the distance between each animated foot and its IK goal at a fixed interval
#[derive(Debug, Clone)]
pub struct FootDistanceLogger {
    interval: f32,
    timer: f32,
}

impl FootDistanceLogger {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            timer: 0.0,
        }
    }

    /// Advance the timer; returns the logged `(left, right)` distances when a line was emitted
    pub fn observe(&mut self, delta_time: f32, frame: &FootIkFrame) -> Option<(f32, f32)> {
        self.timer += delta_time;
        if self.timer < self.interval {
            return None;
        }
        self.timer = 0.0;

        let left = frame.left.foot_position.distance(frame.left.ik_target);
        let right = frame.right.foot_position.distance(frame.right.ik_target);
        info!("Foot IK distances L={:.3} R={:.3}", left, right);
        Some((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(side: Side, hit: bool) -> FootDebugSample {
        FootDebugSample {
            side,
            ray_origin: Vec3::new(0.0, 0.75, 0.0),
            ray_length: 1.5,
            hit_point: hit.then_some(Vec3::ZERO),
            ik_target: Vec3::new(0.0, 0.05, 0.0),
            foot_position: Vec3::new(0.0, 0.1, 0.0),
        }
    }

    #[test]
    fn test_hit_produces_ray_target_and_crosses() {
        let mut lines = DebugLines::new();
        lines.foot(&sample(Side::Left, true));
        // ray + foot-to-target + 2 crosses (2 lines each) + foot marker
        assert_eq!(lines.len(), 7);
        assert_eq!(lines.lines[0].color, Color::GREEN);
        assert_eq!(lines.lines[1].color, Color::YELLOW);
    }

    #[test]
    fn test_miss_draws_full_red_ray() {
        let mut lines = DebugLines::new();
        lines.foot(&sample(Side::Right, false));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.lines[0].color, Color::RED);
        assert!((lines.lines[0].end.y + 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_pelvis_line_only_when_offset() {
        let mut lines = DebugLines::new();
        lines.pelvis(Vec3::Y, 0.0);
        assert!(lines.is_empty());
        lines.pelvis(Vec3::Y, -0.1);
        assert_eq!(lines.len(), 1);
        assert!((lines.lines[0].end.y - 0.9).abs() < 1e-6);
        lines.clear();
        assert!(lines.is_empty());
    }
}
