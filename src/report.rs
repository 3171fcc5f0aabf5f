//! Summary of a scripted run

use std::fs;
use std::path::Path;

use anyhow::Context;
use foothold_game::AnimatorParams;
use foothold_ik::FootIkFrame;
use serde::Serialize;

/// What happened during a run, printed as JSON at the end
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub frames: u64,
    pub simulated_seconds: f64,
    pub jumps: u32,
    pub step_downs: u32,
    pub grounded_frames: u64,
    /// Frames where the character controller reported floor contact
    pub floor_contact_frames: u64,
    pub final_position: [f32; 3],
    /// Deepest pelvis drop seen (meters, never positive)
    pub min_pelvis_offset: f32,
    /// Frames where both feet found ground under them
    pub planted_frames: u64,
    pub max_vertical_velocity: f32,
    pub debug_lines_last_frame: usize,
}

impl RunReport {
    /// Fold one simulated frame into the totals
    pub fn record(&mut self, params: &AnimatorParams, ik: Option<&FootIkFrame>) {
        self.frames += 1;
        if params.is_grounded {
            self.grounded_frames += 1;
        }
        self.max_vertical_velocity = self.max_vertical_velocity.max(params.vertical_velocity);

        if let Some(frame) = ik {
            self.min_pelvis_offset = self.min_pelvis_offset.min(frame.pelvis_offset);
            if frame.solutions.iter().all(|solution| solution.grounded()) {
                self.planted_frames += 1;
            }
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing run report")
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("writing run report to {:?}", path))
    }
}
