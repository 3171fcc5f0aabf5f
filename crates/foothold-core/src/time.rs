//! Frame clock
//!
//! Tracks wall time, delta time and the fixed-step accumulator that drives the
//! per-frame character pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many simulated seconds pass per real second
    pub time_scale: f32,
    /// Fixed timestep for the character pipeline (in seconds)
    pub fixed_timestep: f32,
    /// Longest raw frame delta accepted; longer frames are cut short
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// Time snapshot handed to every per-frame tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Simulated seconds since start, at the end of this step
    pub now: f64,
    /// Length of this step in seconds; always positive
    pub delta: f32,
}

impl FrameTime {
    pub fn new(now: f64, delta: f32) -> Self {
        Self { now, delta }
    }

    /// Seconds elapsed since `earlier`
    pub fn since(&self, earlier: f64) -> f32 {
        (self.now - earlier) as f32
    }
}

/// Fixed-step clock.
///
/// Raw frame deltas go in through [`GameTime::update`]; the character
/// pipeline pulls whole steps out with [`GameTime::next_fixed_step`], so every
/// tick sees the same `delta` regardless of the render rate.
#[derive(Debug, Clone)]
pub struct GameTime {
    pub config: TimeConfig,
    /// Scaled seconds fed in so far
    pub elapsed: f64,
    /// Scaled delta of the last update
    pub frame_delta: f32,
    /// Number of updates
    pub frames: u64,
    /// Simulated time consumed by fixed steps
    stepped: f64,
    /// Scaled time not yet consumed by a fixed step
    backlog: f32,
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(TimeConfig::default())
    }
}

impl GameTime {
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            frame_delta: 0.0,
            frames: 0,
            stepped: 0.0,
            backlog: 0.0,
        }
    }

    /// Feed the raw delta of the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        let delta = raw_delta.clamp(0.0, self.config.max_delta_time) * self.config.time_scale.max(0.0);
        self.frames += 1;
        self.frame_delta = delta;
        self.elapsed += delta as f64;
        self.backlog += delta;
    }

    /// Consume one fixed step from the backlog, if a full step is available
    pub fn next_fixed_step(&mut self) -> Option<FrameTime> {
        let step = self.config.fixed_timestep;
        if step <= 0.0 || self.backlog < step {
            return None;
        }
        self.backlog -= step;
        self.stepped += step as f64;
        Some(FrameTime::new(self.stepped, step))
    }
}
