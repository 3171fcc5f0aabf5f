//! Foothold - grounded third-person locomotion with foot IK
//!
//! Headless demo: builds a small course, walks a capsule character through it
//! with a scripted input track, grounds a procedural skeleton's feet every
//! frame and prints a JSON run report.

mod gait;
mod report;
mod scene;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use foothold_core::GameTime;
use foothold_game::PlayerController;
use foothold_ik::{DebugLines, FootDistanceLogger, FootIk, HumanoidPose, IkDebugObserver};
use foothold_physics::PhysicsWorld;

use gait::WalkCycle;
use report::RunReport;
use scene::{ScriptPlayer, SCRIPT};
use settings::DemoSettings;

/// Layer index the host evaluates foot IK on
const BASE_LAYER: usize = 0;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut args = std::env::args().skip(1);
    let mut settings_path = None;
    let mut write_defaults = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--write-default-settings" => {
                let path = args.next().context("--write-default-settings needs a path")?;
                write_defaults = Some(PathBuf::from(path));
            }
            _ => settings_path = Some(PathBuf::from(arg)),
        }
    }

    if let Some(path) = write_defaults {
        return DemoSettings::default().save(&path);
    }

    info!("Starting Foothold v{}", env!("CARGO_PKG_VERSION"));
    let settings = DemoSettings::load(settings_path.as_deref());
    let report = run(&settings)?;

    println!("{}", report.to_json()?);
    if let Some(path) = &settings.run.report_path {
        report.write(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

/// Play the script once and collect the report
fn run(settings: &DemoSettings) -> Result<RunReport> {
    anyhow::ensure!(
        settings.time.fixed_timestep > 0.0 && settings.time.time_scale > 0.0,
        "time.fixed_timestep and time.time_scale must be positive"
    );

    let mut physics = PhysicsWorld::new();
    scene::build_course(&mut physics);

    let mut player = PlayerController::with_config(
        settings.body.clone(),
        settings.locomotion.clone(),
        settings.movement.clone(),
    );
    player.spawn(&mut physics, scene::SPAWN_POINT);
    physics.refresh_queries();

    let run = &settings.run;
    let mut pose = HumanoidPose::biped(player.root_transform(), run.leg_length);
    let mut walk_cycle = WalkCycle::new(&pose, run.stride_length, run.step_height, run.cadence)
        .context("building walk cycle")?;
    let mut foot_ik = FootIk::new(settings.foot_ik.clone());
    foot_ik.bind(&pose).context("binding foot IK to skeleton")?;

    let mut distance_logger = FootDistanceLogger::new(settings.foot_ik.debug_interval);
    let mut lines = DebugLines::new();
    let mut time = GameTime::new(settings.time.clone());
    let mut script = ScriptPlayer::new(SCRIPT);
    let mut report = RunReport::default();
    info!("Playing {:.1}s input script", scene::script_duration(SCRIPT));

    let raw_delta = run.frame_delta.max(1e-4);
    'frames: loop {
        time.update(raw_delta);

        while let Some(frame) = time.next_fixed_step() {
            let Some(input) = script.input_at(frame.now) else {
                break 'frames;
            };

            let params = player.fixed_update(&mut physics, &input, frame);
            physics.refresh_queries();

            pose.begin_frame();
            pose.set_root(player.root_transform());
            walk_cycle
                .animate(&mut pose, params.speed, params.is_grounded, frame.delta)
                .context("animating walk cycle")?;

            lines.clear();
            let observer: Option<&mut dyn IkDebugObserver> = if settings.foot_ik.debug {
                Some(&mut lines)
            } else {
                None
            };
            let ik = foot_ik.on_animator_ik(
                BASE_LAYER,
                frame.delta,
                params.speed,
                &mut pose,
                &physics,
                observer,
            );

            if let Some(ik_frame) = &ik {
                if settings.foot_ik.debug {
                    distance_logger.observe(frame.delta, ik_frame);
                }
            }
            if params.jump_triggered {
                debug!(
                    "Jump in {:?} at t={:.2} from {:?} (hips at {:?})",
                    script.current_label(),
                    frame.now,
                    player.position(),
                    gait::hips_height(&pose)
                );
            }

            report.record(&params, ik.as_ref());
            if player.body.touching_floor {
                report.floor_contact_frames += 1;
            }
            report.simulated_seconds = frame.now;
        }
    }

    let position = player.position();
    report.jumps = player.jump_count();
    report.step_downs = player.step_down_count();
    report.final_position = position.to_array();
    report.debug_lines_last_frame = lines.len();

    info!(
        "Run finished: {} frames, {} jumps, {} step-downs, final position {:?}",
        report.frames, report.jumps, report.step_downs, position
    );
    Ok(report)
}
