//! Foothold IK - Foot grounding for humanoid rigs
//!
//! Raycasts under each foot, turns the hits into ankle IK goals and knee
//! hints, and lowers the pelvis toward the lower foot so both feet can reach
//! the ground. The host calls [`FootIk::on_animator_ik`] once per frame,
//! after animation has been evaluated and before the pose is committed.

mod config;
mod debug;
mod error;
mod foot_ik;
mod pelvis;
mod pose;
mod rig;
mod solver;

pub use config::FootIkConfig;
pub use debug::{DebugLine, DebugLines, FootDebugSample, FootDistanceLogger, IkDebugObserver};
pub use error::IkError;
pub use foot_ik::{FootIk, FootIkFrame};
pub use pelvis::{PelvisCompensator, PelvisOffsetState};
pub use pose::{HumanoidPose, IkGoalState};
pub use rig::{BoneId, HumanBone, LegBones, RigBinding, Side, SkeletonRig};
pub use solver::{FootPlacementSolver, FootSolution, IkWeights, LegPose};
