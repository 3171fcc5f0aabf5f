//! In-memory humanoid rig
//!
//! Stands in for an engine skeleton: bones carry an animated pose relative to
//! the character root, the IK pass writes per-frame overrides, and
//! [`HumanoidPose::begin_frame`] throws those overrides away again.

use std::collections::HashMap;

use foothold_core::Transform;
use glam::{Quat, Vec3};

use crate::rig::{BoneId, HumanBone, Side, SkeletonRig};
use crate::IkError;

/// IK requests recorded for one leg during the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IkGoalState {
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub position_weight: f32,
    pub rotation_weight: f32,
    pub hint_position: Option<Vec3>,
    pub hint_weight: f32,
}

#[derive(Debug, Clone)]
struct Bone {
    name: String,
    /// Animated pose relative to the root
    local: Transform,
    /// World-space position override for this frame
    position_override: Option<Vec3>,
}

/// A skeleton with named bones and a humanoid joint map
#[derive(Debug, Clone)]
pub struct HumanoidPose {
    root: Transform,
    bones: Vec<Bone>,
    human_map: HashMap<HumanBone, BoneId>,
    is_human: bool,
    goals: [IkGoalState; 2],
}

impl HumanoidPose {
    /// Create an empty rig at `root`
    pub fn new(root: Transform) -> Self {
        Self {
            root,
            bones: Vec::new(),
            human_map: HashMap::new(),
            is_human: true,
            goals: [IkGoalState::default(); 2],
        }
    }

    /// Standing two-legged skeleton with its feet on the root plane.
    ///
    /// `leg_length` is the hip height; ankles sit 8cm above the root and the
    /// knees bend slightly forward.
    pub fn biped(root: Transform, leg_length: f32) -> Self {
        const HIP_HALF_WIDTH: f32 = 0.1;
        const ANKLE_HEIGHT: f32 = 0.08;
        const KNEE_BEND: f32 = 0.03;

        let mut pose = Self::new(root);
        let hips = pose.add_bone("Hips", Transform::from_position(Vec3::Y * leg_length));
        pose.map_human(HumanBone::Hips, hips);

        for side in Side::BOTH {
            let (x, prefix) = match side {
                Side::Left => (-HIP_HALF_WIDTH, "Left"),
                Side::Right => (HIP_HALF_WIDTH, "Right"),
            };
            let hip_y = leg_length - 0.05;
            let knee_y = (hip_y + ANKLE_HEIGHT) * 0.5;

            let upper = pose.add_bone(
                format!("{prefix}UpLeg"),
                Transform::from_position(Vec3::new(x, hip_y, 0.0)),
            );
            let knee = pose.add_bone(
                format!("{prefix}Leg"),
                Transform::from_position(Vec3::new(x, knee_y, -KNEE_BEND)),
            );
            let foot = pose.add_bone(
                format!("{prefix}Foot"),
                Transform::from_position(Vec3::new(x, ANKLE_HEIGHT, 0.0)),
            );
            pose.map_human(side.upper_leg(), upper);
            pose.map_human(side.knee(), knee);
            pose.map_human(side.foot(), foot);
        }

        pose
    }

    /// Add a bone with an animated pose relative to the root
    pub fn add_bone(&mut self, name: impl Into<String>, local: Transform) -> BoneId {
        self.bones.push(Bone {
            name: name.into(),
            local,
            position_override: None,
        });
        BoneId(self.bones.len() - 1)
    }

    /// Map a humanoid joint to an existing bone
    pub fn map_human(&mut self, bone: HumanBone, id: BoneId) {
        self.human_map.insert(bone, id);
    }

    pub fn set_human(&mut self, is_human: bool) {
        self.is_human = is_human;
    }

    pub fn set_root(&mut self, root: Transform) {
        self.root = root;
    }

    pub fn bone_name(&self, id: BoneId) -> Option<&str> {
        self.bones.get(id.0).map(|bone| bone.name.as_str())
    }

    /// Replace a bone's animated pose (what the animation system evaluated)
    pub fn set_local(&mut self, id: BoneId, local: Transform) -> Result<(), IkError> {
        let bone = self.bones.get_mut(id.0).ok_or(IkError::UnknownBone(id))?;
        bone.local = local;
        Ok(())
    }

    pub fn local(&self, id: BoneId) -> Option<Transform> {
        self.bones.get(id.0).map(|bone| bone.local)
    }

    /// Drop every override written during the previous frame
    pub fn begin_frame(&mut self) {
        for bone in &mut self.bones {
            bone.position_override = None;
        }
        self.goals = [IkGoalState::default(); 2];
    }

    /// IK requests recorded for `side` this frame
    pub fn goal(&self, side: Side) -> &IkGoalState {
        &self.goals[side.index()]
    }

    fn goal_mut(&mut self, side: Side) -> &mut IkGoalState {
        &mut self.goals[side.index()]
    }
}

impl SkeletonRig for HumanoidPose {
    fn is_human(&self) -> bool {
        self.is_human
    }

    fn find_bone(&self, bone: HumanBone) -> Option<BoneId> {
        self.human_map.get(&bone).copied()
    }

    fn bone_transform(&self, id: BoneId) -> Option<Transform> {
        let bone = self.bones.get(id.0)?;
        let animated = Transform::from_position_rotation(
            self.root.position + self.root.rotation * bone.local.position,
            self.root.rotation * bone.local.rotation,
        );
        Some(match bone.position_override {
            Some(position) => Transform::from_position_rotation(position, animated.rotation),
            None => animated,
        })
    }

    fn set_bone_position(&mut self, id: BoneId, position: Vec3) -> Result<(), IkError> {
        let bone = self.bones.get_mut(id.0).ok_or(IkError::UnknownBone(id))?;
        bone.position_override = Some(position);
        Ok(())
    }

    fn root(&self) -> Transform {
        self.root
    }

    fn set_ik_position(&mut self, side: Side, position: Vec3) {
        self.goal_mut(side).position = Some(position);
    }

    fn set_ik_rotation(&mut self, side: Side, rotation: Quat) {
        self.goal_mut(side).rotation = Some(rotation);
    }

    fn set_ik_position_weight(&mut self, side: Side, weight: f32) {
        self.goal_mut(side).position_weight = weight;
    }

    fn set_ik_rotation_weight(&mut self, side: Side, weight: f32) {
        self.goal_mut(side).rotation_weight = weight;
    }

    fn set_ik_hint_position(&mut self, side: Side, position: Vec3) {
        self.goal_mut(side).hint_position = Some(position);
    }

    fn set_ik_hint_position_weight(&mut self, side: Side, weight: f32) {
        self.goal_mut(side).hint_weight = weight;
    }
}
