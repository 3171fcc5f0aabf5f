//! Skeleton access for the IK pass

use foothold_core::Transform;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::IkError;

/// Humanoid joints the foot IK reads, addressed by meaning rather than by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumanBone {
    Hips,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
}

/// Stable handle to a bone, resolved once when the rig is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneId(pub usize);

/// Which leg an IK goal or hint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn foot(self) -> HumanBone {
        match self {
            Side::Left => HumanBone::LeftFoot,
            Side::Right => HumanBone::RightFoot,
        }
    }

    pub fn knee(self) -> HumanBone {
        match self {
            Side::Left => HumanBone::LeftLowerLeg,
            Side::Right => HumanBone::RightLowerLeg,
        }
    }

    pub fn upper_leg(self) -> HumanBone {
        match self {
            Side::Left => HumanBone::LeftUpperLeg,
            Side::Right => HumanBone::RightUpperLeg,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Engine-owned skeleton as seen by the IK pass.
///
/// Bone reads return the pose for the current frame. Every write is an
/// override for the current frame only; the owner restores the animated pose
/// before the next IK window opens.
pub trait SkeletonRig {
    /// Whether the skeleton follows the humanoid bone contract
    fn is_human(&self) -> bool;

    /// Resolve a humanoid joint to a bone handle
    fn find_bone(&self, bone: HumanBone) -> Option<BoneId>;

    /// World transform of a bone for the current frame
    fn bone_transform(&self, id: BoneId) -> Option<Transform>;

    /// Override a bone's world position for the current frame
    fn set_bone_position(&mut self, id: BoneId, position: Vec3) -> Result<(), IkError>;

    /// World transform of the character root
    fn root(&self) -> Transform;

    fn set_ik_position(&mut self, side: Side, position: Vec3);
    fn set_ik_rotation(&mut self, side: Side, rotation: Quat);
    fn set_ik_position_weight(&mut self, side: Side, weight: f32);
    fn set_ik_rotation_weight(&mut self, side: Side, weight: f32);
    fn set_ik_hint_position(&mut self, side: Side, position: Vec3);
    fn set_ik_hint_position_weight(&mut self, side: Side, weight: f32);
}

/// Bone handles for one leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegBones {
    pub foot: BoneId,
    pub knee: Option<BoneId>,
    pub upper_leg: Option<BoneId>,
}

/// Every bone handle the foot IK needs, resolved once per rig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigBinding {
    pub left: LegBones,
    pub right: LegBones,
    pub pelvis: Option<BoneId>,
}

impl RigBinding {
    /// Resolve the humanoid bones on `rig`.
    ///
    /// Both feet are required. Knees and upper legs only drive the knee hint
    /// and the hips only drive the pelvis drop, so those may be absent.
    pub fn resolve<R: SkeletonRig + ?Sized>(rig: &R) -> Result<Self, IkError> {
        if !rig.is_human() {
            return Err(IkError::NotHumanoid);
        }

        let leg = |side: Side| -> Result<LegBones, IkError> {
            let foot = rig
                .find_bone(side.foot())
                .ok_or(IkError::MissingBone(side.foot()))?;
            Ok(LegBones {
                foot,
                knee: rig.find_bone(side.knee()),
                upper_leg: rig.find_bone(side.upper_leg()),
            })
        };

        Ok(Self {
            left: leg(Side::Left)?,
            right: leg(Side::Right)?,
            pelvis: rig.find_bone(HumanBone::Hips),
        })
    }

    pub fn leg(&self, side: Side) -> &LegBones {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HumanoidPose;

    #[test]
    fn test_side_bones() {
        assert_eq!(Side::Left.foot(), HumanBone::LeftFoot);
        assert_eq!(Side::Right.knee(), HumanBone::RightLowerLeg);
        assert_eq!(Side::Right.upper_leg(), HumanBone::RightUpperLeg);
        assert_eq!(Side::Right.index(), 1);
    }

    #[test]
    fn test_resolve_biped() {
        let pose = HumanoidPose::biped(Transform::default(), 0.9);
        let binding = RigBinding::resolve(&pose).unwrap();
        assert!(binding.pelvis.is_some());
        assert!(binding.left.knee.is_some());
        assert_ne!(binding.left.foot, binding.right.foot);
    }

    #[test]
    fn test_resolve_rejects_non_humanoid() {
        let mut pose = HumanoidPose::biped(Transform::default(), 0.9);
        pose.set_human(false);
        assert_eq!(RigBinding::resolve(&pose), Err(IkError::NotHumanoid));
    }

    #[test]
    fn test_resolve_requires_feet() {
        let mut pose = HumanoidPose::new(Transform::default());
        let hips = pose.add_bone("hips", Transform::from_position(Vec3::Y));
        pose.map_human(HumanBone::Hips, hips);
        assert_eq!(
            RigBinding::resolve(&pose),
            Err(IkError::MissingBone(HumanBone::LeftFoot))
        );
    }
}
