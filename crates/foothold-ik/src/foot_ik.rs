//! Per-frame foot IK driver

use foothold_physics::CollisionQuery;
use glam::Vec3;
use tracing::{debug, warn};

use crate::debug::{FootDebugSample, IkDebugObserver};
use crate::pelvis::PelvisCompensator;
use crate::rig::{RigBinding, Side, SkeletonRig};
use crate::solver::{FootPlacementSolver, FootSolution, LegPose};
use crate::{FootIkConfig, IkError};

/// Result of one IK pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootIkFrame {
    pub left: FootDebugSample,
    pub right: FootDebugSample,
    pub solutions: [FootSolution; 2],
    pub pelvis_offset: f32,
}

impl FootIkFrame {
    pub fn solution(&self, side: Side) -> &FootSolution {
        &self.solutions[side.index()]
    }
}

/// Grounds both feet of one character.
///
/// Owns the character's pelvis smoothing state and the bone handles resolved
/// from its rig. Call [`FootIk::on_animator_ik`] once per frame inside the
/// host's IK window.
#[derive(Debug, Clone)]
pub struct FootIk {
    config: FootIkConfig,
    solver: FootPlacementSolver,
    pelvis: PelvisCompensator,
    binding: Option<RigBinding>,
    /// Latched rig problem; warned about once until it clears
    rig_fault: Option<IkError>,
}

impl FootIk {
    pub fn new(config: FootIkConfig) -> Self {
        let config = config.sanitized();
        Self {
            solver: FootPlacementSolver::new(config.clone()),
            pelvis: PelvisCompensator::new(&config),
            config,
            binding: None,
            rig_fault: None,
        }
    }

    pub fn config(&self) -> &FootIkConfig {
        &self.config
    }

    pub fn solver(&self) -> &FootPlacementSolver {
        &self.solver
    }

    /// Current smoothed pelvis offset
    pub fn pelvis_offset(&self) -> f32 {
        self.pelvis.current()
    }

    pub fn binding(&self) -> Option<&RigBinding> {
        self.binding.as_ref()
    }

    /// Rig problem that made the last pass skip, if it has not cleared yet
    pub fn rig_fault(&self) -> Option<&IkError> {
        self.rig_fault.as_ref()
    }

    /// Resolve bone handles on `rig`.
    ///
    /// The IK pass binds lazily and rebinds on its own when the rig's foot
    /// mapping no longer matches the cached handles.
    pub fn bind<R: SkeletonRig + ?Sized>(&mut self, rig: &R) -> Result<(), IkError> {
        match RigBinding::resolve(rig) {
            Ok(binding) => {
                self.binding = Some(binding);
                self.rig_fault = None;
                Ok(())
            }
            Err(err) => {
                self.binding = None;
                Err(err)
            }
        }
    }

    /// Run the IK pass for `layer`.
    ///
    /// Only the configured IK layer is processed, so the pelvis state advances
    /// once per frame even when the host runs several IK layers. Returns
    /// `None` when nothing was written: wrong layer, non-humanoid rig, or
    /// unresolved feet.
    pub fn on_animator_ik<R, W>(
        &mut self,
        layer: usize,
        delta_time: f32,
        speed: f32,
        rig: &mut R,
        world: &W,
        mut observer: Option<&mut dyn IkDebugObserver>,
    ) -> Option<FootIkFrame>
    where
        R: SkeletonRig + ?Sized,
        W: CollisionQuery + ?Sized,
    {
        if layer != self.config.ik_layer {
            return None;
        }

        let binding = match self.checked_binding(rig) {
            Ok(binding) => binding,
            Err(err) => {
                if self.rig_fault.as_ref() != Some(&err) {
                    warn!("Foot IK skipped: {}", err);
                    self.rig_fault = Some(err);
                }
                return None;
            }
        };

        let root = rig.root();
        let left_leg = leg_pose(rig, &binding, Side::Left);
        let right_leg = leg_pose(rig, &binding, Side::Right);
        let (left_leg, right_leg) = match (left_leg, right_leg) {
            (Some(left), Some(right)) => (left, right),
            (left, _) => {
                let side = if left.is_none() { Side::Left } else { Side::Right };
                let err = IkError::UnknownBone(binding.leg(side).foot);
                if self.rig_fault.as_ref() != Some(&err) {
                    warn!("Foot IK skipped: {:?} foot has no transform this frame", side);
                    self.rig_fault = Some(err);
                }
                return None;
            }
        };
        if self.rig_fault.take().is_some() {
            debug!("Foot IK rig fault cleared");
        }

        let left = self.solver.solve_foot(Side::Left, &left_leg, &root, speed, world);
        let right = self.solver.solve_foot(Side::Right, &right_leg, &root, speed, world);

        let pelvis_offset = if self.config.adjust_pelvis {
            let offset = self.pelvis.tick(delta_time, left.offset, right.offset, speed);
            if let Some(pelvis) = binding.pelvis {
                if let Some(transform) = rig.bone_transform(pelvis) {
                    let lowered = transform.position + Vec3::Y * offset;
                    if let Err(err) = rig.set_bone_position(pelvis, lowered) {
                        warn!("Foot IK could not move pelvis: {}", err);
                    }
                    if let Some(observer) = observer.as_deref_mut() {
                        observer.pelvis(lowered, offset);
                    }
                }
            }
            offset
        } else {
            0.0
        };

        let left_sample = self.apply(rig, &left, &left_leg, pelvis_offset);
        let right_sample = self.apply(rig, &right, &right_leg, pelvis_offset);

        if let Some(observer) = observer.as_deref_mut() {
            observer.foot(&left_sample);
            observer.foot(&right_sample);
        }

        Some(FootIkFrame {
            left: left_sample,
            right: right_sample,
            solutions: [left, right],
            pelvis_offset,
        })
    }

    fn checked_binding<R: SkeletonRig + ?Sized>(&mut self, rig: &R) -> Result<RigBinding, IkError> {
        if !rig.is_human() {
            return Err(IkError::NotHumanoid);
        }
        // A different rig (or a remapped one) needs fresh bone handles
        if let Some(binding) = self.binding {
            let same_feet = Side::BOTH
                .iter()
                .all(|&side| rig.find_bone(side.foot()) == Some(binding.leg(side).foot));
            if same_feet {
                return Ok(binding);
            }
            debug!("Foot IK rig changed, rebinding");
        }
        self.bind(rig)?;
        self.binding.ok_or(IkError::NotHumanoid)
    }

    /// Write one foot's goals, weights and hint to the rig
    fn apply<R: SkeletonRig + ?Sized>(
        &self,
        rig: &mut R,
        solution: &FootSolution,
        leg: &LegPose,
        pelvis_offset: f32,
    ) -> FootDebugSample {
        let side = solution.side;
        let weights = solution.weights;
        rig.set_ik_position_weight(side, weights.position);
        rig.set_ik_rotation_weight(side, weights.rotation);
        rig.set_ik_hint_position_weight(side, weights.hint);

        let mut target = solution.target_position;
        if solution.grounded() && self.config.adjust_pelvis {
            // The whole leg moved down with the pelvis; keep the foot where the ground is.
            target.y -= pelvis_offset;
        }
        rig.set_ik_position(side, target);
        rig.set_ik_rotation(side, solution.target_rotation);

        if let Some(hint) = solution.hint_position {
            rig.set_ik_hint_position(side, hint);
        }

        FootDebugSample {
            side,
            ray_origin: solution.probe_origin,
            ray_length: self.config.probe_distance,
            hit_point: solution.hit.map(|hit| hit.point),
            ik_target: target,
            foot_position: leg.foot.position,
        }
    }
}

fn leg_pose<R: SkeletonRig + ?Sized>(rig: &R, binding: &RigBinding, side: Side) -> Option<LegPose> {
    let bones = binding.leg(side);
    let foot = rig.bone_transform(bones.foot)?;
    let position = |id| rig.bone_transform(id).map(|t| t.position);
    Some(LegPose {
        foot,
        knee: bones.knee.and_then(position),
        upper_leg: bones.upper_leg.and_then(position),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoneId, DebugLines, HumanBone, HumanoidPose};
    use foothold_core::Transform;
    use foothold_physics::{GroundProbe, LayerMask};

    /// Ground made of two heights split at x = 0: left half at `left`, right half at `right`
    struct SplitGround {
        left: f32,
        right: f32,
    }

    impl CollisionQuery for SplitGround {
        fn raycast(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            _mask: LayerMask,
        ) -> Option<GroundProbe> {
            let height = if origin.x < 0.0 { self.left } else { self.right };
            let distance = origin.y - height;
            (direction.y < 0.0 && distance >= 0.0 && distance <= max_distance).then(|| {
                GroundProbe {
                    point: Vec3::new(origin.x, height, origin.z),
                    normal: Vec3::Y,
                    distance,
                }
            })
        }

        fn sphere_cast(
            &self,
            _origin: Vec3,
            _radius: f32,
            _direction: Vec3,
            _max_distance: f32,
            _mask: LayerMask,
        ) -> Option<GroundProbe> {
            None
        }

        fn overlap_sphere(&self, _center: Vec3, _radius: f32, _mask: LayerMask) -> bool {
            false
        }
    }

    fn rig() -> HumanoidPose {
        HumanoidPose::biped(Transform::default(), 0.9)
    }

    #[test]
    fn test_flat_ground_targets_and_weights() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: 0.0, right: 0.0 };

        let frame = ik.on_animator_ik(0, 1.0 / 60.0, 0.0, &mut pose, &ground, None).unwrap();

        // Ankles sit at 0.08, target is 0.05: offset -0.03 pulls the pelvis down a little.
        assert!(frame.pelvis_offset < 0.0);
        let goal = pose.goal(Side::Left);
        assert_eq!(goal.position_weight, 1.0);
        assert_eq!(goal.hint_weight, 1.0);
        let target = goal.position.unwrap();
        assert!((target.y - (0.05 - frame.pelvis_offset)).abs() < 1e-6);
        assert!(goal.hint_position.is_some());
    }

    #[test]
    fn test_lower_foot_drives_pelvis() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: -0.2, right: 0.0 };

        let mut offset = 0.0;
        for _ in 0..200 {
            pose.begin_frame();
            offset = ik
                .on_animator_ik(0, 1.0 / 60.0, 0.0, &mut pose, &ground, None)
                .unwrap()
                .pelvis_offset;
        }

        // Left foot needs -0.2 - 0.08 + 0.05 = -0.23.
        assert!((offset + 0.23).abs() < 1e-3);
        let hips = pose.find_bone(HumanBone::Hips).unwrap();
        let hips_y = pose.bone_transform(hips).unwrap().position.y;
        assert!((hips_y - (0.9 + offset)).abs() < 1e-5);
    }

    #[test]
    fn test_non_humanoid_writes_nothing() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        pose.set_human(false);
        let ground = SplitGround { left: 0.0, right: 0.0 };

        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_none());
        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_none());
        assert_eq!(pose.goal(Side::Left).position, None);
        assert_eq!(ik.pelvis_offset(), 0.0);
    }

    #[test]
    fn test_vanished_foot_skips_until_it_returns() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: 0.0, right: 0.0 };
        let right_foot = pose.find_bone(HumanBone::RightFoot).unwrap();
        ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).unwrap();

        // Mapped to a bone the skeleton no longer has
        pose.begin_frame();
        pose.map_human(HumanBone::RightFoot, BoneId(99));
        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_none());
        assert_eq!(ik.rig_fault(), Some(&IkError::UnknownBone(BoneId(99))));
        assert_eq!(pose.goal(Side::Left).position, None);

        // Still broken: the fault stays latched, nothing written
        let offset = ik.pelvis_offset();
        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_none());
        assert_eq!(ik.rig_fault(), Some(&IkError::UnknownBone(BoneId(99))));
        assert_eq!(ik.pelvis_offset(), offset);

        pose.map_human(HumanBone::RightFoot, right_foot);
        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_some());
        assert_eq!(ik.rig_fault(), None);
        assert!(pose.goal(Side::Right).position.is_some());
    }

    #[test]
    fn test_non_humanoid_fault_latches_and_clears() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: 0.0, right: 0.0 };

        pose.set_human(false);
        ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None);
        assert_eq!(ik.rig_fault(), Some(&IkError::NotHumanoid));

        pose.set_human(true);
        assert!(ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).is_some());
        assert_eq!(ik.rig_fault(), None);
    }

    #[test]
    fn test_remapped_rig_is_rebound() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: -1.0, right: -1.0 };
        ik.bind(&pose).unwrap();

        let raised = pose.add_bone("LeftFootRaised", Transform::from_position(Vec3::new(-0.1, 0.3, 0.0)));
        pose.map_human(HumanBone::LeftFoot, raised);

        let frame = ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).unwrap();
        assert_eq!(ik.binding().unwrap().left.foot, raised);
        assert!((frame.left.foot_position.y - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_other_layers_are_ignored() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: 0.0, right: 0.0 };
        assert!(ik.on_animator_ik(1, 0.016, 0.0, &mut pose, &ground, None).is_none());
        assert_eq!(pose.goal(Side::Right).position, None);
    }

    #[test]
    fn test_missed_ray_keeps_animated_foot() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: -5.0, right: -5.0 };

        let frame = ik.on_animator_ik(0, 0.016, 0.0, &mut pose, &ground, None).unwrap();
        assert_eq!(frame.pelvis_offset, 0.0);
        let foot = pose.find_bone(HumanBone::RightFoot).unwrap();
        let animated = pose.bone_transform(foot).unwrap().position;
        assert_eq!(pose.goal(Side::Right).position, Some(animated));
    }

    #[test]
    fn test_moving_uses_reduced_weights() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: 0.0, right: 0.0 };
        ik.on_animator_ik(0, 0.016, 1.0, &mut pose, &ground, None).unwrap();
        assert_eq!(pose.goal(Side::Right).position_weight, 0.3);
        assert_eq!(pose.goal(Side::Right).rotation_weight, 0.3);
    }

    #[test]
    fn test_observer_receives_both_feet() {
        let mut ik = FootIk::new(FootIkConfig::default());
        let mut pose = rig();
        let ground = SplitGround { left: -0.1, right: 0.0 };
        let mut lines = DebugLines::new();

        ik.on_animator_ik(0, 0.5, 0.0, &mut pose, &ground, Some(&mut lines)).unwrap();
        // Two grounded feet (7 lines each) plus the pelvis drop line.
        assert_eq!(lines.len(), 15);
    }

    #[test]
    fn test_pelvis_disabled() {
        let mut ik = FootIk::new(FootIkConfig {
            adjust_pelvis: false,
            ..Default::default()
        });
        let mut pose = rig();
        let ground = SplitGround { left: -0.2, right: 0.0 };
        let frame = ik.on_animator_ik(0, 1.0, 0.0, &mut pose, &ground, None).unwrap();
        assert_eq!(frame.pelvis_offset, 0.0);
        let target = pose.goal(Side::Left).position.unwrap();
        assert!((target.y - (-0.15)).abs() < 1e-6);
    }
}
