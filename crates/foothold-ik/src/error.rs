use crate::rig::{BoneId, HumanBone};

/// Errors raised while binding or editing a rig.
///
/// The per-frame IK pass never returns these; it logs and skips instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IkError {
    #[error("rig is not a humanoid; foot IK disabled")]
    NotHumanoid,

    #[error("humanoid bone {0:?} is not mapped on this rig")]
    MissingBone(HumanBone),

    #[error("bone id {0:?} does not exist on this rig")]
    UnknownBone(BoneId),
}
