//! Collision query seam
//!
//! Everything above the physics layer only ever asks three questions of the
//! world: where does a ray land, where does a swept sphere land, and does a
//! sphere overlap anything. Keeping those behind a trait lets the locomotion
//! and IK code run against rapier in the game and against tiny fakes in tests.

use std::ops::{BitAnd, BitOr, Not};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bit set of collision layers a query is allowed to hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    /// Static level geometry
    pub const DEFAULT: LayerMask = LayerMask(1 << 0);
    /// Character capsules
    pub const CHARACTER: LayerMask = LayerMask(1 << 1);
    /// Everything a foot or ground probe should land on
    pub const GROUND: LayerMask = LayerMask(!(1 << 1));

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::GROUND
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = LayerMask;

    fn bitand(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 & rhs.0)
    }
}

impl Not for LayerMask {
    type Output = LayerMask;

    fn not(self) -> LayerMask {
        LayerMask(!self.0)
    }
}

/// Result of a single ray or sphere cast that hit something
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// World-space contact point
    pub point: Vec3,
    /// Surface normal at the contact point
    pub normal: Vec3,
    /// Distance travelled along the cast direction
    pub distance: f32,
}

/// Read-only collision queries against an opaque world
pub trait CollisionQuery {
    /// Cast a ray and return the first hit within `max_distance`
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe>;

    /// Sweep a sphere of `radius` from `origin` along `direction`
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe>;

    /// Whether a sphere at `center` overlaps any collider in `mask`
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;
}

impl<T: CollisionQuery + ?Sized> CollisionQuery for &T {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe> {
        (**self).raycast(origin, direction, max_distance, mask)
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe> {
        (**self).sphere_cast(origin, radius, direction, max_distance, mask)
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        (**self).overlap_sphere(center, radius, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_mask_excludes_characters() {
        assert!(!LayerMask::GROUND.intersects(LayerMask::CHARACTER));
        assert!(LayerMask::GROUND.contains(LayerMask::DEFAULT));
        assert_eq!(LayerMask::default(), LayerMask::GROUND);
    }

    #[test]
    fn test_mask_ops() {
        let mask = LayerMask::DEFAULT | LayerMask::CHARACTER;
        assert!(mask.contains(LayerMask::CHARACTER));
        assert_eq!(mask & LayerMask::DEFAULT, LayerMask::DEFAULT);
        assert_eq!(!LayerMask::CHARACTER, LayerMask::GROUND);
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }
}
