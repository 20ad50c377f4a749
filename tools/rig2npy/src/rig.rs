//! Rig engine seam
//!
//! The extractor never talks to a scene graph directly. A [`RigSource`]
//! reports the rig's actions and evaluates a complete [`Pose`] for a given
//! point in time, so sampling frame `i` is a pure function call rather than a
//! mutation of engine-side "current frame" state.

use glam::{Mat4, Vec3};
use hashbrown::HashMap;

/// An animation action (clip) on the rig
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInfo {
    pub name: Option<String>,
    /// Last frame covered by the action (frames are 0-based and inclusive)
    pub end_frame: u32,
}

/// Point in time to evaluate the rig at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseTime {
    /// Bind/rest pose, no animation applied
    Rest,
    /// Frame `frame` of action `action`
    Frame { action: usize, frame: u32 },
}

/// Error type for pose evaluation.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("Action index {index} out of range (rig has {count} actions)")]
    UnknownAction { index: usize, count: usize },
}

/// Evaluated skeleton at one point in time
#[derive(Debug, Clone, Default)]
pub struct Pose {
    /// World transform of the armature object that owns the bones
    pub armature_world: Mat4,
    /// Armature-space transform of every named bone
    pub bones: HashMap<String, Mat4>,
}

impl Pose {
    pub fn bone_matrix(&self, name: &str) -> Option<&Mat4> {
        self.bones.get(name)
    }

    /// World-space position of a bone's origin
    pub fn joint_world_position(&self, name: &str) -> Option<Vec3> {
        self.bone_matrix(name)
            .map(|bone| (self.armature_world * *bone).transform_point3(Vec3::ZERO))
    }
}

/// A loaded rig that can be posed at arbitrary times
pub trait RigSource {
    /// Animation actions declared by the rig, in declaration order
    fn actions(&self) -> &[ActionInfo];

    /// Evaluate the full pose at `time`
    fn evaluate_pose_at(&self, time: PoseTime) -> Result<Pose, RigError>;
}
