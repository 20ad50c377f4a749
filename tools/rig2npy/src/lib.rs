//! rig2npy library
//!
//! Samples the world-space positions of a fixed set of named joints from an
//! animated rig, frame by frame, into a `(joint, axis, frame)` keypoint array.

pub mod extract;
pub mod gltf_rig;
pub mod rig;
pub mod sampling;

pub use extract::{
    ExtractError, ExtractOptions, ExtractSummary, convert_rig, extract_keypoints, frame_count,
    list_rig, sample_frame,
};
pub use gltf_rig::{DEFAULT_FRAME_RATE, GltfRig};
pub use rig::{ActionInfo, Pose, PoseTime, RigError, RigSource};

// Re-export the shared schema so callers need only one crate
pub use posekit_shared::SkeletonSchema;
