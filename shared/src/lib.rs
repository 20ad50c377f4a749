//! Shared types for the posekit keypoint pipeline.
//!
//! Both conversion stages (`rig2npy` and `npy2tgf`) agree on three things
//! defined here: the skeleton schema (joint order + bone topology), the axis
//! convention of the keypoint array, and the `.npy` file codec.

pub mod keypoints;
pub mod npy;
pub mod schema;

pub use keypoints::{
    AXIS_FRAME, AXIS_JOINT, COORD_COUNT, KeypointShapeError, allocate_keypoints,
    check_keypoint_shape, into_keypoints,
};
pub use npy::{NpyError, load_npy, save_npy};
pub use schema::{
    MIXAMO_BONES, MIXAMO_JOINTS, MIXAMO_PREFIX, SCHEMA_VERSION, SchemaError, SkeletonSchema,
};
