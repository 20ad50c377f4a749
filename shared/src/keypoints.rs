//! Keypoint array layout
//!
//! A keypoint array is a `(joint, axis, frame)` tensor of world-space
//! positions. Axis 1 always holds x, y, z.

use ndarray::{Array3, ArrayD, Ix3};

use crate::schema::SkeletonSchema;

/// Dimension holding the joint index
pub const AXIS_JOINT: usize = 0;
/// Dimension holding the frame index
pub const AXIS_FRAME: usize = 2;

/// Number of coordinates per joint
pub const COORD_COUNT: usize = 3;

/// Error type for keypoint arrays whose shape breaks the layout contract.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeypointShapeError {
    #[error("Keypoint array must be 3-dimensional (joint, axis, frame), got shape {0:?}")]
    NotThreeDimensional(Vec<usize>),

    #[error("Keypoint array axis 1 must hold x, y, z (3 entries), got {0}")]
    CoordCount(usize),

    #[error("Keypoint array has {found} joints, but the schema expects {expected}")]
    JointCountMismatch { expected: usize, found: usize },

    #[error("Keypoint array has no frames")]
    NoFrames,
}

/// Zeroed `(joints, 3, frames)` array for `schema`
pub fn allocate_keypoints(schema: &SkeletonSchema, frames: usize) -> Array3<f64> {
    Array3::zeros((schema.joint_count(), COORD_COUNT, frames))
}

/// Check `shape` against the layout contract and the schema's joint count
pub fn check_keypoint_shape(
    shape: &[usize],
    schema: &SkeletonSchema,
) -> Result<(), KeypointShapeError> {
    let &[joints, coords, frames] = shape else {
        return Err(KeypointShapeError::NotThreeDimensional(shape.to_vec()));
    };
    if coords != COORD_COUNT {
        return Err(KeypointShapeError::CoordCount(coords));
    }
    if joints != schema.joint_count() {
        return Err(KeypointShapeError::JointCountMismatch {
            expected: schema.joint_count(),
            found: joints,
        });
    }
    if frames == 0 {
        return Err(KeypointShapeError::NoFrames);
    }
    Ok(())
}

/// Validate a dynamically shaped array (e.g. freshly loaded) and narrow it to 3-D
pub fn into_keypoints(
    array: ArrayD<f64>,
    schema: &SkeletonSchema,
) -> Result<Array3<f64>, KeypointShapeError> {
    check_keypoint_shape(array.shape(), schema)?;
    let shape = array.shape().to_vec();
    array
        .into_dimensionality::<Ix3>()
        .map_err(|_| KeypointShapeError::NotThreeDimensional(shape))
}
