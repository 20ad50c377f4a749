//! Keypoint extraction (rig -> .npy)
//!
//! Samples the world-space position of every schema joint at every frame of
//! the rig's action and stores them in a `(joint, axis, frame)` array.

use anyhow::{Context, Result};
use ndarray::{Array3, Axis};
use posekit_shared::{AXIS_FRAME, AXIS_JOINT, SkeletonSchema, allocate_keypoints, save_npy};
use std::path::Path;

use crate::gltf_rig::{DEFAULT_FRAME_RATE, GltfRig};
use crate::rig::{ActionInfo, Pose, PoseTime, RigError, RigSource};

/// Error type for keypoint extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Joint '{name}' not found in rig pose")]
    MissingJoint { name: String },

    #[error(transparent)]
    Rig(#[from] RigError),
}

/// Options for [`convert_rig`]
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub schema: SkeletonSchema,
    /// Frames per second used to map keyframe times to frame numbers
    pub frame_rate: f32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            schema: SkeletonSchema::mixamo15(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// What a conversion produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    pub joints: usize,
    pub frames: usize,
    pub actions: usize,
}

/// Number of frames to sample
///
/// Exactly one action: its end frame + 1. Zero actions: the rest pose only.
/// Several actions: a single frame; which action should drive the range is
/// ambiguous, so only frame 0 is taken.
pub fn frame_count(actions: &[ActionInfo]) -> usize {
    match actions {
        [action] => action.end_frame as usize + 1,
        _ => 1,
    }
}

/// Store the world-space position of every schema joint into `keypoints[.., .., frame]`
pub fn sample_frame(
    pose: &Pose,
    schema: &SkeletonSchema,
    frame: usize,
    keypoints: &mut Array3<f64>,
) -> Result<(), ExtractError> {
    for (joint, name) in schema.rig_bone_names().enumerate() {
        let position = pose
            .joint_world_position(&name)
            .ok_or(ExtractError::MissingJoint { name })?;
        for (axis, value) in position.to_array().into_iter().enumerate() {
            keypoints[[joint, axis, frame]] = value as f64;
        }
    }
    Ok(())
}

/// Sample every frame of `rig` into a `(joints, 3, frames)` array
///
/// Frames are evaluated in increasing order. A rig without actions is
/// sampled once at its rest pose.
pub fn extract_keypoints<R>(rig: &R, schema: &SkeletonSchema) -> Result<Array3<f64>, ExtractError>
where
    R: RigSource + ?Sized,
{
    let actions = rig.actions();
    let frames = frame_count(actions);
    if actions.len() > 1 {
        tracing::warn!(
            "Rig has {} actions; sampling a single frame of the first one",
            actions.len()
        );
    }

    let mut keypoints = allocate_keypoints(schema, frames);
    for frame in 0..frames {
        let time = if actions.is_empty() {
            PoseTime::Rest
        } else {
            PoseTime::Frame {
                action: 0,
                frame: frame as u32,
            }
        };
        let pose = rig.evaluate_pose_at(time)?;
        sample_frame(&pose, schema, frame, &mut keypoints)?;
        tracing::debug!("Sampled frame {}/{}", frame + 1, frames);
    }

    Ok(keypoints)
}

/// Convert a glTF rig to a `.npy` keypoint array
pub fn convert_rig(input: &Path, output: &Path, options: &ExtractOptions) -> Result<ExtractSummary> {
    let rig = GltfRig::load(input, options.frame_rate)?;
    let keypoints = extract_keypoints(&rig, &options.schema)
        .with_context(|| format!("Failed to extract keypoints from {:?}", input))?;

    save_npy(output, &keypoints)?;

    let summary = ExtractSummary {
        joints: keypoints.len_of(Axis(AXIS_JOINT)),
        frames: keypoints.len_of(Axis(AXIS_FRAME)),
        actions: rig.actions().len(),
    };
    tracing::info!(
        "Extracted keypoints: {} joints, {} frames at {} fps ({} actions)",
        summary.joints,
        summary.frames,
        options.frame_rate,
        summary.actions
    );

    Ok(summary)
}

/// Log the actions of a rig and whether each schema joint resolves
pub fn list_rig(input: &Path, options: &ExtractOptions) -> Result<()> {
    let rig = GltfRig::load(input, options.frame_rate)?;

    tracing::info!(
        "Armature: {}",
        rig.armature_name().unwrap_or("none (identity)")
    );

    if rig.actions().is_empty() {
        tracing::info!("No actions in {:?} (rest pose only)", input);
    } else {
        tracing::info!("Actions in {:?}:", input);
        for (i, action) in rig.actions().iter().enumerate() {
            tracing::info!(
                "  [{}] '{}': end frame {} ({} frames at {} fps)",
                i,
                action.name.as_deref().unwrap_or("unnamed"),
                action.end_frame,
                action.end_frame + 1,
                rig.frame_rate()
            );
        }
    }

    let pose = rig.evaluate_pose_at(PoseTime::Rest)?;
    tracing::info!("Joints:");
    for (i, name) in options.schema.rig_bone_names().enumerate() {
        let status = if pose.bones.contains_key(&name) {
            "ok"
        } else {
            "MISSING"
        };
        tracing::info!("  [{}] '{}': {}", i, name, status);
    }

    Ok(())
}
