//! Skeleton graph writer (.npy -> .tgf)
//!
//! # Layout
//! ```text
//! 1   0.0  1.6  0.0      one row per joint: 1-based label, x, y, z
//! ...
//! #
//! 1   2                  one row per bone: 1-based joint indices
//! ...
//! #
//! ```
//!
//! Vertex positions come from a single frame of the keypoint array; the edge
//! list comes from the skeleton schema alone.

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix3};
use posekit_shared::{
    AXIS_FRAME, KeypointShapeError, SkeletonSchema, check_keypoint_shape, into_keypoints, load_npy,
};
use std::path::Path;

use crate::table::{RenderOptions, render};

/// Line separating the vertex and edge sections, and ending the file
pub const SENTINEL: &str = "#";

/// Error type for graph serialization.
#[derive(Debug, thiserror::Error)]
pub enum TgfError {
    #[error(transparent)]
    Shape(#[from] KeypointShapeError),

    #[error("Frame {frame} out of range (array has {frames} frames)")]
    FrameOutOfRange { frame: usize, frames: usize },
}

/// Render frame `frame` of `keypoints` as graph text
pub fn render_tgf<S>(
    keypoints: &ArrayBase<S, Ix3>,
    schema: &SkeletonSchema,
    frame: usize,
) -> Result<String, TgfError>
where
    S: Data<Elem = f64>,
{
    check_keypoint_shape(keypoints.shape(), schema)?;
    let frames = keypoints.len_of(Axis(AXIS_FRAME));
    if frame >= frames {
        return Err(TgfError::FrameOutOfRange { frame, frames });
    }

    let positions = keypoints.index_axis(Axis(AXIS_FRAME), frame);
    let edges = Array2::from(schema.one_based_bones());

    let mut content = render(positions, RenderOptions::ONE_BASED_ROWS);
    content.push('\n');
    content.push_str(SENTINEL);
    content.push('\n');
    if !edges.is_empty() {
        content.push_str(&render(edges.view(), RenderOptions::BARE));
        content.push('\n');
    }
    content.push_str(SENTINEL);
    content.push('\n');
    Ok(content)
}

/// Convert one frame of a `.npy` keypoint array to a `.tgf` graph file
pub fn convert_npy(input: &Path, output: &Path, schema: &SkeletonSchema, frame: usize) -> Result<()> {
    let array = load_npy(input)?;
    let keypoints = into_keypoints(array, schema)
        .with_context(|| format!("Incompatible keypoint array: {:?}", input))?;
    let content = render_tgf(&keypoints, schema, frame)
        .with_context(|| format!("Failed to serialize {:?}", input))?;

    std::fs::write(output, &content)
        .with_context(|| format!("Failed to write graph: {:?}", output))?;

    tracing::info!(
        "Wrote graph: {} vertices, {} edges (frame {} of {})",
        schema.joint_count(),
        schema.bone_count(),
        frame,
        keypoints.len_of(Axis(AXIS_FRAME))
    );

    Ok(())
}
