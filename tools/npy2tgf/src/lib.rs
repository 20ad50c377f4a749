//! npy2tgf library
//!
//! Serializes one frame of a keypoint array as a trivial-graph-format
//! skeleton: joint positions as vertices, schema bones as edges.

pub mod table;
pub mod tgf;

pub use table::{CellFormat, RenderOptions, render};
pub use tgf::{SENTINEL, TgfError, convert_npy, render_tgf};

// Re-export the shared schema so callers need only one crate
pub use posekit_shared::SkeletonSchema;
