//! Skeleton schema: the joint vocabulary and bone topology shared by every stage.
//!
//! Joint order defines the first axis of the keypoint array, and bone
//! endpoints are 0-based indices into that order. The built-in schema is the
//! 15-joint Mixamo subset; a custom schema can be loaded from TOML:
//!
//! ```toml
//! version = 1
//! prefix = "mixamorig:"
//! joints = ["Head", "Neck", "Hips"]
//! bones = [[0, 1], [1, 2]]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Current schema descriptor version
pub const SCHEMA_VERSION: u32 = 1;

/// Bone name prefix used by Mixamo rigs
pub const MIXAMO_PREFIX: &str = "mixamorig:";

/// The 15 tracked joints, in array order
pub const MIXAMO_JOINTS: [&str; 15] = [
    "Head",
    "Neck",
    "RightArm",
    "RightForeArm",
    "RightHand",
    "LeftArm",
    "LeftForeArm",
    "LeftHand",
    "Hips",
    "RightUpLeg",
    "RightLeg",
    "RightFoot",
    "LeftUpLeg",
    "LeftLeg",
    "LeftFoot",
];

/// Bone connectivity over [`MIXAMO_JOINTS`] (0-based parent, child)
pub const MIXAMO_BONES: [[usize; 2]; 14] = [
    [0, 1],
    [1, 2],
    [1, 5],
    [1, 8],
    [2, 3],
    [3, 4],
    [5, 6],
    [6, 7],
    [8, 9],
    [8, 12],
    [9, 10],
    [10, 11],
    [12, 13],
    [13, 14],
];

/// Error type for schema parsing and validation.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("Schema defines no joints")]
    NoJoints,

    #[error("Duplicate joint name '{0}'")]
    DuplicateJoint(String),

    #[error("Bone {bone} references joint {joint}, but the schema has {joint_count} joints")]
    BoneOutOfRange {
        bone: usize,
        joint: usize,
        joint_count: usize,
    },

    #[error("Bone {bone} connects joint {joint} to itself")]
    SelfLoop { bone: usize, joint: usize },
}

/// Versioned joint set + bone topology descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Prefix prepended to every joint name when looking bones up in a rig
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Joint names without prefix, in array order
    pub joints: Vec<String>,
    /// 0-based (parent, child) joint index pairs
    pub bones: Vec<[usize; 2]>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

fn default_prefix() -> String {
    MIXAMO_PREFIX.to_string()
}

impl Default for SkeletonSchema {
    fn default() -> Self {
        Self::mixamo15()
    }
}

impl SkeletonSchema {
    /// Built-in 15-joint Mixamo schema with the 14-bone topology
    pub fn mixamo15() -> Self {
        Self {
            version: SCHEMA_VERSION,
            prefix: MIXAMO_PREFIX.to_string(),
            joints: MIXAMO_JOINTS.iter().map(|name| name.to_string()).collect(),
            bones: MIXAMO_BONES.to_vec(),
        }
    }

    /// Parse and validate a schema from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let schema: SkeletonSchema = toml::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema: {:?}", path))?;
        let schema = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid schema: {:?}", path))?;
        Ok(schema)
    }

    /// Load `path` if given, otherwise fall back to the built-in schema
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::mixamo15()),
        }
    }

    /// Replace the bone name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.version != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion(self.version));
        }
        if self.joints.is_empty() {
            return Err(SchemaError::NoJoints);
        }

        let mut seen = HashSet::with_capacity(self.joints.len());
        for name in &self.joints {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateJoint(name.clone()));
            }
        }

        let joint_count = self.joint_count();
        for (bone, &[parent, child]) in self.bones.iter().enumerate() {
            for joint in [parent, child] {
                if joint >= joint_count {
                    return Err(SchemaError::BoneOutOfRange {
                        bone,
                        joint,
                        joint_count,
                    });
                }
            }
            if parent == child {
                return Err(SchemaError::SelfLoop { bone, joint: parent });
            }
        }

        Ok(())
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Array index of an unprefixed joint name
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|joint| joint == name)
    }

    /// Rig bone name (prefix + joint name) for joint `index`
    pub fn rig_bone_name(&self, index: usize) -> Option<String> {
        self.joints
            .get(index)
            .map(|name| format!("{}{}", self.prefix, name))
    }

    /// Rig bone names for every joint, in array order
    pub fn rig_bone_names(&self) -> impl Iterator<Item = String> + '_ {
        self.joints
            .iter()
            .map(move |name| format!("{}{}", self.prefix, name))
    }

    /// Bone list with 1-based endpoints, as written to graph files
    pub fn one_based_bones(&self) -> Vec<[usize; 2]> {
        self.bones
            .iter()
            .map(|&[parent, child]| [parent + 1, child + 1])
            .collect()
    }
}
