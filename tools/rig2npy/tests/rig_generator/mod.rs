//! Programmatic glTF rig generation for integration tests.
//!
//! Writes a `.gltf` + `.bin` pair containing:
//! - an armature node rotated +90 degrees about X (Blender Z-up export style)
//! - a 16-bone Mixamo-style hierarchy (the 15 tracked joints plus Spine)
//! - any number of animations translating Hips along +X by 0.1 per frame,
//!   optionally also swinging LeftForeArm about Z

#![allow(dead_code)]

use glam::{Quat, Vec3};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const FRAME_RATE: f32 = 30.0;

/// Hips moves this far along +X every frame
pub const HIPS_STEP: f32 = 0.1;

/// LeftForeArm rotates this many radians about Z every frame when swinging
pub const FOREARM_SWING: f32 = 0.15;

const SWING_BONE: &str = "LeftForeArm";

/// (name, parent bone or None for the armature, local translation)
pub const BONES: [(&str, Option<&str>, [f32; 3]); 16] = [
    ("Hips", None, [0.0, 1.0, 0.0]),
    ("Spine", Some("Hips"), [0.0, 0.1, 0.0]),
    ("Neck", Some("Spine"), [0.0, 0.4, 0.0]),
    ("Head", Some("Neck"), [0.0, 0.1, 0.0]),
    ("RightArm", Some("Neck"), [-0.2, -0.05, 0.0]),
    ("RightForeArm", Some("RightArm"), [-0.3, 0.0, 0.0]),
    ("RightHand", Some("RightForeArm"), [-0.25, 0.0, 0.0]),
    ("LeftArm", Some("Neck"), [0.2, -0.05, 0.0]),
    ("LeftForeArm", Some("LeftArm"), [0.3, 0.0, 0.0]),
    ("LeftHand", Some("LeftForeArm"), [0.25, 0.0, 0.0]),
    ("RightUpLeg", Some("Hips"), [-0.1, -0.05, 0.0]),
    ("RightLeg", Some("RightUpLeg"), [0.0, -0.45, 0.0]),
    ("RightFoot", Some("RightLeg"), [0.0, -0.45, 0.05]),
    ("LeftUpLeg", Some("Hips"), [0.1, -0.05, 0.0]),
    ("LeftLeg", Some("LeftUpLeg"), [0.0, -0.45, 0.0]),
    ("LeftFoot", Some("LeftLeg"), [0.0, -0.45, 0.05]),
];

/// Description of the rig to generate
#[derive(Debug, Clone)]
pub struct RigLayout {
    pub armature_name: &'static str,
    pub prefix: &'static str,
    /// Keyframe count of each animation (keys at 0, 1/30, 2/30, ...)
    pub animations: Vec<usize>,
    /// Bone written under a different name so lookups fail
    pub omit_bone: Option<&'static str>,
    /// Add a LeftForeArm rotation channel to every animation
    pub forearm_swing: bool,
}

impl Default for RigLayout {
    fn default() -> Self {
        Self {
            armature_name: "Armature",
            prefix: "mixamorig:",
            animations: Vec::new(),
            omit_bone: None,
            forearm_swing: false,
        }
    }
}

impl RigLayout {
    pub fn with_animations(animations: Vec<usize>) -> Self {
        Self {
            animations,
            ..Default::default()
        }
    }
}

fn bone(name: &str) -> (Option<&'static str>, Vec3) {
    let (_, parent, local) = BONES
        .iter()
        .find(|(bone, _, _)| *bone == name)
        .unwrap_or_else(|| panic!("unknown bone {}", name));
    (*parent, Vec3::from(*local))
}

/// Armature-space rest position of a bone's origin
pub fn rest_position(name: &str) -> Vec3 {
    match bone(name) {
        (Some(parent), local) => rest_position(parent) + local,
        (None, local) => local,
    }
}

/// Armature-space rotation of a bone at `frame`
fn bone_rotation(layout: &RigLayout, name: &str, frame: usize) -> Quat {
    let own = if layout.forearm_swing && name == SWING_BONE {
        Quat::from_rotation_z(FOREARM_SWING * frame as f32)
    } else {
        Quat::IDENTITY
    };
    match bone(name).0 {
        Some(parent) => bone_rotation(layout, parent, frame) * own,
        None => own,
    }
}

/// Armature-space position of a bone at `frame`
fn posed_position(layout: &RigLayout, name: &str, frame: usize) -> Vec3 {
    match bone(name) {
        (Some(parent), local) => {
            posed_position(layout, parent, frame) + bone_rotation(layout, parent, frame) * local
        }
        (None, local) => local + Vec3::new(HIPS_STEP * frame as f32, 0.0, 0.0),
    }
}

/// World-space position of a bone at `frame` of the generated animation
///
/// The armature's +90 degree X rotation maps (x, y, z) to (x, -z, y).
pub fn expected_world_position(layout: &RigLayout, name: &str, frame: usize) -> Vec3 {
    let p = posed_position(layout, name, frame);
    Vec3::new(p.x, -p.z, p.y)
}

fn push_f32s(buffer: &mut Vec<u8>, values: &[f32]) -> (usize, usize) {
    let offset = buffer.len();
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    (offset, buffer.len() - offset)
}

/// Write `<dir>/<stem>.gltf` and its buffer; returns the `.gltf` path
pub fn write_rig(dir: &Path, stem: &str, layout: &RigLayout) -> PathBuf {
    // Node 0 is the armature, node i + 1 is BONES[i]
    let node_index = |name: &str| -> usize {
        BONES
            .iter()
            .position(|(bone, _, _)| *bone == name)
            .unwrap()
            + 1
    };

    let half = std::f32::consts::FRAC_1_SQRT_2;
    let mut nodes = vec![json!({
        "name": layout.armature_name,
        "rotation": [half, 0.0, 0.0, half],
        "children": [1],
    })];
    for (name, _, translation) in BONES.iter() {
        let children: Vec<usize> = BONES
            .iter()
            .filter(|(_, parent, _)| *parent == Some(*name))
            .map(|(child, _, _)| node_index(child))
            .collect();
        let node_name = if layout.omit_bone == Some(*name) {
            format!("{}{}_end", layout.prefix, name)
        } else {
            format!("{}{}", layout.prefix, name)
        };
        let mut node = json!({
            "name": node_name,
            "translation": translation,
        });
        if !children.is_empty() {
            node["children"] = json!(children);
        }
        nodes.push(node);
    }

    let mut buffer = Vec::new();
    let mut buffer_views: Vec<Value> = Vec::new();
    let mut accessors: Vec<Value> = Vec::new();
    let mut animations: Vec<Value> = Vec::new();

    let hips_rest = Vec3::from(BONES[0].2);
    for (clip, &keys) in layout.animations.iter().enumerate() {
        let times: Vec<f32> = (0..keys).map(|k| k as f32 / FRAME_RATE).collect();
        let translations: Vec<f32> = (0..keys)
            .flat_map(|k| {
                let t = hips_rest + Vec3::new(HIPS_STEP * k as f32, 0.0, 0.0);
                t.to_array()
            })
            .collect();

        let (offset, length) = push_f32s(&mut buffer, &times);
        buffer_views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": length}));
        accessors.push(json!({
            "bufferView": buffer_views.len() - 1,
            "componentType": 5126,
            "count": keys,
            "type": "SCALAR",
            "min": [times[0]],
            "max": [times[keys - 1]],
        }));
        let input = accessors.len() - 1;

        let (offset, length) = push_f32s(&mut buffer, &translations);
        buffer_views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": length}));
        accessors.push(json!({
            "bufferView": buffer_views.len() - 1,
            "componentType": 5126,
            "count": keys,
            "type": "VEC3",
        }));
        let output = accessors.len() - 1;

        let mut channels =
            vec![json!({"sampler": 0, "target": {"node": node_index("Hips"), "path": "translation"}})];
        let mut samplers = vec![json!({"input": input, "output": output, "interpolation": "LINEAR"})];

        if layout.forearm_swing {
            let rotations: Vec<f32> = (0..keys)
                .flat_map(|k| Quat::from_rotation_z(FOREARM_SWING * k as f32).to_array())
                .collect();
            let (offset, length) = push_f32s(&mut buffer, &rotations);
            buffer_views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": length}));
            accessors.push(json!({
                "bufferView": buffer_views.len() - 1,
                "componentType": 5126,
                "count": keys,
                "type": "VEC4",
            }));
            channels.push(json!({
                "sampler": samplers.len(),
                "target": {"node": node_index(SWING_BONE), "path": "rotation"},
            }));
            samplers.push(json!({
                "input": input,
                "output": accessors.len() - 1,
                "interpolation": "LINEAR",
            }));
        }

        animations.push(json!({
            "name": format!("Take {:03}", clip + 1),
            "channels": channels,
            "samplers": samplers,
        }));
    }

    let bin_name = format!("{}.bin", stem);
    let joints: Vec<usize> = (1..=BONES.len()).collect();
    let mut root = json!({
        "asset": {"version": "2.0", "generator": "rig2npy tests"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": nodes,
        "skins": [{"joints": joints}],
    });
    if !buffer.is_empty() {
        root["buffers"] = json!([{"uri": bin_name, "byteLength": buffer.len()}]);
        root["bufferViews"] = json!(buffer_views);
        root["accessors"] = json!(accessors);
        root["animations"] = json!(animations);
        std::fs::write(dir.join(&bin_name), &buffer).expect("Failed to write glTF buffer");
    }

    let path = dir.join(format!("{}.gltf", stem));
    let text = serde_json::to_string_pretty(&root).expect("Failed to serialize glTF JSON");
    std::fs::write(&path, text).expect("Failed to write glTF");
    path
}
