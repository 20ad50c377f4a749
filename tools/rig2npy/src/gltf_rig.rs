//! glTF rig engine
//!
//! Loads a glTF/GLB scene, keeps each node's rest TRS plus its animation
//! channels, and evaluates forward kinematics on demand. Each glTF animation
//! is one action; keyframe times map to frames at a fixed frame rate.

use anyhow::{Context, Result, bail};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use hashbrown::HashSet;
use std::path::Path;

use crate::rig::{ActionInfo, Pose, PoseTime, RigError, RigSource};
use crate::sampling::{BoneTrs, sample_quat, sample_vec3};

/// Default sample rate for actions (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Node name Blender gives the armature object on export
pub const ARMATURE_NODE_NAME: &str = "Armature";

#[derive(Debug, Clone)]
struct RigNode {
    name: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    rest: BoneTrs,
}

#[derive(Debug, Clone)]
enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// One animation channel targeting one node property
#[derive(Debug, Clone)]
struct Track {
    node: usize,
    times: Vec<f32>,
    values: TrackValues,
    interpolation: Interpolation,
}

impl Track {
    fn apply(&self, trs: &mut BoneTrs, t: f32) {
        match &self.values {
            TrackValues::Translation(values) => {
                if let Some(v) = sample_vec3(&self.times, values, t, self.interpolation) {
                    trs.translation = v;
                }
            }
            TrackValues::Rotation(values) => {
                if let Some(q) = sample_quat(&self.times, values, t, self.interpolation) {
                    trs.rotation = q;
                }
            }
            TrackValues::Scale(values) => {
                if let Some(v) = sample_vec3(&self.times, values, t, self.interpolation) {
                    trs.scale = v;
                }
            }
        }
    }
}

/// Rig loaded from a glTF file
#[derive(Debug, Clone)]
pub struct GltfRig {
    nodes: Vec<RigNode>,
    /// Node indices with every parent before its children
    order: Vec<usize>,
    armature: Option<usize>,
    actions: Vec<ActionInfo>,
    clips: Vec<Vec<Track>>,
    frame_rate: f32,
}

impl GltfRig {
    /// Import a glTF/GLB file
    pub fn load(path: &Path, frame_rate: f32) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;
        Self::from_document(&document, &buffers, frame_rate)
    }

    pub fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        frame_rate: f32,
    ) -> Result<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            bail!("Frame rate must be positive, got {}", frame_rate);
        }

        let mut nodes: Vec<RigNode> = document
            .nodes()
            .map(|node| RigNode {
                name: node.name().map(str::to_string),
                parent: None,
                children: node.children().map(|child| child.index()).collect(),
                rest: BoneTrs::from_decomposed(node.transform().decomposed()),
            })
            .collect();
        for parent in 0..nodes.len() {
            for child in nodes[parent].children.clone() {
                nodes[child].parent = Some(parent);
            }
        }

        let order = parent_first_order(&nodes)?;
        let armature = find_armature(document, &nodes);

        let mut actions = Vec::new();
        let mut clips = Vec::new();
        for animation in document.animations() {
            let (info, tracks) = load_clip(&animation, buffers, frame_rate)?;
            actions.push(info);
            clips.push(tracks);
        }

        Ok(Self {
            nodes,
            order,
            armature,
            actions,
            clips,
            frame_rate,
        })
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    /// Name of the node treated as the armature object, if any
    pub fn armature_name(&self) -> Option<&str> {
        self.armature
            .and_then(|index| self.nodes[index].name.as_deref())
    }

    /// Names of every named node in the scene
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| node.name.as_deref())
    }

    fn world_transforms(&self, locals: &[BoneTrs]) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        for &index in &self.order {
            let local = locals[index].to_mat4();
            world[index] = match self.nodes[index].parent {
                Some(parent) => world[parent] * local,
                None => local,
            };
        }
        world
    }
}

impl RigSource for GltfRig {
    fn actions(&self) -> &[ActionInfo] {
        &self.actions
    }

    fn evaluate_pose_at(&self, time: PoseTime) -> Result<Pose, RigError> {
        let mut locals: Vec<BoneTrs> = self.nodes.iter().map(|node| node.rest).collect();

        if let PoseTime::Frame { action, frame } = time {
            let clip = self.clips.get(action).ok_or(RigError::UnknownAction {
                index: action,
                count: self.clips.len(),
            })?;
            let t = frame as f32 / self.frame_rate;
            for track in clip {
                track.apply(&mut locals[track.node], t);
            }
        }

        let world = self.world_transforms(&locals);
        let armature_world = self
            .armature
            .map(|index| world[index])
            .unwrap_or(Mat4::IDENTITY);
        let to_armature = armature_world.inverse();

        let bones = self
            .nodes
            .iter()
            .zip(&world)
            .filter_map(|(node, world)| {
                node.name
                    .as_ref()
                    .map(|name| (name.clone(), to_armature * *world))
            })
            .collect();

        Ok(Pose {
            armature_world,
            bones,
        })
    }
}

/// Breadth-first from the roots so parents are evaluated before children
fn parent_first_order(nodes: &[RigNode]) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = (0..nodes.len())
        .filter(|&index| nodes[index].parent.is_none())
        .collect();
    let mut cursor = 0;
    while cursor < order.len() {
        let index = order[cursor];
        order.extend_from_slice(&nodes[index].children);
        cursor += 1;
        if order.len() > nodes.len() {
            bail!("Node hierarchy is not a tree");
        }
    }
    if order.len() != nodes.len() {
        bail!("Node hierarchy contains a cycle");
    }
    Ok(order)
}

/// Node named `Armature`, else the parent of the first skin's root joint
fn find_armature(document: &gltf::Document, nodes: &[RigNode]) -> Option<usize> {
    if let Some(index) = nodes
        .iter()
        .position(|node| node.name.as_deref() == Some(ARMATURE_NODE_NAME))
    {
        return Some(index);
    }

    let skin = document.skins().next()?;
    let joints: HashSet<usize> = skin.joints().map(|joint| joint.index()).collect();

    if let Some(skeleton) = skin.skeleton() {
        let index = skeleton.index();
        return if joints.contains(&index) {
            nodes[index].parent
        } else {
            Some(index)
        };
    }

    let root = skin
        .joints()
        .map(|joint| joint.index())
        .find(|index| !nodes[*index].parent.is_some_and(|p| joints.contains(&p)))?;
    nodes[root].parent
}

fn load_clip(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    frame_rate: f32,
) -> Result<(ActionInfo, Vec<Track>)> {
    let name = animation.name().map(str::to_string);
    let mut tracks = Vec::new();
    let mut duration = 0.0f32;

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .with_context(|| format!("Animation {:?} has a channel without keyframe times", name))?
            .collect();
        let outputs = reader
            .read_outputs()
            .with_context(|| format!("Animation {:?} has a channel without keyframe values", name))?;

        let values = match outputs {
            ReadOutputs::Translations(it) => TrackValues::Translation(it.map(Vec3::from).collect()),
            ReadOutputs::Rotations(it) => {
                TrackValues::Rotation(it.into_f32().map(Quat::from_array).collect())
            }
            ReadOutputs::Scales(it) => TrackValues::Scale(it.map(Vec3::from).collect()),
            ReadOutputs::MorphTargetWeights(_) => continue, // Ignore morph targets
        };

        if let Some(&last) = times.last() {
            duration = duration.max(last);
        }

        tracks.push(Track {
            node: channel.target().node().index(),
            times,
            values,
            interpolation: channel.sampler().interpolation(),
        });
    }

    let end_frame = (duration * frame_rate).round() as u32;
    tracing::debug!(
        "Action {:?}: {} channels, {:.3}s, end frame {}",
        name,
        tracks.len(),
        duration,
        end_frame
    );

    Ok((ActionInfo { name, end_frame }, tracks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, parent: Option<usize>, children: Vec<usize>, translation: Vec3) -> RigNode {
        RigNode {
            name: Some(name.to_string()),
            parent,
            children,
            rest: BoneTrs {
                translation,
                ..Default::default()
            },
        }
    }

    fn chain_rig(clips: Vec<Vec<Track>>) -> GltfRig {
        // Armature (rotated 90 degrees about X) -> Hips -> Spine
        let mut armature = node("Armature", None, vec![1], Vec3::ZERO);
        armature.rest.rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let nodes = vec![
            armature,
            node("Hips", Some(0), vec![2], Vec3::new(0.0, 1.0, 0.0)),
            node("Spine", Some(1), vec![], Vec3::new(0.0, 0.5, 0.0)),
        ];
        let actions = clips
            .iter()
            .map(|_| ActionInfo {
                name: None,
                end_frame: 30,
            })
            .collect();
        GltfRig {
            order: parent_first_order(&nodes).unwrap(),
            nodes,
            armature: Some(0),
            actions,
            clips,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }

    #[test]
    fn test_parent_first_order() {
        let nodes = vec![
            node("c", Some(2), vec![], Vec3::ZERO),
            node("root", None, vec![2], Vec3::ZERO),
            node("b", Some(1), vec![0], Vec3::ZERO),
        ];
        assert_eq!(parent_first_order(&nodes).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_parent_first_order_rejects_cycle() {
        let nodes = vec![
            node("a", Some(1), vec![1], Vec3::ZERO),
            node("b", Some(0), vec![0], Vec3::ZERO),
        ];
        assert!(parent_first_order(&nodes).is_err());
    }

    #[test]
    fn test_rest_pose_forward_kinematics() {
        let rig = chain_rig(Vec::new());
        let pose = rig.evaluate_pose_at(PoseTime::Rest).unwrap();

        // Armature space keeps the rig's own Y-up offsets
        let spine = pose.bone_matrix("Spine").unwrap().transform_point3(Vec3::ZERO);
        assert!(spine.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-5));

        // World space applies the armature rotation (Y -> Z)
        let world = pose.joint_world_position("Spine").unwrap();
        assert!(world.abs_diff_eq(Vec3::new(0.0, 0.0, 1.5), 1e-5));
        assert_eq!(rig.armature_name(), Some("Armature"));
    }

    #[test]
    fn test_animated_frame_moves_children() {
        let track = Track {
            node: 1,
            times: vec![0.0, 1.0],
            values: TrackValues::Translation(vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0)]),
            interpolation: Interpolation::Linear,
        };
        let rig = chain_rig(vec![vec![track]]);

        // Frame 15 at 30 fps is t = 0.5
        let pose = rig
            .evaluate_pose_at(PoseTime::Frame {
                action: 0,
                frame: 15,
            })
            .unwrap();
        let spine = pose.bone_matrix("Spine").unwrap().transform_point3(Vec3::ZERO);
        assert!(spine.abs_diff_eq(Vec3::new(1.5, 1.5, 0.0), 1e-5));
    }

    #[test]
    fn test_unknown_action() {
        let rig = chain_rig(Vec::new());
        let err = rig
            .evaluate_pose_at(PoseTime::Frame {
                action: 0,
                frame: 0,
            })
            .unwrap_err();
        assert!(matches!(err, RigError::UnknownAction { index: 0, count: 0 }));
    }
}
