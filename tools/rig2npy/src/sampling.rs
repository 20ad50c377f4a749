//! Keyframe sampling for glTF animation channels

use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::Interpolation;
use std::ops::{Add, Mul};

/// Bone transform (TRS) for a single node at a single point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTrs {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTrs {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl BoneTrs {
    pub fn from_decomposed((t, r, s): ([f32; 3], [f32; 4], [f32; 3])) -> Self {
        Self {
            translation: Vec3::from(t),
            rotation: Quat::from_array(r),
            scale: Vec3::from(s),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Where a sample time falls relative to the keyframes
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    /// Before the first or after the last key: hold that key
    Clamp(usize),
    /// Between key `index` and `index + 1`
    Between { index: usize, factor: f32, dt: f32 },
}

fn locate(times: &[f32], t: f32) -> Option<Segment> {
    let last = times.len().checked_sub(1)?;
    if t <= times[0] {
        return Some(Segment::Clamp(0));
    }
    if t >= times[last] {
        return Some(Segment::Clamp(last));
    }

    // First key strictly after t; always in 1..=last here
    let next = times.partition_point(|&k| k <= t);
    let index = next - 1;
    let dt = times[next] - times[index];
    let factor = if dt > 0.0 { (t - times[index]) / dt } else { 0.0 };
    Some(Segment::Between {
        index,
        factor: factor.clamp(0.0, 1.0),
        dt,
    })
}

/// Cubic Hermite basis, as used by glTF CUBICSPLINE channels
fn hermite<T>(p0: T, m0: T, p1: T, m1: T, s: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let s2 = s * s;
    let s3 = s2 * s;
    p0 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + m0 * (s3 - 2.0 * s2 + s)
        + p1 * (-2.0 * s3 + 3.0 * s2)
        + m1 * (s3 - s2)
}

/// CUBICSPLINE outputs are stored as (in-tangent, value, out-tangent) per key
fn cubic_key<T: Copy>(values: &[T], key: usize) -> Option<(T, T, T)> {
    let base = key * 3;
    Some((
        *values.get(base)?,
        *values.get(base + 1)?,
        *values.get(base + 2)?,
    ))
}

/// Sample a translation/scale channel at time `t`
///
/// Returns `None` when the channel has no usable keys.
pub fn sample_vec3(
    times: &[f32],
    values: &[Vec3],
    t: f32,
    interpolation: Interpolation,
) -> Option<Vec3> {
    let segment = locate(times, t)?;
    match (interpolation, segment) {
        (Interpolation::CubicSpline, Segment::Clamp(key)) => cubic_key(values, key).map(|k| k.1),
        (Interpolation::CubicSpline, Segment::Between { index, factor, dt }) => {
            let (_, p0, out0) = cubic_key(values, index)?;
            let (in1, p1, _) = cubic_key(values, index + 1)?;
            Some(hermite(p0, out0 * dt, p1, in1 * dt, factor))
        }
        (_, Segment::Clamp(key)) | (Interpolation::Step, Segment::Between { index: key, .. }) => {
            values.get(key).copied()
        }
        (_, Segment::Between { index, factor, .. }) => {
            let v0 = *values.get(index)?;
            let v1 = *values.get(index + 1)?;
            Some(v0.lerp(v1, factor))
        }
    }
}

/// Sample a rotation channel at time `t`
///
/// Returns `None` when the channel has no usable keys.
pub fn sample_quat(
    times: &[f32],
    values: &[Quat],
    t: f32,
    interpolation: Interpolation,
) -> Option<Quat> {
    let segment = locate(times, t)?;
    match (interpolation, segment) {
        (Interpolation::CubicSpline, Segment::Clamp(key)) => {
            cubic_key(values, key).map(|k| k.1.normalize())
        }
        (Interpolation::CubicSpline, Segment::Between { index, factor, dt }) => {
            let (_, p0, out0) = cubic_key(values, index)?;
            let (in1, p1, _) = cubic_key(values, index + 1)?;
            let v: Vec4 = hermite(
                Vec4::from(p0),
                Vec4::from(out0) * dt,
                Vec4::from(p1),
                Vec4::from(in1) * dt,
                factor,
            );
            Some(Quat::from_vec4(v).normalize())
        }
        (_, Segment::Clamp(key)) | (Interpolation::Step, Segment::Between { index: key, .. }) => {
            values.get(key).copied()
        }
        (_, Segment::Between { index, factor, .. }) => {
            let q0 = *values.get(index)?;
            let q1 = *values.get(index + 1)?;
            // slerp takes the shortest path
            Some(q0.slerp(q1, factor))
        }
    }
}
