//! Helpers living outside the core renderer: scene setup and a recording surface.

pub mod recording;
pub use recording::{DrawCommand, RecordingSurface};

use super::*;

/// Builds a `T * R * S` transform.
pub fn create_transform(
    position: Vector3,
    rotation: na::UnitQuaternion<f32>,
    scale: Vector3,
) -> Transform {
    let translation = na::Translation3::from(position).to_homogeneous();
    let rotation = rotation.to_homogeneous();
    let scale = Matrix4::new_nonuniform_scaling(&scale);

    Transform::from_matrix_unchecked(translation * rotation * scale)
}

/// Camera placed at `eye`, looking towards `target`.
pub fn camera_looking_at(
    eye: Vector3,
    target: Vector3,
    up: Vector3,
    near: f32,
    far: f32,
) -> Camera {
    let view = Matrix4::look_at_rh(&eye.into(), &target.into(), &up);
    Camera::new(view, near, far)
}

/// Perspective projection of a world point into a [`RenderableVertex`].
///
/// `projection` is a regular OpenGL style projection matrix, so `z` ends up in `[-1; 1]` for
/// points between the clip planes.
pub fn project_vertex(
    projection: &Matrix4,
    camera: &Camera,
    position_world: Vector3,
) -> RenderableVertex {
    let clip = projection * camera.world_inverse * position_world.push(1.0);
    let w = clip.w;
    let ndc = if w != 0.0 { clip.xyz() / w } else { clip.xyz() };

    RenderableVertex::new(position_world, ndc.push(w))
}
