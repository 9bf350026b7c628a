//! Per-renderer animation state and the matrices uploaded each draw

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

/// Default rotation per draw, in radians.
pub const DEFAULT_SPEED: f32 = 0.01;

/// Rotation of one drawn shape. Each renderer owns its own state, so two
/// renderers never advance each other's angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    /// Current angle around the Y axis, kept in `[0, TAU)`.
    pub angle: f32,
    /// Radians added by each [`advance`](Self::advance).
    pub speed: f32,
    /// Distance from the camera to the shape's origin.
    pub distance: f32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: DEFAULT_SPEED,
            distance: 3.0,
        }
    }
}

impl RenderState {
    pub fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    /// Step the rotation and return the new angle.
    pub fn advance(&mut self) -> f32 {
        self.angle = (self.angle + self.speed).rem_euclid(TAU);
        self.angle
    }

    /// Camera-space transform of the shape at the current angle.
    pub fn model_view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance)) * Mat4::from_rotation_y(self.angle)
    }
}

/// Right-handed OpenGL perspective with a 45 degree vertical field of view.
pub fn projection(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(45f32.to_radians(), aspect.max(f32::EPSILON), 0.1, 100.0)
}

/// Matrices uploaded as the `model_view` and `projection` uniforms.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl FrameUniforms {
    pub fn new(state: &RenderState, projection: Mat4) -> Self {
        Self {
            model_view: state.model_view().to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }

    pub fn model_view_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.model_view)
    }

    pub fn projection_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_around() {
        let mut state = RenderState::with_speed(TAU / 4.0);
        for _ in 0..4 {
            state.advance();
        }
        assert!(state.angle.abs() < 1e-5 || (TAU - state.angle).abs() < 1e-5);
        assert!(state.angle < TAU);
    }

    #[test]
    fn renderers_keep_independent_angles() {
        let mut a = RenderState::default();
        let b = RenderState::default();
        a.advance();
        a.advance();
        assert!((a.angle - 2.0 * DEFAULT_SPEED).abs() < 1e-6);
        assert_eq!(b.angle, 0.0);
    }

    #[test]
    fn model_view_pushes_the_shape_in_front_of_the_camera() {
        let state = RenderState::default();
        let origin = state.model_view().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(0.0, 0.0, -3.0));

        let mut turned = RenderState::with_speed(std::f32::consts::FRAC_PI_2);
        turned.advance();
        let x = turned.model_view().transform_vector3(Vec3::X);
        assert!((x - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn uniforms_are_column_major() {
        let state = RenderState::default();
        let uniforms = FrameUniforms::new(&state, Mat4::IDENTITY);
        assert_eq!(uniforms.model_view_slice().len(), 16);
        // Translation lives in the last column.
        assert_eq!(&uniforms.model_view_slice()[12..16], &[0.0, 0.0, -3.0, 1.0]);
        assert_eq!(uniforms.projection_slice(), Mat4::IDENTITY.to_cols_array().as_slice());
    }

    #[test]
    fn projection_survives_a_zero_aspect() {
        let m = projection(0.0);
        assert!(m.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
