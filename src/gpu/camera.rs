//! Scene and light cameras.

use glam::{Mat4, Vec3};

use crate::config::SceneSettings;

/// Orbit camera the scene is viewed through.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera on the +Z axis looking at the origin.
    pub fn new(scene: &SceneSettings) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: scene.camera_distance,
            target: Vec3::ZERO,
            fov_degrees: scene.camera_fov_degrees,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&SceneSettings::default())
    }
}

/// Top-down orthographic camera that follows the attractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightCamera {
    /// Half extent of the square frustum.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    /// Offset above the follow target.
    pub height: f32,
}

impl LightCamera {
    pub fn new(scene: &SceneSettings) -> Self {
        Self {
            extent: scene.shadow_extent,
            near: scene.shadow_near,
            far: scene.shadow_far,
            height: scene.light_height,
        }
    }

    pub fn position(&self, follow: Vec3) -> Vec3 {
        follow + Vec3::Y * self.height
    }

    /// Projection times view for a light hovering over `follow`.
    ///
    /// The view direction is straight down, so the up vector is -Z: texture
    /// rows run from -Z to +Z.
    pub fn light_space(&self, follow: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(self.position(follow), follow, Vec3::NEG_Z);
        let projection = Mat4::orthographic_rh(
            -self.extent,
            self.extent,
            -self.extent,
            self.extent,
            self.near,
            self.far,
        );
        projection * view
    }
}

impl Default for LightCamera {
    fn default() -> Self {
        Self::new(&SceneSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    #[test]
    fn test_default_camera_sits_on_z() {
        let camera = Camera::default();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-5);

        let clip = camera.view_proj(1.0) * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn test_light_centers_follow_target() {
        let light = LightCamera::default();
        let follow = Vec3::new(1.0, -2.0, 0.5);
        let clip = light.light_space(follow) * follow.extend(1.0);

        assert!((clip.w - 1.0).abs() < 1e-6);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        // Ten units below the light in a 0..50 depth range.
        assert!((clip.z - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_light_space_tracks_follow_target() {
        let light = LightCamera::default();
        let point = Vec3::new(2.0, 0.0, 0.0);
        let a = light.light_space(Vec3::ZERO) * point.extend(1.0);
        let b = light.light_space(Vec3::new(2.0, 0.0, 0.0)) * point.extend(1.0);
        assert!((a.x - 0.4).abs() < 1e-5);
        assert!(b.x.abs() < 1e-5);
    }
}
