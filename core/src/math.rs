//! Camera, projection and host-matrix helpers.
//!
//! The host stores matrices row-major and multiplies row vectors
//! (`p' = p * M`). Reading those 16 floats as columns gives the equivalent
//! column-vector matrix used by `glam`, so everything here is expressed in
//! column-vector form: `view_proj = proj * view`.

use glam::{Affine3A, Mat3A, Mat4, Vec2, Vec3, Vec3A, Vec4};

// ===== Host matrices =====

/// Convert 16 host floats (row-major, row-vector convention) into a column-vector matrix.
pub fn mat4_from_host(floats: &[f32; 16]) -> Mat4 {
    Mat4::from_cols_array(floats)
}

/// Affine transform as laid out by the host: three basis rows and a translation row.
///
/// A point transforms as `p.x * row0 + p.y * row1 + p.z * row2 + row3`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Matrix4x3 {
    pub row0: Vec3,
    pub row1: Vec3,
    pub row2: Vec3,
    pub row3: Vec3,
}

impl Matrix4x3 {
    pub const IDENTITY: Self = Self {
        row0: Vec3::X,
        row1: Vec3::Y,
        row2: Vec3::Z,
        row3: Vec3::ZERO,
    };

    /// Axis-aligned scale followed by a translation.
    pub fn from_scale_translation(scale: Vec3, translation: Vec3) -> Self {
        Self {
            row0: Vec3::new(scale.x, 0.0, 0.0),
            row1: Vec3::new(0.0, scale.y, 0.0),
            row2: Vec3::new(0.0, 0.0, scale.z),
            row3: translation,
        }
    }

    /// Transform a point (translation applied).
    #[inline]
    pub fn transform_coordinate(&self, p: Vec3) -> Vec3 {
        p.x * self.row0 + p.y * self.row1 + p.z * self.row2 + self.row3
    }

    /// Convert into a column-vector affine transform.
    pub fn to_affine(&self) -> Affine3A {
        Affine3A {
            matrix3: Mat3A::from_cols(
                Vec3A::from(self.row0),
                Vec3A::from(self.row1),
                Vec3A::from(self.row2),
            ),
            translation: Vec3A::from(self.row3),
        }
    }

    /// Rows of the transposed 3x4 matrix, the layout instanced shaders consume.
    pub fn to_gpu_rows(&self) -> [[f32; 4]; 3] {
        let col = |i: usize| {
            [
                self.row0[i],
                self.row1[i],
                self.row2[i],
                self.row3[i],
            ]
        };
        [col(0), col(1), col(2)]
    }
}

/// Axis-aligned bounding box with host layout (min then max).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size along each axis.
    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Transform that maps the `[-1, 1]^3` unit cube onto this box.
    pub fn unit_cube_transform(&self) -> Matrix4x3 {
        Matrix4x3::from_scale_translation(self.extent(), self.center())
    }

    /// Corners indexed by bit pattern `xyz`: bit 2 selects max x, bit 1 max y, bit 0 max z.
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 4 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 1 != 0 { self.max.z } else { self.min.z },
            )
        })
    }
}

// ===== Camera =====

/// Camera values derived from the host matrices once per frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraState {
    pub view_proj: Mat4,
    pub proj: Mat4,
    pub view: Mat4,
    pub camera_world: Mat4,
    /// Facing north = 0, west = pi/2, south = +-pi, east = -pi/2.
    pub azimuth: f32,
    /// Facing horizontally = 0, down = pi/2, up = -pi/2.
    pub altitude: f32,
    pub viewport_size: Vec2,
}

impl CameraState {
    /// Decompose the host view-projection and projection matrices.
    ///
    /// Degenerate matrices are not guarded; NaNs propagate like they do in the host.
    pub fn new(view_proj: Mat4, proj: Mat4, viewport_size: Vec2) -> Self {
        let view = proj.inverse() * view_proj;
        let camera_world = view.inverse();
        let forward_row = view.row(2);
        Self {
            view_proj,
            proj,
            view,
            camera_world,
            azimuth: forward_row.x.atan2(forward_row.z),
            altitude: forward_row.y.asin(),
            viewport_size,
        }
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.camera_world.w_axis.truncate()
    }

    /// Near plane equation; `dot((p, 1), plane) > 0` means in front of the camera.
    pub fn near_plane(&self) -> Vec4 {
        self.view_proj.row(2)
    }

    pub fn world_to_screen(&self, world: Vec3, viewport_origin: Vec2) -> Vec2 {
        world_to_screen(world, &self.view_proj, self.viewport_size, viewport_origin)
    }

    pub fn clip_to_near_plane(&self, a: Vec3, b: Vec3) -> Option<(Vec3, Vec3)> {
        clip_to_near_plane(a, b, &self.view_proj)
    }

    /// Ray from the camera through a screen position relative to the viewport origin.
    ///
    /// Returns the origin (camera position) and the normalized direction.
    pub fn screen_ray(&self, screen: Vec2) -> (Vec3, Vec3) {
        let clip = screen_to_clip(screen, self.viewport_size);
        let at_plane = self.view_proj.inverse().project_point3(clip);
        let origin = self.position();
        (origin, (at_plane - origin).normalize())
    }
}

// ===== Projection =====

/// Project a world point into screen space; y grows downwards.
pub fn world_to_screen(world: Vec3, view_proj: &Mat4, viewport_size: Vec2, viewport_origin: Vec2) -> Vec2 {
    let p = view_proj.project_point3(world);
    Vec2::new(
        0.5 * viewport_size.x * (1.0 + p.x),
        0.5 * viewport_size.y * (1.0 - p.y),
    ) + viewport_origin
}

/// Inverse of the viewport mapping at depth 1 (far plane in the host's depth range).
pub fn screen_to_clip(screen: Vec2, viewport_size: Vec2) -> Vec3 {
    Vec3::new(
        2.0 * screen.x / viewport_size.x - 1.0,
        1.0 - 2.0 * screen.y / viewport_size.y,
        1.0,
    )
}

/// Clip a segment against the camera near plane.
///
/// Returns `None` when both endpoints are on or behind the plane. A crossing
/// segment has its behind endpoint moved onto the plane.
pub fn clip_to_near_plane(a: Vec3, b: Vec3, view_proj: &Mat4) -> Option<(Vec3, Vec3)> {
    let n = view_proj.row(2);
    let an = a.extend(1.0).dot(n);
    let bn = b.extend(1.0).dot(n);
    if an <= 0.0 && bn <= 0.0 {
        return None;
    }

    if an < 0.0 || bn < 0.0 {
        let ab = b - a;
        let t = -an / ab.dot(n.truncate());
        let p = a + t * ab;
        return Some(if an < 0.0 { (p, b) } else { (a, p) });
    }
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f32 = 1e-4;

    fn standard_camera(eye: Vec3, target: Vec3) -> CameraState {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        CameraState::new(proj * view, proj, Vec2::new(1920.0, 1080.0))
    }

    #[rstest]
    #[case(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0))]
    #[case(Vec3::new(10.0, 5.0, -3.0), Vec3::new(0.0, 0.0, 0.0))]
    #[case(Vec3::new(-40.0, 2.0, 7.0), Vec3::new(-40.0, -10.0, 8.0))]
    fn view_decomposition_roundtrip(#[case] eye: Vec3, #[case] target: Vec3) {
        let expected_view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let camera = standard_camera(eye, target);

        assert!(camera.view.abs_diff_eq(expected_view, 1e-3));
        let back = camera.proj * camera.view;
        assert!(back.abs_diff_eq(camera.view_proj, 1e-3));
        assert!((camera.camera_world * camera.view).abs_diff_eq(Mat4::IDENTITY, 1e-3));
        assert!((camera.position() - eye).length() < 1e-3);
    }

    #[test]
    fn azimuth_and_altitude_of_level_camera() {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(camera.altitude.abs() < EPS);
        assert!(camera.azimuth.abs() < EPS);

        let down = standard_camera(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 0.0, -10.0));
        assert!((down.altitude - std::f32::consts::FRAC_PI_4).abs() < 1e-3);
    }

    #[test]
    fn point_ahead_projects_to_viewport_center() {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let screen = camera.world_to_screen(Vec3::new(0.0, 0.0, -10.0), Vec2::ZERO);
        assert!((screen - Vec2::new(960.0, 540.0)).length() < 1e-2);
    }

    #[test]
    fn identity_projection_maps_origin_to_center() {
        let screen = world_to_screen(
            Vec3::ZERO,
            &Mat4::IDENTITY,
            Vec2::new(800.0, 600.0),
            Vec2::new(100.0, 50.0),
        );
        assert_eq!(screen, Vec2::new(500.0, 350.0));
    }

    #[test]
    fn screen_y_is_flipped() {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let above = camera.world_to_screen(Vec3::new(0.0, 1.0, -10.0), Vec2::ZERO);
        assert!(above.y < 540.0);
    }

    #[test]
    fn clip_keeps_segment_in_front() {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let a = Vec3::new(-1.0, 0.0, -5.0);
        let b = Vec3::new(1.0, 2.0, -20.0);
        assert_eq!(camera.clip_to_near_plane(a, b), Some((a, b)));
    }

    #[test]
    fn clip_rejects_segment_behind() {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let a = Vec3::new(-1.0, 0.0, 5.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(camera.clip_to_near_plane(a, b), None);
    }

    #[rstest]
    #[case(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 1.0, -5.0))]
    #[case(Vec3::new(3.0, 1.0, -8.0), Vec3::new(-2.0, 0.0, 4.0))]
    fn clip_moves_behind_endpoint_onto_plane(#[case] a: Vec3, #[case] b: Vec3) {
        let camera = standard_camera(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let plane = camera.near_plane();
        let (ca, cb) = camera.clip_to_near_plane(a, b).expect("segment crosses the plane");

        let a_behind = a.extend(1.0).dot(plane) < 0.0;
        let (clipped, kept, original) = if a_behind { (ca, cb, b) } else { (cb, ca, a) };
        assert!(clipped.extend(1.0).dot(plane).abs() < 1e-3);
        assert_eq!(kept, original);
    }

    #[test]
    fn screen_ray_points_through_cursor() {
        let camera = standard_camera(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 2.0, -1.0));
        let (origin, dir) = camera.screen_ray(Vec2::new(960.0, 540.0));
        assert!((origin - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-3);
        assert!((dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-3);
    }

    #[test]
    fn matrix4x3_matches_affine() {
        let m = Matrix4x3 {
            row0: Vec3::new(0.0, 0.0, -2.0),
            row1: Vec3::new(0.0, 3.0, 0.0),
            row2: Vec3::new(2.0, 0.0, 0.0),
            row3: Vec3::new(5.0, 6.0, 7.0),
        };
        let p = Vec3::new(1.0, -1.0, 0.5);
        let expected = m.transform_coordinate(p);
        assert!((m.to_affine().transform_point3(p) - expected).length() < EPS);
        assert_eq!(expected, Vec3::new(6.0, 3.0, 5.0));
    }

    #[test]
    fn aabb_unit_cube_transform() {
        let bb = Aabb::new(Vec3::new(-2.0, 0.0, 4.0), Vec3::new(2.0, 2.0, 8.0));
        let m = bb.unit_cube_transform();
        assert_eq!(m.transform_coordinate(Vec3::splat(-1.0)), bb.min);
        assert_eq!(m.transform_coordinate(Vec3::splat(1.0)), bb.max);
        assert_eq!(bb.corners()[0b101], Vec3::new(2.0, 0.0, 8.0));
    }
}
