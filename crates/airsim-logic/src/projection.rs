//! Cuboid transform and perspective projection.
//!
//! A normalized point goes through four steps:
//!
//! 1. scale per axis by the (clamped) room dimensions,
//! 2. yaw about the vertical axis by `rotation_y`,
//! 3. pitch about the horizontal axis by `rotation_x`,
//! 4. scale by `view_extent / max(width, depth, height, 1)`.
//!
//! Yaw always precedes pitch. The cuboid, its openings and the particles
//! all go through [`ViewTransform`] so they stay registered to each other
//! under rotation. [`project`] then applies the perspective divide
//! `focal / (focal + z)` and offsets by the view centre.
//!
//! ```
//! use airsim_logic::geometry::{Point2, RoomDimensions};
//! use airsim_logic::projection::{project, transform};
//!
//! let corners = transform(&RoomDimensions::default(), 0.0, 0.0, 350.0);
//! let p = project(corners[0], Point2::new(400.0, 300.0), 500.0);
//! assert!(p.x < 400.0 && p.y < 300.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, RoomDimensions, Vec3, CUBOID_VERTICES};

/// Rotate a world-space point: yaw about y first, then pitch about x.
pub fn rotate(p: Vec3, rotation_x: f32, rotation_y: f32) -> Vec3 {
    let (sin_y, cos_y) = rotation_y.sin_cos();
    let (sin_x, cos_x) = rotation_x.sin_cos();
    rotate_with(p, sin_x, cos_x, sin_y, cos_y)
}

fn rotate_with(p: Vec3, sin_x: f32, cos_x: f32, sin_y: f32, cos_y: f32) -> Vec3 {
    let x = p.x * cos_y - p.z * sin_y;
    let z_yawed = p.x * sin_y + p.z * cos_y;
    let y = p.y * cos_x - z_yawed * sin_x;
    let z = p.y * sin_x + z_yawed * cos_x;
    Vec3::new(x, y, z)
}

/// Scale that fits the largest room dimension to `view_extent`.
pub fn view_scale(dims: &RoomDimensions, view_extent: f32) -> f32 {
    view_extent / dims.max_extent()
}

/// Transform the 8 normalized cuboid corners into view space.
pub fn transform(
    dims: &RoomDimensions,
    rotation_x: f32,
    rotation_y: f32,
    view_extent: f32,
) -> [Vec3; 8] {
    let view = ViewTransform::new(dims, rotation_x, rotation_y, view_extent);
    CUBOID_VERTICES.map(|v| view.apply(v))
}

/// Perspective factor for a view-space depth.
///
/// Not clamped: callers keep `z > -focal_length` by choosing a focal
/// length longer than the fitted room's half diagonal.
pub fn perspective_factor(z: f32, focal_length: f32) -> f32 {
    focal_length / (focal_length + z)
}

/// Project a view-space point onto the screen, rounded to whole pixels.
pub fn project(p: Vec3, view_center: Point2, focal_length: f32) -> Point2 {
    let f = perspective_factor(p.z, focal_length);
    Point2::new(
        (p.x * f + view_center.x).round(),
        (p.y * f + view_center.y).round(),
    )
}

/// Precomputed normalized → view-space mapping for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    scale: Vec3,
    fit: f32,
    sin_x: f32,
    cos_x: f32,
    sin_y: f32,
    cos_y: f32,
}

impl ViewTransform {
    pub fn new(dims: &RoomDimensions, rotation_x: f32, rotation_y: f32, view_extent: f32) -> Self {
        let (sin_x, cos_x) = rotation_x.sin_cos();
        let (sin_y, cos_y) = rotation_y.sin_cos();
        Self {
            scale: dims.scale_vector(),
            fit: view_scale(dims, view_extent),
            sin_x,
            cos_x,
            sin_y,
            cos_y,
        }
    }

    /// Normalized room point → rotated, view-fitted point.
    pub fn apply(&self, normalized: Vec3) -> Vec3 {
        let world = normalized.scale_by(self.scale);
        rotate_with(world, self.sin_x, self.cos_x, self.sin_y, self.cos_y) * self.fit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::max_view_radius;
    use approx::assert_abs_diff_eq;

    const CENTER: Point2 = Point2::new(400.0, 300.0);

    #[test]
    fn test_zero_rotation_is_scale_only() {
        let dims = RoomDimensions::new(4.0, 2.0, 1.0);
        let corners = transform(&dims, 0.0, 0.0, 100.0);
        // fit = 100 / 4 = 25
        assert_abs_diff_eq!(corners[6].x, 0.5 * 4.0 * 25.0, epsilon = 1e-4);
        assert_abs_diff_eq!(corners[6].y, 0.5 * 1.0 * 25.0, epsilon = 1e-4);
        assert_abs_diff_eq!(corners[6].z, 0.5 * 2.0 * 25.0, epsilon = 1e-4);
    }

    #[test]
    fn test_yaw_quarter_turn() {
        let p = rotate(Vec3::new(1.0, 0.0, 0.0), 0.0, std::f32::consts::FRAC_PI_2);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_yaw_then_pitch_order() {
        // A point on +x yawed a quarter turn lands on +z; pitching then moves it
        // into y. Pitch-then-yaw would leave y untouched.
        let half_pi = std::f32::consts::FRAC_PI_2;
        let p = rotate(Vec3::new(1.0, 0.0, 0.0), half_pi, half_pi);
        assert_abs_diff_eq!(p.y, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_preserves_length() {
        let p = Vec3::new(0.3, -1.2, 2.0);
        let r = rotate(p, 0.7, -1.9);
        let len = |v: Vec3| (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
        assert_abs_diff_eq!(len(p), len(r), epsilon = 1e-5);
    }

    #[test]
    fn test_projection_rounds_to_pixels() {
        let p = project(Vec3::new(10.4, -3.6, 0.0), CENTER, 500.0);
        assert_eq!(p, Point2::new(410.0, 296.0));
    }

    #[test]
    fn test_farther_points_shrink() {
        let near = project(Vec3::new(100.0, 0.0, -50.0), CENTER, 500.0);
        let far = project(Vec3::new(100.0, 0.0, 50.0), CENTER, 500.0);
        assert!(near.x - CENTER.x > far.x - CENTER.x);
    }

    #[test]
    fn test_front_face_aspect_matches_room() {
        let dims = RoomDimensions::new(6.0, 4.0, 3.0);
        let corners = transform(&dims, 0.0, 0.0, 350.0);
        let screen: Vec<Point2> = corners.iter().map(|&c| project(c, CENTER, 500.0)).collect();
        // Indices 0..4 are the z = -0.5 face, all at the same depth.
        let width = screen[1].x - screen[0].x;
        let height = screen[2].y - screen[1].y;
        assert_abs_diff_eq!(width / height, 6.0 / 3.0, epsilon = 0.02);
    }

    #[test]
    fn test_depth_never_reaches_eye_plane() {
        let focal = 500.0;
        assert!(max_view_radius(350.0) < focal);
        let rooms = [
            RoomDimensions::new(5.0, 5.0, 3.0),
            RoomDimensions::new(30.0, 30.0, 30.0),
            RoomDimensions::new(0.0, 100.0, 0.5),
        ];
        for dims in rooms {
            for step in 0..24 {
                let angle = step as f32 * std::f32::consts::TAU / 24.0;
                for c in transform(&dims, angle, angle * 0.5, 350.0) {
                    assert!(c.z > -focal, "corner {:?} reached the eye plane", c);
                    assert!(perspective_factor(c.z, focal) > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_view_transform_matches_free_functions() {
        let dims = RoomDimensions::new(7.0, 3.0, 2.4);
        let view = ViewTransform::new(&dims, 0.4, -0.6, 350.0);
        let v = Vec3::new(0.25, -0.1, 0.5);
        let direct = rotate(v.scale_by(dims.scale_vector()), 0.4, -0.6) * view_scale(&dims, 350.0);
        let cached = view.apply(v);
        assert_abs_diff_eq!(direct.x, cached.x, epsilon = 1e-4);
        assert_abs_diff_eq!(direct.y, cached.y, epsilon = 1e-4);
        assert_abs_diff_eq!(direct.z, cached.z, epsilon = 1e-4);
    }
}
