//! Shared geometry types for the room and its openings.
//!
//! Every other module depends on these definitions rather than declaring
//! its own. Coordinates are either *normalized* (each axis in
//! `[-0.5, 0.5]`, independent of room size) or *world* (normalized scaled
//! by [`RoomDimensions`]).

use serde::{Deserialize, Serialize};

use crate::constants::room::{
    DEFAULT_DEPTH, DEFAULT_HEIGHT, DEFAULT_WIDTH, DIMENSION_FLOOR, HALF_EXTENT,
};

/// 3D point or vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise product.
    pub fn scale_by(self, other: Self) -> Self {
        Self {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    pub fn component(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

/// Screen-space point in pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// Index pair into [`CUBOID_VERTICES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub start: usize,
    pub end: usize,
}

impl Edge {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The 8 corners of the normalized cuboid.
///
/// Indices 0–3 are the `z = -0.5` face, 4–7 the `z = +0.5` face, both
/// wound the same way so `i` and `i + 4` are joined by a depth edge.
pub const CUBOID_VERTICES: [Vec3; 8] = [
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
];

/// The 12 edges of the cuboid.
pub const CUBOID_EDGES: [Edge; 12] = [
    Edge::new(0, 1),
    Edge::new(1, 2),
    Edge::new(2, 3),
    Edge::new(3, 0),
    Edge::new(4, 5),
    Edge::new(5, 6),
    Edge::new(6, 7),
    Edge::new(7, 4),
    Edge::new(0, 4),
    Edge::new(1, 5),
    Edge::new(2, 6),
    Edge::new(3, 7),
];

/// Room size in meters.
///
/// Raw values are kept as entered; [`RoomDimensions::clamped`] is what
/// every scaling or division goes through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Default for RoomDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            depth: DEFAULT_DEPTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl RoomDimensions {
    pub fn new(width: f32, depth: f32, height: f32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Copy with every dimension raised to [`DIMENSION_FLOOR`].
    ///
    /// NaN is treated as degenerate and floored too.
    pub fn clamped(&self) -> Self {
        let floor = |v: f32| if v > DIMENSION_FLOOR { v } else { DIMENSION_FLOOR };
        Self {
            width: floor(self.width),
            depth: floor(self.depth),
            height: floor(self.height),
        }
    }

    /// Normalized → world scale vector. Width runs along x, height along y,
    /// depth along z.
    pub fn scale_vector(&self) -> Vec3 {
        let c = self.clamped();
        Vec3::new(c.width, c.height, c.depth)
    }

    /// `width · depth · height` of the clamped room.
    pub fn volume(&self) -> f32 {
        let c = self.clamped();
        c.width * c.depth * c.height
    }

    /// Largest clamped dimension, never below 1.0.
    pub fn max_extent(&self) -> f32 {
        let c = self.clamped();
        c.width.max(c.depth).max(c.height).max(1.0)
    }
}

/// A planar quad cut into one face of the normalized cuboid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningDefinition {
    pub corners: [Vec3; 4],
}

impl OpeningDefinition {
    /// Axis-aligned rectangle centred on the face where `axis = side · 0.5`.
    ///
    /// On a wall (X or Z), `half_horizontal` runs along the wall and
    /// `half_vertical` along y. On the floor or ceiling (Y) they run along
    /// x and z respectively.
    pub fn on_face(axis: Axis, side: f32, half_horizontal: f32, half_vertical: f32) -> Self {
        let w = side.signum() * HALF_EXTENT;
        let (h, v) = (half_horizontal, half_vertical);
        let corners = match axis {
            Axis::Z => [
                Vec3::new(-h, -v, w),
                Vec3::new(h, -v, w),
                Vec3::new(h, v, w),
                Vec3::new(-h, v, w),
            ],
            Axis::X => [
                Vec3::new(w, -v, -h),
                Vec3::new(w, -v, h),
                Vec3::new(w, v, h),
                Vec3::new(w, v, -h),
            ],
            Axis::Y => [
                Vec3::new(-h, w, -v),
                Vec3::new(h, w, -v),
                Vec3::new(h, w, v),
                Vec3::new(-h, w, v),
            ],
        };
        Self { corners }
    }

    /// The single axis whose coordinate is ±0.5 on all four corners.
    ///
    /// Returns `None` if no axis, or more than one, is pinned to a wall.
    pub fn pinned_axis(&self) -> Option<Axis> {
        let pinned: Vec<Axis> = Axis::ALL
            .into_iter()
            .filter(|&axis| {
                let first = self.corners[0].component(axis);
                (first.abs() - HALF_EXTENT).abs() < f32::EPSILON
                    && self
                        .corners
                        .iter()
                        .all(|c| (c.component(axis) - first).abs() < f32::EPSILON)
            })
            .collect();
        match pinned.as_slice() {
            [axis] => Some(*axis),
            _ => None,
        }
    }

    /// The corners joined in order, closing back to the first.
    pub fn outline(&self) -> [(Vec3, Vec3); 4] {
        let c = &self.corners;
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }
}
