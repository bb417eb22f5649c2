//! Render-ready primitives: projected line segments and particle sprites.
//!
//! Room edges and opening outlines only change when the rotation, room
//! size or opening set changes, so [`GeometryCache`] keeps them until its
//! key differs. Particles move every frame and are projected each time.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::constants::particles::{MAX_DEPTH_FACTOR, MIN_DEPTH_FACTOR};
use crate::geometry::{Point2, RoomDimensions, CUBOID_EDGES, CUBOID_VERTICES};
use crate::openings::{OpeningCatalog, OpeningKind};
use crate::particles::Particle;
use crate::pollutant::Rgb;
use crate::projection::{perspective_factor, project, ViewTransform};

/// 2D line with a colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point2,
    pub end: Point2,
    pub color: Rgb,
}

/// One opening outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningOutline {
    pub kind: OpeningKind,
    pub segments: [LineSegment; 4],
}

/// One particle ready to draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSprite {
    pub position: Point2,
    /// Radius in pixels, already scaled for depth.
    pub radius: f32,
    /// Depth scale in `[0.2, 1.0]`.
    pub scale: f32,
    pub color: Rgb,
    pub alpha: u8,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub edges: Vec<LineSegment>,
    pub openings: Vec<OpeningOutline>,
    pub particles: Vec<ParticleSprite>,
}

/// Inputs that invalidate cached room geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GeometryKey {
    dims: RoomDimensions,
    rotation_x: f32,
    rotation_y: f32,
    openings_revision: u64,
    opening_counts: (u8, u8),
}

/// Projected room edges and opening outlines, rebuilt on demand.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    key: Option<GeometryKey>,
    edges: Vec<LineSegment>,
    openings: Vec<OpeningOutline>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-project if anything changed. Returns `true` when it did.
    pub fn refresh(
        &mut self,
        dims: &RoomDimensions,
        rotation_x: f32,
        rotation_y: f32,
        catalog: &OpeningCatalog,
        config: &SimConfig,
    ) -> bool {
        let key = GeometryKey {
            dims: *dims,
            rotation_x,
            rotation_y,
            openings_revision: catalog.revision(),
            opening_counts: (catalog.passage_count(), catalog.window_count()),
        };
        if self.key == Some(key) {
            return false;
        }

        let view = ViewTransform::new(dims, rotation_x, rotation_y, config.view_extent);
        let to_screen = |p| project(view.apply(p), config.view_center, config.focal_length);

        let corners = CUBOID_VERTICES.map(to_screen);
        self.edges = CUBOID_EDGES
            .iter()
            .map(|e| LineSegment {
                start: corners[e.start],
                end: corners[e.end],
                color: Rgb::WHITE,
            })
            .collect();

        self.openings.clear();
        catalog.for_each_opening(|kind, def| {
            let segments = def.outline().map(|(a, b)| LineSegment {
                start: to_screen(a),
                end: to_screen(b),
                color: Rgb::CYAN,
            });
            self.openings.push(OpeningOutline { kind, segments });
        });

        log::debug!(
            "re-projected room: {} edges, {} openings",
            self.edges.len(),
            self.openings.len()
        );
        self.key = Some(key);
        true
    }

    /// Force the next [`refresh`](Self::refresh) to rebuild.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    pub fn edges(&self) -> &[LineSegment] {
        &self.edges
    }

    pub fn openings(&self) -> &[OpeningOutline] {
        &self.openings
    }
}

/// Project particles into sprites.
///
/// Nearer particles are drawn larger and more opaque; the depth factor is
/// clamped so far particles stay visible.
pub fn project_particles(
    particles: &[Particle],
    view: &ViewTransform,
    tint: Rgb,
    config: &SimConfig,
) -> Vec<ParticleSprite> {
    particles
        .iter()
        .map(|p| {
            let v = view.apply(p.position);
            let depth = perspective_factor(v.z, config.focal_length)
                .clamp(MIN_DEPTH_FACTOR, MAX_DEPTH_FACTOR);
            ParticleSprite {
                position: project(v, config.view_center, config.focal_length),
                radius: config.particle_radius * depth,
                scale: depth,
                color: tint,
                alpha: (p.alpha * depth).clamp(0.0, 255.0) as u8,
            }
        })
        .collect()
}
