//! Synthetic scene source.
//!
//! Renders labelled primitives drifting over a depth ramp, standing in for
//! the depth sensor and the segmentation model when no hardware is around.
//! Used by the CLI's offline renderer and by tests.

use sonoscan_core::ShapeId;

use crate::classify::Segmenter;
use crate::grid::{ClassFrame, DepthImage};

/// One moving object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    /// Which primitive (and class id) to draw.
    pub shape: ShapeId,
    /// Horizontal center at t = 0, fraction of the frame width.
    pub x: f32,
    /// Vertical center, fraction of the frame height.
    pub y: f32,
    /// Half-size, fraction of the frame height.
    pub radius: f32,
    /// Distance in meters.
    pub depth_m: f32,
    /// Horizontal drift, frame widths per second (wraps around).
    pub velocity: f32,
}

impl SceneObject {
    fn center_x(&self, t: f64) -> f32 {
        (f64::from(self.x) + f64::from(self.velocity) * t).rem_euclid(1.0) as f32
    }

    /// Whether the normalized point `(u, v)` lies inside the object at `t`.
    ///
    /// `u` is in frame widths, `v` and the object size in frame heights;
    /// `aspect` is width / height.
    fn contains(&self, u: f32, v: f32, t: f64, aspect: f32) -> bool {
        let dx = (u - self.center_x(t)) * aspect;
        let dy = v - self.y;
        let r = self.radius;
        match self.shape {
            ShapeId::None => false,
            ShapeId::Sphere => dx * dx + dy * dy <= r * r,
            ShapeId::Cube => dx.abs() <= r && dy.abs() <= r,
            ShapeId::Triangle => {
                // apex up; base at y + r, width 2r
                if dy < -r || dy > r {
                    return false;
                }
                let half_width = r * (dy + r) / (2.0 * r);
                dx.abs() <= half_width
            }
        }
    }
}

/// A scene of objects in front of a receding floor.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticScene {
    /// Sensor frame width in pixels.
    pub width: usize,
    /// Sensor frame height in pixels.
    pub height: usize,
    /// Depth of the bottom row (floor at the user's feet).
    pub floor_near_m: f32,
    /// Depth of the top row (far wall).
    pub floor_far_m: f32,
    /// Objects, later ones drawn on top.
    pub objects: Vec<SceneObject>,
}

impl SyntheticScene {
    /// Three drifting objects, one of each shape.
    pub fn demo(width: usize, height: usize) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            floor_near_m: 0.6,
            floor_far_m: 5.0,
            objects: vec![
                SceneObject {
                    shape: ShapeId::Sphere,
                    x: 0.2,
                    y: 0.55,
                    radius: 0.18,
                    depth_m: 1.2,
                    velocity: 0.05,
                },
                SceneObject {
                    shape: ShapeId::Triangle,
                    x: 0.55,
                    y: 0.45,
                    radius: 0.22,
                    depth_m: 2.4,
                    velocity: -0.03,
                },
                SceneObject {
                    shape: ShapeId::Cube,
                    x: 0.85,
                    y: 0.6,
                    radius: 0.15,
                    depth_m: 0.8,
                    velocity: 0.02,
                },
            ],
        }
    }

    fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    fn floor_depth(&self, y: usize) -> f32 {
        let v = if self.height > 1 {
            y as f32 / (self.height - 1) as f32
        } else {
            1.0
        };
        self.floor_near_m * v + self.floor_far_m * (1.0 - v)
    }

    fn pixel_uv(&self, x: usize, y: usize) -> (f32, f32) {
        (
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Render the depth frame at `t` seconds into `out` (resized to fit).
    pub fn render_depth_into(&self, t: f64, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.width * self.height);
        let aspect = self.aspect();
        for y in 0..self.height {
            let floor = self.floor_depth(y);
            for x in 0..self.width {
                let (u, v) = self.pixel_uv(x, y);
                let depth = self
                    .objects
                    .iter()
                    .rev()
                    .find(|o| o.contains(u, v, t, aspect))
                    .map_or(floor, |o| o.depth_m);
                out.push(depth);
            }
        }
    }

    /// Render the class frame at `t` seconds.
    pub fn render_classes(&self, t: f64) -> ClassFrame {
        let aspect = self.aspect();
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let (u, v) = self.pixel_uv(x, y);
                let id = self
                    .objects
                    .iter()
                    .rev()
                    .find(|o| o.contains(u, v, t, aspect))
                    .map_or(0, |o| o.shape.id());
                data.push(id);
            }
        }
        ClassFrame {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Borrow a rendered depth buffer as a [`DepthImage`].
    pub fn depth_image<'a>(&self, buffer: &'a [f32]) -> DepthImage<'a> {
        DepthImage::new(self.width, self.height, buffer)
    }
}

/// Segmenter that labels the synthetic scene perfectly.
#[derive(Debug, Clone)]
pub struct SyntheticSegmenter {
    scene: SyntheticScene,
}

impl SyntheticSegmenter {
    /// Wrap a scene.
    pub fn new(scene: SyntheticScene) -> Self {
        Self { scene }
    }
}

impl Segmenter for SyntheticSegmenter {
    /// Scene time in seconds.
    type Input = f64;

    fn segment(&mut self, t: &f64) -> Option<ClassFrame> {
        Some(self.scene.render_classes(*t))
    }
}
