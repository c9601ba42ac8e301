//! Ambient background shapes: a seeded field of orbs, diamonds, rings and
//! trails drifting behind the page and reacting mildly to the pointer.
//!
//! [`AmbientField::step`] is the simulation and [`AmbientField::render`] turns
//! the current state into [`Scene`] draw descriptions, so both run headless.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Orb,
    Diamond,
    Trail,
    Spark,
    Ring,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub glow: &'static str,
    pub kind: ShapeKind,
}

pub const PALETTE: [PaletteEntry; 4] = [
    PaletteEntry {
        fill: "rgba(14, 165, 233, 0.28)",
        stroke: "rgba(14, 165, 233, 0.55)",
        glow: "rgba(125, 211, 252, 0.5)",
        kind: ShapeKind::Orb,
    },
    PaletteEntry {
        fill: "rgba(168, 85, 247, 0.24)",
        stroke: "rgba(168, 85, 247, 0.52)",
        glow: "rgba(196, 181, 253, 0.45)",
        kind: ShapeKind::Diamond,
    },
    PaletteEntry {
        fill: "rgba(236, 72, 153, 0.22)",
        stroke: "rgba(236, 72, 153, 0.58)",
        glow: "rgba(244, 114, 182, 0.4)",
        kind: ShapeKind::Trail,
    },
    PaletteEntry {
        fill: "rgba(22, 163, 74, 0.22)",
        stroke: "rgba(22, 163, 74, 0.52)",
        glow: "rgba(134, 239, 172, 0.32)",
        kind: ShapeKind::Ring,
    },
];

/// Tunables for the ambient field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub min_shapes: usize,
    pub max_shapes: usize,
    /// Viewport area (px²) that earns one shape.
    pub area_per_shape: f64,
    pub max_frame_delta_ms: f64,
    /// A pointer within `base_radius * factor` of the nearest shape activates it.
    pub activation_radius_factor: f64,
    pub boost_step: f64,
    pub active_ms: f64,
    pub max_device_pixel_ratio: f64,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            min_shapes: 30,
            max_shapes: 72,
            area_per_shape: 32_000.0,
            max_frame_delta_ms: 64.0,
            activation_radius_factor: 1.4,
            boost_step: 14.0,
            active_ms: 1400.0,
            max_device_pixel_ratio: 2.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub wobble: f64,
    pub drift: f64,
    pub speed: f64,
    pub base_radius: f64,
    pub alpha: f64,
    pub palette: usize,
    pub kind: ShapeKind,
    /// Parallax factor in `0.15..0.95`.
    pub depth: f64,
    pub spin: f64,
    pub radius_boost: f64,
    /// Zero when inactive.
    pub active_until: f64,
}

/// One shape, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ShapeSprite {
    pub kind: ShapeKind,
    pub palette: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub rotation: f64,
    pub alpha: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// Scale applied to the backing store, capped by the config.
    pub device_pixel_ratio: f64,
    pub grid_spacing: f64,
    pub grid_rotation: f64,
    pub shapes: Vec<ShapeSprite>,
}

/// Number of shapes for a viewport, always within the configured bounds.
pub fn shape_count(config: &ShapeConfig, width: f64, height: f64) -> usize {
    let area = (width * height).max(0.0);
    let wanted = (area / config.area_per_shape).round();
    let wanted = if wanted.is_finite() { wanted as usize } else { config.max_shapes };
    wanted.clamp(config.min_shapes, config.max_shapes.max(config.min_shapes))
}

fn random_between(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

pub struct AmbientField {
    config: ShapeConfig,
    rng: StdRng,
    shapes: Vec<Shape>,
    width: f64,
    height: f64,
    device_pixel_ratio: f64,
    pointer_target: Vec2,
    tilt: Vec2,
    last_timestamp: Option<f64>,
    running: bool,
}

impl AmbientField {
    pub fn new(config: ShapeConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            shapes: Vec::new(),
            width: 0.0,
            height: 0.0,
            device_pixel_ratio: 1.0,
            pointer_target: Vec2::default(),
            tilt: Vec2::default(),
            last_timestamp: None,
            running: false,
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self, now: f64, width: f64, height: f64, device_pixel_ratio: f64) {
        self.resize(width, height, device_pixel_ratio);
        self.last_timestamp = Some(now);
        self.running = true;
    }

    /// Cancels the frame loop. Shapes are kept so a restart resumes in place.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_timestamp = None;
    }

    /// Resizing throws the old batch away and seeds a new one for the new area.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.device_pixel_ratio = device_pixel_ratio.clamp(1.0, self.config.max_device_pixel_ratio);
        let count = shape_count(&self.config, self.width, self.height);
        let shapes: Vec<Shape> = (0..count).map(|index| self.seed_shape(index)).collect();
        self.shapes = shapes;
        tracing::debug!(count, width = self.width, height = self.height, "Seeded ambient shapes");
    }

    fn seed_shape(&mut self, index: usize) -> Shape {
        let (width, height) = (self.width, self.height);
        let rng = &mut self.rng;
        let depth = random_between(rng, 0.15, 0.95);
        let palette = index % PALETTE.len();
        let base_radius = random_between(rng, 26.0, 86.0) * (1.0 - depth * 0.35);
        let kind = match PALETTE[palette].kind {
            ShapeKind::Trail if rng.gen_bool(0.5) => ShapeKind::Spark,
            kind => kind,
        };
        Shape {
            x: random_between(rng, -width * 0.1, width * 1.1),
            y: random_between(rng, -height * 0.1, height * 1.1),
            vx: random_between(rng, -0.015, 0.015),
            vy: random_between(rng, -0.02, 0.02),
            wobble: rng.gen::<f64>() * PI * 2.0,
            drift: random_between(rng, 12.0, 40.0),
            speed: random_between(rng, 0.00018, 0.00062),
            base_radius,
            alpha: random_between(rng, 0.18, 0.32),
            palette,
            kind,
            depth,
            spin: random_between(rng, -0.002, 0.002),
            radius_boost: 0.0,
            active_until: 0.0,
        }
    }

    /// Advances the simulation by `delta_ms`, capped to avoid jumps when a
    /// background tab resumes. A zero delta leaves positions untouched.
    pub fn step(&mut self, delta_ms: f64, now: f64) {
        let delta = delta_ms.clamp(0.0, self.config.max_frame_delta_ms);
        let (width, height) = (self.width, self.height);

        for i in 0..self.shapes.len() {
            let shape = &mut self.shapes[i];
            let velocity_scale = delta * (0.02 + shape.depth * 0.02);
            shape.x += shape.vx * velocity_scale * width;
            shape.y += shape.vy * velocity_scale * height;
            shape.wobble += shape.speed * delta;
            shape.radius_boost = (shape.radius_boost - delta * 0.02).max(0.0);
            if shape.active_until != 0.0 && shape.active_until < now {
                shape.active_until = 0.0;
            }

            let escaped = shape.x < -width * 0.2
                || shape.x > width * 1.2
                || shape.y < -height * 0.2
                || shape.y > height * 1.2;
            if escaped {
                let rng = &mut self.rng;
                let x = random_between(rng, -width * 0.1, width * 1.1);
                let y = random_between(rng, -height * 0.1, height * 1.1);
                let vx = random_between(rng, -0.015, 0.015);
                let vy = random_between(rng, -0.02, 0.02);
                let shape = &mut self.shapes[i];
                shape.x = x;
                shape.y = y;
                shape.vx = vx;
                shape.vy = vy;
            }
        }
    }

    /// Boosts the shape nearest to the pointer if the pointer is close enough.
    /// Returns the index of the activated shape.
    pub fn activate(&mut self, px: f64, py: f64, now: f64) -> Option<usize> {
        if !px.is_finite() || !py.is_finite() {
            return None;
        }
        let (index, distance) = self
            .shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| (i, (px - shape.x).hypot(py - shape.y)))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        let threshold = self.shapes[index].base_radius * self.config.activation_radius_factor;
        if distance > threshold {
            return None;
        }
        let jitter_x = random_between(&mut self.rng, -0.35, 0.35);
        let jitter_y = random_between(&mut self.rng, -0.35, 0.35);
        let shape = &mut self.shapes[index];
        shape.radius_boost = (shape.radius_boost + self.config.boost_step).min(shape.base_radius * 0.5);
        shape.vx += jitter_x;
        shape.vy += jitter_y;
        shape.active_until = now + self.config.active_ms;
        Some(index)
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64, now: f64) -> Option<usize> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        self.pointer_target = Vec2 {
            x: x / self.width - 0.5,
            y: y / self.height - 0.5,
        };
        self.activate(x, y, now)
    }

    pub fn pointer_left(&mut self) {
        self.pointer_target = Vec2::default();
    }

    /// One animation-frame callback: eases the tilt, steps and renders.
    pub fn frame(&mut self, timestamp: f64) -> Option<Scene> {
        if !self.running {
            return None;
        }
        let elapsed = match self.last_timestamp {
            Some(last) if timestamp - last != 0.0 => timestamp - last,
            _ => 16.0,
        };
        self.last_timestamp = Some(timestamp);

        self.tilt.x += (self.pointer_target.y * 18.0 - self.tilt.x) * 0.08;
        self.tilt.y += (self.pointer_target.x * 18.0 - self.tilt.y) * 0.08;

        self.step(elapsed, timestamp);
        Some(self.render(timestamp))
    }

    pub fn render(&self, time: f64) -> Scene {
        let (tilt_x, tilt_y) = (self.tilt.x, self.tilt.y);
        let shapes = self
            .shapes
            .iter()
            .map(|shape| {
                let phase = time * shape.speed + shape.wobble;
                let pulse = phase.sin();
                let wobble_x = (time * shape.speed * 2.0 + shape.wobble).cos() * shape.drift;
                let wobble_y = (time * shape.speed * 1.6 + shape.wobble).sin() * shape.drift * 0.6;
                let parallax_x = tilt_y * shape.depth * 22.0;
                let parallax_y = tilt_x * shape.depth * 22.0;
                let active_bonus = if shape.active_until > time { 0.18 } else { 0.0 };
                ShapeSprite {
                    kind: shape.kind,
                    palette: shape.palette,
                    x: shape.x + wobble_x + parallax_x,
                    y: shape.y + wobble_y + parallax_y,
                    radius: shape.base_radius + pulse * shape.base_radius * 0.18 + shape.radius_boost,
                    rotation: (time * shape.spin) % (PI * 2.0),
                    alpha: shape.alpha + active_bonus,
                }
            })
            .collect();

        Scene {
            width: self.width,
            height: self.height,
            device_pixel_ratio: self.device_pixel_ratio,
            grid_spacing: (self.width.min(self.height) / 9.0).max(140.0),
            grid_rotation: (tilt_y / 40.0) * 0.03,
            shapes,
        }
    }
}
