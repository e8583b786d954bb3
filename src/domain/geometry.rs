/// World geometry: normalized coordinate space and axis-aligned boxes.
///
/// The world is 1.0 wide and 1.25 tall, origin at the top-left, y grows
/// downward. Left, right and top edges carry a fixed-width border that acts
/// as a wall. The bottom is open: a ball that crosses it is lost.

use glam::Vec2;

// ── World ──

pub const WORLD_SIZE: Vec2 = Vec2::new(1.0, 1.25);
pub const BORDER: f32 = 0.05;

// ── Paddle ──

pub const PADDLE_SIZE: Vec2 = Vec2::new(0.1, 0.025);
pub const PADDLE_Y: f32 = 0.9 * WORLD_SIZE.y;
/// Width of the deflection zone at each end of the paddle.
pub const PADDLE_CORNER_WIDTH: f32 = PADDLE_SIZE.x * 0.1;

// ── Ball ──

pub const BALL_SIZE: Vec2 = Vec2::new(0.015, 0.02);

// ── Brick grid ──

pub const BRICK_COLUMN_GAP: f32 = 0.0011875;
pub const BRICK_ROW_GAP: f32 = 0.0022875;
pub const BRICK_HEIGHT: f32 = WORLD_SIZE.y * 0.025;
pub const BRICK_TOP_OFFSET: f32 = BRICK_HEIGHT * 4.0;

/// Axis selector for bounces that mirror a single direction component.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

/// Axis-aligned box, `min <= max` on both axes.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y, "inverted box {min:?}..{max:?}");
        Aabb { min, max }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Aabb::new(center - size * 0.5, center + size * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// The box moved by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Aabb { min: self.min + offset, max: self.max + offset }
    }

    /// Closed-interval overlap of the x extents.
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.max.x >= other.min.x && other.max.x >= self.min.x
    }

    /// Closed-interval overlap of the y extents.
    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.max.y >= other.min.y && other.max.y >= self.min.y
    }
}

/// Clamp a paddle center x so the paddle never crosses the side borders.
pub fn clamp_paddle_x(target_x: f32) -> f32 {
    let lo = BORDER + PADDLE_SIZE.x * 0.5;
    let hi = WORLD_SIZE.x - BORDER - PADDLE_SIZE.x * 0.5;
    if target_x < lo {
        lo
    } else if target_x > hi {
        hi
    } else {
        target_x
    }
}
