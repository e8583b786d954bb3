/// Entities: Ball and Paddle, plus the per-frame input record.
/// Both have fixed sizes; only their centers (and the ball's heading) change.

use glam::Vec2;

use super::geometry::{clamp_paddle_x, Aabb, Axis, BALL_SIZE, PADDLE_SIZE, PADDLE_Y, WORLD_SIZE};

/// Straight up: the launch heading.
pub const LAUNCH_DIRECTION: Vec2 = Vec2::new(0.0, -1.0);

/// Frame input handed to the step: where the pointer wants the paddle,
/// and how much wall-clock time has passed.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub pointer_x: f32,
    pub dt: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    pub center: Vec2,
    /// Always unit length.
    pub direction: Vec2,
}

impl Ball {
    /// Ball resting just above a centered paddle, aimed straight up.
    pub fn new() -> Self {
        Ball {
            center: Vec2::new(WORLD_SIZE.x * 0.5, PADDLE_Y - PADDLE_SIZE.y),
            direction: LAUNCH_DIRECTION,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, BALL_SIZE)
    }

    /// Park the ball over the paddle's center, ready to serve.
    pub fn rest_on(&mut self, paddle: &Paddle) {
        self.center = Vec2::new(paddle.center.x, PADDLE_Y - PADDLE_SIZE.y);
    }

    /// Mirror one component of the heading.
    pub fn flip(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.direction.x = -self.direction.x,
            Axis::Y => self.direction.y = -self.direction.y,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paddle {
    pub center: Vec2,
}

impl Paddle {
    pub fn new() -> Self {
        Paddle { center: Vec2::new(WORLD_SIZE.x * 0.5, PADDLE_Y) }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, PADDLE_SIZE)
    }

    /// Follow the pointer horizontally, never crossing the side borders.
    pub fn track(&mut self, pointer_x: f32) {
        if pointer_x.is_finite() {
            self.center.x = clamp_paddle_x(pointer_x);
        }
        self.center.y = PADDLE_Y;
    }
}
