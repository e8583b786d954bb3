/// Swept collision: earliest time-of-impact of the ball against walls,
/// paddle and bricks within one frame.
///
/// Every candidate is a half-plane test along one axis:
///   `t = (plane - ball_edge) / direction_component`
/// A candidate is valid iff `0 <= t < allowed`. A valid candidate lowers
/// `allowed` to `t`, so later candidates only win if strictly earlier.
/// Evaluation order is walls → paddle → bricks (first to last), which is
/// therefore also the tie-break order.
///
/// The tests are swept, never post-move overlap checks, so the ball cannot
/// tunnel through thin geometry no matter how large the frame time is.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;

use super::brick::Brick;
use super::geometry::{
    Aabb, Axis, BALL_SIZE, BORDER, PADDLE_CORNER_WIDTH, PADDLE_SIZE, WORLD_SIZE,
};

// ── Paddle rebound table ──
// Fixed unit headings; the paddle does not reflect angles.

/// Ball clipped the paddle's left corner: 45° up-left.
pub const REBOUND_LEFT_CORNER: Vec2 = Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
/// Ball clipped the paddle's right corner: 45° up-right.
pub const REBOUND_RIGHT_CORNER: Vec2 = Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
/// Left half of the paddle (center included): straight up.
pub const REBOUND_LEFT: Vec2 = Vec2::new(0.0, -1.0);
/// Right half of the paddle: 45° up-right, same as the right corner.
pub const REBOUND_RIGHT: Vec2 = Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);

/// What the ball touched.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Contact {
    /// Side wall or ceiling; mirror the given axis.
    Wall(Axis),
    /// Paddle top; replace the heading with this rebound.
    Paddle(Vec2),
    /// Brick at `index` in the field; mirror the given axis.
    Brick { index: usize, axis: Axis },
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Hit {
    pub time: f32,
    pub contact: Contact,
}

/// Running state of one frame's sweep.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sweep {
    /// Time the ball may travel this frame; shrinks to the earliest hit.
    pub allowed: f32,
    pub hit: Option<Hit>,
}

impl Sweep {
    pub fn new(dt: f32) -> Self {
        Sweep { allowed: dt, hit: None }
    }

    #[inline]
    fn admits(&self, t: f32) -> bool {
        t >= 0.0 && t < self.allowed
    }

    #[inline]
    fn record(&mut self, time: f32, contact: Contact) {
        self.allowed = time;
        self.hit = Some(Hit { time, contact });
    }
}

/// Time for an edge moving at `speed` (one direction component) to reach `plane`.
#[inline]
pub fn time_of_impact(plane: f32, edge: f32, speed: f32) -> f32 {
    (plane - edge) / speed
}

// ══════════════════════════════════════════════════════════════
// Candidates
// ══════════════════════════════════════════════════════════════

/// Side walls and ceiling. The floor is not a bounce.
pub fn sweep_walls(sweep: &mut Sweep, ball: &Aabb, dir: Vec2) {
    if dir.x > 0.0 {
        let t = time_of_impact(WORLD_SIZE.x - BORDER, ball.max.x, dir.x);
        if sweep.admits(t) {
            sweep.record(t, Contact::Wall(Axis::X));
        }
    } else if dir.x < 0.0 {
        let t = time_of_impact(BORDER, ball.min.x, dir.x);
        if sweep.admits(t) {
            sweep.record(t, Contact::Wall(Axis::X));
        }
    }

    if dir.y < 0.0 {
        let t = time_of_impact(BORDER, ball.min.y, dir.y);
        if sweep.admits(t) {
            sweep.record(t, Contact::Wall(Axis::Y));
        }
    }
}

/// Paddle top surface, only while the ball is heading down.
pub fn sweep_paddle(sweep: &mut Sweep, ball_center: Vec2, dir: Vec2, paddle_center: Vec2) {
    if dir.y <= 0.0 {
        return;
    }
    let ball = Aabb::from_center(ball_center, BALL_SIZE);
    let paddle = Aabb::from_center(paddle_center, PADDLE_SIZE);
    let t = time_of_impact(paddle.min.y, ball.max.y, dir.y);
    if !sweep.admits(t) {
        return;
    }
    let center_at_hit = ball_center + dir * t;
    let at_hit = Aabb::from_center(center_at_hit, BALL_SIZE);
    if at_hit.overlaps_x(&paddle) {
        let rebound = paddle_rebound(&at_hit, center_at_hit.x, &paddle, paddle_center.x);
        sweep.record(t, Contact::Paddle(rebound));
    }
}

/// Pick the rebound heading from where the ball meets the paddle.
/// Corners win over halves; an exactly centered ball goes left.
pub fn paddle_rebound(ball_at_hit: &Aabb, ball_x: f32, paddle: &Aabb, paddle_x: f32) -> Vec2 {
    if ball_at_hit.min.x < paddle.min.x + PADDLE_CORNER_WIDTH {
        REBOUND_LEFT_CORNER
    } else if ball_at_hit.max.x > paddle.max.x - PADDLE_CORNER_WIDTH {
        REBOUND_RIGHT_CORNER
    } else if ball_x <= paddle_x {
        REBOUND_LEFT
    } else {
        REBOUND_RIGHT
    }
}

/// Every live brick: the vertical edge and the horizontal edge the heading
/// can approach, each gated by overlap on the perpendicular axis at `t`.
pub fn sweep_bricks(sweep: &mut Sweep, ball: &Aabb, dir: Vec2, bricks: &[Brick]) {
    for (index, brick) in bricks.iter().enumerate() {
        let b = &brick.bounds;

        let tx = if dir.x > 0.0 {
            Some(time_of_impact(b.min.x, ball.max.x, dir.x))
        } else if dir.x < 0.0 {
            Some(time_of_impact(b.max.x, ball.min.x, dir.x))
        } else {
            None
        };
        if let Some(t) = tx {
            if sweep.admits(t) && ball.translated(dir * t).overlaps_y(b) {
                sweep.record(t, Contact::Brick { index, axis: Axis::X });
            }
        }

        let ty = if dir.y > 0.0 {
            Some(time_of_impact(b.min.y, ball.max.y, dir.y))
        } else if dir.y < 0.0 {
            Some(time_of_impact(b.max.y, ball.min.y, dir.y))
        } else {
            None
        };
        if let Some(t) = ty {
            if sweep.admits(t) && ball.translated(dir * t).overlaps_x(b) {
                sweep.record(t, Contact::Brick { index, axis: Axis::Y });
            }
        }
    }
}

/// Full sweep for one frame in canonical order.
pub fn earliest_hit(ball_center: Vec2, dir: Vec2, paddle_center: Vec2, bricks: &[Brick], dt: f32) -> Sweep {
    let ball = Aabb::from_center(ball_center, BALL_SIZE);
    let mut sweep = Sweep::new(dt);
    sweep_walls(&mut sweep, &ball, dir);
    sweep_paddle(&mut sweep, ball_center, dir, paddle_center);
    sweep_bricks(&mut sweep, &ball, dir, bricks);
    sweep
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::brick::{BrickType, Durability};
    use crate::domain::geometry::PADDLE_Y;

    fn ball_at(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn paddle_at(x: f32) -> Vec2 {
        Vec2::new(x, PADDLE_Y)
    }

    fn bounds(center: Vec2) -> Aabb {
        Aabb::from_center(center, BALL_SIZE)
    }

    fn brick(min: (f32, f32), max: (f32, f32)) -> Brick {
        let kind = BrickType {
            id: 'S',
            texture: "red".into(),
            durability: Durability::Breakable(1),
            hit_sound: String::new(),
            break_sound: String::new(),
            break_score: 10,
        };
        Brick::new(&kind, Aabb::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── Walls ──

    #[test]
    fn ceiling_hit_time() {
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &[], 1.0);
        let hit = s.hit.expect("ceiling hit");
        assert_eq!(hit.contact, Contact::Wall(Axis::Y));
        assert!(approx(hit.time, 0.5 - 0.01 - BORDER));
        assert!(approx(s.allowed, hit.time));
    }

    #[test]
    fn right_wall_hit() {
        let ball = ball_at(0.9, 0.5);
        let s = earliest_hit(ball, Vec2::new(1.0, 0.0), paddle_at(0.5), &[], 1.0);
        let hit = s.hit.expect("wall hit");
        assert_eq!(hit.contact, Contact::Wall(Axis::X));
        assert!(approx(hit.time, 0.95 - 0.9075));
    }

    #[test]
    fn hit_beyond_frame_is_ignored() {
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &[], 0.1);
        assert!(s.hit.is_none());
        assert_eq!(s.allowed, 0.1);
    }

    #[test]
    fn hit_exactly_at_frame_end_is_ignored() {
        let ball = bounds(ball_at(0.5, 0.5));
        let t = time_of_impact(BORDER, ball.min.y, -1.0);
        let mut s = Sweep::new(t);
        sweep_walls(&mut s, &ball, Vec2::new(0.0, -1.0));
        assert!(s.hit.is_none());
    }

    #[test]
    fn zero_dt_detects_nothing() {
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &[], 0.0);
        assert!(s.hit.is_none());
        assert_eq!(s.allowed, 0.0);
    }

    #[test]
    fn moving_away_from_wall_is_not_a_hit() {
        // Already past the left plane but heading right: negative t for the
        // left wall is never considered because only the right wall is tested.
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(1.0, 0.0), paddle_at(0.5), &[], 0.1);
        assert!(s.hit.is_none());
    }

    #[test]
    fn floor_is_not_a_bounce() {
        let ball = ball_at(0.05 + 0.2, 1.2);
        let s = earliest_hit(ball, Vec2::new(0.0, 1.0), paddle_at(0.8), &[], 10.0);
        assert!(s.hit.is_none());
    }

    // ── Paddle ──

    #[test]
    fn paddle_center_tie_goes_left() {
        let ball = ball_at(0.5, 1.0);
        let s = earliest_hit(ball, Vec2::new(0.0, 1.0), paddle_at(0.5), &[], 1.0);
        let hit = s.hit.expect("paddle hit");
        assert_eq!(hit.contact, Contact::Paddle(REBOUND_LEFT));
        let paddle_top = PADDLE_Y - PADDLE_SIZE.y * 0.5;
        assert!(approx(hit.time, paddle_top - 1.01));
    }

    #[test]
    fn paddle_zones() {
        let paddle = Aabb::from_center(paddle_at(0.5), PADDLE_SIZE);
        let zone = |x: f32| paddle_rebound(&bounds(ball_at(x, 1.0)), x, &paddle, 0.5);
        assert_eq!(zone(0.455), REBOUND_LEFT_CORNER);
        assert_eq!(zone(0.545), REBOUND_RIGHT_CORNER);
        assert_eq!(zone(0.48), REBOUND_LEFT);
        assert_eq!(zone(0.49), Vec2::new(0.0, -1.0));
        assert_eq!(zone(0.52), REBOUND_RIGHT);
        assert_eq!(zone(0.5), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn rebound_headings() {
        let diag = Vec2::new(1.0, -1.0).normalize();
        assert!(REBOUND_LEFT_CORNER.abs_diff_eq(Vec2::new(-diag.x, diag.y), 1e-6));
        assert!(REBOUND_RIGHT_CORNER.abs_diff_eq(diag, 1e-6));
        assert!(REBOUND_RIGHT.abs_diff_eq(diag, 1e-6));
        assert_eq!(REBOUND_LEFT, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn rebounds_are_unit_and_upward() {
        for v in [REBOUND_LEFT_CORNER, REBOUND_RIGHT_CORNER, REBOUND_LEFT, REBOUND_RIGHT] {
            assert!(approx(v.length(), 1.0));
            assert!(v.y < 0.0);
        }
        assert!(REBOUND_LEFT_CORNER.x < 0.0);
        assert!(REBOUND_RIGHT_CORNER.x > 0.0);
    }

    #[test]
    fn paddle_miss_when_out_of_reach() {
        let ball = ball_at(0.2, 1.0);
        let s = earliest_hit(ball, Vec2::new(0.0, 1.0), paddle_at(0.8), &[], 1.0);
        assert!(s.hit.is_none());
    }

    #[test]
    fn paddle_ignored_when_rising() {
        let ball = ball_at(0.5, 1.2);
        let mut s = Sweep::new(1.0);
        sweep_paddle(&mut s, ball, Vec2::new(0.0, -1.0), paddle_at(0.5));
        assert!(s.hit.is_none());
    }

    // ── Bricks ──

    #[test]
    fn brick_underside_hit() {
        let bricks = vec![brick((0.45, 0.3), (0.55, 0.33))];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1.0);
        let hit = s.hit.expect("brick hit");
        assert_eq!(hit.contact, Contact::Brick { index: 0, axis: Axis::Y });
        assert!(approx(hit.time, 0.49 - 0.33));
    }

    #[test]
    fn brick_side_hit() {
        let bricks = vec![brick((0.6, 0.45), (0.7, 0.55))];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(1.0, 0.0), paddle_at(0.5), &bricks, 1.0);
        let hit = s.hit.expect("brick hit");
        assert_eq!(hit.contact, Contact::Brick { index: 0, axis: Axis::X });
    }

    #[test]
    fn brick_needs_perpendicular_overlap() {
        let bricks = vec![brick((0.6, 0.3), (0.7, 0.33))];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1.0);
        assert_eq!(s.hit.map(|h| h.contact), Some(Contact::Wall(Axis::Y)));
    }

    #[test]
    fn nearest_brick_wins() {
        let bricks = vec![
            brick((0.45, 0.2), (0.55, 0.23)),
            brick((0.45, 0.3), (0.55, 0.33)),
        ];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1.0);
        assert_eq!(s.hit.map(|h| h.contact), Some(Contact::Brick { index: 1, axis: Axis::Y }));
    }

    #[test]
    fn equal_time_keeps_first_candidate() {
        let bricks = vec![
            brick((0.40, 0.3), (0.50, 0.33)),
            brick((0.50, 0.3), (0.60, 0.33)),
        ];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1.0);
        assert_eq!(s.hit.map(|h| h.contact), Some(Contact::Brick { index: 0, axis: Axis::Y }));
    }

    #[test]
    fn wall_wins_tie_against_brick() {
        // Brick whose underside sits exactly on the ceiling plane.
        let bricks = vec![brick((0.45, 0.0), (0.55, BORDER))];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1.0);
        assert_eq!(s.hit.map(|h| h.contact), Some(Contact::Wall(Axis::Y)));
    }

    #[test]
    fn thin_brick_is_not_tunneled_with_huge_dt() {
        let bricks = vec![brick((0.45, 0.3), (0.55, 0.3001))];
        let ball = ball_at(0.5, 0.5);
        let s = earliest_hit(ball, Vec2::new(0.0, -1.0), paddle_at(0.5), &bricks, 1000.0);
        assert_eq!(s.hit.map(|h| h.contact), Some(Contact::Brick { index: 0, axis: Axis::Y }));
    }
}
