/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Paddle follows the pointer (every phase but game over)
///   2. Clock / banner countdown; parked ball rides the paddle
///   3. Swept collision: earliest of walls → paddle → bricks within the frame
///   4. Ball advance up to that time, scaled by the ball speed
///   5. Bounce response (mirror an axis, or take the paddle rebound)
///   6. Brick damage, break scoring, level completion
///   7. Ball-lost check (life loss / game over)
///
/// At most one collision is resolved per frame. Frame time is never
/// subdivided, so a long frame ends at the first contact.

use crate::domain::brick::Impact;
use crate::domain::entity::{FrameInput, LAUNCH_DIRECTION};
use crate::domain::geometry::WORLD_SIZE;
use crate::domain::physics::{self, Contact};
use super::event::GameEvent;
use super::layout;
use super::world::{Outcome, Phase, Progress, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.is_game_over() { return vec![]; }

    let dt = sanitize_dt(input.dt);
    world.paddle.track(input.pointer_x);
    world.progress.seconds_elapsed += f64::from(dt);

    match world.phase {
        Phase::Playing => {}
        Phase::LevelTransition => {
            tick_transition(world, dt);
            world.ball.rest_on(&world.paddle);
            return vec![];
        }
        Phase::AwaitingLaunch => {
            world.ball.rest_on(&world.paddle);
            return vec![];
        }
        Phase::GameOver(_) => return vec![],
    }

    let mut events = Vec::new();
    resolve_motion(world, dt, &mut events);
    if world.phase == Phase::Playing {
        resolve_ball_lost(world, &mut events);
    }
    events
}

/// Negative, NaN and infinite frame times count as no time at all.
fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

// ══════════════════════════════════════════════════════════════
// Motion & collision
// ══════════════════════════════════════════════════════════════

fn resolve_motion(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let dir = world.ball.direction;
    debug_assert!((dir.length() - 1.0).abs() < 1e-3, "ball heading not unit: {dir:?}");

    // Impact times are measured against the frame time; the ball then covers
    // only `ball_speed` of that distance, so it turns just short of the plane.
    let sweep = physics::earliest_hit(
        world.ball.center,
        dir,
        world.paddle.center,
        &world.bricks,
        dt,
    );
    world.ball.center += dir * sweep.allowed * world.rules.ball_speed;

    let Some(hit) = sweep.hit else { return };
    match hit.contact {
        Contact::Wall(axis) => {
            world.ball.flip(axis);
            events.push(GameEvent::WallBounce);
        }
        Contact::Paddle(rebound) => {
            world.ball.direction = rebound;
            events.push(GameEvent::PaddleBounce);
        }
        Contact::Brick { index, axis } => {
            world.ball.flip(axis);
            hit_brick(world, index, events);
        }
    }
}

fn hit_brick(world: &mut WorldState, index: usize, events: &mut Vec<GameEvent>) {
    let Some(brick) = world.bricks.get_mut(index) else { return };
    events.push(GameEvent::BrickHit { sound: brick.hit_sound.clone() });
    if brick.take_hit() != Impact::Broken { return; }

    let brick = world.bricks.swap_remove(index);
    world.progress.score += brick.break_score;
    world.progress.level_score += brick.break_score;
    log::debug!(
        "brick '{}' broken: +{} ({}/{})",
        brick.id,
        brick.break_score,
        world.progress.level_score,
        world.progress.max_level_score
    );
    events.push(GameEvent::BrickBreak { sound: brick.break_sound, score: brick.break_score });

    if world.progress.level_cleared() {
        complete_level(world, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Progression
// ══════════════════════════════════════════════════════════════

fn complete_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.is_last_level() {
        world.phase = Phase::GameOver(Outcome::Win);
        log::info!("game won: score {} in {:.1}s", world.progress.score, world.progress.seconds_elapsed);
        events.push(GameEvent::GameWon);
        return;
    }

    let next = world.progress.level_index + 1;
    log::info!("level {} complete, score {}", world.progress.level_index + 1, world.progress.score);
    layout::load_level(world, next);
    world.phase = Phase::LevelTransition;
    world.transition_timer = world.rules.transition_secs;
    events.push(GameEvent::LevelComplete { next_level: next });
}

/// Ball fully below the bottom edge: spend a life or end the game.
/// With a life to spare the field stays as it is; the points earned on this
/// level since it was entered are forfeited and become obtainable again.
fn resolve_ball_lost(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.ball.bounds().min.y < WORLD_SIZE.y { return; }

    if world.progress.lives == 0 {
        world.phase = Phase::GameOver(Outcome::Loss);
        world.progress.level_index = 0;
        log::info!("game lost: score {}", world.progress.score);
        events.push(GameEvent::GameLost);
        return;
    }

    let remaining = world.remaining_score();
    let p = &mut world.progress;
    p.lives -= 1;
    p.score = p.score.saturating_sub(p.level_score);
    p.max_score_so_far = p.max_score_so_far.saturating_sub(p.level_score);
    p.level_score = 0;
    p.max_level_score = remaining;

    layout::reset_serve(world);
    world.phase = Phase::AwaitingLaunch;
    log::info!("life lost, {} left", world.progress.lives);
    events.push(GameEvent::LifeLost { lives_left: world.progress.lives });
}

fn tick_transition(world: &mut WorldState, dt: f32) {
    world.transition_timer -= dt;
    if world.transition_timer <= 0.0 {
        world.transition_timer = 0.0;
        world.phase = Phase::AwaitingLaunch;
    }
}

// ══════════════════════════════════════════════════════════════
// Life-cycle operations (driven by meta input)
// ══════════════════════════════════════════════════════════════

/// Serve the ball straight up. Returns whether anything happened.
pub fn launch(world: &mut WorldState) -> bool {
    if world.phase != Phase::AwaitingLaunch { return false; }
    world.ball.rest_on(&world.paddle);
    world.ball.direction = LAUNCH_DIRECTION;
    world.phase = Phase::Playing;
    true
}

/// Fresh game after game over. Returns whether anything happened.
pub fn restart(world: &mut WorldState) -> bool {
    if !world.is_game_over() { return false; }
    reset_game(world);
    true
}

/// Lives, score, clock and level index back to their initial values,
/// first level reloaded, waiting for launch.
pub fn reset_game(world: &mut WorldState) {
    world.progress = Progress::new(world.rules.lives);
    world.transition_timer = 0.0;
    layout::load_level(world, 0);
    world.phase = Phase::AwaitingLaunch;
    log::info!("new game");
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════


// ══════════════════════════════════════════════════════════════
// Property tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod properties {
    use super::*;
    use crate::config::RulesConfig;
    use crate::domain::geometry::BORDER;
    use crate::sim::level::embedded_levels;
    use glam::Vec2;
    use proptest::prelude::*;

    const SLACK: f32 = 1e-4;

    fn world_with(angle: f32, speed: f32) -> WorldState {
        let rules = RulesConfig { ball_speed: speed, ..RulesConfig::default() };
        let mut w = WorldState::new(embedded_levels().unwrap(), rules).unwrap();
        launch(&mut w);
        w.ball.center = Vec2::new(0.5, 0.7);
        w.ball.direction = Vec2::new(angle.cos(), angle.sin());
        w
    }

    /// Keep the game moving: serve whenever the ball is parked.
    fn drive(w: &mut WorldState, pointer_x: f32, dt: f32) -> Vec<GameEvent> {
        if w.phase == Phase::AwaitingLaunch {
            launch(w);
        }
        step(w, FrameInput { pointer_x, dt })
    }

    proptest! {
        #[test]
        fn ball_stays_inside_walls(
            angle in 0.0f32..std::f32::consts::TAU,
            speed in 0.1f32..=1.0,
            frames in prop::collection::vec((0.0f32..1.0, 0.0f32..0.25), 1..200),
        ) {
            let mut w = world_with(angle, speed);
            for (pointer_x, dt) in frames {
                drive(&mut w, pointer_x, dt);
                if w.is_game_over() { break; }
                let b = w.ball.bounds();
                prop_assert!(b.min.x >= BORDER - SLACK, "left wall crossed: {:?}", b);
                prop_assert!(b.max.x <= WORLD_SIZE.x - BORDER + SLACK, "right wall crossed: {:?}", b);
                prop_assert!(b.min.y >= BORDER - SLACK, "ceiling crossed: {:?}", b);
                prop_assert!(w.progress.score <= w.progress.max_score_so_far);
                prop_assert!(w.progress.level_score <= w.progress.max_level_score);
            }
        }

        #[test]
        fn hit_points_never_increase(
            angle in 0.0f32..std::f32::consts::TAU,
            frames in prop::collection::vec((0.0f32..1.0, 0.0f32..0.25), 1..200),
        ) {
            let mut w = world_with(angle, 1.0);
            for (pointer_x, dt) in frames {
                let level = w.progress.level_index;
                let before = w.bricks.clone();
                drive(&mut w, pointer_x, dt);
                if w.is_game_over() { break; }
                if w.progress.level_index != level { continue; }

                for b in &w.bricks {
                    let prev = before.iter().find(|p| p.bounds == b.bounds);
                    prop_assert!(prev.is_some(), "brick appeared mid-level");
                    if let Some(prev) = prev {
                        match (prev.hit_points(), b.hit_points()) {
                            (Some(old), Some(new)) => prop_assert!(new <= old && new > 0),
                            (None, None) => prop_assert_eq!(prev, b),
                            _ => prop_assert!(false, "durability kind changed"),
                        }
                    }
                }
                prop_assert!(w.bricks.len() <= before.len());
            }
        }
    }
}
