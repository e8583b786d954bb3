/// WorldState: the complete snapshot of a running game.
///
/// Owned by the frame loop and passed explicitly to the step, the
/// life-cycle operations and the renderer. Nothing here is global.
///
/// ## Phases
///
///   AwaitingLaunch ──launch──▶ Playing ──life lost──▶ AwaitingLaunch
///                                 │
///                                 ├──level cleared──▶ LevelTransition ──banner done──▶ AwaitingLaunch
///                                 ├──final level cleared──▶ GameOver(Win)
///                                 └──no lives left──▶ GameOver(Loss)
///
///   GameOver(*) ──restart──▶ AwaitingLaunch (fresh game)

use crate::config::RulesConfig;
use crate::domain::brick::Brick;
use crate::domain::entity::{Ball, Paddle};
use super::layout;
use super::level::{LevelDef, LevelError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    /// Ball parked above the paddle until the launch input.
    AwaitingLaunch,
    /// Level banner; counts down `transition_timer`.
    LevelTransition,
    GameOver(Outcome),
}

/// Score, lives and clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub score: u32,
    /// Break score earned on the current level.
    pub level_score: u32,
    /// Sum of the break scores of every level entered so far.
    pub max_score_so_far: u32,
    /// Break score still obtainable on the current level when it was
    /// entered (or when the last life was lost).
    pub max_level_score: u32,
    pub lives: u32,
    pub level_index: usize,
    pub seconds_elapsed: f64,
}

impl Progress {
    pub fn new(lives: u32) -> Self {
        Progress {
            score: 0,
            level_score: 0,
            max_score_so_far: 0,
            max_level_score: 0,
            lives,
            level_index: 0,
            seconds_elapsed: 0.0,
        }
    }

    pub fn level_cleared(&self) -> bool {
        self.level_score >= self.max_level_score
    }
}

pub struct WorldState {
    // ── Level data ──
    /// Validated level list; never empty.
    pub levels: Vec<LevelDef>,
    pub level_name: String,
    pub background: String,

    // ── Entities ──
    pub bricks: Vec<Brick>,
    pub ball: Ball,
    pub paddle: Paddle,

    // ── Game tracking ──
    pub progress: Progress,
    pub phase: Phase,
    /// Seconds left on the level banner.
    pub transition_timer: f32,

    pub rules: RulesConfig,
}

// ── Construction ──

impl WorldState {
    /// Fresh game on the first level, waiting for launch.
    pub fn new(levels: Vec<LevelDef>, rules: RulesConfig) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        let mut world = WorldState {
            levels,
            level_name: String::new(),
            background: String::new(),
            bricks: vec![],
            ball: Ball::new(),
            paddle: Paddle::new(),
            progress: Progress::new(rules.lives),
            phase: Phase::AwaitingLaunch,
            transition_timer: 0.0,
            rules,
        };
        layout::load_level(&mut world, 0);
        Ok(world)
    }
}

// ── Queries ──

impl WorldState {
    /// Ball is not moving: waiting for launch or showing the level banner.
    pub fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::AwaitingLaunch | Phase::LevelTransition)
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::GameOver(o) => Some(o),
            _ => None,
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_last_level(&self) -> bool {
        self.progress.level_index + 1 >= self.levels.len()
    }

    /// Break score still standing on the field.
    pub fn remaining_score(&self) -> u32 {
        self.bricks.iter().filter(|b| b.is_breakable()).map(|b| b.break_score).sum()
    }
}
