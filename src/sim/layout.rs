/// Brick field materialization: grid cells → positioned bricks.
///
/// Placement for cell (row i, column j):
///   brick_w = (1 - 2*border - (columns + 1)*column_gap) / columns
///   min.x   = border + j*brick_w + (j + 1)*column_gap
///   min.y   = border + top_offset + i*(brick_h + row_gap)
///
/// Pure function of the level data: the same level always yields the same field.

use glam::Vec2;

use crate::domain::brick::Brick;
use crate::domain::entity::{Ball, Paddle};
use crate::domain::geometry::{
    Aabb, BORDER, BRICK_COLUMN_GAP, BRICK_HEIGHT, BRICK_ROW_GAP, BRICK_TOP_OFFSET, WORLD_SIZE,
};
use super::level::LevelDef;
use super::world::WorldState;

#[derive(Clone, Debug, PartialEq)]
pub struct BrickField {
    pub bricks: Vec<Brick>,
    /// Sum of break scores over all breakable bricks.
    pub max_level_score: u32,
}

pub fn brick_width(column_count: usize) -> f32 {
    let columns = column_count.max(1) as f32;
    (WORLD_SIZE.x - 2.0 * BORDER - (columns + 1.0) * BRICK_COLUMN_GAP) / columns
}

/// Top-left corner of grid cell (row, column).
pub fn cell_origin(row: usize, column: usize, brick_w: f32) -> Vec2 {
    let (i, j) = (row as f32, column as f32);
    Vec2::new(
        BORDER + j * brick_w + (j + 1.0) * BRICK_COLUMN_GAP,
        BORDER + BRICK_TOP_OFFSET + i * BRICK_HEIGHT + i * BRICK_ROW_GAP,
    )
}

pub fn materialize(def: &LevelDef) -> BrickField {
    let brick_w = brick_width(def.column_count);
    let size = Vec2::new(brick_w, BRICK_HEIGHT);

    let mut bricks = Vec::new();
    for (i, row) in def.layout.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            let Some(kind) = def.brick_type(cell) else { continue };
            let min = cell_origin(i, j, brick_w);
            bricks.push(Brick::new(kind, Aabb::new(min, min + size)));
        }
    }

    let max_level_score = bricks
        .iter()
        .filter(|b| b.is_breakable())
        .map(|b| b.break_score)
        .sum();

    BrickField { bricks, max_level_score }
}

/// Install level `index` into the world: fresh field, level score zeroed,
/// ball and paddle back to their serve positions.
pub fn load_level(world: &mut WorldState, index: usize) {
    let index = if index < world.levels.len() {
        index
    } else {
        log::warn!("level index {index} out of range, loading level 0");
        0
    };

    let def = &world.levels[index];
    let field = materialize(def);
    world.level_name = def.name.clone();
    world.background = def.background.clone();
    log::info!(
        "level {} \"{}\": {} bricks, {} points",
        index + 1,
        world.level_name,
        field.bricks.len(),
        field.max_level_score
    );

    world.bricks = field.bricks;
    world.progress.level_index = index;
    world.progress.level_score = 0;
    world.progress.max_level_score = field.max_level_score;
    world.progress.max_score_so_far += field.max_level_score;
    reset_serve(world);
}

/// Ball and paddle back to the serve position; the field is untouched.
pub fn reset_serve(world: &mut WorldState) {
    world.ball = Ball::new();
    world.paddle = Paddle::new();
}
