/// Pure game rules: geometry, entities, bricks and swept collision.
/// Nothing in here touches the terminal, the clock or the file system.

pub mod brick;
pub mod entity;
pub mod geometry;
pub mod physics;
