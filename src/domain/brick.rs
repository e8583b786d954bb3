/// Brick types and live bricks.
/// Durability semantics are centralized here so the step never
/// has to special-case the indestructible type.

use super::geometry::Aabb;

/// How much punishment a brick can take.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Durability {
    Breakable(u32),
    /// Permanent level geometry: never loses hit points, scores nothing.
    Indestructible,
}

/// A brick type as declared by a level file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BrickType {
    pub id: char,
    pub texture: String,
    pub durability: Durability,
    pub hit_sound: String,
    pub break_sound: String,
    pub break_score: u32,
}

/// Outcome of a single ball impact on a brick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Impact {
    /// Brick absorbed the hit and is still standing.
    Damaged,
    /// Hit points reached zero; remove the brick.
    Broken,
}

/// A positioned, live brick.
#[derive(Clone, PartialEq, Debug)]
pub struct Brick {
    pub id: char,
    pub texture: String,
    pub durability: Durability,
    pub hit_sound: String,
    pub break_sound: String,
    pub break_score: u32,
    pub bounds: Aabb,
}

impl Brick {
    pub fn new(kind: &BrickType, bounds: Aabb) -> Self {
        Brick {
            id: kind.id,
            texture: kind.texture.clone(),
            durability: kind.durability,
            hit_sound: kind.hit_sound.clone(),
            break_sound: kind.break_sound.clone(),
            break_score: kind.break_score,
            bounds,
        }
    }

    pub fn is_breakable(&self) -> bool {
        matches!(self.durability, Durability::Breakable(_))
    }

    /// Remaining hit points, `None` for indestructible bricks.
    pub fn hit_points(&self) -> Option<u32> {
        match self.durability {
            Durability::Breakable(hp) => Some(hp),
            Durability::Indestructible => None,
        }
    }

    /// Apply one hit. Hit points saturate at zero.
    pub fn take_hit(&mut self) -> Impact {
        match &mut self.durability {
            Durability::Breakable(hp) => {
                *hp = hp.saturating_sub(1);
                if *hp == 0 { Impact::Broken } else { Impact::Damaged }
            }
            Durability::Indestructible => Impact::Damaged,
        }
    }
}
