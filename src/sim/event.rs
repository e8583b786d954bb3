/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and on-screen feedback;
/// the order within one step is the order things happened.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    WallBounce,
    PaddleBounce,
    /// A brick took a hit; `sound` is the brick type's hit sound reference.
    BrickHit { sound: String },
    /// A brick reached zero hit points and was removed.
    BrickBreak { sound: String, score: u32 },
    LifeLost { lives_left: u32 },
    /// Level cleared; `next_level` is already loaded.
    LevelComplete { next_level: usize },
    GameWon,
    GameLost,
}
