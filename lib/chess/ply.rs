use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The number of half moves played since the start of the game.
#[derive(
    Debug, Display, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(transparent)]
pub struct Ply(u32);

impl Ply {
    /// Constructs [`Ply`] from the number of half moves played.
    pub fn new(n: u32) -> Self {
        Ply(n)
    }

    /// This ply as a plain integer.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// The preceding ply, unless this is the start of the game.
    pub fn prev(&self) -> Option<Ply> {
        self.0.checked_sub(1).map(Ply)
    }
}

impl From<u32> for Ply {
    fn from(n: u32) -> Self {
        Ply(n)
    }
}
