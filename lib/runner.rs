use crate::chess::{Move, Position};
use crate::eval::Score;
use async_trait::async_trait;
use derive_more::{Constructor, Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

mod book;
mod uci;

pub use book::*;
pub use uci::*;

/// A move proposed by a runner.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Constructor)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", best)]
pub struct Proposal {
    /// The proposed move.
    pub best: Move,

    /// Its evaluation from the side to move's perspective, if one was computed.
    pub score: Option<Score>,
}

/// The difficulty level of the player.
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(#[cfg_attr(test, strategy(Level::MIN.0..=Level::MAX.0))] u8);

impl Level {
    /// The weakest level.
    pub const MIN: Level = Level(1);

    /// The strongest level.
    pub const MAX: Level = Level(20);

    /// Constructs [`Level`], if `n` is within bounds.
    pub const fn new(n: u8) -> Option<Self> {
        if Level::MIN.0 <= n && n <= Level::MAX.0 {
            Some(Level(n))
        } else {
            None
        }
    }

    /// This level as a plain integer.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::MIN
    }
}

/// The reason why a number is not a valid [`Level`].
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected a level between {} and {}", "Level::MIN", "Level::MAX")]
pub struct InvalidLevelError;

impl TryFrom<u8> for Level {
    type Error = InvalidLevelError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Level::new(n).ok_or(InvalidLevelError)
    }
}

impl From<Level> for u8 {
    fn from(l: Level) -> Self {
        l.0
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>().map_err(|_| InvalidLevelError)?.try_into()
    }
}

/// Trait for backends that know how to propose a move.
#[cfg_attr(test, mockall::automock(type Error = String;))]
#[async_trait]
pub trait Propose {
    /// The reason why the runner was unable to answer.
    type Error;

    /// Completes any pending initialization.
    ///
    /// Idempotent; requests issued before initialization resolves simply
    /// suspend here.
    async fn init(&mut self) -> Result<(), Self::Error>;

    /// Proposes a move for the given position, or nothing if the runner has
    /// no answer for it.
    async fn propose(
        &mut self,
        pos: &Position,
        level: Level,
    ) -> Result<Option<Proposal>, Self::Error>;
}
