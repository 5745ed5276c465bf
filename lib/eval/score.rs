use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A signed evaluation of a position.
///
/// Scores are reported by backends from the side to move's perspective; whose
/// perspective a stored score expresses is the concern of whoever stores it.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Score {
    /// An evaluation in centipawns.
    #[display(fmt = "{:+}", _0)]
    Cp(i32),

    /// A forced mate in the given number of moves.
    ///
    /// A negative count means the opponent is the one mating.
    #[display(fmt = "#{}", _0)]
    Mate(i8),
}
