use crate::runner::Level;
use derive_more::Display;

/// Identifies which of the two runners services a request.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum RunnerId {
    /// The opening book.
    #[display(fmt = "opening")]
    Opening,

    /// The search engine.
    #[display(fmt = "engine")]
    Engine,
}

/// The weakest level that is allowed to play book moves.
///
/// Levels below this one are denied the book, which would otherwise make them
/// play considerably stronger than configured.
pub const BOOK_LEVEL: Level = match Level::new(3) {
    Some(level) => level,
    None => unreachable!(),
};

impl RunnerId {
    /// The runner a failed request falls back to.
    ///
    /// Only the opening book has a fallback; when the engine itself has no
    /// answer the request is beyond saving.
    pub fn fallback(&self) -> Option<RunnerId> {
        match self {
            RunnerId::Opening => Some(RunnerId::Engine),
            RunnerId::Engine => None,
        }
    }
}

/// Chooses the runner that services the next request.
pub fn select(current: RunnerId, level: Level) -> RunnerId {
    if level < BOOK_LEVEL {
        RunnerId::Engine
    } else {
        current
    }
}
