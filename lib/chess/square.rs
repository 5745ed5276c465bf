use derive_more::{Display, Error};
use std::str::FromStr;

/// A square of the board in algebraic notation.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}{}", file, rank)]
pub struct Square {
    #[cfg_attr(test, strategy(proptest::char::range('a', 'h')))]
    file: char,
    #[cfg_attr(test, strategy(proptest::char::range('1', '8')))]
    rank: char,
}

impl Square {
    /// Constructs [`Square`] from a pair of file and rank characters.
    pub fn new(file: char, rank: char) -> Option<Self> {
        if ('a'..='h').contains(&file) && ('1'..='8').contains(&rank) {
            Some(Square { file, rank })
        } else {
            None
        }
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected a file `a`-`h` followed by a rank `1`-`8`")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => Square::new(file, rank).ok_or(ParseSquareError),
            _ => Err(ParseSquareError),
        }
    }
}
