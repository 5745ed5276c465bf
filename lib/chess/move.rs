use crate::chess::{ParseSquareError, Promotion, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A move in coordinate notation, e.g. `e2e4` or `e7e8q`.
///
/// Whether the move is legal in any given position is the concern of
/// whichever backend proposed it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(try_from = "String", into = "String")]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.promotion {
            Some(p) => write!(f, "{}{}{}", self.from, self.to, p),
            None => write!(f, "{}{}", self.from, self.to),
        }
    }
}

/// The reason why parsing [`Move`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "failed to parse move in coordinate notation")]
pub struct ParseMoveError;

impl From<ParseSquareError> for ParseMoveError {
    fn from(_: ParseSquareError) -> Self {
        ParseMoveError
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ([a, b, c, d], promotion) = match *s.chars().collect::<Vec<_>>().as_slice() {
            [a, b, c, d] => ([a, b, c, d], None),
            [a, b, c, d, p] => ([a, b, c, d], Some(Promotion::new(p).ok_or(ParseMoveError)?)),
            _ => return Err(ParseMoveError),
        };

        Ok(Move {
            from: Square::new(a, b).ok_or(ParseSquareError)?,
            to: Square::new(c, d).ok_or(ParseSquareError)?,
            promotion,
        })
    }
}

impl TryFrom<String> for Move {
    type Error = ParseMoveError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Move> for String {
    fn from(m: Move) -> Self {
        m.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_move_is_an_identity(m: Move) {
        assert_eq!(m.to_string().parse(), Ok(m));
    }

    #[proptest]
    fn parsing_move_fails_for_the_null_move() {
        assert_eq!("0000".parse::<Move>(), Err(ParseMoveError));
    }

    #[proptest]
    fn parsing_move_fails_for_invalid_notation(#[filter(!matches!(#s.len(), 4 | 5))] s: String) {
        assert_eq!(s.parse::<Move>(), Err(ParseMoveError));
    }

    #[proptest]
    fn parsing_move_fails_for_an_invalid_promotion(
        m: Move,
        #[filter(!"nbrq".contains(#c))] c: char,
    ) {
        let s = format!("{}{}{}", m.from, m.to, c);
        assert_eq!(s.parse::<Move>(), Err(ParseMoveError));
    }
}
