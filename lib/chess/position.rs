use crate::chess::{Color, Ply, Square};
use derive_more::{Display, Error};
use std::fmt;
use std::str::FromStr;

/// A chess position in [Forsyth-Edwards Notation][FEN].
///
/// Only the notation is validated; whether the position is reachable or even
/// legal is the concern of whichever backend consumes it.
///
/// [FEN]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Position {
    placement: String,
    turn: Color,
    castling: String,
    en_passant: String,
    halfmoves: u32,
    fullmoves: u32,
}

impl Position {
    /// The side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// The number of half moves played since the start of the game.
    pub fn ply(&self) -> Ply {
        let moves = self.fullmoves.saturating_sub(1).saturating_mul(2);

        Ply::new(match self.turn {
            Color::White => moves,
            Color::Black => moves.saturating_add(1),
        })
    }

    /// The position stripped of its move counters.
    ///
    /// Opening books are keyed this way, so that positions reached by
    /// transposition share their entries.
    pub fn key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.placement, self.turn, self.castling, self.en_passant
        )
    }
}

impl Default for Position {
    fn default() -> Self {
        Position {
            placement: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR".to_string(),
            turn: Color::White,
            castling: "KQkq".to_string(),
            en_passant: "-".to_string(),
            halfmoves: 0,
            fullmoves: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement, self.turn, self.castling, self.en_passant, self.halfmoves, self.fullmoves
        )
    }
}

/// The reason why parsing [`Position`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "`{}` is not a position in Forsyth-Edwards Notation", _0)]
pub struct ParseFenError(#[error(not(source))] String);

fn valid_placement(s: &str) -> bool {
    let mut ranks = 0;

    for rank in s.split('/') {
        let mut files = 0;

        for c in rank.chars() {
            match c {
                'p' | 'n' | 'b' | 'r' | 'q' | 'k' => files += 1,
                'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => files += 1,
                '1'..='8' => files += c as u32 - '0' as u32,
                _ => return false,
            }
        }

        if files != 8 {
            return false;
        }

        ranks += 1;
    }

    ranks == 8
}

fn valid_castling(s: &str) -> bool {
    s == "-" || (!s.is_empty() && s.chars().all(|c| "KQkq".contains(c)))
}

fn valid_en_passant(s: &str) -> bool {
    s == "-" || s.parse::<Square>().is_ok()
}

impl FromStr for Position {
    type Err = ParseFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFenError(s.to_string());

        match *s.split_whitespace().collect::<Vec<_>>().as_slice() {
            [placement, turn, castling, en_passant, halfmoves, fullmoves] => {
                if !valid_placement(placement)
                    || !valid_castling(castling)
                    || !valid_en_passant(en_passant)
                {
                    return Err(err());
                }

                let pos = Position {
                    placement: placement.to_string(),
                    turn: turn.parse().map_err(|_| err())?,
                    castling: castling.to_string(),
                    en_passant: en_passant.to_string(),
                    halfmoves: halfmoves.parse().map_err(|_| err())?,
                    fullmoves: fullmoves.parse().map_err(|_| err())?,
                };

                if pos.fullmoves < 1 {
                    return Err(err());
                }

                Ok(pos)
            }

            _ => Err(err()),
        }
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for Position {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        prop_oneof![
            Just("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Just("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
            Just("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/R1BQK1NR b KQkq - 3 3"),
            Just("8/8/8/8/8/5k2/7q/7K w - - 10 71"),
        ]
        .prop_map(|fen| fen.parse().unwrap())
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn the_default_position_is_the_starting_position() {
        assert_eq!(
            Position::default().to_string(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[proptest]
    fn parsing_printed_position_is_an_identity() {
        let pos = Position::default();
        assert_eq!(pos.to_string().parse(), Ok(pos));
    }

    #[proptest]
    fn ply_is_derived_from_the_move_counters(
        #[strategy(1u32..1000)] fullmoves: u32,
        turn: Color,
    ) {
        let fen = format!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR {} KQkq - 0 {}",
            turn, fullmoves
        );

        let pos: Position = fen.parse()?;

        let expected = match turn {
            Color::White => (fullmoves - 1) * 2,
            Color::Black => (fullmoves - 1) * 2 + 1,
        };

        assert_eq!(pos.ply(), Ply::new(expected));
    }

    #[proptest]
    fn the_starting_position_is_at_ply_zero() {
        assert_eq!(Position::default().ply(), Ply::new(0));
    }

    #[proptest]
    fn key_strips_the_move_counters(#[strategy(0u32..100)] n: u32, #[strategy(1u32..100)] m: u32) {
        let fen = format!("8/8/8/8/8/8/8/4K2k b - - {} {}", n, m);
        let pos: Position = fen.parse()?;
        assert_eq!(pos.key(), "8/8/8/8/8/8/8/4K2k b - -");
    }

    #[proptest]
    fn parsing_position_fails_for_missing_fields() {
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
            .parse::<Position>()
            .is_err());
    }

    #[proptest]
    fn parsing_position_fails_for_short_ranks() {
        assert!("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBN w KQkq - 0 1"
            .parse::<Position>()
            .is_err());
    }

    #[proptest]
    fn parsing_position_fails_for_an_invalid_side_to_move(
        #[filter(!matches!(#turn.as_str(), "w" | "b"))]
        #[strategy("[a-z]+")]
        turn: String,
    ) {
        let fen = format!("8/8/8/8/8/8/8/4K2k {} - - 0 1", turn);
        assert!(fen.parse::<Position>().is_err());
    }

    #[proptest]
    fn parsing_position_fails_when_fullmoves_is_zero() {
        assert!("8/8/8/8/8/8/8/4K2k w - - 0 0".parse::<Position>().is_err());
    }
}
