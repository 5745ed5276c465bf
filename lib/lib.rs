/// Chess domain types.
pub mod chess;
/// Evaluation scores and per-ply history.
pub mod eval;
/// Line-oriented asynchronous IO.
pub mod io;
/// The move decision component.
pub mod kibitzer;
/// Session persistence.
pub mod persist;
/// Move-proposing backends.
pub mod runner;
