mod color;
mod ply;
mod position;
mod promotion;
mod r#move;
mod square;

pub use color::*;
pub use ply::*;
pub use position::*;
pub use promotion::*;
pub use r#move::*;
pub use square::*;
