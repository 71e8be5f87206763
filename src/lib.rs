pub mod controller;
pub mod game;
pub mod utils;

pub use crate::controller::GameController;
pub use crate::game::board::{Board, Move, MoveKind, Position, Snapshot};
pub use crate::game::movegen::MoveGen;
pub use crate::game::pieces::{EngineColor, PieceKind, Side};
pub use crate::game::square::{BoardSquare, BoardSquareExt};
pub use crate::utils::bitboard::{Bitboard, BitboardExt};
pub use crate::utils::magic::{MagicError, SlidingTables};

#[cfg(test)]
mod test;
