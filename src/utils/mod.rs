pub mod bitboard;
pub mod cli;
pub mod magic;

pub use bitboard::*;
pub use magic::*;
