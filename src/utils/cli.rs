use std::io;

use crate::game::board::MoveKind;
use crate::game::pieces::EngineColor;
use crate::game::square::{BoardSquare, BoardSquareExt};

///
/// The host's command language. Square arguments use ordinary algebraic
/// names ("e2"), translated through the engine-color board mirroring.
///
pub enum HostCommand {
    NewGame,
    ShowBoard,
    ListMoves,
    Play {
        from: BoardSquare,
        to: BoardSquare,
        promotion: MoveKind,
    },
    Best,
    Perft(usize),
    Quit,
    Invalid(String),
}

impl HostCommand {
    /// Read one command from stdin; `None` on end of input.
    pub fn receive(color: EngineColor) -> Option<HostCommand> {
        let mut input = String::new();
        if io::stdin().read_line(&mut input).ok()? == 0 {
            return None;
        }

        let parts = input.trim().split_whitespace().collect::<Vec<_>>();

        Some(match parts.as_slice() {
            ["new"] => HostCommand::NewGame,
            ["board"] => HostCommand::ShowBoard,
            ["moves"] => HostCommand::ListMoves,
            ["best"] => HostCommand::Best,
            ["perft", depth] => match depth.parse::<usize>() {
                Ok(depth) => HostCommand::Perft(depth),
                Err(_) => HostCommand::Invalid(input),
            },
            ["quit"] | ["exit"] => HostCommand::Quit,
            ["move", from, to] => match (parse_square(from, color), parse_square(to, color)) {
                (Some(from), Some(to)) => HostCommand::Play {
                    from,
                    to,
                    promotion: MoveKind::QueenPromotion,
                },
                _ => HostCommand::Invalid(input),
            },
            ["move", from, to, promotion] => {
                match (
                    parse_square(from, color),
                    parse_square(to, color),
                    parse_promotion(promotion),
                ) {
                    (Some(from), Some(to), Some(promotion)) => {
                        HostCommand::Play { from, to, promotion }
                    }
                    _ => HostCommand::Invalid(input),
                }
            }
            _ => HostCommand::Invalid(input),
        })
    }
}

pub fn parse_square(text: &str, color: EngineColor) -> Option<BoardSquare> {
    let mut chars = text.chars();
    let file = chars.next()?;
    let rank = chars.next()?.to_digit(10)?;
    if chars.next().is_some() || !('a'..='h').contains(&file) || !(1..=8).contains(&rank) {
        return None;
    }

    let col = match color {
        EngineColor::White => b'h' - file as u8,
        EngineColor::Black => file as u8 - b'a',
    };
    let row = match color {
        EngineColor::White => rank as u8 - 1,
        EngineColor::Black => 8 - rank as u8,
    };
    Some(BoardSquare::from_coords(row, col))
}

fn parse_promotion(text: &str) -> Option<MoveKind> {
    match text {
        "q" => Some(MoveKind::QueenPromotion),
        "n" => Some(MoveKind::KnightPromotion),
        "b" => Some(MoveKind::BishopPromotion),
        "r" => Some(MoveKind::RookPromotion),
        _ => None,
    }
}
