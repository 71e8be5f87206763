use crate::game::board::{Board, Move};
use crate::game::evaluate::{evaluate, MAX_EVAL, MIN_EVAL};
use crate::game::movegen::MoveGen;
use crate::game::pieces::{ConstEngine, ConstPlayer};

/// Fixed search horizon in plies.
pub const SEARCH_DEPTH: i32 = 5;

///
/// Score every engine move with a depth-first minimax search and return the
/// best one. `None` means the engine has no legal moves, so the game is over
/// (the caller tells mate from stalemate with the check test).
///
pub fn best_move(board: &mut Board, movegen: &mut MoveGen) -> Option<Move> {
    let mut best = None;
    let mut best_score = MIN_EVAL;

    movegen.generate(board, true);
    for board_move in movegen.sorted_moves() {
        let snapshot = board.snapshot();
        board.apply_move_for::<ConstEngine>(&board_move);

        let score = minimize(board, movegen, 1, MIN_EVAL, MAX_EVAL);

        board.restore(&snapshot);

        log::debug!(
            "root move {} -> {} scores {}",
            board_move.from,
            board_move.to,
            score
        );

        if best.is_none() || score > best_score {
            best_score = score;
            best = Some(board_move);
        }
    }

    best
}

///
/// The engine's half of the search: pick the child with the highest score.
///
pub fn maximize(board: &mut Board, movegen: &mut MoveGen, ply: i32, mut alpha: i32, beta: i32) -> i32 {
    if ply > SEARCH_DEPTH {
        return evaluate(&board.position);
    }

    movegen.generate(board, true);
    let moves = movegen.sorted_moves();
    if moves.is_empty() {
        if movegen.is_king_in_check(board, true) {
            // mated; deeper means the mate took longer, which the engine
            // prefers when it is on the losing end
            return MIN_EVAL + ply;
        }
        return 0;
    }

    let mut best_score = MIN_EVAL;
    for board_move in moves {
        let snapshot = board.snapshot();
        board.apply_move_for::<ConstEngine>(&board_move);

        let score = minimize(board, movegen, ply + 1, alpha, beta);

        board.restore(&snapshot);

        if score > best_score {
            best_score = score;
        }
        if best_score > alpha {
            alpha = best_score;
        }
        if beta <= alpha {
            break;
        }
    }

    best_score
}

///
/// The player's half: assume the opponent answers with the move that is worst
/// for the engine.
///
pub fn minimize(board: &mut Board, movegen: &mut MoveGen, ply: i32, alpha: i32, mut beta: i32) -> i32 {
    if ply > SEARCH_DEPTH {
        return evaluate(&board.position);
    }

    movegen.generate(board, false);
    let moves = movegen.sorted_moves();
    if moves.is_empty() {
        if movegen.is_king_in_check(board, false) {
            // the engine delivered mate; sooner scores higher
            return MAX_EVAL - ply;
        }
        return 0;
    }

    let mut best_score = MAX_EVAL;
    for board_move in moves {
        let snapshot = board.snapshot();
        board.apply_move_for::<ConstPlayer>(&board_move);

        let score = maximize(board, movegen, ply + 1, alpha, beta);

        board.restore(&snapshot);

        if score < best_score {
            best_score = score;
        }
        if best_score < beta {
            beta = best_score;
        }
        if beta <= alpha {
            break;
        }
    }

    best_score
}
