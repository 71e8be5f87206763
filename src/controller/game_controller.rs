use crate::game::board::{Board, Move, MoveKind};
use crate::game::movegen::MoveGen;
use crate::game::pieces::{EngineColor, PieceKind, Side};
use crate::game::search;
use crate::game::square::{BoardSquare, BoardSquareExt};

///
/// What the host talks to: one board, one generator, one searcher. The host
/// never touches bitboards; it deals in [`Move`] values it got from
/// [`GameController::legal_moves_for`] and feeds them back unchanged.
///
pub struct GameController {
    pub board: Board,
    movegen: MoveGen,
}

impl GameController {
    pub fn new(color: EngineColor) -> GameController {
        GameController {
            board: Board::new(color),
            movegen: MoveGen::new(),
        }
    }

    pub fn new_game(&mut self) {
        self.board = Board::new(self.board.engine_color);
    }

    pub fn legal_moves_for(&mut self, side: Side) -> Vec<Move> {
        self.movegen.generate(&self.board, side == Side::Engine);
        self.movegen.sorted_moves()
    }

    /// Play a move obtained from [`GameController::legal_moves_for`]. Moves
    /// from anywhere else are the caller's bug; nothing is re-validated.
    pub fn apply_move(&mut self, board_move: &Move) {
        let is_engine = board_move.moving.side() == Side::Engine;
        self.board.apply_move(board_move, is_engine);
    }

    pub fn piece_at(&self, square: BoardSquare) -> Option<PieceKind> {
        self.board.piece_at(square)
    }

    pub fn side_to_move(&self) -> Side {
        if self.board.engine_to_move {
            Side::Engine
        } else {
            Side::Player
        }
    }

    pub fn in_check(&self, side: Side) -> bool {
        self.movegen.is_king_in_check(&self.board, side == Side::Engine)
    }

    /// Search for the engine's move. `None` means the engine has no legal
    /// moves and the game is over.
    pub fn choose_best_move(&mut self) -> Option<Move> {
        search::best_move(&mut self.board, &mut self.movegen)
    }

    /// Count leaf nodes of the legal game tree to the given depth, the
    /// standard generator correctness oracle.
    pub fn perft(&mut self, depth: usize) -> u64 {
        let side = self.side_to_move();
        Self::perft_walk(&mut self.board, &mut self.movegen, side, depth)
    }

    /// Perft split by root move, for chasing down a wrong total.
    pub fn perft_divide(&mut self, depth: usize) -> Vec<(Move, u64)> {
        if depth == 0 {
            return Vec::new();
        }

        let side = self.side_to_move();
        self.movegen.generate(&self.board, side == Side::Engine);
        let moves = self.movegen.sorted_moves();

        let mut counts = Vec::with_capacity(moves.len());
        for board_move in moves {
            let snapshot = self.board.snapshot();
            self.board.apply_move(&board_move, side == Side::Engine);
            let nodes = Self::perft_walk(&mut self.board, &mut self.movegen, !side, depth - 1);
            self.board.restore(&snapshot);
            counts.push((board_move, nodes));
        }
        counts
    }

    fn perft_walk(board: &mut Board, movegen: &mut MoveGen, side: Side, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }

        movegen.generate(board, side == Side::Engine);
        let moves = movegen.sorted_moves();
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for board_move in moves {
            let snapshot = board.snapshot();
            board.apply_move(&board_move, side == Side::Engine);
            nodes += Self::perft_walk(board, movegen, !side, depth - 1);
            board.restore(&snapshot);
        }
        nodes
    }

    /// Square name in the letters-and-digits scheme the host logs, honoring
    /// the engine-color mirroring of the displayed board.
    pub fn square_name(&self, square: BoardSquare) -> String {
        let file = match self.board.engine_color {
            EngineColor::White => (b'h' - square.col()) as char,
            EngineColor::Black => (b'a' + square.col()) as char,
        };
        let rank = match self.board.engine_color {
            EngineColor::White => square.row() + 1,
            EngineColor::Black => 8 - square.row(),
        };
        format!("{}{}", file, rank)
    }

    /// Short notation for host logs: piece letter, `x` on captures, the
    /// destination square, and the chosen piece on promotions. A two-file
    /// king move is just "castle".
    pub fn notation(&self, board_move: &Move) -> String {
        let mut notation = String::new();

        match board_move.moving.to_char() {
            'k' if (board_move.from.col() as i32 - board_move.to.col() as i32).abs() > 1 => {
                return "castle".to_string();
            }
            'p' => {}
            letter => notation.push(letter),
        }

        if board_move.captured.is_some() {
            notation.push('x');
        }
        notation.push_str(&self.square_name(board_move.to));

        if board_move.kind.is_promotion() {
            notation.push('=');
            notation.push(match board_move.kind {
                MoveKind::QueenPromotion => 'q',
                MoveKind::KnightPromotion => 'n',
                MoveKind::BishopPromotion => 'b',
                MoveKind::RookPromotion => 'r',
                _ => unreachable!(),
            });
        }

        notation
    }
}
