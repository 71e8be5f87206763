//! Fully legal move generation. There is no pseudo-legal-then-filter pass:
//! before any piece moves are produced, three bitboards are computed for the
//! side to move and every generated move is masked against them.
//!
//! - `blocker_squares`: where a non-king piece may land. All ones out of
//!   check; the checker's square plus its ray to the king under a single
//!   check; empty under double check, which only a king move can answer.
//! - `cardinal_pins` / `ordinal_pins`: the squares of every active absolute
//!   pin ray, one board per ray family. They are kept separate because a
//!   diagonally pinned piece may still be able to slide diagonally, and the
//!   other way around.

use crate::game::board::{Board, Move, MoveKind};
use crate::game::evaluate::piece_value;
use crate::game::pieces::{ConstEngine, ConstPlayer, ConstSide, PieceKind};
use crate::game::square::{BoardSquare, BoardSquareExt};
use crate::utils::bitboard::{
    Bitboard, BitboardExt, FILE_0, FILE_7, FILLED_BOARD, RANK_0, RANK_2, RANK_3, RANK_4, RANK_5,
    RANK_7,
};
use crate::utils::magic::SlidingTables;

const fn leaper_moves<const N: usize>(deltas: [(i32, i32); N]) -> [Bitboard; 64] {
    let mut table = [0u64; 64];
    let mut square = 0;
    while square < 64 {
        let row = (square / 8) as i32;
        let col = (square % 8) as i32;

        let mut i = 0;
        while i < N {
            let to_row = row + deltas[i].0;
            let to_col = col + deltas[i].1;
            if to_row >= 0 && to_row < 8 && to_col >= 0 && to_col < 8 {
                table[square] |= 1u64 << (to_row * 8 + to_col);
            }
            i += 1;
        }

        square += 1;
    }
    table
}

pub const KNIGHT_MOVES: [Bitboard; 64] = leaper_moves([
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
]);

pub const KING_MOVES: [Bitboard; 64] = leaper_moves([
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
]);

pub struct MoveGen {
    tables: &'static SlidingTables,

    blocker_squares: Bitboard,
    cardinal_pins: Bitboard,
    ordinal_pins: Bitboard,

    generated: Vec<Move>,
}

impl Default for MoveGen {
    fn default() -> Self {
        MoveGen::new()
    }
}

impl MoveGen {
    pub fn new() -> MoveGen {
        MoveGen::with_tables(SlidingTables::shared())
    }

    pub fn with_tables(tables: &'static SlidingTables) -> MoveGen {
        MoveGen {
            tables,
            blocker_squares: FILLED_BOARD,
            cardinal_pins: 0,
            ordinal_pins: 0,
            generated: Vec::with_capacity(64),
        }
    }

    /// Fill the internal list with every legal move for the given side.
    pub fn generate(&mut self, board: &Board, is_engine: bool) {
        if is_engine {
            self.generate_for::<ConstEngine>(board)
        } else {
            self.generate_for::<ConstPlayer>(board)
        }
    }

    fn generate_for<S: ConstSide>(&mut self, board: &Board) {
        self.find_blocker_squares::<S>(board);
        self.find_cardinal_pins::<S>(board);
        self.find_ordinal_pins::<S>(board);

        self.generated.clear();
        self.generate_pawn_moves::<S>(board);
        self.generate_knight_moves::<S>(board);
        self.generate_king_moves::<S>(board);
        self.generate_bishop_moves::<S>(board);
        self.generate_rook_moves::<S>(board);
        self.generate_queen_moves::<S>(board);
    }

    ///
    /// Drain the generated moves, best ordering guess first: winning captures
    /// before losing ones, quiet moves after, ties in generation order. Every
    /// move's key starts at zero so a quiet move can never inherit the score
    /// of a capture examined before it.
    ///
    pub fn sorted_moves(&mut self) -> Vec<Move> {
        let mut moves = std::mem::take(&mut self.generated);
        moves.sort_by_key(|board_move| {
            let mut score = 0;
            if let Some(captured) = board_move.captured {
                // always at least a pawn's worth, so captures sort first
                score = piece_value(PieceKind::EngineQueen) + piece_value(captured)
                    - piece_value(board_move.moving);
            }
            -score
        });
        moves
    }

    pub fn is_king_in_check(&self, board: &Board, is_engine: bool) -> bool {
        if is_engine {
            !self.is_safe_square::<ConstEngine>(board, board.king_square::<ConstEngine>())
        } else {
            !self.is_safe_square::<ConstPlayer>(board, board.king_square::<ConstPlayer>())
        }
    }

    /// Squares the side's pieces may move to (enemy or empty).
    fn movable<S: ConstSide>(&self, board: &Board) -> Bitboard {
        if S::IS_ENGINE {
            board.player_or_empty
        } else {
            board.engine_or_empty
        }
    }

    fn enemy_pieces<S: ConstSide>(&self, board: &Board) -> Bitboard {
        if S::IS_ENGINE {
            board.player_pieces
        } else {
            board.engine_pieces
        }
    }

    ///
    /// Would `square` be attacked by `S`'s opponent? The moving king is
    /// removed from the occupancy first, so a king cannot appear to escape by
    /// sliding along the very ray that checks it.
    ///
    fn is_safe_square<S: ConstSide>(&self, board: &Board, square: BoardSquare) -> bool {
        let pieces = &board.position.pieces;
        let attacked = square.to_mask();
        let occupancy = board.occupied_squares & !pieces[S::KING as usize];

        let cardinal_rays = self.tables.cardinal_attacks(square, occupancy);
        let ordinal_rays = self.tables.ordinal_attacks(square, occupancy);

        let mut attackers = cardinal_rays
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::ROOK as usize]);
        attackers |= ordinal_rays
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::BISHOP as usize]);
        attackers |= KNIGHT_MOVES[square as usize] & pieces[S::Opponent::KNIGHT as usize];
        attackers |= KING_MOVES[square as usize] & pieces[S::Opponent::KING as usize];

        let enemy_pawns = pieces[S::Opponent::PAWN as usize];
        attackers |= if S::IS_ENGINE {
            ((attacked & !FILE_7) << 9) & enemy_pawns
        } else {
            ((attacked & !FILE_0) >> 9) & enemy_pawns
        };
        attackers |= if S::IS_ENGINE {
            ((attacked & !FILE_0) << 7) & enemy_pawns
        } else {
            ((attacked & !FILE_7) >> 7) & enemy_pawns
        };

        attackers == 0
    }

    ///
    /// Where may a non-king piece land while the king survives? Scan outward
    /// from the king in both ray families, pick up knight and pawn attackers,
    /// and distill the set of check-resolving squares.
    ///
    fn find_blocker_squares<S: ConstSide>(&mut self, board: &Board) {
        let pieces = &board.position.pieces;
        let king = pieces[S::KING as usize];
        let king_square = king.next_index();

        let cardinal_rays = self
            .tables
            .cardinal_attacks(king_square, board.occupied_squares);
        let ordinal_rays = self
            .tables
            .ordinal_attacks(king_square, board.occupied_squares);

        let cardinal_attackers = cardinal_rays
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::ROOK as usize]);
        let ordinal_attackers = ordinal_rays
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::BISHOP as usize]);

        let mut attackers = cardinal_attackers | ordinal_attackers;
        attackers |= KNIGHT_MOVES[king_square as usize] & pieces[S::Opponent::KNIGHT as usize];

        let enemy_pawns = pieces[S::Opponent::PAWN as usize];
        attackers |= if S::IS_ENGINE {
            ((king & !FILE_7) << 9) & enemy_pawns
        } else {
            ((king & !FILE_0) >> 9) & enemy_pawns
        };
        attackers |= if S::IS_ENGINE {
            ((king & !FILE_0) << 7) & enemy_pawns
        } else {
            ((king & !FILE_7) >> 7) & enemy_pawns
        };

        self.blocker_squares = if attackers == 0 {
            FILLED_BOARD
        } else if attackers.count_ones() == 1 {
            if cardinal_attackers != 0 {
                // interpose on the checker's ray toward the king, or take it
                let attacker = cardinal_attackers.next_index();
                (cardinal_rays
                    & self
                        .tables
                        .cardinal_attacks(attacker, board.occupied_squares))
                    | attackers
            } else if ordinal_attackers != 0 {
                let attacker = ordinal_attackers.next_index();
                (ordinal_rays
                    & self
                        .tables
                        .ordinal_attacks(attacker, board.occupied_squares))
                    | attackers
            } else {
                // a knight or pawn check has no ray; capturing is the only
                // non-king answer
                attackers
            }
        } else {
            // double check: no square saves the king but its own
            0
        };
    }

    ///
    /// Mark the squares of every active rank/file pin: scan from the king,
    /// take the first friendly piece on each ray out of the occupancy, scan
    /// again, and any enemy rook or queen now visible pins the removed piece.
    /// The pin ray runs from the king up to and including the pinner.
    ///
    fn find_cardinal_pins<S: ConstSide>(&mut self, board: &Board) {
        self.cardinal_pins = 0;

        let pieces = &board.position.pieces;
        let king_square = pieces[S::KING as usize].next_index();
        let friendly = if S::IS_ENGINE {
            board.engine_pieces
        } else {
            board.player_pieces
        };

        let inner = self
            .tables
            .cardinal_attacks(king_square, board.occupied_squares);
        let possibly_pinned = inner & friendly;

        let thinned = board.occupied_squares & !possibly_pinned;
        let extended = self.tables.cardinal_attacks(king_square, thinned);

        let mut pinning = extended
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::ROOK as usize]);
        while pinning != 0 {
            let pinning_square = pinning.pop_index();
            let reach = self.tables.cardinal_attacks(pinning_square, thinned);
            self.cardinal_pins |= extended & reach;
            // capturing the pinning piece stays within the pin
            self.cardinal_pins |= pinning_square.to_mask();
        }
    }

    fn find_ordinal_pins<S: ConstSide>(&mut self, board: &Board) {
        self.ordinal_pins = 0;

        let pieces = &board.position.pieces;
        let king_square = pieces[S::KING as usize].next_index();
        let friendly = if S::IS_ENGINE {
            board.engine_pieces
        } else {
            board.player_pieces
        };

        let inner = self
            .tables
            .ordinal_attacks(king_square, board.occupied_squares);
        let possibly_pinned = inner & friendly;

        let thinned = board.occupied_squares & !possibly_pinned;
        let extended = self.tables.ordinal_attacks(king_square, thinned);

        let mut pinning = extended
            & (pieces[S::Opponent::QUEEN as usize] | pieces[S::Opponent::BISHOP as usize]);
        while pinning != 0 {
            let pinning_square = pinning.pop_index();
            let reach = self.tables.ordinal_attacks(pinning_square, thinned);
            self.ordinal_pins |= extended & reach;
            self.ordinal_pins |= pinning_square.to_mask();
        }
    }

    fn generate_knight_moves<S: ConstSide>(&mut self, board: &Board) {
        // a pinned knight never has a legal move
        let mut knights =
            board.position.pieces[S::KNIGHT as usize] & !(self.cardinal_pins | self.ordinal_pins);
        while knights != 0 {
            let from = knights.pop_index();
            let mut moves =
                KNIGHT_MOVES[from as usize] & self.movable::<S>(board) & self.blocker_squares;
            while moves != 0 {
                let to = moves.pop_index();
                self.generated.push(Move {
                    kind: MoveKind::Normal,
                    from,
                    to,
                    moving: S::KNIGHT,
                    captured: board.enemy_piece_at::<S>(to),
                });
            }
        }
    }

    fn generate_bishop_moves<S: ConstSide>(&mut self, board: &Board) {
        // a rank/file pin takes away all diagonal movement
        let mut bishops = board.position.pieces[S::BISHOP as usize] & !self.cardinal_pins;
        while bishops != 0 {
            let from = bishops.pop_index();
            let mut moves = self.tables.ordinal_attacks(from, board.occupied_squares)
                & self.movable::<S>(board)
                & self.blocker_squares;
            if from.to_mask() & self.ordinal_pins != 0 {
                moves &= self.ordinal_pins;
            }
            while moves != 0 {
                let to = moves.pop_index();
                self.generated.push(Move {
                    kind: MoveKind::Normal,
                    from,
                    to,
                    moving: S::BISHOP,
                    captured: board.enemy_piece_at::<S>(to),
                });
            }
        }
    }

    fn generate_rook_moves<S: ConstSide>(&mut self, board: &Board) {
        let mut rooks = board.position.pieces[S::ROOK as usize] & !self.ordinal_pins;
        while rooks != 0 {
            let from = rooks.pop_index();
            let mut moves = self.tables.cardinal_attacks(from, board.occupied_squares)
                & self.movable::<S>(board)
                & self.blocker_squares;
            if from.to_mask() & self.cardinal_pins != 0 {
                moves &= self.cardinal_pins;
            }
            while moves != 0 {
                let to = moves.pop_index();
                self.generated.push(Move {
                    kind: MoveKind::Normal,
                    from,
                    to,
                    moving: S::ROOK,
                    captured: board.enemy_piece_at::<S>(to),
                });
            }
        }
    }

    fn generate_queen_moves<S: ConstSide>(&mut self, board: &Board) {
        let mut queens = board.position.pieces[S::QUEEN as usize];
        while queens != 0 {
            let from = queens.pop_index();
            let queen = from.to_mask();

            let mut moves = 0;
            // the two ray families are worked out independently, each under
            // its own pin restriction
            if queen & self.cardinal_pins == 0 {
                let mut ordinal_moves = self.tables.ordinal_attacks(from, board.occupied_squares);
                if queen & self.ordinal_pins != 0 {
                    ordinal_moves &= self.ordinal_pins;
                }
                moves |= ordinal_moves;
            }
            if queen & self.ordinal_pins == 0 {
                let mut cardinal_moves = self.tables.cardinal_attacks(from, board.occupied_squares);
                if queen & self.cardinal_pins != 0 {
                    cardinal_moves &= self.cardinal_pins;
                }
                moves |= cardinal_moves;
            }

            moves &= self.movable::<S>(board) & self.blocker_squares;

            while moves != 0 {
                let to = moves.pop_index();
                self.generated.push(Move {
                    kind: MoveKind::Normal,
                    from,
                    to,
                    moving: S::QUEEN,
                    captured: board.enemy_piece_at::<S>(to),
                });
            }
        }
    }

    fn generate_king_moves<S: ConstSide>(&mut self, board: &Board) {
        let from = board.king_square::<S>();

        // ordinary king steps are filtered square by square; the king is
        // never masked by blocker_squares
        let mut candidates = KING_MOVES[from as usize] & self.movable::<S>(board);
        let mut safe_moves = 0;
        while candidates != 0 {
            let to = candidates.pop_index();
            if self.is_safe_square::<S>(board, to) {
                safe_moves |= to.to_mask();
            }
        }

        if board.position.can_castle_queenside(S::SIDE) {
            let lane = *board.castling.queenside(S::SIDE);
            // three squares between king and rook have to be empty; the
            // rook-side extra square need not be safe
            if ((lane.path | lane.extra) & board.empty_squares).count_ones() == 3
                && self.path_is_safe::<S>(board, lane.path)
            {
                safe_moves |= lane.destination;
            }
        }

        if board.position.can_castle_kingside(S::SIDE) {
            let lane = *board.castling.kingside(S::SIDE);
            if (lane.path & board.empty_squares).count_ones() == 2
                && self.path_is_safe::<S>(board, lane.path)
            {
                safe_moves |= lane.destination;
            }
        }

        while safe_moves != 0 {
            let to = safe_moves.pop_index();
            self.generated.push(Move {
                kind: MoveKind::Normal,
                from,
                to,
                moving: S::KING,
                captured: board.enemy_piece_at::<S>(to),
            });
        }
    }

    /// No castling out of, through, or into check: every square of the king's
    /// transit, its current square included, has to be safe.
    fn path_is_safe<S: ConstSide>(&self, board: &Board, path: Bitboard) -> bool {
        path.iter_indices()
            .all(|square| self.is_safe_square::<S>(board, square))
    }

    fn generate_pawn_moves<S: ConstSide>(&mut self, board: &Board) {
        let pieces = &board.position.pieces;
        let pawns = pieces[S::PAWN as usize];

        // a diagonally pinned pawn cannot push at all
        let pushable = pawns & !self.ordinal_pins;
        let pushed = if S::IS_ENGINE {
            pushable << 8
        } else {
            pushable >> 8
        };
        let single_push = pushed & board.empty_squares;
        // the double push leaves from the single push's landing rank, so it
        // is derived before the check mask narrows anything down
        let pushed_again = if S::IS_ENGINE {
            (single_push & RANK_2) << 8
        } else {
            (single_push & RANK_5) >> 8
        };
        let double_push = pushed_again & board.empty_squares;

        let mut single_push = single_push & self.blocker_squares;
        let mut double_push = double_push & self.blocker_squares;

        while single_push != 0 {
            let to = single_push.pop_index();
            let from = if S::IS_ENGINE { to - 8 } else { to + 8 };

            // a push may not walk out of a rank/file pin
            if from.to_mask() & self.cardinal_pins != 0 && to.to_mask() & self.cardinal_pins == 0 {
                continue;
            }

            let promotion_rank = if S::IS_ENGINE { RANK_7 } else { RANK_0 };
            if to.to_mask() & promotion_rank != 0 {
                self.push_promotions::<S>(from, to, None);
            } else {
                self.generated.push(Move {
                    kind: MoveKind::Normal,
                    from,
                    to,
                    moving: S::PAWN,
                    captured: None,
                });
            }
        }

        while double_push != 0 {
            let to = double_push.pop_index();
            let from = if S::IS_ENGINE { to - 16 } else { to + 16 };

            if from.to_mask() & self.cardinal_pins != 0 && to.to_mask() & self.cardinal_pins == 0 {
                continue;
            }

            self.generated.push(Move {
                kind: MoveKind::Normal,
                from,
                to,
                moving: S::PAWN,
                captured: None,
            });
        }

        // no rank/file pinned pawn can ever capture
        let pawns = pawns & !self.cardinal_pins;

        let shifted_left = if S::IS_ENGINE {
            (pawns & !FILE_7) << 9
        } else {
            (pawns & !FILE_0) >> 9
        };
        let mut left_attacks = shifted_left & self.enemy_pieces::<S>(board) & self.blocker_squares;

        while left_attacks != 0 {
            let to = left_attacks.pop_index();
            let from = if S::IS_ENGINE { to - 9 } else { to + 9 };
            self.push_pawn_capture::<S>(board, from, to);
        }

        let shifted_right = if S::IS_ENGINE {
            (pawns & !FILE_0) << 7
        } else {
            (pawns & !FILE_7) >> 7
        };
        let mut right_attacks = shifted_right & self.enemy_pieces::<S>(board) & self.blocker_squares;

        while right_attacks != 0 {
            let to = right_attacks.pop_index();
            let from = if S::IS_ENGINE { to - 7 } else { to + 7 };
            self.push_pawn_capture::<S>(board, from, to);
        }

        if board.position.en_passant_capture != 0 {
            let en_passant = board.position.en_passant_capture;
            // only pawns on the capture rank qualify, which also keeps the
            // one-file shifts from wrapping onto a neighboring rank
            let capture_rank = if S::IS_ENGINE { RANK_4 } else { RANK_3 };
            let pawns = pawns & capture_rank;

            let right_neighbors = if S::IS_ENGINE { pawns >> 1 } else { pawns << 1 };
            let right = en_passant & right_neighbors & self.blocker_squares;
            if right != 0 {
                let capturer = if S::IS_ENGINE { right << 1 } else { right >> 1 };
                let from = capturer.next_index();
                let to = if S::IS_ENGINE { from + 7 } else { from - 7 };
                self.try_en_passant::<S>(board, from, to);
            }

            let left_neighbors = if S::IS_ENGINE { pawns << 1 } else { pawns >> 1 };
            let left = en_passant & left_neighbors & self.blocker_squares;
            if left != 0 {
                let capturer = if S::IS_ENGINE { left >> 1 } else { left << 1 };
                let from = capturer.next_index();
                let to = if S::IS_ENGINE { from + 9 } else { from - 9 };
                self.try_en_passant::<S>(board, from, to);
            }
        }
    }

    fn push_pawn_capture<S: ConstSide>(&mut self, board: &Board, from: BoardSquare, to: BoardSquare) {
        // the capture may not leave a diagonal pin ray
        if from.to_mask() & self.ordinal_pins != 0 && to.to_mask() & self.ordinal_pins == 0 {
            return;
        }

        let captured = board.enemy_piece_at::<S>(to);
        let promotion_rank = if S::IS_ENGINE { RANK_7 } else { RANK_0 };
        if to.to_mask() & promotion_rank != 0 {
            self.push_promotions::<S>(from, to, captured);
        } else {
            self.generated.push(Move {
                kind: MoveKind::Normal,
                from,
                to,
                moving: S::PAWN,
                captured,
            });
        }
    }

    fn push_promotions<S: ConstSide>(
        &mut self,
        from: BoardSquare,
        to: BoardSquare,
        captured: Option<PieceKind>,
    ) {
        for kind in MoveKind::PROMOTIONS {
            self.generated.push(Move {
                kind,
                from,
                to,
                moving: S::PAWN,
                captured,
            });
        }
    }

    ///
    /// The capturing and the captured pawn both leave their shared rank when
    /// an en-passant capture is played, so a rook or queen on that rank can
    /// deliver a discovered check the ordinary pin scan never sees. Rook-scan
    /// sideways from the capturing pawn with the victim removed; finding the
    /// friendly king on one side and an enemy straight slider on the other
    /// kills the move.
    ///
    fn try_en_passant<S: ConstSide>(&mut self, board: &Board, from: BoardSquare, to: BoardSquare) {
        if from.to_mask() & self.ordinal_pins != 0 && to.to_mask() & self.ordinal_pins == 0 {
            return;
        }

        let pieces = &board.position.pieces;
        let occupancy = board.occupied_squares & !board.position.en_passant_capture;

        let capture_rank = if S::IS_ENGINE { RANK_4 } else { RANK_3 };
        let mut rank_hits = self.tables.cardinal_attacks(from, occupancy) & capture_rank;
        rank_hits &= pieces[S::KING as usize]
            | pieces[S::Opponent::QUEEN as usize]
            | pieces[S::Opponent::ROOK as usize];

        if rank_hits.count_ones() == 2 {
            return;
        }

        self.generated.push(Move {
            kind: MoveKind::EnPassant,
            from,
            to,
            moving: S::PAWN,
            captured: Some(S::Opponent::PAWN),
        });
    }
}
