use strum::{EnumCount, IntoEnumIterator};

use crate::game::pieces::{ConstEngine, ConstPlayer, ConstSide, EngineColor, PieceKind, Side};
use crate::game::square::{BoardSquare, BoardSquareExt};
use crate::utils::bitboard::{Bitboard, BitboardExt, RANK_3, RANK_4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    QueenPromotion,
    KnightPromotion,
    BishopPromotion,
    RookPromotion,
    EnPassant,
    Normal,
}

impl MoveKind {
    pub const PROMOTIONS: [MoveKind; 4] = [
        MoveKind::QueenPromotion,
        MoveKind::KnightPromotion,
        MoveKind::BishopPromotion,
        MoveKind::RookPromotion,
    ];

    pub fn is_promotion(self) -> bool {
        matches!(
            self,
            MoveKind::QueenPromotion
                | MoveKind::KnightPromotion
                | MoveKind::BishopPromotion
                | MoveKind::RookPromotion
        )
    }

    /// The piece a pawn of the given side turns into.
    pub fn promoted<S: ConstSide>(self) -> PieceKind {
        match self {
            MoveKind::QueenPromotion => S::QUEEN,
            MoveKind::KnightPromotion => S::KNIGHT,
            MoveKind::BishopPromotion => S::BISHOP,
            MoveKind::RookPromotion => S::ROOK,
            _ => unreachable!("not a promotion"),
        }
    }
}

///
/// Castling is encoded as a normal king move across two files; the rook leg
/// is inferred when the move is applied.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub from: BoardSquare,
    pub to: BoardSquare,
    pub moving: PieceKind,
    pub captured: Option<PieceKind>,
}

///
/// The full game state a move cannot be replayed without: the twelve piece
/// bitboards, the remaining castling rights and the en-passant marker (the
/// square of a pawn that just advanced two squares, zero otherwise).
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub pieces: [Bitboard; PieceKind::COUNT],

    pub player_castle_kingside: bool,
    pub player_castle_queenside: bool,
    pub engine_castle_kingside: bool,
    pub engine_castle_queenside: bool,

    pub en_passant_capture: Bitboard,
}

impl Position {
    pub fn can_castle_kingside(&self, side: Side) -> bool {
        match side {
            Side::Player => self.player_castle_kingside,
            Side::Engine => self.engine_castle_kingside,
        }
    }

    pub fn can_castle_queenside(&self, side: Side) -> bool {
        match side {
            Side::Player => self.player_castle_queenside,
            Side::Engine => self.engine_castle_queenside,
        }
    }

    fn clear_kingside(&mut self, side: Side) {
        match side {
            Side::Player => self.player_castle_kingside = false,
            Side::Engine => self.engine_castle_kingside = false,
        }
    }

    fn clear_queenside(&mut self, side: Side) {
        match side {
            Side::Player => self.player_castle_queenside = false,
            Side::Engine => self.engine_castle_queenside = false,
        }
    }
}

/// Saved state for copy-restore undo. Restoring recomputes the derived masks,
/// so a round trip reproduces the board bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    position: Position,
    engine_to_move: bool,
}

///
/// One castling direction for one side: the rook's home corner, the king's
/// transit path (its own square through the destination, inclusive), and
/// where king and rook end up. `extra` is the square the rook crosses but the
/// king does not; it exists on the queenside only and must be empty but not
/// necessarily safe.
///
#[derive(Debug, Clone, Copy)]
pub struct CastleLane {
    pub rook_home: Bitboard,
    pub path: Bitboard,
    pub destination: Bitboard,
    pub rook_landing: Bitboard,
    pub extra: Bitboard,
}

#[derive(Debug, Clone, Copy)]
pub struct CastlingGeometry {
    pub engine_kingside: CastleLane,
    pub engine_queenside: CastleLane,
    pub player_kingside: CastleLane,
    pub player_queenside: CastleLane,
}

impl CastlingGeometry {
    pub fn new(color: EngineColor) -> CastlingGeometry {
        CastlingGeometry {
            engine_kingside: CastleLane::kingside(0, color.king_col()),
            engine_queenside: CastleLane::queenside(0, color.king_col()),
            player_kingside: CastleLane::kingside(7, color.king_col()),
            player_queenside: CastleLane::queenside(7, color.king_col()),
        }
    }

    pub fn kingside(&self, side: Side) -> &CastleLane {
        match side {
            Side::Player => &self.player_kingside,
            Side::Engine => &self.engine_kingside,
        }
    }

    pub fn queenside(&self, side: Side) -> &CastleLane {
        match side {
            Side::Player => &self.player_queenside,
            Side::Engine => &self.engine_queenside,
        }
    }
}

impl CastleLane {
    /// The kingside is the corner with two squares between king and rook.
    fn kingside(row: u8, king_col: u8) -> CastleLane {
        let corner_col: i32 = if king_col == 3 { 0 } else { 7 };
        CastleLane::build(row, king_col as i32, corner_col, false)
    }

    fn queenside(row: u8, king_col: u8) -> CastleLane {
        let corner_col: i32 = if king_col == 3 { 7 } else { 0 };
        CastleLane::build(row, king_col as i32, corner_col, true)
    }

    fn build(row: u8, king_col: i32, corner_col: i32, has_extra: bool) -> CastleLane {
        let step = if corner_col < king_col { -1 } else { 1 };
        let square_at = |col: i32| BoardSquare::from_coords(row, col as u8).to_mask();

        CastleLane {
            rook_home: square_at(corner_col),
            path: square_at(king_col) | square_at(king_col + step) | square_at(king_col + 2 * step),
            destination: square_at(king_col + 2 * step),
            rook_landing: square_at(king_col + step),
            extra: if has_extra {
                square_at(king_col + 3 * step)
            } else {
                0
            },
        }
    }
}

///
/// The position store: a [`Position`] plus whose turn it is, the castling
/// geometry for the configured engine color, and occupancy masks derived
/// from the piece bitboards after every change.
///
#[derive(Debug, Clone)]
pub struct Board {
    pub position: Position,
    pub engine_to_move: bool,
    pub engine_color: EngineColor,
    pub castling: CastlingGeometry,

    pub engine_pieces: Bitboard,
    pub player_pieces: Bitboard,
    pub occupied_squares: Bitboard,
    pub empty_squares: Bitboard,
    /// Squares an engine piece may move to.
    pub player_or_empty: Bitboard,
    /// Squares a player piece may move to.
    pub engine_or_empty: Bitboard,
}

impl Board {
    /// The standard starting arrangement. The engine owns rows 0-1; whoever
    /// plays White moves first.
    pub fn new(color: EngineColor) -> Board {
        let mut board = Board::empty(color);

        let king_col = color.king_col();
        let queen_col = 7 - king_col;

        for col in 0..8u8 {
            let role = match col {
                0 | 7 => 3,                       // rook offset within a side's kinds
                1 | 6 => 1,                       // knight
                2 | 5 => 2,                       // bishop
                c if c == king_col => 5,          // king
                c if c == queen_col => 4,         // queen
                _ => unreachable!(),
            };

            board.position.pieces[PieceKind::EnginePawn as usize] |=
                BoardSquare::from_coords(1, col).to_mask();
            board.position.pieces[PieceKind::PlayerPawn as usize] |=
                BoardSquare::from_coords(6, col).to_mask();

            board.position.pieces[PieceKind::EnginePawn as usize + role] |=
                BoardSquare::from_coords(0, col).to_mask();
            board.position.pieces[PieceKind::PlayerPawn as usize + role] |=
                BoardSquare::from_coords(7, col).to_mask();
        }

        board.position.player_castle_kingside = true;
        board.position.player_castle_queenside = true;
        board.position.engine_castle_kingside = true;
        board.position.engine_castle_queenside = true;

        board.update();
        board
    }

    /// A bare board for building fixture positions; no pieces, no castling
    /// rights. Place the kings before generating moves.
    pub fn empty(color: EngineColor) -> Board {
        Board {
            position: Position {
                pieces: [0; PieceKind::COUNT],
                player_castle_kingside: false,
                player_castle_queenside: false,
                engine_castle_kingside: false,
                engine_castle_queenside: false,
                en_passant_capture: 0,
            },
            engine_to_move: color == EngineColor::White,
            engine_color: color,
            castling: CastlingGeometry::new(color),
            engine_pieces: 0,
            player_pieces: 0,
            occupied_squares: 0,
            empty_squares: !0,
            player_or_empty: !0,
            engine_or_empty: !0,
        }
    }

    pub fn place(&mut self, square: BoardSquare, kind: PieceKind) {
        self.position.pieces[kind as usize] |= square.to_mask();
        self.update();
    }

    pub fn set_castling_rights(&mut self, side: Side, kingside: bool, queenside: bool) {
        match side {
            Side::Player => {
                self.position.player_castle_kingside = kingside;
                self.position.player_castle_queenside = queenside;
            }
            Side::Engine => {
                self.position.engine_castle_kingside = kingside;
                self.position.engine_castle_queenside = queenside;
            }
        }
    }

    pub fn set_engine_to_move(&mut self, engine_to_move: bool) {
        self.engine_to_move = engine_to_move;
    }

    /// Linear scan over the piece boards; host and test convenience, not part
    /// of the generation hot path.
    pub fn piece_at(&self, square: BoardSquare) -> Option<PieceKind> {
        let mask = square.to_mask();
        if self.empty_squares & mask != 0 {
            return None;
        }
        for kind in PieceKind::iter() {
            if self.position.pieces[kind as usize] & mask != 0 {
                return Some(kind);
            }
        }
        unreachable!("occupancy mask out of sync with the piece boards");
    }

    /// What `S`'s move onto `square` would capture. Only consults the
    /// opponent's six boards.
    pub fn enemy_piece_at<S: ConstSide>(&self, square: BoardSquare) -> Option<PieceKind> {
        let mask = square.to_mask();
        let enemy = if S::IS_ENGINE {
            self.player_pieces
        } else {
            self.engine_pieces
        };
        if enemy & mask == 0 {
            return None;
        }
        for kind in S::Opponent::PIECES {
            if self.position.pieces[kind as usize] & mask != 0 {
                return Some(kind);
            }
        }
        unreachable!("side occupancy out of sync with the piece boards");
    }

    pub fn king_square<S: ConstSide>(&self) -> BoardSquare {
        self.position.pieces[S::KING as usize].next_index()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position,
            engine_to_move: self.engine_to_move,
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.position = snapshot.position;
        self.engine_to_move = snapshot.engine_to_move;
        self.update();
    }

    /// Refresh the derived occupancy masks from the piece boards.
    pub fn update(&mut self) {
        let pieces = &self.position.pieces;
        self.player_pieces = pieces[..6].iter().fold(0, |acc, board| acc | board);
        self.engine_pieces = pieces[6..].iter().fold(0, |acc, board| acc | board);

        self.occupied_squares = self.engine_pieces | self.player_pieces;
        self.empty_squares = !self.occupied_squares;
        self.player_or_empty = self.player_pieces | self.empty_squares;
        self.engine_or_empty = self.engine_pieces | self.empty_squares;
    }

    pub fn apply_move(&mut self, board_move: &Move, is_engine: bool) {
        if is_engine {
            self.apply_move_for::<ConstEngine>(board_move)
        } else {
            self.apply_move_for::<ConstPlayer>(board_move)
        }
    }

    ///
    /// Play a move for side `S`. The move is trusted to come from the
    /// generator; nothing is validated here.
    ///
    pub fn apply_move_for<S: ConstSide>(&mut self, board_move: &Move) {
        let en_passant = self.position.en_passant_capture;
        self.position.en_passant_capture = 0;

        let square_from = board_move.from.to_mask();
        let square_to = board_move.to.to_mask();

        // lift the piece off its origin square
        self.position.pieces[board_move.moving as usize] ^= square_from;

        if board_move.kind.is_promotion() {
            // the pawn is gone; the promoted piece appears instead
            self.position.pieces[board_move.kind.promoted::<S>() as usize] |= square_to;
        } else {
            self.position.pieces[board_move.moving as usize] |= square_to;
        }

        if let Some(captured) = board_move.captured {
            // an en-passant victim does not sit on the destination square
            let capture_mask = if board_move.kind == MoveKind::EnPassant {
                en_passant
            } else {
                square_to
            };
            self.position.pieces[captured as usize] ^= capture_mask;

            // taking a rook on its home corner ends castling that way
            if captured == S::Opponent::ROOK {
                if square_to & self.castling.kingside(S::Opponent::SIDE).rook_home != 0 {
                    self.position.clear_kingside(S::Opponent::SIDE);
                }
                if square_to & self.castling.queenside(S::Opponent::SIDE).rook_home != 0 {
                    self.position.clear_queenside(S::Opponent::SIDE);
                }
            }
        }

        if board_move.moving == S::KING {
            // a king moving two files is a castle; bring the rook across
            if (board_move.from.col() as i32 - board_move.to.col() as i32).abs() > 1 {
                let lane = if square_to == self.castling.kingside(S::SIDE).destination {
                    *self.castling.kingside(S::SIDE)
                } else {
                    *self.castling.queenside(S::SIDE)
                };
                self.position.pieces[S::ROOK as usize] ^= lane.rook_home;
                self.position.pieces[S::ROOK as usize] |= lane.rook_landing;
            }
            self.position.clear_kingside(S::SIDE);
            self.position.clear_queenside(S::SIDE);
        } else if board_move.moving == S::ROOK {
            if square_from & self.castling.kingside(S::SIDE).rook_home != 0 {
                self.position.clear_kingside(S::SIDE);
            }
            if square_from & self.castling.queenside(S::SIDE).rook_home != 0 {
                self.position.clear_queenside(S::SIDE);
            }
        } else if board_move.moving == S::PAWN {
            // a double push next to an enemy pawn can be captured en passant
            if (board_move.to as i32 - board_move.from as i32).abs() == 16 {
                let adjacent = (square_to << 1) | (square_to >> 1);
                let rank = if S::IS_ENGINE { RANK_3 } else { RANK_4 };
                if adjacent & rank & self.position.pieces[S::Opponent::PAWN as usize] != 0 {
                    self.position.en_passant_capture = square_to;
                }
            }
        }

        self.update();
        self.engine_to_move = !self.engine_to_move;

        self.debug_check_coherence();
    }

    fn debug_check_coherence(&self) {
        debug_assert_eq!(
            self.position
                .pieces
                .iter()
                .map(|board| board.count_ones())
                .sum::<u32>(),
            self.occupied_squares.count_ones(),
            "piece boards overlap"
        );
        debug_assert!(
            self.position.en_passant_capture.count_ones() <= 1,
            "more than one en-passant square"
        );
    }

    /// ASCII rendering with the engine's pieces uppercase, row 0 on top.
    pub fn render(&self) -> String {
        let mut rendered = String::new();
        for row in 0..8 {
            for col in 0..8 {
                let square = BoardSquare::from_coords(row, col);
                let glyph = match self.piece_at(square) {
                    Some(kind) if kind.side() == Side::Engine => {
                        kind.to_char().to_ascii_uppercase()
                    }
                    Some(kind) => kind.to_char(),
                    None => '.',
                };
                rendered.push(glyph);
                rendered.push(' ');
            }
            rendered.push('\n');
        }
        rendered
    }
}
