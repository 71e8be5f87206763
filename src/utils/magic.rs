//! Sliding-piece attack tables using fixed-shift magic bitboards.
//!
//! For every square and ray family we keep a blocker mask (the squares along
//! the rays, ray endpoints excluded, since the last square of a ray can never
//! block anything) and a magic multiplier such that
//! `(occupancy & mask) * magic >> shift` perfectly hashes every blocker
//! arrangement into a per-square slice of a flat attack table. Cardinal
//! (rook-like) tables use a 12 bit hash, ordinal (bishop-like) tables 9 bits.
//!
//! Everything here is slow setup code; it runs once and the resulting tables
//! are immutable afterwards.

use std::fmt;
use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;

use crate::game::square::{BoardSquare, BoardSquareExt};
use crate::utils::bitboard::{Bitboard, OUTER_SQUARES};

pub const CARDINAL_SHIFT: u32 = 52;
pub const ORDINAL_SHIFT: u32 = 55;

/// Tries per square and family before the search is declared failed. In
/// practice a magic is found within a few thousand candidates.
const SEARCH_BUDGET: u32 = 1_000_000;

/// Seed for the process-wide shared tables, so every run builds the same
/// numbers.
const DEFAULT_SEED: u64 = 0x5eed_1e55_c0ff_ee00;

const CARDINAL_DELTAS: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
const ORDINAL_DELTAS: [(i32, i32); 4] = [(-1, 1), (1, 1), (1, -1), (-1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayFamily {
    Cardinal,
    Ordinal,
}

impl RayFamily {
    pub fn shift(self) -> u32 {
        match self {
            RayFamily::Cardinal => CARDINAL_SHIFT,
            RayFamily::Ordinal => ORDINAL_SHIFT,
        }
    }

    /// Upper bound on distinct hashes for this family.
    pub fn table_stride(self) -> usize {
        1 << (64 - self.shift())
    }
}

impl fmt::Display for RayFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RayFamily::Cardinal => write!(f, "cardinal"),
            RayFamily::Ordinal => write!(f, "ordinal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MagicError {
    #[error("{family} magic search exhausted its try budget on square {square}")]
    SearchExhausted { square: BoardSquare, family: RayFamily },

    #[error("{family} magic for square {square} hashes two occupancies with different attacks to one slot")]
    Collision { square: BoardSquare, family: RayFamily },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSquare {
    pub blockers: Bitboard,
    pub magic: u64,
}

pub struct SlidingTables {
    cardinals: [MagicSquare; 64],
    ordinals: [MagicSquare; 64],
    cardinal_table: Vec<Bitboard>,
    ordinal_table: Vec<Bitboard>,
}

static SHARED: OnceLock<SlidingTables> = OnceLock::new();

impl SlidingTables {
    /// Search magic numbers for every square with a caller-provided seed.
    pub fn generate(seed: u64) -> Result<SlidingTables, MagicError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut tables = SlidingTables::unfilled();

        for square in 0..64u8 {
            for family in [RayFamily::Cardinal, RayFamily::Ordinal] {
                let mask = blocker_mask(square, family);
                let (subsets, attacks) = enumerate_occupancies(square, family, mask);

                let region = tables.region_mut(square, family);
                let mut found = None;

                for _ in 0..SEARCH_BUDGET {
                    // three ANDed randoms give a sparse candidate, which is
                    // far more likely to hash without collisions
                    let magic = rng.next_u64() & rng.next_u64() & rng.next_u64();
                    if fill_region(region, &subsets, &attacks, magic, family.shift()) {
                        found = Some(magic);
                        break;
                    }
                }

                let magic = found.ok_or(MagicError::SearchExhausted { square, family })?;
                tables.set_magic(square, family, MagicSquare { blockers: mask, magic });
            }
        }

        Ok(tables)
    }

    /// Build tables from known-good magic numbers, skipping the search. Every
    /// blocker arrangement is still verified, so a wrong number is rejected
    /// rather than producing corrupt move generation.
    pub fn with_magics(
        cardinal_magics: &[u64; 64],
        ordinal_magics: &[u64; 64],
    ) -> Result<SlidingTables, MagicError> {
        let mut tables = SlidingTables::unfilled();

        for square in 0..64u8 {
            for (family, magic) in [
                (RayFamily::Cardinal, cardinal_magics[square as usize]),
                (RayFamily::Ordinal, ordinal_magics[square as usize]),
            ] {
                let mask = blocker_mask(square, family);
                let (subsets, attacks) = enumerate_occupancies(square, family, mask);

                let region = tables.region_mut(square, family);
                if !fill_region(region, &subsets, &attacks, magic, family.shift()) {
                    return Err(MagicError::Collision { square, family });
                }
                tables.set_magic(square, family, MagicSquare { blockers: mask, magic });
            }
        }

        Ok(tables)
    }

    /// The process-wide tables, built on first use from a fixed seed.
    /// Table construction failing is unrecoverable, so this aborts with the
    /// failing square and family rather than returning an error.
    pub fn shared() -> &'static SlidingTables {
        SHARED.get_or_init(|| {
            SlidingTables::generate(DEFAULT_SEED)
                .unwrap_or_else(|error| panic!("sliding attack tables: {}", error))
        })
    }

    /// The magic numbers of this table set, for re-injection via
    /// [`SlidingTables::with_magics`].
    pub fn magics(&self) -> ([u64; 64], [u64; 64]) {
        let mut cardinals = [0; 64];
        let mut ordinals = [0; 64];
        for square in 0..64 {
            cardinals[square] = self.cardinals[square].magic;
            ordinals[square] = self.ordinals[square].magic;
        }
        (cardinals, ordinals)
    }

    #[inline]
    pub fn cardinal_attacks(&self, square: BoardSquare, occupied: Bitboard) -> Bitboard {
        let magic = &self.cardinals[square as usize];
        let hash = (occupied & magic.blockers).wrapping_mul(magic.magic) >> CARDINAL_SHIFT;
        self.cardinal_table[((square as usize) << 12) + hash as usize]
    }

    #[inline]
    pub fn ordinal_attacks(&self, square: BoardSquare, occupied: Bitboard) -> Bitboard {
        let magic = &self.ordinals[square as usize];
        let hash = (occupied & magic.blockers).wrapping_mul(magic.magic) >> ORDINAL_SHIFT;
        self.ordinal_table[((square as usize) << 9) + hash as usize]
    }

    fn unfilled() -> SlidingTables {
        SlidingTables {
            cardinals: [MagicSquare::default(); 64],
            ordinals: [MagicSquare::default(); 64],
            cardinal_table: vec![0; 64 * RayFamily::Cardinal.table_stride()],
            ordinal_table: vec![0; 64 * RayFamily::Ordinal.table_stride()],
        }
    }

    fn region_mut(&mut self, square: BoardSquare, family: RayFamily) -> &mut [Bitboard] {
        let stride = family.table_stride();
        let start = square as usize * stride;
        match family {
            RayFamily::Cardinal => &mut self.cardinal_table[start..start + stride],
            RayFamily::Ordinal => &mut self.ordinal_table[start..start + stride],
        }
    }

    fn set_magic(&mut self, square: BoardSquare, family: RayFamily, magic: MagicSquare) {
        match family {
            RayFamily::Cardinal => self.cardinals[square as usize] = magic,
            RayFamily::Ordinal => self.ordinals[square as usize] = magic,
        }
    }
}

/// Walk the rays square by square. With `include_blockers` the first blocker
/// on each ray is part of the result (it can be captured); without it the
/// result stops short, which is what the blocker masks are made of.
fn ray_attacks(
    from: BoardSquare,
    deltas: &[(i32, i32); 4],
    blockers: Bitboard,
    include_blockers: bool,
) -> Bitboard {
    let mut attacks = 0;

    for &(row_step, col_step) in deltas {
        let mut row = from.row() as i32 + row_step;
        let mut col = from.col() as i32 + col_step;

        while (0..8).contains(&row) && (0..8).contains(&col) {
            let mask = ((row * 8 + col) as u8).to_mask();
            if mask & blockers != 0 {
                if include_blockers {
                    attacks |= mask;
                }
                break;
            }
            attacks |= mask;
            row += row_step;
            col += col_step;
        }
    }

    attacks
}

pub(crate) fn cardinal_rays_slow(
    from: BoardSquare,
    blockers: Bitboard,
    include_blockers: bool,
) -> Bitboard {
    ray_attacks(from, &CARDINAL_DELTAS, blockers, include_blockers)
}

pub(crate) fn ordinal_rays_slow(
    from: BoardSquare,
    blockers: Bitboard,
    include_blockers: bool,
) -> Bitboard {
    ray_attacks(from, &ORDINAL_DELTAS, blockers, include_blockers)
}

fn blocker_mask(square: BoardSquare, family: RayFamily) -> Bitboard {
    match family {
        RayFamily::Cardinal => {
            // a rook can slide along the outer edge, so its ray endpoints
            // have to be worked out per square rather than taken off the rim
            let row = square.row();
            let col = square.col();
            let endpoints = col.to_mask()
                | (row * 8 + 7).to_mask()
                | (56 + col).to_mask()
                | (square - col).to_mask();
            cardinal_rays_slow(square, endpoints, false)
        }
        RayFamily::Ordinal => ordinal_rays_slow(square, OUTER_SQUARES, false),
    }
}

/// Every subset of the blocker mask, paired with the attack set it produces.
fn enumerate_occupancies(
    square: BoardSquare,
    family: RayFamily,
    mask: Bitboard,
) -> (Vec<Bitboard>, Vec<Bitboard>) {
    let slow = match family {
        RayFamily::Cardinal => cardinal_rays_slow,
        RayFamily::Ordinal => ordinal_rays_slow,
    };

    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut attacks = Vec::with_capacity(subsets.capacity());

    let mut subset: Bitboard = 0;
    loop {
        subsets.push(subset);
        attacks.push(slow(square, subset, true));

        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }

    (subsets, attacks)
}

/// Hash every occupancy into the region with the candidate magic. Returns
/// false (leaving the region dirty) as soon as two occupancies with different
/// attack sets land in the same slot.
fn fill_region(
    region: &mut [Bitboard],
    subsets: &[Bitboard],
    attacks: &[Bitboard],
    magic: u64,
    shift: u32,
) -> bool {
    region.fill(0);

    for (&subset, &attack) in subsets.iter().zip(attacks) {
        let hash = (subset.wrapping_mul(magic) >> shift) as usize;
        // an attack set is never empty, so zero marks a free slot
        if region[hash] == 0 {
            region[hash] = attack;
        } else if region[hash] != attack {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_rays_on_empty_board() {
        // a rook in the corner always sees 14 squares
        assert_eq!(cardinal_rays_slow(0, 0, true).count_ones(), 14);
        assert_eq!(cardinal_rays_slow(63, 0, true).count_ones(), 14);
        // and so does one in the middle
        assert_eq!(cardinal_rays_slow(27, 0, true).count_ones(), 14);
    }

    #[test]
    fn rook_rays_stop_at_blockers() {
        // rook on square 0, blocker three squares down the file
        let blocker = 1u64 << 24;
        let attacks = cardinal_rays_slow(0, blocker, true);
        assert_eq!(attacks.count_ones(), 10);
        assert_ne!(attacks & blocker, 0);

        let without_capture = cardinal_rays_slow(0, blocker, false);
        assert_eq!(without_capture.count_ones(), 9);
        assert_eq!(without_capture & blocker, 0);
    }

    #[test]
    fn bishop_rays_from_center() {
        assert_eq!(ordinal_rays_slow(27, 0, true).count_ones(), 13);
        // corner bishop sees one diagonal
        assert_eq!(ordinal_rays_slow(0, 0, true).count_ones(), 7);
    }

    #[test]
    fn blocker_masks_exclude_endpoints() {
        // corner rook: 6 + 6 mask squares once both endpoints are dropped
        assert_eq!(blocker_mask(0, RayFamily::Cardinal).count_ones(), 12);
        // center bishop: 13 reachable squares, 4 of them on the rim
        assert_eq!(blocker_mask(27, RayFamily::Ordinal).count_ones(), 9);
    }

    #[test]
    fn generated_tables_match_slow_scan() {
        let tables = SlidingTables::generate(1).expect("search failed");

        let occupied = 0x0000_1200_0450_0081u64;
        for square in [0u8, 7, 27, 36, 63] {
            assert_eq!(
                tables.cardinal_attacks(square, occupied),
                cardinal_rays_slow(square, occupied, true),
                "cardinal mismatch on square {}",
                square
            );
            assert_eq!(
                tables.ordinal_attacks(square, occupied),
                ordinal_rays_slow(square, occupied, true),
                "ordinal mismatch on square {}",
                square
            );
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = SlidingTables::generate(7).expect("search failed");
        let second = SlidingTables::generate(7).expect("search failed");
        assert_eq!(first.magics(), second.magics());
    }

    #[test]
    fn known_magics_round_trip() {
        let generated = SlidingTables::generate(3).expect("search failed");
        let (cardinals, ordinals) = generated.magics();

        let injected = SlidingTables::with_magics(&cardinals, &ordinals)
            .expect("verified magics must rebuild");

        let occupied = 0x00F0_0000_0101_0000u64;
        assert_eq!(
            injected.cardinal_attacks(35, occupied),
            generated.cardinal_attacks(35, occupied)
        );
        assert_eq!(
            injected.ordinal_attacks(35, occupied),
            generated.ordinal_attacks(35, occupied)
        );
    }

    #[test]
    fn bad_magic_is_rejected() {
        let generated = SlidingTables::generate(5).expect("search failed");
        let (mut cardinals, ordinals) = generated.magics();
        // an all-ones multiplier smears every occupancy across the table
        cardinals[0] = !0;

        assert!(matches!(
            SlidingTables::with_magics(&cardinals, &ordinals),
            Err(MagicError::Collision {
                square: 0,
                family: RayFamily::Cardinal
            })
        ));
    }
}
