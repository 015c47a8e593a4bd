#[cfg(test)]
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::tile::{Symbol, Tile, Visibility};

/// Tile count of a standard game (a 4×4 grid).
pub const DEFAULT_TILE_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("the number of tiles must be even, got {0}")]
    OddTileCount(usize),
    #[error("{requested} pairs requested but the palette only has {available} symbols")]
    PaletteExhausted { requested: usize, available: usize },
    #[cfg(test)]
    #[error("symbol {symbol:?} appears {count} time(s); every symbol must appear exactly twice")]
    Unbalanced { symbol: Symbol, count: usize },
}

/// Why a flip request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    OutOfRange,
    AlreadyRevealed,
    AlreadyMatched,
    /// Two tiles are already face up and waiting to be resolved.
    PairPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
}

/// The two tiles that were face up when a comparison happened, and what
/// should become of them once the reveal delay is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairResolution {
    pub pair: [usize; 2],
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Ignored(Ignored),
    /// First tile of a pair turned face up.
    FirstReveal,
    /// Second tile turned face up; the pair is due to be resolved.
    Compared(PairResolution),
}

/// Number of pairs a board of `tile_count` tiles needs, if the palette can
/// supply them.
pub fn pair_count(tile_count: usize) -> Result<usize, BoardError> {
    if tile_count % 2 != 0 {
        return Err(BoardError::OddTileCount(tile_count));
    }

    let pairs = tile_count / 2;
    if pairs > Symbol::PALETTE.len() {
        return Err(BoardError::PaletteExhausted {
            requested: pairs,
            available: Symbol::PALETTE.len(),
        });
    }
    Ok(pairs)
}

/// The tiles of one game, in grid order (row-major).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: Vec<Tile>,
}

impl Board {
    // -------------------------------------------------------------------------
    // Construction / Dealing
    // -------------------------------------------------------------------------

    /// Deal a board from a specific seed (useful for reproducible games).
    pub fn deal_seeded(tile_count: usize, seed: u64) -> Result<Self, BoardError> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        Self::deal_with(tile_count, &mut rng)
    }

    /// Take the first `tile_count / 2` palette symbols, double them and
    /// shuffle the result.
    pub fn deal_with<R: Rng + ?Sized>(tile_count: usize, rng: &mut R) -> Result<Self, BoardError> {
        let pairs = pair_count(tile_count)?;
        let used = &Symbol::PALETTE[..pairs];
        let mut symbols: Vec<Symbol> = used.iter().chain(used.iter()).copied().collect();
        symbols.shuffle(rng);

        Ok(Board {
            tiles: symbols.into_iter().map(Tile::hidden).collect(),
        })
    }

    /// Lay out a board in exactly the given order (for testing).
    #[cfg(test)]
    pub fn from_symbols(symbols: Vec<Symbol>) -> Result<Self, BoardError> {
        if symbols.len() % 2 != 0 {
            return Err(BoardError::OddTileCount(symbols.len()));
        }

        let mut counts: HashMap<Symbol, usize> = HashMap::new();
        for &s in &symbols {
            *counts.entry(s).or_default() += 1;
        }
        if let Some((&symbol, &count)) = counts.iter().find(|&(_, &c)| c != 2) {
            return Err(BoardError::Unbalanced { symbol, count });
        }

        Ok(Board {
            tiles: symbols.into_iter().map(Tile::hidden).collect(),
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Indices of the tiles currently face up and unresolved.
    pub fn revealed(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_revealed())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn matched_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_matched()).count()
    }

    /// Every tile has been matched.
    pub fn is_complete(&self) -> bool {
        self.tiles.iter().all(Tile::is_matched)
    }

    // -------------------------------------------------------------------------
    // Flipping
    // -------------------------------------------------------------------------

    /// Turn tile `index` face up if the rules allow it.
    ///
    /// On the second tile of a pair the returned resolution captures both
    /// indices as they are now; it is applied later with [`Board::resolve`].
    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        let Some(tile) = self.tiles.get(index) else {
            return FlipOutcome::Ignored(Ignored::OutOfRange);
        };

        match tile.visibility {
            Visibility::Matched => return FlipOutcome::Ignored(Ignored::AlreadyMatched),
            Visibility::Revealed => return FlipOutcome::Ignored(Ignored::AlreadyRevealed),
            Visibility::Hidden => {}
        }

        let revealed = self.revealed();
        let outcome = match revealed.as_slice() {
            [] => FlipOutcome::FirstReveal,
            [first] => {
                let verdict = if self.tiles[*first].symbol == self.tiles[index].symbol {
                    Verdict::Match
                } else {
                    Verdict::Mismatch
                };
                FlipOutcome::Compared(PairResolution {
                    pair: [*first, index],
                    verdict,
                })
            }
            _ => return FlipOutcome::Ignored(Ignored::PairPending),
        };

        self.tiles[index].visibility = Visibility::Revealed;
        outcome
    }

    /// Settle a compared pair: both become matched, or both go face down.
    /// Only tiles that are still face up are touched.  Returns how many
    /// tiles changed.
    pub fn resolve(&mut self, resolution: PairResolution) -> usize {
        let target = match resolution.verdict {
            Verdict::Match => Visibility::Matched,
            Verdict::Mismatch => Visibility::Hidden,
        };

        let mut changed = 0;
        for index in resolution.pair {
            if let Some(tile) = self.tiles.get_mut(index) {
                if tile.is_revealed() {
                    tile.visibility = target;
                    changed += 1;
                }
            }
        }
        changed
    }
}
