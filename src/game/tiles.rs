use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::utils::letters::full_tile_set;

/// Shuffled draw pile for a session's racks
#[derive(Debug, Clone)]
pub struct TileBag {
    tiles: Vec<char>,
}

impl TileBag {
    /// Full Upwords tile set shuffled with a fixed seed, so a session can be
    /// rebuilt exactly from its seed
    pub fn shuffled(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tiles = full_tile_set();
        tiles.shuffle(&mut rng);

        Self { tiles }
    }

    /// Bag with a known draw order (last element is drawn first)
    pub fn from_tiles(tiles: Vec<char>) -> Self {
        Self { tiles }
    }

    /// Draw up to `count` tiles; fewer when the bag runs out
    pub fn draw(&mut self, count: usize) -> Vec<char> {
        let keep = self.tiles.len().saturating_sub(count);
        let mut drawn = self.tiles.split_off(keep);
        drawn.reverse();
        drawn
    }

    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Remove `letters` from `rack`, one copy each.
/// Returns the first letter the rack cannot cover; the rack is untouched in that case.
pub fn take_from_rack(rack: &mut Vec<char>, letters: &[char]) -> Result<(), char> {
    let mut remaining = rack.clone();
    for &letter in letters {
        match remaining.iter().position(|&held| held == letter) {
            Some(index) => {
                remaining.swap_remove(index);
            }
            None => return Err(letter),
        }
    }

    *rack = remaining;
    Ok(())
}
