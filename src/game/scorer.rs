use super::rules::GameRules;
use super::validator::AcceptedMove;

/// Breakdown of a move's score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    /// Sum of the resulting stack height under every placed tile
    pub base: i32,
    /// Bonus for words formed beyond the primary one
    pub word_bonus: i32,
    /// Bonus for playing a full rack
    pub all_tiles_bonus: i32,
}

impl ScoreResult {
    pub fn total(&self) -> i32 {
        self.base + self.word_bonus + self.all_tiles_bonus
    }
}

pub struct Scorer;

impl Scorer {
    /// Score an accepted move.
    ///
    /// Scoring rules:
    /// - Each placed tile is worth the height of its stack after placement,
    ///   so covering existing letters pays more than building on the floor
    /// - Every word formed or changed besides the primary word adds a flat bonus
    /// - Emptying a full rack in one move adds the all-tiles bonus
    pub fn calculate_score_with_bonuses(accepted: &AcceptedMove, rules: &GameRules) -> ScoreResult {
        let base = accepted.tiles.iter().map(|tile| tile.height as i32).sum();
        let extra_words = accepted.words.len().saturating_sub(1) as i32;

        ScoreResult {
            base,
            word_bonus: extra_words * rules.perpendicular_word_bonus,
            all_tiles_bonus: if accepted.uses_full_rack {
                rules.all_tiles_bonus
            } else {
                0
            },
        }
    }

    /// Calculate just the total
    pub fn calculate_score(accepted: &AcceptedMove, rules: &GameRules) -> i32 {
        Self::calculate_score_with_bonuses(accepted, rules).total()
    }
}
