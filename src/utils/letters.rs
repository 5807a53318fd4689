use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Upwords tile counts. The full set is 100 tiles.
pub static TILE_COUNTS: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    let mut map = HashMap::new();

    for (ch, count) in [
        ('A', 7),
        ('B', 3),
        ('C', 4),
        ('D', 5),
        ('E', 8),
        ('F', 3),
        ('G', 3),
        ('H', 3),
        ('I', 7),
        ('J', 1),
        ('K', 2),
        ('L', 5),
        ('M', 5),
        ('N', 5),
        ('O', 7),
        ('P', 3),
        ('Q', 1),
        ('R', 5),
        ('S', 6),
        ('T', 5),
        ('U', 5),
        ('V', 1),
        ('W', 2),
        ('X', 1),
        ('Y', 2),
        ('Z', 1),
    ] {
        map.insert(ch, count);
    }

    map
});

/// Normalize a letter to its uppercase tile form.
/// Returns `None` for anything that is not an ASCII letter.
pub fn normalize_letter(letter: char) -> Option<char> {
    letter
        .is_ascii_alphabetic()
        .then(|| letter.to_ascii_uppercase())
}

/// Number of copies of a letter in a full tile set
pub fn tile_count(letter: char) -> u8 {
    normalize_letter(letter)
        .and_then(|upper| TILE_COUNTS.get(&upper).copied())
        .unwrap_or(0)
}

/// Every tile of a full set, in alphabetical order
pub fn full_tile_set() -> Vec<char> {
    let mut letters: Vec<char> = TILE_COUNTS.keys().copied().collect();
    letters.sort_unstable();

    letters
        .into_iter()
        .flat_map(|ch| std::iter::repeat_n(ch, tile_count(ch) as usize))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_counts() {
        assert_eq!(tile_count('E'), 8);
        assert_eq!(tile_count('q'), 1);
        assert_eq!(tile_count('S'), 6);
        assert_eq!(tile_count('?'), 0);
    }

    #[test]
    fn test_full_tile_set_size() {
        let tiles = full_tile_set();
        assert_eq!(tiles.len(), 100);
        assert_eq!(tiles.first(), Some(&'A'));
        assert_eq!(tiles.last(), Some(&'Z'));
    }

    #[test]
    fn test_normalize_letter() {
        assert_eq!(normalize_letter('a'), Some('A'));
        assert_eq!(normalize_letter('Z'), Some('Z'));
        assert_eq!(normalize_letter('1'), None);
        assert_eq!(normalize_letter('é'), None);
    }
}
