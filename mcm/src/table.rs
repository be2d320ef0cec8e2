//! Sparse character tables keyed by character index.

use hashbrown::HashMap;

use crate::{CHAR_NUM, Char, char_num_for};

/// Characters by index. Indices don't need to be contiguous; missing ones
/// are handled by the encoder's fill policy. Any index >= 256 makes the table
/// extended (512 characters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharTable {
    chars: HashMap<usize, Char>,
}

impl CharTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a character, returning the one previously at `index`
    pub fn insert(&mut self, index: usize, c: Char) -> Option<Char> {
        self.chars.insert(index, c)
    }

    pub fn get(&self, index: usize) -> Option<&Char> {
        self.chars.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.chars.contains_key(&index)
    }

    pub fn remove(&mut self, index: usize) -> Option<Char> {
        self.chars.remove(&index)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Characters in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Char)> {
        self.chars.iter().map(|(k, v)| (*k, v))
    }

    /// Indices in ascending order
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.chars.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn max_index(&self) -> Option<usize> {
        self.chars.keys().copied().max()
    }

    /// True if any character lives in the second page
    pub fn is_extended(&self) -> bool {
        self.chars.keys().any(|&k| k >= CHAR_NUM)
    }

    /// Number of characters needed to hold this table: 256, or 512 when
    /// extended.
    pub fn char_num(&self) -> usize {
        char_num_for(self.max_index().unwrap_or(0))
    }

    /// Dense list of `char_num()` characters, filling gaps with
    /// [`Char::blank`]. Indices beyond 511 are dropped.
    pub fn to_filled_vec(&self) -> Vec<Char> {
        (0..self.char_num())
            .map(|ii| self.get(ii).cloned().unwrap_or_else(Char::blank))
            .collect()
    }
}

impl FromIterator<(usize, Char)> for CharTable {
    fn from_iter<I: IntoIterator<Item = (usize, Char)>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}

impl Extend<(usize, Char)> for CharTable {
    fn extend<I: IntoIterator<Item = (usize, Char)>>(&mut self, iter: I) {
        self.chars.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EXTENDED_CHAR_NUM;

    #[test]
    fn test_char_num() {
        let mut table = CharTable::new();
        assert_eq!(table.char_num(), CHAR_NUM);
        table.insert(255, Char::blank());
        assert!(!table.is_extended());
        assert_eq!(table.char_num(), CHAR_NUM);
        table.insert(256, Char::blank());
        assert!(table.is_extended());
        assert_eq!(table.char_num(), EXTENDED_CHAR_NUM);
    }

    #[test]
    fn test_indices_sorted() {
        let table: CharTable = [(9, Char::blank()), (2, Char::blank()), (300, Char::blank())]
            .into_iter()
            .collect();
        assert_eq!(table.indices(), vec![2, 9, 300]);
        assert_eq!(table.max_index(), Some(300));
    }

    #[test]
    fn test_filled_vec() {
        let mut table = CharTable::new();
        table.insert(3, Char::constant(0));
        let chars = table.to_filled_vec();
        assert_eq!(chars.len(), CHAR_NUM);
        assert_eq!(chars[3], Char::constant(0));
        assert_eq!(chars[4], Char::blank());
    }
}
