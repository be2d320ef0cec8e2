//! Font composition: primary characters, inherited characters and extra data
//! merged into the final table.

use max7456_mcm::{Char, CharTable};
use tracing::{debug, info};

use crate::extra_data::{ExtraDataError, ExtraDataSet};

/// A built font other fonts can inherit from
#[derive(Debug, Clone)]
pub struct NamedFont {
    pub name: String,
    pub chars: CharTable,
}

/// What to do with primary characters that match what a parent provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    Ignore,
    Report,
    Remove,
}

/// A primary character that could be inherited instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub index: usize,
    pub parent: String,
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub chars: CharTable,
    /// Sorted by index
    pub duplicates: Vec<Duplicate>,
}

/// True if `child` adds nothing over `parent`
pub fn is_redundant(child: &Char, parent: &Char) -> bool {
    child == parent || (child.visually_equal(parent) && parent.metadata_is_blank())
}

/// Merges a primary table with its parents and extra data.
///
/// For each index up to the widest table, the primary character wins;
/// otherwise the first parent (in precedence order) that has one provides it.
/// Extra data is applied last.
pub struct FontComposer<'a> {
    parents: &'a [NamedFont],
    extra: &'a ExtraDataSet,
    detect_duplicates: bool,
}

impl<'a> FontComposer<'a> {
    pub fn new(parents: &'a [NamedFont], extra: &'a ExtraDataSet) -> Self {
        Self {
            parents,
            extra,
            detect_duplicates: false,
        }
    }

    pub fn with_duplicate_detection(mut self, detect: bool) -> Self {
        self.detect_duplicates = detect;
        self
    }

    fn resolve_parent(&self, index: usize) -> Option<(&'a NamedFont, &'a Char)> {
        self.parents
            .iter()
            .find_map(|p| p.chars.get(index).map(|c| (p, c)))
    }

    pub fn compose(&self, primary: &CharTable) -> Result<Composition, ExtraDataError> {
        let char_num = self
            .parents
            .iter()
            .map(|p| p.chars.char_num())
            .fold(primary.char_num(), usize::max);

        let mut chars = primary.clone();
        let mut duplicates = Vec::new();
        for index in 0..char_num {
            let Some((parent, parent_char)) = self.resolve_parent(index) else {
                continue;
            };
            match primary.get(index) {
                Some(c) => {
                    if self.detect_duplicates && is_redundant(c, parent_char) {
                        info!(index, parent = %parent.name, "character is a duplicate of its parent's");
                        duplicates.push(Duplicate {
                            index,
                            parent: parent.name.clone(),
                        });
                    }
                }
                None => {
                    debug!(index, parent = %parent.name, "inheriting character");
                    chars.insert(index, parent_char.clone());
                }
            }
        }

        for (index, extra) in self.extra.iter() {
            let wrap = |source| ExtraDataError::Char { index, source };
            let c = match chars.get(index) {
                Some(existing) => {
                    // A parent built with the same extra data already carries it
                    let inherited = primary.get(index).is_none() && !extra.data.is_empty();
                    if inherited && extra.char().ok().as_ref() == Some(existing) {
                        continue;
                    }
                    extra.merge_to(existing).map_err(wrap)?
                }
                None => extra.char().map_err(wrap)?,
            };
            debug!(index, "applied extra data");
            chars.insert(index, c);
        }

        Ok(Composition { chars, duplicates })
    }
}
