//! Cross-page selection.
//!
//! Only one page of rows is ever in memory, so the selection is kept as a set
//! of identifiers and reconciled against whichever page is on screen. Rows
//! from other pages are never touched by a toggle on this one.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::{Artwork, ArtworkId};

/// Ordered, duplicate-free set of selected identifiers.
///
/// Order is insertion order: toggled rows append, bulk replacement installs
/// fetch order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: Vec<ArtworkId>,
    index: HashSet<ArtworkId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ArtworkId) -> bool {
        self.index.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ArtworkId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = ArtworkId> + '_ {
        self.ids.iter().copied()
    }

    /// Apply the checked subset the UI reports for the visible page.
    ///
    /// `checked` is the complete set of checked rows among `window` after the
    /// toggle, not a delta. Window rows that are checked but not yet selected
    /// are appended in display order; window rows that are unchecked are
    /// dropped. Everything outside `window` is left alone.
    pub fn reconcile(&mut self, checked: &[ArtworkId], window: &[Artwork]) {
        let checked: HashSet<ArtworkId> = checked.iter().copied().collect();
        let mut added = 0usize;
        let mut removed: HashSet<ArtworkId> = HashSet::new();
        for record in window {
            let want = checked.contains(&record.id);
            let have = self.index.contains(&record.id);
            if want && !have {
                self.index.insert(record.id);
                self.ids.push(record.id);
                added += 1;
            } else if !want && have {
                self.index.remove(&record.id);
                removed.insert(record.id);
            }
        }
        if !removed.is_empty() {
            self.ids.retain(|id| !removed.contains(id));
        }
        debug!(added, removed = removed.len(), total = self.ids.len(), "selection reconciled");
    }

    /// Rows of `window` that are selected, in display order.
    ///
    /// This is what the table renders as checked; compute it per render
    /// rather than storing it.
    pub fn visible(&self, window: &[Artwork]) -> Vec<ArtworkId> {
        let mut seen = HashSet::new();
        window
            .iter()
            .map(|r| r.id)
            .filter(|id| self.index.contains(id) && seen.insert(*id))
            .collect()
    }

    /// Overwrite the whole selection. Later duplicates are dropped.
    pub fn replace<I: IntoIterator<Item = ArtworkId>>(&mut self, ids: I) {
        self.ids.clear();
        self.index.clear();
        for id in ids {
            if self.index.insert(id) {
                self.ids.push(id);
            }
        }
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for Selection {}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl FromIterator<ArtworkId> for Selection {
    fn from_iter<I: IntoIterator<Item = ArtworkId>>(iter: I) -> Self {
        let mut s = Selection::new();
        s.replace(iter);
        s
    }
}
