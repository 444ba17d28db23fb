//! Visibility of overlay entities as toggled by the user.

use std::collections::BTreeMap;

use serde::Serialize;

/// Tri-state visibility of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hidden,
    /// Requested but data is still being fetched.
    Loading,
    Visible,
}

impl Visibility {
    /// Loading and visible entities both want an overlay.
    pub fn is_requested(self) -> bool {
        !matches!(self, Visibility::Hidden)
    }
}

/// Visibility per entity id. Ids never toggled are hidden.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilitySet<K: Ord> {
    entries: BTreeMap<K, Visibility>,
}

impl<K: Ord + Clone> VisibilitySet<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &K) -> Visibility {
        self.entries.get(id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, id: K, visibility: Visibility) {
        if visibility == Visibility::Hidden {
            self.entries.remove(&id);
        } else {
            self.entries.insert(id, visibility);
        }
    }

    /// Flip between hidden and visible; returns the new state.
    pub fn toggle(&mut self, id: K) -> Visibility {
        let next = if self.get(&id).is_requested() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };
        self.set(id, next);
        next
    }

    /// Make every id in `ids` visible.
    pub fn show_all(&mut self, ids: impl IntoIterator<Item = K>) {
        for id in ids {
            self.set(id, Visibility::Visible);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop ids that are no longer known.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }

    /// Ids whose overlay should be installed.
    pub fn requested(&self) -> impl Iterator<Item = &K> {
        self.entries
            .iter()
            .filter(|(_, visibility)| visibility.is_requested())
            .map(|(id, _)| id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
