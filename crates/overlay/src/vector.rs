//! Keyed vector overlays reconciled against a desired set.
//!
//! Callers describe what should be on the map; the controller works out the
//! delta. Overlays whose content is unchanged keep their map instance.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use field_common::{BoundingBox, FieldId};
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::map::{KeyNamespace, MapSurface, Overlay, OverlayKey};

/// Overlays that should be installed, by key.
pub type DesiredSet = BTreeMap<OverlayKey, Overlay>;

/// What one [`VectorOverlayController::reconcile`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<OverlayKey>,
    pub removed: Vec<OverlayKey>,
    /// Still desired but with different content.
    pub replaced: Vec<OverlayKey>,
    pub unchanged: Vec<OverlayKey>,
    /// Whether the viewport was fitted to the new overlays.
    pub fitted: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.replaced.is_empty()
    }
}

/// The selection vector overlays belong to.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    field_id: FieldId,
    bounds: Option<BoundingBox>,
}

#[derive(Debug, Default)]
struct VectorState {
    anchor: Option<Anchor>,
    installed: BTreeMap<OverlayKey, Overlay>,
}

pub struct VectorOverlayController {
    map: Arc<dyn MapSurface>,
    fit_on_show: bool,
    state: Mutex<VectorState>,
}

impl VectorOverlayController {
    pub fn new(map: Arc<dyn MapSurface>, config: &OverlayConfig) -> Self {
        Self {
            map,
            fit_on_show: config.fit_on_show,
            state: Mutex::new(VectorState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_locked(&self, state: &mut VectorState) -> usize {
        let count = state.installed.len();
        for key in std::mem::take(&mut state.installed).into_keys() {
            self.map.remove_overlay(&key);
        }
        count
    }

    /// Anchor overlays to a field. Switching fields clears everything first.
    ///
    /// `boundary` is included when the viewport is fitted. Returns whether
    /// the anchor changed.
    pub fn set_anchor(&self, field_id: Option<FieldId>, boundary: Option<BoundingBox>) -> bool {
        let mut state = self.lock();
        let next = field_id.map(|field_id| Anchor {
            field_id,
            bounds: boundary,
        });
        let field_changed = state.anchor.map(|a| a.field_id) != next.map(|a| a.field_id);
        if field_changed {
            let cleared = self.clear_locked(&mut state);
            info!(field_id = ?field_id, cleared = cleared, "Vector overlays re-anchored");
        }
        state.anchor = next;
        field_changed
    }

    pub fn anchor(&self) -> Option<FieldId> {
        self.lock().anchor.map(|a| a.field_id)
    }

    /// Make the installed overlays exactly `desired`.
    ///
    /// Keys outside the vector namespace are rejected before anything
    /// changes. When overlays appear on a previously empty controller the
    /// viewport is fitted to them and the anchor boundary.
    pub fn reconcile(&self, desired: DesiredSet) -> OverlayResult<ReconcileReport> {
        if let Some(key) = desired.keys().find(|k| k.namespace() != KeyNamespace::Vector) {
            return Err(OverlayError::ForeignKey(key.clone()));
        }

        let mut state = self.lock();
        let was_empty = state.installed.is_empty();
        let mut report = ReconcileReport::default();

        let stale: Vec<OverlayKey> = state
            .installed
            .keys()
            .filter(|key| !desired.contains_key(key))
            .cloned()
            .collect();
        for key in stale {
            state.installed.remove(&key);
            self.map.remove_overlay(&key);
            report.removed.push(key);
        }

        let mut fit: Option<BoundingBox> = None;
        for (key, overlay) in desired {
            match state.installed.get(&key) {
                Some(existing) if *existing == overlay => {
                    report.unchanged.push(key);
                    continue;
                }
                Some(_) => {
                    state.installed.remove(&key);
                    self.map.remove_overlay(&key);
                    report.replaced.push(key.clone());
                }
                None => report.added.push(key.clone()),
            }
            if let Some(bounds) = overlay.bounds() {
                fit = Some(fit.map_or(bounds, |b| b.union(&bounds)));
            }
            self.map.add_overlay(key.clone(), overlay.clone())?;
            state.installed.insert(key, overlay);
        }

        if was_empty && !state.installed.is_empty() && self.fit_on_show {
            let anchor_bounds = state.anchor.and_then(|a| a.bounds);
            let target = match (fit, anchor_bounds) {
                (Some(f), Some(a)) => Some(f.union(&a)),
                (f, a) => f.or(a),
            };
            if let Some(bounds) = target {
                self.map.fit_bounds(bounds);
                report.fitted = true;
            }
        }

        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            replaced = report.replaced.len(),
            unchanged = report.unchanged.len(),
            "Vector overlays reconciled"
        );
        Ok(report)
    }

    /// Remove every installed overlay; returns how many there were.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        self.clear_locked(&mut state)
    }

    pub fn installed_keys(&self) -> Vec<OverlayKey> {
        self.lock().installed.keys().cloned().collect()
    }

    /// Remove everything and drop the anchor. Safe to call repeatedly.
    pub fn detach(&self) {
        let mut state = self.lock();
        self.clear_locked(&mut state);
        state.anchor = None;
    }
}

impl Drop for VectorOverlayController {
    fn drop(&mut self) {
        self.detach();
    }
}
