//! NDVI raster overlay lifecycle.
//!
//! The controller shows at most one raster at a time. Every `show` bumps a
//! generation counter before it starts fetching; when the fetch and decode
//! complete the result is applied only if the generation is unchanged. A
//! slower, older request therefore never overwrites a newer one, and the
//! underlying transfer does not need to be aborted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use field_common::{BoundingBox, ProjectionRegistry};
use renderer::{colorize, decode_geotiff, ColorizedRaster, GradientLegend, ValueRange};
use tracing::{debug, info, instrument, warn};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::map::{MapSurface, Overlay, OverlayKey};
use crate::notify::{Notification, Notifier};
use crate::visibility::Visibility;

/// Where raster bytes come from.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Fetch the encoded raster stored under `raster_id`.
    async fn fetch_raster(&self, raster_id: &str) -> OverlayResult<Bytes>;
}

/// Outcome of a successful `show`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDisplay {
    pub key: String,
    pub bounds: BoundingBox,
    /// `None` when the raster held no valid sample.
    pub range: Option<ValueRange>,
}

#[derive(Debug, Default)]
struct RasterState {
    generation: u64,
    current: Option<String>,
    visibility: Visibility,
    range: Option<ValueRange>,
    bounds: Option<BoundingBox>,
}

impl RasterState {
    fn reset(&mut self) {
        self.current = None;
        self.visibility = Visibility::Hidden;
        self.range = None;
        self.bounds = None;
    }
}

pub struct RasterOverlayController {
    map: Arc<dyn MapSurface>,
    source: Arc<dyn RasterSource>,
    notifier: Arc<dyn Notifier>,
    registry: Arc<ProjectionRegistry>,
    config: OverlayConfig,
    state: Mutex<RasterState>,
}

impl RasterOverlayController {
    pub fn new(
        map: Arc<dyn MapSurface>,
        source: Arc<dyn RasterSource>,
        notifier: Arc<dyn Notifier>,
        registry: Arc<ProjectionRegistry>,
        config: OverlayConfig,
    ) -> Self {
        Self {
            map,
            source,
            notifier,
            registry,
            config,
            state: Mutex::new(RasterState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RasterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove whatever is installed and forget the current key.
    fn teardown(&self, state: &mut RasterState) -> bool {
        let Some(key) = state.current.take() else {
            return false;
        };
        let removed = self.map.remove_overlay(&OverlayKey::Raster(key.clone()));
        debug!(key = %key, removed = removed, "Raster overlay torn down");
        state.reset();
        true
    }

    /// Fetch, decode and colorize `key`, then install it in place of any current raster.
    ///
    /// Returns [`OverlayError::Superseded`] if another `show`, `hide` or
    /// `detach` happened while this request was in flight; its result is
    /// dropped without touching the map. Other failures leave nothing
    /// installed and raise an error notification.
    #[instrument(skip(self))]
    pub async fn show(&self, key: &str) -> OverlayResult<RasterDisplay> {
        let generation = {
            let mut state = self.lock();
            self.teardown(&mut state);
            state.generation += 1;
            state.current = Some(key.to_string());
            state.visibility = Visibility::Loading;
            state.generation
        };
        info!(generation = generation, "Loading NDVI raster");

        let result = self.load(key).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                generation = generation,
                current = state.generation,
                "Discarding superseded raster result"
            );
            return Err(OverlayError::Superseded(key.to_string()));
        }

        let installed = result.and_then(|raster| {
            let bounds = raster.bounds;
            let range = raster.range;
            self.map
                .add_overlay(OverlayKey::Raster(key.to_string()), Overlay::Raster(Arc::new(raster)))?;
            Ok(RasterDisplay {
                key: key.to_string(),
                bounds,
                range,
            })
        });

        match installed {
            Ok(shown) => {
                if self.config.fit_on_show {
                    self.map.fit_bounds(shown.bounds);
                }
                state.visibility = Visibility::Visible;
                state.range = shown.range;
                state.bounds = Some(shown.bounds);
                info!(range = ?shown.range, "NDVI raster displayed");
                Ok(shown)
            }
            Err(err) => {
                state.reset();
                drop(state);
                warn!(error = %err, "NDVI raster failed to load");
                self.notifier
                    .notify(Notification::error(format!("Could not show NDVI raster: {}", err)));
                Err(err)
            }
        }
    }

    async fn load(&self, key: &str) -> OverlayResult<ColorizedRaster> {
        let bytes = self.source.fetch_raster(key).await?;
        let grid = decode_geotiff(&bytes, &self.registry)?;
        Ok(colorize(&grid, &self.config.ramp, self.config.ndvi_domain))
    }

    /// Hide `key` if it is the current raster, cancelling a pending load.
    ///
    /// Hiding anything else, or hiding twice, does nothing. Returns whether
    /// state changed.
    pub fn hide(&self, key: &str) -> bool {
        let mut state = self.lock();
        if state.current.as_deref() != Some(key) {
            return false;
        }
        state.generation += 1;
        self.teardown(&mut state)
    }

    /// Drop the current raster whatever it is. Safe to call repeatedly.
    pub fn detach(&self) {
        let mut state = self.lock();
        state.generation += 1;
        self.teardown(&mut state);
    }

    pub fn visibility(&self) -> Visibility {
        self.lock().visibility
    }

    pub fn current_key(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Observed value range; unknown until a raster is fully displayed.
    pub fn range(&self) -> Option<ValueRange> {
        let state = self.lock();
        match state.visibility {
            Visibility::Visible => state.range,
            _ => None,
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.lock().bounds
    }

    /// Gradient legend for the displayed raster, if its range is known.
    pub fn legend(&self, caption: &str) -> Option<GradientLegend> {
        self.range()
            .map(|range| GradientLegend::new(caption, range, &self.config.ramp, self.config.ndvi_domain))
    }
}

impl Drop for RasterOverlayController {
    fn drop(&mut self) {
        self.detach();
    }
}
