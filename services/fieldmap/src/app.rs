//! One map session: a backend connection driving the three overlay controllers.

use std::sync::Arc;

use anyhow::{Context, Result};
use backend_client::{ApiError, BackendClient, NdviRasterInfo};
use field_common::{EntityKind, Field, FieldId, FieldRegistration, MeasurementId, Season, SeasonId, ServerEvent};
use overlay::{
    boundary_overlay, measurement_overlays, subfield_legend, DrawController, DrawEvent, MapSurface, MemoryMap,
    Notification, Notifier, OverlayConfig, RasterDisplay, RasterOverlayController, ReconcileReport,
    SubfieldLegend, VectorOverlayController, Visibility, VisibilitySet,
};
use renderer::GradientLegend;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheChange, MeasurementCache};
use crate::config::MapConfig;
use crate::source::BackendRasters;

const NDVI_CAPTION: &str = "NDVI";

/// The field currently shown and the season its measurements belong to.
#[derive(Debug, Clone)]
pub struct Selection {
    pub field: Field,
    pub season_id: SeasonId,
    /// Agronomic record of the season; `None` when the backend has none.
    pub season: Option<Season>,
    pub raster: Option<NdviRasterInfo>,
}

impl Selection {
    fn key(&self) -> (FieldId, SeasonId) {
        (self.field.id, self.season_id)
    }
}

pub struct MapSession {
    client: Arc<BackendClient>,
    map: Arc<MemoryMap>,
    notifier: Arc<dyn Notifier>,
    overlay_config: OverlayConfig,
    raster: RasterOverlayController,
    vectors: VectorOverlayController,
    draw: DrawController,
    cache: MeasurementCache,
    visible: VisibilitySet<MeasurementId>,
    selection: Option<Selection>,
    max_fertilizer: Option<f64>,
}

impl MapSession {
    pub fn new(
        client: Arc<BackendClient>,
        map_config: &MapConfig,
        overlay_config: OverlayConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        overlay_config.validate()?;
        let registry = Arc::new(map_config.registry()?);
        let map = Arc::new(MemoryMap::new(map_config.center_coordinate(), map_config.zoom));
        let surface: Arc<dyn MapSurface> = map.clone();

        let raster = RasterOverlayController::new(
            surface.clone(),
            Arc::new(BackendRasters::new(client.clone())),
            notifier.clone(),
            registry,
            overlay_config.clone(),
        );
        let vectors = VectorOverlayController::new(surface.clone(), &overlay_config);
        let draw = DrawController::new(surface, &overlay_config);

        Ok(Self {
            client,
            map,
            notifier,
            overlay_config,
            raster,
            vectors,
            draw,
            cache: MeasurementCache::new(),
            visible: VisibilitySet::new(),
            selection: None,
            max_fertilizer: None,
        })
    }

    pub fn map(&self) -> &Arc<MemoryMap> {
        &self.map
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn raster(&self) -> &RasterOverlayController {
        &self.raster
    }

    pub fn draw(&self) -> &DrawController {
        &self.draw
    }

    /// Fetch metadata for fertilizer scaling. Failure only degrades the legend.
    pub async fn load_metadata(&mut self) {
        match self.client.metadata().await {
            Ok(metadata) => self.max_fertilizer = Some(metadata.max_recommended_fertilizer),
            Err(err) => {
                warn!(error = %err, "Failed to load metadata");
                self.fail(&err);
            }
        }
    }

    /// Show a field with the measurements of one season.
    #[instrument(skip(self))]
    pub async fn select(&mut self, field_id: FieldId, season_id: SeasonId) -> Result<ReconcileReport> {
        let loaded = tokio::try_join!(
            self.client.field(field_id),
            self.client.measurements(field_id, season_id),
            self.client.subfields(field_id, season_id),
        );
        let (field, measurements, subfields) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                self.fail(&err);
                return Err(err).context("Failed to load field");
            }
        };

        let season = match self.client.season(field_id, season_id).await {
            Ok(season) => Some(season),
            Err(err) if err.is_auth_expired() => {
                self.fail(&err);
                return Err(err).context("Failed to load season");
            }
            Err(err) => {
                debug!(error = %err, "No season record");
                None
            }
        };

        if self.selection.as_ref().map(Selection::key) != Some((field_id, season_id)) {
            self.hide_ndvi();
        }
        self.vectors.set_anchor(Some(field_id), field.coordinates.bounds());
        self.cache.load((field_id, season_id), measurements, subfields);
        self.visible.clear();
        self.visible.show_all(self.cache.measurement_ids());
        info!(field = %field.name, measurements = self.cache.len(), "Field selected");

        self.selection = Some(Selection {
            field,
            season_id,
            season,
            raster: None,
        });
        self.refresh()
    }

    /// Drop the selection and everything shown for it.
    pub fn deselect(&mut self) {
        self.hide_ndvi();
        self.vectors.set_anchor(None, None);
        self.vectors.clear();
        self.cache.clear();
        self.visible.clear();
        if self.selection.take().is_some() {
            info!("Selection cleared");
        }
    }

    /// Reconcile vector overlays with the cache and visibility state.
    pub fn refresh(&self) -> Result<ReconcileReport> {
        let Some(selection) = &self.selection else {
            return Ok(self.vectors.reconcile(Default::default())?);
        };
        let mut desired = measurement_overlays(
            &self.cache.measurements(),
            &self.cache.subfields(),
            &self.visible,
            &self.overlay_config,
            self.max_fertilizer,
        );
        let (key, boundary) = boundary_overlay(&selection.field);
        desired.insert(key, boundary);
        let report = self.vectors.reconcile(desired)?;
        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            replaced = report.replaced.len(),
            "Vector overlays reconciled"
        );
        Ok(report)
    }

    pub fn toggle_measurement(&mut self, id: MeasurementId) -> Result<Visibility> {
        let visibility = self.visible.toggle(id);
        self.refresh()?;
        Ok(visibility)
    }

    /// Show the NDVI raster of the selected season, generating it on first request.
    pub async fn show_ndvi(&mut self) -> Result<RasterDisplay> {
        let Some(selection) = &self.selection else {
            anyhow::bail!("no field selected");
        };
        let (field_id, season_id) = (selection.field.id, selection.season_id);
        let info = match self.client.ndvi_raster(field_id, season_id).await {
            Ok(info) => info,
            Err(err) => {
                self.fail(&err);
                return Err(err).context("Failed to request NDVI raster");
            }
        };
        info!(raster = %info.raster_id, source_date = %info.source_date, "NDVI raster available");
        if let Some(selection) = self.selection.as_mut() {
            selection.raster = Some(info.clone());
        }

        let shown = self.raster.show(&info.raster_id).await;
        if let Err(err) = &shown {
            if let Some(selection) = self.selection.as_mut() {
                selection.raster = None;
            }
            if err.is_auth_expired() {
                self.signed_out();
            }
        }
        Ok(shown?)
    }

    pub fn hide_ndvi(&mut self) -> bool {
        let hidden = match self.raster.current_key() {
            Some(key) => self.raster.hide(&key),
            None => false,
        };
        if let Some(selection) = self.selection.as_mut() {
            selection.raster = None;
        }
        hidden
    }

    pub fn ndvi_legend(&self) -> Option<GradientLegend> {
        self.raster.legend(NDVI_CAPTION)
    }

    pub fn subfield_legend(&self) -> SubfieldLegend {
        subfield_legend(&self.overlay_config, self.max_fertilizer)
    }

    pub fn handle_draw(&self, event: DrawEvent) -> Result<()> {
        if let Err(err) = self.draw.handle(event) {
            self.notifier.notify(Notification::error(err.to_string()));
            return Err(err.into());
        }
        Ok(())
    }

    /// Register the drawn region as a new field and clear the drawing.
    #[instrument(skip(self))]
    pub async fn register_drawn(&mut self, name: &str) -> Result<Field> {
        let region = self.draw.region().context("no region drawn")?;
        let registration = FieldRegistration::new(name, &region)?;
        match self.client.register_field(&registration).await {
            Ok(field) => {
                self.draw.clear();
                self.notifier
                    .notify(Notification::info(format!("Registered field '{}'", field.name)));
                Ok(field)
            }
            Err(err) => {
                self.fail(&err);
                Err(err).context("Failed to register field")
            }
        }
    }

    /// Apply one server event. Returns whether the displayed state changed.
    pub fn handle_event(&mut self, event: &ServerEvent) -> Result<bool> {
        let selected = self.selection.as_ref().map(Selection::key);
        match event.entity {
            EntityKind::Measurement => {
                let change = self.cache.apply(event)?;
                if change == CacheChange::Replaced {
                    self.visible.clear();
                    self.visible.show_all(self.cache.measurement_ids());
                } else {
                    let ids = self.cache.measurement_ids();
                    self.visible.retain(|id| ids.contains(id));
                }
                if change == CacheChange::Unchanged {
                    return Ok(false);
                }
                Ok(!self.refresh()?.is_noop())
            }
            EntityKind::Field if event.is_delete() => {
                let id = event.payload.get("id").and_then(serde_json::Value::as_i64);
                if id.is_some() && id == selected.map(|(field_id, _)| field_id) {
                    self.notifier.notify(Notification::info("The selected field was removed"));
                    self.deselect();
                    return Ok(true);
                }
                Ok(false)
            }
            EntityKind::Season if event.action == "update" => {
                if selected.is_none() || event.selection() != selected {
                    return Ok(false);
                }
                let season = Season::parse(&event.payload)?;
                let Some(selection) = self.selection.as_mut() else {
                    return Ok(false);
                };
                if selection.season.as_ref() == Some(&season) {
                    return Ok(false);
                }
                info!(season = %selection.season_id, "Selected season updated");
                selection.season = Some(season);
                Ok(true)
            }
            EntityKind::Season if event.is_delete() => {
                if selected.is_some() && event.selection() == selected {
                    self.notifier.notify(Notification::info("The selected season was removed"));
                    self.deselect();
                    return Ok(true);
                }
                Ok(false)
            }
            _ => {
                debug!(entity = %event.entity, action = %event.action, "Event does not affect the map");
                Ok(false)
            }
        }
    }

    /// Reset after the session token was rejected.
    pub fn signed_out(&mut self) {
        self.deselect();
        self.draw.clear();
        self.max_fertilizer = None;
    }

    /// Notify about a failed request; an expired token also resets the session.
    fn fail(&mut self, err: &ApiError) {
        self.notifier.notify(Notification::error(err.to_string()));
        if err.is_auth_expired() {
            self.signed_out();
        }
    }
}
