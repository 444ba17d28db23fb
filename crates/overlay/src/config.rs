//! Overlay configuration.

use std::str::FromStr;

use renderer::{Color, ColorRamp, ValueRange};
use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// What a subfield polygon's fill color encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubfieldColoring {
    #[default]
    Ndvi,
    /// Recommended fertilizer relative to the metadata maximum.
    Fertilizer,
}

impl FromStr for SubfieldColoring {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndvi" => Ok(SubfieldColoring::Ndvi),
            "fertilizer" => Ok(SubfieldColoring::Fertilizer),
            other => Err(OverlayError::Config(format!("unknown subfield coloring '{}'", other))),
        }
    }
}

/// Settings shared by the overlay controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Valid NDVI domain; colors are placed on it and observed ranges clamped to it.
    pub ndvi_domain: ValueRange,
    pub ramp: ColorRamp,
    pub subfield_fill_opacity: f64,
    pub subfield_coloring: SubfieldColoring,
    pub legend_bins: usize,
    /// Swatch for subfields without a recommendation yet.
    pub unknown_color: Color,
    /// Fit the viewport when a raster or the first vector overlays appear.
    pub fit_on_show: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            ndvi_domain: ValueRange::NDVI,
            ramp: ColorRamp::default(),
            subfield_fill_opacity: 0.7,
            subfield_coloring: SubfieldColoring::Ndvi,
            legend_bins: 5,
            unknown_color: Color::GRAY,
            fit_on_show: true,
        }
    }
}

impl OverlayConfig {
    /// Load overrides from `OVERLAY_*` environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let low = env_parse("OVERLAY_NDVI_LOW").unwrap_or(defaults.ndvi_domain.low);
        let high = env_parse("OVERLAY_NDVI_HIGH").unwrap_or(defaults.ndvi_domain.high);
        let low_color = env_parse("OVERLAY_LOW_COLOR").unwrap_or(defaults.ramp.low_color);
        let high_color = env_parse("OVERLAY_HIGH_COLOR").unwrap_or(defaults.ramp.high_color);

        Self {
            ndvi_domain: ValueRange::new(low, high),
            ramp: ColorRamp::new(low_color, high_color),
            subfield_fill_opacity: env_parse("OVERLAY_SUBFIELD_OPACITY")
                .unwrap_or(defaults.subfield_fill_opacity),
            subfield_coloring: env_parse("OVERLAY_SUBFIELD_COLORING").unwrap_or(defaults.subfield_coloring),
            legend_bins: env_parse("OVERLAY_LEGEND_BINS").unwrap_or(defaults.legend_bins),
            unknown_color: env_parse("OVERLAY_UNKNOWN_COLOR").unwrap_or(defaults.unknown_color),
            fit_on_show: env_parse("OVERLAY_FIT_ON_SHOW").unwrap_or(defaults.fit_on_show),
        }
    }

    pub fn validate(&self) -> OverlayResult<()> {
        let domain = self.ndvi_domain;
        if !domain.low.is_finite() || !domain.high.is_finite() || domain.low >= domain.high {
            return Err(OverlayError::Config(format!(
                "NDVI domain [{}, {}] must be finite and non-empty",
                domain.low, domain.high
            )));
        }
        if !(0.0..=1.0).contains(&self.subfield_fill_opacity) {
            return Err(OverlayError::Config(format!(
                "subfield fill opacity {} outside [0, 1]",
                self.subfield_fill_opacity
            )));
        }
        if self.legend_bins == 0 {
            return Err(OverlayError::Config("legend needs at least one bin".into()));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
