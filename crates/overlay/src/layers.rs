//! Desired vector overlays for fields and measurements.

use field_common::{Field, Measurement, MeasurementId, Subfield};
use renderer::{BinnedLegend, Color, GradientLegend, ValueRange};

use crate::config::{OverlayConfig, SubfieldColoring};
use crate::map::{Overlay, OverlayKey, PolygonStyle};
use crate::vector::DesiredSet;
use crate::visibility::VisibilitySet;

/// Outline color of field boundaries.
pub const BOUNDARY_COLOR: Color = Color::rgb(0x33, 0x88, 0xff);

pub fn boundary_overlay(field: &Field) -> (OverlayKey, Overlay) {
    (
        OverlayKey::Boundary(field.id),
        Overlay::Polygon {
            coordinates: field.coordinates.clone(),
            style: PolygonStyle::outline(BOUNDARY_COLOR),
        },
    )
}

/// Fill color of a subfield under the configured coloring.
///
/// Fertilizer coloring places the recommendation on `[0, max]`; subfields
/// without a recommendation, or without a known maximum, get the unknown
/// color.
pub fn subfield_color(subfield: &Subfield, config: &OverlayConfig, max_fertilizer: Option<f64>) -> Color {
    match config.subfield_coloring {
        SubfieldColoring::Ndvi => {
            let domain = config.ndvi_domain;
            config.ramp.color_of(subfield.ndvi, domain.low, domain.high)
        }
        SubfieldColoring::Fertilizer => match (subfield.recommended_fertilizer_amount, max_fertilizer) {
            (Some(amount), Some(max)) if max > 0.0 => config.ramp.color_of(amount / max, 0.0, 1.0),
            _ => config.unknown_color,
        },
    }
}

/// Marker plus joined subfield polygon for every requested measurement.
///
/// A measurement whose `subfield_id` matches no subfield still gets its marker.
pub fn measurement_overlays(
    measurements: &[Measurement],
    subfields: &[Subfield],
    visible: &VisibilitySet<MeasurementId>,
    config: &OverlayConfig,
    max_fertilizer: Option<f64>,
) -> DesiredSet {
    let mut desired = DesiredSet::new();
    for measurement in measurements {
        if !visible.get(&measurement.id).is_requested() {
            continue;
        }
        desired.insert(
            OverlayKey::Marker(measurement.id),
            Overlay::Marker {
                position: measurement.position,
                label: Some(format!("NDVI {:.3}", measurement.ndvi)),
            },
        );

        let subfield = measurement
            .subfield_id
            .and_then(|id| subfields.iter().find(|s| s.id == id));
        if let Some(subfield) = subfield {
            desired.insert(
                OverlayKey::Subfield(subfield.id),
                Overlay::Polygon {
                    coordinates: subfield.coordinates.clone(),
                    style: PolygonStyle::filled(
                        subfield_color(subfield, config, max_fertilizer),
                        config.subfield_fill_opacity,
                    ),
                },
            );
        }
    }
    desired
}

/// Legend for subfield fills under the configured coloring.
pub fn subfield_legend(config: &OverlayConfig, max_fertilizer: Option<f64>) -> SubfieldLegend {
    match config.subfield_coloring {
        SubfieldColoring::Ndvi => SubfieldLegend::Binned(BinnedLegend::new(
            config.ndvi_domain,
            config.legend_bins,
            &config.ramp,
            config.ndvi_domain,
        )),
        SubfieldColoring::Fertilizer => {
            let unit = ValueRange::new(0.0, 1.0);
            let legend = GradientLegend::new("Recommended fertilizer", unit, &config.ramp, unit)
                .with_unknown(config.unknown_color);
            SubfieldLegend::Gradient(match max_fertilizer {
                Some(max) => legend.with_labels(0.0, max),
                None => legend,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubfieldLegend {
    Binned(BinnedLegend),
    Gradient(GradientLegend),
}

impl SubfieldLegend {
    pub fn to_svg(&self) -> String {
        match self {
            SubfieldLegend::Binned(legend) => legend.to_svg(),
            SubfieldLegend::Gradient(legend) => legend.to_svg(),
        }
    }
}
