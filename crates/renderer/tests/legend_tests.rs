//! Tests for the gradient and binned legends.

use renderer::gradient::{Color, ColorRamp};
use renderer::legend::{BinnedLegend, GradientLegend};
use renderer::raster::ValueRange;

// ============================================================================
// Gradient legend
// ============================================================================

#[test]
fn test_gradient_legend_end_colors_follow_ramp() {
    let legend = GradientLegend::new(
        "NDVI",
        ValueRange::new(0.25, 0.75),
        &ColorRamp::default(),
        ValueRange::NDVI,
    );
    assert_eq!(legend.low_color, ColorRamp::default().color_of(0.25, 0.0, 1.0));
    assert_eq!(legend.high_color, ColorRamp::default().color_of(0.75, 0.0, 1.0));
    assert_eq!(legend.low_label, "0.250");
    assert_eq!(legend.high_label, "0.750");
    assert!(legend.unknown_color.is_none());
}

#[test]
fn test_gradient_legend_custom_labels() {
    // Normalized fertilizer amounts shown with their absolute values
    let legend = GradientLegend::new("kg/ha", ValueRange::NDVI, &ColorRamp::default(), ValueRange::NDVI)
        .with_labels(0.0, 180.0);
    assert_eq!(legend.low_label, "0.000");
    assert_eq!(legend.high_label, "180.000");
    assert_eq!(legend.high_color, Color::LIME);
}

#[test]
fn test_gradient_svg_layout() {
    let svg = GradientLegend::new("NDVI", ValueRange::new(0.1, 0.9), &ColorRamp::default(), ValueRange::NDVI)
        .to_svg();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("linearGradient"));
    assert!(svg.contains(">0.100<"));
    assert!(svg.contains(">0.900<"));
    assert!(!svg.contains("N/A"));
}

#[test]
fn test_gradient_svg_escapes_caption() {
    let svg = GradientLegend::new("<b>", ValueRange::NDVI, &ColorRamp::default(), ValueRange::NDVI).to_svg();
    assert!(svg.contains("&lt;b&gt;"));
    assert!(!svg.contains("<b>"));
}

// ============================================================================
// Binned legend
// ============================================================================

#[test]
fn test_binned_legend_boundaries() {
    let legend = BinnedLegend::new(ValueRange::NDVI, 5, &ColorRamp::default(), ValueRange::NDVI);
    assert_eq!(legend.bins, 5);
    assert_eq!(legend.labels, vec!["0.00", "0.20", "0.40", "0.60", "0.80", "1.00"]);
    assert_eq!(legend.colors.first().map(|c| c.0), Some(Color::RED));
    assert_eq!(legend.colors.last().map(|c| c.1), Some(Color::LIME));
}

#[test]
fn test_binned_legend_zero_bins_is_one() {
    let legend = BinnedLegend::new(ValueRange::new(0.3, 0.5), 0, &ColorRamp::default(), ValueRange::NDVI);
    assert_eq!(legend.bins, 1);
    assert_eq!(legend.labels, vec!["0.30", "0.50"]);
}

#[test]
fn test_binned_svg_has_rect_per_bin() {
    let svg = BinnedLegend::new(ValueRange::NDVI, 4, &ColorRamp::default(), ValueRange::NDVI).to_svg();
    assert_eq!(svg.matches("<rect").count(), 4);
    assert_eq!(svg.matches("<text").count(), 5);
    assert!(svg.ends_with("</svg>"));
}
