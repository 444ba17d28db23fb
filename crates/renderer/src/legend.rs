//! Legends for NDVI overlays.
//!
//! Both legends are plain descriptors derived from a known range; callers
//! only build one once the range is final. They render to standalone SVG for
//! export.

use serde::Serialize;

use crate::gradient::{Color, ColorRamp};
use crate::raster::ValueRange;

const BAR_WIDTH: f64 = 500.0;
const BAR_HEIGHT: f64 = 15.0;
const SWATCH_GAP: f64 = 8.0;
const CAPTION_HEIGHT: f64 = 16.0;
const LABEL_HEIGHT: f64 = 14.0;

/// A two-stop gradient bar with numeric end labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientLegend {
    pub caption: String,
    pub low: f64,
    pub high: f64,
    pub low_color: Color,
    pub high_color: Color,
    pub low_label: String,
    pub high_label: String,
    /// Swatch shown next to the bar for entities without a value.
    pub unknown_color: Option<Color>,
}

impl GradientLegend {
    /// Legend for `range` with end colors taken from the ramp over `domain`.
    pub fn new(caption: impl Into<String>, range: ValueRange, ramp: &ColorRamp, domain: ValueRange) -> Self {
        Self {
            caption: caption.into(),
            low: range.low,
            high: range.high,
            low_color: ramp.color_of(range.low, domain.low, domain.high),
            high_color: ramp.color_of(range.high, domain.low, domain.high),
            low_label: format!("{:.3}", range.low),
            high_label: format!("{:.3}", range.high),
            unknown_color: None,
        }
    }

    /// Replace the end labels, e.g. with unscaled values when the bar shows a normalized range.
    pub fn with_labels(mut self, low_label: f64, high_label: f64) -> Self {
        self.low_label = format!("{:.3}", low_label);
        self.high_label = format!("{:.3}", high_label);
        self
    }

    pub fn with_unknown(mut self, color: Color) -> Self {
        self.unknown_color = Some(color);
        self
    }

    pub fn to_svg(&self) -> String {
        let swatch_width = if self.unknown_color.is_some() {
            BAR_HEIGHT + SWATCH_GAP
        } else {
            0.0
        };
        let width = BAR_WIDTH + swatch_width;
        let height = CAPTION_HEIGHT + BAR_HEIGHT;
        let bar_y = CAPTION_HEIGHT;
        let text_y = bar_y + BAR_HEIGHT - 3.0;

        let mut svg = svg_open(width, height);
        svg.push_str(&format!(
            "<defs><linearGradient id=\"ndvi\" x1=\"0\" x2=\"1\" y1=\"0\" y2=\"0\">{}{}</linearGradient></defs>",
            stop(0.0, self.low_color),
            stop(1.0, self.high_color)
        ));
        svg.push_str(&format!(
            "<text x=\"0\" y=\"12\" font-size=\"12\" font-weight=\"bold\">{}</text>",
            escape(&self.caption)
        ));
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"url(#ndvi)\"/>",
            bar_y, BAR_WIDTH, BAR_HEIGHT
        ));
        svg.push_str(&format!(
            "<text x=\"2\" y=\"{}\" font-size=\"11\" font-weight=\"bold\">{}</text>",
            text_y, self.low_label
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" font-weight=\"bold\" text-anchor=\"end\">{}</text>",
            BAR_WIDTH - 2.0,
            text_y,
            self.high_label
        ));
        if let Some(unknown) = self.unknown_color {
            let x = BAR_WIDTH + SWATCH_GAP;
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"12\" font-size=\"11\" font-weight=\"bold\">N/A</text>",
                x
            ));
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
                x,
                bar_y,
                BAR_HEIGHT,
                BAR_HEIGHT,
                fill_attrs(unknown)
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

/// `bins` equal steps between `low` and `high`, each a small gradient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedLegend {
    pub low: f64,
    pub high: f64,
    pub bins: usize,
    /// `bins + 1` boundary labels, two decimals.
    pub labels: Vec<String>,
    /// `(start, end)` colors of each bin.
    pub colors: Vec<(Color, Color)>,
}

impl BinnedLegend {
    /// A zero bin count is treated as one bin.
    pub fn new(range: ValueRange, bins: usize, ramp: &ColorRamp, domain: ValueRange) -> Self {
        let bins = bins.max(1);
        let step = range.span() / bins as f64;
        let boundary = |i: usize| range.low + step * i as f64;

        let labels = (0..=bins).map(|i| format!("{:.2}", boundary(i))).collect();
        let colors = (0..bins)
            .map(|i| {
                (
                    ramp.color_of(boundary(i), domain.low, domain.high),
                    ramp.color_of(boundary(i + 1), domain.low, domain.high),
                )
            })
            .collect();

        Self {
            low: range.low,
            high: range.high,
            bins,
            labels,
            colors,
        }
    }

    pub fn to_svg(&self) -> String {
        let bin_width = BAR_WIDTH / self.bins as f64;
        let height = BAR_HEIGHT + LABEL_HEIGHT;
        let mut svg = svg_open(BAR_WIDTH, height);

        svg.push_str("<defs>");
        for (i, (start, end)) in self.colors.iter().enumerate() {
            svg.push_str(&format!(
                "<linearGradient id=\"bin{}\" x1=\"0\" x2=\"1\" y1=\"0\" y2=\"0\">{}{}</linearGradient>",
                i,
                stop(0.0, *start),
                stop(1.0, *end)
            ));
        }
        svg.push_str("</defs>");

        for i in 0..self.bins {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"0\" width=\"{:.2}\" height=\"10\" fill=\"url(#bin{})\" stroke=\"black\" stroke-width=\"1\"/>",
                i as f64 * bin_width,
                bin_width,
                i
            ));
        }
        for (i, label) in self.labels.iter().enumerate() {
            let anchor = match i {
                0 => "start",
                i if i == self.bins => "end",
                _ => "middle",
            };
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{}\" font-size=\"10\" font-weight=\"bold\" text-anchor=\"{}\">{}</text>",
                i as f64 * bin_width,
                height - 2.0,
                anchor,
                label
            ));
        }
        svg.push_str("</svg>");
        svg
    }
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    )
}

fn stop(offset: f64, color: Color) -> String {
    format!(
        "<stop offset=\"{}\" stop-color=\"{}\" stop-opacity=\"{:.3}\"/>",
        offset,
        color.to_css_rgb(),
        color.a as f64 / 255.0
    )
}

fn fill_attrs(color: Color) -> String {
    format!(
        "fill=\"{}\" fill-opacity=\"{:.3}\"",
        color.to_css_rgb(),
        color.a as f64 / 255.0
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_labels_three_decimals() {
        let legend = GradientLegend::new(
            "NDVI",
            ValueRange::new(0.12345, 0.8),
            &ColorRamp::default(),
            ValueRange::NDVI,
        );
        assert_eq!(legend.low_label, "0.123");
        assert_eq!(legend.high_label, "0.800");
        assert_eq!(legend.low_color, Color::rgb(224, 31, 0));
    }

    #[test]
    fn test_binned_labels() {
        let legend = BinnedLegend::new(ValueRange::new(0.2, 0.6), 4, &ColorRamp::default(), ValueRange::NDVI);
        assert_eq!(legend.labels, vec!["0.20", "0.30", "0.40", "0.50", "0.60"]);
        assert_eq!(legend.colors.len(), 4);
        assert_eq!(legend.colors[0].1, legend.colors[1].0);
    }

    #[test]
    fn test_svg_contains_unknown_swatch() {
        let svg = GradientLegend::new("A & B", ValueRange::NDVI, &ColorRamp::default(), ValueRange::NDVI)
            .with_unknown(Color::GRAY)
            .to_svg();
        assert!(svg.contains("N/A"));
        assert!(svg.contains("A &amp; B"));
        assert!(svg.ends_with("</svg>"));
    }
}
