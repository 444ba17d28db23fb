//! Tests for NDVI color mapping.

use renderer::gradient::{color_of, index_color, interpolate_color, Color, ColorRamp};

// ============================================================================
// color_of properties
// ============================================================================

#[test]
fn test_endpoints_differ_for_non_degenerate_range() {
    for (low, high) in [(0.0, 1.0), (0.2, 0.7), (0.45, 0.46)] {
        assert_ne!(color_of(low, low, high), color_of(high, low, high));
    }
}

#[test]
fn test_monotonic_channels() {
    let (low, high) = (0.1, 0.9);
    let mut previous = color_of(low, low, high);
    for step in 1..=100 {
        let value = low + (high - low) * step as f64 / 100.0;
        let color = color_of(value, low, high);
        // red falls, green rises, blue stays flat on the default ramp
        assert!(color.r <= previous.r, "red rose at {}", value);
        assert!(color.g >= previous.g, "green fell at {}", value);
        assert_eq!(color.b, previous.b);
        previous = color;
    }
}

#[test]
fn test_negative_always_transparent() {
    for value in [-0.0001, -0.5, -1.0, -9999.0] {
        for (low, high) in [(0.0, 1.0), (-2.0, 2.0), (5.0, 5.0)] {
            assert_eq!(color_of(value, low, high), Color::transparent());
        }
    }
}

#[test]
fn test_values_outside_range_clamp() {
    assert_eq!(color_of(3.0, 0.0, 1.0), Color::rgb(0, 255, 0));
    assert_eq!(color_of(0.05, 0.1, 0.9), Color::rgb(255, 0, 0));
}

#[test]
fn test_hex_encoding_two_digits() {
    let hex = color_of(0.98, 0.0, 1.0).to_hex();
    assert_eq!(hex, "#05fa00ff");
    assert_eq!(hex.len(), 9);
}

#[test]
fn test_custom_ramp() {
    let ramp = ColorRamp::new(Color::rgb(0, 0, 0), Color::rgb(200, 100, 50));
    assert_eq!(ramp.color_of(0.5, 0.0, 1.0), Color::rgb(100, 50, 25));
}

#[test]
fn test_interpolate_alpha() {
    let color = interpolate_color(Color::new(0, 0, 0, 0), Color::new(0, 0, 0, 255), 0.5);
    assert_eq!(color.a, 128);
}

// ============================================================================
// index_color
// ============================================================================

#[test]
fn test_index_color_deterministic() {
    for index in [3u64, 10, 99, 12345] {
        assert_eq!(index_color(index), index_color(index));
        assert_eq!(index_color(index).a, 255);
    }
}

#[test]
fn test_index_color_low_24_bits() {
    let color = index_color(10);
    let packed = ((color.r as u64) << 16) | ((color.g as u64) << 8) | color.b as u64;
    assert_eq!(packed, (10u64 * 22_041_998) & 0xFF_FFFF);
    assert_eq!(index_color(1).to_css_rgb(), "rgb(255,255,0)");
}
