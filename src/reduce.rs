//! Measurement reduction: raw bounding boxes to scaled source targets.
//!
//! Pure functions, no I/O. The orchestrator feeds each breakpoint's raw
//! geometry through [`reduce`]; the synthesizer consumes the resulting
//! [`ScaledMeasurement`] records.

use serde::{Deserialize, Serialize};

/// Rendered bounding box of one image at one breakpoint, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawGeometry {
    pub display_width: u32,
    pub display_height: u32,
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Per-breakpoint reduction result: the clamped display size and the raster
/// target derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledMeasurement {
    pub original: Dimensions,
    pub scaled: Dimensions,
}

/// Device-pixel-ratio target: sources are requested at twice the CSS size.
const SCALE_FACTOR: u32 = 2;

/// Reduce one breakpoint's raw geometry to its scaled source target.
///
/// Zero-sized dimensions are clamped up to 1 so the downstream resize
/// directive never sees a degenerate request. A box that is 1x1 after
/// clamping stays 1x1: doubling a collapsed placeholder would request a
/// meaningless large render for an element that never got layout. Everything
/// else is doubled, then capped at `max_scaled_width` with the height scaled
/// proportionally.
pub fn reduce(raw: RawGeometry, max_scaled_width: u32) -> ScaledMeasurement {
    let original = Dimensions {
        width: raw.display_width.max(1),
        height: raw.display_height.max(1),
    };

    if original.width == 1 && original.height == 1 {
        return ScaledMeasurement {
            original,
            scaled: original,
        };
    }

    let mut scaled = Dimensions {
        width: original.width * SCALE_FACTOR,
        height: original.height * SCALE_FACTOR,
    };

    if scaled.width > max_scaled_width {
        let factor = f64::from(max_scaled_width) / f64::from(scaled.width);
        scaled.height = (f64::from(scaled.height) * factor).round() as u32;
        scaled.width = max_scaled_width;
    }

    ScaledMeasurement { original, scaled }
}

/// An image whose desktop box collapsed to the 1x1 placeholder needs an
/// extra source between tablet and desktop: its desktop measurement is
/// useless for sizing anything in that range.
pub fn needs_intermediate_breakpoint(desktop: Option<&ScaledMeasurement>) -> bool {
    matches!(desktop, Some(m) if m.original.width == 1 && m.original.height == 1)
}
