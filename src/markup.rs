//! Markup synthesis: one measured image to its `<picture>` block.
//!
//! The output is a byte-exact contract with the downstream template
//! processor: `{% getUrl "<path>" | resize({ width: <W>, height: <H> }) |
//! <format> %}` directives inside otherwise plain HTML. Attribute order, tab
//! indentation, the nested quotes inside the directive and the blank-line
//! block separator are all fixed, so everything here is rendered with plain
//! string formatting rather than an HTML builder (a builder would re-escape
//! the directive's inner quotes).
//!
//! Synthesis is pure: the same record entry always renders the same bytes.

use crate::breakpoints::EngineConfig;
use crate::measure::ImageMeasurement;
use crate::reduce::{Dimensions, ScaledMeasurement};

/// Raster format used for the lowest-priority `<source>` and the fallback
/// `<img>`. AVIF and WebP are always offered above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackFormat {
    Jpeg,
    Png,
}

impl FallbackFormat {
    /// PNG sources keep PNG as the fallback (transparency survives the
    /// resize); everything else falls back to JPEG.
    pub fn from_source_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".png") {
            Self::Png
        } else {
            Self::Jpeg
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Rewrite an image URL to start at the site's `/assets/` root when that
/// segment is present; the template processor resolves from there.
fn asset_path(src: &str) -> String {
    match src.split_once("/assets/") {
        Some((_, rest)) => format!("/assets/{rest}"),
        None => src.to_string(),
    }
}

/// The resize directive the downstream template processor expands. Fixed
/// syntax, reproduced byte-for-byte.
fn resize_directive(path: &str, dims: Dimensions, format: &str) -> String {
    format!(
        "{{% getUrl \"{path}\" | resize({{ width: {width}, height: {height} }}) | {format} %}}",
        width = dims.width,
        height = dims.height,
    )
}

/// One `<source>` triple to emit: breakpoint label, its media query, and the
/// dimensions the sources are requested at.
struct SourceLine<'a> {
    name: &'a str,
    media_query: &'a str,
    scaled: Dimensions,
}

/// Pick the breakpoints this image gets sources for, in catalog order.
///
/// Breakpoints with no measurement are dropped. When the image needs the
/// intermediate breakpoint it slots in before desktop, reusing the tablet
/// dimensions if it has no measurement of its own, and the desktop query
/// narrows so the two ranges don't overlap.
fn select_sources<'a>(entry: &ImageMeasurement, config: &'a EngineConfig) -> Vec<SourceLine<'a>> {
    let desktop_key = config.desktop().key();
    let mut lines = Vec::new();

    for bp in &config.breakpoints {
        let Some(measurement) = entry.measurements.get(&bp.key()) else {
            continue;
        };
        if entry.needs_intermediate && bp.key() == desktop_key {
            if let Some(scaled) = intermediate_dimensions(entry, config) {
                lines.push(SourceLine {
                    name: &config.intermediate.name,
                    media_query: &config.intermediate.media_query,
                    scaled,
                });
            }
            lines.push(SourceLine {
                name: &bp.name,
                media_query: &config.narrowed_desktop_query,
                scaled: measurement.scaled,
            });
        } else {
            lines.push(SourceLine {
                name: &bp.name,
                media_query: &bp.media_query,
                scaled: measurement.scaled,
            });
        }
    }

    lines
}

/// The intermediate breakpoint is synthetic, so it usually has no
/// measurement; the tablet dimensions stand in rather than dropping the
/// source line.
fn intermediate_dimensions(entry: &ImageMeasurement, config: &EngineConfig) -> Option<Dimensions> {
    entry
        .measurements
        .get(&config.intermediate.key())
        .or_else(|| entry.measurements.get(&config.tablet().key()))
        .map(|m| m.scaled)
}

/// Widest measured breakpoint, searched catalog-wide from desktop down;
/// sizes the fallback `<img>`.
fn fallback_img_measurement<'a>(
    entry: &'a ImageMeasurement,
    config: &EngineConfig,
) -> Option<&'a ScaledMeasurement> {
    config
        .breakpoints
        .iter()
        .rev()
        .find_map(|bp| entry.measurements.get(&bp.key()))
}

/// Mobile dimensions for the preload hint, falling back to the narrowest
/// breakpoint that was actually measured.
fn preload_dimensions(entry: &ImageMeasurement, config: &EngineConfig) -> Option<Dimensions> {
    config
        .breakpoints
        .iter()
        .find_map(|bp| entry.measurements.get(&bp.key()))
        .map(|m| m.scaled)
}

/// Render one image's markup block, or `None` when nothing was measured.
pub fn synthesize(entry: &ImageMeasurement, config: &EngineConfig) -> Option<String> {
    let img_measurement = fallback_img_measurement(entry, config)?;

    let path = asset_path(&entry.image.source_url);
    let fallback = FallbackFormat::from_source_path(&path);
    let sources = select_sources(entry, config);

    let mut block = String::new();

    // Above-the-fold images get a preload hint for the AVIF variant so the
    // browser can start fetching before layout.
    if entry.above_fold
        && let Some(dims) = preload_dimensions(entry, config)
    {
        block.push_str(&format!(
            "<link rel=\"preload\" as=\"image\" href=\"{}\" type=\"image/avif\">\n",
            resize_directive(&path, dims, "avif"),
        ));
    }

    match entry.image.container_class.as_deref() {
        Some(class) => block.push_str(&format!("<picture class=\"{class}\">\n")),
        None => block.push_str("<picture>\n"),
    }

    for line in &sources {
        block.push_str(&format!("\t<!--{} Image-->\n", line.name));
        let formats = [
            ("avif", "image/avif"),
            ("webp", "image/webp"),
            (fallback.directive(), fallback.mime()),
        ];
        for (format, mime) in formats {
            block.push_str(&format!(
                "\t<source media=\"{}\" srcset=\"{}\" type=\"{}\">\n",
                line.media_query,
                resize_directive(&path, line.scaled, format),
                mime,
            ));
        }
    }

    // The fallback <img> keeps the unscaled display size as width/height so
    // layout stays stable before the image loads. Above-the-fold images must
    // not be lazy or the preload is pointless.
    let loading = if entry.above_fold { "" } else { " loading=\"lazy\"" };
    block.push_str(&format!(
        "\t<img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\"{} decoding=\"async\">\n",
        resize_directive(&path, img_measurement.scaled, fallback.directive()),
        entry.image.alt_text,
        img_measurement.original.width,
        img_measurement.original.height,
        loading,
    ));
    block.push_str("</picture>");

    Some(block)
}
