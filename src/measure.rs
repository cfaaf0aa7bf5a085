//! Page measurement orchestration.
//!
//! Drives a [`PageDriver`] through the breakpoint catalog for a single page
//! and reduces the raw geometry into a [`PageMeasurementRecord`]:
//!
//! 1. navigate and wait for the page to load;
//! 2. discover `<picture>` candidates in DOM order, skipping pictures
//!    without an image child and vector (SVG) sources;
//! 3. classify every image's fold state at the narrowest viewport;
//! 4. for each breakpoint, set the viewport, let layout settle, and read all
//!    boxes in one pass.
//!
//! Navigation failure is absorbed into the record so the batch can keep
//! going; a failed measurement just leaves its breakpoint absent.

use crate::breakpoints::EngineConfig;
use crate::browser::{DriverError, ElementRect, PageDriver};
use crate::reduce::{self, RawGeometry, ScaledMeasurement};
use serde::Serialize;
use std::collections::BTreeMap;

/// One `<picture>` candidate that survived discovery filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredImage {
    pub source_url: String,
    pub alt_text: String,
    /// Class attribute of the enclosing `<picture>`, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_class: Option<String>,
}

/// Everything measured about one image across the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ImageMeasurement {
    /// Positional id (`image-<i>` over surviving discovery order). Not
    /// stable across DOM reorderings of the same page.
    pub id: String,
    pub image: DiscoveredImage,
    pub above_fold: bool,
    /// Set when the desktop box collapsed to the 1x1 placeholder; the
    /// synthesizer answers with an extra large-tablet source.
    pub needs_intermediate: bool,
    /// Breakpoint key → reduced measurement. Sparse: a breakpoint the
    /// collaborator failed to measure simply has no entry.
    pub measurements: BTreeMap<String, ScaledMeasurement>,
}

/// Result of measuring one page. `error` is set (and `images` empty) when
/// the page could not be inspected at all.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeasurementRecord {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub images: Vec<ImageMeasurement>,
}

impl PageMeasurementRecord {
    fn failed(url: &str, err: &DriverError) -> Self {
        Self {
            url: url.to_string(),
            error: Some(err.to_string()),
            images: Vec::new(),
        }
    }
}

/// Measure every raster `<picture>` image on `url` at each catalog
/// breakpoint.
pub async fn measure_page<D: PageDriver>(
    driver: &mut D,
    url: &str,
    config: &EngineConfig,
) -> PageMeasurementRecord {
    if let Err(err) = driver.navigate(url).await {
        log::warn!("navigation failed for {url}: {err}");
        return PageMeasurementRecord::failed(url, &err);
    }

    let candidates = match driver.discover().await {
        Ok(candidates) => candidates,
        Err(err) => {
            log::warn!("picture discovery failed for {url}: {err}");
            return PageMeasurementRecord::failed(url, &err);
        }
    };

    // Surviving image → its index among all <picture> elements, so later
    // rect batches (also in DOM order) line up.
    let mut images: Vec<(usize, DiscoveredImage)> = Vec::new();
    for (dom_index, candidate) in candidates.iter().enumerate() {
        let Some(src) = candidate.img_src.as_deref() else {
            continue;
        };
        if is_svg_source(src) {
            // Vector sources are not raster-responsive candidates.
            continue;
        }
        let container_class = if candidate.class_name.is_empty() {
            None
        } else {
            Some(candidate.class_name.clone())
        };
        images.push((
            dom_index,
            DiscoveredImage {
                source_url: src.to_string(),
                alt_text: candidate.alt.clone(),
                container_class,
            },
        ));
    }

    if images.is_empty() {
        return PageMeasurementRecord {
            url: url.to_string(),
            error: None,
            images: Vec::new(),
        };
    }
    log::debug!("{url}: {} of {} pictures survive filtering", images.len(), candidates.len());

    // Fold state is relative to the narrowest viewport, classified once
    // before the measurement loop. A missing rect reads as below the fold.
    let mobile = config.mobile();
    let fold_rects = match viewport_rects(driver, mobile.width, mobile.height, config).await {
        Ok(rects) => rects,
        Err(err) => {
            log::warn!("fold measurement failed for {url}: {err}");
            Vec::new()
        }
    };

    let mut entries: Vec<ImageMeasurement> = images
        .iter()
        .enumerate()
        .map(|(index, (dom_index, image))| {
            let above_fold = fold_rects
                .get(*dom_index)
                .copied()
                .flatten()
                .is_some_and(|rect| rect.top < f64::from(mobile.height) && rect.bottom > 0.0);
            ImageMeasurement {
                id: format!("image-{index}"),
                image: image.clone(),
                above_fold,
                needs_intermediate: false,
                measurements: BTreeMap::new(),
            }
        })
        .collect();

    for bp in &config.breakpoints {
        let rects = match viewport_rects(driver, bp.width, bp.height, config).await {
            Ok(rects) => rects,
            Err(err) => {
                // One unreadable breakpoint leaves a gap, not a dead page.
                log::warn!("measurement at {} failed for {url}: {err}", bp.key());
                continue;
            }
        };
        let key = bp.key();
        for ((dom_index, _), entry) in images.iter().zip(entries.iter_mut()) {
            if let Some(rect) = rects.get(*dom_index).copied().flatten() {
                let raw = RawGeometry {
                    display_width: rect.width,
                    display_height: rect.height,
                };
                entry
                    .measurements
                    .insert(key.clone(), reduce::reduce(raw, config.max_scaled_width));
            }
        }
    }

    let desktop_key = config.desktop().key();
    for entry in &mut entries {
        entry.needs_intermediate =
            reduce::needs_intermediate_breakpoint(entry.measurements.get(&desktop_key));
    }

    PageMeasurementRecord {
        url: url.to_string(),
        error: None,
        images: entries,
    }
}

/// Switch viewports, wait out the responsive re-layout, read all boxes.
async fn viewport_rects<D: PageDriver>(
    driver: &mut D,
    width: u32,
    height: u32,
    config: &EngineConfig,
) -> Result<Vec<Option<ElementRect>>, DriverError> {
    driver.set_viewport(width, height).await?;
    tokio::time::sleep(config.settle_delay).await;
    driver.measure().await
}

fn is_svg_source(src: &str) -> bool {
    src.to_ascii_lowercase().ends_with(".svg")
}
