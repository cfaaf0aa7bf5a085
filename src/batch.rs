//! Batch processing: the sequential per-page pipeline.
//!
//! One page session is opened, driven through every breakpoint, and closed
//! before the next page begins — viewport emulation is stateful, so sessions
//! are never shared. Per-page failures (unreachable pages, broken
//! measurements) are absorbed into the page's report and the batch keeps
//! going; only filesystem failures and an unresolvable `--page` request
//! abort the run.
//!
//! Output per run:
//! - one markup file per page that produced blocks, named after its route;
//! - `measurements.json`, the full record of what was measured;
//! - a [`Summary`] of aggregate counts.

use crate::breakpoints::EngineConfig;
use crate::browser::{PageDriver, SessionFactory};
use crate::crawl::{self, PagePlan};
use crate::markup;
use crate::measure::{self, PageMeasurementRecord};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no discovered page matches route {0}")]
    PageNotFound(String),
}

/// Outcome of one page's pass, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub url: String,
    pub page_name: String,
    pub image_count: usize,
    pub above_fold_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

/// Aggregate counts for a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_pages: usize,
    pub pages_with_images: usize,
    pub total_images: usize,
    pub above_fold_images: usize,
    pub pages_with_errors: usize,
}

/// Full result: summary plus the per-page trail.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub summary: Summary,
    pub reports: Vec<PageReport>,
}

/// Restrict the page list to a requested route.
///
/// An unknown route is fatal to the invocation — measuring nothing silently
/// would read as success.
pub fn select_pages(
    pages: Vec<PagePlan>,
    route: Option<&str>,
) -> Result<Vec<PagePlan>, BatchError> {
    let Some(route) = route else {
        return Ok(pages);
    };
    let wanted = crawl::normalize_route(route);
    let selected: Vec<PagePlan> = pages
        .into_iter()
        .filter(|page| page.permalink == wanted)
        .collect();
    if selected.is_empty() {
        return Err(BatchError::PageNotFound(wanted));
    }
    Ok(selected)
}

/// Process every page sequentially: measure, synthesize, persist.
///
/// Each finished page's report is sent on `progress` as it completes, so the
/// caller can print while the browser works on the next page.
pub async fn process_pages<F: SessionFactory>(
    factory: &F,
    pages: &[PagePlan],
    config: &EngineConfig,
    output_dir: &Path,
    progress: Option<Sender<PageReport>>,
) -> Result<BatchResult, BatchError> {
    fs::create_dir_all(output_dir)?;

    let mut reports = Vec::with_capacity(pages.len());
    let mut records = Vec::with_capacity(pages.len());

    for page in pages {
        log::info!("measuring {}", page.url);
        let record = match factory.open_page().await {
            Ok(mut driver) => {
                let record = measure::measure_page(&mut driver, &page.url, config).await;
                if let Err(err) = driver.close().await {
                    log::debug!("page close failed for {}: {err}", page.url);
                }
                record
            }
            Err(err) => PageMeasurementRecord {
                url: page.url.clone(),
                error: Some(err.to_string()),
                images: Vec::new(),
            },
        };

        let report = persist_page(page, &record, config, output_dir)?;
        if let Some(sender) = &progress {
            let _ = sender.send(report.clone());
        }
        reports.push(report);
        records.push(record);
    }

    let manifest_path = output_dir.join("measurements.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&records)?)?;

    Ok(BatchResult {
        summary: summarize(&reports),
        reports,
    })
}

/// Synthesize one page's markup and write it out, but only once the whole
/// record is built — a failed page never leaves a partial artifact behind.
fn persist_page(
    page: &PagePlan,
    record: &PageMeasurementRecord,
    config: &EngineConfig,
    output_dir: &Path,
) -> Result<PageReport, BatchError> {
    let blocks: Vec<String> = record
        .images
        .iter()
        .filter_map(|entry| markup::synthesize(entry, config))
        .collect();

    let output_path = if blocks.is_empty() {
        None
    } else {
        let path = output_dir.join(&page.page_name);
        let mut artifact = String::new();
        for block in &blocks {
            artifact.push_str(block);
            artifact.push_str("\n\n");
        }
        fs::write(&path, artifact)?;
        Some(path)
    };

    Ok(PageReport {
        url: page.url.clone(),
        page_name: page.page_name.clone(),
        image_count: record.images.len(),
        above_fold_count: record.images.iter().filter(|i| i.above_fold).count(),
        error: record.error.clone(),
        output_path,
    })
}

fn summarize(reports: &[PageReport]) -> Summary {
    Summary {
        total_pages: reports.len(),
        pages_with_images: reports.iter().filter(|r| r.image_count > 0).count(),
        total_images: reports.iter().map(|r| r.image_count).sum(),
        above_fold_images: reports.iter().map(|r| r.above_fold_count).sum(),
        pages_with_errors: reports.iter().filter(|r| r.error.is_some()).count(),
    }
}
