//! CLI output formatting.
//!
//! Information-first display in a consistent two-level pattern: every entity
//! leads with its positional index and identity, with paths and counts as
//! indented context lines. Each stage has a `format_*` function that returns
//! lines (pure, testable) and a `print_*` wrapper that writes to stdout.

use crate::batch::{PageReport, Summary};
use crate::crawl::PagePlan;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

// ============================================================================
// Page discovery output
// ============================================================================

/// Format the discovered page list.
///
/// ```text
/// Pages to process: 3
/// 001 /about/
///     URL: http://localhost:8080/about/
///     Output: about.html
/// ```
pub fn format_pages_output(pages: &[PagePlan]) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Pages to process: {}", pages.len()));
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), page.permalink));
        lines.push(format!("    URL: {}", page.url));
        lines.push(format!("    Output: {}", page.page_name));
    }
    lines
}

/// Print the page list to stdout.
pub fn print_pages_output(pages: &[PagePlan]) {
    for line in format_pages_output(pages) {
        println!("{}", line);
    }
}

// ============================================================================
// Per-page progress output
// ============================================================================

/// Format one finished page's report.
///
/// ```text
/// 002 http://localhost:8080/about/ (3 images, 1 above the fold)
///     Output: image-optimizations/about.html
/// ```
pub fn format_page_report(index: usize, report: &PageReport) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(ref error) = report.error {
        lines.push(format!("{} {} failed", format_index(index), report.url));
        lines.push(format!("    Error: {}", error));
        return lines;
    }

    let fold_note = match report.above_fold_count {
        0 => String::new(),
        n => format!(", {} above the fold", n),
    };
    lines.push(format!(
        "{} {} ({} images{})",
        format_index(index),
        report.url,
        report.image_count,
        fold_note
    ));
    match &report.output_path {
        Some(path) => lines.push(format!("    Output: {}", path.display())),
        None => lines.push("    No markup written".to_string()),
    }
    lines
}

/// Print one page report to stdout.
pub fn print_page_report(index: usize, report: &PageReport) {
    for line in format_page_report(index, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary output
// ============================================================================

/// Format the aggregate run summary.
pub fn format_summary(summary: &Summary) -> Vec<String> {
    vec![
        "Run complete".to_string(),
        format!("    Pages processed: {}", summary.total_pages),
        format!("    Pages with images: {}", summary.pages_with_images),
        format!("    Images processed: {}", summary.total_images),
        format!("    Above the fold: {}", summary.above_fold_images),
        format!("    Pages with errors: {}", summary.pages_with_errors),
    ]
}

/// Print the run summary to stdout.
pub fn print_summary(summary: &Summary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan(permalink: &str, page_name: &str) -> PagePlan {
        PagePlan {
            source: None,
            permalink: permalink.to_string(),
            page_name: page_name.to_string(),
            url: format!("http://localhost:8080{permalink}"),
        }
    }

    fn report(image_count: usize, above_fold: usize) -> PageReport {
        PageReport {
            url: "http://localhost:8080/about/".to_string(),
            page_name: "about.html".to_string(),
            image_count,
            above_fold_count: above_fold,
            error: None,
            output_path: Some(PathBuf::from("out/about.html")),
        }
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn pages_output_lists_each_page_with_context() {
        let pages = vec![plan("/about/", "about.html"), plan("/", "index.html")];
        let lines = format_pages_output(&pages);
        assert_eq!(lines[0], "Pages to process: 2");
        assert_eq!(lines[1], "001 /about/");
        assert_eq!(lines[2], "    URL: http://localhost:8080/about/");
        assert_eq!(lines[3], "    Output: about.html");
        assert_eq!(lines[4], "002 /");
    }

    #[test]
    fn page_report_shows_counts_and_output() {
        let lines = format_page_report(2, &report(3, 1));
        assert_eq!(
            lines[0],
            "002 http://localhost:8080/about/ (3 images, 1 above the fold)"
        );
        assert_eq!(lines[1], "    Output: out/about.html");
    }

    #[test]
    fn page_report_omits_fold_note_when_zero() {
        let lines = format_page_report(1, &report(2, 0));
        assert_eq!(lines[0], "001 http://localhost:8080/about/ (2 images)");
    }

    #[test]
    fn failed_page_report_shows_the_error() {
        let mut failed = report(0, 0);
        failed.error = Some("navigation failed: timeout".to_string());
        failed.output_path = None;
        let lines = format_page_report(3, &failed);
        assert_eq!(lines[0], "003 http://localhost:8080/about/ failed");
        assert_eq!(lines[1], "    Error: navigation failed: timeout");
    }

    #[test]
    fn page_without_output_says_so() {
        let mut empty = report(0, 0);
        empty.output_path = None;
        let lines = format_page_report(1, &empty);
        assert_eq!(lines[1], "    No markup written");
    }

    #[test]
    fn summary_lists_all_counts() {
        let summary = Summary {
            total_pages: 5,
            pages_with_images: 3,
            total_images: 12,
            above_fold_images: 4,
            pages_with_errors: 1,
        };
        let lines = format_summary(&summary);
        assert_eq!(lines[0], "Run complete");
        assert_eq!(lines[1], "    Pages processed: 5");
        assert_eq!(lines[3], "    Images processed: 12");
        assert_eq!(lines[5], "    Pages with errors: 1");
    }
}
