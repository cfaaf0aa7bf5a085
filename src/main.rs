use clap::{Parser, Subcommand};
use picstitch::breakpoints::EngineConfig;
use picstitch::browser::BrowserHandle;
use picstitch::crawl::PagePlan;
use picstitch::{batch, crawl, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "picstitch")]
#[command(about = "Responsive <picture> markup generator for static sites")]
#[command(long_about = "\
Responsive <picture> markup generator for static sites

Renders each page of a running development server in headless Chromium,
measures how every <picture> image actually displays at mobile, tablet and
desktop viewports, and writes ready-to-paste markup: AVIF/WebP/fallback
sources sized per breakpoint, intrinsic width/height on the fallback <img>,
lazy-loading for everything except above-the-fold images, which get a
preload hint instead.

Pages are discovered by crawling the content directory for .html/.njk files
with a permalink in their frontmatter. Output lands in one file per page
(route slashes become hyphens), next to a measurements.json manifest of the
raw numbers.

The srcset values are {% getUrl ... | resize(...) | format %} directives for
the site's template processor; no pixels are transcoded here.")]
#[command(version)]
struct Cli {
    /// Content directory crawled for routable pages
    #[arg(long, default_value = "src/content", global = true)]
    content_dir: PathBuf,

    /// Directory the generated markup files are written to
    #[arg(long, default_value = "image-optimizations", global = true)]
    output_dir: PathBuf,

    /// Development server the pages are rendered from
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the pages that would be processed, without launching a browser
    Pages,
    /// Measure every page and write its responsive markup
    Run(RunArgs),
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Only process the page with this route (e.g. /about/)
    #[arg(long)]
    page: Option<String>,

    /// Chrome/Chromium executable to launch (auto-detected when omitted)
    #[arg(long)]
    chrome: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pages => {
            let pages = crawl::discover_pages(&cli.content_dir, &cli.base_url);
            output::print_pages_output(&pages);
        }
        Command::Run(args) => {
            // Fail fast on a malformed base URL; every page URL derives from it.
            url::Url::parse(&cli.base_url)?;

            let pages = crawl::discover_pages(&cli.content_dir, &cli.base_url);
            let pages = batch::select_pages(pages, args.page.as_deref())?;
            output::print_pages_output(&pages);

            let runtime = tokio::runtime::Runtime::new()?;
            let result = runtime.block_on(run_batch(
                args.chrome.as_deref(),
                &pages,
                &cli.output_dir,
            ))?;

            output::print_summary(&result.summary);
        }
    }

    Ok(())
}

/// Launch the browser, drive the batch, and print per-page progress from a
/// dedicated printer thread while the browser works on the next page.
async fn run_batch(
    chrome: Option<&Path>,
    pages: &[PagePlan],
    output_dir: &Path,
) -> Result<batch::BatchResult, Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let handle = BrowserHandle::launch(chrome).await?;

    let (sender, receiver) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for (index, report) in receiver.iter().enumerate() {
            output::print_page_report(index + 1, &report);
        }
    });

    let result = batch::process_pages(&handle, pages, &config, output_dir, Some(sender)).await;

    // process_pages dropped the sender, so the printer drains and exits.
    printer.join().unwrap();
    handle.shutdown().await;

    Ok(result?)
}
