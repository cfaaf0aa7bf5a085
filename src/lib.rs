//! # Picstitch
//!
//! Measures how a site's images actually render at a set of viewport
//! breakpoints and synthesizes the responsive `<picture>` markup for them:
//! multi-format sources, per-breakpoint dimensions, and preload hints for
//! above-the-fold images. The emitted `srcset` values are
//! `{% getUrl ... | resize(...) | <format> %}` directives — the actual
//! transcoding happens downstream in the site's template processor.
//!
//! # Architecture: Measure, Reduce, Synthesize
//!
//! ```text
//! 1. Crawl       content/   →  page list        (permalink frontmatter)
//! 2. Measure     browser    →  raw geometry     (one session per page)
//! 3. Reduce      geometry   →  scaled targets   (pure)
//! 4. Synthesize  targets    →  markup blocks    (pure)
//! 5. Persist     blocks     →  <route>.html + measurements.json + summary
//! ```
//!
//! Only step 2 touches the outside world, and it does so through the
//! [`browser::PageDriver`] capability — navigation, viewport emulation and
//! geometry reads are the system's only suspension points. Steps 3 and 4 are
//! pure functions, which is where all the decision logic (clamping rules,
//! fold classification, breakpoint selection, format fallback) lives and
//! gets tested.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`breakpoints`] | Viewport catalog and the engine's tunables (`EngineConfig`) |
//! | [`browser`] | Browser capability trait + the headless Chromium implementation |
//! | [`crawl`] | Content-directory walk and permalink-based page discovery |
//! | [`measure`] | Per-page orchestration: discovery, fold pass, breakpoint loop |
//! | [`reduce`] | Pure geometry reduction: clamping, 2x scaling, width cap |
//! | [`markup`] | Pure markup synthesis: sources, fallback `<img>`, preload |
//! | [`batch`] | Sequential page loop, persistence, summary aggregation |
//! | [`output`] | CLI reporting — pure `format_*` functions with `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## String-Rendered Markup
//!
//! The markup block is a byte-exact boundary contract: literal `{% %}`
//! delimiters, nested unescaped quotes in `srcset`, tab indentation. An HTML
//! builder would escape the directive's inner quotes, so [`markup`] renders
//! with plain string formatting and locks the shape down with tests.
//!
//! ## One Browser Session Per Page
//!
//! Viewport emulation is stateful and serial, so pages are processed
//! sequentially with a fresh page session each — no measurement ever sees
//! another page's viewport churn. The reduction/synthesis stages never
//! suspend, so there is nothing to parallelize that would pay for the extra
//! browser sessions.
//!
//! ## Maximal Partial Progress
//!
//! An unreachable page is recorded and skipped; a single failed geometry
//! read leaves one breakpoint absent; both surface only in the summary
//! counts. Only an unresolvable `--page` request and filesystem failures
//! abort a run.
//!
//! ## Positional Image Identity
//!
//! Images are keyed `image-<i>` by surviving DOM discovery order. The id is
//! not stable across re-renders that reorder the DOM; a content-addressed
//! key would fix that at the cost of coupling to source URLs, which
//! duplicate freely on real pages.

pub mod batch;
pub mod breakpoints;
pub mod browser;
pub mod crawl;
pub mod markup;
pub mod measure;
pub mod output;
pub mod reduce;

#[cfg(test)]
pub(crate) mod test_helpers;
