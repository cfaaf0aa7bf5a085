//! Breakpoint catalog and engine configuration.
//!
//! The catalog is the fixed, ordered list of viewports every page is measured
//! at. Ordering is significant twice over: it drives the orchestrator's
//! measurement order, and the synthesizer's `<source>` emission order
//! (max-width queries first, then min-width). The narrowest entry doubles as
//! the fold viewport.
//!
//! All tunables live in [`EngineConfig`] and are passed explicitly into the
//! measurement and synthesis passes, so tests can inject their own catalog
//! instead of fighting module-wide constants.

use std::time::Duration;

/// A named viewport the engine measures against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Display name, used in the `<!--Mobile Image-->` style source comments.
    pub name: String,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Media query emitted for this breakpoint's `<source>` lines.
    pub media_query: String,
}

impl Breakpoint {
    pub fn new(name: &str, width: u32, height: u32, media_query: &str) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            media_query: media_query.to_string(),
        }
    }

    /// Composite key identifying this viewport in measurement records.
    pub fn key(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Everything the measurement and synthesis passes need to know.
///
/// The `breakpoints` list is ordered narrow to wide and must hold at least
/// two entries: the first is the fold viewport, the last is the desktop
/// entry the fallback `<img>` is sized from.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub breakpoints: Vec<Breakpoint>,
    /// Synthetic breakpoint inserted between tablet and desktop for images
    /// whose desktop box collapses to a 1x1 placeholder.
    pub intermediate: Breakpoint,
    /// Media query the desktop source narrows to when the intermediate
    /// breakpoint is inserted.
    pub narrowed_desktop_query: String,
    /// Hard cap on synthesized source width.
    pub max_scaled_width: u32,
    /// Pause after each viewport change so responsive layout can settle.
    pub settle_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                Breakpoint::new("Mobile", 320, 675, "(max-width: 600px)"),
                Breakpoint::new("Tablet", 1024, 800, "(max-width: 1024px)"),
                Breakpoint::new("Desktop", 1920, 1080, "(min-width: 1024px)"),
            ],
            intermediate: Breakpoint::new(
                "Large Tablet",
                1440,
                900,
                "(min-width: 1024px) and (max-width: 1500px)",
            ),
            narrowed_desktop_query: "(min-width: 1500px)".to_string(),
            max_scaled_width: 2500,
            settle_delay: Duration::from_millis(300),
        }
    }
}

impl EngineConfig {
    /// The narrowest breakpoint: fold classification happens here.
    pub fn mobile(&self) -> &Breakpoint {
        &self.breakpoints[0]
    }

    /// The breakpoint right below desktop; the intermediate breakpoint
    /// borrows its dimensions when it has no measurement of its own.
    pub fn tablet(&self) -> &Breakpoint {
        &self.breakpoints[self.breakpoints.len() - 2]
    }

    /// The widest breakpoint; sizes the fallback `<img>`.
    pub fn desktop(&self) -> &Breakpoint {
        &self.breakpoints[self.breakpoints.len() - 1]
    }
}
