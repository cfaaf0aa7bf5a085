//! Shared test scaffolding: a scriptable [`PageDriver`] and friends.
//!
//! The mock drivers script what the browser collaborator would report per
//! URL and per viewport, so orchestrator and batch tests run without a
//! browser and without sleeping through settle delays.

use crate::breakpoints::EngineConfig;
use crate::browser::{DriverError, ElementRect, PageDriver, PictureCandidate, SessionFactory};
use std::collections::HashMap;
use std::time::Duration;

/// An [`EngineConfig`] with the settle delay zeroed so tests don't sleep.
pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        settle_delay: Duration::ZERO,
        ..EngineConfig::default()
    }
}

pub(crate) fn candidate(src: &str, alt: &str, class: &str) -> PictureCandidate {
    PictureCandidate {
        img_src: Some(src.to_string()),
        alt: alt.to_string(),
        class_name: class.to_string(),
    }
}

/// A `<picture>` with no `<img>` child.
pub(crate) fn imgless_candidate() -> PictureCandidate {
    PictureCandidate {
        img_src: None,
        alt: String::new(),
        class_name: String::new(),
    }
}

pub(crate) fn rect(top: f64, bottom: f64, width: u32, height: u32) -> Option<ElementRect> {
    Some(ElementRect {
        top,
        bottom,
        width,
        height,
    })
}

/// What the mock serves for one URL.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScript {
    pub fail_navigation: bool,
    pub candidates: Vec<PictureCandidate>,
    /// Viewport key (`"320x675"`) → rects in DOM order.
    pub rects: HashMap<String, Vec<Option<ElementRect>>>,
}

/// Scriptable page session. Serves whichever URL it is navigated to from
/// its script table and records every viewport change.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockPage {
    pub scripts: HashMap<String, PageScript>,
    pub current_url: String,
    pub viewport: String,
    pub viewport_log: Vec<String>,
}

impl MockPage {
    pub(crate) fn single(url: &str, script: PageScript) -> Self {
        let mut scripts = HashMap::new();
        scripts.insert(url.to_string(), script);
        Self {
            scripts,
            ..Self::default()
        }
    }

    fn script(&self) -> PageScript {
        self.scripts
            .get(&self.current_url)
            .cloned()
            .unwrap_or_default()
    }
}

impl PageDriver for MockPage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let script = self.scripts.get(url).cloned().unwrap_or_default();
        if script.fail_navigation {
            return Err(DriverError::Navigation(format!(
                "net::ERR_CONNECTION_REFUSED at {url}"
            )));
        }
        self.current_url = url.to_string();
        Ok(())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        self.viewport = format!("{width}x{height}");
        self.viewport_log.push(self.viewport.clone());
        Ok(())
    }

    async fn discover(&mut self) -> Result<Vec<PictureCandidate>, DriverError> {
        Ok(self.script().candidates)
    }

    async fn measure(&mut self) -> Result<Vec<Option<ElementRect>>, DriverError> {
        Ok(self
            .script()
            .rects
            .get(&self.viewport)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Session factory handing out [`MockPage`]s that share one script table.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockFactory {
    pub scripts: HashMap<String, PageScript>,
}

impl MockFactory {
    pub(crate) fn with_page(mut self, url: &str, script: PageScript) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }
}

impl SessionFactory for MockFactory {
    type Session = MockPage;

    async fn open_page(&self) -> Result<MockPage, DriverError> {
        Ok(MockPage {
            scripts: self.scripts.clone(),
            ..MockPage::default()
        })
    }
}
