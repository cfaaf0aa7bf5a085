//! Browser collaborator boundary.
//!
//! The engine consumes the browser as a capability: navigate, set the
//! viewport, enumerate `<picture>` candidates, read their rendered boxes.
//! [`PageDriver`] is that seam; [`ChromiumPage`] is the production
//! implementation driving headless Chromium over CDP.
//!
//! Element handles never cross the boundary. Discovery and measurement each
//! run one script per call and index their results by DOM position, which is
//! also what gives images their positional ids downstream.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("failed to open page session: {0}")]
    Session(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("viewport change failed: {0}")]
    Viewport(String),
    #[error("page evaluation failed: {0}")]
    Evaluation(String),
    #[error("failed to close page session: {0}")]
    Close(String),
}

/// One `<picture>` element found on the page, in DOM order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PictureCandidate {
    /// Resolved `src` of the nested `<img>`; `None` when the picture has no
    /// image child.
    #[serde(rename = "src")]
    pub img_src: Option<String>,
    #[serde(default)]
    pub alt: String,
    /// Class attribute of the `<picture>` element, empty when unset.
    #[serde(default, rename = "className")]
    pub class_name: String,
}

/// Bounding box of a picture's `<img>` at the current viewport, in CSS
/// pixels. `top`/`bottom` are relative to the viewport, so they classify
/// fold state; `width`/`height` are already rounded by the page script.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ElementRect {
    pub top: f64,
    pub bottom: f64,
    pub width: u32,
    pub height: u32,
}

/// The capability the measurement orchestrator consumes. One implementor
/// drives a real browser page; tests script their own.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigate and wait until the page has finished loading.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Emulate a viewport of the given CSS-pixel size.
    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError>;

    /// Every `<picture>` element on the page, in DOM order.
    async fn discover(&mut self) -> Result<Vec<PictureCandidate>, DriverError>;

    /// Bounding boxes for every `<picture>`'s image, in the same DOM order
    /// as [`discover`](Self::discover). `None` marks a picture whose box
    /// could not be read.
    async fn measure(&mut self) -> Result<Vec<Option<ElementRect>>, DriverError>;

    /// Release the underlying page.
    async fn close(self) -> Result<(), DriverError>;
}

/// Supplies one fresh page session per measured page. The batch driver opens
/// and closes a session around every page so no viewport state leaks between
/// pages.
#[allow(async_fn_in_trait)]
pub trait SessionFactory {
    type Session: PageDriver;

    async fn open_page(&self) -> Result<Self::Session, DriverError>;
}

/// Headless Chromium instance with its CDP event handler running on a
/// background task.
pub struct BrowserHandle {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// Launch headless Chromium. `chrome_path` overrides executable
    /// discovery.
    pub async fn launch(chrome_path: Option<&Path>) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--force-device-scale-factor=1")
            .arg("--hide-scrollbars")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if let Some(path) = chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| DriverError::Launch(err.to_string()))?;

        // Chromium events must be drained for the whole browser lifetime or
        // every CDP call stalls.
        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    log::debug!("browser event error: {err:?}");
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Shut the browser down and stop the event handler.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.browser.close().await {
            log::debug!("browser close failed: {err}");
        }
        self.handler_task.abort();
    }
}

impl SessionFactory for BrowserHandle {
    type Session = ChromiumPage;

    async fn open_page(&self) -> Result<ChromiumPage, DriverError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| DriverError::Session(err.to_string()))?;
        Ok(ChromiumPage { page })
    }
}

/// Production [`PageDriver`] backed by a chromiumoxide [`Page`].
pub struct ChromiumPage {
    page: Page,
}

/// Lists every `<picture>` with its image's resolved src, alt text and the
/// picture's class. Pictures without an `<img>` child report a null src.
const DISCOVER_SCRIPT: &str = r#"
(function () {
    var pictures = document.querySelectorAll("picture");
    var out = [];
    for (var i = 0; i < pictures.length; i++) {
        var img = pictures[i].querySelector("img");
        out.push({
            src: img ? String(img.src || "") : null,
            alt: img ? String(img.alt || "") : "",
            className: String(pictures[i].className || "")
        });
    }
    return JSON.stringify(out);
})()
"#;

/// Reads every picture image's bounding box at the current viewport. A
/// per-element failure yields null for that slot instead of failing the
/// whole batch.
const MEASURE_SCRIPT: &str = r#"
(function () {
    var pictures = document.querySelectorAll("picture");
    var out = [];
    for (var i = 0; i < pictures.length; i++) {
        var img = pictures[i].querySelector("img");
        if (!img) {
            out.push(null);
            continue;
        }
        try {
            var rect = img.getBoundingClientRect();
            out.push({
                top: rect.top,
                bottom: rect.bottom,
                width: Math.round(rect.width),
                height: Math.round(rect.height)
            });
        } catch (err) {
            out.push(null);
        }
    }
    return JSON.stringify(out);
})()
"#;

impl ChromiumPage {
    /// Run a script that returns a JSON string and hand the string back.
    async fn eval_json(&self, script: &str) -> Result<String, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|err| DriverError::Evaluation(err.to_string()))?;
        let value = result
            .value()
            .ok_or_else(|| DriverError::Evaluation("evaluation returned no value".to_string()))?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| DriverError::Evaluation("evaluation returned a non-string".to_string()))
    }
}

impl PageDriver for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|err| DriverError::Navigation(err.to_string()))?;
        // Scripts evaluated before the load completes hang the session.
        self.page
            .wait_for_navigation()
            .await
            .map_err(|err| DriverError::Navigation(err.to_string()))?;
        Ok(())
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(DriverError::Viewport)?;
        self.page
            .execute(params)
            .await
            .map_err(|err| DriverError::Viewport(err.to_string()))?;
        Ok(())
    }

    async fn discover(&mut self) -> Result<Vec<PictureCandidate>, DriverError> {
        let json = self.eval_json(DISCOVER_SCRIPT).await?;
        serde_json::from_str(&json).map_err(|err| DriverError::Evaluation(err.to_string()))
    }

    async fn measure(&mut self) -> Result<Vec<Option<ElementRect>>, DriverError> {
        let json = self.eval_json(MEASURE_SCRIPT).await?;
        serde_json::from_str(&json).map_err(|err| DriverError::Evaluation(err.to_string()))
    }

    async fn close(self) -> Result<(), DriverError> {
        self.page
            .close()
            .await
            .map_err(|err| DriverError::Close(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The deserialization shapes are the contract with the page scripts;
    // these mirror what DISCOVER_SCRIPT and MEASURE_SCRIPT emit.

    #[test]
    fn candidate_deserializes_from_script_shape() {
        let json = r#"[
            {"src": "http://localhost:8080/assets/img/hero.png", "alt": "Hero", "className": "cs-picture"},
            {"src": null, "alt": "", "className": ""}
        ]"#;
        let candidates: Vec<PictureCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].img_src.as_deref(),
            Some("http://localhost:8080/assets/img/hero.png")
        );
        assert_eq!(candidates[0].class_name, "cs-picture");
        assert_eq!(candidates[1].img_src, None);
    }

    #[test]
    fn rect_deserializes_with_nulls_for_failed_slots() {
        let json = r#"[{"top": -12.5, "bottom": 80.25, "width": 160, "height": 90}, null]"#;
        let rects: Vec<Option<ElementRect>> = serde_json::from_str(json).unwrap();
        assert_eq!(rects.len(), 2);
        let rect = rects[0].unwrap();
        assert_eq!(rect.width, 160);
        assert!(rect.top < 0.0);
        assert!(rects[1].is_none());
    }
}
