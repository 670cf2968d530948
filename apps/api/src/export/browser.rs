//! Headless-browser PDF engine with a bounded browser pool.
//!
//! # Lifecycle
//! - `checkout` hands out an idle browser after a version probe, or launches a new one.
//! - A lease returns its browser to the pool on drop unless it was marked failed.
//! - Failed or timed-out leases drop the `Browser`, which kills the Chrome process.
//! - `pool_size == 0` disables pooling: every render launches and tears down its own browser.
//!
//! # spawn_blocking pattern
//! `headless_chrome` is a blocking client. Each render runs inside
//! `tokio::task::spawn_blocking`. A single deadline, fixed when the request
//! arrives, bounds the wait for a render slot, the blocking task and each
//! tab call, so an abandoned render releases its browser close to the timeout.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::export::error::ExportError;

const MM_PER_INCH: f64 = 25.4;
/// Pooled browsers sit idle between requests; keep their connection alive well past that.
const POOLED_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Resolves once every `<img>` on the page has loaded or failed.
const WAIT_FOR_IMAGES_JS: &str = r#"Promise.all(Array.from(document.images)
    .filter(img => !img.complete)
    .map(img => new Promise(resolve => { img.onload = img.onerror = resolve; })))
    .then(() => true)"#;

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

/// Printed page size and margins, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
    pub print_background: bool,
}

impl PageGeometry {
    /// A4, 20mm margins on every side, backgrounds on.
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 20.0,
            print_background: true,
        }
    }

    /// Chrome's print API takes inches.
    fn print_options(&self) -> PrintToPdfOptions {
        let margin = self.margin_mm / MM_PER_INCH;
        PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(false),
            print_background: Some(self.print_background),
            paper_width: Some(self.width_mm / MM_PER_INCH),
            paper_height: Some(self.height_mm / MM_PER_INCH),
            margin_top: Some(margin),
            margin_bottom: Some(margin),
            margin_left: Some(margin),
            margin_right: Some(margin),
            prefer_css_page_size: Some(false),
            ..Default::default()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine trait
// ────────────────────────────────────────────────────────────────────────────

/// Turns bound HTML into PDF bytes. Carried as `Arc<dyn PdfEngine>` so the
/// renderer and gateway can be exercised without a Chrome binary.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn print_pdf(&self, html: String, geometry: PageGeometry)
        -> Result<Vec<u8>, ExportError>;
}

/// Settings for the Chrome engine, taken from `ExportConfig` at startup.
#[derive(Debug, Clone)]
pub struct ChromeSettings {
    pub chrome_path: Option<PathBuf>,
    pub pool_size: usize,
    pub render_timeout: Duration,
}

// ────────────────────────────────────────────────────────────────────────────
// Browser pool
// ────────────────────────────────────────────────────────────────────────────

/// Starts browsers for the pool and probes pooled ones before reuse.
trait Launcher: Send + Sync + 'static {
    type Browser: Send + 'static;

    fn launch(&self) -> Result<Self::Browser, ExportError>;
    fn is_alive(&self, browser: &Self::Browser) -> bool;
}

struct ChromeLauncher {
    chrome_path: Option<PathBuf>,
    pooled: bool,
}

impl Launcher for ChromeLauncher {
    type Browser = Browser;

    fn launch(&self) -> Result<Browser, ExportError> {
        let idle_timeout = if self.pooled {
            POOLED_IDLE_TIMEOUT
        } else {
            Duration::from_secs(30)
        };
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .idle_browser_timeout(idle_timeout)
            .build()
            .map_err(|e| ExportError::render(format!("invalid launch options: {e}")))?;

        let browser = Browser::new(options)
            .map_err(|e| ExportError::render(format!("browser launch failed: {e}")))?;
        info!("Launched headless browser");
        Ok(browser)
    }

    fn is_alive(&self, browser: &Browser) -> bool {
        match browser.get_version() {
            Ok(_) => true,
            Err(e) => {
                warn!("Pooled browser failed version probe: {e}");
                false
            }
        }
    }
}

struct BrowserPool<L: Launcher> {
    idle: Mutex<Vec<L::Browser>>,
    capacity: usize,
    launcher: L,
}

impl<L: Launcher> BrowserPool<L> {
    fn new(launcher: L, capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            launcher,
        }
    }

    /// Reuses the most recently returned live browser, or launches a new one.
    /// Dead idle browsers are dropped on the way.
    fn checkout(self: &Arc<Self>) -> Result<BrowserLease<L>, ExportError> {
        loop {
            let candidate = self.idle.lock().ok().and_then(|mut idle| idle.pop());
            let Some(browser) = candidate else {
                break;
            };
            if self.launcher.is_alive(&browser) {
                return Ok(BrowserLease::new(browser, self.clone()));
            }
            debug!("Discarded unhealthy pooled browser");
        }
        Ok(BrowserLease::new(self.launcher.launch()?, self.clone()))
    }

    fn checkin(&self, browser: L::Browser) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.capacity {
                idle.push(browser);
                debug!("Browser returned to pool ({} idle)", idle.len());
                return;
            }
        }
        debug!("Pool full or disabled, tearing down browser");
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }
}

/// Scoped checkout. Dropping the lease either returns the browser or tears it down.
struct BrowserLease<L: Launcher> {
    browser: Option<L::Browser>,
    pool: Arc<BrowserPool<L>>,
    failed: bool,
}

impl<L: Launcher> BrowserLease<L> {
    fn new(browser: L::Browser, pool: Arc<BrowserPool<L>>) -> Self {
        Self {
            browser: Some(browser),
            pool,
            failed: false,
        }
    }

    fn browser(&self) -> Result<&L::Browser, ExportError> {
        self.browser
            .as_ref()
            .ok_or_else(|| ExportError::render("browser lease already released"))
    }

    fn mark_failed(&mut self) {
        self.failed = true;
    }
}

impl<L: Launcher> Drop for BrowserLease<L> {
    fn drop(&mut self) {
        if let Some(browser) = self.browser.take() {
            if self.failed {
                warn!("Tearing down browser after failed render");
            } else {
                self.pool.checkin(browser);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chrome engine
// ────────────────────────────────────────────────────────────────────────────

pub struct ChromePdfEngine {
    pool: Arc<BrowserPool<ChromeLauncher>>,
    permits: Arc<Semaphore>,
    render_timeout: Duration,
}

impl ChromePdfEngine {
    /// Browsers are launched lazily on first use, not here.
    pub fn new(settings: ChromeSettings) -> Self {
        let launcher = ChromeLauncher {
            chrome_path: settings.chrome_path,
            pooled: settings.pool_size > 0,
        };
        Self {
            pool: Arc::new(BrowserPool::new(launcher, settings.pool_size)),
            permits: Arc::new(Semaphore::new(settings.pool_size.max(1))),
            render_timeout: settings.render_timeout,
        }
    }

    #[cfg(test)]
    pub fn idle_browsers(&self) -> usize {
        self.pool.idle_count()
    }
}

#[async_trait]
impl PdfEngine for ChromePdfEngine {
    /// One deadline covers the wait for a render slot, the browser work and
    /// every tab call inside it.
    async fn print_pdf(
        &self,
        html: String,
        geometry: PageGeometry,
    ) -> Result<Vec<u8>, ExportError> {
        let timeout = self.render_timeout;
        let deadline = tokio::time::Instant::now() + timeout;

        let permit = match tokio::time::timeout_at(deadline, self.permits.clone().acquire_owned())
            .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(e)) => return Err(ExportError::render(format!("render queue closed: {e}"))),
            Err(_) => {
                warn!("No render slot free within {}s", timeout.as_secs());
                return Err(ExportError::render(format!(
                    "timed out after {}s waiting for a render slot",
                    timeout.as_secs()
                )));
            }
        };

        let pool = self.pool.clone();
        let std_deadline = deadline.into_std();
        let timed_out = Arc::new(AtomicBool::new(false));
        let timed_out_flag = timed_out.clone();

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut lease = pool.checkout()?;
            let result = lease
                .browser()
                .and_then(|browser| print_html(browser, &html, &geometry, std_deadline));
            if result.is_err() || timed_out_flag.load(Ordering::SeqCst) {
                lease.mark_failed();
            }
            result
        });

        match tokio::time::timeout_at(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExportError::render(format!(
                "render task panicked or was cancelled: {join_err}"
            ))),
            Err(_) => {
                timed_out.store(true, Ordering::SeqCst);
                warn!("PDF render exceeded {}s, abandoning", timeout.as_secs());
                Err(ExportError::render(format!(
                    "render timed out after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Time left before `deadline`; an elapsed deadline is a render failure.
fn remaining(deadline: Instant) -> Result<Duration, ExportError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or_else(|| ExportError::render("render deadline exceeded"))
}

/// Resolves once every `<img>` has loaded or failed, or when `budget` runs out.
fn wait_for_images_js(budget: Duration) -> String {
    format!(
        "Promise.race([{WAIT_FOR_IMAGES_JS}, new Promise(resolve => setTimeout(() => resolve(false), {}))])",
        budget.as_millis()
    )
}

/// Loads `html` in a fresh tab, waits for images, and prints. Each tab call
/// only gets the time left before `deadline`. The tab is closed on every
/// path; the temporary HTML file is removed when `page` drops.
fn print_html(
    browser: &Browser,
    html: &str,
    geometry: &PageGeometry,
    deadline: Instant,
) -> Result<Vec<u8>, ExportError> {
    let mut page = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| ExportError::render(format!("temp file: {e}")))?;
    page.write_all(html.as_bytes())
        .and_then(|_| page.flush())
        .map_err(|e| ExportError::render(format!("temp file write: {e}")))?;
    let url = format!("file://{}", page.path().display());

    let tab = browser
        .new_tab()
        .map_err(|e| ExportError::render(format!("new tab: {e}")))?;

    let printed = (|| -> Result<Vec<u8>, ExportError> {
        tab.set_default_timeout(remaining(deadline)?);
        tab.navigate_to(&url)
            .map_err(|e| ExportError::render(format!("navigate: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| ExportError::render(format!("navigate: {e}")))?;

        let budget = remaining(deadline)?;
        tab.set_default_timeout(budget);
        tab.evaluate(&wait_for_images_js(budget), true)
            .map_err(|e| ExportError::render(format!("image wait: {e}")))?;

        tab.set_default_timeout(remaining(deadline)?);
        tab.print_to_pdf(Some(geometry.print_options()))
            .map_err(|e| ExportError::render(format!("print to pdf: {e}")))
    })();

    if let Err(e) = tab.close(false) {
        debug!("Tab close failed: {e}");
    }

    let bytes = printed?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(ExportError::render("browser returned a non-PDF payload"));
    }
    Ok(bytes)
}
