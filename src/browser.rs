use std::{cell::OnceCell, path::PathBuf};

use anyhow::anyhow;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info};
use url::Url;

use crate::fetch::Source;

/// Renders pages in headless Chrome, for sites that answer plain requests with a challenge.
///
/// The browser is launched on first use and reused for the rest of the process.
pub struct BrowserSource {
    binary: Option<PathBuf>,
    browser: OnceCell<Browser>,
}

impl BrowserSource {
    pub fn new(binary: Option<PathBuf>) -> Self {
        BrowserSource {
            binary,
            browser: OnceCell::new(),
        }
    }

    fn browser(&self) -> anyhow::Result<&Browser> {
        if let Some(browser) = self.browser.get() {
            return Ok(browser);
        }

        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((1920, 1080)))
            .path(self.binary.clone())
            .build()
            .map_err(|e| anyhow!("bad browser options: {e}"))?;
        let browser = Browser::new(options)?;
        info!("headless browser started");

        Ok(self.browser.get_or_init(|| browser))
    }
}

impl Source for BrowserSource {
    fn get(&self, url: &Url) -> anyhow::Result<String> {
        let tab = self.browser()?.new_tab()?;
        load_then_close(
            url,
            || {
                tab.navigate_to(url.as_str())?;
                tab.wait_until_navigated()?;
                tab.get_content()
            },
            || tab.close(true).map(drop),
        )
    }
}

/// Run `load`, then `close` whatever `load` returned. The browser outlives every tab.
fn load_then_close<T>(
    url: &Url,
    load: impl FnOnce() -> anyhow::Result<T>,
    close: impl FnOnce() -> anyhow::Result<()>,
) -> anyhow::Result<T> {
    let loaded = load();
    if let Err(e) = close() {
        debug!(%url, "unable to close tab: {e}");
    }
    loaded
}
