use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::wait::{Backoff, Waiter};

static USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:99.0) Gecko/20100101 Firefox/99.0";

/// Phrases identifying a block or challenge page served instead of content.
static BLOCKED: &[&str] = &[
    "access denied",
    "error 403",
    "you don't have permission",
    "attention required",
    "just a moment",
];

/// Anything that can turn a url into page text.
///
/// Failure is never fatal to a crawl: callers skip the url and move on.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unable to fetch {0}")]
    Exhausted(String),
}

/// A single way of getting a page, without retries.
pub trait Source {
    fn get(&self, url: &Url) -> anyhow::Result<String>;
}

/// Plain HTTP GET. Non-2xx responses are errors.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(HttpSource { client })
    }
}

impl Source for HttpSource {
    fn get(&self, url: &Url) -> anyhow::Result<String> {
        let text = self
            .client
            .get(url.as_str())
            .send()?
            .error_for_status()?
            .text()?;
        Ok(text)
    }
}

/// Fetches with a fast primary source, falling back to a slower retried one.
pub struct Fetcher {
    primary: Box<dyn Source>,
    fallback: Box<dyn Source>,
    attempts: u32,
    backoff: Backoff,
    waiter: Waiter,
}

impl Fetcher {
    pub fn new(
        primary: Box<dyn Source>,
        fallback: Box<dyn Source>,
        attempts: u32,
        backoff: Backoff,
        waiter: Waiter,
    ) -> Self {
        Fetcher {
            primary,
            fallback,
            attempts,
            backoff,
            waiter,
        }
    }

    fn fetch_fallback(&self, url: &Url) -> Result<String, FetchError> {
        let mut delays = self.backoff.delays(self.attempts.saturating_sub(1) as usize);
        for attempt in 0..self.attempts {
            if attempt > 0 {
                if let Some(delay) = delays.next().filter(|delay| !delay.is_zero()) {
                    debug!(%url, attempt, ?delay, "backing off");
                    std::thread::sleep(delay);
                }
            }

            match self.fallback.get(url) {
                Ok(text) if is_blocked(&text) => {
                    warn!(%url, attempt, "fallback served a blocked page");
                }
                Ok(text) => {
                    debug!(%url, attempt, "fetched with fallback");
                    return Ok(text);
                }
                Err(e) => warn!(%url, attempt, "fallback failed: {e:#}"),
            }
        }

        Err(FetchError::Exhausted(url.to_string()))
    }
}

impl Fetch for Fetcher {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.waiter.wait();
        debug!(%url, "fetching");

        match self.primary.get(url) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(%url, "request failed, falling back: {e:#}");
                self.fetch_fallback(url)
            }
        }
    }
}

fn is_blocked(text: &str) -> bool {
    let text = text.to_lowercase();
    BLOCKED.iter().any(|phrase| text.contains(phrase))
}
