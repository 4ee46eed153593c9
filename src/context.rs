use crate::{
    config::Config,
    fetch::{Fetcher, HttpSource, Source},
    parser::Parser,
    wait::{Backoff, Waiter},
};

/// Long lived pieces shared by every command: settings, the fetcher and the page parser.
pub struct Context {
    pub config: Config,
    pub fetcher: Fetcher,
    pub parser: Parser,
}

impl Context {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let primary = HttpSource::new(config.timeout)?;
        let fetcher = Fetcher::new(
            Box::new(primary),
            build_fallback(&config)?,
            config.retries,
            Backoff::new(config.backoff_base),
            Waiter::new(config.request_delay),
        );

        Ok(Context {
            parser: Parser::new(config.base_url.clone()),
            fetcher,
            config,
        })
    }
}

#[cfg(feature = "browser")]
fn build_fallback(config: &Config) -> anyhow::Result<Box<dyn Source>> {
    Ok(Box::new(crate::browser::BrowserSource::new(
        config.chrome_binary.clone(),
    )))
}

#[cfg(not(feature = "browser"))]
fn build_fallback(config: &Config) -> anyhow::Result<Box<dyn Source>> {
    // The fallback may be slower than the primary.
    let timeout = std::time::Duration::from_secs(30).max(config.timeout);
    if config.chrome_binary.is_some() {
        tracing::warn!("built without browser support, ignoring the chrome binary");
    }
    Ok(Box::new(HttpSource::new(timeout)?))
}
