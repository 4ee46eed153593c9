use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context as _;
use directories::{ProjectDirs, UserDirs};
use thiserror::Error;
use unicase::UniCase;
use url::Url;

use crate::args::Settings;

/// Languages a torrent may be in to be kept. Matching ignores case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Languages(Vec<UniCase<String>>);

impl Languages {
    pub fn contains(&self, language: &str) -> bool {
        let language = UniCase::new(language.trim().to_string());
        self.0.contains(&language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|language| language.as_str())
    }
}

impl FromStr for Languages {
    type Err = EmptyLanguages;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let languages: Vec<_> = s
            .split(',')
            .map(str::trim)
            .filter(|language| !language.is_empty())
            .map(|language| UniCase::new(language.to_string()))
            .collect();

        if languages.is_empty() {
            Err(EmptyLanguages)
        } else {
            Ok(Languages(languages))
        }
    }
}

impl fmt::Display for Languages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().collect();
        f.write_str(&names.join(", "))
    }
}

#[derive(Clone, Copy, Debug, Error)]
#[error("at least one supported language is required")]
pub struct EmptyLanguages;

/// Everything the crawler needs to know, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub search_depth: usize,
    pub languages: Languages,
    pub store_path: PathBuf,
    pub log_path: PathBuf,
    pub download_dir: PathBuf,
    pub download_command: String,
    pub timeout: Duration,
    pub retries: u32,
    pub backoff_base: f64,
    pub request_delay: Duration,
    pub chrome_binary: Option<PathBuf>,
}

impl Config {
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let data_dir = || {
            ProjectDirs::from("", "", "reelscout")
                .map(|dirs| dirs.data_dir().to_owned())
                .context("unable to locate a data directory")
        };

        let store_path = match settings.store {
            Some(path) => path,
            None => data_dir()?.join("movies.json"),
        };
        let log_path = match settings.log {
            Some(path) => path,
            None => data_dir()?.join("reelscout.log"),
        };
        let download_dir = match settings.download_dir {
            Some(path) => path,
            None => default_download_dir()?,
        };

        Ok(Config {
            base_url: settings.base_url,
            search_depth: settings.search_depth,
            languages: settings.languages,
            store_path,
            log_path,
            download_dir,
            download_command: settings.download_command,
            timeout: Duration::from_secs(10),
            retries: settings.retries,
            backoff_base: settings.backoff,
            request_delay: Duration::from_millis(settings.delay_ms),
            chrome_binary: settings.chrome,
        })
    }
}

fn default_download_dir() -> anyhow::Result<PathBuf> {
    let directories = UserDirs::new().context("user dirs not found")?;
    Ok(directories
        .download_dir()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| directories.home_dir().join("Downloads")))
}
