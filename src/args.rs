use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use crate::config::Languages;

/// Find movie torrents, keep what was found, and hand magnets to a torrent client.
#[derive(Debug, Parser)]
#[command(name = "reelscout", version)]
pub struct Args {
    #[command(flatten)]
    pub settings: Settings,

    /// runs the interactive shell when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct Settings {
    /// site to crawl
    #[arg(long, env = "TORRENT_BASE_URL", default_value = "https://1337x.to")]
    pub base_url: Url,

    /// torrents fully fetched per movie
    #[arg(long, env = "SEARCH_DEPTH", default_value_t = 2)]
    pub search_depth: usize,

    /// comma separated torrent languages to keep
    #[arg(long, env = "SUPPORTED_LANGUAGES", default_value = "English, Spanish")]
    pub languages: Languages,

    /// movie store file
    #[arg(long, env = "MOVIE_STORE_FILE")]
    pub store: Option<PathBuf>,

    /// log file
    #[arg(long, env = "REELSCOUT_LOG")]
    pub log: Option<PathBuf>,

    /// where downloads are saved
    #[arg(long, env = "TORRENT_DOWNLOAD_PATH")]
    pub download_dir: Option<PathBuf>,

    /// torrent client invocation
    ///
    /// `{magnet}` and `{dir}` are replaced before the command is started.
    #[arg(long, env = "DOWNLOAD_COMMAND", default_value = "aria2c --dir={dir} {magnet}")]
    pub download_command: String,

    /// fallback fetch attempts per page
    #[arg(long, env = "FETCH_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// fallback backoff base, in seconds
    #[arg(long, env = "FETCH_BACKOFF", default_value_t = 2.0)]
    pub backoff: f64,

    /// pause between requests, in milliseconds
    #[arg(long, env = "REQUEST_DELAY_MS", default_value_t = 250)]
    pub delay_ms: u64,

    /// chrome or chromium binary for the browser fallback
    #[arg(long, env = "CHROME_BINARY")]
    pub chrome: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Scrape the site for the given movie title
    Search(SearchArgs),

    /// Download the movie with the given id
    Download {
        id: u64,

        /// use a torrent id instead
        #[arg(long)]
        torrent: bool,
    },

    /// Print the summary of the movie with the given id
    Summary { id: u64 },

    /// List the torrents of the movie with the given id
    Torrents { id: u64 },

    /// Display stored movies
    History {
        /// number of movies to display
        #[arg(short = 'n')]
        number: Option<usize>,

        /// sort movies by title
        #[arg(short, long)]
        sort: bool,
    },

    /// Start the interactive shell
    Shell,
}

#[derive(Clone, Debug, clap::Args)]
pub struct SearchArgs {
    /// title of the movie to search for
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,

    /// overwrite stored movies
    #[arg(long)]
    pub refresh: bool,

    /// language to look for among the torrents
    #[arg(short, long)]
    pub language: Option<String>,

    /// minimum number of torrents to explore per movie
    #[arg(short = 'n', long = "files")]
    pub files: Option<usize>,
}

impl SearchArgs {
    pub fn query(&self) -> String {
        self.title.join(" ")
    }
}

/// One line typed into the shell.
#[derive(Debug, Parser)]
#[command(name = "reelscout", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}
