use hashbrown::{HashMap, HashSet};
use tracing::{debug, error, info, warn};
use url::{form_urlencoded, Url};

use crate::{
    config::Config,
    fetch::Fetch,
    model::{MetaValue, Movie, Torrent, SCRAPED_AT},
    parser::Parser,
    store::Store,
};

/// Options for one search.
#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    /// Re-scrape movies that are already stored.
    pub refresh: bool,
    /// Keep looking through a movie's torrents until one in this language turns up.
    pub language: Option<String>,
    /// Torrents to fully fetch per movie, instead of the configured search depth.
    pub torrents: Option<usize>,
}

/// Movie pages found for a query, in discovery order, with the page text when it was
/// already fetched along the way.
struct Discovery {
    movies: Vec<Url>,
    pages: HashMap<Url, String>,
}

pub struct SearchEngine<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetch,
    parser: &'a Parser,
}

impl<'a> SearchEngine<'a> {
    pub fn new(config: &'a Config, fetcher: &'a dyn Fetch, parser: &'a Parser) -> Self {
        SearchEngine {
            config,
            fetcher,
            parser,
        }
    }

    /// Find the movies matching `query`, merge them into `store` and save it.
    ///
    /// Nothing here fails the whole search: pages that can't be fetched or parsed are logged
    /// and skipped, so the result may simply be smaller.
    pub fn search(&self, query: &str, options: &SearchOptions, store: &mut Store) -> Vec<Movie> {
        let Some(discovery) = self.discover(query) else {
            return Vec::new();
        };
        info!(query, movies = discovery.movies.len(), "movie links discovered");

        let mut movies = Vec::new();
        let mut titles = HashSet::new();
        for url in &discovery.movies {
            let movie = match store.get_by_url(url) {
                Some(stored) if !options.refresh => {
                    debug!(%url, "reusing stored movie");
                    let mut movie = stored.clone();
                    self.backfill_language(&mut movie, options);
                    movie
                }
                _ => match self.assemble(url, discovery.pages.get(url), options) {
                    Some(movie) => movie,
                    None => continue,
                },
            };

            let id = store.upsert(movie);
            let Some(movie) = store.get_by_id(id).filter(|movie| movie.url() == url) else {
                continue;
            };
            if titles.insert(movie.dedup_key().to_string()) {
                movies.push(movie.clone());
            } else {
                debug!(title = %movie.title, %url, "duplicate title collapsed");
            }
        }

        if let Err(e) = store.flush() {
            error!(path = %store.path().display(), "unable to save movie store: {e}");
        }

        movies
    }

    pub fn search_url(&self, query: &str) -> Option<Url> {
        let query: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
        self.parser
            .base_url()
            .join(&format!("/sort-category-search/{query}/Movies/seeders/desc/1/"))
            .ok()
    }

    /// Turn a query into movie pages by following each result's link to its movie.
    ///
    /// Once a movie page is fetched, all of its torrents are dropped from the work list: they
    /// would only lead back to the same movie. `None` means the search page itself failed.
    fn discover(&self, query: &str) -> Option<Discovery> {
        let search_url = self.search_url(query)?;
        let text = match self.fetcher.fetch(&search_url) {
            Ok(text) => text,
            Err(e) => {
                warn!(query, "{e}");
                return None;
            }
        };

        let mut pending = self.parser.parse_search_results(&text);
        if pending.is_empty() {
            info!(query, "no results");
            return None;
        }

        let mut discovery = Discovery {
            movies: Vec::new(),
            pages: HashMap::new(),
        };

        while !pending.is_empty() {
            let url = pending.remove(0);
            let text = match self.fetcher.fetch(&url) {
                Ok(text) => text,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };

            let Some(movie_url) = self.parser.parse_movie_link(&text) else {
                debug!(%url, "torrent has no movie page");
                continue;
            };
            if discovery.pages.contains_key(&movie_url) {
                continue;
            }

            let movie_text = match self.fetcher.fetch(&movie_url) {
                Ok(text) => text,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };

            let covered: HashSet<Url> = self
                .parser
                .parse_movie_torrent_links(&movie_text)
                .into_iter()
                .collect();
            pending.retain(|url| !covered.contains(url));

            discovery.movies.push(movie_url.clone());
            discovery.pages.insert(movie_url, movie_text);
        }

        Some(discovery)
    }

    /// Scrape a movie and the best seeded of its torrents.
    fn assemble(&self, url: &Url, page: Option<&String>, options: &SearchOptions) -> Option<Movie> {
        let fetched;
        let text = match page {
            Some(text) => text,
            None => {
                fetched = self.fetcher.fetch(url).map_err(|e| warn!("{e}")).ok()?;
                &fetched
            }
        };

        let page = match self.parser.parse_movie(text, url) {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, "movie skipped: {e}");
                return None;
            }
        };

        let mut movie = page.movie;
        let depth = options.torrents.unwrap_or(self.config.search_depth);
        for torrent_url in page.ranked.iter().take(depth) {
            if let Some(torrent) = self.fetch_torrent(torrent_url) {
                movie.torrents.push(torrent);
            }
        }
        movie.record.metadata.insert(
            SCRAPED_AT.into(),
            MetaValue::Text(chrono::Utc::now().to_rfc3339()),
        );

        self.backfill_language(&mut movie, options);
        info!(
            title = %movie.title,
            torrents = movie.torrents.len(),
            candidates = movie.torrents_count,
            "movie assembled"
        );
        Some(movie)
    }

    /// Fetch torrents past the search depth, best seeded first, until one in the requested
    /// language is accepted or there are no candidates left.
    fn backfill_language(&self, movie: &mut Movie, options: &SearchOptions) {
        let Some(language) = options.language.as_deref() else {
            return;
        };
        if movie.has_language(language) {
            return;
        }

        let known: HashSet<Url> = movie
            .torrents
            .iter()
            .map(|torrent| torrent.record.url.clone())
            .collect();
        let depth = options.torrents.unwrap_or(self.config.search_depth);

        for url in movie.ranked_torrent_links().into_iter().skip(depth) {
            if known.contains(&url) {
                continue;
            }
            let Some(torrent) = self.fetch_torrent(&url) else {
                continue;
            };
            if unicase::eq(torrent.language.as_str(), language) {
                debug!(title = %movie.title, %url, language, "language found past search depth");
                movie.torrents.push(torrent);
                return;
            }
        }

        debug!(title = %movie.title, language, "language not available");
    }

    fn fetch_torrent(&self, url: &Url) -> Option<Torrent> {
        let text = self.fetcher.fetch(url).map_err(|e| warn!("{e}")).ok()?;
        match self.parser.parse_torrent(&text, url, &self.config.languages) {
            Ok(torrent) => torrent,
            Err(e) => {
                warn!(%url, "torrent rejected: {e}");
                None
            }
        }
    }
}
