use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use hashbrown::HashMap;
use tracing::{error, info, warn};
use url::Url;

use crate::model::{Movie, Torrent};

/// Every movie ever scraped, kept in one JSON file.
///
/// Movies are indexed by url (one movie per page) and by id. Ids are derived from the title
/// and url of the first scrape and never change afterwards.
#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
    movies: Vec<Movie>,
    by_url: HashMap<Url, usize>,
    by_id: HashMap<u64, usize>,
    torrents: HashMap<u64, (usize, usize)>,
}

impl Store {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Store {
            path: path.into(),
            movies: Vec::new(),
            by_url: HashMap::new(),
            by_id: HashMap::new(),
            torrents: HashMap::new(),
        }
    }

    /// Load the store at `path`.
    ///
    /// A missing or blank file is an empty store. So is a file that can't be read or doesn't
    /// hold valid movies: the problem is logged and the old contents will be overwritten by
    /// the next flush.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Store::empty(path);

        let text = match fs::read_to_string(&store.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %store.path.display(), "no movie store yet, starting empty");
                return store;
            }
            Err(e) => {
                error!(path = %store.path.display(), "unable to read movie store: {e}");
                return store;
            }
        };

        if text.trim().is_empty() {
            return store;
        }

        match serde_json::from_str::<Vec<Movie>>(&text) {
            Ok(movies) => {
                for movie in movies {
                    store.upsert(movie);
                }
                info!(movies = store.len(), "movie store loaded");
            }
            Err(e) => error!(path = %store.path.display(), "failed to load movie store: {e}"),
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Stored movies, oldest first.
    pub fn list(&self) -> &[Movie] {
        &self.movies
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Movie> {
        self.by_id.get(&id).map(|&index| &self.movies[index])
    }

    pub fn get_by_url(&self, url: &Url) -> Option<&Movie> {
        self.by_url.get(url).map(|&index| &self.movies[index])
    }

    pub fn get_torrent(&self, id: u64) -> Option<&Torrent> {
        self.torrents
            .get(&id)
            .and_then(|&(movie, torrent)| self.movies.get(movie)?.torrents.get(torrent))
    }

    /// Insert a movie, or replace the one stored for the same url.
    ///
    /// A replacement keeps the stored id. Returns the id the movie ends up with.
    pub fn upsert(&mut self, mut movie: Movie) -> u64 {
        let index = match self.by_url.get(movie.url()).copied() {
            Some(index) => {
                let previous = &self.movies[index];
                movie.record.id = previous.id();
                for torrent in &previous.torrents {
                    if self.torrents.get(&torrent.id()).map(|&(owner, _)| owner) == Some(index) {
                        self.torrents.remove(&torrent.id());
                    }
                }
                self.movies[index] = movie;
                index
            }
            None => {
                self.movies.push(movie);
                let index = self.movies.len() - 1;
                self.by_url.insert(self.movies[index].url().clone(), index);
                index
            }
        };

        let movie = &self.movies[index];
        if let Some(&other) = self.by_id.get(&movie.id()) {
            if other != index {
                warn!(
                    id = movie.id(),
                    title = %movie.title,
                    other = %self.movies[other].title,
                    "duplicate movie id"
                );
            }
        }
        self.by_id.insert(movie.id(), index);

        for (position, torrent) in movie.torrents.iter().enumerate() {
            if let Some(&(other, _)) = self.torrents.get(&torrent.id()) {
                if other != index {
                    warn!(
                        id = torrent.id(),
                        title = %movie.title,
                        other = %self.movies[other].title,
                        "duplicate torrent id"
                    );
                }
            }
            self.torrents.insert(torrent.id(), (index, position));
        }

        movie.id()
    }

    /// Write every movie, replacing the file.
    ///
    /// The new contents go to a sibling file first and are renamed into place.
    pub fn flush(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let new_path = new_store_path(&self.path);
        let mut file = File::create(&new_path)?;
        serde_json::to_writer_pretty(&mut file, &self.movies)?;
        file.sync_all()?;
        fs::rename(&new_path, &self.path)
    }
}

fn new_store_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".new");
    path.with_file_name(name)
}
