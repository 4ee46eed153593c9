use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    genre::Genre,
    identity::generate_id,
    magnet::MagnetLink,
    units::{RelativeDate, Size},
};

/// Metadata key holding a movie's torrent pages, best seeded first.
pub const TORRENT_LINKS: &str = "torrent_links";
pub const SCRAPED_AT: &str = "scraped_at";
pub const UPLOADER: &str = "uploader";
pub const DOWNLOADS: &str = "downloads";
pub const TAGS: &str = "tags";
pub const KIND: &str = "type";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// Identity shared by movies and torrents.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Record {
    pub id: u64,
    pub url: Url,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    pub fn new(title: &str, url: Url) -> Self {
        Record {
            id: generate_id(title, url.as_str()),
            url,
            metadata: Metadata::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Comment {
    pub user: String,
    pub message: String,
    pub date: RelativeDate,
}

/// Download links for the `.torrent` file itself. Never empty.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<Url>", into = "Vec<Url>")]
pub struct TorrentLinks(Vec<Url>);

impl TorrentLinks {
    pub fn as_slice(&self) -> &[Url] {
        &self.0
    }
}

impl TryFrom<Vec<Url>> for TorrentLinks {
    type Error = InvalidTorrentLinks;

    fn try_from(links: Vec<Url>) -> Result<Self, Self::Error> {
        if links.is_empty() {
            return Err(InvalidTorrentLinks::Empty);
        }

        for link in &links {
            if !matches!(link.scheme(), "http" | "https") {
                return Err(InvalidTorrentLinks::Scheme(link.to_string()));
            }
            let path = link.path();
            if !path.ends_with(".torrent") && !path.contains("torrent") {
                return Err(InvalidTorrentLinks::Path(link.to_string()));
            }
        }

        Ok(TorrentLinks(links))
    }
}

impl From<TorrentLinks> for Vec<Url> {
    fn from(links: TorrentLinks) -> Self {
        links.0
    }
}

#[derive(Clone, Debug, Error)]
pub enum InvalidTorrentLinks {
    #[error("no .torrent links provided")]
    Empty,
    #[error("invalid torrent link (bad scheme): {0}")]
    Scheme(String),
    #[error("invalid torrent link format: {0}")]
    Path(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Torrent {
    #[serde(flatten)]
    pub record: Record,
    pub title: String,
    pub category: Option<String>,
    pub language: String,
    pub date: Option<RelativeDate>,
    pub size: Option<Size>,
    #[serde(default)]
    pub seeders: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub magnet_link: MagnetLink,
    pub torrent_links: TorrentLinks,
}

impl Torrent {
    pub fn id(&self) -> u64 {
        self.record.id
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Movie {
    #[serde(flatten)]
    pub record: Record,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
    pub summary: String,
    pub poster: Option<Url>,
    /// Percentage, 0 to 100.
    pub rating: Option<f64>,
    pub torrents: Vec<Torrent>,
    pub torrents_count: usize,
}

impl Movie {
    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn url(&self) -> &Url {
        &self.record.url
    }

    /// Key used to collapse crawl results.
    ///
    /// Two movies with the same title are treated as one while collecting a search, even if
    /// they come from different pages. The store never uses this key.
    pub fn dedup_key(&self) -> &str {
        &self.title
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.torrents
            .iter()
            .any(|torrent| unicase::eq(torrent.language.as_str(), language))
    }

    /// Distinct torrent languages, in torrent order.
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = Vec::new();
        for torrent in &self.torrents {
            if !languages
                .iter()
                .any(|known| unicase::eq(*known, torrent.language.as_str()))
            {
                languages.push(&torrent.language);
            }
        }
        languages
    }

    /// Every torrent page discovered for this movie, best seeded first.
    pub fn ranked_torrent_links(&self) -> Vec<Url> {
        match self.record.metadata.get(TORRENT_LINKS) {
            Some(MetaValue::List(links)) => links
                .iter()
                .filter_map(|link| Url::parse(link).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{MetaValue, TorrentLinks, TORRENT_LINKS};
    use crate::fixtures;

    #[test]
    fn torrent_links_must_not_be_empty() {
        assert!(TorrentLinks::try_from(Vec::new()).is_err());
    }

    #[test]
    fn torrent_links_must_point_at_torrent_files() {
        let good = vec![Url::parse("https://itorrents.org/torrent/ABCDEF.torrent").unwrap()];
        assert!(TorrentLinks::try_from(good).is_ok());

        let ftp = vec![Url::parse("ftp://itorrents.org/file.torrent").unwrap()];
        assert!(TorrentLinks::try_from(ftp).is_err());

        let page = vec![Url::parse("https://example.com/index.html").unwrap()];
        assert!(TorrentLinks::try_from(page).is_err());
    }

    #[test]
    fn movie_serializes_record_fields_at_top_level() {
        let movie = fixtures::movie("Inception (2010)", "https://1337x.to/movie/1/inception/");
        let value = serde_json::to_value(&movie).unwrap();

        assert_eq!(value["id"], serde_json::json!(movie.id()));
        assert_eq!(value["url"], "https://1337x.to/movie/1/inception/");
        assert!(value.get("record").is_none());
        assert_eq!(value["torrents"][0]["magnet_link"], fixtures::MAGNET);
    }

    #[test]
    fn metadata_values_keep_their_shape() {
        let json = r#"{"a": 1, "b": 1.5, "c": "text", "d": ["x", "y"]}"#;
        let metadata: super::Metadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata["a"], MetaValue::Integer(1));
        assert_eq!(metadata["b"], MetaValue::Float(1.5));
        assert_eq!(metadata["c"], MetaValue::Text("text".into()));
        assert_eq!(
            metadata["d"],
            MetaValue::List(vec!["x".into(), "y".into()])
        );
    }

    #[test]
    fn dedup_key_is_the_title() {
        let a = fixtures::movie("Heat", "https://1337x.to/movie/2/heat/");
        let b = fixtures::movie("Heat", "https://1337x.to/movie/3/heat-1995/");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn ranked_links_come_from_metadata() {
        let mut movie = fixtures::movie("Heat", "https://1337x.to/movie/2/heat/");
        movie.record.metadata.insert(
            TORRENT_LINKS.into(),
            MetaValue::List(vec![
                "https://1337x.to/torrent/10/heat/".into(),
                "not a url".into(),
            ]),
        );

        let links = movie.ranked_torrent_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://1337x.to/torrent/10/heat/");
    }

    #[test]
    fn languages_are_distinct() {
        let mut movie = fixtures::movie("Heat", "https://1337x.to/movie/2/heat/");
        let mut second = movie.torrents[0].clone();
        second.language = "english".into();
        let mut third = movie.torrents[0].clone();
        third.language = "Spanish".into();
        movie.torrents.extend([second, third]);

        assert_eq!(movie.languages(), vec!["English", "Spanish"]);
        assert!(movie.has_language("SPANISH"));
        assert!(!movie.has_language("French"));
    }
}
