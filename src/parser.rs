use hashbrown::HashSet;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::Languages,
    genre::{Genre, UnknownGenre},
    magnet::{InvalidMagnet, MagnetLink},
    model::{
        Comment, InvalidTorrentLinks, MetaValue, Movie, Record, Torrent, TorrentLinks, DOWNLOADS,
        KIND, TAGS, TORRENT_LINKS, UPLOADER,
    },
};

static NO_RESULTS: &[&str] = &[
    "bad search request",
    "bad category",
    "no results were returned",
];

static NO_SUMMARY: &str = "No summary available.";

/// A parsed movie page, before any of its torrents are fetched.
#[derive(Clone, Debug)]
pub struct MoviePage {
    /// Movie with no torrents yet; `torrents_count` already counts every candidate.
    pub movie: Movie,
    /// Torrent pages, best seeded first. Ties keep page order.
    pub ranked: Vec<Url>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no title found on {0}")]
    MissingTitle(Url),
    #[error(transparent)]
    Genre(#[from] UnknownGenre),
    #[error("no magnet link found on {0}")]
    MissingMagnet(Url),
    #[error(transparent)]
    Magnet(#[from] InvalidMagnet),
    #[error(transparent)]
    TorrentLinks(#[from] InvalidTorrentLinks),
}

/// Extraction rules for the pages of one site.
///
/// Selectors are compiled once; every `parse_*` method is a pure function of page text.
pub struct Parser {
    base_url: Url,
    torrent_anchor: Selector,
    movie_anchor: Selector,
    heading: Selector,
    genre: Selector,
    summary: Selector,
    rating: Selector,
    poster: Selector,
    row: Selector,
    row_link: Selector,
    row_seeds: Selector,
    torrent_heading: Selector,
    label: Selector,
    tag: Selector,
    comment: Selector,
    comment_user: Selector,
    comment_message: Selector,
    comment_clock: Selector,
    anchor: Selector,
    file_link: Selector,
    year_pattern: Regex,
    width_pattern: Regex,
}

impl Parser {
    pub fn new(base_url: Url) -> Self {
        Parser {
            base_url,
            torrent_anchor: Selector::parse(r#"a[href^="/torrent/"]"#).unwrap(),
            movie_anchor: Selector::parse(r#"a[href^="/movie/"]"#).unwrap(),
            heading: Selector::parse(".featured-heading strong").unwrap(),
            genre: Selector::parse(".torrent-category span").unwrap(),
            summary: Selector::parse(".torrent-detail-info p").unwrap(),
            rating: Selector::parse(".rating .red").unwrap(),
            poster: Selector::parse(".torrent-image img").unwrap(),
            row: Selector::parse("tbody tr").unwrap(),
            row_link: Selector::parse(r#"td.coll-1 a[href^="/torrent/"]"#).unwrap(),
            row_seeds: Selector::parse("td.coll-2.seeds").unwrap(),
            torrent_heading: Selector::parse(".box-info-heading h1").unwrap(),
            label: Selector::parse("strong").unwrap(),
            tag: Selector::parse("ul.category-name li a").unwrap(),
            comment: Selector::parse("#comments .comment-detail").unwrap(),
            comment_user: Selector::parse("a.user").unwrap(),
            comment_message: Selector::parse("p").unwrap(),
            comment_clock: Selector::parse("span.flaticon-time").unwrap(),
            anchor: Selector::parse("a[href]").unwrap(),
            file_link: Selector::parse("ul.dropdown-menu a[href]").unwrap(),
            year_pattern: Regex::new(r"\((\d{4})\)").unwrap(),
            width_pattern: Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Torrent pages listed on a search results page.
    ///
    /// A results page carrying one of the site's "nothing found" messages yields nothing.
    pub fn parse_search_results(&self, text: &str) -> Vec<Url> {
        let lowered = text.to_lowercase();
        if NO_RESULTS.iter().any(|sentinel| lowered.contains(sentinel)) {
            debug!("search page reports no results");
            return Vec::new();
        }

        let document = Html::parse_document(text);
        let mut seen = HashSet::new();
        document
            .select(&self.torrent_anchor)
            .filter_map(|anchor| self.resolve(anchor.value().attr("href")?))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// The movie page a torrent page belongs to, if it links one.
    pub fn parse_movie_link(&self, text: &str) -> Option<Url> {
        let document = Html::parse_document(text);
        let href = document
            .select(&self.movie_anchor)
            .next()?
            .value()
            .attr("href")?;
        self.resolve(href)
    }

    /// Every torrent page listed on a movie page, in page order.
    pub fn parse_movie_torrent_links(&self, text: &str) -> Vec<Url> {
        let document = Html::parse_document(text);
        document
            .select(&self.torrent_anchor)
            .filter_map(|anchor| self.resolve(anchor.value().attr("href")?))
            .collect()
    }

    pub fn parse_movie(&self, text: &str, url: &Url) -> Result<MoviePage, ParseError> {
        let document = Html::parse_document(text);

        let heading = document
            .select(&self.heading)
            .next()
            .map(collect_text)
            .ok_or_else(|| ParseError::MissingTitle(url.clone()))?;
        let title = trim_heading(&heading);
        if title.is_empty() {
            return Err(ParseError::MissingTitle(url.clone()));
        }

        let year = self
            .year_pattern
            .captures(&title)
            .and_then(|captures| captures[1].parse().ok());

        let mut genres = Vec::new();
        for element in document.select(&self.genre) {
            let text = collect_text(element);
            if text.is_empty() {
                continue;
            }
            let genre: Genre = text.parse()?;
            if !genres.contains(&genre) {
                genres.push(genre);
            }
        }

        let summary = document
            .select(&self.summary)
            .next()
            .map(collect_text)
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| NO_SUMMARY.into());

        let rating = document
            .select(&self.rating)
            .next()
            .and_then(|element| self.read_rating(element, url));

        let poster = document
            .select(&self.poster)
            .next()
            .and_then(|image| image.value().attr("src"))
            .and_then(|src| self.resolve(src));

        let ranked = self.rank_torrents(&document);

        let mut record = Record::new(&title, url.clone());
        record.metadata.insert(
            TORRENT_LINKS.into(),
            MetaValue::List(ranked.iter().map(Url::to_string).collect()),
        );

        let movie = Movie {
            record,
            title,
            year,
            genres,
            summary,
            poster,
            rating,
            torrents: Vec::new(),
            torrents_count: ranked.len(),
        };

        Ok(MoviePage { movie, ranked })
    }

    /// Parse a torrent detail page.
    ///
    /// Returns `Ok(None)` when the torrent's language is missing or not one we support. The
    /// title, the magnet link and the torrent file links are required.
    pub fn parse_torrent(
        &self,
        text: &str,
        url: &Url,
        languages: &Languages,
    ) -> Result<Option<Torrent>, ParseError> {
        let document = Html::parse_document(text);

        let title = document
            .select(&self.torrent_heading)
            .next()
            .map(collect_text)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| ParseError::MissingTitle(url.clone()))?;

        let language = match self.label_value(&document, "Language") {
            Some(language) if languages.contains(&language) => language,
            language => {
                warn!(?language, %url, "language not supported");
                return Ok(None);
            }
        };

        let category = self.label_value(&document, "Category");
        let date = self
            .label_value(&document, "Date uploaded")
            .and_then(|date| parse_or_debug(&date, url));
        let size = self
            .label_value(&document, "Total size")
            .and_then(|size| parse_or_debug(&size, url));
        let seeders = self
            .label_value(&document, "Seeders")
            .and_then(|seeders| parse_count(&seeders))
            .unwrap_or_default();

        let magnet_link = self
            .find_magnet(&document)
            .ok_or_else(|| ParseError::MissingMagnet(url.clone()))?
            .parse::<MagnetLink>()?;

        let torrent_links: TorrentLinks = document
            .select(&self.file_link)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| {
                href.ends_with(".torrent") || href.contains("torrent.php?") || href.contains("btcache.me")
            })
            .filter_map(|href| self.resolve(href))
            .collect::<Vec<_>>()
            .try_into()?;

        let mut record = Record::new(&title, url.clone());
        if let Some(uploader) = self.label_value(&document, "Uploaded By") {
            record.metadata.insert(UPLOADER.into(), MetaValue::Text(uploader));
        }
        if let Some(downloads) = self
            .label_value(&document, "Downloads")
            .and_then(|downloads| parse_count(&downloads))
        {
            record
                .metadata
                .insert(DOWNLOADS.into(), MetaValue::Integer(downloads.into()));
        }
        if let Some(kind) = self.label_value(&document, "Type") {
            record.metadata.insert(KIND.into(), MetaValue::Text(kind));
        }
        let tags: Vec<String> = document
            .select(&self.tag)
            .map(collect_text)
            .filter(|tag| !tag.is_empty())
            .collect();
        record.metadata.insert(TAGS.into(), MetaValue::List(tags));

        Ok(Some(Torrent {
            record,
            title,
            category,
            language,
            date,
            size,
            seeders,
            comments: self.parse_comments(&document),
            magnet_link,
            torrent_links,
        }))
    }

    fn rank_torrents(&self, document: &Html) -> Vec<Url> {
        let mut rows: Vec<(Url, u32)> = document
            .select(&self.row)
            .filter_map(|row| {
                let href = row.select(&self.row_link).next()?.value().attr("href")?;
                let seeders = row
                    .select(&self.row_seeds)
                    .next()
                    .and_then(|cell| parse_count(&collect_text(cell)))
                    .unwrap_or_default();
                Some((self.resolve(href)?, seeders))
            })
            .collect();

        // Stable, so equal seed counts stay in page order.
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.into_iter().map(|(url, _)| url).collect()
    }

    fn read_rating(&self, element: ElementRef, url: &Url) -> Option<f64> {
        let style = element.value().attr("style")?;
        let rating = self
            .width_pattern
            .captures(style)
            .and_then(|captures| captures[1].parse::<f64>().ok());
        if rating.is_none() {
            debug!(style, %url, "unreadable rating");
        }
        rating.map(|rating| rating.clamp(0.0, 100.0))
    }

    fn parse_comments(&self, document: &Html) -> Vec<Comment> {
        document
            .select(&self.comment)
            .filter_map(|detail| {
                let user = collect_text(detail.select(&self.comment_user).next()?);
                let message = collect_text(detail.select(&self.comment_message).next()?);
                let clock = detail.select(&self.comment_clock).next()?;
                let date = next_span(clock)?;
                Some(Comment {
                    user,
                    message,
                    date: collect_text(date).parse().ok()?,
                })
            })
            .collect()
    }

    fn find_magnet<'a>(&self, document: &'a Html) -> Option<&'a str> {
        let labelled = document.select(&self.anchor).find(|anchor| {
            collect_text(*anchor).contains("Magnet Download")
        });
        labelled
            .or_else(|| {
                document.select(&self.anchor).find(|anchor| {
                    anchor
                        .value()
                        .attr("href")
                        .is_some_and(|href| href.starts_with("magnet:"))
                })
            })
            .and_then(|anchor| anchor.value().attr("href"))
    }

    /// Value of the `span` following a `strong` label, as in
    /// `<li><strong>Language</strong> <span>English</span></li>`.
    fn label_value(&self, document: &Html, label: &str) -> Option<String> {
        document
            .select(&self.label)
            .filter(|strong| collect_text(*strong) == label)
            .find_map(next_span)
            .map(collect_text)
            .filter(|value| !value.is_empty())
    }

    fn resolve(&self, href: &str) -> Option<Url> {
        self.base_url.join(href.trim()).ok()
    }
}

fn next_span(element: ElementRef) -> Option<ElementRef> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "span")
}

fn collect_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn trim_heading(heading: &str) -> String {
    let heading = heading.trim();
    let heading = heading.strip_prefix("Download ").unwrap_or(heading);
    let heading = heading
        .strip_suffix(" Torrents")
        .or_else(|| heading.strip_suffix(" Torrent"))
        .unwrap_or(heading);
    heading.trim().to_string()
}

fn parse_count(text: &str) -> Option<u32> {
    text.trim().replace(',', "").parse().ok()
}

fn parse_or_debug<T>(text: &str, url: &Url) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse()
        .map_err(|e| debug!(%url, "{e}"))
        .ok()
}
