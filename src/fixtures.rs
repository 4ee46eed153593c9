//! Pages and records shared by the unit tests.

use std::{cell::RefCell, fmt::Write};

use hashbrown::HashMap;
use url::Url;

use crate::{
    config::Languages,
    fetch::{Fetch, FetchError},
    model::{Movie, Record, Torrent},
    units::{DateUnit, RelativeDate},
};

pub static BASE: &str = "https://1337x.to";
pub static MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=fixture";

pub fn languages() -> Languages {
    "English, Spanish".parse().unwrap()
}

pub fn site_url(path: &str) -> Url {
    Url::parse(BASE).unwrap().join(path).unwrap()
}

pub fn search_page(links: &[&str]) -> String {
    let mut rows = String::new();
    for link in links {
        writeln!(
            rows,
            r#"<tr><td class="coll-1 name"><a href="{link}">result</a></td><td class="coll-2 seeds">1</td></tr>"#
        )
        .unwrap();
    }
    format!("<html><body><table><tbody>{rows}</tbody></table></body></html>")
}

#[derive(Clone, Copy, Default)]
pub struct MovieFixture {
    pub title: &'static str,
    pub genres: &'static [&'static str],
    pub summary: Option<&'static str>,
    pub rating: Option<&'static str>,
    /// (href, seeders) rows as they appear on the page.
    pub torrents: &'static [(&'static str, &'static str)],
}

pub fn movie_page(fixture: &MovieFixture) -> String {
    let mut buf = String::new();
    buf += "<html><body>\n";
    writeln!(
        buf,
        r#"<div class="featured-heading"><strong>Download {} Torrents</strong></div>"#,
        fixture.title
    )
    .unwrap();
    buf += r#"<div class="torrent-image"><img src="//lx1.dyncdn.cc/images/inception.jpg"></div>"#;
    buf += "\n<div class=\"torrent-category\">";
    for genre in fixture.genres {
        write!(buf, "<span>{genre}</span>").unwrap();
    }
    buf += "</div>\n";
    if let Some(style) = fixture.rating {
        writeln!(
            buf,
            r#"<div class="rating"><div class="red" style="{style}"></div></div>"#
        )
        .unwrap();
    }
    buf += r#"<div class="torrent-detail-info"><h3>Plot</h3>"#;
    if let Some(summary) = fixture.summary {
        write!(buf, "<p>{summary}</p>").unwrap();
    }
    buf += "</div>\n<table><tbody>\n";
    for (href, seeders) in fixture.torrents {
        writeln!(
            buf,
            r#"<tr><td class="coll-1 name"><a href="/sub/42/0/" class="icon"></a><a href="{href}">variant</a></td><td class="coll-2 seeds">{seeders}</td><td class="coll-3 leeches">3</td></tr>"#
        )
        .unwrap();
    }
    buf += "</tbody></table>\n</body></html>\n";
    buf
}

#[derive(Clone, Copy)]
pub struct TorrentFixture {
    pub title: &'static str,
    pub movie: Option<&'static str>,
    pub language: Option<&'static str>,
    pub seeders: &'static str,
    pub date: &'static str,
    pub size: &'static str,
    pub magnet: &'static str,
    pub files: &'static [&'static str],
}

impl Default for TorrentFixture {
    fn default() -> Self {
        TorrentFixture {
            title: "Inception.2010.1080p",
            movie: None,
            language: Some("English"),
            seeders: "100",
            date: "3 years ago",
            size: "2.1 GB",
            magnet: MAGNET,
            files: &[
                "https://itorrents.org/torrent/0123456789ABCDEF0123456789ABCDEF01234567.torrent",
                "http://btcache.me/torrent/0123456789ABCDEF0123456789ABCDEF01234567",
            ],
        }
    }
}

pub fn torrent_page(fixture: &TorrentFixture) -> String {
    let mut buf = String::new();
    buf += "<html><body>\n";
    writeln!(
        buf,
        r#"<div class="box-info-heading"><h1>{}</h1></div>"#,
        fixture.title
    )
    .unwrap();
    if let Some(movie) = fixture.movie {
        writeln!(buf, r#"<div class="torrent-detail"><a href="{movie}">Parent movie</a></div>"#).unwrap();
    }
    buf += "<ul class=\"list\">\n";
    buf += "<li><strong>Category</strong> <span>Movies</span></li>\n";
    buf += "<li><strong>Type</strong> <span>HD</span></li>\n";
    if let Some(language) = fixture.language {
        writeln!(buf, "<li><strong>Language</strong> <span>{language}</span></li>").unwrap();
    }
    writeln!(buf, "<li><strong>Total size</strong> <span>{}</span></li>", fixture.size).unwrap();
    buf += "<li><strong>Uploaded By</strong> <span> uploader1 </span></li>\n";
    buf += "<li><strong>Downloads</strong> <span>56,789</span></li>\n";
    writeln!(buf, "<li><strong>Date uploaded</strong> <span>{}</span></li>", fixture.date).unwrap();
    writeln!(
        buf,
        r#"<li><strong>Seeders</strong> <span class="seeds">{}</span></li>"#,
        fixture.seeders
    )
    .unwrap();
    buf += "</ul>\n";
    buf += r#"<ul class="category-name"><li><a href="/cat/hd/">HD</a></li><li><a href="/cat/movies/">Movies</a></li></ul>"#;
    writeln!(
        buf,
        r#"<a class="torrentdown1" href="{}"><span class="icon"></span>Magnet Download</a>"#,
        fixture.magnet
    )
    .unwrap();
    buf += "<ul class=\"dropdown-menu\">";
    for file in fixture.files {
        write!(buf, r#"<li><a href="{file}">Torrent Download</a></li>"#).unwrap();
    }
    buf += "</ul>\n";
    buf += r#"<div role="tabpanel" id="comments"><div class="comment-detail"><a class="user" href="/user/moviebuff/">moviebuff</a><span class="flaticon-time"></span> <span>2 months ago</span><p>Great quality, thanks!</p></div></div>"#;
    buf += "\n</body></html>\n";
    buf
}

pub fn torrent(title: &str, url: &str) -> Torrent {
    Torrent {
        record: Record::new(title, Url::parse(url).unwrap()),
        title: title.into(),
        category: Some("Movies".into()),
        language: "English".into(),
        date: Some(RelativeDate {
            value: 2,
            unit: DateUnit::Week,
        }),
        size: Some("1.4 GB".parse().unwrap()),
        seeders: 120,
        comments: Vec::new(),
        magnet_link: MAGNET.parse().unwrap(),
        torrent_links: vec![Url::parse(
            "https://itorrents.org/torrent/0123456789ABCDEF0123456789ABCDEF01234567.torrent",
        )
        .unwrap()]
        .try_into()
        .unwrap(),
    }
}

pub fn movie(title: &str, url: &str) -> Movie {
    let torrent_url = format!("{url}torrent/1/");
    Movie {
        record: Record::new(title, Url::parse(url).unwrap()),
        title: title.into(),
        year: None,
        genres: Vec::new(),
        summary: "No summary available.".into(),
        poster: None,
        rating: Some(74.0),
        torrents: vec![torrent(&format!("{title} 1080p"), &torrent_url)],
        torrents_count: 3,
    }
}

/// Serves canned pages by url and records every request.
#[derive(Default)]
pub struct PageMap {
    pages: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl PageMap {
    pub fn with(mut self, url: &Url, page: String) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn count(&self, url: &Url) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|requested| *requested == url.as_str())
            .count()
    }
}

impl Fetch for PageMap {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Exhausted(url.to_string()))
    }
}
