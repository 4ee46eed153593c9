use std::fmt::Write;

use crate::model::{Movie, Torrent};

const MARGIN: &str = "  ";

struct Column {
    name: &'static str,
    width: usize,
    right: bool,
}

const fn left(name: &'static str, width: usize) -> Column {
    Column {
        name,
        width,
        right: false,
    }
}

const fn right(name: &'static str, width: usize) -> Column {
    Column {
        name,
        width,
        right: true,
    }
}

static MOVIE_COLUMNS: &[Column] = &[
    left("ID", 10),
    left("Title", 50),
    right("Rating", 6),
    left("Languages", 20),
    left("Genres", 40),
    right("Torrents", 8),
];

static TORRENT_COLUMNS: &[Column] = &[
    left("ID", 10),
    left("Title", 50),
    right("Seeders", 8),
    right("Size", 10),
    right("Files", 5),
    left("Language", 10),
    right("Date", 16),
];

pub fn movie_table(movies: &[Movie]) -> String {
    let rows = movies.iter().map(|movie| {
        vec![
            movie.id().to_string(),
            movie.title.clone(),
            movie
                .rating
                .map(|rating| format!("{rating:.1}"))
                .unwrap_or_else(|| "-".into()),
            movie.languages().join(", "),
            movie
                .genres
                .iter()
                .map(|genre| genre.name())
                .collect::<Vec<_>>()
                .join(", "),
            format!("{}/{}", movie.torrents.len(), movie.torrents_count),
        ]
    });
    table(MOVIE_COLUMNS, rows)
}

pub fn torrent_table(torrents: &[Torrent]) -> String {
    let rows = torrents.iter().map(|torrent| {
        vec![
            torrent.id().to_string(),
            torrent.title.clone(),
            torrent.seeders.to_string(),
            torrent.size.map(|size| size.to_string()).unwrap_or_default(),
            torrent.torrent_links.as_slice().len().to_string(),
            torrent.language.clone(),
            torrent.date.map(|date| date.to_string()).unwrap_or_default(),
        ]
    });
    table(TORRENT_COLUMNS, rows)
}

pub fn summary(movie: &Movie) -> String {
    let mut buf = String::new();
    match movie.year {
        Some(year) if !movie.title.contains(&year.to_string()) => {
            writeln!(buf, "{} ({year})", movie.title)
        }
        _ => writeln!(buf, "{}", movie.title),
    }
    .expect("pretty sure this can't break");
    writeln!(buf, "{}", movie.url()).expect("pretty sure this can't break");
    if let Some(poster) = &movie.poster {
        writeln!(buf, "poster: {poster}").expect("pretty sure this can't break");
    }
    buf += "\n";
    buf += &movie.summary;
    buf += "\n";
    buf
}

fn table(columns: &[Column], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut buf = String::new();
    let header: Vec<String> = columns.iter().map(|column| column.name.to_string()).collect();
    format_line(&mut buf, columns, &header);

    let rule: Vec<String> = columns.iter().map(|column| "-".repeat(column.width)).collect();
    format_line(&mut buf, columns, &rule);

    for row in rows {
        format_line(&mut buf, columns, &row);
    }
    buf
}

fn format_line(buf: &mut String, columns: &[Column], cells: &[String]) {
    let line: Vec<String> = columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| {
            let cell = truncate(cell, column.width);
            let width = column.width;
            if column.right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    writeln!(buf, "{}", line.join(MARGIN).trim_end()).expect("pretty sure this can't break")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
