use std::io::{self, BufRead, Write};

use anyhow::bail;
use clap::Parser as _;
use tracing::info;

use crate::{
    args::{Command, SearchArgs, ShellLine},
    context::Context,
    download::DownloadDelegate,
    engine::{SearchEngine, SearchOptions},
    render,
    store::Store,
};

static PROMPT: &str = ">>> ";

/// Runs user commands against the store and the crawler.
pub struct Shell<'a> {
    context: &'a Context,
    store: &'a mut Store,
    delegate: &'a dyn DownloadDelegate,
}

impl<'a> Shell<'a> {
    pub fn new(context: &'a Context, store: &'a mut Store, delegate: &'a dyn DownloadDelegate) -> Self {
        Shell {
            context,
            store,
            delegate,
        }
    }

    /// Read commands from stdin until `exit`, `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        println!("Type 'help' to see available commands. Type 'exit' to quit.");
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("{PROMPT}");
            io::stdout().flush()?;

            let Some(line) = lines.next().transpose()? else {
                println!();
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
                break;
            }

            let words = match split_line(line) {
                Ok(words) => words,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            };

            match ShellLine::try_parse_from(words) {
                Ok(ShellLine {
                    command: Command::Shell,
                }) => println!("Already in the shell."),
                Ok(ShellLine { command }) => {
                    if let Err(e) = self.execute(command) {
                        println!("An error occurred: {e:#}");
                    }
                }
                Err(e) => {
                    let _ = e.print();
                }
            }
        }

        info!("shell closed");
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Search(search) => self.search(&search),
            Command::Download { id, torrent } => self.download(id, torrent),
            Command::Summary { id } => {
                let movie = self.store.get_by_id(id);
                match movie {
                    Some(movie) => print!("{}", render::summary(movie)),
                    None => println!("No movie found with that ID."),
                }
                Ok(())
            }
            Command::Torrents { id } => {
                match self.store.get_by_id(id) {
                    Some(movie) if movie.torrents.is_empty() => println!("No torrents stored."),
                    Some(movie) => print!("{}", render::torrent_table(&movie.torrents)),
                    None => println!("No movie found with that ID."),
                }
                Ok(())
            }
            Command::History { number, sort } => {
                if self.store.is_empty() {
                    println!("No movies stored yet.");
                    return Ok(());
                }
                let mut movies = self.store.list().to_vec();
                if sort {
                    movies.sort_by(|a, b| a.title.cmp(&b.title));
                }
                movies.truncate(number.unwrap_or(movies.len()));

                if movies.is_empty() {
                    println!("No results found.");
                } else {
                    print!("{}", render::movie_table(&movies));
                }
                Ok(())
            }
            Command::Shell => self.run().map_err(Into::into),
        }
    }

    fn search(&mut self, search: &SearchArgs) -> anyhow::Result<()> {
        let languages = &self.context.config.languages;
        if let Some(language) = &search.language {
            if !languages.contains(language) {
                bail!("invalid language option. The supported languages are: {languages}");
            }
        }

        let options = SearchOptions {
            refresh: search.refresh,
            language: search.language.clone(),
            torrents: search.files,
        };
        let query = search.query();
        println!("Searching for '{query}'...");

        let engine = SearchEngine::new(
            &self.context.config,
            &self.context.fetcher,
            &self.context.parser,
        );
        let movies = engine.search(&query, &options, self.store);

        if movies.is_empty() {
            println!("No results found.");
        } else {
            print!("{}", render::movie_table(&movies));
        }
        Ok(())
    }

    fn download(&mut self, id: u64, torrent: bool) -> anyhow::Result<()> {
        let magnet = if torrent {
            match self.store.get_torrent(id) {
                Some(torrent) => &torrent.magnet_link,
                None => {
                    println!("No torrent found with that ID.");
                    return Ok(());
                }
            }
        } else {
            match self.store.get_by_id(id).map(|movie| movie.torrents.first()) {
                Some(Some(torrent)) => &torrent.magnet_link,
                Some(None) => {
                    println!("That movie has no stored torrents.");
                    return Ok(());
                }
                None => {
                    println!("No movie found with that ID.");
                    return Ok(());
                }
            }
        };

        let dir = &self.context.config.download_dir;
        self.delegate.hand_off(magnet, dir)?;
        println!("Download handed off, saving to {}.", dir.display());
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unterminated quote")]
pub struct UnterminatedQuote;

/// Split a command line into words, honouring single and double quotes.
pub fn split_line(line: &str) -> Result<Vec<String>, UnterminatedQuote> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => word.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            None => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(UnterminatedQuote);
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use url::Url;

    use super::{split_line, Shell};
    use crate::{
        args::Command, context::Context, download::DownloadDelegate, fixtures, magnet::MagnetLink,
        store::Store,
    };

    #[derive(Default)]
    struct Recorder {
        handed: RefCell<Vec<String>>,
    }

    impl DownloadDelegate for Recorder {
        fn hand_off(&self, magnet: &MagnetLink, _dir: &Path) -> anyhow::Result<()> {
            self.handed.borrow_mut().push(magnet.to_string());
            Ok(())
        }
    }

    fn context() -> Context {
        use clap::Parser as _;

        let args = crate::args::Args::try_parse_from([
            "reelscout",
            "--store",
            "unused.json",
            "--log",
            "unused.log",
            "--download-dir",
            "/tmp",
            "--base-url",
            fixtures::BASE,
        ])
        .unwrap();
        let config = crate::config::Config::from_settings(args.settings).unwrap();
        Context::new(config).unwrap()
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_line(r#"search "the matrix" -l 'English'"#).unwrap(),
            vec!["search", "the matrix", "-l", "English"]
        );
        assert_eq!(split_line(r#"search """#).unwrap(), vec!["search", ""]);
        assert!(split_line(r#"search "heat"#).is_err());
    }

    #[test]
    fn download_hands_off_the_top_torrent() {
        let context = context();
        let mut store = Store::empty("unused.json");
        let movie = fixtures::movie("Heat", "https://1337x.to/movie/2/heat/");
        let movie_id = movie.id();
        let torrent_id = movie.torrents[0].id();
        store.upsert(movie);
        let recorder = Recorder::default();

        let mut shell = Shell::new(&context, &mut store, &recorder);
        shell
            .execute(Command::Download {
                id: movie_id,
                torrent: false,
            })
            .unwrap();
        shell
            .execute(Command::Download {
                id: torrent_id,
                torrent: true,
            })
            .unwrap();
        shell
            .execute(Command::Download {
                id: 1,
                torrent: false,
            })
            .unwrap();

        assert_eq!(
            *recorder.handed.borrow(),
            vec![fixtures::MAGNET.to_string(), fixtures::MAGNET.to_string()]
        );
    }

    #[test]
    fn unsupported_search_language_is_refused() {
        let context = context();
        let mut store = Store::empty("unused.json");
        let recorder = Recorder::default();
        let mut shell = Shell::new(&context, &mut store, &recorder);

        let search = crate::args::SearchArgs {
            title: vec!["heat".into()],
            refresh: false,
            language: Some("Klingon".into()),
            files: None,
        };
        assert!(shell.execute(Command::Search(search)).is_err());
        assert_eq!(
            context.parser.base_url(),
            &Url::parse(fixtures::BASE).unwrap()
        );
    }
}
