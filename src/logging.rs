use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use tracing_subscriber::EnvFilter;

/// Send tracing output to the log file, appending a banner for this run.
///
/// `RUST_LOG` selects the filter, `info` by default. When the file can't be
/// opened the subscriber writes to stderr instead.
pub fn init(path: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match open(path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.with_writer(io::stderr).init();
            tracing::warn!("unable to open log file {}: {e}", path.display());
        }
    }
}

fn open(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "\n=== reelscout {} ===",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    #[test]
    fn banner_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("reelscout.log");

        drop(super::open(&path).unwrap());
        drop(super::open(&path).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("=== reelscout ").count(), 2);
    }
}
