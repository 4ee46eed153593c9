use std::{
    fs,
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
};

use anyhow::{bail, Context as _};
use tracing::{debug, info, warn};

use crate::magnet::MagnetLink;

/// Something that takes a magnet link off our hands and downloads it.
pub trait DownloadDelegate {
    fn hand_off(&self, magnet: &MagnetLink, dir: &Path) -> anyhow::Result<()>;
}

/// Starts an external torrent client and leaves it running in the background.
///
/// The template is split on whitespace; `{magnet}` and `{dir}` are substituted in each word.
pub struct CommandDelegate {
    template: String,
}

impl CommandDelegate {
    pub fn new(template: impl Into<String>) -> Self {
        CommandDelegate {
            template: template.into(),
        }
    }

    fn expand(&self, magnet: &MagnetLink, dir: &Path) -> Vec<String> {
        let dir = dir.to_string_lossy();
        self.template
            .split_whitespace()
            .map(|word| {
                word.replace("{magnet}", magnet.as_str())
                    .replace("{dir}", &dir)
            })
            .collect()
    }

    /// Spawn the client along with a thread that reaps it on exit. The thread yields the exit
    /// status, if one could be collected.
    fn start(&self, magnet: &MagnetLink, dir: &Path) -> anyhow::Result<JoinHandle<Option<ExitStatus>>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("unable to create {}", dir.display()))?;

        let words = self.expand(magnet, dir);
        let Some((program, args)) = words.split_first() else {
            bail!("download command is empty");
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("unable to start {program}"))?;

        let pid = child.id();
        info!(pid, hash = %magnet.info_hash(), dir = %dir.display(), "download started");

        Ok(thread::spawn(move || match child.wait() {
            Ok(status) => {
                debug!(pid, %status, "download client exited");
                Some(status)
            }
            Err(e) => {
                warn!(pid, "unable to wait for download client: {e}");
                None
            }
        }))
    }
}

impl DownloadDelegate for CommandDelegate {
    fn hand_off(&self, magnet: &MagnetLink, dir: &Path) -> anyhow::Result<()> {
        self.start(magnet, dir)?;
        Ok(())
    }
}
