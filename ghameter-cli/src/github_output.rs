//! Step outputs for the Actions runner.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ghameter_core::{CoreError, OutputSink};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

/// Appends outputs to the file named by `GITHUB_OUTPUT`.
///
/// Values use the multiline form `name<<DELIM` / value / `DELIM` so they
/// may contain newlines.
#[derive(Debug, Clone)]
pub struct GitHubOutputFile {
    path: PathBuf,
}

impl GitHubOutputFile {
    /// Creates a sink appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for GitHubOutputFile {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        let delimiter = delimiter_for(value);
        let entry = format!("{name}<<{delimiter}\n{value}\n{delimiter}\n");

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(entry.as_bytes()))
            .map_err(|e| {
                CoreError::Output(format!(
                    "failed to write output '{name}' to {}: {e}",
                    self.path.display()
                ))
            })?;

        debug!(name, path = %self.path.display(), "Step output written");
        Ok(())
    }
}

/// Used outside Actions: the output only goes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        warn!(name, value, "GITHUB_OUTPUT is not set, output only logged");
        Ok(())
    }
}

/// Picks the output file when one is configured, the log otherwise.
pub fn output_sink(path: Option<&Path>) -> Box<dyn OutputSink> {
    match path {
        Some(path) => Box::new(GitHubOutputFile::new(path)),
        None => Box::new(LogSink),
    }
}

/// Random heredoc delimiter that does not occur in `value`.
fn delimiter_for(value: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let suffix: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect();
        let delimiter = format!("ghadelimiter_{suffix}");
        if !value.contains(&delimiter) {
            return delimiter;
        }
    }
}
