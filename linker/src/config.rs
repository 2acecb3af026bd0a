//! Panel configuration.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/linker/config.toml` (falling back
//! to `~/.config/linker/config.toml`). Every key is optional; a missing file or a
//! parse error is a soft failure and the defaults below are used.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use linker_core::session::DEFAULT_BENIGN_MARKER;

/// Environment variable consulted for the page URL when no argument is given.
pub const PAGE_URL_ENV: &str = "LINKER_PAGE_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Theme name, `"dark"` or `"catppuccin-mocha"`.
    pub theme: String,
    /// Native host executable started for every connection.
    pub host_command: String,
    pub host_args: Vec<String>,
    pub db_path: PathBuf,
    pub log_file: PathBuf,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_level: String,
    /// Open the native channel as soon as the panel starts.
    pub auto_connect: bool,
    /// Case-insensitive substring of `Error` marking an empty result as final.
    pub benign_marker: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            host_command: "linker".to_owned(),
            host_args: Vec::new(),
            db_path: PathBuf::from(".linker/state.db"),
            log_file: PathBuf::from(".linker/linker.log"),
            log_level: "info".to_owned(),
            auto_connect: true,
            benign_marker: DEFAULT_BENIGN_MARKER.to_owned(),
        }
    }
}

impl PanelConfig {
    /// Loads the config file, returning defaults plus a description of any problem.
    ///
    /// The problem is returned rather than printed because logging is not yet
    /// initialised when this runs; the caller logs it once the subscriber is up.
    pub fn load() -> (Self, Option<String>) {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> (Self, Option<String>) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::default(), None),
            Err(e) => {
                return (Self::default(), Some(format!("cannot read {}: {e}", path.display())));
            }
        };
        match toml::from_str(&raw) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(format!("config parse error in {}: {e}", path.display()))),
        }
    }
}

/// Returns the path to the linker config file.
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("linker").join("config.toml")
}

/// The page the panel was opened for: first argument, else `LINKER_PAGE_URL`.
///
/// An empty string means "no page"; the resolver treats it as ineligible.
pub fn page_url(mut args: impl Iterator<Item = String>) -> String {
    args.next()
        .or_else(|| std::env::var(PAGE_URL_ENV).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = \"dark\"\nauto_connect = false\nhost_args = [\"--verbose\"]\n")
            .unwrap();

        let (config, problem) = PanelConfig::load_from(&path);
        assert_eq!(problem, None);
        assert_eq!(config.theme, "dark");
        assert!(!config.auto_connect);
        assert_eq!(config.host_args, vec!["--verbose".to_owned()]);
        assert_eq!(config.host_command, "linker");
        assert_eq!(config.benign_marker, DEFAULT_BENIGN_MARKER);
    }

    #[test]
    fn missing_file_is_not_a_problem() {
        let dir = tempfile::TempDir::new().unwrap();
        let (config, problem) = PanelConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, PanelConfig::default());
        assert_eq!(problem, None);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [").unwrap();

        let (config, problem) = PanelConfig::load_from(&path);
        assert_eq!(config, PanelConfig::default());
        assert!(problem.unwrap().contains("config parse error"));
    }

    #[test]
    fn first_argument_wins_over_environment() {
        // The only test that touches this variable.
        std::env::set_var(PAGE_URL_ENV, "https://github.com/a/b/pull/2");
        let from_arg = page_url(vec!["https://github.com/x/y/issues/1".to_owned()].into_iter());
        let from_env = page_url(std::iter::empty());
        std::env::remove_var(PAGE_URL_ENV);

        assert_eq!(from_arg, "https://github.com/x/y/issues/1");
        assert_eq!(from_env, "https://github.com/a/b/pull/2");
    }
}
