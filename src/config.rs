//! Configuration for exeq.
//!
//! Handles loading and deserializing settings from `exeq.toml`.
//!
//! The file lives under the platform config directory (`exeq/exeq.toml`)
//! and can be pointed elsewhere with the `EXEQ_CONFIG` environment
//! variable. A missing or invalid file falls back to the internal defaults
//! with a note on stderr; configuration is never a fatal concern.

use serde::Deserialize;

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Contents written by `exeq --init`.
const DEFAULT_CONFIG: &str = r#"# exeq.toml

[run]
# Pager used by the 'p' flag.
pager = "less"

# Terminal emulator for the 't' flag. Commented out, exeq probes common
# emulators itself; the TERMCMD environment variable wins over both.
# terminal = "alacritty"

# Privilege escalation tool for the 'r' flag. Commented out, exeq tries
# sudo, then doas.
# privilege_tool = "sudo"
"#;

/// Settings for the `[run]` table.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Run {
    pager: String,
    terminal: Option<String>,
    privilege_tool: Option<String>,
}

impl Default for Run {
    fn default() -> Self {
        Run {
            pager: "less".to_owned(),
            terminal: None,
            privilege_tool: None,
        }
    }
}

/// Main configuration struct for exeq.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    run: Run,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the file does not exist it is silently skipped; a file that
    /// fails to parse is reported on stderr. Both cases fall back to the
    /// internal defaults.
    pub fn load() -> Self {
        let path = Self::default_path();

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error parsing config: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// The config file path: `EXEQ_CONFIG` if set, otherwise
    /// `<config dir>/exeq/exeq.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("EXEQ_CONFIG")
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("exeq")
            .join("exeq.toml")
    }

    /// Write the commented default config file, for `exeq --init`.
    /// Refuses to overwrite an existing file.
    pub fn generate_default(path: &PathBuf) -> io::Result<()> {
        if path.exists() {
            return Err(io::Error::other(format!(
                "config file already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        println!("Wrote default config to {}", path.display());
        Ok(())
    }

    /// Build a config programmatically; embeddings that keep their own
    /// settings object hand the relevant values through here.
    pub fn with_run_settings(
        pager: impl Into<String>,
        terminal: Option<String>,
        privilege_tool: Option<String>,
    ) -> Self {
        Config {
            run: Run {
                pager: pager.into(),
                terminal,
                privilege_tool,
            },
        }
    }

    // Getters

    #[inline]
    pub fn pager(&self) -> &str {
        &self.run.pager
    }

    #[inline]
    pub fn terminal(&self) -> Option<&str> {
        self.run.terminal.as_deref()
    }

    #[inline]
    pub fn privilege_tool(&self) -> Option<&str> {
        self.run.privilege_tool.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.pager(), "less");
        assert_eq!(config.terminal(), None);
        assert_eq!(config.privilege_tool(), None);
    }

    #[test]
    fn partial_files_keep_defaults_elsewhere() -> Result<(), Box<dyn std::error::Error>> {
        let config: Config = toml::from_str(
            r#"
            [run]
            pager = "bat --paging=always"
            "#,
        )?;
        assert_eq!(config.pager(), "bat --paging=always");
        assert_eq!(config.privilege_tool(), None);
        Ok(())
    }

    #[test]
    fn full_run_table_round_trips() -> Result<(), Box<dyn std::error::Error>> {
        let config: Config = toml::from_str(
            r#"
            [run]
            pager = "more"
            terminal = "kitty"
            privilege_tool = "doas"
            "#,
        )?;
        assert_eq!(config.pager(), "more");
        assert_eq!(config.terminal(), Some("kitty"));
        assert_eq!(config.privilege_tool(), Some("doas"));
        Ok(())
    }

    #[test]
    fn generated_default_parses_and_stays_put() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("exeq").join("exeq.toml");

        Config::generate_default(&path)?;
        let config: Config = toml::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(config.pager(), "less");

        // A second init must not clobber the existing file.
        assert!(Config::generate_default(&path).is_err());
        Ok(())
    }
}
