//! Application configuration loaded from a TOML file.
//!
//! Lookup order for the file: `--config`, then `<config dir>/runlog/config.toml`.
//! A missing file means defaults; CLI flags override whatever the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// A git working tree that exported files are published to
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    pub dir: PathBuf,
    /// Push target; the tree's upstream when unset
    #[serde(default)]
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub dark_mode: bool,
    pub data_dir: PathBuf,
    pub images_dir: Option<PathBuf>,
    pub images_repo: Option<RepoConfig>,
    pub data_repo: Option<RepoConfig>,
    /// Places selectable by number, e.g. `--place 1`
    pub places: Vec<String>,
    /// Heatmap shades; 0 for a continuous scale
    pub heatmap_levels: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            dark_mode: true,
            data_dir: default_data_dir(),
            images_dir: None,
            images_repo: None,
            data_repo: None,
            places: vec!["Place 1".to_string(), "Place 2".to_string()],
            heatmap_levels: 4,
        }
    }
}

/// `$RUNLOG_DIR`, else the platform data directory
fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RUNLOG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runlog")
}

/// Default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("runlog").join("config.toml"))
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file not found: {p:?}");
                }
                p.to_path_buf()
            }
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(AppConfig::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file: {path:?}"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, data_dir: Option<PathBuf>, theme: Option<&str>) -> Result<()> {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        match theme {
            None => {}
            Some("dark") => self.dark_mode = true,
            Some("light") => self.dark_mode = false,
            Some(other) => anyhow::bail!("Unknown theme '{other}' (expected dark or light)"),
        }
        Ok(())
    }

    /// Where exported images go: the images repo if set, else `images_dir`,
    /// else `<data_dir>/images`
    pub fn images_dir(&self) -> PathBuf {
        self.images_repo
            .as_ref()
            .map(|r| r.dir.clone())
            .or_else(|| self.images_dir.clone())
            .unwrap_or_else(|| self.data_dir.join("images"))
    }

    /// `"1"`, `"2"`, ... pick from the configured places; anything else is kept as typed
    pub fn resolve_place(&self, place: &str) -> String {
        place
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.places.get(i))
            .cloned()
            .unwrap_or_else(|| place.trim().to_string())
    }

    /// Path of the dashboard log file. Kept outside `data_dir`, which is
    /// usually also the published data repository.
    pub fn log_file(&self) -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("runlog")
            .join("runlog.log")
    }
}
