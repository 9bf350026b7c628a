//! Demo settings with persistence
//!
//! Settings are saved to `~/.config/prism/settings.toml`

use std::fs;
use std::path::PathBuf;

use prism_assets::ImportSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::Args;

/// Everything the demo reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Model imported when none is given on the command line
    pub model_path: Option<PathBuf>,
    /// Vertex shader; the built-in pass-through shader is used when unset
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    /// Frames simulated before exiting
    pub frames: u32,
    /// `tracing` filter directive, e.g. `info` or `prism_assets=debug`
    pub log_level: String,
    pub import: ImportSettings,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            model_path: None,
            vertex_shader: None,
            fragment_shader: None,
            frames: 120,
            log_level: "info".to_string(),
            import: ImportSettings::default(),
        }
    }
}

impl DemoSettings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prism"))
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found.
    ///
    /// Runs before the subscriber is installed, so problems are returned as
    /// notes to log afterwards.
    pub fn load() -> (Self, Vec<String>) {
        let Some(path) = Self::settings_path() else {
            return (Self::default(), vec!["Could not determine config directory".to_string()]);
        };

        if !path.exists() {
            return (Self::default(), Vec::new());
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => (settings, Vec::new()),
                Err(e) => (
                    Self::default(),
                    vec![format!("Failed to parse {}: {}, using defaults", path.display(), e)],
                ),
            },
            Err(e) => (
                Self::default(),
                vec![format!("Failed to read settings file: {}, using defaults", e)],
            ),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Command-line values win over the file.
    pub fn apply(&mut self, args: &Args) {
        if let Some(model) = &args.model {
            self.model_path = Some(model.clone());
        }
        if let Some(frames) = args.frames {
            self.frames = frames;
        }
        if args.verbose {
            self.log_level = "debug".to_string();
        }
    }
}

/// Log notes collected by [`DemoSettings::load`].
pub fn report(notes: &[String]) {
    for note in notes {
        warn!("{}", note);
    }
}
