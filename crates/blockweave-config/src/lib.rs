use blockweave_engine::clipboard::DEFAULT_BLOCKS_MIME;
use blockweave_engine::{DomAttributes, EditorOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Editor settings shared by every blockweave front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media type of the private clipboard part holding Block JSON.
    pub clipboard_mime_type: String,
    /// Props stored on block containers. Unset keeps the engine's list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_props: Option<Vec<String>>,
    /// Where exported files are written when no output path is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    pub dom_attributes: DomAttributes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clipboard_mime_type: DEFAULT_BLOCKS_MIME.to_string(),
            inherited_props: None,
            export_dir: None,
            dom_attributes: DomAttributes::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the export directory
        config.export_dir = config
            .export_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Editor options carrying these settings over the default schema.
    pub fn editor_options(&self) -> EditorOptions {
        let options = EditorOptions::default()
            .with_clipboard_mime_type(self.clipboard_mime_type.as_str())
            .with_dom_attributes(self.dom_attributes.clone());
        match &self.inherited_props {
            Some(props) => options.with_inherited_props(props.iter().cloned()),
            None => options,
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
