use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::console::TabPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Script(String),

    #[error("no home directory to keep settings in")]
    NoConfigDir,
}

/// How the interpreter is launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    pub executable: String,
    pub arguments: String,
    /// Grace period for the interpreter to exit after stdin closes
    pub stop_timeout_ms: u64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            executable: "dotnet".to_string(),
            arguments: "fsi --readline-".to_string(),
            stop_timeout_ms: 0,
        }
    }
}

/// Accepted tab lengths, wherever they come from
pub const MIN_TAB_LENGTH: usize = 1;
pub const MAX_TAB_LENGTH: usize = 16;

/// How the console behaves as an editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub convert_tabs: bool,
    pub tab_length: usize,
    pub echo_sent_text: bool,
    pub theme: String,
    /// Text put back after clearing a console that sat at a prompt
    pub restart_marker: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            convert_tabs: true,
            tab_length: 4,
            echo_sent_text: true,
            theme: "gruvbox-dark".to_string(),
            restart_marker: "> ".to_string(),
        }
    }
}

/// Persisted settings: one section for the process, one for the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub process: ProcessSettings,
    pub editor: EditorSettings,
}

impl Settings {
    /// ~/.config/replpane on all platforms
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("replpane"))
    }

    /// Location of the persisted settings
    pub fn store_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.editor.tab_length = clamp_tab_length(settings.editor.tab_length);
        Ok(settings)
    }

    /// Write settings to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn tab_policy(&self) -> TabPolicy {
        TabPolicy {
            convert_to_spaces: self.editor.convert_tabs,
            length: clamp_tab_length(self.editor.tab_length),
        }
    }

    /// One-line description for the status line
    pub fn summary(&self) -> String {
        format!(
            "{} {} | tabs: {} | echo: {}",
            self.process.executable,
            self.process.arguments,
            if self.editor.convert_tabs {
                format!("{} spaces", self.editor.tab_length)
            } else {
                "literal".to_string()
            },
            if self.editor.echo_sent_text { "on" } else { "off" },
        )
    }
}

fn clamp_tab_length(length: usize) -> usize {
    length.clamp(MIN_TAB_LENGTH, MAX_TAB_LENGTH)
}
