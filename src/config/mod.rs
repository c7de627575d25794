//! Configuration management for tagscroll.
//!
//! Configuration is read from `~/.config/tagscroll/config.toml` at startup
//! (or from `--config`). If the default file doesn't exist, a commented one is
//! created. Every section and field is optional.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use crate::fetcher::ApiConfig;
use crate::proxy::ProxyConfig;
use crate::scroll::ScrollConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub scroll: ScrollConfig,
    pub proxy: ProxyConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

impl Config {
    /// Load configuration from the default path, creating it on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/tagscroll/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("tagscroll").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Io { path, source }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        fs::write(path, Self::default_config_content()).map_err(io_err(path))?;
        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// The default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# tagscroll configuration
#
# Colors can be specified as:
# - Named colors: Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
#   DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
#   LightCyan, White, Reset
# - Hex colors: "#RRGGBB" or "#RGB"
#
# Keybindings can be specified as:
# - Single characters: "a", "A", "/"
# - Special keys: Enter, Tab, Backspace, Home, End, PageUp, PageDown,
#   Up, Down, Left, Right, Esc, Space, F1-F12
# - With modifiers: "Ctrl+c", "Shift+Tab", "Alt+Enter"

[api]
# Direct API endpoint (query string is added per search)
base_url = "https://api.rule34.xxx/index.php"

# Posts per search
limit = 60

# Relay prefixes tried in order when the direct endpoint fails.
# The full API URL is appended verbatim to each prefix.
# Run `tagscroll proxy` and add "http://127.0.0.1:8000/relay/" to use the local relay.
relays = [
    "https://corsproxy.io/?",
    "https://cors.isomorphic-git.org/",
]

# Per-request timeout in seconds
timeout_secs = 15

[scroll]
# Time between auto-scroll steps in milliseconds
interval_ms = 5000

# Fraction of the visible area advanced per step
step_ratio = 0.9

# Distance from the end (in lines) that counts as the end
wrap_tolerance = 5.0

[proxy]
bind = "127.0.0.1"
port = 8000
upstream_timeout_secs = 15

[colors]
active_border = "Cyan"
inactive_border = "DarkGray"
input_text = "White"
post_id = "Yellow"
post_score = "Green"
post_link = "Blue"
post_preview = "DarkGray"
status_fg = "White"
status_bg = "DarkGray"

[keybindings]
quit = ["q", "Ctrl+c"]
focus_search = ["/", "s"]
scroll_up = ["k", "Up"]
scroll_down = ["j", "Down"]
page_up = ["p", "PageUp"]
page_down = ["n", "PageDown"]
toggle_auto_scroll = ["a"]
open_in_browser = ["o"]
refresh = ["R"]
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert_eq!(config.api.limit, 60);
        assert_eq!(config.api.relays.len(), 2);
        assert_eq!(config.scroll.interval_ms, 5000);
        assert_eq!(config.proxy.port, 8000);
        assert_eq!(config.colors.active_border, ratatui::style::Color::Cyan);
        assert_eq!(config.keybindings.quit, vec!["q", "Ctrl+c"]);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[api]
relays = []

[scroll]
interval_ms = 2000

[colors]
active_border = "#FF0000"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert!(config.api.relays.is_empty());
        assert_eq!(config.api.limit, 60);
        assert_eq!(config.scroll.interval_ms, 2000);
        assert_eq!(config.scroll.step_ratio, 0.9);
        assert_eq!(
            config.colors.active_border,
            ratatui::style::Color::Rgb(255, 0, 0)
        );
        assert_eq!(
            config.colors.inactive_border,
            ratatui::style::Color::DarkGray
        );
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.api.base_url, crate::fetcher::config::DEFAULT_API_URL);
        assert_eq!(config.keybindings.quit, vec!["q", "Ctrl+c"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://127.0.0.1:9999/index.php\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9999/index.php");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbroken").unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
