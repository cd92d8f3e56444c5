use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the default config location
pub const CONFIG_PATH_ENV: &str = "NODEVIEW_CONFIG";

/// Spacing scale used by hosted components on touch platforms
pub const MOBILE_SPACE: [u32; 4] = [0, 10, 12, 20];

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

/// Host platform the editor surface runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Desktop,
    Android,
    Ios,
}

impl Platform {
    /// Touch platforms need the drag/drop keyboard workarounds
    pub fn is_mobile(self) -> bool {
        matches!(self, Platform::Android | Platform::Ios)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSection {
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default)]
    pub platform: Platform,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            editable: default_editable(),
            platform: Platform::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSection {
    #[serde(default = "default_theme_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Vec<u32>>,
}

impl Default for ThemeSection {
    fn default() -> Self {
        Self {
            name: default_theme_name(),
            space: None,
        }
    }
}

fn default_editable() -> bool {
    true
}

fn default_theme_name() -> String {
    "light".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub theme: ThemeSection,
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

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

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

    /// Location of the config file, honouring `NODEVIEW_CONFIG` when set
    pub fn config_path() -> PathBuf {
        if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
            let custom = PathBuf::from(custom);
            return Self::expand_path(&custom).unwrap_or(custom);
        }
        let config_dir = shellexpand::tilde("~/.config/nodeview");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Spacing scale for hosted components: explicit setting first, then the
    /// touch-platform default
    pub fn theme_space(&self) -> Option<Vec<u32>> {
        self.theme.space.clone().or_else(|| {
            self.editor
                .platform
                .is_mobile()
                .then(|| MOBILE_SPACE.to_vec())
        })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_editable_desktop() {
        let config = Config::default();

        assert!(config.editor.editable);
        assert_eq!(config.editor.platform, Platform::Desktop);
        assert_eq!(config.theme.name, "light");
        assert_eq!(config.theme_space(), None);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_platform_parses_lowercase() {
        let config_content = r#"
[editor]
editable = false
platform = "android"
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert!(!config.editor.editable);
        assert_eq!(config.editor.platform, Platform::Android);
        assert!(config.editor.platform.is_mobile());
    }

    #[test]
    fn test_mobile_platform_defaults_space_scale() {
        let mut config = Config::default();
        config.editor.platform = Platform::Ios;

        assert_eq!(config.theme_space(), Some(MOBILE_SPACE.to_vec()));
    }

    #[test]
    fn test_explicit_space_wins_over_platform_default() {
        let config_content = r#"
[editor]
platform = "ios"

[theme]
name = "dark"
space = [0, 4, 8]
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.theme.name, "dark");
        assert_eq!(config.theme_space(), Some(vec![0, 4, 8]));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = Config::default();
        original.editor.platform = Platform::Android;
        original.theme.space = Some(vec![1, 2]);

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[editor]\nplatform = 42\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.theme.name = "solarized".to_string();

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_config_path_env_override() {
        unsafe {
            std::env::set_var("NODEVIEW_TEST_ROOT", "/custom/root");
            std::env::set_var(CONFIG_PATH_ENV, "$NODEVIEW_TEST_ROOT/nodeview.toml");
        }

        let config_path = Config::config_path();

        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
            std::env::remove_var("NODEVIEW_TEST_ROOT");
        }

        assert_eq!(config_path, PathBuf::from("/custom/root/nodeview.toml"));
    }
}
