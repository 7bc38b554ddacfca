use std::{collections::HashMap, env, path::PathBuf};

use lazy_static::lazy_static;
use serde::Deserialize;

use directories::BaseDirs;

use crate::core::{ColumnKind, CombineMode};
use crate::tui::theme::Theme;

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Where the log file is written.
    #[serde(default)]
    pub data_dir: PathBuf,
    /// Searched for `config.json5` before the home file.
    #[serde(default)]
    pub config_dir: PathBuf,
}

/// `filter` section: defaults for newly created registries.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSettings {
    pub default_inter_mode: CombineMode,
    pub quick_filter_case_sensitive: bool,
    pub column_order: Option<Vec<usize>>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            default_inter_mode: CombineMode::And,
            quick_filter_case_sensitive: false,
            column_order: None,
        }
    }
}

/// `display` section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Rows printed by the table output.
    pub max_rows: usize,
    /// Table width when the terminal size is unknown.
    pub width: u16,
    /// `dark` or `light`.
    pub theme: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_rows: 50,
            width: 120,
            theme: "dark".to_string(),
        }
    }
}

impl DisplaySettings {
    pub fn theme(&self) -> Theme {
        match self.theme.to_lowercase().as_str() {
            "light" => Theme::light(),
            _ => Theme::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub filter: FilterSettings,
    /// Column name to operator catalogue, overriding inference.
    #[serde(default)]
    pub column_types: HashMap<String, ColumnKind>,
    #[serde(default)]
    pub display: DisplaySettings,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Layer the embedded defaults, the user's config file and
    /// `GRIDSIFT__SECTION__KEY` environment overrides.
    ///
    /// An explicit `config_path` must exist. Without one, `config.json5` in
    /// the config dir and then `~/.gridsift-config.json5` are read if present.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        builder = match config_path {
            Some(p) => builder.add_source(
                config::File::from(expand_tilde(p)).format(config::FileFormat::Json5).required(true),
            ),
            None => builder
                .add_source(
                    config::File::from(config_dir.join("config.json5"))
                        .format(config::FileFormat::Json5)
                        .required(false),
                )
                .add_source(
                    config::File::from(default_home_config_path())
                        .format(config::FileFormat::Json5)
                        .required(false),
                ),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(&PROJECT_NAME)
                .prefix_separator("__")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with("~") {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen("~", base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".gridsift-config.json5");
    }
    PathBuf::from(".gridsift-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".config")
    }
}
