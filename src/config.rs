//! Layered settings.
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - a TOML file (`<config dir>/lilnas/settings.toml` unless a path is given)
//! - environment variables prefixed with `LILNAS_`, using `__` between nesting
//!   levels, e.g. `LILNAS_WATCH__PATH=/srv/share` or `LILNAS_LOGGING__DEFAULT=debug`
//!
//! ```toml
//! [watch]
//! path = "/srv/share"
//!
//! [logging]
//! default = "info"
//!
//! [logging.modules]
//! notify = "warn"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{WatchError, WatchResult};

const ENV_PREFIX: &str = "LILNAS_";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct WatchConfig {
    /// Path to watch when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for everything without a module override.
    #[serde(default = "default_level")]
    pub default: String,

    /// Per-target level overrides, e.g. `notify = "warn"`.
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Default location of the settings file, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lilnas").join("settings.toml"))
    }

    /// Loads from the default file location (if any) and the environment.
    pub fn load() -> WatchResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if let Some(path) = Self::default_path() {
            figment = figment.merge(Toml::file(path));
        }

        Self::extract(figment)
    }

    /// Loads from an explicit file and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> WatchResult<Self> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Toml::file(path.as_ref())),
        )
    }

    fn extract(figment: Figment) -> WatchResult<Self> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| WatchError::Config(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_have_no_path_and_info_logging() {
        let settings = Settings::default();
        assert_eq!(settings.watch.path, None);
        assert_eq!(settings.logging.default, "info");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.toml",
                r#"
                [watch]
                path = "/srv/share"

                [logging]
                default = "debug"

                [logging.modules]
                notify = "warn"
                "#,
            )?;

            let settings = Settings::load_from("settings.toml").map_err(|e| e.to_string())?;
            assert_eq!(settings.watch.path, Some(PathBuf::from("/srv/share")));
            assert_eq!(settings.logging.default, "debug");
            assert_eq!(settings.logging.modules["notify"], "warn");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.toml", "[watch]\npath = \"/from/file\"\n")?;
            jail.set_env("LILNAS_WATCH__PATH", "/from/env");
            jail.set_env("LILNAS_LOGGING__DEFAULT", "trace");

            let settings = Settings::load_from("settings.toml").map_err(|e| e.to_string())?;
            assert_eq!(settings.watch.path, Some(PathBuf::from("/from/env")));
            assert_eq!(settings.logging.default, "trace");
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let settings = Settings::load_from("absent.toml").map_err(|e| e.to_string())?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("settings.toml", "[watch\npath = 1")?;

            let err = Settings::load_from("settings.toml").unwrap_err();
            assert!(matches!(err, WatchError::Config(_)));
            Ok(())
        });
    }
}
