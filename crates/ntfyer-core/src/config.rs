//! Runtime configuration for ntfyer
//!
//! Everything the process reads from its environment, parsed and validated
//! once at startup.

use std::path::PathBuf;

use crate::store::StoreConfig;

/// Environment variable selecting the run mode (`dev` or `prod`)
pub const ENV_ENVIRON: &str = "NTFYER_ENVIRON";

/// Environment variable overriding the store location
pub const ENV_STORE_PATH: &str = "NTFYER_STORE_PATH";

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "NTFYER_LOG_LEVEL";

/// Store file name used when no path is configured
pub const DEFAULT_STORE_FILE: &str = "settings.db";

/// Log targets that follow the effective log level
pub const LOG_TARGETS: [&str; 3] = ["ntfyer", "ntfyer_core", "ntfyer_notifier_http"];

/// Level applied to every other target (HTTP client internals)
pub const DEPENDENCY_LOG_LEVEL: &str = "warn";

/// Run mode
///
/// `Dev` turns on verbose storage logging; `Prod` keeps the output quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environ {
    /// Verbose storage logging
    #[default]
    Dev,
    /// Quiet mode
    Prod,
}

impl Environ {
    /// Parse a run mode; only `dev` (any case) selects [`Environ::Dev`]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("dev") {
            Environ::Dev
        } else {
            Environ::Prod
        }
    }

    /// Whether storage operations should be logged
    pub fn verbose_storage(&self) -> bool {
        matches!(self, Environ::Dev)
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Run mode
    pub environ: Environ,

    /// Where the settings store lives
    pub store_path: PathBuf,

    /// Explicit log level, overriding the run-mode default
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Build the configuration from an environment lookup
    ///
    /// `default_dir` is where the store lives when no path is configured;
    /// the binary passes the directory of its own executable.
    pub fn from_lookup<F>(lookup: F, default_dir: impl Into<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            environ: lookup(ENV_ENVIRON)
                .map(|raw| Environ::parse(&raw))
                .unwrap_or_default(),
            store_path: lookup(ENV_STORE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| default_dir.into().join(DEFAULT_STORE_FILE)),
            log_level: lookup(ENV_LOG_LEVEL),
        }
    }

    /// Build the configuration from the process environment
    pub fn from_env(default_dir: impl Into<PathBuf>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), default_dir)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.store_path.as_os_str().is_empty() {
            return Err(crate::Error::config(format!(
                "{} cannot be empty",
                ENV_STORE_PATH
            )));
        }

        if self.store_path.is_dir() {
            return Err(crate::Error::config(format!(
                "{} points to a directory: {}",
                ENV_STORE_PATH,
                self.store_path.display()
            )));
        }

        if let Some(ref level) = self.log_level {
            match level.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                _ => {
                    return Err(crate::Error::config(format!(
                        "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                        ENV_LOG_LEVEL, level
                    )));
                }
            }
        }

        Ok(())
    }

    /// The store backend implied by the configured path
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from_path(&self.store_path)
    }

    /// Effective log level: explicit setting, else `debug` in dev mode, else `warn`
    pub fn effective_log_level(&self) -> String {
        match self.log_level {
            Some(ref level) => level.to_lowercase(),
            None if self.environ.verbose_storage() => "debug".to_string(),
            None => "warn".to_string(),
        }
    }

    /// Filter directives for the log subscriber
    ///
    /// Only ntfyer's own targets follow the effective level; dependencies
    /// stay at `warn`.
    pub fn log_directives(&self) -> String {
        let level = self.effective_log_level();
        let mut directives = DEPENDENCY_LOG_LEVEL.to_string();
        for target in LOG_TARGETS {
            directives.push_str(&format!(",{}={}", target, level));
        }
        directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned(), "/opt/ntfyer")
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.environ, Environ::Dev);
        assert_eq!(config.store_path, PathBuf::from("/opt/ntfyer/settings.db"));
        assert_eq!(config.store_config().type_name(), "sqlite");
        assert_eq!(config.effective_log_level(), "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prod_is_quiet() {
        let config = config_from(&[(ENV_ENVIRON, "prod")]);

        assert_eq!(config.environ, Environ::Prod);
        assert_eq!(config.effective_log_level(), "warn");
    }

    #[test]
    fn test_explicit_log_level_wins() {
        let config = config_from(&[(ENV_ENVIRON, "prod"), (ENV_LOG_LEVEL, "INFO")]);
        assert_eq!(config.effective_log_level(), "info");
    }

    #[test]
    fn test_log_directives_scope_verbosity_to_ntfyer() {
        let config = config_from(&[]);
        let directives = config.log_directives();

        assert!(directives.starts_with("warn,"), "{directives}");
        assert!(directives.contains("ntfyer_core=debug"));
        assert!(directives.contains("ntfyer=debug"));
        assert!(!directives.contains("reqwest"));
        assert!(!directives.contains("hyper"));

        let quiet = config_from(&[(ENV_ENVIRON, "prod")]);
        assert_eq!(
            quiet.log_directives(),
            "warn,ntfyer=warn,ntfyer_core=warn,ntfyer_notifier_http=warn"
        );
    }

    #[test]
    fn test_store_path_override() {
        let config = config_from(&[(ENV_STORE_PATH, "/tmp/ntfyer/settings.json")]);

        assert_eq!(config.store_path, PathBuf::from("/tmp/ntfyer/settings.json"));
        assert_eq!(config.store_config().type_name(), "file");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[(ENV_LOG_LEVEL, "loud")]).validate().is_err());
        assert!(config_from(&[(ENV_STORE_PATH, "")]).validate().is_err());
    }
}
