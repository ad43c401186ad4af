use crate::errors::{AppError, AppResult};
use crate::suggest::{CommandSuggestionProvider, SuggestionProvider, UnconfiguredSuggestionProvider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DATA_DIR_ENV: &str = "PARA_BROWSER_DATA_DIR";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DATABASE_FILE_NAME: &str = "state.sqlite";

const MIN_TIMEOUT_SECONDS: u64 = 5;
const MAX_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub log_level: String,
    pub suggestion: SuggestionSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            suggestion: SuggestionSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestionSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_seconds: 120,
        }
    }
}

impl SuggestionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.clamp(MIN_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS))
    }

    pub fn build_provider(&self) -> Arc<dyn SuggestionProvider> {
        match self.command.as_deref().map(str::trim).filter(|command| !command.is_empty()) {
            Some(command) => Arc::new(CommandSuggestionProvider::new(command, self.args.clone(), self.timeout())),
            None => Arc::new(UnconfiguredSuggestionProvider),
        }
    }
}

pub fn resolve_data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE_NAME)
}

pub fn load_settings(data_dir: &Path) -> AppResult<AppSettings> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(AppSettings::default()),
        Err(error) => return Err(AppError::Io(format!("{}: {}", path.display(), error))),
    };
    if raw.trim().is_empty() {
        return Ok(AppSettings::default());
    }
    serde_yaml::from_str(&raw)
        .map_err(|error| AppError::Validation(format!("Invalid {}: {}", path.display(), error)))
}

#[cfg(test)]
mod tests {
    use super::{load_settings, AppSettings, SuggestionSettings};
    use std::time::Duration;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(dir.path()).expect("settings");
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.suggestion.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn reads_partial_yaml_and_clamps_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("config.yaml"),
            "logLevel: debug\nsuggestion:\n  command: para-suggest\n  args: [\"--json\"]\n  timeoutSeconds: 1\n",
        )
        .expect("write config");
        let settings = load_settings(dir.path()).expect("settings");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.suggestion.command.as_deref(), Some("para-suggest"));
        assert_eq!(settings.suggestion.args, vec!["--json".to_string()]);
        assert_eq!(settings.suggestion.timeout(), Duration::from_secs(5));

        let long = SuggestionSettings {
            timeout_seconds: 90_000,
            ..SuggestionSettings::default()
        };
        assert_eq!(long.timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.yaml"), "suggestion: [unclosed").expect("write config");
        let error = load_settings(dir.path()).expect_err("should fail");
        assert!(error.to_string().starts_with("INVALID_INPUT"));
    }
}
