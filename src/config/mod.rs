pub mod settings;

use crate::core::api::{DEFAULT_BASE_URL, DEFAULT_PAGE_LIMIT};
use crate::core::file_matcher::DEFAULT_UNMATCHED_SAMPLES;
use crate::core::{ApiToken, CoreResult, FileCopier, RentmanClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "RENTMAN_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub page_limit: usize,
    pub unmatched_sample_limit: usize,
    pub last_source_folder: Option<PathBuf>,
}

impl AppConfig {
    /// A client for the configured API, authenticated with `token`.
    pub fn client(&self, token: ApiToken) -> RentmanClient {
        RentmanClient::with_token(token)
            .base_url(self.base_url.clone())
            .page_limit(self.page_limit)
    }

    pub fn copier(&self) -> FileCopier {
        FileCopier::new(self.unmatched_sample_limit)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            unmatched_sample_limit: DEFAULT_UNMATCHED_SAMPLES,
            last_source_folder: None,
        }
    }
}

/// Reads the API token from the environment.
///
/// A `.env` file is loaded first: `env_file` when given, otherwise the one
/// in the working directory. Variables already set in the process win.
pub fn load_token(env_file: Option<&Path>) -> CoreResult<ApiToken> {
    let loaded = match env_file {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
        Err(e) => tracing::debug!("No .env loaded: {}", e),
    }
    ApiToken::new(std::env::var(TOKEN_ENV).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreError;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_missing_token_is_a_configuration_error() {
        std::env::remove_var(TOKEN_ENV);
        let dir = tempdir().unwrap();
        let err = load_token(Some(&dir.path().join("absent.env"))).unwrap_err();
        assert!(matches!(err, CoreError::MissingToken));
    }

    #[test]
    #[serial]
    fn test_token_from_env_file() {
        std::env::remove_var(TOKEN_ENV);
        let dir = tempdir().unwrap();
        let env_file = dir.path().join(".env");
        fs::write(&env_file, "RENTMAN_TOKEN=abc123\n").unwrap();

        let token = load_token(Some(&env_file)).unwrap();

        assert_eq!(token.expose(), "abc123");
        std::env::remove_var(TOKEN_ENV);
    }

    #[test]
    #[serial]
    fn test_process_environment_wins() {
        std::env::set_var(TOKEN_ENV, "from-process");
        let dir = tempdir().unwrap();
        let env_file = dir.path().join(".env");
        fs::write(&env_file, "RENTMAN_TOKEN=from-file\n").unwrap();

        let token = load_token(Some(&env_file)).unwrap();

        assert_eq!(token.expose(), "from-process");
        std::env::remove_var(TOKEN_ENV);
    }

    #[test]
    #[serial]
    fn test_blank_token_is_rejected() {
        std::env::set_var(TOKEN_ENV, "   ");
        let dir = tempdir().unwrap();
        let err = load_token(Some(&dir.path().join("absent.env"))).unwrap_err();
        assert!(matches!(err, CoreError::MissingToken));
        std::env::remove_var(TOKEN_ENV);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"page_limit": 50}"#).unwrap();
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.unmatched_sample_limit, DEFAULT_UNMATCHED_SAMPLES);
    }
}
