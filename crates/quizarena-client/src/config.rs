//! Client configuration.

use std::path::PathBuf;

use directories::ProjectDirs;

use quizarena_shared::constants::DEFAULT_HTTP_PORT;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend.
    /// Env: `QUIZARENA_SERVER_URL`
    /// Default: `http://localhost:8080`
    pub server_url: String,

    /// Where the profile, daily state and question bank are cached.
    /// Env: `QUIZARENA_CACHE_DIR`
    /// Default: the platform data directory.
    pub cache_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://localhost:{DEFAULT_HTTP_PORT}"),
            cache_dir: default_cache_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("QUIZARENA_SERVER_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.server_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid QUIZARENA_SERVER_URL, using default");
            }
        }

        if let Ok(dir) = std::env::var("QUIZARENA_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        config
    }

    /// Full URL for an API path such as `/api/auth/me`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }
}

fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("com", "quizarena", "quizarena")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".quizarena"))
}
