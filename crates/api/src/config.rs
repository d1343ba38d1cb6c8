use std::path::PathBuf;
use std::str::FromStr;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Served under `/static`; rendered videos live in its `videos/` folder.
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Read settings from the environment.
    ///
    /// | Env Var                | Default                       |
    /// |------------------------|-------------------------------|
    /// | `HOST`                 | `0.0.0.0`                     |
    /// | `PORT`                 | `3000`                        |
    /// | `DATABASE_URL`         | `sqlite:newsreel.db?mode=rwc` |
    /// | `STATIC_DIR`           | `static`                      |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                          |
    ///
    /// `CORS_ORIGINS` is comma-separated. Panics on unparsable numbers.
    pub fn from_env() -> Self {
        Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parsed_or("PORT", 3000),
            database_url: var_or("DATABASE_URL", "sqlite:newsreel.db?mode=rwc"),
            static_dir: PathBuf::from(var_or("STATIC_DIR", "static")),
            cors_origins: split_origins(&var_or("CORS_ORIGINS", "http://localhost:5173")),
            request_timeout_secs: parsed_or("REQUEST_TIMEOUT_SECS", 30),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
