use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Root directory for uploads, extracted frames, crops, and clips.
    pub media_root: PathBuf,
    /// Maximum accepted upload size in megabytes (default: `500`).
    pub max_upload_mb: u64,
    /// Maximum database pool connections (default: `5`).
    pub database_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `MEDIA_ROOT`               | `media`                    |
    /// | `MAX_UPLOAD_MB`            | `500`                      |
    /// | `DATABASE_MAX_CONNECTIONS` | `5`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let media_root =
            PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into()));

        let max_upload_mb: u64 = std::env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("MAX_UPLOAD_MB must be a valid u64");

        let database_max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("DATABASE_MAX_CONNECTIONS must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            media_root,
            max_upload_mb,
            database_max_connections,
        }
    }

    /// Upload size cap in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Directory uploaded source files are stored under.
    pub fn uploads_dir(&self) -> PathBuf {
        self.media_root.join("uploads")
    }

    /// Directory exported sub-clips are written under.
    pub fn clips_dir(&self) -> PathBuf {
        self.media_root.join("clips")
    }
}
