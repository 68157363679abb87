use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

const REDACTED: &str = "***";

/// Connection settings for one MySQL schema
#[derive(Debug, Clone, Serialize)]
pub struct SqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema (database) name, e.g. `p122vm`
    pub schema: String,
    /// URL scheme, `mysql` unless a proxy driver is used
    pub connector: String,
    /// Log every statement
    pub echo: bool,
}

impl SqlConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>, prefix: &str, schema: &str) -> Self {
        let key = |name: &str| format!("{}_{}", prefix, name);

        Self {
            host: lookup(&key("HOST")).unwrap_or_else(|| "192.168.1.3".to_string()),
            port: parse_or(lookup(&key("PORT")), 3306),
            user: lookup(&key("USER")).unwrap_or_else(|| "dbuser".to_string()),
            password: lookup(&key("PASSWORD")).unwrap_or_else(|| "dbpassword".to_string()),
            schema: lookup(&key("SCHEMA")).unwrap_or_else(|| schema.to_string()),
            connector: lookup(&key("CONNECTOR")).unwrap_or_else(|| "mysql".to_string()),
            echo: parse_bool_or(lookup(&key("ECHO")), false),
        }
    }

    pub fn connection_url(&self) -> String {
        format!(
            "{}://{}:{}@{}:{}/{}",
            self.connector, self.user, self.password, self.host, self.port, self.schema
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Logical database number
    pub schema: String,
    /// Prefix applied to every key this service touches
    pub namespace: String,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.schema)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggerConfig {
    pub verbose: bool,
    pub file_path: PathBuf,
}

impl LoggerConfig {
    pub fn level_name(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Development (test) mode; production when false
    pub development: bool,
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds, 0 disables it
    pub timeout: u64,
    /// Runtime worker threads, 0 picks a value from the CPU count
    pub workers: usize,
    /// Regex patterns matched against the client IP
    pub trusted_hosts: Vec<String>,
    /// URL fragments rejected outside development
    pub banned_routes: Vec<String>,
    pub logger: LoggerConfig,
    pub s11_db: SqlConfig,
    pub logger_db: SqlConfig,
    pub kladr_db: SqlConfig,
    pub redis: RedisConfig,
    /// Base URL of the Vista3 service
    pub semd_service_url: String,
    /// Max concurrent SEMD status lookups
    pub semd_concurrency: usize,
    /// Background monitoring period in seconds, 0 disables it
    pub semd_poll_interval: u64,
    pub pid_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            development: parse_bool_or(lookup("DEVELOPMENT"), true),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(lookup("PORT"), 5055),
            timeout: parse_or(lookup("TIMEOUT"), 0),
            workers: parse_or(lookup("WORKERS"), 0),
            trusted_hosts: lookup("TRUSTED_HOSTS")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| vec![".*".to_string()]),
            banned_routes: lookup("BANNED_ROUTES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            logger: LoggerConfig {
                verbose: parse_bool_or(lookup("VERBOSE_LOG"), true),
                file_path: lookup("LOG_FILE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("log.log")),
            },
            s11_db: SqlConfig::load(&lookup, "S11_DB", "p122vm"),
            logger_db: SqlConfig::load(&lookup, "LOGGER_DB", "logger"),
            kladr_db: SqlConfig::load(&lookup, "KLADR_DB", "kladr"),
            redis: RedisConfig {
                host: lookup("REDIS_HOST").unwrap_or_else(|| "example".to_string()),
                port: parse_or(lookup("REDIS_PORT"), 6379),
                schema: lookup("REDIS_SCHEMA").unwrap_or_else(|| "0".to_string()),
                namespace: lookup("REDIS_NAMESPACE").unwrap_or_else(|| "vista".to_string()),
            },
            semd_service_url: lookup("SEMD_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:5050".to_string()),
            semd_concurrency: parse_or(lookup("SEMD_CONCURRENCY"), 8).max(1),
            semd_poll_interval: parse_or(lookup("SEMD_POLL_INTERVAL"), 0),
            pid_dir: lookup("PID_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".pids")),
        }
    }

    /// Worker thread count for the runtime, `None` keeps the runtime default
    pub fn worker_threads(&self) -> Option<usize> {
        if self.development {
            return None;
        }
        if self.workers > 0 {
            return Some(self.workers);
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Some(cpus * 2 + 1)
    }

    /// Copy of the config that is safe to show over HTTP
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        for db in [
            &mut config.s11_db,
            &mut config.logger_db,
            &mut config.kladr_db,
        ] {
            db.password = REDACTED.to_string();
        }
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
