use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub woo_base_url: String,
    pub woo_consumer_key: String,
    pub woo_consumer_secret: String,
    pub woo_ssl_verify: bool,
    pub woo_request_timeout_secs: u64,
    pub woo_auto_sync: bool,
    pub woo_sync_batch_size: u32,
    pub sync_max_attempts: u32,
    pub sync_backoff_base_ms: u64,
    pub sync_worker_count: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("woo_base_url", &self.woo_base_url)
            .field("woo_consumer_key", &"[redacted]")
            .field("woo_consumer_secret", &"[redacted]")
            .field("woo_ssl_verify", &self.woo_ssl_verify)
            .field("woo_request_timeout_secs", &self.woo_request_timeout_secs)
            .field("woo_auto_sync", &self.woo_auto_sync)
            .field("woo_sync_batch_size", &self.woo_sync_batch_size)
            .field("sync_max_attempts", &self.sync_max_attempts)
            .field("sync_backoff_base_ms", &self.sync_backoff_base_ms)
            .field("sync_worker_count", &self.sync_worker_count)
            .finish()
    }
}
