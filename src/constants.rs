pub(crate) const DEFAULT_PORT: u16 = 3000;
pub(crate) const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_STATIC_DIR: &str = "./static";
pub(crate) const SHUTDOWN_BUFFER: usize = 4;
