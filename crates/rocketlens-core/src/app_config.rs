use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
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
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the WING seller back office (search + vendor-return APIs).
    pub wing_base_url: String,
    /// Base URL of the retail storefront (quantity-info API).
    pub retail_base_url: String,
    /// Session XSRF token scoped to the vendor domain. Absence is surfaced
    /// as `Unauthenticated` at call time, never as a config failure.
    pub session_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on concurrently in-flight per-item lookups.
    pub max_concurrent_lookups: usize,
    pub export_dir: PathBuf,
    pub vendor_return_page_size: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("wing_base_url", &self.wing_base_url)
            .field("retail_base_url", &self.retail_base_url)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_lookups", &self.max_concurrent_lookups)
            .field("export_dir", &self.export_dir)
            .field("vendor_return_page_size", &self.vendor_return_page_size)
            .finish()
    }
}
