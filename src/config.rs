use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SESSION_FILE: &str = ".mdd-session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn api_url() -> String {
    std::env::var("MDD_API_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

pub fn timeout_secs() -> u64 {
    std::env::var("MDD_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

pub fn session_file() -> PathBuf {
    std::env::var("MDD_SESSION_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
}

pub fn register_auto_login() -> bool {
    std::env::var("MDD_REGISTER_AUTO_LOGIN")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Root of the REST API, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    pub timeout: Duration,
    /// Where the CLI keeps the token and user snapshot between runs.
    pub session_file: PathBuf,
    /// Whether a successful registration immediately logs the new account in.
    pub auto_login_after_register: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self {
            base_url: api_url(),
            timeout: Duration::from_secs(timeout_secs()),
            session_file: session_file(),
            auto_login_after_register: register_auto_login(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            auto_login_after_register: false,
        }
    }
}
