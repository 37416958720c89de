use std::time::Duration;

use log::*;

const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8081";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Scheme, host and port of the accrual service, without a trailing slash.
    pub base_url: String,
    /// Upper bound on a single request, including connecting and reading the body.
    pub timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_ACCRUAL_ADDRESS.to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

impl AccrualConfig {
    pub fn new<S: AsRef<str>>(address: S) -> Self {
        Self { base_url: normalize_base_url(address.as_ref()), ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("LOYALTY_ACCRUAL_SYSTEM_ADDRESS")
            .or_else(|_| std::env::var("ACCRUAL_SYSTEM_ADDRESS"))
            .map(|s| normalize_base_url(&s))
            .unwrap_or_else(|_| {
                warn!("🪛️ LOYALTY_ACCRUAL_SYSTEM_ADDRESS not set, using {DEFAULT_ACCRUAL_ADDRESS} as default");
                DEFAULT_ACCRUAL_ADDRESS.to_string()
            });
        let timeout = std::env::var("LOYALTY_ACCRUAL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for LOYALTY_ACCRUAL_TIMEOUT_SECS: {s}. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { base_url, timeout }
    }
}

/// Accepts bare `host:port` addresses as well as full URLs.
fn normalize_base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else if address.starts_with(':') {
        format!("http://localhost{address}")
    } else {
        format!("http://{address}")
    }
}
