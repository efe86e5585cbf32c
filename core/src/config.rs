//! Client configuration.

use std::time::Duration;

/// Default base URL of the mailform API.
pub const DEFAULT_BASE_URL: &str = "https://www.mailform.io/app/api/v1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration used to build a `MailformClient`.
///
/// An empty `base_url` or a zero `timeout` falls back to the defaults when
/// the client is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Bearer token sent with every request.
    pub token: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn resolved_base_url(&self) -> &str {
        if self.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            &self.base_url
        }
    }

    pub fn resolved_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let config = Config::default();
        assert_eq!(config.resolved_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.resolved_timeout(), Duration::from_secs(15));
        assert!(config.token.is_empty());
    }

    #[test]
    fn overrides_are_kept_verbatim() {
        let config = Config::new("someToken")
            .with_base_url("customBaseURL")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.token, "someToken");
        assert_eq!(config.resolved_base_url(), "customBaseURL");
        assert_eq!(config.resolved_timeout(), Duration::from_millis(250));
    }
}
