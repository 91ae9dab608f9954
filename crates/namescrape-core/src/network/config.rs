use serde::{Deserialize, Serialize};

/// How documents are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User agent to use (randomized by default)
    pub user_agent: Option<String>,
    /// Connection timeout in seconds
    pub connect_timeout_seconds: u32,
    /// Request timeout in seconds
    pub request_timeout_seconds: u32,
    /// Many department sites serve broken or self-signed chains.
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_seconds: 30,
            request_timeout_seconds: 60,
            accept_invalid_certs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();

        assert!(config.user_agent.is_none());
        assert!(config.accept_invalid_certs);
        assert_eq!(config.connect_timeout_seconds, 30);
        assert_eq!(config.request_timeout_seconds, 60);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: FetchConfig =
            serde_json::from_str(r#"{"accept_invalid_certs": false, "user_agent": "probe/1.0"}"#)
                .unwrap();

        assert!(!config.accept_invalid_certs);
        assert_eq!(config.user_agent.as_deref(), Some("probe/1.0"));
        assert_eq!(config.request_timeout_seconds, 60);
    }
}
