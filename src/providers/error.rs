use serde::Serialize;
use thiserror::Error;

/// Failure of a single provider. The resolver contains these; they never
/// reach the caller directly.
#[derive(Debug, Error, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum ProviderError {
    #[error("Credentials are missing or empty")]
    AuthConfig,

    #[error("Token exchange failed with status {status}: {body}")]
    AuthExchange { status: u16, body: String },

    #[error("Authorization rejected after token refresh")]
    Unauthorized,

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Local analysis is not available in this runtime")]
    AnalysisUnavailable,

    #[error("Audio analysis failed: {0}")]
    Analysis(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Whether the failure came from talking to a remote service rather
    /// than from the service having no data.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthExchange { .. }
                | ProviderError::Unauthorized
                | ProviderError::Network(_)
                | ProviderError::Parse(_)
        )
    }

    /// Credential or authorization failures. These end a provider's attempt
    /// outright instead of moving on to its next fallback step.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthConfig
                | ProviderError::AuthExchange { .. }
                | ProviderError::Unauthorized
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(ProviderError::Network("timeout".into()).is_upstream());
        assert!(ProviderError::Unauthorized.is_upstream());
        assert!(ProviderError::AuthExchange {
            status: 400,
            body: "invalid_client".into()
        }
        .is_upstream());
        assert!(!ProviderError::Unavailable("no track found".into()).is_upstream());
        assert!(!ProviderError::AuthConfig.is_upstream());
        assert!(!ProviderError::AnalysisUnavailable.is_upstream());
    }

    #[test]
    fn test_auth_classification() {
        assert!(ProviderError::AuthConfig.is_auth());
        assert!(ProviderError::Unauthorized.is_auth());
        assert!(ProviderError::AuthExchange {
            status: 401,
            body: String::new()
        }
        .is_auth());
        assert!(!ProviderError::Parse("invalid expires_in 0".into()).is_auth());
        assert!(!ProviderError::Network("timeout".into()).is_auth());
    }
}
