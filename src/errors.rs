use serde::Serialize;
use thiserror::Error;

/// Failures a caller of the resolution pipeline can see.
///
/// Provider-level problems never show up here individually; they are folded
/// into `causes` once every provider has been tried.
#[derive(Debug, Error, Serialize, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum ResolveError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("No data found for this track ({})", .causes.join("; "))]
    NoData { causes: Vec<String> },

    #[error("Upstream error while resolving track ({})", .causes.join("; "))]
    Upstream { causes: Vec<String> },
}

/// Failure to assemble the pipeline from configuration.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ServiceError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::HttpClient(e.to_string())
    }
}

impl ResolveError {
    pub fn causes(&self) -> &[String] {
        match self {
            ResolveError::MissingInput(_) => &[],
            ResolveError::NoData { causes } | ResolveError::Upstream { causes } => causes,
        }
    }
}
