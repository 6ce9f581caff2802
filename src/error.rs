use std::fmt;

/// The remote data providers a job can pull from.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Upstream {
    CurrencyLayer,
    FacebookAds,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Upstream::CurrencyLayer => write!(f, "currencylayer"),
            Upstream::FacebookAds => write!(f, "facebook ads"),
        }
    }
}

/// Every pipeline stage reports failure through this type.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error("secret {secret_id} is unavailable: {reason}")]
    SecretUnavailable { secret_id: String, reason: String },
    #[error("request to {upstream} failed: {reason}")]
    UpstreamTransport { upstream: Upstream, reason: String },
    #[error("{upstream} rejected the request: {reason}")]
    UpstreamRejected { upstream: Upstream, reason: String },
    #[error("analytical store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("analytical store conflict: {0}")]
    StoreConflict(String),
    #[error("unknown job type {0:?}")]
    UnknownJobType(String),
    #[error("invalid job message: {0}")]
    InvalidMessage(String),
}

impl JobError {
    pub(crate) fn transport(upstream: Upstream, error: impl fmt::Display) -> Self {
        JobError::UpstreamTransport {
            upstream,
            reason: error.to_string(),
        }
    }

    pub(crate) fn rejected(upstream: Upstream, reason: impl Into<String>) -> Self {
        JobError::UpstreamRejected {
            upstream,
            reason: reason.into(),
        }
    }

    pub(crate) fn secret(secret_id: &str, error: impl fmt::Display) -> Self {
        JobError::SecretUnavailable {
            secret_id: secret_id.to_string(),
            reason: error.to_string(),
        }
    }
}
