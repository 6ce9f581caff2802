use std::str::FromStr;
use std::string::String;
use std::{env, fmt};

pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com/v1";
pub const DEFAULT_BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-account/default/token";
pub const DEFAULT_CURRENCY_API_URL: &str = "http://api.currencylayer.com/historical";
pub const DEFAULT_FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_FACEBOOK_API_VERSION: &str = "v19.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_backend: SecretBackend,
    pub secret_manager_url: String,
    pub bigquery_url: String,
    pub gcp_access_token: Option<String>,
    pub metadata_token_url: String,
    pub currency_api_url: String,
    pub facebook_graph_url: String,
    pub facebook_api_version: String,
    pub request_timeout: u64,
}

/// Where named credentials are resolved from.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SecretBackend {
    Gcp,
    Aws,
}

impl FromStr for SecretBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "Gcp" | "GCP" | "gcp" => Ok(SecretBackend::Gcp),
            "Aws" | "AWS" | "aws" => Ok(SecretBackend::Aws),
            other => Err(format!("Invalid or Unsupported secret backend {}", other)),
        }
    }
}

impl fmt::Display for SecretBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Config {
    pub fn load_from_env() -> Result<Config, String> {
        let conf = Config {
            secret_backend: env::var("SECRET_BACKEND")
                .unwrap_or("Gcp".to_string())
                .parse::<SecretBackend>()?,
            secret_manager_url: env::var("SECRET_MANAGER_URL")
                .unwrap_or(DEFAULT_SECRET_MANAGER_URL.to_string()),
            bigquery_url: env::var("BIGQUERY_URL").unwrap_or(DEFAULT_BIGQUERY_URL.to_string()),
            gcp_access_token: env::var("GCP_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            metadata_token_url: env::var("GCP_METADATA_TOKEN_URL")
                .unwrap_or(DEFAULT_METADATA_TOKEN_URL.to_string()),
            currency_api_url: env::var("CURRENCY_API_URL")
                .unwrap_or(DEFAULT_CURRENCY_API_URL.to_string()),
            facebook_graph_url: env::var("FACEBOOK_GRAPH_URL")
                .unwrap_or(DEFAULT_FACEBOOK_GRAPH_URL.to_string()),
            facebook_api_version: env::var("FACEBOOK_API_VERSION")
                .unwrap_or(DEFAULT_FACEBOOK_API_VERSION.to_string()),
            request_timeout: env::var("REQUEST_TIMEOUT")
                .unwrap_or("30".to_string())
                .parse::<u64>()
                .map_err(|e| format!("Error parsing REQUEST_TIMEOUT to u64 - {}", e))?,
        };

        Ok(conf)
    }
}
