use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use crate::config::Config;

/// How bearer tokens for Google APIs are obtained.
#[derive(Clone)]
pub enum GcpAuth {
    Static(String),
    MetadataServer { token_url: String },
}

impl std::fmt::Debug for GcpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GcpAuth::Static(_) => f.write_str("Static([REDACTED])"),
            GcpAuth::MetadataServer { token_url } => f
                .debug_struct("MetadataServer")
                .field("token_url", token_url)
                .finish(),
        }
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl GcpAuth {
    pub fn from_config(config: &Config) -> Self {
        match &config.gcp_access_token {
            Some(token) => GcpAuth::Static(token.clone()),
            None => GcpAuth::MetadataServer {
                token_url: config.metadata_token_url.clone(),
            },
        }
    }

    /// Fetches a fresh token on every call; nothing is cached between invocations.
    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String, reqwest::Error> {
        match self {
            GcpAuth::Static(token) => Ok(token.clone()),
            GcpAuth::MetadataServer { token_url } => {
                let token = http
                    .get(token_url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<MetadataToken>()
                    .await?;
                Ok(token.access_token)
            }
        }
    }

    pub async fn authorize(
        &self,
        http: &reqwest::Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, reqwest::Error> {
        let token = self.access_token(http).await?;
        Ok(request.bearer_auth(token))
    }
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Renders a failed Google API response as `<http status>: <message>`.
pub async fn describe_failure(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => match body.error.status {
            Some(kind) => format!("{} {}: {}", status, kind, body.error.message),
            None => format!("{}: {}", status, body.error.message),
        },
        Err(_) => status.to_string(),
    }
}
