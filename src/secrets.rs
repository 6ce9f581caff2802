use async_trait::async_trait;
use aws_config::SdkConfig;
use base64::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::error::JobError;
use crate::gcp::{self, GcpAuth};

/// Resolves named credentials from a managed secret store. Every call is a
/// fresh remote lookup of the latest version.
#[async_trait]
pub trait SecretAccessor: Send + Sync {
    async fn get_secret(&self, project_id: &str, secret_id: &str) -> Result<String, JobError>;
}

/// Google Secret Manager over its REST API.
pub struct GcpSecretManager {
    http: reqwest::Client,
    base_url: String,
    auth: GcpAuth,
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

impl GcpSecretManager {
    pub fn new(http: reqwest::Client, base_url: &str, auth: GcpAuth) -> Self {
        GcpSecretManager {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn version_url(&self, project_id: &str, secret_id: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, project_id, secret_id
        )
    }
}

#[async_trait]
impl SecretAccessor for GcpSecretManager {
    async fn get_secret(&self, project_id: &str, secret_id: &str) -> Result<String, JobError> {
        let url = self.version_url(project_id, secret_id);
        debug!("accessing secret version {}", url);

        let request = self
            .auth
            .authorize(&self.http, self.http.get(&url))
            .await
            .map_err(|e| JobError::secret(secret_id, e))?;
        let response = request
            .send()
            .await
            .map_err(|e| JobError::secret(secret_id, e))?;

        if !response.status().is_success() {
            let reason = gcp::describe_failure(response).await;
            return Err(JobError::secret(secret_id, reason));
        }

        let body = response
            .json::<AccessSecretVersionResponse>()
            .await
            .map_err(|e| JobError::secret(secret_id, e))?;
        let bytes = BASE64_STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| JobError::secret(secret_id, e))?;
        String::from_utf8(bytes).map_err(|_| JobError::secret(secret_id, "payload is not valid UTF-8"))
    }
}

/// AWS Secrets Manager. Secrets are addressed as `{project_id}/{secret_id}`.
pub struct AwsSecretsManager {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretsManager {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        AwsSecretsManager {
            client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }

    pub fn from_client(client: aws_sdk_secretsmanager::Client) -> Self {
        AwsSecretsManager { client }
    }
}

#[async_trait]
impl SecretAccessor for AwsSecretsManager {
    async fn get_secret(&self, project_id: &str, secret_id: &str) -> Result<String, JobError> {
        let name = format!("{}/{}", project_id, secret_id);
        let response = self
            .client
            .get_secret_value()
            .secret_id(name.clone())
            .send()
            .await
            .map_err(|error| {
                JobError::secret(
                    secret_id,
                    format!("{}: {:?}", name, error.into_service_error()),
                )
            })?;

        response
            .secret_string
            .ok_or_else(|| JobError::secret(secret_id, format!("{} has no string value", name)))
    }
}
