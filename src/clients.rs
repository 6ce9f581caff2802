use aws_config::BehaviorVersion;
use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, SecretBackend};
use crate::gcp::GcpAuth;
use crate::secrets::{AwsSecretsManager, GcpSecretManager, SecretAccessor};
use crate::sources::{CurrencyClient, FacebookClient};
use crate::store::{AnalyticalStore, BigQueryClient};

/// A type used to hold the clients required to interact with the secret
/// store, the data providers and the analytical store.
#[derive(Clone)]
pub struct Clients {
    pub secrets: Arc<dyn SecretAccessor>,
    pub store: Arc<dyn AnalyticalStore>,
    pub currency: Arc<CurrencyClient>,
    pub facebook: Arc<FacebookClient>,
}

impl Clients {
    /// Wires the data providers from `config` around the given secret and
    /// store backends.
    pub fn new(
        config: &Config,
        secrets: Arc<dyn SecretAccessor>,
        store: Arc<dyn AnalyticalStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = http_client(config)?;
        Ok(Clients {
            secrets,
            store,
            currency: Arc::new(CurrencyClient::new(http.clone(), &config.currency_api_url)),
            facebook: Arc::new(FacebookClient::new(
                http,
                &config.facebook_graph_url,
                &config.facebook_api_version,
            )),
        })
    }

    /// Builds every client from `config`, loading AWS configuration only when
    /// secrets come from AWS.
    pub async fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = http_client(config)?;
        let auth = GcpAuth::from_config(config);

        let secrets: Arc<dyn SecretAccessor> = match config.secret_backend {
            SecretBackend::Gcp => Arc::new(GcpSecretManager::new(
                http.clone(),
                &config.secret_manager_url,
                auth.clone(),
            )),
            SecretBackend::Aws => {
                let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
                Arc::new(AwsSecretsManager::new(&sdk_config))
            }
        };
        let store = Arc::new(BigQueryClient::new(http, &config.bigquery_url, auth));

        Clients::new(config, secrets, store)
    }
}

pub fn http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout))
        .build()
}
