use chrono::NaiveDate;
use hmac::{Hmac, Mac};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, error, info};

use crate::error::{JobError, Upstream};

type HmacSha256 = Hmac<Sha256>;

const INSIGHT_FIELDS: &[&str] = &[
    "account_id",
    "campaign_id",
    "campaign_name",
    "adset_name",
    "adset_id",
    "ad_name",
    "ad_id",
    "spend",
    "impressions",
    "clicks",
    "actions",
    "conversions",
];

/// Credentials for one ads API session.
#[derive(Clone)]
pub struct FacebookCredentials {
    pub app_id: String,
    pub app_secret: String,
    pub access_token: String,
}

impl FacebookCredentials {
    /// HMAC-SHA256 of the access token keyed with the app secret, hex encoded.
    pub fn appsecret_proof(&self) -> Result<String, JobError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.app_secret.as_bytes()).map_err(
            |e| JobError::transport(Upstream::FacebookAds, format!("cannot sign request - {}", e)),
        )?;
        mac.update(self.access_token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for FacebookCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionValue {
    pub action_type: String,
    #[serde(deserialize_with = "text")]
    pub value: String,
}

/// One ad's metrics for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdInsightRecord {
    pub date: String,
    pub ad_id: String,
    pub ad_name: String,
    pub adset_id: String,
    pub adset_name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub clicks: i64,
    pub impressions: i64,
    pub spend: f64,
    pub conversions: Vec<ActionValue>,
    pub actions: Vec<ActionValue>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct InsightRow {
    date_start: String,
    ad_id: String,
    ad_name: String,
    adset_id: String,
    adset_name: String,
    campaign_id: String,
    campaign_name: String,
    #[serde(default, deserialize_with = "integer")]
    clicks: i64,
    #[serde(default, deserialize_with = "integer")]
    impressions: i64,
    #[serde(default, deserialize_with = "float")]
    spend: f64,
    #[serde(default)]
    actions: Option<Vec<ActionValue>>,
    #[serde(default)]
    conversions: Option<Vec<ActionValue>>,
}

impl From<InsightRow> for AdInsightRecord {
    fn from(row: InsightRow) -> Self {
        AdInsightRecord {
            date: row.date_start,
            ad_id: row.ad_id,
            ad_name: row.ad_name,
            adset_id: row.adset_id,
            adset_name: row.adset_name,
            campaign_id: row.campaign_id,
            campaign_name: row.campaign_name,
            clicks: row.clicks,
            impressions: row.impressions,
            spend: row.spend,
            conversions: row.conversions.unwrap_or_default(),
            actions: row.actions.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<InsightRow>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize, Debug)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GraphErrorBody {
    error: GraphError,
}

#[derive(Deserialize, Debug)]
struct GraphError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

// The ads API reports numbers as strings; accept either.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => v.to_string(),
        Scalar::Float(v) => v.to_string(),
        Scalar::Text(v) => v,
    })
}

fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v),
        Scalar::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        Scalar::Float(v) => Err(de::Error::custom(format!("expected a whole count, got {}", v))),
        Scalar::Text(v) => v.trim().parse::<i64>().map_err(de::Error::custom),
    }
}

fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(v) => Ok(v as f64),
        Scalar::Float(v) => Ok(v),
        Scalar::Text(v) => v.trim().parse::<f64>().map_err(de::Error::custom),
    }
}

fn account_node(account_id: &str) -> String {
    if account_id.starts_with("act_") {
        account_id.to_string()
    } else {
        format!("act_{}", account_id)
    }
}

/// Client for the Graph API ad insights edge.
pub struct FacebookClient {
    http: reqwest::Client,
    graph_url: String,
    api_version: String,
}

impl FacebookClient {
    pub fn new(http: reqwest::Client, graph_url: &str, api_version: &str) -> Self {
        FacebookClient {
            http,
            graph_url: graph_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        }
    }

    /// Ad-level insights of `account_id` for the single day `date`, across all result pages.
    pub async fn ad_insights(
        &self,
        credentials: &FacebookCredentials,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AdInsightRecord>, JobError> {
        let url = format!(
            "{}/{}/{}/insights",
            self.graph_url,
            self.api_version,
            account_node(account_id)
        );
        let day = date.format("%Y-%m-%d").to_string();
        let time_range = serde_json::json!({"since": day, "until": day}).to_string();
        debug!(
            "opening ads session for app {} on {} ({})",
            credentials.app_id, url, day
        );

        let proof = credentials.appsecret_proof()?;
        let mut request = self.http.get(&url).query(&[
            ("fields", INSIGHT_FIELDS.join(",")),
            ("level", "ad".to_string()),
            ("time_range", time_range),
            ("time_increment", "1".to_string()),
            ("access_token", credentials.access_token.clone()),
            ("appsecret_proof", proof),
        ]);

        let mut records = Vec::new();
        let mut pages = 0;
        loop {
            let page = fetch_page(request).await?;
            pages += 1;
            let fetched = page.data.len();
            records.extend(page.data.into_iter().map(AdInsightRecord::from));

            match page.paging.and_then(|p| p.next) {
                Some(next) if fetched > 0 => request = self.http.get(next),
                _ => break,
            }
        }

        info!(
            "Fetched {} ad insight rows for {} in {} pages",
            records.len(),
            account_node(account_id),
            pages
        );
        Ok(records)
    }
}

async fn fetch_page(request: reqwest::RequestBuilder) -> Result<InsightsPage, JobError> {
    let response = request.send().await.map_err(|e| {
        let e = e.without_url();
        error!("request to facebook ads error: {}", e);
        JobError::transport(Upstream::FacebookAds, e)
    })?;

    let status = response.status();
    if !status.is_success() {
        let reason = match response.json::<GraphErrorBody>().await {
            Ok(GraphErrorBody { error }) => match (error.kind, error.code) {
                (Some(kind), Some(code)) => format!("{} ({} {})", error.message, kind, code),
                _ => error.message,
            },
            Err(_) => status.to_string(),
        };
        error!("request to facebook ads error: {}", reason);
        return Err(JobError::rejected(Upstream::FacebookAds, reason));
    }

    response.json::<InsightsPage>().await.map_err(|e| {
        let e = e.without_url();
        error!("unreadable facebook ads response: {}", e);
        JobError::transport(Upstream::FacebookAds, e)
    })
}
