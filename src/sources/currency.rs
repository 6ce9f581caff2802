use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error};

use crate::error::{JobError, Upstream};

/// One day's rate for a currency pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRateRecord {
    pub date: NaiveDate,
    pub currencies: String,
    pub rate: f64,
}

#[derive(Deserialize, Debug)]
struct HistoricalResponse {
    success: bool,
    #[serde(default)]
    quotes: HashMap<String, f64>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Deserialize, Debug)]
struct ProviderError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    info: String,
}

/// Client for the currencylayer historical endpoint.
pub struct CurrencyClient {
    http: reqwest::Client,
    url: String,
}

impl CurrencyClient {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        CurrencyClient {
            http,
            url: url.to_string(),
        }
    }

    pub async fn historical_rate(
        &self,
        api_key: &str,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<ExchangeRateRecord, JobError> {
        let day = date.format("%Y-%m-%d").to_string();
        debug!(
            "requesting {}{} rate for {} from {}",
            from_currency, to_currency, day, self.url
        );

        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("access_key", api_key),
                ("currencies", to_currency),
                ("source", from_currency),
                ("date", day.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("request to currencylayer error: {}", e);
                JobError::transport(Upstream::CurrencyLayer, e)
            })?;

        let body = response.json::<HistoricalResponse>().await.map_err(|e| {
            let e = e.without_url();
            error!("unreadable currencylayer response: {}", e);
            JobError::transport(Upstream::CurrencyLayer, e)
        })?;

        rate_record(body, from_currency, to_currency, date)
    }
}

fn rate_record(
    response: HistoricalResponse,
    from_currency: &str,
    to_currency: &str,
    date: NaiveDate,
) -> Result<ExchangeRateRecord, JobError> {
    if !response.success {
        let reason = match response.error {
            Some(ProviderError {
                code: Some(code),
                info,
            }) => format!("{} (code {})", info, code),
            Some(ProviderError { code: None, info }) => info,
            None => "no error detail".to_string(),
        };
        error!("request to currencylayer error: {}", reason);
        return Err(JobError::rejected(Upstream::CurrencyLayer, reason));
    }

    let pair = format!("{}{}", from_currency, to_currency);
    let rate = response.quotes.get(&pair).copied().ok_or_else(|| {
        error!("currencylayer response has no quote for {}", pair);
        JobError::rejected(Upstream::CurrencyLayer, format!("no quote for {}", pair))
    })?;

    Ok(ExchangeRateRecord {
        date,
        currencies: pair,
        rate,
    })
}
