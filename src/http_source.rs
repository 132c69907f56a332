//! Remote aggregation endpoint
//!
//! Fetches pre-aggregated records with a single GET. The dimension is sent
//! as `mode`; year, area and month filters are sent as query parameters so
//! the endpoint can narrow the result, and are applied again locally.

use crate::data_loader::validated_records;
use crate::error::{PivotError, Result};
use crate::source::{RecordQuery, RecordSource, RecordStream};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Request timeout for the endpoint
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Record source backed by an HTTP endpoint
pub struct HttpSource {
    url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for an endpoint URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PivotError::Config(format!(
                "Endpoint must be an http(s) URL, got '{url}'"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(url, client))
    }

    /// Create a source with a preconfigured client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Query parameters for a query
    pub fn query_params(query: &RecordQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("mode", query.dimension.as_str().to_string())];
        let filter = &query.filter;

        if let Some(years) = &filter.years {
            params.extend(years.iter().map(|year| ("year", year.to_string())));
        }
        if let Some(area) = &filter.area {
            params.push(("area", area.clone()));
        }
        if let Some(months) = &filter.months {
            params.extend(months.iter().map(|month| ("month", month.to_string())));
        }
        params
    }

    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<serde_json::Value>> {
        let params = Self::query_params(query);
        debug!("Requesting {} with {:?}", self.url, params);

        let response = self.client.get(&self.url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PivotError::Endpoint {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load_records(&self, query: &RecordQuery) -> RecordStream<'_> {
        let filter = query.filter.clone();
        let query = query.clone();
        let records = async_stream::try_stream! {
            let values = self.fetch(&query).await?;
            let received = values.len();
            let parsed = values
                .into_iter()
                .enumerate()
                .map(|(i, value)| (i + 1, serde_json::from_value(value)));
            let records = validated_records(parsed, &self.url);
            info!("Received {} records ({} valid) from {}", received, records.len(), self.url);

            for record in records {
                yield record;
            }
        };
        Box::pin(filter.filter_stream(records))
    }
}
