use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use loyalty_engine::{
    db_types::OrderNumber,
    settlement::{AccrualGateway, AccrualResponse, AccrualUpdate},
    LedgerError,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER},
    Client,
    Response,
    StatusCode,
};

use crate::{AccrualApiError, AccrualConfig};

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Asks the accrual service about a single order.
    ///
    /// * `200` carries the order's status and, once processed, its accrual.
    /// * `204` means the accrual service has not registered the order.
    /// * `429` means we are asking too often. The `Retry-After` header, if present, says for how long to back off.
    ///
    /// Anything else is reported as a [`AccrualApiError::QueryError`].
    pub async fn fetch_order_accrual(&self, number: &OrderNumber) -> Result<AccrualResponse, AccrualApiError> {
        let number = number.as_str();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AccrualApiError::InvalidOrderNumber(number.to_string()));
        }
        let url = self.url(&format!("/api/orders/{number}"));
        trace!("🔄️ Querying accrual service: {url}");
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let update = response.json::<AccrualUpdate>().await?;
                debug!("🔄️ Accrual service reports order {number} as {:?}", update.status);
                Ok(AccrualResponse::Update(update))
            },
            StatusCode::NO_CONTENT => {
                debug!("🔄️ Order {number} is not registered with the accrual service");
                Ok(AccrualResponse::NotRegistered)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after(&response);
                warn!("🔄️ The accrual service is rate limiting us. Retry after {retry_after:?}");
                Err(AccrualApiError::RateLimited { retry_after })
            },
            status => {
                let message = response.text().await?;
                Err(AccrualApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }
}

impl AccrualGateway for AccrualApi {
    fn fetch_accrual(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualResponse, LedgerError>> + Send {
        async move { self.fetch_order_accrual(number).await.map_err(LedgerError::from) }
    }
}

/// `Retry-After` is either a number of seconds or an HTTP date.
fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}

fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
