use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use interface::{FetchError, PageSource};

pub const DEFAULT_ORDERS_URL: &str = "https://coinbase.com/api/v1/orders";

/// Coinbase 주문 목록 API 클라이언트
/// `GET <orders_url>?page=<n>&api_key=<key>`
pub struct CoinbaseClient {
    http: reqwest::Client,
    orders_url: String,
    api_key: String,
}

impl CoinbaseClient {
    pub fn new(
        orders_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(orders_url, api_key, http))
    }

    pub fn with_client(
        orders_url: impl Into<String>,
        api_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            orders_url: orders_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn orders_url(&self) -> &str {
        &self.orders_url
    }
}

#[async_trait]
impl PageSource for CoinbaseClient {
    async fn fetch_page(&self, page: u32) -> Result<String, FetchError> {
        let page_param = page.to_string();

        // 에러 메시지에 api_key가 포함된 URL이 남지 않도록 without_url 사용
        let response = self
            .http
            .get(&self.orders_url)
            .query(&[("page", page_param.as_str()), ("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                page,
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| FetchError::Transport {
            page,
            reason: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Transport {
                page,
                reason: format!(
                    "Coinbase API HTTP error: status {}, response: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            });
        }

        debug!("Finished API request for Coinbase order page {}", page);
        Ok(body)
    }
}
