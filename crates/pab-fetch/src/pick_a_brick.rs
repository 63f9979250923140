//! 原廠 Pick-a-Brick 銷售狀態查詢（GraphQL）

use std::time::Duration;

use pab_core::{ResolveError, SaleChannel, SaleStatus, StatusResolver};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{transport, FetchError};
use crate::{REQUEST_TIMEOUT_SECS, USER_AGENT};

const PICK_A_BRICK_URL: &str = "https://www.lego.com/api/graphql/PickABrickQuery";

const QUERY: &str = r#"
query PickABrickQuery($input: ElementQueryInput!) {
  searchElements(input: $input) {
    results {
      ...ElementLeaf
    }
    total
    count
  }
}
fragment ElementLeaf on SearchResultElement {
  id
  maxOrderQuantity
  deliveryChannel
  price {
    centAmount
    formattedAmount
    currencyCode
  }
}
"#;

#[derive(Debug, Deserialize)]
struct Response {
    data: Data,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    search_elements: SearchElements,
}

#[derive(Debug, Deserialize)]
struct SearchElements {
    results: Vec<ElementLeaf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementLeaf {
    /// `null` 表示不限
    max_order_quantity: Option<u32>,
    delivery_channel: String,
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Price {
    cent_amount: Option<i64>,
}

/// Pick-a-Brick 查詢端
pub struct PickABrickClient {
    client: Client,
    url: String,
}

impl PickABrickClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_url(PICK_A_BRICK_URL)
    }

    /// 指定端點（測試或代理用）
    pub fn with_url(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl StatusResolver for PickABrickClient {
    fn resolve_status(&self, element_id: &str) -> Result<SaleStatus, ResolveError> {
        let body = json!({
            "operationName": "PickABrickQuery",
            "variables": {"input": {"perPage": 10, "query": element_id}},
            "query": QUERY,
        });

        tracing::debug!("查詢原廠元件 {}", element_id);
        let payload: serde_json::Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(transport)?
            .json()
            .map_err(transport)?;

        parse_status(element_id, payload)
    }
}

/// 解析回應
///
/// 沒有結果代表原廠不販售；有多筆結果時取第一筆；未知的 delivery channel 為資料完整性錯誤。
/// 單價與上限可為 `null`，照實快取。
pub fn parse_status(element_id: &str, payload: serde_json::Value) -> Result<SaleStatus, ResolveError> {
    let response: Response =
        serde_json::from_value(payload).map_err(|e| ResolveError::Malformed(e.to_string()))?;

    let results = response.data.search_elements.results;
    let Some(first) = results.into_iter().next() else {
        tracing::warn!("元件 {} 沒有查詢結果", element_id);
        return Ok(SaleStatus::not_sold(element_id));
    };

    let channel: SaleChannel = first
        .delivery_channel
        .parse()
        .map_err(|_| ResolveError::UnknownChannel(first.delivery_channel.clone()))?;

    let price = first.price.and_then(|p| p.cent_amount);
    if price.is_none() {
        tracing::warn!("元件 {} 有販售但未標價，不列入方案", element_id);
    }

    Ok(SaleStatus::sold(element_id, channel, price, first.max_order_quantity))
}
