//! 市集店家批次查詢

use std::str::FromStr;
use std::time::Duration;

use pab_core::{LotListing, LotResolver, ResolveError};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{transport, FetchError};
use crate::{REQUEST_TIMEOUT_SECS, USER_AGENT};

const STORE_ITEM_URL: &str = "https://store.bricklink.com/ajax/clone/store/item.ajax";

#[derive(Debug, Deserialize)]
struct StoreItem {
    #[serde(rename = "itemNo")]
    item_no: String,
    #[serde(rename = "colorID")]
    color_id: u32,
    /// 例如 `US $0.0450`
    #[serde(rename = "nativePrice")]
    native_price: String,
}

/// 店家批次查詢端
pub struct StoreLotClient {
    client: Client,
    url: String,
}

impl StoreLotClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_url(STORE_ITEM_URL)
    }

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

impl LotResolver for StoreLotClient {
    fn resolve_lot(&self, store_id: &str, lot_id: &str) -> Result<LotListing, ResolveError> {
        tracing::debug!("查詢店家 {} 批次 {}", store_id, lot_id);
        let payload: serde_json::Value = self
            .client
            .get(&self.url)
            .query(&[("invID", lot_id), ("sid", store_id), ("wantedMoreArrayID", "")])
            .header(reqwest::header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(transport)?
            .json()
            .map_err(transport)?;

        parse_lot(store_id, lot_id, payload)
    }
}

/// 解析批次回應，價格換算為分
pub fn parse_lot(
    store_id: &str,
    lot_id: &str,
    payload: serde_json::Value,
) -> Result<LotListing, ResolveError> {
    let item: StoreItem =
        serde_json::from_value(payload).map_err(|e| ResolveError::Malformed(e.to_string()))?;

    Ok(LotListing {
        store_id: store_id.to_string(),
        lot_id: lot_id.to_string(),
        design_id: item.item_no,
        color_id: item.color_id,
        unit_price: parse_price_cents(&item.native_price)?,
    })
}

/// `US $0.0450` → 4.5（分）
fn parse_price_cents(raw: &str) -> Result<Decimal, ResolveError> {
    let amount: String = raw
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let units = Decimal::from_str(amount.trim())
        .map_err(|e| ResolveError::Malformed(format!("價格 {raw:?}: {e}")))?;
    Ok(units * Decimal::ONE_HUNDRED)
}
