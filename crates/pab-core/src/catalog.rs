//! 目錄模型（市集對照與原廠銷售狀態）

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::PabError;

/// 以最小貨幣單位（分）表示的原廠價格
pub type Cents = i64;

/// 市集目錄對照：設計編號 + 顏色 → 原廠元件編號
///
/// 同一組設計/顏色可對應多個元件編號（實務上最多觀察到 2 個）。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogMapping {
    /// 設計編號
    pub design_id: String,
    /// 顏色編號
    pub color_id: u32,
    /// 原廠元件編號
    pub element_id: String,
}

impl CatalogMapping {
    pub fn new(design_id: impl Into<String>, color_id: u32, element_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            color_id,
            element_id: element_id.into(),
        }
    }
}

/// 原廠銷售通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleChannel {
    /// 主要通道（暢銷品，庫存充足）
    Bestseller,
    /// 次要通道（標準品）
    Standard,
}

impl SaleChannel {
    /// 是否為主要通道
    pub fn is_primary(self) -> bool {
        self == SaleChannel::Bestseller
    }

    /// 由主要通道旗標建立
    pub fn from_primary(is_primary: bool) -> Self {
        if is_primary {
            SaleChannel::Bestseller
        } else {
            SaleChannel::Standard
        }
    }
}

impl FromStr for SaleChannel {
    type Err = PabError;

    /// 解析原廠回傳的 delivery channel（`pab` / `bap`），其他值視為資料完整性錯誤
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pab" => Ok(SaleChannel::Bestseller),
            "bap" => Ok(SaleChannel::Standard),
            other => Err(PabError::UnknownSaleChannel(other.to_string())),
        }
    }
}

/// 原廠報價
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOffer {
    /// 銷售通道
    pub channel: SaleChannel,
    /// 單價（分）；原廠未標價時為 `None`
    pub unit_price: Option<Cents>,
    /// 單筆訂單上限；`None` 表示不限
    pub max_order_quantity: Option<u32>,
}

/// 原廠銷售狀態（每個元件編號至多一筆）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleStatus {
    /// 原廠元件編號
    pub element_id: String,
    /// 報價；`None` 表示原廠不販售
    pub offer: Option<StoreOffer>,
}

impl SaleStatus {
    /// 原廠不販售此元件
    pub fn not_sold(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            offer: None,
        }
    }

    /// 原廠販售此元件
    pub fn sold(
        element_id: impl Into<String>,
        channel: SaleChannel,
        unit_price: impl Into<Option<Cents>>,
        max_order_quantity: impl Into<Option<u32>>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            offer: Some(StoreOffer {
                channel,
                unit_price: unit_price.into(),
                max_order_quantity: max_order_quantity.into(),
            }),
        }
    }

    pub fn sells(&self) -> bool {
        self.offer.is_some()
    }

    /// 主要通道旗標（僅在 sells 為真時有意義）
    pub fn is_primary_channel(&self) -> bool {
        self.offer.as_ref().is_some_and(|o| o.channel.is_primary())
    }

    pub fn unit_price(&self) -> Option<Cents> {
        self.offer.as_ref().and_then(|o| o.unit_price)
    }

    pub fn max_order_quantity(&self) -> Option<u32> {
        self.offer.as_ref().and_then(|o| o.max_order_quantity)
    }

    /// 轉為可選方案
    ///
    /// 不販售或未標價時為 `None`：沒有單價就無法比價，該元件不列入方案。
    pub fn to_option(&self) -> Option<SaleOption> {
        let offer = self.offer.as_ref()?;
        Some(SaleOption {
            element_id: self.element_id.clone(),
            price: offer.unit_price?,
            channel: offer.channel,
            max_order_quantity: offer.max_order_quantity,
        })
    }
}

/// 可選方案：目錄對照 × 銷售狀態（sells 為真）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOption {
    /// 原廠元件編號
    pub element_id: String,
    /// 單價（分）
    pub price: Cents,
    /// 銷售通道
    pub channel: SaleChannel,
    /// 單筆訂單上限；`None` 表示不限
    pub max_order_quantity: Option<u32>,
}

impl SaleOption {
    pub fn new(
        element_id: impl Into<String>,
        price: Cents,
        channel: SaleChannel,
        max_order_quantity: impl Into<Option<u32>>,
    ) -> Self {
        Self {
            element_id: element_id.into(),
            price,
            channel,
            max_order_quantity: max_order_quantity.into(),
        }
    }

    pub fn is_primary_channel(&self) -> bool {
        self.channel.is_primary()
    }
}
