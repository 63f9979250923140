//! 購物車模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::requirement::PartKey;

/// 購物車中的一批（店家 + 批號）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLot {
    /// 記錄前綴（原樣保留以便回寫）
    pub prefix: String,
    /// 店家編號
    pub store_id: String,
    /// 批號
    pub lot_id: String,
    /// 數量
    pub quantity: u32,
}

impl CartLot {
    pub fn new(store_id: impl Into<String>, lot_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            prefix: String::new(),
            store_id: store_id.into(),
            lot_id: lot_id.into(),
            quantity,
        }
    }

    /// 建構器模式：設置記錄前綴
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// 市集批次資訊（由店家批號解析而來）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotListing {
    /// 店家編號
    pub store_id: String,
    /// 批號
    pub lot_id: String,
    /// 設計編號
    pub design_id: String,
    /// 顏色編號
    pub color_id: u32,
    /// 單價（分，可含小數）
    pub unit_price: Decimal,
}

impl LotListing {
    pub fn part_key(&self) -> PartKey {
        PartKey::new(self.design_id.clone(), self.color_id)
    }
}

/// 已知價格的購物車批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLot {
    /// 原始批次
    pub lot: CartLot,
    /// 對應零件
    pub part: PartKey,
    /// 市集單價（分）
    pub unit_price: Decimal,
}

impl PricedLot {
    pub fn new(lot: CartLot, part: PartKey, unit_price: Decimal) -> Self {
        Self {
            lot,
            part,
            unit_price,
        }
    }

    /// 由批次與市集資訊組合
    pub fn from_listing(lot: CartLot, listing: &LotListing) -> Self {
        Self::new(lot, listing.part_key(), listing.unit_price)
    }
}
