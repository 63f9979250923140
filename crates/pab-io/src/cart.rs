//! 市集購物車檔案（十六進位編碼、冒號分隔的 ASCII 紀錄）

use std::path::Path;

use pab_core::CartLot;

use crate::error::{IoError, IoResult};

/// 讀取購物車檔案
pub fn read_cart(path: impl AsRef<Path>) -> IoResult<Vec<CartLot>> {
    let path = path.as_ref();
    let lots = decode_cart(&std::fs::read_to_string(path)?)?;
    tracing::info!("{}: 解析 {} 批", path.display(), lots.len());
    Ok(lots)
}

/// 解碼購物車內容
///
/// 每行 `prefix:store:lot:quantity`；欄位不足或數量無效的紀錄略過並記錄警告。
pub fn decode_cart(hex_text: &str) -> IoResult<Vec<CartLot>> {
    let bytes = hex::decode(hex_text.trim())?;
    if !bytes.is_ascii() {
        return Err(IoError::Encoding("購物車內容不是 ASCII".to_string()));
    }
    let text = String::from_utf8(bytes).map_err(|e| IoError::Encoding(e.to_string()))?;

    let mut lots = Vec::new();
    for record in text.trim().lines() {
        let fields: Vec<&str> = record.trim().split(':').collect();
        if fields.len() < 4 {
            tracing::warn!("購物車紀錄欄位不足，已略過: {:?}", record);
            continue;
        }
        let Ok(quantity) = fields[3].trim().parse::<u32>() else {
            tracing::warn!("購物車紀錄數量無效，已略過: {:?}", record);
            continue;
        };
        lots.push(CartLot::new(fields[1], fields[2], quantity).with_prefix(fields[0]));
    }
    Ok(lots)
}

/// 編碼購物車內容
pub fn encode_cart(lots: &[CartLot]) -> String {
    let text = lots
        .iter()
        .map(|lot| format!("{}:{}:{}:{}", lot.prefix, lot.store_id, lot.lot_id, lot.quantity))
        .collect::<Vec<_>>()
        .join("\n");
    hex::encode(text)
}
