//! 零件清單 XML 解析
//!
//! 格式：`<INVENTORY><ITEM><ITEMTYPE/><ITEMID/><COLOR/><MAXPRICE/><MINQTY/>...</ITEM>...</INVENTORY>`

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use pab_core::{ItemType, Requirement};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{xml_error, IoError, IoResult};

/// 解析統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartslistStats {
    /// 零件的不重複設計數
    pub unique_designs: usize,
    /// 不重複的設計/顏色數
    pub unique_keys: usize,
    /// 零件總數量
    pub total_part_quantity: u64,
    /// 非零件的設計編號
    pub non_parts: Vec<String>,
    /// 因欄位缺漏而丟棄的紀錄數
    pub dropped: usize,
}

/// 解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partslist {
    pub requirements: Vec<Requirement>,
    pub stats: PartslistStats,
}

/// 讀取並解析零件清單檔案
pub fn read_partslist(path: impl AsRef<Path>) -> IoResult<Partslist> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let partslist = parse_partslist(&text)?;
    tracing::info!(
        "{}: {} 個設計，{} 個設計/顏色，零件總數 {}",
        path.display(),
        partslist.stats.unique_designs,
        partslist.stats.unique_keys,
        partslist.stats.total_part_quantity
    );
    tracing::info!("{}: {} 個非零件編號", path.display(), partslist.stats.non_parts.len());
    Ok(partslist)
}

/// 解析零件清單文字
///
/// 缺少設計、顏色或數量的紀錄丟棄並記錄警告；整份文件無法解析時返回錯誤。
pub fn parse_partslist(text: &str) -> IoResult<Partslist> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut records: Vec<HashMap<String, String>> = Vec::new();
    let mut current: Option<HashMap<String, String>> = None;
    let mut field: Option<String> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "INVENTORY" => saw_root = true,
                    "ITEM" => current = Some(HashMap::new()),
                    _ => field = Some(name),
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"ITEM" {
                    records.push(HashMap::new());
                }
            }
            Event::Text(t) => {
                if let (Some(record), Some(name)) = (current.as_mut(), field.as_ref()) {
                    let value = t.unescape().map_err(xml_error)?;
                    record.insert(name.clone(), value.trim().to_string());
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"ITEM" => records.extend(current.take()),
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(IoError::InvalidFormat("缺少 INVENTORY 根元素".to_string()));
    }

    let mut partslist = Partslist::default();
    let mut designs = BTreeSet::new();
    let mut keys = BTreeSet::new();
    let mut non_parts = BTreeSet::new();

    for record in records {
        let Some(requirement) = to_requirement(&record) else {
            partslist.stats.dropped += 1;
            continue;
        };

        keys.insert(requirement.key());
        if requirement.is_part() {
            designs.insert(requirement.design_id.clone());
            partslist.stats.total_part_quantity += u64::from(requirement.quantity);
        } else {
            tracing::warn!(
                "非零件編號 {}（類型 {}）",
                requirement.design_id,
                requirement.item_type.code()
            );
            non_parts.insert(requirement.design_id.clone());
        }
        partslist.requirements.push(requirement);
    }

    partslist.stats.unique_designs = designs.len();
    partslist.stats.unique_keys = keys.len();
    partslist.stats.non_parts = non_parts.into_iter().collect();
    Ok(partslist)
}

fn to_requirement(record: &HashMap<String, String>) -> Option<Requirement> {
    let design_id = record.get("ITEMID").filter(|v| !v.is_empty());
    let color = record.get("COLOR").and_then(|v| v.parse::<u32>().ok());

    let (design_id, color_id) = match (design_id, color) {
        (Some(design_id), Some(color_id)) => (design_id, color_id),
        (design_id, _) => {
            tracing::warn!("紀錄缺少設計或顏色，已丟棄: ITEMID={:?}", design_id);
            return None;
        }
    };

    let quantity = match record.get("MINQTY").and_then(|v| v.parse::<u32>().ok()) {
        Some(quantity) if quantity > 0 => quantity,
        _ => {
            tracing::warn!(
                "{}/{} 數量無效，已丟棄: {:?}",
                design_id,
                color_id,
                record.get("MINQTY")
            );
            return None;
        }
    };

    let item_type = ItemType::from_code(record.get("ITEMTYPE").map(String::as_str).unwrap_or(""));
    Some(Requirement::new(design_id.as_str(), color_id, quantity).with_item_type(item_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<INVENTORY>
<ITEM>
<ITEMTYPE>P</ITEMTYPE>
<ITEMID>3001</ITEMID>
<COLOR>5</COLOR>
<MAXPRICE>-1.0000</MAXPRICE>
<MINQTY>10</MINQTY>
<CONDITION>X</CONDITION>
<NOTIFY>N</NOTIFY>
</ITEM>
<ITEM>
<ITEMTYPE>P</ITEMTYPE>
<ITEMID>3002</ITEMID>
<MINQTY>4</MINQTY>
</ITEM>
<ITEM>
<ITEMTYPE>M</ITEMTYPE>
<ITEMID>sw0001</ITEMID>
<COLOR>0</COLOR>
<MINQTY>1</MINQTY>
</ITEM>
<ITEM>
<ITEMTYPE>P</ITEMTYPE>
<ITEMID>3001</ITEMID>
<COLOR>1</COLOR>
<MINQTY>2</MINQTY>
</ITEM>
</INVENTORY>
"#;

    #[test]
    fn test_parse_sample() {
        let partslist = parse_partslist(SAMPLE).unwrap();

        assert_eq!(partslist.requirements.len(), 3);
        assert_eq!(partslist.requirements[0], Requirement::new("3001", 5, 10));
        assert!(!partslist.requirements[1].is_part());
        assert_eq!(partslist.stats.dropped, 1);
        assert_eq!(partslist.stats.unique_designs, 1);
        assert_eq!(partslist.stats.unique_keys, 3);
        assert_eq!(partslist.stats.total_part_quantity, 12);
        assert_eq!(partslist.stats.non_parts, vec!["sw0001".to_string()]);
    }

    #[test]
    fn test_missing_itemtype_defaults_to_part() {
        let text = "<INVENTORY><ITEM><ITEMID>3001</ITEMID><COLOR>5</COLOR><MINQTY>3</MINQTY></ITEM></INVENTORY>";
        let partslist = parse_partslist(text).unwrap();

        assert_eq!(partslist.requirements, vec![Requirement::new("3001", 5, 3)]);
    }

    #[test]
    fn test_zero_quantity_dropped() {
        let text = "<INVENTORY><ITEM><ITEMID>3001</ITEMID><COLOR>5</COLOR><MINQTY>0</MINQTY></ITEM></INVENTORY>";
        let partslist = parse_partslist(text).unwrap();

        assert!(partslist.requirements.is_empty());
        assert_eq!(partslist.stats.dropped, 1);
    }

    #[test]
    fn test_unparseable_document_is_error() {
        assert!(parse_partslist("<INVENTORY><ITEM></INVENTORY>").is_err());
        assert!(parse_partslist("not xml at all").is_err());
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.xml");
        std::fs::write(&path, SAMPLE).unwrap();

        assert_eq!(read_partslist(&path).unwrap().requirements.len(), 3);
    }
}
