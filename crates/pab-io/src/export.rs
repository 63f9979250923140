//! 匯出：原廠訂單 CSV/JSON、市集清單 XML、購物車

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pab_core::{Allocation, CartLot, Condition, Requirement};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::cart::encode_cart;
use crate::error::{xml_error, IoResult};

/// 市集清單的最高價格（不限價）
pub const MAX_PRICE_SENTINEL: &str = "-1.0000";

/// 寫出原廠訂單 CSV（欄位 `elementId,quantity`）
pub fn write_csv(path: impl AsRef<Path>, allocations: &[Allocation]) -> IoResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for allocation in allocations {
        writer.serialize(allocation)?;
    }
    if allocations.is_empty() {
        writer.write_record(["elementId", "quantity"])?;
    }
    writer.flush()?;
    tracing::info!("匯出 {} 筆至 {}", allocations.len(), path.display());
    Ok(())
}

/// 寫出原廠訂單 JSON（`[{"elementId": ..., "quantity": ...}]`）
pub fn write_json(path: impl AsRef<Path>, allocations: &[Allocation]) -> IoResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    allocations.serialize(&mut serializer)?;
    writer.flush()?;
    tracing::info!("匯出 {} 筆至 {}", allocations.len(), path.display());
    Ok(())
}

/// 寫出市集可匯入的清單 XML
pub fn write_inventory_xml(
    path: impl AsRef<Path>,
    requirements: &[Requirement],
    condition: Condition,
) -> IoResult<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    let mut writer = inventory_xml(file, requirements, condition)?;
    writer.get_mut().flush()?;
    tracing::info!("匯出 {} 筆至 {}", requirements.len(), path.display());
    Ok(())
}

fn inventory_xml<W: Write>(
    inner: W,
    requirements: &[Requirement],
    condition: Condition,
) -> IoResult<Writer<W>> {
    let mut writer = Writer::new_with_indent(inner, b' ', 0);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("INVENTORY")))
        .map_err(xml_error)?;

    let condition = condition.code().to_string();
    for requirement in requirements {
        let color = requirement.color_id.to_string();
        let quantity = requirement.quantity.to_string();
        let fields = [
            ("ITEMTYPE", requirement.item_type.code()),
            ("ITEMID", requirement.design_id.as_str()),
            ("COLOR", color.as_str()),
            ("MAXPRICE", MAX_PRICE_SENTINEL),
            ("MINQTY", quantity.as_str()),
            ("CONDITION", condition.as_str()),
            ("NOTIFY", "N"),
        ];

        writer
            .write_event(Event::Start(BytesStart::new("ITEM")))
            .map_err(xml_error)?;
        for (tag, value) in fields {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("ITEM")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("INVENTORY")))
        .map_err(xml_error)?;
    Ok(writer)
}

/// 寫出購物車檔案（十六進位）
pub fn write_cart(path: impl AsRef<Path>, lots: &[CartLot]) -> IoResult<()> {
    let path = path.as_ref();
    std::fs::write(path, encode_cart(lots))?;
    tracing::info!("匯出 {} 批至 {}", lots.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partslist::parse_partslist;
    use pab_core::ItemType;
    use rstest::rstest;

    fn allocations() -> Vec<Allocation> {
        vec![Allocation::new("300121", 6), Allocation::new("4211111", 2)]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order1.csv");
        write_csv(&path, &allocations()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "elementId,quantity\n300121,6\n4211111,2\n");
    }

    #[test]
    fn test_csv_empty_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "elementId,quantity\n");
    }

    #[test]
    fn test_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order1.json");
        write_json(&path, &allocations()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["elementId"], "300121");
        assert_eq!(value[1]["quantity"], 2);
    }

    #[rstest]
    #[case(Condition::New, "N")]
    #[case(Condition::Used, "U")]
    #[case(Condition::Any, "X")]
    fn test_inventory_xml_fields(#[case] condition: Condition, #[case] code: &str) {
        let requirements = vec![
            Requirement::new("3001", 5, 10),
            Requirement::new("sw0001", 0, 1).with_item_type(ItemType::Other("M".to_string())),
        ];
        let writer = inventory_xml(Vec::new(), &requirements, condition).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        assert!(text.contains("<MAXPRICE>-1.0000</MAXPRICE>"));
        assert!(text.contains(&format!("<CONDITION>{code}</CONDITION>")));
        assert!(text.contains("<NOTIFY>N</NOTIFY>"));
        assert!(text.contains("<ITEMTYPE>M</ITEMTYPE>"));

        // 匯出的清單可再次匯入
        let parsed = parse_partslist(&text).unwrap();
        assert_eq!(parsed.requirements, requirements);
    }

    #[test]
    fn test_write_cart_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retained.cart");
        let lots = vec![CartLot::new("100", "555", 6).with_prefix("1")];
        write_cart(&path, &lots).unwrap();

        assert_eq!(crate::cart::read_cart(&path).unwrap(), lots);
    }
}
