//! SQLite 持久化快取

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use pab_core::{CatalogMapping, LotListing, SaleChannel, SaleStatus};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::{CacheError, CacheResult};
use crate::store::{log_insert, CatalogCache, InsertOutcome};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS bricklink_entries (
    element_id TEXT NOT NULL PRIMARY KEY,
    design_id TEXT NOT NULL,
    color_code INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_bricklink_entries_design ON bricklink_entries (design_id);

CREATE TABLE IF NOT EXISTS lego_pab_entries (
    element_id TEXT NOT NULL PRIMARY KEY,
    lego_sells INTEGER NOT NULL,
    bestseller INTEGER,
    price INTEGER,
    max_order_quantity INTEGER
);

CREATE TABLE IF NOT EXISTS bricklink_store_lots (
    store_id TEXT NOT NULL,
    lot_id TEXT NOT NULL,
    design_id TEXT NOT NULL,
    color_code INTEGER NOT NULL,
    price TEXT NOT NULL,
    PRIMARY KEY (store_id, lot_id)
);
"#;

/// SQLite 快取
///
/// 所有寫入為 `INSERT OR IGNORE`，以受影響列數判定寫入或略過；單一連線由互斥鎖保護。
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// 開啟（或建立）資料庫檔案
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!("開啟快取資料庫: {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    /// 記憶體資料庫
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> CacheResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn get_conn(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Lock(e.to_string()))
    }

    fn outcome(changed: usize) -> InsertOutcome {
        if changed > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Skipped
        }
    }

    fn purge(&self, table: &str) -> CacheResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(&format!("DELETE FROM {table}"), [])?;
        tracing::info!("清空 {}: {} 列", table, deleted);
        Ok(deleted)
    }
}

/// 由資料列組回販售狀態
fn status_from_row(
    element_id: String,
    sells: bool,
    bestseller: Option<bool>,
    price: Option<i64>,
    max_order_quantity: Option<u32>,
) -> CacheResult<SaleStatus> {
    if !sells {
        return Ok(SaleStatus::not_sold(element_id));
    }
    // 單價與上限可為 NULL；通道不可
    match bestseller {
        Some(bestseller) => Ok(SaleStatus::sold(
            element_id,
            SaleChannel::from_primary(bestseller),
            price,
            max_order_quantity,
        )),
        None => Err(CacheError::Corrupt {
            field: "lego_pab_entries".to_string(),
            message: format!("元件 {element_id} 標示販售但缺少通道欄位"),
        }),
    }
}

impl CatalogCache for SqliteCache {
    fn lookup_mappings(&self, design_id: &str) -> CacheResult<Option<Vec<CatalogMapping>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT element_id, design_id, color_code FROM bricklink_entries
             WHERE design_id = ?1 ORDER BY color_code, element_id",
        )?;
        let rows = stmt
            .query_map(params![design_id], |row| {
                Ok(CatalogMapping {
                    element_id: row.get(0)?,
                    design_id: row.get(1)?,
                    color_id: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(if rows.is_empty() { None } else { Some(rows) })
    }

    fn lookup_status(&self, element_id: &str) -> CacheResult<Option<SaleStatus>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT element_id, lego_sells, bestseller, price, max_order_quantity
                 FROM lego_pab_entries WHERE element_id = ?1",
                params![element_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, Option<bool>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<u32>>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, sells, bestseller, price, max)| status_from_row(id, sells, bestseller, price, max))
            .transpose()
    }

    fn insert_mapping(&self, mapping: &CatalogMapping) -> CacheResult<InsertOutcome> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO bricklink_entries (element_id, design_id, color_code)
             VALUES (?1, ?2, ?3)",
            params![mapping.element_id, mapping.design_id, mapping.color_id],
        )?;
        let outcome = Self::outcome(changed);
        log_insert("對應", &mapping.element_id, outcome);
        Ok(outcome)
    }

    fn insert_status(&self, status: &SaleStatus) -> CacheResult<InsertOutcome> {
        let conn = self.get_conn()?;
        let offer = status.offer.as_ref();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO lego_pab_entries
             (element_id, lego_sells, bestseller, price, max_order_quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                status.element_id,
                status.sells(),
                offer.map(|o| o.channel.is_primary()),
                offer.and_then(|o| o.unit_price),
                offer.and_then(|o| o.max_order_quantity),
            ],
        )?;
        let outcome = Self::outcome(changed);
        log_insert("販售狀態", &status.element_id, outcome);
        Ok(outcome)
    }

    fn lookup_lot(&self, store_id: &str, lot_id: &str) -> CacheResult<Option<LotListing>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT store_id, lot_id, design_id, color_code, price
                 FROM bricklink_store_lots WHERE store_id = ?1 AND lot_id = ?2",
                params![store_id, lot_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(store_id, lot_id, design_id, color_id, price)| {
            let unit_price = Decimal::from_str(&price).map_err(|e| CacheError::Corrupt {
                field: "bricklink_store_lots.price".to_string(),
                message: format!("{store_id}/{lot_id}: {e}"),
            })?;
            Ok(LotListing {
                store_id,
                lot_id,
                design_id,
                color_id,
                unit_price,
            })
        })
        .transpose()
    }

    fn insert_lot(&self, listing: &LotListing) -> CacheResult<InsertOutcome> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO bricklink_store_lots
             (store_id, lot_id, design_id, color_code, price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                listing.store_id,
                listing.lot_id,
                listing.design_id,
                listing.color_id,
                listing.unit_price.to_string(),
            ],
        )?;
        let outcome = Self::outcome(changed);
        log_insert(
            "批次",
            &format!("{}/{}", listing.store_id, listing.lot_id),
            outcome,
        );
        Ok(outcome)
    }

    fn purge_mappings(&self) -> CacheResult<usize> {
        self.purge("bricklink_entries")
    }

    fn purge_statuses(&self) -> CacheResult<usize> {
        self.purge("lego_pab_entries")
    }

    fn purge_lots(&self) -> CacheResult<usize> {
        self.purge("bricklink_store_lots")
    }
}
