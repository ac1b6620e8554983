// ==========================================
// 需求预测补货系统 - 出入库单数据仓储
// ==========================================
// 对齐: inventory_stockmove / inventory_stocktransfer 表
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责:
// 1. 历史需求读取（可预测产品枚举、日需求序列）
// 2. 补货草稿单写入（单头 + 明细同一事务）
// ==========================================

use crate::domain::movement::{DemandObservation, MovementRecord, TransferLine};
use crate::domain::reorder::ReorderDraft;
use crate::domain::types::{MovementStatus, MovementType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// MovementRepository - 出入库单仓储
// ==========================================
pub struct MovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MovementRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 历史需求读取
    // ==========================================

    /// 查询存在已完成出库记录的产品ID
    ///
    /// # 返回
    /// - Ok(HashSet<i64>): 产品ID集合（无顺序保证）
    /// - Err: 数据库错误
    pub fn find_products_with_done_deliveries(&self) -> RepositoryResult<HashSet<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT t.product_id
            FROM inventory_stocktransfer t
            JOIN inventory_stockmove m ON t.stockmove_id = m.id
            WHERE m.type = ?1 AND m.status = ?2
            "#,
        )?;

        let ids = stmt
            .query_map(
                params![
                    MovementType::Delivery.to_db_str(),
                    MovementStatus::Done.to_db_str()
                ],
                |row| row.get::<_, i64>(0),
            )?
            .collect::<SqliteResult<HashSet<_>>>()?;

        Ok(ids)
    }

    /// 查询产品的日需求序列
    ///
    /// 按计划日期（自然日）汇总 DONE 出库数量，升序返回，不补齐缺失日期
    ///
    /// # 参数
    /// - `product_id`: 产品ID
    ///
    /// # 返回
    /// - Ok(Vec<DemandObservation>): 无记录时为空
    /// - Err: 数据库错误
    pub fn find_daily_demand(&self, product_id: i64) -> RepositoryResult<Vec<DemandObservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                date(m.scheduled_date) AS ds,
                SUM(t.quantity) AS y
            FROM inventory_stockmove m
            JOIN inventory_stocktransfer t ON m.id = t.stockmove_id
            WHERE m.type = ?1
              AND m.status = ?2
              AND t.product_id = ?3
            GROUP BY date(m.scheduled_date)
            ORDER BY ds ASC
            "#,
        )?;

        let series = stmt
            .query_map(
                params![
                    MovementType::Delivery.to_db_str(),
                    MovementStatus::Done.to_db_str(),
                    product_id
                ],
                |row| {
                    Ok(DemandObservation {
                        date: parse_date_column(row, 0)?,
                        quantity: row.get(1)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(series)
    }

    // ==========================================
    // 补货草稿单写入
    // ==========================================

    /// 写入补货草稿单（单头 + 1 行明细）
    ///
    /// 两条 INSERT 在同一事务内执行，任一失败整体回滚，
    /// 并发读者不会看到没有明细的单头。
    ///
    /// # 返回
    /// - Ok(stockmove_id): 新单头ID
    /// - Err(UniqueConstraintViolation): 单号重复
    pub fn insert_reorder_draft(&self, draft: &ReorderDraft) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO inventory_stockmove (
                type, reference, contact, status,
                scheduled_date, created_at, notes, dest_location_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                MovementType::Receipt.to_db_str(),
                draft.reference,
                draft.vendor,
                MovementStatus::Draft.to_db_str(),
                draft.scheduled_date.format(DATE_FMT).to_string(),
                draft.created_at.format(DATETIME_FMT).to_string(),
                draft.notes,
                draft.dest_location_id,
            ],
        )?;
        let stockmove_id = tx.last_insert_rowid();

        tx.execute(
            r#"
            INSERT INTO inventory_stocktransfer (stockmove_id, product_id, quantity)
            VALUES (?1, ?2, ?3)
            "#,
            params![stockmove_id, draft.product_id, draft.quantity],
        )?;

        tx.commit()?;
        Ok(stockmove_id)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按主键查询单头
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MovementRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT
                    id, type, reference, contact, status,
                    source_location_id, dest_location_id,
                    scheduled_date, notes, created_at
                FROM inventory_stockmove
                WHERE id = ?1
                "#,
                params![id],
                map_movement_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 按单号查询单头
    pub fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<MovementRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT
                    id, type, reference, contact, status,
                    source_location_id, dest_location_id,
                    scheduled_date, notes, created_at
                FROM inventory_stockmove
                WHERE reference = ?1
                "#,
                params![reference],
                map_movement_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 查询单据明细行
    pub fn find_lines(&self, stockmove_id: i64) -> RepositoryResult<Vec<TransferLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, stockmove_id, product_id, quantity
            FROM inventory_stocktransfer
            WHERE stockmove_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let lines = stmt
            .query_map(params![stockmove_id], |row| {
                Ok(TransferLine {
                    id: row.get(0)?,
                    stockmove_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(lines)
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_movement_row(row: &rusqlite::Row<'_>) -> SqliteResult<MovementRecord> {
    let type_raw: String = row.get(1)?;
    let status_raw: String = row.get(4)?;
    let created_raw: String = row.get(9)?;

    Ok(MovementRecord {
        id: row.get(0)?,
        movement_type: MovementType::from_db_str(&type_raw)
            .ok_or_else(|| invalid_text(1, format!("未知单据类型: {}", type_raw)))?,
        reference: row.get(2)?,
        contact: row.get(3)?,
        status: MovementStatus::from_db_str(&status_raw)
            .ok_or_else(|| invalid_text(4, format!("未知单据状态: {}", status_raw)))?,
        source_location_id: row.get(5)?,
        dest_location_id: row.get(6)?,
        scheduled_date: parse_date_column(row, 7)?,
        notes: row.get(8)?,
        created_at: NaiveDateTime::parse_from_str(&created_raw, DATETIME_FMT)
            .map_err(|e| invalid_text(9, e.to_string()))?,
    })
}

/// 读取 TEXT 日期列（YYYY-MM-DD，允许带时间部分）
pub(crate) fn parse_date_column(row: &rusqlite::Row<'_>, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, DATE_FMT).map_err(|e| invalid_text(idx, e.to_string()))
}

fn invalid_text(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
