// ==========================================
// 需求预测补货系统 - 需求预测数据仓储
// ==========================================
// 对齐: inventory_demand_forecast 表
// 主键: UNIQUE(product_id, forecast_date)
// 红线: 单个产品的整条预测曲线必须在同一事务内提交
// ==========================================

use crate::domain::forecast::{ForecastPoint, ForecastRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::movement_repo::{parse_date_column, DATETIME_FMT, DATE_FMT};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ForecastRepository - 需求预测仓储
// ==========================================
pub struct ForecastRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ForecastRepository {
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

    /// 批量 upsert 一个产品的预测曲线
    ///
    /// 不存在则插入；存在则覆盖预测值/区间并刷新 created_at。
    /// 全部行在一个事务内写入，中途失败时该产品的旧数据保持不变。
    ///
    /// # 参数
    /// - `product_id`: 产品ID
    /// - `points`: 已截断、已四舍五入的预测点
    /// - `updated_at`: 本次写入时间
    ///
    /// # 返回
    /// - Ok(rows): 写入行数
    pub fn upsert_curve(
        &self,
        product_id: i64,
        points: &[ForecastPoint],
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let updated_at = updated_at.format(DATETIME_FMT).to_string();

        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                r#"
                INSERT INTO inventory_demand_forecast (
                    product_id, forecast_date, predicted_quantity,
                    confidence_lower, confidence_upper, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(product_id, forecast_date) DO UPDATE SET
                    predicted_quantity = excluded.predicted_quantity,
                    confidence_lower = excluded.confidence_lower,
                    confidence_upper = excluded.confidence_upper,
                    created_at = excluded.created_at
                "#,
            )?;

            for point in points {
                stmt.execute(params![
                    product_id,
                    point.date.format(DATE_FMT).to_string(),
                    point.point,
                    point.lower,
                    point.upper,
                    updated_at,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询产品从指定日期起的预测（升序，最多 limit 行）
    pub fn find_upcoming(
        &self,
        product_id: i64,
        from_date: NaiveDate,
        limit: usize,
    ) -> RepositoryResult<Vec<ForecastRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, forecast_date, predicted_quantity,
                   confidence_lower, confidence_upper, created_at
            FROM inventory_demand_forecast
            WHERE product_id = ?1 AND forecast_date >= ?2
            ORDER BY forecast_date ASC
            LIMIT ?3
            "#,
        )?;

        let records = stmt
            .query_map(
                params![product_id, from_date.format(DATE_FMT).to_string(), limit as i64],
                map_forecast_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 查询产品的全部预测行（升序）
    pub fn find_by_product(&self, product_id: i64) -> RepositoryResult<Vec<ForecastRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, forecast_date, predicted_quantity,
                   confidence_lower, confidence_upper, created_at
            FROM inventory_demand_forecast
            WHERE product_id = ?1
            ORDER BY forecast_date ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![product_id], map_forecast_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }
}

fn map_forecast_row(row: &rusqlite::Row<'_>) -> SqliteResult<ForecastRecord> {
    let created_raw: String = row.get(5)?;
    Ok(ForecastRecord {
        product_id: row.get(0)?,
        forecast_date: parse_date_column(row, 1)?,
        predicted_quantity: row.get(2)?,
        confidence_lower: row.get(3)?,
        confidence_upper: row.get(4)?,
        created_at: NaiveDateTime::parse_from_str(&created_raw, DATETIME_FMT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
        })?,
    })
}
