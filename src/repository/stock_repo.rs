// ==========================================
// 需求预测补货系统 - 库存对账数据仓储
// ==========================================
// 对齐: inventory_product / inventory_stockquant / inventory_demand_forecast 表
// 红线: 库存台账只读
// ==========================================

use crate::domain::alert::ShortageCandidate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::movement_repo::DATE_FMT;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// StockRepository - 库存对账仓储
// ==========================================
pub struct StockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询每个产品的当前库存与区间内预测需求
    ///
    /// # 参数
    /// - `from_date` / `to_date`: 预测日期闭区间
    ///
    /// # 返回
    /// - 每个产品一行；无库存记录/无预测记录按 0 处理
    pub fn find_stock_vs_demand(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> RepositoryResult<Vec<ShortageCandidate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            WITH Stock AS (
                SELECT product_id, SUM(quantity) AS total_qty
                FROM inventory_stockquant
                GROUP BY product_id
            ),
            Demand AS (
                SELECT product_id, SUM(predicted_quantity) AS needed_qty
                FROM inventory_demand_forecast
                WHERE forecast_date BETWEEN ?1 AND ?2
                GROUP BY product_id
            )
            SELECT
                p.id,
                p.name,
                p.sku,
                COALESCE(s.total_qty, 0.0) AS current_stock,
                COALESCE(d.needed_qty, 0.0) AS predicted_demand
            FROM inventory_product p
            LEFT JOIN Stock s ON p.id = s.product_id
            LEFT JOIN Demand d ON p.id = d.product_id
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![
                    from_date.format(DATE_FMT).to_string(),
                    to_date.format(DATE_FMT).to_string()
                ],
                |row| {
                    Ok(ShortageCandidate {
                        product_id: row.get(0)?,
                        name: row.get(1)?,
                        sku: row.get(2)?,
                        stock: row.get(3)?,
                        demand: row.get(4)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 查询单个产品的当前库存（无记录为 0）
    pub fn find_stock_level(&self, product_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let qty: f64 = conn.query_row(
            "SELECT COALESCE(SUM(quantity), 0.0) FROM inventory_stockquant WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(qty)
    }
}
