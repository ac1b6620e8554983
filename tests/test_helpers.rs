// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use demand_forecast::app::AppState;
use demand_forecast::db::{ensure_schema, open_sqlite_connection};
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

/// 测试固定的“今天”
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 20).unwrap()
}

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_conn(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).expect("无法打开测试数据库")
}

// ==========================================
// 测试环境: 临时库 + AppState
// ==========================================
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            _temp_file: temp_file,
            db_path,
            state,
        })
    }

    /// 另开一个连接用于造数/断言
    pub fn conn(&self) -> Connection {
        open_test_conn(&self.db_path)
    }
}

// ==========================================
// 造数
// ==========================================

pub fn insert_product(conn: &Connection, id: i64, name: &str, sku: Option<&str>) {
    conn.execute(
        "INSERT INTO inventory_product (id, name, sku) VALUES (?1, ?2, ?3)",
        params![id, name, sku],
    )
    .expect("插入产品失败");
}

pub fn insert_stock(conn: &Connection, product_id: i64, quantity: f64) {
    conn.execute(
        "INSERT INTO inventory_stockquant (product_id, location_id, quantity) VALUES (?1, 1, ?2)",
        params![product_id, quantity],
    )
    .expect("插入库存失败");
}

/// 插入一张单行出库单
pub fn insert_delivery(conn: &Connection, product_id: i64, date: NaiveDate, quantity: f64, status: &str) {
    conn.execute(
        "INSERT INTO inventory_stockmove (type, status, scheduled_date) VALUES ('DELIVERY', ?1, ?2)",
        params![status, date.format("%Y-%m-%d").to_string()],
    )
    .expect("插入出库单失败");
    let move_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO inventory_stocktransfer (stockmove_id, product_id, quantity) VALUES (?1, ?2, ?3)",
        params![move_id, product_id, quantity],
    )
    .expect("插入出库明细失败");
}

/// 在 end（不含）之前连续 days 天每天一张 DONE 出库单，数量由 qty(i) 给出（i 从 0 开始）
pub fn insert_daily_history<F>(conn: &Connection, product_id: i64, end: NaiveDate, days: i64, qty: F)
where
    F: Fn(i64) -> f64,
{
    for i in 0..days {
        let date = end - Duration::days(days - i);
        insert_delivery(conn, product_id, date, qty(i), "DONE");
    }
}

pub fn insert_forecast(conn: &Connection, product_id: i64, date: NaiveDate, quantity: f64) {
    conn.execute(
        r#"
        INSERT INTO inventory_demand_forecast
            (product_id, forecast_date, predicted_quantity, confidence_lower, confidence_upper, created_at)
        VALUES (?1, ?2, ?3, ?3, ?3, '2026-01-01 00:00:00')
        "#,
        params![product_id, date.format("%Y-%m-%d").to_string(), quantity],
    )
    .expect("插入预测失败");
}

pub fn set_config(conn: &Connection, key: &str, value: &str) {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        params![key, value],
    )
    .expect("写入配置失败");
}

// ==========================================
// 断言辅助
// ==========================================

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .expect("计数失败")
}

/// 读取某产品全部预测 (date, predicted, lower, upper)，按日期升序
pub fn load_forecast_rows(conn: &Connection, product_id: i64) -> Vec<(String, f64, f64, f64)> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT forecast_date, predicted_quantity, confidence_lower, confidence_upper
            FROM inventory_demand_forecast
            WHERE product_id = ?1
            ORDER BY forecast_date
            "#,
        )
        .expect("prepare 失败");
    stmt.query_map(params![product_id], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })
    .expect("查询失败")
    .collect::<Result<Vec<_>, _>>()
    .expect("读取失败")
}
