// Small dev utility: reset the database and seed a demo inventory so that
// `demand-forecast forecast` / `alerts` produce non-trivial output right away.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path] [history_days]

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local};
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use demand_forecast::app::get_default_db_path;
use demand_forecast::db::{ensure_schema, open_sqlite_connection};

const DEFAULT_HISTORY_DAYS: i64 = 90;

// (id, name, sku, base daily demand, weekend factor, on-hand stock)
const PRODUCTS: &[(i64, &str, &str, f64, f64, f64)] = &[
    (1, "Steel Rod 12mm", "SR-12", 20.0, 0.4, 500.0),
    (2, "Steel Sheet 2mm", "SS-02", 16.0, 0.5, 0.0),
    (3, "Hex Bolt M8", "HB-M8", 120.0, 0.2, 300.0),
    (4, "Copper Wire 1.5", "CW-15", 8.0, 1.0, 40.0),
    (5, "Sample Kit", "SK-01", 1.0, 1.0, 5.0), // 只有零星出库
];

fn main() -> Result<()> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    let history_days = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_HISTORY_DAYS)
        .max(14);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("failed to open {}", db_path))?;
    ensure_schema(&conn).context("failed to create schema")?;
    seed_demo(&conn, history_days).context("failed to seed demo data")?;

    println!("seeded {} ({} days of history)", db_path, history_days);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)
        .with_context(|| format!("failed to back up {} -> {}", db_path, backup_path))?;
    fs::remove_file(path).with_context(|| format!("failed to remove {}", db_path))?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo(conn: &Connection, history_days: i64) -> Result<()> {
    let today = Local::now().date_naive();
    let tx = conn.unchecked_transaction()?;

    for &(id, name, sku, base, weekend_factor, stock) in PRODUCTS {
        tx.execute(
            "INSERT INTO inventory_product (id, name, sku) VALUES (?1, ?2, ?3)",
            params![id, name, sku],
        )?;
        tx.execute(
            "INSERT INTO inventory_stockquant (product_id, location_id, quantity) VALUES (?1, 1, ?2)",
            params![id, stock],
        )?;

        for offset in (1..=history_days).rev() {
            let date = today - Duration::days(offset);
            // 零星出库: 每 30 天一次
            if id == 5 && offset % 30 != 0 {
                continue;
            }

            let weekday = date.weekday().num_days_from_monday();
            let factor = if weekday >= 5 { weekend_factor } else { 1.0 };
            // 缓慢上升的趋势 + 确定性扰动
            let trend = 1.0 + (history_days - offset) as f64 / (history_days as f64 * 4.0);
            let jitter = ((offset * 7 + id * 13) % 5) as f64 - 2.0;
            let qty = (base * factor * trend + jitter).max(0.0).round();

            tx.execute(
                r#"
                INSERT INTO inventory_stockmove (type, reference, contact, status, scheduled_date, created_at)
                VALUES ('DELIVERY', ?1, 'Walk-in Customer', 'DONE', ?2, ?3)
                "#,
                params![
                    format!("OUT-{}", &Uuid::new_v4().simple().to_string()[..12]),
                    date.format("%Y-%m-%d").to_string(),
                    date.format("%Y-%m-%d 08:00:00").to_string(),
                ],
            )?;
            let move_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO inventory_stocktransfer (stockmove_id, product_id, quantity) VALUES (?1, ?2, ?3)",
                params![move_id, id, qty],
            )?;
        }
    }

    // 未完成的出库不参与预测
    tx.execute(
        r#"
        INSERT INTO inventory_stockmove (type, reference, status, scheduled_date)
        VALUES ('DELIVERY', 'OUT-PENDING-1', 'READY', ?1)
        "#,
        params![today.format("%Y-%m-%d").to_string()],
    )?;
    let move_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO inventory_stocktransfer (stockmove_id, product_id, quantity) VALUES (?1, 1, 999)",
        params![move_id],
    )?;

    tx.commit()?;
    Ok(())
}
