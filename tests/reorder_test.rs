// ==========================================
// 补货草稿单 集成测试
// ==========================================
// 测试范围:
// 1. 正常创建: 单号格式、RECEIPT/DRAFT 单头、计划日期、单行明细
// 2. 参数缺失: 拒绝且不写入
// 3. 明细写入失败: 整体回滚
// 4. 并发创建: 单号互不相同，单头与明细一一对应
// ==========================================

mod test_helpers;

use chrono::{Duration, Local};
use demand_forecast::api::{ApiError, AutoReorderRequest};
use demand_forecast::config::config_keys;
use demand_forecast::db::open_sqlite_connection;
use demand_forecast::engine::{ReorderSettings, ReorderTransaction};
use demand_forecast::repository::MovementRepository;
use demand_forecast::{MovementStatus, MovementType};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use test_helpers::*;

/// PO-AUTO- + 8 位大写十六进制
fn is_auto_reference(reference: &str) -> bool {
    match reference.strip_prefix("PO-AUTO-") {
        Some(suffix) => {
            suffix.len() == 8
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        }
        None => false,
    }
}

// ==========================================
// 正常创建
// ==========================================

#[tokio::test]
async fn test_创建补货草稿单() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let response = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: Some(2),
            quantity: Some(48.0),
            vendor: Some("Best Steel Co".to_string()),
        })
        .await
        .expect("创建补货单失败");

    assert_eq!(response.status, "success");
    assert!(is_auto_reference(&response.order_reference), "单号格式错误: {}", response.order_reference);
    assert!(response.message.contains(&response.order_reference));

    let detail = env
        .state
        .procurement_api
        .get_reorder(&response.order_reference)
        .expect("查询补货单失败");

    assert_eq!(detail.header.id, response.stockmove_id);
    assert_eq!(detail.header.movement_type, MovementType::Receipt);
    assert_eq!(detail.header.status, MovementStatus::Draft);
    assert_eq!(detail.header.contact.as_deref(), Some("Best Steel Co"));
    assert_eq!(detail.header.dest_location_id, Some(1));
    assert_eq!(detail.header.notes.as_deref(), Some("AI Generated based on Forecast"));
    assert_eq!(
        detail.header.scheduled_date,
        Local::now().date_naive() + Duration::days(3)
    );

    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].product_id, 2);
    assert_eq!(detail.lines[0].quantity, 48.0);
    assert_eq!(detail.lines[0].stockmove_id, response.stockmove_id);
}

#[tokio::test]
async fn test_未指定供应商使用占位值() {
    let env = TestEnv::new().expect("无法创建测试环境");
    {
        let conn = env.conn();
        set_config(&conn, config_keys::REORDER_REFERENCE_PREFIX, "PO-TEST-");
        set_config(&conn, config_keys::REORDER_LEAD_DAYS, "5");
    }

    let response = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: Some(7),
            quantity: Some(3.5),
            vendor: None,
        })
        .await
        .expect("创建补货单失败");

    assert!(response.order_reference.starts_with("PO-TEST-"));

    let detail = env
        .state
        .procurement_api
        .get_reorder(&response.order_reference)
        .unwrap();
    assert_eq!(detail.header.contact.as_deref(), Some("Pending Vendor"));
    assert_eq!(
        detail.header.scheduled_date,
        Local::now().date_naive() + Duration::days(5)
    );
}

// ==========================================
// 参数校验
// ==========================================

#[tokio::test]
async fn test_缺少产品ID被拒绝且不写入() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let err = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: None,
            quantity: Some(48.0),
            vendor: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(err.status_code(), 400);

    let conn = env.conn();
    assert_eq!(count_rows(&conn, "inventory_stockmove"), 0);
    assert_eq!(count_rows(&conn, "inventory_stocktransfer"), 0);
}

#[tokio::test]
async fn test_数量非法被拒绝且不写入() {
    let env = TestEnv::new().expect("无法创建测试环境");

    for quantity in [None, Some(0.0), Some(-5.0)] {
        let err = env
            .state
            .procurement_api
            .create_reorder(AutoReorderRequest {
                product_id: Some(2),
                quantity,
                vendor: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error(), "quantity={:?} 应为客户端错误", quantity);
    }

    assert_eq!(count_rows(&env.conn(), "inventory_stockmove"), 0);
}

#[tokio::test]
async fn test_提前期配置越界时拒绝且不写入() {
    let env = TestEnv::new().expect("无法创建测试环境");
    set_config(&env.conn(), config_keys::REORDER_LEAD_DAYS, &i64::MAX.to_string());

    let err = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: Some(2),
            quantity: Some(48.0),
            vendor: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ConfigError(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(count_rows(&env.conn(), "inventory_stockmove"), 0);
}

#[tokio::test]
async fn test_产品ID为零被拒绝() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let err = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: Some(0),
            quantity: Some(48.0),
            vendor: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(count_rows(&env.conn(), "inventory_stockmove"), 0);
}

#[test]
fn test_查询不存在的补货单() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let err = env
        .state
        .procurement_api
        .get_reorder("PO-AUTO-00000000")
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// ==========================================
// 事务回滚
// ==========================================

#[tokio::test]
async fn test_明细写入失败时整体回滚() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.conn()
        .execute_batch(
            r#"
            CREATE TRIGGER reject_transfer BEFORE INSERT ON inventory_stocktransfer
            BEGIN
                SELECT RAISE(ABORT, 'transfer rejected');
            END;
            "#,
        )
        .unwrap();

    let err = env
        .state
        .procurement_api
        .create_reorder(AutoReorderRequest {
            product_id: Some(2),
            quantity: Some(48.0),
            vendor: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ReorderFailed(_)));
    assert_eq!(err.status_code(), 500);

    let conn = env.conn();
    assert_eq!(count_rows(&conn, "inventory_stockmove"), 0, "不应残留单头");
    assert_eq!(count_rows(&conn, "inventory_stocktransfer"), 0);
}

// ==========================================
// 并发
// ==========================================

#[test]
fn test_并发创建单号互不相同() {
    let (_temp_file, db_path) = create_test_db().expect("无法创建测试数据库");
    let conn = open_sqlite_connection(&db_path).unwrap();
    let repo = Arc::new(MovementRepository::new(Arc::new(Mutex::new(conn))));
    let transaction = Arc::new(ReorderTransaction::new(repo, ReorderSettings::default()));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let transaction = Arc::clone(&transaction);
            thread::spawn(move || {
                (0..5)
                    .map(|i| {
                        transaction
                            .create(Some(worker + 1), Some(1.0 + i as f64), None)
                            .expect("并发创建失败")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let receipts: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("线程异常"))
        .collect();

    let references: HashSet<_> = receipts.iter().map(|r| r.reference.clone()).collect();
    assert_eq!(references.len(), 40, "单号出现重复");
    assert!(references.iter().all(|r| is_auto_reference(r)));

    let check = open_test_conn(&db_path);
    assert_eq!(count_rows(&check, "inventory_stockmove"), 40);
    assert_eq!(count_rows(&check, "inventory_stocktransfer"), 40);
    let orphan_headers: i64 = check
        .query_row(
            r#"
            SELECT COUNT(*) FROM inventory_stockmove m
            WHERE (SELECT COUNT(*) FROM inventory_stocktransfer t WHERE t.stockmove_id = m.id) != 1
            "#,
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphan_headers, 0, "每张单头必须恰好一行明细");
}
