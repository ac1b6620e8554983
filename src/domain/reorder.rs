// ==========================================
// 需求预测补货系统 - 补货草稿单领域模型
// ==========================================
// 补货单 = type RECEIPT + status DRAFT 的入库单头 + 1 行明细
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 补货草稿单备注
pub const REORDER_NOTES: &str = "AI Generated based on Forecast";

// ==========================================
// ReorderDraft - 待写入的补货单（已校验）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderDraft {
    pub reference: String,
    pub vendor: String,
    pub product_id: i64,
    pub quantity: f64,
    pub scheduled_date: NaiveDate,
    pub dest_location_id: i64,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

// ==========================================
// ReorderReceipt - 补货单创建结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderReceipt {
    pub reference: String,
    pub order_id: i64,
}
