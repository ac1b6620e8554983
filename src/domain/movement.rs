// ==========================================
// 需求预测补货系统 - 出入库单领域模型
// ==========================================
// 对齐: inventory_stockmove / inventory_stocktransfer 表
// ==========================================

use crate::domain::types::{MovementStatus, MovementType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// MovementRecord - 出入库单头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: i64,
    pub movement_type: MovementType,
    pub reference: Option<String>,
    pub contact: Option<String>,      // 供应商/客户
    pub status: MovementStatus,
    pub source_location_id: Option<i64>,
    pub dest_location_id: Option<i64>,
    pub scheduled_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// TransferLine - 单据明细行
// ==========================================
// 每行只属于一张单据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLine {
    pub id: i64,
    pub stockmove_id: i64,
    pub product_id: i64,
    pub quantity: f64, // 非负
}

// ==========================================
// DemandObservation - 日需求观测值（派生，不落库）
// ==========================================
// 同一产品、同一计划日期的 DONE 出库数量之和
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandObservation {
    pub date: NaiveDate,
    pub quantity: f64,
}

impl DemandObservation {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}
