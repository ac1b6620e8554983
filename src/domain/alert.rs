// ==========================================
// 需求预测补货系统 - 缺货告警领域模型
// ==========================================

use crate::domain::types::AlertLevel;
use serde::{Deserialize, Serialize};

// ==========================================
// ShortageCandidate - 库存与预测需求对账行
// ==========================================
// 由仓储层读出，stock / demand 缺失时已按 0 处理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageCandidate {
    pub product_id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub stock: f64,
    pub demand: f64,
}

// ==========================================
// ShortageAlert - 缺货告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageAlert {
    pub product_id: i64,
    pub product_name: String,
    pub sku: Option<String>,
    pub current_stock: f64,
    pub predicted_demand: f64,     // 2 位小数
    pub shortage_estimation: f64,  // demand - stock, 2 位小数
    pub alert_level: AlertLevel,
}
