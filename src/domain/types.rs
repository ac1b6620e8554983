// ==========================================
// 需求预测补货系统 - 领域类型定义
// ==========================================
// 对齐: inventory_stockmove.type / status 枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 单据类型 (Movement Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,    // 入库
    Delivery,   // 出库
    Internal,   // 内部调拨
    Adjustment, // 盘点调整
}

impl MovementType {
    /// 数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "RECEIPT",
            MovementType::Delivery => "DELIVERY",
            MovementType::Internal => "INTERNAL",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }

    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RECEIPT" => Some(MovementType::Receipt),
            "DELIVERY" => Some(MovementType::Delivery),
            "INTERNAL" => Some(MovementType::Internal),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            _ => None,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 单据状态 (Movement Status)
// ==========================================
// 只有 DONE 的出库单计入历史需求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    Draft,     // 草稿
    Waiting,   // 等待
    Ready,     // 就绪
    Done,      // 完成
    Cancelled, // 取消
}

impl MovementStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementStatus::Draft => "DRAFT",
            MovementStatus::Waiting => "WAITING",
            MovementStatus::Ready => "READY",
            MovementStatus::Done => "DONE",
            MovementStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(MovementStatus::Draft),
            "WAITING" => Some(MovementStatus::Waiting),
            "READY" => Some(MovementStatus::Ready),
            "DONE" => Some(MovementStatus::Done),
            "CANCELLED" => Some(MovementStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 缺货告警等级 (Alert Level)
// ==========================================
// 红线: 库存为 0 一律 CRITICAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Critical, // 已断货
    Warning,  // 库存不足
}

impl AlertLevel {
    /// 按当前库存判定等级
    pub fn for_stock(stock: f64) -> Self {
        if stock == 0.0 {
            AlertLevel::Critical
        } else {
            AlertLevel::Warning
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Critical => write!(f, "CRITICAL"),
            AlertLevel::Warning => write!(f, "WARNING"),
        }
    }
}

// ==========================================
// 置信区间截断规则 (Bound Clamp)
// ==========================================
// Independent: 点估计/下界/上界各自截断到 0（兼容旧口径，可能出现 upper < point）
// OrderPreserving: 截断后保证 lower <= point <= upper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundClamp {
    #[default]
    Independent,
    OrderPreserving,
}

impl BoundClamp {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BoundClamp::Independent => "INDEPENDENT",
            BoundClamp::OrderPreserving => "ORDER_PRESERVING",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INDEPENDENT" => Some(BoundClamp::Independent),
            "ORDER_PRESERVING" => Some(BoundClamp::OrderPreserving),
            _ => None,
        }
    }
}

// ==========================================
// 日期偏移
// ==========================================
// 预测/告警窗口与补货提前期的上限（天）
pub const MAX_HORIZON_DAYS: i64 = 3650;

/// date + days，越界返回 None
pub fn offset_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}
