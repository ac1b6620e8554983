// ==========================================
// 需求预测补货系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod forecast;
pub mod movement;
pub mod reorder;
pub mod types;

// 重导出核心类型
pub use alert::{ShortageAlert, ShortageCandidate};
pub use forecast::{round_2dp, ForecastPoint, ForecastRecord};
pub use movement::{DemandObservation, MovementRecord, TransferLine};
pub use reorder::{ReorderDraft, ReorderReceipt, REORDER_NOTES};
pub use types::{offset_date, AlertLevel, BoundClamp, MovementStatus, MovementType, MAX_HORIZON_DAYS};
