// ==========================================
// 需求预测补货系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行/外部传输层调用
// ==========================================

pub mod alert_api;
pub mod error;
pub mod forecast_api;
pub mod procurement_api;

// 重导出核心类型
pub use alert_api::{AlertApi, ShortageAlertDto, ShortageAlertsResponse};
pub use error::{ApiError, ApiResult};
pub use forecast_api::{ForecastApi, ForecastBatchResponse, ForecastEntryDto};
pub use procurement_api::{AutoReorderRequest, AutoReorderResponse, ProcurementApi, ReorderDetailDto};
