// ==========================================
// 需求预测补货系统 - 配置层
// ==========================================
// 职责: 系统配置管理,缺省值兜底
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod forecast_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use forecast_config_trait::{ConfigResult, ForecastConfigReader};
