// ==========================================
// 需求预测补货系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (补货草稿单需人工审批)
// ==========================================
// 主流程:
// 1. 批量预测: 出库历史 → 日需求序列 → 模型 → inventory_demand_forecast
// 2. 缺货告警: 当前库存 vs 窗口内预测需求
// 3. 补货: 缺货决策 → RECEIPT/DRAFT 入库单（单头 + 明细，原子写入）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertLevel, BoundClamp, MovementStatus, MovementType};

// 领域实体
pub use domain::{
    DemandObservation, ForecastPoint, ForecastRecord, MovementRecord, ReorderReceipt,
    ShortageAlert, TransferLine,
};

// 引擎
pub use engine::{
    AlertEngine, ForecastModel, ForecastWriter, ForecastingPipeline, ProductSelector,
    ReorderTransaction, SeasonalTrendModel, SeriesExtractor,
};

// API
pub use api::{AlertApi, ApiError, ApiResult, ForecastApi, ProcurementApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "需求预测补货系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
