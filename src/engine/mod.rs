// ==========================================
// 需求预测补货系统 - 引擎层
// ==========================================
// 职责: 实现预测/告警/补货规则,不拼 SQL
// 红线: Engine 不拼 SQL, 数据访问全部经由 Repository
// ==========================================

pub mod alert;
pub mod error;
pub mod forecast_model;
pub mod forecast_writer;
pub mod pipeline;
pub mod product_selector;
pub mod reorder;
pub mod series_extractor;

// 重导出核心引擎
pub use alert::{AlertEngine, DEFAULT_ALERT_HORIZON_DAYS};
pub use error::{ForecastError, ModelError, ReorderError};
pub use forecast_model::{ForecastModel, ModelOptions, SeasonalTrendModel, SeasonalityConfig};
pub use forecast_writer::ForecastWriter;
pub use pipeline::{
    ForecastBatchReport, ForecastingPipeline, ModelFactory, PipelineSettings, ProductFailure,
};
pub use product_selector::ProductSelector;
pub use reorder::{ReorderSettings, ReorderTransaction};
pub use series_extractor::SeriesExtractor;
