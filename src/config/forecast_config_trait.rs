// ==========================================
// 需求预测补货系统 - 预测配置读取 Trait
// ==========================================
// 职责: 定义预测/告警/补货所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::BoundClamp;
use crate::engine::pipeline::PipelineSettings;
use crate::engine::reorder::ReorderSettings;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取错误
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ForecastConfigReader Trait
// ==========================================
// 用途: 组装各引擎的运行参数
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ForecastConfigReader: Send + Sync {
    // ===== 批量预测 =====

    /// 预测天数
    ///
    /// # 默认值
    /// - 30
    async fn get_forecast_horizon_days(&self) -> ConfigResult<usize>;

    /// 最少历史观测数
    ///
    /// # 默认值
    /// - 5（不允许小于 2）
    async fn get_forecast_min_history(&self) -> ConfigResult<usize>;

    /// 周季节性 / 年季节性 / 日季节性开关
    ///
    /// # 默认值
    /// - (true, false, false)
    async fn get_seasonality_flags(&self) -> ConfigResult<(bool, bool, bool)>;

    /// 置信区间覆盖率，取值 (0, 1)
    ///
    /// # 默认值
    /// - 0.8
    async fn get_interval_width(&self) -> ConfigResult<f64>;

    /// 预测值截断规则
    ///
    /// # 默认值
    /// - INDEPENDENT
    async fn get_bound_clamp(&self) -> ConfigResult<BoundClamp>;

    // ===== 缺货告警 =====

    /// 默认告警窗口（天）
    ///
    /// # 默认值
    /// - 7
    async fn get_alert_horizon_days(&self) -> ConfigResult<i64>;

    // ===== 补货 =====

    /// 补货单参数（提前期/占位供应商/单号前缀/重试上限/收货库位）
    async fn get_reorder_settings(&self) -> ConfigResult<ReorderSettings>;

    /// 组装批量预测参数
    async fn get_pipeline_settings(&self) -> ConfigResult<PipelineSettings>;
}
