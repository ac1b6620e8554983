// ==========================================
// 需求预测补货系统 - 需求预测 API
// ==========================================
// 职责: 触发批量预测、查询单产品未来预测曲线
// ==========================================

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ForecastConfigReader;
use crate::domain::forecast::ForecastRecord;
use crate::engine::{
    ForecastBatchReport, ForecastWriter, ForecastingPipeline, ModelFactory, ProductSelector,
    SeriesExtractor,
};
use crate::repository::{ForecastRepository, MovementRepository};

/// 单产品预测查询条数上限
pub const PRODUCT_FORECAST_LIMIT: usize = 30;

// ==========================================
// DTO
// ==========================================

/// 批量预测响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBatchResponse {
    pub status: String,
    pub message: String,
    #[serde(flatten)]
    pub report: ForecastBatchReport,
}

/// 单日预测条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntryDto {
    pub date: String,
    pub qty: f64,
    pub range: [f64; 2],
}

impl From<ForecastRecord> for ForecastEntryDto {
    fn from(record: ForecastRecord) -> Self {
        Self {
            date: record.forecast_date.format("%Y-%m-%d").to_string(),
            qty: record.predicted_quantity,
            range: [record.confidence_lower, record.confidence_upper],
        }
    }
}

// ==========================================
// ForecastApi - 需求预测 API
// ==========================================
pub struct ForecastApi {
    movement_repo: Arc<MovementRepository>,
    forecast_repo: Arc<ForecastRepository>,
    config: Arc<dyn ForecastConfigReader>,
    model_factory: Option<ModelFactory>,
}

impl ForecastApi {
    pub fn new(
        movement_repo: Arc<MovementRepository>,
        forecast_repo: Arc<ForecastRepository>,
        config: Arc<dyn ForecastConfigReader>,
    ) -> Self {
        Self {
            movement_repo,
            forecast_repo,
            config,
            model_factory: None,
        }
    }

    /// 替换预测模型（默认 SeasonalTrendModel）
    pub fn with_model_factory(mut self, factory: ModelFactory) -> Self {
        self.model_factory = Some(factory);
        self
    }

    /// 按当前配置组装批量预测流程
    async fn build_pipeline(&self) -> ApiResult<ForecastingPipeline> {
        let settings = self
            .config
            .get_pipeline_settings()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let pipeline = ForecastingPipeline::new(
            Arc::new(ProductSelector::new(self.movement_repo.clone())),
            Arc::new(SeriesExtractor::new(self.movement_repo.clone())),
            Arc::new(ForecastWriter::new(self.forecast_repo.clone())),
            settings,
        );

        Ok(match &self.model_factory {
            Some(factory) => pipeline.with_model_factory(factory.clone()),
            None => pipeline,
        })
    }

    /// 触发批量预测（以本地日期为 today）
    pub async fn run_forecast_batch(&self) -> ApiResult<ForecastBatchResponse> {
        self.run_forecast_batch_at(Local::now().date_naive()).await
    }

    /// 触发批量预测
    ///
    /// # 返回
    /// - Ok(ForecastBatchResponse): 整批完成（单产品失败已计入汇总）
    /// - Err(ApiError::ForecastBatchFailed): 产品枚举失败
    pub async fn run_forecast_batch_at(&self, today: NaiveDate) -> ApiResult<ForecastBatchResponse> {
        let pipeline = self.build_pipeline().await?;

        // 拟合与写库均为同步阻塞操作
        let report = tokio::task::spawn_blocking(move || pipeline.run_at(today))
            .await
            .map_err(|e| ApiError::InternalError(format!("批量预测任务异常退出: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "批量预测失败");
                ApiError::from(e)
            })?;

        Ok(ForecastBatchResponse {
            status: "success".to_string(),
            message: "Demand forecasting completed.".to_string(),
            report,
        })
    }

    /// 查询单产品未来预测（以本地日期为 today）
    pub fn get_product_forecast(&self, product_id: i64) -> ApiResult<Vec<ForecastEntryDto>> {
        self.get_product_forecast_at(product_id, Local::now().date_naive())
    }

    /// 查询单产品未来预测
    ///
    /// # 返回
    /// - 日期 >= today，升序，最多 30 条；无预测时为空列表
    pub fn get_product_forecast_at(
        &self,
        product_id: i64,
        today: NaiveDate,
    ) -> ApiResult<Vec<ForecastEntryDto>> {
        let records = self
            .forecast_repo
            .find_upcoming(product_id, today, PRODUCT_FORECAST_LIMIT)?;

        Ok(records.into_iter().map(ForecastEntryDto::from).collect())
    }
}
