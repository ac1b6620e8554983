// ==========================================
// 需求预测补货系统 - 采购补货 API
// ==========================================
// 职责: 将缺货决策转为补货草稿单；按单号查询草稿单
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ForecastConfigReader;
use crate::domain::movement::{MovementRecord, TransferLine};
use crate::engine::reorder::ReferenceSuffixFn;
use crate::engine::ReorderTransaction;
use crate::repository::MovementRepository;

// ==========================================
// DTO
// ==========================================

/// 补货请求（product_id / quantity 缺失时返回 400）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoReorderRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<f64>,
    pub vendor: Option<String>,
}

/// 补货响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReorderResponse {
    pub status: String,
    pub message: String,
    pub order_reference: String,
    pub stockmove_id: i64,
}

/// 草稿单详情（单头 + 明细）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderDetailDto {
    pub header: MovementRecord,
    pub lines: Vec<TransferLine>,
}

// ==========================================
// ProcurementApi - 采购补货 API
// ==========================================
pub struct ProcurementApi {
    movement_repo: Arc<MovementRepository>,
    config: Arc<dyn ForecastConfigReader>,
    suffix_fn: Option<ReferenceSuffixFn>,
}

impl ProcurementApi {
    pub fn new(movement_repo: Arc<MovementRepository>, config: Arc<dyn ForecastConfigReader>) -> Self {
        Self {
            movement_repo,
            config,
            suffix_fn: None,
        }
    }

    /// 替换单号后缀生成器
    pub fn with_suffix_fn(mut self, suffix_fn: ReferenceSuffixFn) -> Self {
        self.suffix_fn = Some(suffix_fn);
        self
    }

    /// 创建补货草稿单
    ///
    /// # 返回
    /// - Ok(AutoReorderResponse): 单号与单头ID
    /// - Err(ApiError::InvalidInput): 参数缺失或数量非正（未写入任何数据）
    /// - Err(ApiError::ReorderFailed): 事务失败（已回滚）
    pub async fn create_reorder(&self, request: AutoReorderRequest) -> ApiResult<AutoReorderResponse> {
        if request.product_id.is_none() || request.quantity.is_none() {
            return Err(ApiError::InvalidInput(
                "Missing product_id or quantity".to_string(),
            ));
        }

        let settings = self
            .config
            .get_reorder_settings()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let transaction = ReorderTransaction::new(self.movement_repo.clone(), settings);
        let transaction = match &self.suffix_fn {
            Some(suffix_fn) => transaction.with_suffix_fn(suffix_fn.clone()),
            None => transaction,
        };

        let receipt = transaction.create(request.product_id, request.quantity, request.vendor)?;

        Ok(AutoReorderResponse {
            status: "success".to_string(),
            message: format!("Draft Order {} created successfully.", receipt.reference),
            order_reference: receipt.reference,
            stockmove_id: receipt.order_id,
        })
    }

    /// 按单号查询补货草稿单
    pub fn get_reorder(&self, reference: &str) -> ApiResult<ReorderDetailDto> {
        if reference.trim().is_empty() {
            return Err(ApiError::InvalidInput("单号不能为空".to_string()));
        }

        let header = self
            .movement_repo
            .find_by_reference(reference.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("补货单(reference={})不存在", reference)))?;
        let lines = self.movement_repo.find_lines(header.id)?;

        Ok(ReorderDetailDto { header, lines })
    }
}
