// ==========================================
// 需求预测补货系统 - 日需求序列提取
// ==========================================
// 输入: 出库单 + 明细
// 输出: 按自然日汇总、升序、不补缺口的需求序列
// ==========================================

use crate::domain::movement::DemandObservation;
use crate::repository::{MovementRepository, RepositoryResult};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// SeriesExtractor - 需求序列提取器
// ==========================================
pub struct SeriesExtractor {
    movement_repo: Arc<MovementRepository>,
}

impl SeriesExtractor {
    pub fn new(movement_repo: Arc<MovementRepository>) -> Self {
        Self { movement_repo }
    }

    /// 提取单个产品的日需求序列
    ///
    /// 无历史时返回空序列（不是错误）
    pub fn extract(&self, product_id: i64) -> RepositoryResult<Vec<DemandObservation>> {
        let series = self.movement_repo.find_daily_demand(product_id)?;
        debug!(product_id, observations = series.len(), "需求序列已提取");
        Ok(series)
    }
}
