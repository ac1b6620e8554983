// ==========================================
// 需求预测补货系统 - 可预测产品筛选
// ==========================================
// 口径: 至少有一行明细属于 DELIVERY + DONE 单据
// 红线: 只读
// ==========================================

use crate::repository::{MovementRepository, RepositoryResult};
use std::collections::HashSet;
use std::sync::Arc;

// ==========================================
// ProductSelector - 可预测产品筛选器
// ==========================================
pub struct ProductSelector {
    movement_repo: Arc<MovementRepository>,
}

impl ProductSelector {
    pub fn new(movement_repo: Arc<MovementRepository>) -> Self {
        Self { movement_repo }
    }

    /// 当前具备出库历史的产品ID集合（无顺序保证）
    pub fn eligible_products(&self) -> RepositoryResult<HashSet<i64>> {
        self.movement_repo.find_products_with_done_deliveries()
    }
}
