// ==========================================
// 需求预测补货系统 - 缺货告警引擎
// ==========================================
// 规则:
// - demand = [today, today + horizon_days] 内预测需求之和
// - 仅当 stock < demand 时告警（相等不告警）
// - stock == 0 → CRITICAL，否则 WARNING
// - 结果顺序不作保证
// ==========================================

use crate::domain::alert::{ShortageAlert, ShortageCandidate};
use crate::domain::forecast::round_2dp;
use crate::domain::types::{offset_date, AlertLevel, MAX_HORIZON_DAYS};
use crate::repository::{RepositoryResult, StockRepository};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info};

/// 默认告警窗口（天）
pub const DEFAULT_ALERT_HORIZON_DAYS: i64 = 7;

// ==========================================
// AlertEngine - 缺货告警引擎
// ==========================================
pub struct AlertEngine {
    stock_repo: Arc<StockRepository>,
}

impl AlertEngine {
    pub fn new(stock_repo: Arc<StockRepository>) -> Self {
        Self { stock_repo }
    }

    /// 以本地日期为 today 计算缺货告警
    pub fn shortages(&self, horizon_days: i64) -> RepositoryResult<Vec<ShortageAlert>> {
        self.shortages_at(Local::now().date_naive(), horizon_days)
    }

    /// 计算缺货告警
    ///
    /// # 参数
    /// - `today`: 窗口起点（含）
    /// - `horizon_days`: 窗口长度，终点 today + horizon_days（含）；截断到 [0, MAX_HORIZON_DAYS]
    pub fn shortages_at(
        &self,
        today: NaiveDate,
        horizon_days: i64,
    ) -> RepositoryResult<Vec<ShortageAlert>> {
        let horizon_days = horizon_days.clamp(0, MAX_HORIZON_DAYS);
        let to_date = offset_date(today, horizon_days).unwrap_or(NaiveDate::MAX);
        let candidates = self.stock_repo.find_stock_vs_demand(today, to_date)?;
        debug!(candidates = candidates.len(), %today, %to_date, "库存对账完成");

        let alerts: Vec<ShortageAlert> = candidates.into_iter().filter_map(evaluate).collect();

        info!(count = alerts.len(), horizon_days, "缺货告警计算完成");
        Ok(alerts)
    }
}

/// 单产品判定：缺货则生成告警
fn evaluate(candidate: ShortageCandidate) -> Option<ShortageAlert> {
    if candidate.stock >= candidate.demand {
        return None;
    }

    Some(ShortageAlert {
        product_id: candidate.product_id,
        product_name: candidate.name,
        sku: candidate.sku,
        current_stock: candidate.stock,
        predicted_demand: round_2dp(candidate.demand),
        shortage_estimation: round_2dp(candidate.demand - candidate.stock),
        alert_level: AlertLevel::for_stock(candidate.stock),
    })
}
