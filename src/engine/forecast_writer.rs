// ==========================================
// 需求预测补货系统 - 预测结果写入
// ==========================================
// 红线:
// - 整条曲线同一事务提交，失败不留新旧混合数据
// - 落库前四舍五入到 2 位小数
// ==========================================

use crate::domain::forecast::ForecastPoint;
use crate::repository::{ForecastRepository, RepositoryResult};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

// ==========================================
// ForecastWriter - 预测曲线写入器
// ==========================================
pub struct ForecastWriter {
    forecast_repo: Arc<ForecastRepository>,
}

impl ForecastWriter {
    pub fn new(forecast_repo: Arc<ForecastRepository>) -> Self {
        Self { forecast_repo }
    }

    /// 幂等写入产品的预测曲线
    ///
    /// # 返回
    /// - Ok(rows): 写入行数
    pub fn persist(&self, product_id: i64, curve: &[ForecastPoint]) -> RepositoryResult<usize> {
        self.persist_at(product_id, curve, Local::now().naive_local())
    }

    /// 指定更新时间写入（测试/补算使用）
    pub fn persist_at(
        &self,
        product_id: i64,
        curve: &[ForecastPoint],
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rounded: Vec<ForecastPoint> = curve.iter().map(|p| p.rounded()).collect();
        self.forecast_repo.upsert_curve(product_id, &rounded, updated_at)
    }
}
