// ==========================================
// 需求预测补货系统 - 需求预测领域模型
// ==========================================
// 对齐: inventory_demand_forecast 表
// 主键: (product_id, forecast_date)
// ==========================================

use crate::domain::types::BoundClamp;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ForecastPoint - 模型输出的单日预测
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, point: f64, lower: f64, upper: f64) -> Self {
        Self {
            date,
            point,
            lower,
            upper,
        }
    }

    /// 负需求在物理上不存在，按截断规则将三个值压到 0 以上
    ///
    /// # 截断规则
    /// - Independent: 三个值各自 max(0, x)，不修正相互顺序
    /// - OrderPreserving: lower = min(max(0, lower), point), upper = max(max(0, upper), point)
    pub fn clamp_non_negative(self, rule: BoundClamp) -> Self {
        let point = self.point.max(0.0);
        let lower = self.lower.max(0.0);
        let upper = self.upper.max(0.0);

        match rule {
            BoundClamp::Independent => Self::new(self.date, point, lower, upper),
            BoundClamp::OrderPreserving => {
                Self::new(self.date, point, lower.min(point), upper.max(point))
            }
        }
    }

    /// 四舍五入到 2 位小数（落库精度）
    pub fn rounded(self) -> Self {
        Self::new(
            self.date,
            round_2dp(self.point),
            round_2dp(self.lower),
            round_2dp(self.upper),
        )
    }
}

// ==========================================
// ForecastRecord - 已落库的预测行
// ==========================================
// 只由 ForecastWriter 写入，重跑时原地覆盖，不删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub product_id: i64,
    pub forecast_date: NaiveDate,
    pub predicted_quantity: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub created_at: NaiveDateTime, // 最后更新时间
}

/// 2 位小数四舍五入
pub fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_round_2dp() {
        assert_eq!(round_2dp(1.005_1), 1.01);
        assert_eq!(round_2dp(2.344), 2.34);
        assert_eq!(round_2dp(-0.0), 0.0);
    }

    #[test]
    fn test_clamp_floors_negative_values() {
        let p = ForecastPoint::new(day(), -1.5, -4.0, 2.0).clamp_non_negative(BoundClamp::Independent);
        assert_eq!(p.point, 0.0);
        assert_eq!(p.lower, 0.0);
        assert_eq!(p.upper, 2.0);
    }

    // 已知风险: 独立截断不修正顺序。输入区间本身不含点估计时，截断后仍是 upper < point。
    // 截断只会把负值抬到 0，不会制造 lower > upper。
    #[test]
    fn test_independent_clamp_keeps_unordered_bounds() {
        let p = ForecastPoint::new(day(), 5.0, -2.0, 3.0).clamp_non_negative(BoundClamp::Independent);
        assert_eq!(p.lower, 0.0);
        assert_eq!(p.upper, 3.0);
        assert!(p.upper < p.point);
        assert!(p.lower <= p.upper);
    }

    // 对称区间 (point ± w) 在独立截断后仍满足 lower <= point <= upper
    #[test]
    fn test_independent_clamp_of_symmetric_interval_stays_ordered() {
        for (point, width) in [(-1.0, 2.0), (0.5, 3.0), (-6.0, 1.0), (4.0, 1.0)] {
            let p = ForecastPoint::new(day(), point, point - width, point + width)
                .clamp_non_negative(BoundClamp::Independent);
            assert!(p.lower <= p.point && p.point <= p.upper, "{:?}", p);
        }
    }

    #[test]
    fn test_order_preserving_clamp() {
        let p =
            ForecastPoint::new(day(), 5.0, -2.0, 3.0).clamp_non_negative(BoundClamp::OrderPreserving);
        assert_eq!(p.lower, 0.0);
        assert_eq!(p.upper, 5.0);
        assert!(p.lower <= p.point && p.point <= p.upper);

        let q =
            ForecastPoint::new(day(), 1.0, 2.5, 4.0).clamp_non_negative(BoundClamp::OrderPreserving);
        assert_eq!(q.lower, 1.0);
        assert_eq!(q.upper, 4.0);
    }
}
