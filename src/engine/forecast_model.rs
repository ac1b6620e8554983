// ==========================================
// 需求预测补货系统 - 需求预测模型
// ==========================================
// 模型: 加法分解 y(t) = 截距 + 趋势·t + Σ 傅里叶季节项
// 季节: 周(周期 7, 阶数 3) 默认开启; 年(365.25, 10) / 日(1, 4) 默认关闭
// 拟合: 岭回归正规方程 + Cholesky 分解（确定性，重跑结果一致）
// 区间: point ± z·σ·sqrt(1 + h/n)
// ==========================================
// 红线:
// - 历史观测少于 min_history 拒绝拟合（不是拟合一个不稳定的模型）
// - 预测值/下界/上界按截断规则压到 0 以上
// ==========================================

use crate::domain::forecast::ForecastPoint;
use crate::domain::movement::DemandObservation;
use crate::domain::types::{offset_date, BoundClamp, MAX_HORIZON_DAYS};
use crate::engine::error::ModelError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 最少历史观测条数
pub const DEFAULT_MIN_HISTORY: usize = 5;

/// 批量预测默认天数
pub const DEFAULT_HORIZON_DAYS: usize = 30;

/// 默认区间覆盖率
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.8;

const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const DAILY_PERIOD: f64 = 1.0;
const DAILY_ORDER: usize = 4;

// 岭回归惩罚（y 已按最大值缩放）
const TREND_PENALTY: f64 = 1e-4;
const SEASONALITY_PENALTY: f64 = 1.0;
const PIVOT_EPSILON: f64 = 1e-12;

// ==========================================
// SeasonalityConfig - 季节项开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalityConfig {
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
    pub daily_seasonality: bool,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self {
            weekly_seasonality: true,
            yearly_seasonality: false,
            daily_seasonality: false,
        }
    }
}

impl SeasonalityConfig {
    /// 启用的 (周期, 阶数) 列表
    fn components(&self) -> Vec<(f64, usize)> {
        let mut components = Vec::new();
        if self.weekly_seasonality {
            components.push((WEEKLY_PERIOD, WEEKLY_ORDER));
        }
        if self.yearly_seasonality {
            components.push((YEARLY_PERIOD, YEARLY_ORDER));
        }
        if self.daily_seasonality {
            components.push((DAILY_PERIOD, DAILY_ORDER));
        }
        components
    }
}

// ==========================================
// ModelOptions - 模型参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    pub seasonality: SeasonalityConfig,
    pub min_history: usize,
    pub interval_width: f64,
    pub bound_clamp: BoundClamp,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            seasonality: SeasonalityConfig::default(),
            min_history: DEFAULT_MIN_HISTORY,
            interval_width: DEFAULT_INTERVAL_WIDTH,
            bound_clamp: BoundClamp::Independent,
        }
    }
}

// ==========================================
// Trait: ForecastModel
// ==========================================
// 用途: 可训练的时间序列模型（每个产品独立实例）
pub trait ForecastModel: Send {
    /// 在历史需求序列上拟合
    ///
    /// # 返回
    /// - Err(InsufficientHistory): 观测数不足
    /// - Err(FitFailed): 序列非法或方程奇异
    fn fit(&mut self, series: &[DemandObservation]) -> Result<(), ModelError>;

    /// 预测历史末日之后 horizon 天，只保留严格晚于 today 的日期
    ///
    /// horizon 超过 MAX_HORIZON_DAYS 返回 Err(HorizonOutOfRange)
    fn predict(&self, horizon: usize, today: NaiveDate) -> Result<Vec<ForecastPoint>, ModelError>;
}

// ==========================================
// SeasonalTrendModel - 趋势 + 季节加法模型
// ==========================================
#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    options: ModelOptions,
    fitted: Option<FittedState>,
}

#[derive(Debug, Clone)]
struct FittedState {
    coefficients: Vec<f64>,
    origin: NaiveDate,
    last_date: NaiveDate,
    time_scale: f64,
    y_scale: f64,
    sigma: f64,
    n_observations: usize,
}

impl SeasonalTrendModel {
    pub fn new(options: ModelOptions) -> Self {
        Self {
            options,
            fitted: None,
        }
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// 单行设计向量: [1, t, sin/cos(2πk·d/P)...]
    fn design_row(&self, day_offset: f64, time_scale: f64) -> Vec<f64> {
        let mut row = vec![1.0, day_offset / time_scale];
        for (period, order) in self.options.seasonality.components() {
            for k in 1..=order {
                let angle = 2.0 * PI * k as f64 * day_offset / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
        row
    }

    fn validate_series(&self, series: &[DemandObservation]) -> Result<(), ModelError> {
        let required = self.options.min_history.max(2);
        if series.len() < required {
            return Err(ModelError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }

        for obs in series {
            if !obs.quantity.is_finite() || obs.quantity < 0.0 {
                return Err(ModelError::FitFailed(format!(
                    "{} 的需求量非法: {}",
                    obs.date, obs.quantity
                )));
            }
        }

        if let Some(pair) = series.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ModelError::FitFailed(format!(
                "日期未严格递增: {} -> {}",
                pair[0].date, pair[1].date
            )));
        }

        Ok(())
    }
}

impl ForecastModel for SeasonalTrendModel {
    fn fit(&mut self, series: &[DemandObservation]) -> Result<(), ModelError> {
        self.fitted = None;
        self.validate_series(series)?;

        let origin = series[0].date;
        let last_date = series[series.len() - 1].date;
        let time_scale = ((last_date - origin).num_days() as f64).max(1.0);
        let y_scale = series
            .iter()
            .map(|o| o.quantity.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let rows: Vec<Vec<f64>> = series
            .iter()
            .map(|o| self.design_row((o.date - origin).num_days() as f64, time_scale))
            .collect();
        let targets: Vec<f64> = series.iter().map(|o| o.quantity / y_scale).collect();
        let p = rows[0].len();

        // 正规方程 (XᵀX + Λ) β = Xᵀy
        let mut xtx = vec![0.0; p * p];
        let mut xty = vec![0.0; p];
        for (row, y) in rows.iter().zip(&targets) {
            for i in 0..p {
                xty[i] += row[i] * y;
                for j in 0..p {
                    xtx[i * p + j] += row[i] * row[j];
                }
            }
        }
        xtx[p + 1] += TREND_PENALTY;
        for i in 2..p {
            xtx[i * p + i] += SEASONALITY_PENALTY;
        }

        let coefficients = solve_cholesky(xtx, xty, p)
            .ok_or_else(|| ModelError::FitFailed("正规方程奇异，无法求解".to_string()))?;

        let sse: f64 = rows
            .iter()
            .zip(&targets)
            .map(|(row, y)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let sigma = (sse / series.len() as f64).sqrt() * y_scale;

        if !sigma.is_finite() || coefficients.iter().any(|b| !b.is_finite()) {
            return Err(ModelError::FitFailed("拟合结果非有限值".to_string()));
        }

        self.fitted = Some(FittedState {
            coefficients,
            origin,
            last_date,
            time_scale,
            y_scale,
            sigma,
            n_observations: series.len(),
        });
        Ok(())
    }

    fn predict(&self, horizon: usize, today: NaiveDate) -> Result<Vec<ForecastPoint>, ModelError> {
        let state = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let max = MAX_HORIZON_DAYS as usize;
        if horizon > max {
            return Err(ModelError::HorizonOutOfRange { horizon, max });
        }
        let z = normal_quantile(0.5 + self.options.interval_width / 2.0);

        let mut curve = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let date = offset_date(state.last_date, h as i64)
                .ok_or_else(|| ModelError::FitFailed(format!("{} 之后第 {} 天超出日期范围", state.last_date, h)))?;
            if date <= today {
                continue;
            }

            let row = self.design_row((date - state.origin).num_days() as f64, state.time_scale);
            let point: f64 = row
                .iter()
                .zip(&state.coefficients)
                .map(|(x, b)| x * b)
                .sum::<f64>()
                * state.y_scale;
            let half_width =
                z * state.sigma * (1.0 + h as f64 / state.n_observations as f64).sqrt();

            if !point.is_finite() || !half_width.is_finite() {
                return Err(ModelError::FitFailed(format!("{} 的预测值非有限值", date)));
            }

            curve.push(
                ForecastPoint::new(date, point, point - half_width, point + half_width)
                    .clamp_non_negative(self.options.bound_clamp),
            );
        }

        Ok(curve)
    }
}

// ==========================================
// 数值工具
// ==========================================

/// Cholesky 分解求解对称正定方程组 A·x = b（A 按行展开，p×p）
///
/// 主元不足 PIVOT_EPSILON 视为奇异，返回 None
fn solve_cholesky(mut a: Vec<f64>, b: Vec<f64>, p: usize) -> Option<Vec<f64>> {
    // 原地分解为下三角 L
    for j in 0..p {
        let mut diag = a[j * p + j];
        for k in 0..j {
            diag -= a[j * p + k] * a[j * p + k];
        }
        if diag.is_nan() || diag <= PIVOT_EPSILON {
            return None;
        }
        let diag = diag.sqrt();
        a[j * p + j] = diag;

        for i in (j + 1)..p {
            let mut value = a[i * p + j];
            for k in 0..j {
                value -= a[i * p + k] * a[j * p + k];
            }
            a[i * p + j] = value / diag;
        }
    }

    // L·y = b
    let mut y = vec![0.0; p];
    for i in 0..p {
        let mut value = b[i];
        for k in 0..i {
            value -= a[i * p + k] * y[k];
        }
        y[i] = value / a[i * p + i];
    }

    // Lᵀ·x = y
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let mut value = y[i];
        for k in (i + 1)..p {
            value -= a[k * p + i] * x[k];
        }
        x[i] = value / a[i * p + i];
    }

    Some(x)
}

/// 标准正态分布分位数（Acklam 有理逼近，相对误差 < 1.2e-9）
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}
