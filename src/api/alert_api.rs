// ==========================================
// 需求预测补货系统 - 缺货告警 API
// ==========================================
// 职责: 库存 vs 预测需求对账，返回缺货清单
// ==========================================

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ForecastConfigReader;
use crate::domain::alert::ShortageAlert;
use crate::domain::types::{AlertLevel, MAX_HORIZON_DAYS};
use crate::engine::AlertEngine;

// ==========================================
// DTO
// ==========================================

/// 单产品缺货告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageAlertDto {
    pub product_id: i64,
    pub product_name: String,
    pub sku: Option<String>,
    pub current_stock: f64,
    #[serde(rename = "predicted_demand_7d")]
    pub predicted_demand: f64,
    pub shortage_estimation: f64,
    pub alert_level: AlertLevel,
}

impl From<ShortageAlert> for ShortageAlertDto {
    fn from(alert: ShortageAlert) -> Self {
        Self {
            product_id: alert.product_id,
            product_name: alert.product_name,
            sku: alert.sku,
            current_stock: alert.current_stock,
            predicted_demand: alert.predicted_demand,
            shortage_estimation: alert.shortage_estimation,
            alert_level: alert.alert_level,
        }
    }
}

/// 缺货告警响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortageAlertsResponse {
    pub count: usize,
    pub horizon_days: i64,
    pub alerts: Vec<ShortageAlertDto>,
}

// ==========================================
// AlertApi - 缺货告警 API
// ==========================================
pub struct AlertApi {
    alert_engine: Arc<AlertEngine>,
    config: Arc<dyn ForecastConfigReader>,
}

impl AlertApi {
    pub fn new(alert_engine: Arc<AlertEngine>, config: Arc<dyn ForecastConfigReader>) -> Self {
        Self {
            alert_engine,
            config,
        }
    }

    /// 查询缺货告警（以本地日期为 today）
    pub async fn get_shortage_alerts(
        &self,
        horizon_days: Option<i64>,
    ) -> ApiResult<ShortageAlertsResponse> {
        self.get_shortage_alerts_at(Local::now().date_naive(), horizon_days)
            .await
    }

    /// 查询缺货告警
    ///
    /// # 参数
    /// - horizon_days: 告警窗口（天），None 时读取配置 alert_horizon_days
    ///
    /// # 返回
    /// - Ok(ShortageAlertsResponse): 缺货清单（顺序不作保证）
    /// - Err(ApiError::InvalidInput): 窗口为负数或超过 MAX_HORIZON_DAYS
    pub async fn get_shortage_alerts_at(
        &self,
        today: NaiveDate,
        horizon_days: Option<i64>,
    ) -> ApiResult<ShortageAlertsResponse> {
        let horizon_days = match horizon_days {
            Some(days) if days < 0 => {
                return Err(ApiError::InvalidInput(format!(
                    "告警窗口不能为负数: {}",
                    days
                )));
            }
            Some(days) if days > MAX_HORIZON_DAYS => {
                return Err(ApiError::InvalidInput(format!(
                    "告警窗口不能超过 {} 天: {}",
                    MAX_HORIZON_DAYS, days
                )));
            }
            Some(days) => days,
            None => self
                .config
                .get_alert_horizon_days()
                .await
                .map_err(|e| ApiError::ConfigError(e.to_string()))?,
        };

        let alerts = self.alert_engine.shortages_at(today, horizon_days)?;

        Ok(ShortageAlertsResponse {
            count: alerts.len(),
            horizon_days,
            alerts: alerts.into_iter().map(ShortageAlertDto::from).collect(),
        })
    }
}
