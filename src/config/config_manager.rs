// ==========================================
// 需求预测补货系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 缺失 → 默认值；格式错误 → 配置错误
// ==========================================

use crate::config::forecast_config_trait::{ConfigResult, ForecastConfigReader};
use crate::domain::types::{BoundClamp, MAX_HORIZON_DAYS};
use crate::engine::forecast_model::{
    ModelOptions, SeasonalityConfig, DEFAULT_HORIZON_DAYS, DEFAULT_INTERVAL_WIDTH,
    DEFAULT_MIN_HISTORY,
};
use crate::engine::pipeline::PipelineSettings;
use crate::engine::reorder::ReorderSettings;
use crate::engine::DEFAULT_ALERT_HORIZON_DAYS;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式，按 key 排序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置值，缺失时返回默认值
    fn get_parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误");
                format!("配置项 {} 格式错误 ({}): {}", key, raw, e).into()
            }),
        }
    }

    /// 读取并解析配置值，要求落在 [min, max] 内
    fn get_bounded_or<T>(&self, key: &str, default: T, min: T, max: T) -> ConfigResult<T>
    where
        T: FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let value = self.get_parsed_or(key, default)?;
        if value < min || value > max {
            tracing::warn!(config_key = key, %value, "配置超出范围");
            return Err(format!("配置项 {} 必须在 [{}, {}] 之间, 实际 {}", key, min, max, value).into());
        }
        Ok(value)
    }

    fn get_string_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

// ==========================================
// ForecastConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ForecastConfigReader for ConfigManager {
    // ===== 批量预测 =====

    async fn get_forecast_horizon_days(&self) -> ConfigResult<usize> {
        self.get_bounded_or(
            config_keys::FORECAST_HORIZON_DAYS,
            DEFAULT_HORIZON_DAYS,
            1,
            MAX_HORIZON_DAYS as usize,
        )
    }

    async fn get_forecast_min_history(&self) -> ConfigResult<usize> {
        let value = self.get_parsed_or(config_keys::FORECAST_MIN_HISTORY, DEFAULT_MIN_HISTORY)?;
        if value < 2 {
            return Err(format!("{} 不能小于 2, 实际 {}", config_keys::FORECAST_MIN_HISTORY, value).into());
        }
        Ok(value)
    }

    async fn get_seasonality_flags(&self) -> ConfigResult<(bool, bool, bool)> {
        let defaults = SeasonalityConfig::default();
        Ok((
            self.get_parsed_or(config_keys::FORECAST_WEEKLY_SEASONALITY, defaults.weekly_seasonality)?,
            self.get_parsed_or(config_keys::FORECAST_YEARLY_SEASONALITY, defaults.yearly_seasonality)?,
            self.get_parsed_or(config_keys::FORECAST_DAILY_SEASONALITY, defaults.daily_seasonality)?,
        ))
    }

    async fn get_interval_width(&self) -> ConfigResult<f64> {
        let value = self.get_parsed_or(config_keys::FORECAST_INTERVAL_WIDTH, DEFAULT_INTERVAL_WIDTH)?;
        if !(value > 0.0 && value < 1.0) {
            return Err(format!("{} 必须在 (0, 1) 之间, 实际 {}", config_keys::FORECAST_INTERVAL_WIDTH, value).into());
        }
        Ok(value)
    }

    async fn get_bound_clamp(&self) -> ConfigResult<BoundClamp> {
        match self.get_global_config_value(config_keys::FORECAST_BOUND_CLAMP)? {
            None => Ok(BoundClamp::default()),
            Some(raw) => BoundClamp::from_db_str(raw.trim())
                .ok_or_else(|| format!("未知截断规则: {}", raw).into()),
        }
    }

    // ===== 缺货告警 =====

    async fn get_alert_horizon_days(&self) -> ConfigResult<i64> {
        self.get_bounded_or(
            config_keys::ALERT_HORIZON_DAYS,
            DEFAULT_ALERT_HORIZON_DAYS,
            0,
            MAX_HORIZON_DAYS,
        )
    }

    // ===== 补货 =====

    async fn get_reorder_settings(&self) -> ConfigResult<ReorderSettings> {
        let defaults = ReorderSettings::default();
        Ok(ReorderSettings {
            lead_days: self.get_bounded_or(
                config_keys::REORDER_LEAD_DAYS,
                defaults.lead_days,
                0,
                MAX_HORIZON_DAYS,
            )?,
            vendor_placeholder: self
                .get_string_or(config_keys::REORDER_VENDOR_PLACEHOLDER, &defaults.vendor_placeholder)?,
            reference_prefix: self
                .get_string_or(config_keys::REORDER_REFERENCE_PREFIX, &defaults.reference_prefix)?,
            max_attempts: self.get_parsed_or(config_keys::REORDER_MAX_ATTEMPTS, defaults.max_attempts)?,
            dest_location_id: self
                .get_parsed_or(config_keys::REORDER_DEST_LOCATION_ID, defaults.dest_location_id)?,
        })
    }

    async fn get_pipeline_settings(&self) -> ConfigResult<PipelineSettings> {
        let (horizon_days, min_history, flags, interval_width, bound_clamp) = futures::try_join!(
            self.get_forecast_horizon_days(),
            self.get_forecast_min_history(),
            self.get_seasonality_flags(),
            self.get_interval_width(),
            self.get_bound_clamp(),
        )?;
        let (weekly_seasonality, yearly_seasonality, daily_seasonality) = flags;

        Ok(PipelineSettings {
            horizon_days,
            model: ModelOptions {
                seasonality: SeasonalityConfig {
                    weekly_seasonality,
                    yearly_seasonality,
                    daily_seasonality,
                },
                min_history,
                interval_width,
                bound_clamp,
            },
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量预测
    pub const FORECAST_HORIZON_DAYS: &str = "forecast_horizon_days";
    pub const FORECAST_MIN_HISTORY: &str = "forecast_min_history";
    pub const FORECAST_WEEKLY_SEASONALITY: &str = "forecast_weekly_seasonality";
    pub const FORECAST_YEARLY_SEASONALITY: &str = "forecast_yearly_seasonality";
    pub const FORECAST_DAILY_SEASONALITY: &str = "forecast_daily_seasonality";
    pub const FORECAST_INTERVAL_WIDTH: &str = "forecast_interval_width";
    pub const FORECAST_BOUND_CLAMP: &str = "forecast_bound_clamp";

    // 缺货告警
    pub const ALERT_HORIZON_DAYS: &str = "alert_horizon_days";

    // 补货
    pub const REORDER_LEAD_DAYS: &str = "reorder_lead_days";
    pub const REORDER_VENDOR_PLACEHOLDER: &str = "reorder_vendor_placeholder";
    pub const REORDER_REFERENCE_PREFIX: &str = "reorder_reference_prefix";
    pub const REORDER_MAX_ATTEMPTS: &str = "reorder_max_attempts";
    pub const REORDER_DEST_LOCATION_ID: &str = "reorder_dest_location_id";
}
