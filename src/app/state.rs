// ==========================================
// 需求预测补货系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约定: 所有仓储共享同一个数据库连接（显式注入，不使用全局单例）
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{AlertApi, ForecastApi, ProcurementApi};
use crate::config::{ConfigManager, ForecastConfigReader};
use crate::engine::AlertEngine;
use crate::repository::{ForecastRepository, MovementRepository, StockRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径（内存库/注入连接时为空）
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 需求预测API
    pub forecast_api: Arc<ForecastApi>,

    /// 缺货告警API
    pub alert_api: Arc<AlertApi>,

    /// 采购补货API
    pub procurement_api: Arc<ProcurementApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let mut state = Self::from_connection(Arc::new(Mutex::new(conn)))?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 从已有连接创建AppState（建表幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::ensure_schema(&guard).map_err(|e| format!("数据库初始化失败: {}", e))?;
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let movement_repo = Arc::new(MovementRepository::new(conn.clone()));
        let forecast_repo = Arc::new(ForecastRepository::new(conn.clone()));
        let stock_repo = Arc::new(StockRepository::new(conn.clone()));

        // ==========================================
        // 初始化配置与Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn ForecastConfigReader> = config_manager.clone();

        let alert_engine = Arc::new(AlertEngine::new(stock_repo));

        // ==========================================
        // 初始化API层
        // ==========================================
        let forecast_api = Arc::new(ForecastApi::new(
            movement_repo.clone(),
            forecast_repo,
            config_reader.clone(),
        ));
        let alert_api = Arc::new(AlertApi::new(alert_engine, config_reader.clone()));
        let procurement_api = Arc::new(ProcurementApi::new(movement_repo, config_reader));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: String::new(),
            config_manager,
            forecast_api,
            alert_api,
            procurement_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 DEMAND_FORECAST_DB_PATH
/// 2. 用户数据目录 demand-forecast/demand_forecast.db（debug 构建使用 demand-forecast-dev）
/// 3. 当前目录 ./demand_forecast.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("DEMAND_FORECAST_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./demand_forecast.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("demand-forecast-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("demand-forecast");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("demand_forecast.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_from_in_memory_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        assert!(state.db_path.is_empty());
        assert!(state
            .forecast_api
            .get_product_forecast(1)
            .unwrap()
            .is_empty());
    }
}
