// ==========================================
// 需求预测补货系统 - 批量需求预测流程
// ==========================================
// 主流程: ProductSelector → SeriesExtractor → ForecastModel → ForecastWriter
// ==========================================
// 红线:
// - 单产品失败只记日志并跳过，整批必定跑完
// - 只有“产品枚举”失败才让整批失败
// - 数据不足记 warn；拟合/写入失败记 error
// ==========================================

use crate::domain::forecast::ForecastPoint;
use crate::engine::error::ForecastError;
use crate::engine::forecast_model::{
    ForecastModel, ModelOptions, SeasonalTrendModel, DEFAULT_HORIZON_DAYS,
};
use crate::engine::{ForecastWriter, ProductSelector, SeriesExtractor};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 模型工厂：每个产品独立创建一个模型实例
pub type ModelFactory = Arc<dyn Fn(&ModelOptions) -> Box<dyn ForecastModel> + Send + Sync>;

// ==========================================
// PipelineSettings - 批量预测参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub horizon_days: usize,
    pub model: ModelOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            model: ModelOptions::default(),
        }
    }
}

// ==========================================
// ForecastBatchReport - 批量预测汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastBatchReport {
    pub products_total: usize,
    pub forecasted: usize,
    pub skipped_insufficient: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub failures: Vec<ProductFailure>,
}

/// 单产品失败记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFailure {
    pub product_id: i64,
    pub reason: String,
}

// ==========================================
// ForecastingPipeline - 批量预测编排器
// ==========================================
pub struct ForecastingPipeline {
    selector: Arc<ProductSelector>,
    extractor: Arc<SeriesExtractor>,
    writer: Arc<ForecastWriter>,
    settings: PipelineSettings,
    model_factory: ModelFactory,
}

impl ForecastingPipeline {
    /// 创建新的批量预测流程（默认使用 SeasonalTrendModel）
    pub fn new(
        selector: Arc<ProductSelector>,
        extractor: Arc<SeriesExtractor>,
        writer: Arc<ForecastWriter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            selector,
            extractor,
            writer,
            settings,
            model_factory: Arc::new(|options: &ModelOptions| {
                Box::new(SeasonalTrendModel::new(*options)) as Box<dyn ForecastModel>
            }),
        }
    }

    /// 替换模型工厂
    pub fn with_model_factory(mut self, factory: ModelFactory) -> Self {
        self.model_factory = factory;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// 执行批量预测（以本地日期为 today）
    pub fn run(&self) -> Result<ForecastBatchReport, ForecastError> {
        self.run_at(Local::now().date_naive())
    }

    /// 执行批量预测
    ///
    /// # 返回
    /// - Ok(report): 整批完成（可能包含被跳过/失败的产品）
    /// - Err(Enumeration): 产品枚举失败
    pub fn run_at(&self, today: NaiveDate) -> Result<ForecastBatchReport, ForecastError> {
        info!(%today, horizon_days = self.settings.horizon_days, "开始批量需求预测");

        let mut product_ids: Vec<i64> = self
            .selector
            .eligible_products()
            .map_err(ForecastError::Enumeration)?
            .into_iter()
            .collect();
        product_ids.sort_unstable();

        let mut report = ForecastBatchReport {
            products_total: product_ids.len(),
            ..ForecastBatchReport::default()
        };

        for product_id in product_ids {
            match self.process_product(product_id, today) {
                Ok(rows) => {
                    report.forecasted += 1;
                    report.rows_written += rows;
                }
                Err(e) if e.is_insufficient_history() => {
                    warn!(product_id, "跳过产品: {}", e);
                    report.skipped_insufficient += 1;
                }
                Err(e) => {
                    error!(product_id, "产品预测失败: {}", e);
                    report.failed += 1;
                    report.failures.push(ProductFailure {
                        product_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            products_total = report.products_total,
            forecasted = report.forecasted,
            skipped_insufficient = report.skipped_insufficient,
            failed = report.failed,
            rows_written = report.rows_written,
            "批量需求预测完成"
        );
        Ok(report)
    }

    /// 单产品: 提取 → 校验 → 拟合 → 预测 → 写入
    ///
    /// # 返回
    /// - Ok(rows): 写入行数
    /// - Err: 可恢复的单产品错误
    #[instrument(skip(self), level = "debug")]
    pub fn process_product(&self, product_id: i64, today: NaiveDate) -> Result<usize, ForecastError> {
        let series = self
            .extractor
            .extract(product_id)
            .map_err(|source| ForecastError::SeriesRead { product_id, source })?;

        let required = self.settings.model.min_history;
        if series.len() < required {
            return Err(ForecastError::InsufficientHistory {
                product_id,
                required,
                actual: series.len(),
            });
        }

        let mut model = (self.model_factory)(&self.settings.model);
        model
            .fit(&series)
            .map_err(|e| ForecastError::from_model(product_id, e))?;
        let curve: Vec<ForecastPoint> = model
            .predict(self.settings.horizon_days, today)
            .map_err(|e| ForecastError::from_model(product_id, e))?;

        let rows = self
            .writer
            .persist(product_id, &curve)
            .map_err(|source| ForecastError::Persistence { product_id, source })?;

        info!(product_id, rows, "产品预测已生成");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::movement::DemandObservation;
    use crate::engine::error::ModelError;
    use crate::repository::{ForecastRepository, MovementRepository};
    use chrono::Duration;
    use rusqlite::{params, Connection};
    use std::sync::Mutex;

    /// 需求量超过 1000 视为无法拟合
    struct PickyModel {
        inner: SeasonalTrendModel,
    }

    impl ForecastModel for PickyModel {
        fn fit(&mut self, series: &[DemandObservation]) -> Result<(), ModelError> {
            if series.iter().any(|o| o.quantity > 1000.0) {
                return Err(ModelError::FitFailed("不收敛".to_string()));
            }
            self.inner.fit(series)
        }

        fn predict(&self, horizon: usize, today: NaiveDate) -> Result<Vec<ForecastPoint>, ModelError> {
            self.inner.predict(horizon, today)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 20).unwrap()
    }

    fn setup() -> (Arc<Mutex<Connection>>, ForecastingPipeline, Arc<ForecastRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let movement_repo = Arc::new(MovementRepository::new(conn.clone()));
        let forecast_repo = Arc::new(ForecastRepository::new(conn.clone()));
        let pipeline = ForecastingPipeline::new(
            Arc::new(ProductSelector::new(movement_repo.clone())),
            Arc::new(SeriesExtractor::new(movement_repo)),
            Arc::new(ForecastWriter::new(forecast_repo.clone())),
            PipelineSettings::default(),
        )
        .with_model_factory(Arc::new(|options: &ModelOptions| {
            Box::new(PickyModel {
                inner: SeasonalTrendModel::new(*options),
            }) as Box<dyn ForecastModel>
        }));

        (conn, pipeline, forecast_repo)
    }

    /// 在 today 之前的 days 天里每天一张 DONE 出库单
    fn seed_history(conn: &Arc<Mutex<Connection>>, product_id: i64, days: i64, qty: f64) {
        let c = conn.lock().unwrap();
        for i in 0..days {
            let date = today() - Duration::days(days - i);
            c.execute(
                "INSERT INTO inventory_stockmove (type, status, scheduled_date) VALUES ('DELIVERY', 'DONE', ?1)",
                params![date.format("%Y-%m-%d").to_string()],
            )
            .unwrap();
            let move_id = c.last_insert_rowid();
            c.execute(
                "INSERT INTO inventory_stocktransfer (stockmove_id, product_id, quantity) VALUES (?1, ?2, ?3)",
                params![move_id, product_id, qty + (i % 3) as f64],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_failures_are_isolated_per_product() {
        let (conn, pipeline, forecast_repo) = setup();
        seed_history(&conn, 1, 10, 5.0); // 正常
        seed_history(&conn, 2, 3, 5.0); // 数据不足
        seed_history(&conn, 3, 10, 5000.0); // 拟合失败
        seed_history(&conn, 4, 8, 2.0); // 正常

        let report = pipeline.run_at(today()).unwrap();

        assert_eq!(report.products_total, 4);
        assert_eq!(report.forecasted, 2);
        assert_eq!(report.skipped_insufficient, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].product_id, 3);
        // 历史截止 today-1，30 天中 today 当天被排除
        assert_eq!(report.rows_written, 58);

        assert_eq!(forecast_repo.find_by_product(1).unwrap().len(), 29);
        assert!(forecast_repo.find_by_product(2).unwrap().is_empty());
        assert!(forecast_repo.find_by_product(3).unwrap().is_empty());
        assert_eq!(forecast_repo.find_by_product(4).unwrap().len(), 29);
    }

    #[test]
    fn test_persistence_failure_skips_only_that_product() {
        let (conn, pipeline, forecast_repo) = setup();
        seed_history(&conn, 1, 10, 5.0);
        seed_history(&conn, 2, 10, 5.0);
        seed_history(&conn, 3, 10, 5.0);
        {
            let c = conn.lock().unwrap();
            // 产品 2 在本次运行前已有一行旧预测
            c.execute(
                r#"
                INSERT INTO inventory_demand_forecast
                    (product_id, forecast_date, predicted_quantity, confidence_lower, confidence_upper, created_at)
                VALUES (2, ?1, 999.0, 900.0, 1100.0, '2026-04-01 00:00:00')
                "#,
                params![(today() + Duration::days(1)).format("%Y-%m-%d").to_string()],
            )
            .unwrap();
            c.execute_batch(
                r#"
                CREATE TRIGGER reject_product_2 BEFORE INSERT ON inventory_demand_forecast
                WHEN NEW.product_id = 2
                BEGIN
                    SELECT RAISE(ABORT, 'disk full');
                END;
                "#,
            )
            .unwrap();
        }

        let report = pipeline.run_at(today()).unwrap();

        assert_eq!(report.products_total, 3);
        assert_eq!(report.forecasted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].product_id, 2);
        assert!(report.failures[0].reason.contains("disk full"));
        assert_eq!(report.rows_written, 58);

        assert_eq!(forecast_repo.find_by_product(1).unwrap().len(), 29);
        assert_eq!(forecast_repo.find_by_product(3).unwrap().len(), 29);

        let untouched = forecast_repo.find_by_product(2).unwrap();
        assert_eq!(untouched.len(), 1);
        assert_eq!(untouched[0].predicted_quantity, 999.0);
        assert_eq!(untouched[0].confidence_lower, 900.0);
        assert_eq!(untouched[0].confidence_upper, 1100.0);
    }

    #[test]
    fn test_empty_store_completes() {
        let (_conn, pipeline, _repo) = setup();
        let report = pipeline.run_at(today()).unwrap();
        assert_eq!(report, ForecastBatchReport::default());
    }

    #[test]
    fn test_enumeration_failure_is_fatal() {
        let (conn, pipeline, _repo) = setup();
        conn.lock()
            .unwrap()
            .execute_batch("DROP TABLE inventory_stocktransfer;")
            .unwrap();

        let err = pipeline.run_at(today()).unwrap_err();
        assert!(matches!(err, ForecastError::Enumeration(_)));
        assert!(!err.is_recoverable());
    }
}
