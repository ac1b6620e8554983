// ==========================================
// 需求预测补货系统 - 命令行入口
// ==========================================
// 用法:
//   demand-forecast forecast                       批量预测
//   demand-forecast product <product_id>           查询单产品未来预测
//   demand-forecast alerts [horizon_days]          缺货告警
//   demand-forecast reorder <product_id> <qty> [vendor]
//   demand-forecast order <reference>              查询补货草稿单
// 输出: stdout 打印 JSON；日志写 stderr
// ==========================================

use std::process::ExitCode;

use demand_forecast::api::{ApiError, AutoReorderRequest};
use demand_forecast::app::{get_default_db_path, AppState};
use demand_forecast::logging;
use serde::Serialize;
use serde_json::json;

const USAGE: &str = "用法: demand-forecast <forecast | product <id> | alerts [days] | reorder <id> <qty> [vendor] | order <reference>>";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    let db_path = get_default_db_path();
    tracing::info!(
        version = demand_forecast::VERSION,
        db_path = %db_path,
        "{} 启动",
        demand_forecast::APP_NAME
    );

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            print_json(&json!({"status": "error", "message": e}));
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        "forecast" => to_value(state.forecast_api.run_forecast_batch().await),
        "product" => match parse_arg::<i64>(&args, 1, "product_id") {
            Ok(product_id) => to_value(state.forecast_api.get_product_forecast(product_id)),
            Err(e) => Err(e),
        },
        "alerts" => match parse_optional_arg::<i64>(&args, 1, "horizon_days") {
            Ok(horizon_days) => to_value(state.alert_api.get_shortage_alerts(horizon_days).await),
            Err(e) => Err(e),
        },
        "reorder" => {
            let request = parse_optional_arg::<i64>(&args, 1, "product_id").and_then(|product_id| {
                Ok(AutoReorderRequest {
                    product_id,
                    quantity: parse_optional_arg::<f64>(&args, 2, "quantity")?,
                    vendor: args.get(3).cloned(),
                })
            });
            match request {
                Ok(request) => to_value(state.procurement_api.create_reorder(request).await),
                Err(e) => Err(e),
            }
        }
        "order" => match args.get(1) {
            Some(reference) => to_value(state.procurement_api.get_reorder(reference)),
            None => Err(ApiError::InvalidInput("缺少 reference".to_string())),
        },
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(value) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(status_code = e.status_code(), "命令执行失败: {}", e);
            print_json(&json!({
                "status": "error",
                "code": e.status_code(),
                "message": e.to_string(),
            }));
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn to_value<T: Serialize>(result: Result<T, ApiError>) -> Result<serde_json::Value, ApiError> {
    let value = result?;
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(format!("JSON序列化失败: {}", e)))
}

fn parse_optional_arg<T: std::str::FromStr>(
    args: &[String],
    index: usize,
    name: &str,
) -> Result<Option<T>, ApiError> {
    match args.get(index) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::InvalidInput(format!("{} 格式错误: {}", name, raw))),
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Result<T, ApiError> {
    parse_optional_arg(args, index, name)?
        .ok_or_else(|| ApiError::InvalidInput(format!("缺少 {}", name)))
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("JSON序列化失败: {}", e),
    }
}
