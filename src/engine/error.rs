// ==========================================
// 需求预测补货系统 - 引擎层错误类型
// ==========================================
// 单产品失败是“值”而不是异常:
// - 可恢复(跳过该产品): InsufficientHistory / ModelFit / Persistence / SeriesRead
// - 致命(整批失败): Enumeration
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

// ==========================================
// ModelError - 预测模型错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("历史数据不足: 需要至少 {required} 条, 实际 {actual} 条")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("模型拟合失败: {0}")]
    FitFailed(String),

    #[error("模型尚未拟合")]
    NotFitted,

    #[error("预测天数超出范围: {horizon} (上限 {max})")]
    HorizonOutOfRange { horizon: usize, max: usize },
}

// ==========================================
// ForecastError - 单产品预测流程错误
// ==========================================
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("产品 {product_id} 历史数据不足 ({actual} < {required})")]
    InsufficientHistory {
        product_id: i64,
        required: usize,
        actual: usize,
    },

    #[error("产品 {product_id} 模型拟合失败: {reason}")]
    ModelFit { product_id: i64, reason: String },

    #[error("产品 {product_id} 需求序列读取失败: {source}")]
    SeriesRead {
        product_id: i64,
        #[source]
        source: RepositoryError,
    },

    #[error("产品 {product_id} 预测写入失败: {source}")]
    Persistence {
        product_id: i64,
        #[source]
        source: RepositoryError,
    },

    #[error("可预测产品枚举失败: {0}")]
    Enumeration(#[source] RepositoryError),
}

impl ForecastError {
    /// 是否可恢复（跳过当前产品，整批继续）
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ForecastError::Enumeration(_))
    }

    /// 是否为“数据不足”类跳过（只记 warn）
    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, ForecastError::InsufficientHistory { .. })
    }

    /// 由模型错误转换（附带产品ID）
    pub fn from_model(product_id: i64, err: ModelError) -> Self {
        match err {
            ModelError::InsufficientHistory { required, actual } => {
                ForecastError::InsufficientHistory {
                    product_id,
                    required,
                    actual,
                }
            }
            other => ForecastError::ModelFit {
                product_id,
                reason: other.to_string(),
            },
        }
    }
}

// ==========================================
// ReorderError - 补货单创建错误
// ==========================================
#[derive(Error, Debug)]
pub enum ReorderError {
    #[error("补货参数无效: {0}")]
    InvalidInput(String),

    #[error("补货单写入失败: {0}")]
    Transaction(#[source] RepositoryError),

    #[error("补货单号连续冲突 {attempts} 次")]
    ReferenceExhausted { attempts: u32 },
}
