// ==========================================
// 需求预测补货系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// 约定: InvalidInput 为客户端错误(400)，NotFound 为 404，其余为服务端错误(500)
// ==========================================

use crate::engine::error::{ForecastError, ReorderError};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 客户端错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 业务流程错误
    // ==========================================
    #[error("批量预测失败: {0}")]
    ForecastBatchFailed(String),

    #[error("补货单创建失败: {0}")]
    ReorderFailed(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 是否为客户端输入错误
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::InvalidInput(_) | ApiError::NotFound(_))
    }

    /// 对外传输层使用的状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 Engine 错误转换
// ==========================================
impl From<ReorderError> for ApiError {
    fn from(err: ReorderError) -> Self {
        match err {
            ReorderError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            ReorderError::Transaction(source) => {
                ApiError::ReorderFailed(format!("事务已回滚: {}", source))
            }
            other @ ReorderError::ReferenceExhausted { .. } => {
                ApiError::ReorderFailed(other.to_string())
            }
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        ApiError::ForecastBatchFailed(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::ForeignKeyViolation("FOREIGN KEY constraint failed".to_string());
        let api_err: ApiError = repo_err.into();
        match &api_err {
            ApiError::DatabaseError(msg) => assert!(msg.contains("FOREIGN KEY")),
            _ => panic!("Expected DatabaseError"),
        }
        assert_eq!(api_err.status_code(), 500);

        let not_found = ApiError::NotFound("补货单(reference=PO-AUTO-X)不存在".to_string());
        assert!(not_found.is_client_error());
        assert_eq!(not_found.status_code(), 404);

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
        assert!(!api_err.is_client_error());
    }

    #[test]
    fn test_reorder_error_classification() {
        let invalid: ApiError = ReorderError::InvalidInput("缺少 product_id".to_string()).into();
        assert!(invalid.is_client_error());
        assert_eq!(invalid.status_code(), 400);

        let failed: ApiError = ReorderError::Transaction(RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed".to_string(),
        ))
        .into();
        assert!(matches!(failed, ApiError::ReorderFailed(_)));
        assert_eq!(failed.status_code(), 500);

        let exhausted: ApiError = ReorderError::ReferenceExhausted { attempts: 3 }.into();
        assert_eq!(exhausted.status_code(), 500);
    }
}
