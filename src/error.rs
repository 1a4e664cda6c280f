use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::response::ApiResponse;

/// 应用统一错误类型
///
/// 业务层面的否定结果（账号已存在、密码错误等）不走这里，
/// 而是以 `status: false` 的 200 响应返回。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token 错误: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("密码哈希错误: {0}")]
    PasswordHash(String),

    #[error("请求体不合法: {0}")]
    JsonBody(#[from] JsonRejection),

    #[error("数据库不可用: {0}")]
    ServiceUnavailable(sqlx::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Database(e) => {
                tracing::error!("数据库异常: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "服务器内部错误".to_string())
            }
            AppError::Token(e) => {
                tracing::error!("Token 签发异常: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "服务器内部错误".to_string())
            }
            AppError::PasswordHash(e) => {
                tracing::error!("密码哈希异常: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "服务器内部错误".to_string())
            }
            AppError::JsonBody(rejection) => {
                tracing::debug!("请求体解析失败: {}", rejection.body_text());
                (rejection.status(), self.to_string())
            }
            AppError::ServiceUnavailable(e) => {
                tracing::error!("Health check failed: database error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "数据库不可用".to_string())
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
        };

        (status, Json(ApiResponse::<()>::fail(msg))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_faults_map_to_500() {
        let res = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = AppError::PasswordHash("bad salt".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unavailable_database_maps_to_503() {
        let res = AppError::ServiceUnavailable(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn auth_errors_keep_their_status() {
        let res = AppError::Unauthorized("请先登录".into()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = AppError::Forbidden("权限不足".into()).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
