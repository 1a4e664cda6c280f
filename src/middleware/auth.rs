use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::user::Claims;
use crate::services::auth_service;
use crate::AppState;

/// 登录守卫：校验 `Authorization: Bearer <token>`，
/// 通过后把 [`Claims`] 放入请求扩展，供后续 handler 读取
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::Unauthorized("请先登录！".into()));
    };

    match auth_service::verify_token(bearer.token(), &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::debug!("Token 校验失败: {}", e);
            Err(AppError::Unauthorized("登录已过期或 Token 无效！".into()))
        }
    }
}

/// 管理员权限守卫，必须叠加在 [`authenticate`] 之内
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let is_admin = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.role == state.config.admin_role_id);

    match is_admin {
        Some(true) => Ok(next.run(req).await),
        Some(false) => Err(AppError::Forbidden("权限不足！".into())),
        None => Err(AppError::Unauthorized("请先登录！".into())),
    }
}
