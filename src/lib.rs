use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use config::Config;
use error::{AppError, AppResult};
use models::response::ApiResponse;

// 定义全局状态
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// 健康检查：执行 `SELECT 1` 确认连接池可用
async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse<Value>>> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(AppError::ServiceUnavailable)?;

    Ok(Json(ApiResponse::ok("服务正常", json!({ "database": "connected" }))))
}

/// 组装全部路由
pub fn build_router(state: Arc<AppState>) -> Router {
    use handlers::user_handler;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 无需登录
    let open_routes = Router::new()
        .route("/register", post(user_handler::register))
        .route("/login", post(user_handler::login));

    // 需要登录
    let user_routes = Router::new()
        .route(
            "/info",
            get(user_handler::get_info).put(user_handler::update_info),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    // 需要管理员角色；后加的 layer 在外层，先执行登录校验
    let admin_routes = Router::new()
        .route("/list", get(user_handler::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest(
            "/api/user",
            open_routes.merge(user_routes).merge(admin_routes),
        )
        .nest("/api/public", public_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
