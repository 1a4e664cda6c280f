use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mall_user_backend::{build_router, config::Config, services::user_service, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化环境变量、日志与配置
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "商城用户服务启动中... 当前级别: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    let config = Config::from_env()?;

    // 2. 初始化数据库连接池并执行迁移
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to create database connection pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("数据库迁移失败")?;

    // 3. 确保存在管理员账号
    if user_service::ensure_default_admin(
        &pool,
        &config.admin_username,
        &config.admin_password,
        config.admin_role_id,
    )
    .await?
    {
        tracing::info!("未检测到管理员账号，已创建默认账号: {}", config.admin_username);
    }

    // 4. 组合所有组件并启动
    let addr = config.bind_address();
    let state = Arc::new(AppState { db: pool, config });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听地址 {}", addr))?;
    tracing::info!("🚀 Server deployed successfully at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
