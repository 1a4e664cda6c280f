use axum::{extract::State, Extension, Json};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::response::ApiResponse;
use crate::models::user::{
    AuthData, Claims, LoginPayload, NewUser, RegisterPayload, UpdateInfoPayload, UserProfile,
};
use crate::services::{auth_service, user_service};
use crate::AppState;

const MSG_ACCOUNT_EXISTS: &str = "账号已经存在！";
const MSG_BAD_CREDENTIALS: &str = "账号或者密码错误！";

/// 用户注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterPayload>, AppError>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    tracing::info!(">>> 用户注册: username={}", payload.username);

    // 1. 查询账户是否存在
    if user_service::find_id_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Ok(Json(ApiResponse::fail(MSG_ACCOUNT_EXISTS)));
    }

    // 2. 事务写入用户与默认角色
    let password_hash = auth_service::hash_password(&payload.password)?;
    let new_user = NewUser {
        username: &payload.username,
        password_hash: &password_hash,
        nickname: payload.nickname.as_deref(),
        sex: payload.sex.as_deref(),
        tel: payload.tel.as_deref(),
    };
    let role = state.config.default_role_id;
    let Some(id) = user_service::create_user_with_role(&state.db, &new_user, role).await? else {
        return Ok(Json(ApiResponse::fail(MSG_ACCOUNT_EXISTS)));
    };

    // 3. 生成 token
    let token = auth_service::issue_token(
        id,
        &payload.username,
        role,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    tracing::info!("<<< 注册成功: ID={}", id);
    Ok(Json(ApiResponse::ok("注册成功！", AuthData { token, id, role })))
}

/// 用户登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginPayload>, AppError>,
) -> AppResult<Json<ApiResponse<AuthData>>> {
    tracing::info!(">>> 用户登录: username={}", payload.username);

    let Some(user) = user_service::find_credential(&state.db, &payload.username).await? else {
        return Ok(Json(ApiResponse::fail(MSG_BAD_CREDENTIALS)));
    };

    if !auth_service::verify_password(&payload.password, &user.password_hash) {
        tracing::info!("登录失败，密码错误: username={}", payload.username);
        return Ok(Json(ApiResponse::fail(MSG_BAD_CREDENTIALS)));
    }

    // 更新登录次数；用户恰好在此期间被删除时按登录失败处理
    if !user_service::increment_login_count(&state.db, user.id).await? {
        return Ok(Json(ApiResponse::fail(MSG_BAD_CREDENTIALS)));
    }

    let role = user.role.unwrap_or_else(|| {
        tracing::warn!("用户 {} 缺少角色关联，按默认角色签发", user.id);
        state.config.default_role_id
    });
    let token = auth_service::issue_token(
        user.id,
        &user.username,
        role,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    tracing::info!("<<< 登录成功: ID={}", user.id);
    Ok(Json(ApiResponse::ok(
        "登录成功！",
        AuthData { token, id: user.id, role },
    )))
}

/// 获取用户列表（管理员）
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<UserProfile>>>> {
    tracing::info!(">>> 获取用户列表");
    let users = user_service::list_profiles(&state.db).await?;

    // 空表返回失败而不是空数组
    if users.is_empty() {
        return Ok(Json(ApiResponse::fail("获取失败！")));
    }
    tracing::info!("<<< 用户列表获取成功: 共 {} 条", users.len());
    Ok(Json(ApiResponse::ok("获取成功！", users)))
}

/// 获取个人资料
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    tracing::info!(">>> 获取个人资料: ID={}", claims.id);
    match user_service::find_profile(&state.db, claims.id).await? {
        Some(user) => {
            tracing::info!("<<< 个人资料获取成功: ID={}", claims.id);
            Ok(Json(ApiResponse::ok("获取成功！", user)))
        }
        None => Ok(Json(ApiResponse::fail("获取失败！"))),
    }
}

/// 更新个人资料
pub async fn update_info(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateInfoPayload>, AppError>,
) -> AppResult<Json<ApiResponse<()>>> {
    tracing::info!(">>> 更新个人资料: ID={}", claims.id);

    // 只有管理员可以修改角色，普通用户提交的 role 被忽略
    let role = match payload.role {
        Some(role) if claims.role == state.config.admin_role_id => Some(role),
        Some(role) => {
            tracing::warn!("用户 {} 无权将角色修改为 {}，已忽略", claims.id, role);
            None
        }
        None => None,
    };

    user_service::update_profile(&state.db, claims.id, &payload, role).await?;
    tracing::info!("<<< 个人资料更新成功: ID={}", claims.id);
    Ok(Json(ApiResponse::ok_msg("修改成功！")))
}
