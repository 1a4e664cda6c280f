use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::auth_service;
use crate::models::user::{NewUser, UpdateInfoPayload, UserCredential, UserProfile};

const PROFILE_COLUMNS: &str = r#"
    SELECT u.id, u.username, u.nickname, u.sex, u.avatar, u.tel, r.role_name, r.id AS role
    FROM users u
    LEFT JOIN user_role ur ON u.id = ur.user_id
    LEFT JOIN role r ON r.id = ur.role_id
"#;

pub async fn find_id_by_username(pool: &PgPool, username: &str) -> AppResult<Option<i32>> {
    let id = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// 在同一事务中写入用户及其角色关联，返回新用户 id。
///
/// 用户名唯一约束冲突（并发注册同名账号）时返回 `None`；
/// 其它错误导致事务被丢弃，即自动回滚。
pub async fn create_user_with_role(
    pool: &PgPool,
    user: &NewUser<'_>,
    role_id: i32,
) -> AppResult<Option<i32>> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO users (username, password_hash, nickname, sex, tel, create_time)
        VALUES ($1, $2, $3, $4, $5, CURRENT_TIMESTAMP)
        RETURNING id
        "#,
    )
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.nickname)
    .bind(user.sex)
    .bind(user.tel)
    .fetch_one(&mut *tx)
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::warn!("并发注册冲突，用户名已被占用: {}", user.username);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    sqlx::query("INSERT INTO user_role (user_id, role_id) VALUES ($1, $2)")
        .bind(id)
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(id))
}

pub async fn find_credential(pool: &PgPool, username: &str) -> AppResult<Option<UserCredential>> {
    let credential = sqlx::query_as::<_, UserCredential>(
        r#"
        SELECT u.id, u.username, u.password_hash, r.id AS role
        FROM users u
        LEFT JOIN user_role ur ON u.id = ur.user_id
        LEFT JOIN role r ON r.id = ur.role_id
        WHERE u.username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(credential)
}

/// 登录次数 +1，返回是否命中了记录
pub async fn increment_login_count(pool: &PgPool, id: i32) -> AppResult<bool> {
    let res = sqlx::query("UPDATE users SET login_count = login_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn list_profiles(pool: &PgPool) -> AppResult<Vec<UserProfile>> {
    let sql = format!("{} ORDER BY u.id", PROFILE_COLUMNS);
    let users = sqlx::query_as::<_, UserProfile>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn find_profile(pool: &PgPool, id: i32) -> AppResult<Option<UserProfile>> {
    let sql = format!("{} WHERE u.id = $1", PROFILE_COLUMNS);
    let user = sqlx::query_as::<_, UserProfile>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// 更新个人资料；`role` 为 `Some` 时同时更新角色关联。
/// 不校验受影响行数，id 不存在时同样视为成功。
pub async fn update_profile(
    pool: &PgPool,
    id: i32,
    info: &UpdateInfoPayload,
    role: Option<i32>,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET nickname = $1, sex = $2, avatar = $3, tel = $4 WHERE id = $5")
        .bind(&info.nickname)
        .bind(&info.sex)
        .bind(&info.avatar)
        .bind(&info.tel)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(role_id) = role {
        sqlx::query("UPDATE user_role SET role_id = $1 WHERE user_id = $2")
            .bind(role_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// 启动时确保存在管理员账号
pub async fn ensure_default_admin(
    pool: &PgPool,
    username: &str,
    password: &str,
    admin_role_id: i32,
) -> AppResult<bool> {
    if find_id_by_username(pool, username).await?.is_some() {
        return Ok(false);
    }

    let password_hash = auth_service::hash_password(password)?;
    let admin = NewUser {
        username,
        password_hash: &password_hash,
        nickname: Some(username),
        sex: None,
        tel: None,
    };
    Ok(create_user_with_role(pool, &admin, admin_role_id).await?.is_some())
}
