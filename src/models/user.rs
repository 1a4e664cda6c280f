use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// 登录校验所需的用户凭据（含角色）
#[derive(Debug, FromRow)]
pub struct UserCredential {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: Option<i32>,
}

/// 对外展示的用户资料（users ⨝ user_role ⨝ role）
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub nickname: Option<String>,
    pub sex: Option<String>,
    pub avatar: Option<String>,
    pub tel: Option<String>,
    pub role_name: Option<String>,
    pub role: Option<i32>,
}

/// 新用户注册信息，密码此时已是哈希值
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub nickname: Option<&'a str>,
    pub sex: Option<&'a str>,
    pub tel: Option<&'a str>,
}

/// Token 载荷，`exp` 为 Unix 秒
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub role: i32,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub nickname: Option<String>,
    pub sex: Option<String>,
    pub tel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfoPayload {
    pub nickname: Option<String>,
    pub sex: Option<String>,
    pub avatar: Option<String>,
    pub tel: Option<String>,
    /// 前端可能以数字或数字字符串提交
    #[serde(default, deserialize_with = "role_id_from_number_or_str")]
    pub role: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleIdRepr {
    Num(i32),
    Text(String),
}

fn role_id_from_number_or_str<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RoleIdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RoleIdRepr::Num(id)) => Ok(Some(id)),
        Some(RoleIdRepr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RoleIdRepr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("role 不是合法的角色 id: {}", text))),
    }
}

/// 注册 / 登录成功后返回的数据
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthData {
    pub token: String,
    pub id: i32,
    pub role: i32,
}
