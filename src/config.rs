use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

/// 服务运行配置，启动时从环境变量（含 .env）加载
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// Token 有效期（小时）
    pub token_ttl_hours: i64,
    /// 注册时默认分配的角色
    pub default_role_id: i32,
    /// 允许查看用户列表、修改角色的角色
    pub admin_role_id: i32,
    pub admin_username: String,
    pub admin_password: String,
}

const DEFAULT_JWT_SECRET: &str = "secret";
/// Token 有效期上限：一年
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 按给定的查找函数解析配置，便于脱离进程环境测试
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("未设置 JWT_SECRET，使用默认密钥，请勿用于生产环境");
            DEFAULT_JWT_SECRET.to_string()
        });

        let token_ttl_hours: i64 = parse_or(&lookup, "TOKEN_TTL_HOURS", 2)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "TOKEN_TTL_HOURS 必须在 1..={} 之间: {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            jwt_secret,
            token_ttl_hours,
            default_role_id: parse_or(&lookup, "DEFAULT_ROLE_ID", 3)?,
            admin_role_id: parse_or(&lookup, "ADMIN_ROLE_ID", 1)?,
            admin_username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            admin_password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| "admin".to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} 不是合法的取值: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_set() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db/mall")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl_hours, 2);
        assert_eq!(config.default_role_id, 3);
        assert_eq!(config.admin_role_id, 1);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/mall"),
            ("PORT", "8088"),
            ("JWT_SECRET", "s3cr3t"),
            ("TOKEN_TTL_HOURS", "12"),
            ("DEFAULT_ROLE_ID", "2"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert_eq!(config.token_ttl_hours, 12);
        assert_eq!(config.default_role_id, 2);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn token_ttl_outside_range_is_an_error() {
        for ttl in ["0", "-1", "8761", "9223372036854775807"] {
            let result = Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db/mall"),
                ("TOKEN_TTL_HOURS", ttl),
            ]));
            assert!(result.is_err(), "TOKEN_TTL_HOURS={} should be rejected", ttl);
        }

        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/mall"),
            ("TOKEN_TTL_HOURS", "8760"),
        ]))
        .unwrap();
        assert_eq!(config.token_ttl_hours, 8760);
    }

    #[test]
    fn invalid_number_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/mall"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }
}
