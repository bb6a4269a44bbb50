use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use coinbase::{DEFAULT_CONCURRENCY, DEFAULT_ORDERS_URL};

use crate::mirror::DEFAULT_MIRROR_CONCURRENCY;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// 대시보드 온도계 표시용 설정
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub unit_symbol: String,
    /// 목표 모금액 (BTC)
    pub target: f64,
    /// 모금 마감일
    pub deadline: Option<NaiveDate>,
}

impl DashboardConfig {
    /// 마감일까지 남은 일수 (지났거나 없으면 0)
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        self.deadline
            .map(|deadline| (deadline - today).num_days().max(0))
            .unwrap_or(0)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            unit_symbol: "BTC".to_string(),
            target: 10.0,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub orders_url: String,
    /// 지정하지 않으면 db_path의 SQLite 파일 사용
    pub database_url: Option<String>,
    pub db_path: String,
    pub port: u16,
    pub refresh_interval: Duration,
    pub fetch_concurrency: usize,
    pub mirror_concurrency: usize,
    pub request_timeout: Duration,
    pub dashboard: DashboardConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 환경 변수 조회 함수를 받아 설정을 구성 (테스트에서는 HashMap 사용)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("COINBASE_API_KEY").ok_or(ConfigError::Missing("COINBASE_API_KEY"))?;

        let refresh_secs: u64 = parse_or(&get, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL.as_secs())?;
        let timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?;

        let deadline = match get("FUNDING_DEADLINE") {
            Some(value) => Some(NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                ConfigError::Invalid {
                    var: "FUNDING_DEADLINE",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let config = Config {
            api_key,
            orders_url: get("COINBASE_ORDERS_URL").unwrap_or_else(|| DEFAULT_ORDERS_URL.to_string()),
            database_url: get("DATABASE_URL"),
            db_path: get("DB_PATH").unwrap_or_else(|| "orders.db".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            refresh_interval: Duration::from_secs(non_zero("REFRESH_INTERVAL_SECS", refresh_secs)?),
            fetch_concurrency: non_zero("FETCH_CONCURRENCY", parse_or(&get, "FETCH_CONCURRENCY", DEFAULT_CONCURRENCY)?)?,
            mirror_concurrency: non_zero(
                "MIRROR_CONCURRENCY",
                parse_or(&get, "MIRROR_CONCURRENCY", DEFAULT_MIRROR_CONCURRENCY)?,
            )?,
            request_timeout: Duration::from_secs(non_zero("REQUEST_TIMEOUT_SECS", timeout_secs)?),
            dashboard: DashboardConfig {
                target: positive_finite(
                    "FUNDING_TARGET",
                    parse_or(&get, "FUNDING_TARGET", DashboardConfig::default().target)?,
                )?,
                deadline,
                ..DashboardConfig::default()
            },
        };

        Ok(config)
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            })
        }
        None => Ok(default),
    }
}

fn non_zero<T>(var: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialEq + Default + Display,
{
    if value == T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// 대시보드가 target으로 나누므로 0, 음수, NaN, 무한대는 허용하지 않는다
fn positive_finite(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }
    Ok(value)
}
