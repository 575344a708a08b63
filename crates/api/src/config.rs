//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::NaiveTime;

use finpay_invoicing::DEFAULT_GRACE_DAYS;
use finpay_observability::LogFormat;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Postgres store when set, in-memory otherwise.
    pub database_url: Option<String>,
    pub sweep_enabled: bool,
    /// Local wall-clock time of the daily sweep.
    pub sweep_at: NaiveTime,
    pub sweep_grace_days: u32,
    pub mark_overdue_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            sweep_enabled: true,
            sweep_at: NaiveTime::MIN,
            sweep_grace_days: DEFAULT_GRACE_DAYS,
            mark_overdue_enabled: true,
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys keep their default.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("BIND_ADDR") {
            cfg.bind_addr = v
                .trim()
                .parse::<SocketAddr>()
                .with_context(|| format!("BIND_ADDR: invalid socket address {v:?}"))?;
        }
        cfg.database_url = get("DATABASE_URL");
        if let Some(v) = get("SWEEP_ENABLED") {
            cfg.sweep_enabled = parse_bool("SWEEP_ENABLED", &v)?;
        }
        if let Some(v) = get("SWEEP_AT") {
            cfg.sweep_at = NaiveTime::parse_from_str(v.trim(), "%H:%M")
                .with_context(|| format!("SWEEP_AT: expected HH:MM, got {v:?}"))?;
        }
        if let Some(v) = get("SWEEP_GRACE_DAYS") {
            cfg.sweep_grace_days = v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("SWEEP_GRACE_DAYS: expected a non-negative integer, got {v:?}"))?;
        }
        if let Some(v) = get("MARK_OVERDUE_ENABLED") {
            cfg.mark_overdue_enabled = parse_bool("MARK_OVERDUE_ENABLED", &v)?;
        }
        if let Some(v) = get("LOG_FORMAT") {
            cfg.log_format = v.parse::<LogFormat>().context("LOG_FORMAT")?;
        }
        Ok(cfg)
    }
}

fn parse_bool(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key}: expected a boolean, got {raw:?}"),
    }
}
