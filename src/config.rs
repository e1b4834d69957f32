use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Runtime configuration, read once from the environment at boot.
/// Every knob has a development default so a bare `cargo run` comes up.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub gateway_base_url: String,
    pub gateway_key: String,
    pub gateway_secret: String,
    pub gateway_plan_id: String,
    pub refund_days: i64,
    /// Length of one reporting period; the scheduler opens a fresh stats
    /// bucket at this cadence.
    pub stats_period_secs: u64,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            "dev-secret-change-me".to_string()
        });

        Self {
            port: try_load("PORT", "4000"),
            jwt_secret,
            jwt_ttl_days: try_load("JWT_TTL_DAYS", "15"),
            gateway_base_url: try_load(
                "GATEWAY_BASE_URL",
                "https://api.razorpay.com/v1",
            ),
            gateway_key: env::var("GATEWAY_API_KEY").unwrap_or_default(),
            gateway_secret: env::var("GATEWAY_API_SECRET").unwrap_or_default(),
            gateway_plan_id: try_load("GATEWAY_PLAN_ID", "plan_basic_monthly"),
            refund_days: try_load("REFUND_DAYS", "7"),
            stats_period_secs: try_load("STATS_PERIOD_SECS", "86400"),
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000"),
        }
    }

    pub fn gateway_configured(&self) -> bool {
        !self.gateway_key.is_empty() && !self.gateway_secret.is_empty()
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().unwrap_or_else(|e| {
        warn!("invalid {key} value {raw:?}: {e}; using default {default}");
        default.parse().map_err(|e| format!("{e}")).expect("default must parse")
    })
}
