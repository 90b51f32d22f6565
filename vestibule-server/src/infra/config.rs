use std::{env, time::Duration};
use vestibule_core::{PromotionMode, SchedulerConfig};

/// Server configuration loaded from environment variables (with a `.env`
/// file honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Ordered store settings
    pub redis_url: String,

    // Promotion scheduler settings
    pub scheduler_enabled: bool,
    pub scheduler_initial_delay_ms: u64,
    pub scheduler_interval_ms: u64,
    pub scheduler_max_batch: u64,

    /// Run batch promotion as a single server-side atomic operation
    /// instead of the reference pop-then-add composition.
    pub promotion_strict: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "9010".to_string())
                .parse()
                .unwrap_or(9010),

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            scheduler_enabled: env::var("SCHEDULER_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            scheduler_initial_delay_ms: env::var("SCHEDULER_INITIAL_DELAY_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5_000),
            scheduler_interval_ms: env::var("SCHEDULER_INTERVAL_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10_000),
            scheduler_max_batch: env::var("SCHEDULER_MAX_BATCH")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),

            promotion_strict: env::var("PROMOTION_STRICT")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            enabled: self.scheduler_enabled,
            initial_delay: Duration::from_millis(self.scheduler_initial_delay_ms),
            interval: Duration::from_millis(self.scheduler_interval_ms),
            max_batch: self.scheduler_max_batch,
        }
    }

    pub fn promotion_mode(&self) -> PromotionMode {
        if self.promotion_strict {
            PromotionMode::Strict
        } else {
            PromotionMode::Relaxed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_mirrors_env_fields() {
        let config = Config {
            server_host: "0.0.0.0".into(),
            server_port: 9010,
            redis_url: "redis://127.0.0.1:6379".into(),
            scheduler_enabled: true,
            scheduler_initial_delay_ms: 5_000,
            scheduler_interval_ms: 10_000,
            scheduler_max_batch: 100,
            promotion_strict: false,
        };

        let scheduler = config.scheduler();
        assert!(scheduler.enabled);
        assert_eq!(scheduler.initial_delay, Duration::from_secs(5));
        assert_eq!(scheduler.interval, Duration::from_secs(10));
        assert_eq!(scheduler.max_batch, 100);
        assert_eq!(config.promotion_mode(), PromotionMode::Relaxed);
    }
}
