/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `NOTIFIER_INTERVAL_SECS`: Seconds between deadline scans (default: 3600)
/// - `NOTIFIER_WINDOW_HOURS`: How far ahead a deadline counts as approaching (default: 24)
/// - `SMTP_*`, `EMAIL_FROM*`: see [`MailerConfig::from_env`]
use chrono::Duration;
use std::env;
use taskhub_shared::db::pool::DatabaseConfig;
use taskhub_shared::mailer::MailerConfig;
use taskhub_shared::services::notifications::DEFAULT_WINDOW_HOURS;

/// Default seconds between scans
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: DatabaseConfig,

    pub mailer: MailerConfig,

    pub notifier: NotifierConfig,
}

/// Deadline notifier configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    /// Seconds between scans; the first scan runs at startup
    pub interval_secs: u64,

    pub window_hours: i64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            interval_secs: DEFAULT_INTERVAL_SECS,
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl NotifierConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::hours(self.window_hours)
    }

    fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let interval_secs = match env::var("NOTIFIER_INTERVAL_SECS") {
            Ok(v) => v.parse::<u64>()?,
            Err(_) => defaults.interval_secs,
        };
        if interval_secs == 0 {
            anyhow::bail!("NOTIFIER_INTERVAL_SECS must be positive");
        }

        let window_hours = match env::var("NOTIFIER_WINDOW_HOURS") {
            Ok(v) => v.parse::<i64>()?,
            Err(_) => defaults.window_hours,
        };
        if window_hours <= 0 {
            anyhow::bail!("NOTIFIER_WINDOW_HOURS must be positive");
        }

        Ok(Self {
            interval_secs,
            window_hours,
        })
    }
}

impl WorkerConfig {
    /// Loads configuration from environment variables (and `.env`)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
                ..Default::default()
            },
            mailer: MailerConfig::from_env()?,
            notifier: NotifierConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_defaults() {
        let config = NotifierConfig::default();
        assert_eq!(config.interval(), std::time::Duration::from_secs(3600));
        assert_eq!(config.window(), Duration::hours(24));
    }
}
