use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use crate::monitoring::SchedulerConfig;

/// Process configuration, read from flags or the matching environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "keepalive", version, about = "Pings a set of URLs on a schedule to keep them awake")]
pub struct Config {
    /// Local database file, or a libsql:// / http(s):// remote database
    #[arg(long, env = "DATABASE_URL", default_value = "keepalive.db")]
    pub database_url: String,

    /// Auth token for a remote database
    #[arg(long, env = "DATABASE_AUTH_TOKEN", hide_env_values = true)]
    pub database_auth_token: Option<String>,

    /// Port the HTTP API listens on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Tick period and default per-target interval, in milliseconds
    #[arg(long, env = "PING_INTERVAL", default_value_t = 60_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub ping_interval_ms: u64,

    /// Url of this process's own health endpoint [default: http://localhost:<port>/health]
    #[arg(long, env = "SELF_URL")]
    pub self_url: Option<String>,

    /// Timeout for a single check, in seconds
    #[arg(long, env = "CHECK_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub check_timeout_secs: u64,

    /// Checks allowed in flight at once within a tick
    #[arg(long, env = "MAX_CONCURRENT_CHECKS", default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent_checks: u32,
}

impl Config {
    /// Parse flags and environment, exiting with usage on error
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn self_url(&self) -> String {
        self.self_url.clone().unwrap_or_else(|| format!("http://localhost:{}/health", self.port))
    }

    pub fn default_interval_ms(&self) -> u64 {
        self.ping_interval_ms
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_period: Duration::from_millis(self.ping_interval_ms),
            check_timeout: Duration::from_secs(self.check_timeout_secs),
            max_concurrent_checks: self.max_concurrent_checks as usize,
        }
    }

    /// Pool size: enough for every concurrent check plus a few API requests
    pub fn pool_size(&self) -> usize {
        self.max_concurrent_checks as usize + 4
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let token = if self.database_auth_token.is_some() { "<set>" } else { "<none>" };

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Url", &self.database_url)?;
        write_1(f, "Auth Token", &token)?;
        write_title_1(f, "HTTP")?;
        write_1(f, "Listen Address", &self.listen_addr())?;
        write_1(f, "Self Url", &self.self_url())?;
        write_title_1(f, "Pinging")?;
        write_1(f, "Interval (ms)", &self.ping_interval_ms)?;
        write_1(f, "Check Timeout (s)", &self.check_timeout_secs)?;
        write_1(f, "Max Concurrent Checks", &self.max_concurrent_checks)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("keepalive").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override() {
        let config = parse(&[
            "--database-url",
            "/tmp/targets.db",
            "--port",
            "9000",
            "--ping-interval-ms",
            "1000",
            "--check-timeout-secs",
            "3",
            "--max-concurrent-checks",
            "2",
        ])
        .unwrap();

        assert_eq!(config.database_url, "/tmp/targets.db");
        assert_eq!(config.listen_addr().port(), 9000);

        let scheduler = config.scheduler_config();
        assert_eq!(scheduler.tick_period, Duration::from_secs(1));
        assert_eq!(scheduler.check_timeout, Duration::from_secs(3));
        assert_eq!(scheduler.max_concurrent_checks, 2);
    }

    #[test]
    fn test_self_url_follows_port() {
        let config = parse(&["--port", "9100"]).unwrap();
        assert_eq!(config.self_url(), "http://localhost:9100/health");

        let config = parse(&["--port", "9100", "--self-url", "https://me.example/health"]).unwrap();
        assert_eq!(config.self_url(), "https://me.example/health");
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(parse(&["--ping-interval-ms", "0"]).is_err());
        assert!(parse(&["--max-concurrent-checks", "0"]).is_err());
    }

    #[test]
    fn test_display_hides_token() {
        let config = parse(&["--database-auth-token", "secret-token"]).unwrap();
        let rendered = config.to_string();
        assert!(rendered.contains("<set>"));
        assert!(!rendered.contains("secret-token"));
    }
}
