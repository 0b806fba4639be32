use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Run-wide switches taken from the global command line flags.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Each level hides more output: 1 drops headers, 2 drops details.
    pub quiet: u8,
    pub verbose: u8,
    pub no_banner: bool,
}

/// DNS client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsConfig {
    pub server: IpAddr,
    pub port: u16,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Attempts made before a query is given up.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            server: IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            port: 53,
            timeout: Duration::from_secs(5),
            retries: 3,
            retry_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub timeout: Duration,
    /// Probes allowed in flight at once.
    pub concurrency: usize,
    /// Minimum spacing between two probe starts.
    pub rate_limit: Duration,
    pub max_per_minute: u32,
    pub banner_grab: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            concurrency: 10,
            rate_limit: Duration::from_millis(100),
            max_per_minute: 6000,
            banner_grab: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingConfig {
    pub count: u16,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            count: 4,
            timeout: Duration::from_secs(1),
            interval: Duration::from_secs(1),
        }
    }
}
