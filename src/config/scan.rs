//! Per-run scan configuration.

use crate::banner::BANNER_TIMEOUT_CAP;
use crate::config::AppSettings;
use crate::scanner::ScanMode;
use std::time::Duration;

/// Immutable parameters of one scan, owned by the scan engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfiguration {
    /// Requested worker count, before clamping to the port count.
    pub threads: usize,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Requested probe strategy.
    pub mode: ScanMode,
    /// Grab banners from open ports (connect mode only).
    pub grab_banners: bool,
    /// Upper bound for each banner read or write.
    pub banner_timeout_cap: Duration,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            threads: 100,
            timeout: Duration::from_millis(800),
            mode: ScanMode::Connect,
            grab_banners: false,
            banner_timeout_cap: BANNER_TIMEOUT_CAP,
        }
    }
}

impl ScanConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the defaults carried by a settings file.
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            threads: settings.default_threads,
            timeout: Duration::from_millis(settings.default_timeout_ms),
            banner_timeout_cap: Duration::from_millis(settings.banner_timeout_cap_ms),
            ..Self::default()
        }
    }

    /// Set the worker count. Zero is raised to one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_banners(mut self, grab_banners: bool) -> Self {
        self.grab_banners = grab_banners;
        self
    }

    /// Number of workers actually spawned for `port_count` ports.
    pub fn worker_count(&self, port_count: usize) -> usize {
        self.threads.min(port_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_clamped() {
        let config = ScanConfiguration::new().with_threads(100);
        assert_eq!(config.worker_count(3), 3);
        assert_eq!(config.worker_count(1000), 100);
        assert_eq!(config.worker_count(0), 1);
        assert_eq!(ScanConfiguration::new().with_threads(0).threads, 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = AppSettings {
            default_threads: 8,
            default_timeout_ms: 250,
            banner_timeout_cap_ms: 100,
            ..AppSettings::default()
        };
        let config = ScanConfiguration::from_settings(&settings).with_mode(ScanMode::Syn);

        assert_eq!(config.threads, 8);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.banner_timeout_cap, Duration::from_millis(100));
        assert_eq!(config.mode, ScanMode::Syn);
        assert!(!config.grab_banners);
    }
}
