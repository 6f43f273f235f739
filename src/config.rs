//! Configuration for bundle-vfs.
//!
//! Controls how disk files are live-reloaded. Use [`ConfigBuilder`] at
//! application startup to set the process-wide defaults picked up by
//! [`VirtualFileSystem::new`](crate::VirtualFileSystem::new).

use std::sync::OnceLock;
use std::time::Duration;

use crate::disk::ReloadMode;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Interval between background scans for changed disk files.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Runtime configuration for the disk cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Reload mode a new file system starts in.
    pub reload_mode: ReloadMode,
    /// Sleep between scans while in [`ReloadMode::Async`].
    pub check_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reload_mode: ReloadMode::Async,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    reload_mode: Option<ReloadMode>,
    check_interval: Option<Duration>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial reload mode.
    ///
    /// Default: [`ReloadMode::Async`]
    pub fn reload_mode(mut self, mode: ReloadMode) -> Self {
        self.reload_mode = Some(mode);
        self
    }

    /// Set the background scan interval.
    ///
    /// Default: 100ms
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use bundle_vfs::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .check_interval(Duration::from_millis(250))
    ///     .build();
    /// assert_eq!(config.check_interval, Duration::from_millis(250));
    /// ```
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = Some(interval);
        self
    }

    /// Build the configuration without installing it globally.
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            reload_mode: self.reload_mode.unwrap_or(defaults.reload_mode),
            check_interval: self.check_interval.unwrap_or(defaults.check_interval),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
