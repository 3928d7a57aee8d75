// ============================================================================
// aved-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Provides a fluent API for creating CoreConfig instances. Fields not set on
// the builder keep the values of the starting configuration (defaults unless
// the builder was seeded with `from_config`).

use std::path::PathBuf;
use std::time::Duration;

use super::CoreConfig;
use crate::error::CoreResult;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use aved_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .probe_timeout(Duration::from_millis(200))
///     .inspection_delay(Duration::from_secs(2))
///     .frame_format("png")
///     .transcode_option("--print_status")
///     .transcode_option("25")
///     .build()
///     .unwrap();
/// assert_eq!(config.frame_format, "png");
/// assert_eq!(config.transcode_options.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder seeded with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded with an existing configuration.
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Replaces the fallback search directories.
    pub fn fallback_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.fallback_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn inspection_delay(mut self, delay: Duration) -> Self {
        self.config.inspection_delay = delay;
        self
    }

    pub fn transcode_program(mut self, program: impl Into<String>) -> Self {
        self.config.transcode_program = program.into();
        self
    }

    pub fn tcprobe_program(mut self, program: impl Into<String>) -> Self {
        self.config.tcprobe_program = program.into();
        self
    }

    pub fn avidump_program(mut self, program: impl Into<String>) -> Self {
        self.config.avidump_program = program.into();
        self
    }

    pub fn frame_format(mut self, format: impl Into<String>) -> Self {
        self.config.frame_format = format.into();
        self
    }

    pub fn frame_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.frame_prefix = prefix.into();
        self
    }

    /// Appends one extra transcode argument.
    pub fn transcode_option(mut self, option: impl Into<String>) -> Self {
        self.config.transcode_options.push(option.into());
        self
    }

    pub fn mbarivision_program(mut self, program: impl Into<String>) -> Self {
        self.config.mbarivision_program = program.into();
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> CoreResult<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
