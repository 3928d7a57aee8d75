//! Configuration structures and constants for the aved-core library.
//!
//! Values are resolved in layers: built-in defaults, an optional TOML file,
//! `AVED_*` environment variables, and finally whatever the caller sets on
//! the struct or through [`CoreConfigBuilder`].

mod builder;
mod utils;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

pub use builder::CoreConfigBuilder;

// Default constants

/// Directories appended to `PATH` for children and searched by the locator
/// after `PATH` itself. These cover MacPorts and the usual system prefixes.
pub const DEFAULT_FALLBACK_DIRS: [&str; 3] = ["/opt/local/bin", "/usr/bin", "/usr/local/bin"];

/// How long a locator probe may run before it is killed and treated as found.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay between launching a transcode and inspecting its output directory.
pub const DEFAULT_INSPECTION_DELAY: Duration = Duration::from_secs(5);

/// Image format transcode writes frames in.
pub const DEFAULT_FRAME_FORMAT: &str = "ppm";

/// Filename prefix for generated frames (`f000000.ppm`, ...).
pub const DEFAULT_FRAME_PREFIX: &str = "f";

pub const DEFAULT_TRANSCODE_PROGRAM: &str = "transcode";
pub const DEFAULT_TCPROBE_PROGRAM: &str = "tcprobe";
pub const DEFAULT_AVIDUMP_PROGRAM: &str = "avidump";
pub const DEFAULT_TAR_PROGRAM: &str = "tar";
pub const DEFAULT_GUNZIP_PROGRAM: &str = "gunzip";
pub const DEFAULT_MBARIVISION_PROGRAM: &str = "mbarivision";

/// Main configuration structure for the aved-core library.
///
/// # Examples
///
/// ```rust
/// use aved_core::config::CoreConfig;
/// use std::time::Duration;
///
/// let mut config = CoreConfig::default();
/// config.probe_timeout = Duration::from_millis(500);
/// config.frame_format = "jpg".to_string();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directories searched after `PATH` and appended to the child `PATH`
    pub fallback_dirs: Vec<PathBuf>,

    /// Timeout for each tool-locator probe
    pub probe_timeout: Duration,

    /// Delay before the output directory is inspected for frame naming
    pub inspection_delay: Duration,

    /// Name of the transcode binary to locate
    pub transcode_program: String,

    pub tcprobe_program: String,

    pub avidump_program: String,

    pub tar_program: String,

    pub gunzip_program: String,

    /// Frame image format passed to `transcode -y <format>,null`
    pub frame_format: String,

    /// Prefix of generated frame files inside the output directory
    pub frame_prefix: String,

    /// Extra user options appended to every transcode invocation
    pub transcode_options: Vec<String>,

    /// Program name used for generated mbarivision command lines
    pub mbarivision_program: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fallback_dirs: DEFAULT_FALLBACK_DIRS.iter().map(PathBuf::from).collect(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            inspection_delay: DEFAULT_INSPECTION_DELAY,
            transcode_program: DEFAULT_TRANSCODE_PROGRAM.to_string(),
            tcprobe_program: DEFAULT_TCPROBE_PROGRAM.to_string(),
            avidump_program: DEFAULT_AVIDUMP_PROGRAM.to_string(),
            tar_program: DEFAULT_TAR_PROGRAM.to_string(),
            gunzip_program: DEFAULT_GUNZIP_PROGRAM.to_string(),
            frame_format: DEFAULT_FRAME_FORMAT.to_string(),
            frame_prefix: DEFAULT_FRAME_PREFIX.to_string(),
            transcode_options: Vec::new(),
            mbarivision_program: DEFAULT_MBARIVISION_PROGRAM.to_string(),
        }
    }
}

/// On-disk shape of the TOML configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    fallback_dirs: Option<Vec<PathBuf>>,
    probe_timeout_ms: Option<u64>,
    inspection_delay_ms: Option<u64>,
    transcode_program: Option<String>,
    tcprobe_program: Option<String>,
    avidump_program: Option<String>,
    tar_program: Option<String>,
    gunzip_program: Option<String>,
    frame_format: Option<String>,
    frame_prefix: Option<String>,
    transcode_options: Option<Vec<String>>,
    mbarivision_program: Option<String>,
}

impl CoreConfig {
    /// Defaults with `AVED_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge_file(file);
        Ok(config)
    }

    /// Loads a TOML file, then applies environment overrides.
    pub fn from_toml_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(dirs) = file.fallback_dirs {
            self.fallback_dirs = dirs;
        }
        if let Some(ms) = file.probe_timeout_ms {
            self.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.inspection_delay_ms {
            self.inspection_delay = Duration::from_millis(ms);
        }
        if let Some(v) = file.transcode_program {
            self.transcode_program = v;
        }
        if let Some(v) = file.tcprobe_program {
            self.tcprobe_program = v;
        }
        if let Some(v) = file.avidump_program {
            self.avidump_program = v;
        }
        if let Some(v) = file.tar_program {
            self.tar_program = v;
        }
        if let Some(v) = file.gunzip_program {
            self.gunzip_program = v;
        }
        if let Some(v) = file.frame_format {
            self.frame_format = v;
        }
        if let Some(v) = file.frame_prefix {
            self.frame_prefix = v;
        }
        if let Some(v) = file.transcode_options {
            self.transcode_options = v;
        }
        if let Some(v) = file.mbarivision_program {
            self.mbarivision_program = v;
        }
    }

    /// Applies `AVED_*` environment variables over the current values.
    pub fn apply_env_overrides(&mut self) {
        self.probe_timeout = Duration::from_millis(utils::get_env_u64(
            "AVED_PROBE_TIMEOUT_MS",
            self.probe_timeout.as_millis() as u64,
        ));
        self.inspection_delay = Duration::from_millis(utils::get_env_u64(
            "AVED_INSPECTION_DELAY_MS",
            self.inspection_delay.as_millis() as u64,
        ));
        self.frame_format = utils::get_env_string("AVED_FRAME_FORMAT", self.frame_format.clone());
        self.transcode_program =
            utils::get_env_string("AVED_TRANSCODE", self.transcode_program.clone());
        if let Some(opts) = utils::get_env_list("AVED_TRANSCODE_OPTIONS") {
            self.transcode_options = opts;
        }
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.frame_format.trim().is_empty() {
            return Err(CoreError::Config("frame_format must not be empty".to_string()));
        }
        if self.frame_format.contains(',') {
            return Err(CoreError::Config(format!(
                "frame_format '{}' must not contain a comma",
                self.frame_format
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(CoreError::Config("probe_timeout must be greater than zero".to_string()));
        }
        if self.transcode_program.trim().is_empty() {
            return Err(CoreError::Config("transcode_program must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_timeout, Duration::from_secs(1));
        assert_eq!(config.frame_prefix, "f");
        assert_eq!(
            config.fallback_dirs,
            vec![
                PathBuf::from("/opt/local/bin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/usr/local/bin"),
            ]
        );
    }

    #[test]
    fn test_toml_overrides_subset() {
        let config = CoreConfig::from_toml_str(
            r#"
probe_timeout_ms = 250
frame_format = "jpg"
transcode_options = ["--print_status", "10"]
"#,
        )
        .unwrap();
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert_eq!(config.frame_format, "jpg");
        assert_eq!(config.transcode_options, vec!["--print_status", "10"]);
        // Untouched keys keep their defaults
        assert_eq!(config.transcode_program, "transcode");
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let result = CoreConfig::from_toml_str("frame_colour = \"red\"");
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CoreConfig::default();
        config.frame_format = String::new();
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.probe_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.frame_format = "ppm,null".to_string();
        assert!(config.validate().is_err());
    }
}
