use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Application configuration: optional YAML file plus environment overrides
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Browser and capture settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// HTTP server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen port on all interfaces
    #[serde(default = "default_port")]
    pub port: u16,

    /// Full bind address; takes precedence over `port`
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

fn default_port() -> u16 {
    23740
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_addr: None,
            debug: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.port))
    }
}

/// Settings for one browser capture
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Device pixel ratio; 2.0 doubles the resolution of the captured canvas
    #[serde(default = "default_device_scale_factor")]
    pub device_scale_factor: f64,

    /// Bound for navigation until the network goes idle
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Bound for the page to raise its completion flag
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Extra wait after the completion flag, for late-loading images
    #[serde(default)]
    pub settle_ms: u64,

    #[serde(default = "default_screenshot_timeout_ms")]
    pub screenshot_timeout_ms: u64,

    /// CSS selector of the element to capture
    #[serde(default = "default_canvas_selector")]
    pub canvas_selector: String,

    /// Name of the `window` global the page sets to `true` when done
    #[serde(default = "default_completion_flag")]
    pub completion_flag: String,

    /// Chromium executable; auto-detected when unset
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Additional command line flags passed to Chromium
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Parent of the per-capture profile directories; system temp dir when unset
    #[serde(default)]
    pub profile_root: Option<PathBuf>,
}

fn default_viewport_width() -> u32 {
    1400
}

fn default_viewport_height() -> u32 {
    2200
}

fn default_device_scale_factor() -> f64 {
    2.0
}

fn default_navigation_timeout_ms() -> u64 {
    5_000
}

fn default_render_timeout_ms() -> u64 {
    45_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_screenshot_timeout_ms() -> u64 {
    15_000
}

fn default_canvas_selector() -> String {
    "canvas".to_string()
}

fn default_completion_flag() -> String {
    "renderComplete".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            device_scale_factor: default_device_scale_factor(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: 0,
            screenshot_timeout_ms: default_screenshot_timeout_ms(),
            canvas_selector: default_canvas_selector(),
            completion_flag: default_completion_flag(),
            chrome_executable: None,
            extra_args: Vec::new(),
            profile_root: None,
        }
    }
}

impl CaptureConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (if set) and apply environment overrides.
    ///
    /// Problems are returned rather than logged, since this usually runs
    /// before the tracing subscriber is installed.
    pub fn load() -> (Self, Vec<ConfigError>) {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::load`], reading variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        let mut config = match lookup("CONFIG_FILE").filter(|v| !v.is_empty()) {
            Some(path) => Self::load_from_file(Path::new(&path)).unwrap_or_else(|e| {
                problems.push(e);
                Self::default()
            }),
            None => Self::default(),
        };
        problems.extend(config.apply_env(lookup));

        (config, problems)
    }

    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from environment-style variables.
    ///
    /// Unparseable values are skipped and reported back.
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        if let Some(port) = parse_var::<u16, _>(&lookup, "PORT", &mut problems) {
            self.server.port = port;
        }
        if let Some(addr) = lookup("BIND_ADDR").filter(|v| !v.is_empty()) {
            self.server.bind_addr = Some(addr);
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = debug.eq_ignore_ascii_case("true");
        }
        if let Some(path) = lookup("CHROME_PATH").filter(|v| !v.is_empty()) {
            self.capture.chrome_executable = Some(PathBuf::from(path));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "NAV_TIMEOUT_MS", &mut problems) {
            self.capture.navigation_timeout_ms = ms;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "RENDER_TIMEOUT_MS", &mut problems) {
            self.capture.render_timeout_ms = ms;
        }

        problems
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, problems: &mut Vec<ConfigError>) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            problems.push(ConfigError::InvalidEnv {
                variable: name.to_string(),
                value: raw,
            });
            None
        }
    }
}
