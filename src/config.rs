//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.chanmetric.toml` files.

use crate::analysis::MetricSettings;
use crate::channels::{StaticRangeCatalog, StatusTable};
use crate::models::{ChannelRange, Index};
use crate::naming::PadWidths;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::warn;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".chanmetric.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Metric settings.
    #[serde(default)]
    pub metric: MetricConfig,

    /// Boundary line settings.
    #[serde(default)]
    pub lines: LinesConfig,

    /// Output naming and files.
    #[serde(default)]
    pub output: OutputConfig,

    /// Zero-padding widths for name placeholders.
    #[serde(default)]
    pub naming: PadWidths,

    /// Channel range definitions.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Channel status lists.
    #[serde(default)]
    pub status: StatusConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 0=silent, 1=init, 2=each event, >2=more.
    #[serde(default = "default_log_level")]
    pub log_level: u8,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> u8 {
    1
}

/// Metric selection and axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Metric name: a built-in name or a metadata field.
    #[serde(default = "default_metric")]
    pub name: String,

    /// Channel range names; empty or "all" selects every channel.
    #[serde(default)]
    pub channel_ranges: Vec<String>,

    /// Metric axis minimum.
    #[serde(default)]
    pub min: f32,

    /// Metric axis maximum. Clamping applies only when min < max.
    #[serde(default)]
    pub max: f32,

    /// Metric axis label. Empty means "<metric> [<units>]".
    #[serde(default)]
    pub label: String,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            name: default_metric(),
            channel_ranges: Vec::new(),
            min: 0.0,
            max: 0.0,
            label: String::new(),
        }
    }
}

fn default_metric() -> String {
    "pedestal".to_string()
}

/// Boundary lines at `N * modulus + pattern[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinesConfig {
    #[serde(default)]
    pub modulus: Index,

    #[serde(default)]
    pub pattern: Vec<Index>,
}

/// Output naming templates and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Result name. Containing %STATUS% enables the bad/noisy/good split.
    #[serde(default = "default_hist_name")]
    pub hist_name: String,

    /// Result title.
    #[serde(default = "default_hist_title")]
    pub hist_title: String,

    /// Plot size in pixels (0 = presentation default).
    #[serde(default)]
    pub plot_size_x: u32,

    #[serde(default)]
    pub plot_size_y: u32,

    /// Markdown plot file name template. Empty disables the file.
    #[serde(default)]
    pub plot_file_name: String,

    /// JSON dump file name template. Empty disables the file.
    #[serde(default)]
    pub json_file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hist_name: default_hist_name(),
            hist_title: default_hist_title(),
            plot_size_x: 0,
            plot_size_y: 0,
            plot_file_name: String::new(),
            json_file_name: String::new(),
        }
    }
}

fn default_hist_name() -> String {
    "hmet_%CRNAME%_%0RUN%_%0EVENT%".to_string()
}

fn default_hist_title() -> String {
    "Run %RUN% event %EVENT% %CRLABEL%".to_string()
}

/// Channel range catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Include the protoDUNE APA and plane ranges.
    #[serde(default)]
    pub protodune: bool,

    /// Explicit ranges; these replace preset ranges of the same name.
    #[serde(default)]
    pub ranges: Vec<ChannelRange>,
}

/// Channel status lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub bad: Vec<Index>,

    #[serde(default)]
    pub noisy: Vec<Index>,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// Only parses; call [`validate`](Self::validate) once CLI overrides
    /// have been merged.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check the configuration for errors.
    ///
    /// An empty or inverted metric axis is not an error; it disables
    /// clamping and is reported when the orchestrator is built.
    pub fn validate(&self) -> Result<()> {
        if self.metric.name.trim().is_empty() {
            bail!("Metric name must not be empty");
        }

        let mut names = HashSet::new();
        for range in &self.catalog.ranges {
            if range.name.is_empty() {
                bail!("Channel range with empty name");
            }
            if range.first > range.last {
                bail!(
                    "Channel range '{}' has first channel {} after last channel {}",
                    range.name,
                    range.first,
                    range.last
                );
            }
            if !names.insert(range.name.as_str()) {
                bail!("Channel range '{}' defined more than once", range.name);
            }
        }

        let conflicts = self.status_table().conflicts();
        if !conflicts.is_empty() {
            warn!("Channels listed as both bad and noisy are treated as bad: {:?}", conflicts);
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref metric) = args.metric {
            self.metric.name = metric.clone();
        }
        if let Some(ref ranges) = args.ranges {
            self.metric.channel_ranges = ranges.clone();
        }
        if let Some(min) = args.min {
            self.metric.min = min;
        }
        if let Some(max) = args.max {
            self.metric.max = max;
        }
        if let Some(ref file) = args.plot_file {
            self.output.plot_file_name = file.clone();
        }
        if let Some(ref file) = args.json_file {
            self.output.json_file_name = file.clone();
        }
    }

    /// Build the range catalog described by this configuration.
    pub fn range_catalog(&self) -> StaticRangeCatalog {
        let mut catalog = if self.catalog.protodune {
            StaticRangeCatalog::protodune()
        } else {
            StaticRangeCatalog::new()
        };
        for range in &self.catalog.ranges {
            catalog.insert(range.clone());
        }
        catalog
    }

    /// Build the status classifier described by this configuration.
    pub fn status_table(&self) -> StatusTable {
        StatusTable::new(self.status.bad.iter().copied(), self.status.noisy.iter().copied())
    }

    /// Tracing filter for the configured log level. Level 0 turns logging off.
    pub fn log_level(&self) -> LevelFilter {
        match self.general.log_level {
            0 => LevelFilter::OFF,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

impl From<&Config> for MetricSettings {
    fn from(config: &Config) -> Self {
        Self {
            metric: config.metric.name.clone(),
            range_names: config.metric.channel_ranges.clone(),
            metric_min: config.metric.min,
            metric_max: config.metric.max,
            metric_label: config.metric.label.clone(),
            line_modulus: config.lines.modulus,
            line_pattern: config.lines.pattern.clone(),
            hist_name: config.output.hist_name.clone(),
            hist_title: config.output.hist_title.clone(),
            plot_size_x: config.output.plot_size_x,
            plot_size_y: config.output.plot_size_y,
            plot_file_name: config.output.plot_file_name.clone(),
            json_file_name: config.output.json_file_name.clone(),
            widths: config.naming,
        }
    }
}
