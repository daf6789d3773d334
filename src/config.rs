use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_LEN;
use crate::sample::{SensorConversion, DEFAULT_DISTANCE_MULTIPLIER, DEFAULT_NO_OBJECT_THRESHOLD};
use crate::viewport::{ViewportState, ZoomPolicy, DEFAULT_ZOOM_BASE, FIELD_SIZE};

pub const DEFAULT_SOURCE: &str = "pose.txt";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Text encoding of the pose file. The format carries no marker, so this is
/// always configured per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// 7-bit ASCII (decoded leniently as UTF-8).
    #[default]
    Ascii,
    /// UTF-16 with a byte order mark.
    Utf16,
    /// UTF-16 little endian without a byte order mark.
    Utf16Le,
}

impl TextEncoding {
    pub const ALL: [TextEncoding; 3] = [
        TextEncoding::Ascii,
        TextEncoding::Utf16,
        TextEncoding::Utf16Le,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Ascii => "ascii",
            TextEncoding::Utf16 => "utf16",
            TextEncoding::Utf16Le => "utf16le",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "ascii" | "utf8" => Ok(TextEncoding::Ascii),
            "utf16" => Ok(TextEncoding::Utf16),
            "utf16le" => Ok(TextEncoding::Utf16Le),
            _ => Err(ConfigError::UnknownEncoding(s.to_string())),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "pose_viewer")]
#[command(about = "Live robot pose and distance sensor viewer", long_about = None)]
pub struct Args {
    /// Pose file rewritten by the control process.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// ascii, utf16 or utf16le.
    #[arg(short = 'e', long)]
    pub encoding: Option<String>,

    /// Trail length.
    #[arg(long)]
    pub history: Option<usize>,

    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Raw distance units to inches.
    #[arg(long)]
    pub multiplier: Option<f64>,

    /// Distances at or above this (inches) mean "no object".
    #[arg(long)]
    pub no_object: Option<f64>,

    #[arg(long)]
    pub zoom_base: Option<f64>,

    /// Fields written by "Generate Test Data" (3 or 5).
    #[arg(long)]
    pub generator_fields: Option<usize>,

    /// Do not push a sample equal to the latest one.
    #[arg(long)]
    pub skip_repeats: bool,

    /// JSON config file; command line values take precedence.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ViewBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// On-disk configuration; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub file: Option<PathBuf>,
    pub encoding: Option<String>,
    pub history: Option<usize>,
    pub interval_ms: Option<u64>,
    pub multiplier: Option<f64>,
    pub no_object: Option<f64>,
    pub zoom_base: Option<f64>,
    pub min_extent: Option<f64>,
    pub max_extent: Option<f64>,
    pub view: Option<ViewBounds>,
    pub generator_fields: Option<usize>,
    pub skip_repeats: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Resolved and validated settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: PathBuf,
    pub encoding: TextEncoding,
    pub history_capacity: usize,
    pub poll_interval: Duration,
    pub conversion: SensorConversion,
    pub zoom: ZoomPolicy,
    pub initial_view: ViewportState,
    pub generator_fields: usize,
    pub skip_repeats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            encoding: TextEncoding::default(),
            history_capacity: DEFAULT_HISTORY_LEN,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            conversion: SensorConversion {
                multiplier: DEFAULT_DISTANCE_MULTIPLIER,
                no_object_threshold: DEFAULT_NO_OBJECT_THRESHOLD,
            },
            zoom: ZoomPolicy {
                base: DEFAULT_ZOOM_BASE,
                min_extent: None,
                max_extent: None,
            },
            initial_view: ViewportState::new(0.0, FIELD_SIZE, 0.0, FIELD_SIZE),
            generator_fields: 3,
            skip_repeats: false,
        }
    }
}

impl Config {
    /// Defaults, overlaid by the config file (if any), overlaid by the command line.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(file, args)
    }

    pub fn merge(file: FileConfig, args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(source) = args.file.clone().or(file.file) {
            config.source = source;
        }
        if let Some(encoding) = args.encoding.as_deref().or(file.encoding.as_deref()) {
            config.encoding = encoding.parse()?;
        }
        if let Some(history) = args.history.or(file.history) {
            config.history_capacity = history;
        }
        if let Some(ms) = args.interval_ms.or(file.interval_ms) {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(multiplier) = args.multiplier.or(file.multiplier) {
            config.conversion.multiplier = multiplier;
        }
        if let Some(threshold) = args.no_object.or(file.no_object) {
            config.conversion.no_object_threshold = threshold;
        }
        if let Some(base) = args.zoom_base.or(file.zoom_base) {
            config.zoom.base = base;
        }
        config.zoom.min_extent = file.min_extent;
        config.zoom.max_extent = file.max_extent;
        if let Some(view) = file.view {
            config.initial_view = ViewportState::new(view.x_min, view.x_max, view.y_min, view.y_max);
        }
        if let Some(fields) = args.generator_fields.or(file.generator_fields) {
            config.generator_fields = fields;
        }
        config.skip_repeats = args.skip_repeats || file.skip_repeats.unwrap_or(false);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if self.history_capacity == 0 {
            return Err(ConfigError::Capacity);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::PollInterval);
        }
        if !positive(self.conversion.multiplier) {
            return Err(ConfigError::Multiplier(self.conversion.multiplier));
        }
        if !positive(self.conversion.no_object_threshold) {
            return Err(ConfigError::Threshold(self.conversion.no_object_threshold));
        }
        if !(self.zoom.base.is_finite() && self.zoom.base > 1.0) {
            return Err(ConfigError::ZoomBase(self.zoom.base));
        }

        let (min, max) = (self.zoom.min_extent, self.zoom.max_extent);
        let extent_ok = min.map_or(true, positive)
            && max.map_or(true, positive)
            && match (min, max) {
                (Some(min), Some(max)) => min <= max,
                _ => true,
            };
        if !extent_ok {
            return Err(ConfigError::Extent { min, max });
        }

        if !self.initial_view.is_valid() {
            return Err(ConfigError::ViewBounds);
        }
        if self.generator_fields != 3 && self.generator_fields != 5 {
            return Err(ConfigError::GeneratorArity(self.generator_fields));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::merge(FileConfig::default(), &Args::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn encoding_names() {
        assert_eq!("ascii".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert_eq!("UTF-16".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16);
        assert_eq!("utf_16_le".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16Le);
        assert!(matches!(
            "latin1".parse::<TextEncoding>(),
            Err(ConfigError::UnknownEncoding(_))
        ));
        for encoding in TextEncoding::ALL {
            assert_eq!(encoding.name().parse::<TextEncoding>().unwrap(), encoding);
        }
    }

    #[test]
    fn command_line_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "file": "from_file.txt", "encoding": "utf16le", "history": 10,
                 "view": { "x_min": -72.0, "x_max": 72.0, "y_min": -72.0, "y_max": 72.0 },
                 "min_extent": 6.0 }"#,
        )
        .unwrap();
        let args = Args {
            history: Some(25),
            ..Default::default()
        };

        let config = Config::merge(file, &args).unwrap();
        assert_eq!(config.source, PathBuf::from("from_file.txt"));
        assert_eq!(config.encoding, TextEncoding::Utf16Le);
        assert_eq!(config.history_capacity, 25);
        assert_eq!(config.initial_view.x_min, -72.0);
        assert_eq!(config.zoom.min_extent, Some(6.0));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let reject = |args: Args| Config::merge(FileConfig::default(), &args).unwrap_err();

        assert!(matches!(
            reject(Args { history: Some(0), ..Default::default() }),
            ConfigError::Capacity
        ));
        assert!(matches!(
            reject(Args { interval_ms: Some(0), ..Default::default() }),
            ConfigError::PollInterval
        ));
        assert!(matches!(
            reject(Args { multiplier: Some(f64::NAN), ..Default::default() }),
            ConfigError::Multiplier(_)
        ));
        assert!(matches!(
            reject(Args { no_object: Some(-1.0), ..Default::default() }),
            ConfigError::Threshold(_)
        ));
        assert!(matches!(
            reject(Args { zoom_base: Some(1.0), ..Default::default() }),
            ConfigError::ZoomBase(_)
        ));
        assert!(matches!(
            reject(Args { generator_fields: Some(4), ..Default::default() }),
            ConfigError::GeneratorArity(4)
        ));
        assert!(matches!(
            reject(Args { encoding: Some("ebcdic".into()), ..Default::default() }),
            ConfigError::UnknownEncoding(_)
        ));
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let file: FileConfig =
            serde_json::from_str(r#"{ "min_extent": 50.0, "max_extent": 10.0 }"#).unwrap();
        assert!(matches!(
            Config::merge(file, &Args::default()),
            Err(ConfigError::Extent { .. })
        ));

        let file: FileConfig = serde_json::from_str(
            r#"{ "view": { "x_min": 5.0, "x_max": 5.0, "y_min": 0.0, "y_max": 1.0 } }"#,
        )
        .unwrap();
        assert!(matches!(
            Config::merge(file, &Args::default()),
            Err(ConfigError::ViewBounds)
        ));

        assert!(serde_json::from_str::<FileConfig>(r#"{ "histroy": 5 }"#).is_err());
    }

    #[test]
    fn missing_config_file() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/pose_viewer.json")),
            ..Default::default()
        };
        assert!(matches!(
            Config::from_args(&args),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn verbosity() {
        let args = Args { verbose: 2, ..Default::default() };
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
    }
}
