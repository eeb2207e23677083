use crate::acquisition::session::frame_period;
use crate::core_modules::color::color::Channel;
use crate::core_modules::convolution::{DEFAULT_VALUE, Footprint};
use crate::core_modules::kernel::kernel::{Kernel, KernelPreset, Weight};
use crate::core_modules::similarity::similarity::{NamedColor, Palette};
use crate::error::{Result, VisionError};
use log::debug;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "COLOR_PROBE_CONFIG";
pub const KERNEL_ENV: &str = "COLOR_PROBE_KERNEL";
pub const MAX_DISTANCE_ENV: &str = "COLOR_PROBE_MAX_DISTANCE";

const DEFAULT_MAX_DISTANCE: f64 = 100.0;
const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ProbeConfigFile {
    convolution: Option<ConvolutionConfigFile>,
    classification: Option<ClassificationConfigFile>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConvolutionConfigFile {
    kernel: Option<KernelPreset>,
    kernel_weights: Option<Vec<Vec<Weight>>>,
    footprint: Option<Footprint>,
    default_value: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClassificationConfigFile {
    max_distance: Option<f64>,
    palette: Option<Vec<NamedColor>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CaptureConfigFile {
    fps: Option<f64>,
    max_frames: Option<u64>,
}

/// Which kernel the probe convolves with.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelChoice {
    Preset(KernelPreset),
    Custom(Kernel),
}

impl KernelChoice {
    pub fn kernel(&self) -> &Kernel {
        match self {
            KernelChoice::Preset(preset) => preset.kernel(),
            KernelChoice::Custom(kernel) => kernel,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionSettings {
    pub kernel: KernelChoice,
    pub footprint: Footprint,
    pub default_value: Channel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSettings {
    pub max_distance: f64,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub fps: f64,
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub convolution: ConvolutionSettings,
    pub classification: ClassificationSettings,
    pub capture: CaptureSettings,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            convolution: ConvolutionSettings {
                kernel: KernelChoice::Preset(KernelPreset::default()),
                footprint: Footprint::default(),
                default_value: DEFAULT_VALUE,
            },
            classification: ClassificationSettings {
                max_distance: DEFAULT_MAX_DISTANCE,
                palette: Palette::standard(),
            },
            capture: CaptureSettings {
                fps: DEFAULT_FPS,
                max_frames: None,
            },
        }
    }
}

impl ProbeConfig {
    /// Reads the file named by `COLOR_PROBE_CONFIG` (if set), then applies
    /// environment overrides and validates.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV).ok() {
            Some(path) => Self::load_from(Some(Path::new(&path))),
            None => Self::load_from(None),
        }
    }

    /// Reads `path` (or starts from defaults), then applies environment overrides
    /// and validates. `COLOR_PROBE_CONFIG` is not consulted.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => ProbeConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Same as `load_from(Some(path))`: environment overrides still apply.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::load_from(Some(path))
    }

    /// Parses a TOML document on its own. No environment overrides.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg = Self::from_file(toml::from_str(raw)?)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ProbeConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let convolution = file.convolution.unwrap_or_default();
        let classification = file.classification.unwrap_or_default();
        let capture = file.capture.unwrap_or_default();

        let kernel = match convolution.kernel_weights {
            Some(rows) => KernelChoice::Custom(Kernel::new(rows)?),
            None => KernelChoice::Preset(convolution.kernel.unwrap_or_default()),
        };
        let default_value = match convolution.default_value {
            Some(value) => Channel::try_from(value).map_err(|_| {
                VisionError::config(format!("convolution.default_value {value} is outside 0..=255"))
            })?,
            None => defaults.convolution.default_value,
        };

        Ok(Self {
            convolution: ConvolutionSettings {
                kernel,
                footprint: convolution.footprint.unwrap_or_default(),
                default_value,
            },
            classification: ClassificationSettings {
                max_distance: classification
                    .max_distance
                    .unwrap_or(defaults.classification.max_distance),
                palette: classification
                    .palette
                    .map(Palette::new)
                    .unwrap_or(defaults.classification.palette),
            },
            capture: CaptureSettings {
                fps: capture.fps.unwrap_or(defaults.capture.fps),
                max_frames: capture.max_frames,
            },
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = std::env::var(KERNEL_ENV) {
            let preset = KernelPreset::parse(&name)
                .ok_or_else(|| VisionError::config(format!("{KERNEL_ENV}={name} is not a kernel preset")))?;
            debug!("Kernel overridden from environment: {:?}", preset);
            self.convolution.kernel = KernelChoice::Preset(preset);
        }
        if let Ok(raw) = std::env::var(MAX_DISTANCE_ENV) {
            self.classification.max_distance = raw
                .trim()
                .parse()
                .map_err(|_| VisionError::config(format!("{MAX_DISTANCE_ENV}={raw} is not a number")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let max_distance = self.classification.max_distance;
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(VisionError::config(format!(
                "classification.max_distance must be a finite, non-negative number, got {max_distance}"
            )));
        }
        if let Some(entry) = self
            .classification
            .palette
            .entries()
            .iter()
            .find(|e| e.name.trim().is_empty())
        {
            return Err(VisionError::config(format!(
                "palette entry {} has an empty name",
                entry.rgb
            )));
        }
        frame_period(self.capture.fps)?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ProbeConfigFile> {
    let raw = std::fs::read_to_string(path)?;
    debug!("Loaded config from {}", path.display());
    Ok(toml::from_str(&raw)?)
}
