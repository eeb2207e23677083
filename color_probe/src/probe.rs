// THEORY:
// The `probe` module is the top-level consumer API. It bundles the pieces a caller
// would otherwise wire up by hand (engine, kernel, palette, threshold) and turns
// "what color is at these points of the latest frame" into one call.
//
// A probe reads the `FrameChannel` exactly once per `sample_latest` call, so every
// point in a batch is measured on the same frame even if the producer publishes a
// newer one halfway through.

use crate::config::{KernelChoice, ProbeConfig};
use crate::core_modules::color::color::Color;
use crate::core_modules::color_grid::color_grid::ColorGrid;
use crate::core_modules::convolution::ConvolutionEngine;
use crate::core_modules::kernel::kernel::Kernel;
use crate::core_modules::similarity::similarity::{ColorMatch, Palette};
use crate::error::Result;
use crate::frame_channel::FrameChannel;

/// Result of probing one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub row: i64,
    pub col: i64,
    pub color: Color,
    pub classification: Option<ColorMatch>,
}

pub struct ColorProbe {
    engine: ConvolutionEngine,
    kernel: KernelChoice,
    palette: Palette,
    max_distance: f64,
}

impl ColorProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine: ConvolutionEngine::new(
                config.convolution.footprint,
                config.convolution.default_value,
            ),
            kernel: config.convolution.kernel.clone(),
            palette: config.classification.palette.clone(),
            max_distance: config.classification.max_distance,
        })
    }

    pub fn engine(&self) -> &ConvolutionEngine {
        &self.engine
    }

    pub fn kernel(&self) -> &Kernel {
        self.kernel.kernel()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Smooths around `(row, col)` and classifies the result against the palette.
    pub fn sample(&self, grid: &ColorGrid, row: i64, col: i64) -> Sample {
        let color = self.engine.average(grid, row, col, self.kernel.kernel());
        Sample {
            row,
            col,
            color,
            classification: self.palette.classify(color, self.max_distance),
        }
    }

    /// Samples every point on the channel's latest frame, or `None` if no frame has
    /// been published yet.
    pub fn sample_latest(&self, channel: &FrameChannel, points: &[(i64, i64)]) -> Option<Vec<Sample>> {
        let grid = channel.latest()?;
        Some(
            points
                .iter()
                .map(|&(row, col)| self.sample(&grid, row, col))
                .collect(),
        )
    }
}
