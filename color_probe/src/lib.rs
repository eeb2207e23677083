// THEORY:
// This file is the entry point for the `color_probe` library crate. It exposes a
// small on-device vision helper: smooth the colors around a point of a captured
// frame with a weighted kernel, then measure how far that color is from a set of
// references.
//
// The crate is layered leaves-first:
// - `core_modules`: pure data and math (`Color`, `Kernel`, `ColorGrid`, the
//   convolution engine, the similarity metric). No threads, no I/O.
// - `frame_channel`: the lock-free single-slot hand-off between a frame producer
//   and any number of consumers.
// - `acquisition`: decoding raw pixel formats, frame sources, and the capture
//   session that runs a source on a tokio task.
// - `probe` and `config`: the high-level consumer API and its TOML configuration.

pub mod acquisition;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_channel;
pub mod probe;

pub use config::ProbeConfig;
pub use core_modules::color::color::Color;
pub use core_modules::color_grid::color_grid::ColorGrid;
pub use core_modules::convolution::{ConvolutionEngine, DEFAULT_VALUE, Footprint, average};
pub use core_modules::kernel::kernel::{Kernel, KernelPreset};
pub use core_modules::similarity::similarity::{ColorMatch, NamedColor, Palette, distance};
pub use error::{Result, VisionError};
pub use frame_channel::FrameChannel;
pub use probe::{ColorProbe, Sample};
