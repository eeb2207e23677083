use crate::acquisition::decode::{PixelFormat, decode_frame};
use crate::core_modules::color_grid::color_grid::ColorGrid;
use crate::error::{Result, VisionError};
use log::{debug, info};
use std::collections::VecDeque;
use std::path::PathBuf;

/// What a source reports once it has been opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInfo {
    pub width: usize,
    pub height: usize,
    /// Native frame rate, if the source has one.
    pub fps: Option<f64>,
}

/// Anything that can hand out decoded frames, one at a time.
///
/// `next_frame` returning `Ok(None)` means the stream has ended.
pub trait FrameSource: Send + 'static {
    fn name(&self) -> &str;
    fn open(&mut self) -> Result<SourceInfo>;
    fn next_frame(&mut self) -> Result<Option<ColorGrid>>;
}

/// Decodes a single image file on `open` and serves it as every frame.
pub struct StillImageSource {
    path: PathBuf,
    name: String,
    remaining: Option<u64>,
    frame: Option<ColorGrid>,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("still:{}", path.display());
        Self {
            path,
            name,
            remaining: None,
            frame: None,
        }
    }

    /// Stop after `frames` frames instead of repeating forever.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameSource for StillImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<SourceInfo> {
        let img = image::open(&self.path)?;
        let grid = ColorGrid::from(&img);
        info!(
            "Opened still image {} ({}x{})",
            self.path.display(),
            grid.width(),
            grid.height()
        );
        let info = SourceInfo {
            width: grid.width(),
            height: grid.height(),
            fps: None,
        };
        self.frame = Some(grid);
        Ok(info)
    }

    fn next_frame(&mut self) -> Result<Option<ColorGrid>> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| VisionError::source_message(format!("{} was not opened", self.name)))?;
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(n) => *n -= 1,
            None => {}
        }
        Ok(Some(frame.clone()))
    }
}

/// Serves queued raw byte frames, decoding each one on the way out.
pub struct RawFrameSource {
    width: usize,
    height: usize,
    format: PixelFormat,
    fps: Option<f64>,
    queue: VecDeque<Vec<u8>>,
}

impl RawFrameSource {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            fps: None,
            queue: VecDeque::new(),
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn push(&mut self, bytes: Vec<u8>) {
        self.queue.push_back(bytes);
    }
}

impl FrameSource for RawFrameSource {
    fn name(&self) -> &str {
        "raw"
    }

    fn open(&mut self) -> Result<SourceInfo> {
        if self.format.frame_len(self.width, self.height).is_none() || self.width == 0 || self.height == 0 {
            return Err(VisionError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(SourceInfo {
            width: self.width,
            height: self.height,
            fps: self.fps,
        })
    }

    fn next_frame(&mut self) -> Result<Option<ColorGrid>> {
        let Some(bytes) = self.queue.pop_front() else {
            return Ok(None);
        };
        debug!("Decoding {} byte {:?} frame", bytes.len(), self.format);
        decode_frame(&bytes, self.width, self.height, self.format).map(Some)
    }
}

/// Serves a fixed list of ready-made grids, then ends.
pub struct SyntheticSource {
    frames: VecDeque<ColorGrid>,
}

impl SyntheticSource {
    pub fn new(frames: impl IntoIterator<Item = ColorGrid>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn open(&mut self) -> Result<SourceInfo> {
        let (width, height) = self
            .frames
            .front()
            .map_or((0, 0), |g| (g.width(), g.height()));
        Ok(SourceInfo {
            width,
            height,
            fps: None,
        })
    }

    fn next_frame(&mut self) -> Result<Option<ColorGrid>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::color::Color;

    #[test]
    fn synthetic_source_drains_in_order() {
        let mut source = SyntheticSource::new([
            ColorGrid::filled(2, 1, Color::RED),
            ColorGrid::filled(2, 1, Color::BLUE),
        ]);
        let info = source.open().unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        assert_eq!(source.next_frame().unwrap().unwrap().get(0, 0), Some(Color::RED));
        assert_eq!(source.next_frame().unwrap().unwrap().get(0, 0), Some(Color::BLUE));
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn raw_source_decodes_and_reports_errors() {
        let mut source = RawFrameSource::new(2, 1, PixelFormat::Rgb24).with_fps(15.0);
        source.push(vec![255, 0, 0, 0, 0, 255]);
        source.push(vec![1, 2, 3]);
        assert_eq!(source.open().unwrap().fps, Some(15.0));

        let grid = source.next_frame().unwrap().unwrap();
        assert_eq!(grid.get(0, 1), Some(Color::BLUE));
        assert!(source.next_frame().is_err());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn still_image_requires_open() {
        let mut source = StillImageSource::new("does-not-matter.png");
        assert!(matches!(source.next_frame(), Err(VisionError::Source { .. })));
    }

    #[test]
    fn still_image_missing_file_fails_to_open() {
        let mut source = StillImageSource::new("/definitely/not/here.png");
        assert!(matches!(source.open(), Err(VisionError::Image(_))));
    }

    #[test]
    fn still_image_garbage_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = StillImageSource::new(&path).open().unwrap_err();
        assert!(matches!(err, VisionError::Image(image::ImageError::Decoding(_))));
    }

    #[test]
    fn still_image_repeats_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        ColorGrid::filled(3, 2, Color::ORANGE).to_rgb_image().save(&path).unwrap();

        let mut source = StillImageSource::new(&path).with_frame_limit(2);
        let info = source.open().unwrap();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(source.next_frame().unwrap().unwrap().get(1, 2), Some(Color::ORANGE));
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }
}
