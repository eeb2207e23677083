//! Frame acquisition.
//!
//! Everything between "a device has bytes" and "a `ColorGrid` sits in the
//! `FrameChannel`": pixel-format decoding, frame sources, and the capture
//! session that runs a source on a background task.
//!
//! None of this is needed to use the convolution or similarity code; a caller
//! with its own camera stack can build `ColorGrid`s directly and publish them.

pub mod decode;
pub mod session;
pub mod source;

pub use decode::{PixelFormat, decode_frame};
pub use session::{CaptureSession, MAX_FPS, MIN_FPS, SessionState, frame_period};
pub use source::{FrameSource, RawFrameSource, SourceInfo, StillImageSource, SyntheticSource};
