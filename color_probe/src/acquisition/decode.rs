use crate::core_modules::color::color::Color;
use crate::core_modules::color_grid::color_grid::ColorGrid;
use crate::error::{Result, VisionError};

/// Byte layouts a raw frame can arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// `R G B` per pixel.
    Rgb24,
    /// `R G B A` per pixel. Alpha is dropped.
    Rgba32,
    /// `A R G B` per pixel. Alpha is dropped.
    Argb32,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuy2,
}

impl PixelFormat {
    /// Bytes needed for a `width` x `height` frame, or `None` on overflow.
    pub fn frame_len(self, width: usize, height: usize) -> Option<usize> {
        let pixels = width.checked_mul(height)?;
        match self {
            PixelFormat::Rgb24 => pixels.checked_mul(3),
            PixelFormat::Rgba32 | PixelFormat::Argb32 => pixels.checked_mul(4),
            PixelFormat::Yuy2 => pixels.checked_mul(2),
        }
    }
}

/// Decodes one raw frame into a `ColorGrid`.
pub fn decode_frame(bytes: &[u8], width: usize, height: usize, format: PixelFormat) -> Result<ColorGrid> {
    if width == 0 || height == 0 || (format == PixelFormat::Yuy2 && width % 2 != 0) {
        return Err(VisionError::InvalidDimensions { width, height });
    }
    let expected = format
        .frame_len(width, height)
        .ok_or(VisionError::InvalidDimensions { width, height })?;
    if bytes.len() != expected {
        return Err(VisionError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    let cells = match format {
        PixelFormat::Rgb24 => bytes
            .chunks_exact(3)
            .map(|p| Color::new(p[0], p[1], p[2]))
            .collect(),
        PixelFormat::Rgba32 => bytes
            .chunks_exact(4)
            .map(|p| Color::new(p[0], p[1], p[2]))
            .collect(),
        PixelFormat::Argb32 => bytes
            .chunks_exact(4)
            .map(|p| Color::new(p[1], p[2], p[3]))
            .collect(),
        PixelFormat::Yuy2 => yuy2_to_colors(bytes),
    };

    ColorGrid::from_vec(width, height, cells)
}

fn yuy2_to_colors(bytes: &[u8]) -> Vec<Color> {
    let mut colors = Vec::with_capacity(bytes.len() / 2);
    for quad in bytes.chunks_exact(4) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        colors.push(yuv_to_color(y0, u, v));
        colors.push(yuv_to_color(y1, u, v));
    }
    colors
}

// BT.601 full range.
fn yuv_to_color(y: u8, u: u8, v: u8) -> Color {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402_f32 * v;
    let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
    let b = y + 1.772_f32 * u;

    Color::new(clamp_to_u8(r), clamp_to_u8(g), clamp_to_u8(b))
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb24_layout() {
        let bytes = [255, 0, 0, 0, 255, 0, 0, 0, 255, 1, 2, 3];
        let grid = decode_frame(&bytes, 2, 2, PixelFormat::Rgb24).unwrap();
        assert_eq!(grid.get(0, 0), Some(Color::RED));
        assert_eq!(grid.get(0, 1), Some(Color::GREEN));
        assert_eq!(grid.get(1, 0), Some(Color::BLUE));
        assert_eq!(grid.get(1, 1), Some(Color::new(1, 2, 3)));
    }

    #[test]
    fn rgba_and_argb_drop_alpha() {
        let rgba = decode_frame(&[10, 20, 30, 0], 1, 1, PixelFormat::Rgba32).unwrap();
        let argb = decode_frame(&[0xFF, 10, 20, 30], 1, 1, PixelFormat::Argb32).unwrap();
        assert_eq!(rgba.get(0, 0), Some(Color::new(10, 20, 30)));
        assert_eq!(argb, rgba);
    }

    #[test]
    fn yuy2_gray_and_saturation() {
        // Neutral chroma keeps luma as gray; two pixels share one U/V pair.
        let grid = decode_frame(&[16, 128, 235, 128], 2, 1, PixelFormat::Yuy2).unwrap();
        assert_eq!(grid.get(0, 0), Some(Color::new(16, 16, 16)));
        assert_eq!(grid.get(0, 1), Some(Color::new(235, 235, 235)));

        // Strong V pushes red up and clamps.
        let grid = decode_frame(&[200, 128, 200, 255], 2, 1, PixelFormat::Yuy2).unwrap();
        let c = grid.get(0, 0).unwrap();
        assert_eq!(c.red(), 255);
        assert!(c.green() < 200);
    }

    #[test]
    fn rejects_bad_lengths_and_dimensions() {
        assert!(matches!(
            decode_frame(&[0; 5], 1, 2, PixelFormat::Rgb24),
            Err(VisionError::SizeMismatch { expected: 6, actual: 5 })
        ));
        assert!(matches!(
            decode_frame(&[0; 6], 3, 1, PixelFormat::Yuy2),
            Err(VisionError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            decode_frame(&[], 0, 4, PixelFormat::Rgba32),
            Err(VisionError::InvalidDimensions { .. })
        ));
    }
}
