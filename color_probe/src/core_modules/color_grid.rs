// THEORY:
// `ColorGrid` is one captured frame: `height` rows of `width` colors, stored
// flat and row-major. It is created once by the frame producer, published, and from
// then on only ever read. Consumers address it by (row, column); signed lookups let
// the convolution engine ask about coordinates that fall off the frame and get a
// clean `None` back instead of a wrapped index.

pub mod color_grid {
    use crate::core_modules::color::color::Color;
    use crate::error::{Result, VisionError};

    #[derive(Debug, Clone, PartialEq)]
    pub struct ColorGrid {
        width: usize,
        height: usize,
        cells: Vec<Color>,
    }

    /// Validated layout for a `width x height` grid: `(width, height, cell count)`.
    ///
    /// A grid with no columns or no rows holds no cells, so both sides collapse to
    /// zero and `height()` never reports rows that `rows()` cannot yield.
    fn layout(width: usize, height: usize) -> Result<(usize, usize, usize)> {
        let len = width
            .checked_mul(height)
            .ok_or(VisionError::InvalidDimensions { width, height })?;
        if len == 0 {
            return Ok((0, 0, 0));
        }
        Ok((width, height, len))
    }

    fn layout_or_panic(width: usize, height: usize) -> (usize, usize, usize) {
        match layout(width, height) {
            Ok(layout) => layout,
            Err(e) => panic!("{e}"),
        }
    }

    impl ColorGrid {
        /// Wraps a row-major vector of colors. The length must equal `width * height`.
        pub fn from_vec(width: usize, height: usize, cells: Vec<Color>) -> Result<Self> {
            let (width, height, expected) = layout(width, height)?;
            if cells.len() != expected {
                return Err(VisionError::SizeMismatch {
                    expected,
                    actual: cells.len(),
                });
            }
            Ok(Self {
                width,
                height,
                cells,
            })
        }

        /// Builds a grid from nested rows. Every row must have the same length.
        pub fn from_rows(rows: Vec<Vec<Color>>) -> Result<Self> {
            let height = rows.len();
            let width = rows.first().map_or(0, Vec::len);
            let mut cells = Vec::new();
            for row in rows {
                if row.len() != width {
                    return Err(VisionError::SizeMismatch {
                        expected: width,
                        actual: row.len(),
                    });
                }
                cells.extend(row);
            }
            Self::from_vec(width, height, cells)
        }

        /// # Panics
        ///
        /// Panics if `width * height` overflows `usize`.
        pub fn filled(width: usize, height: usize, color: Color) -> Self {
            let (width, height, len) = layout_or_panic(width, height);
            Self {
                width,
                height,
                cells: vec![color; len],
            }
        }

        /// Builds a grid by evaluating `f(row, col)` for every cell.
        ///
        /// # Panics
        ///
        /// Panics if `width * height` overflows `usize`.
        pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Color) -> Self {
            let (width, height, len) = layout_or_panic(width, height);
            let mut cells = Vec::with_capacity(len);
            for row in 0..height {
                for col in 0..width {
                    cells.push(f(row, col));
                }
            }
            Self {
                width,
                height,
                cells,
            }
        }

        pub fn width(&self) -> usize {
            self.width
        }

        pub fn height(&self) -> usize {
            self.height
        }

        pub fn is_empty(&self) -> bool {
            self.cells.is_empty()
        }

        pub fn get(&self, row: usize, col: usize) -> Option<Color> {
            if row < self.height && col < self.width {
                Some(self.cells[row * self.width + col])
            } else {
                None
            }
        }

        /// Lookup with signed coordinates; anything off the grid is `None`.
        #[inline]
        pub fn get_signed(&self, row: i64, col: i64) -> Option<Color> {
            let row = usize::try_from(row).ok()?;
            let col = usize::try_from(col).ok()?;
            self.get(row, col)
        }

        pub fn cells(&self) -> &[Color] {
            &self.cells
        }

        pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
            // chunks(0) panics; an empty grid is always 0x0 and has no cells to chunk.
            self.cells.chunks(self.width.max(1))
        }

        pub fn to_rgb_image(&self) -> image::RgbImage {
            let mut out = image::RgbImage::new(self.width as u32, self.height as u32);
            for (index, pixel) in out.pixels_mut().enumerate() {
                *pixel = self.cells[index].into();
            }
            out
        }
    }

    impl From<&image::RgbImage> for ColorGrid {
        fn from(img: &image::RgbImage) -> Self {
            let (width, height, _) = layout_or_panic(img.width() as usize, img.height() as usize);
            let cells = img.pixels().map(|p| Color::from(*p)).collect();
            Self {
                width,
                height,
                cells,
            }
        }
    }

    impl From<&image::RgbaImage> for ColorGrid {
        fn from(img: &image::RgbaImage) -> Self {
            let (width, height, _) = layout_or_panic(img.width() as usize, img.height() as usize);
            let cells = img.pixels().map(|p| Color::from(*p)).collect();
            Self {
                width,
                height,
                cells,
            }
        }
    }

    impl From<&image::DynamicImage> for ColorGrid {
        fn from(img: &image::DynamicImage) -> Self {
            ColorGrid::from(&img.to_rgb8())
        }
    }

}
