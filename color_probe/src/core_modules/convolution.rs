// THEORY:
// The `ConvolutionEngine` turns a neighborhood of a `ColorGrid` into one smoothed
// `Color`. It is the spatial counterpart of a chunk average: instead of a flat
// mean over a block, it weights every neighbor by a `Kernel` centered on the
// requested coordinate.
//
// Key architectural principles:
// 1.  **Explicit edge policy**: every kernel cell that lands off the grid
//     contributes `weight * default_value` to each channel. The check is an
//     ordinary bounds test on signed coordinates; there is no error path.
// 2.  **Faithful arithmetic**: channels accumulate in `f64`, get `+0.5`, are
//     truncated toward zero and finally clamped into `0..=255`.
// 3.  **Two footprints**: `Footprint::Full` visits all `(2h+1)^2` kernel cells.
//     `Footprint::Legacy` reproduces the historical loop bound, which stops one
//     short on each axis (`[-h, h)`), so the last kernel row and column are never
//     read and a 1x1 kernel samples nothing at all.
// 4.  **Purity**: `average` allocates nothing and touches no shared state, so it
//     is safe to call from any number of threads against the same grid.

use crate::core_modules::color::color::{Channel, Color};
use crate::core_modules::color_grid::color_grid::ColorGrid;
use crate::core_modules::kernel::kernel::{Kernel, Weight};
use serde::{Deserialize, Serialize};

/// Gray level substituted for samples that fall outside the grid.
pub const DEFAULT_VALUE: Channel = 128;

/// Which kernel cells take part in an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Footprint {
    /// Offsets `[-h, h]` on both axes.
    #[default]
    Full,
    /// Offsets `[-h, h)` on both axes.
    Legacy,
}

impl Footprint {
    /// Half-open offset range covered along one axis for a kernel with half-size `half`.
    fn offsets(self, half: i64) -> std::ops::Range<i64> {
        match self {
            Footprint::Full => -half..half + 1,
            Footprint::Legacy => -half..half,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionEngine {
    footprint: Footprint,
    default_value: Channel,
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new(Footprint::Full, DEFAULT_VALUE)
    }
}

impl ConvolutionEngine {
    pub const fn new(footprint: Footprint, default_value: Channel) -> Self {
        Self {
            footprint,
            default_value,
        }
    }

    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub const fn default_value(&self) -> Channel {
        self.default_value
    }

    /// Weighted average of the neighborhood centered at `(row, col)`.
    ///
    /// The center may lie anywhere, including off the grid. Kernel cell `(ki, kj)`
    /// samples grid cell `(row - h + ki, col - h + kj)`.
    pub fn average(&self, grid: &ColorGrid, row: i64, col: i64, kernel: &Kernel) -> Color {
        let half = kernel.half() as i64;
        let fill = self.default_value as Weight;

        let mut red: Weight = 0.0;
        let mut green: Weight = 0.0;
        let mut blue: Weight = 0.0;

        for (ki, di) in self.footprint.offsets(half).enumerate() {
            let sample_row = row.checked_add(di);
            for (kj, dj) in self.footprint.offsets(half).enumerate() {
                let weight = kernel.weight(ki, kj);
                let sample = sample_row
                    .zip(col.checked_add(dj))
                    .and_then(|(r, c)| grid.get_signed(r, c));

                match sample {
                    Some(color) => {
                        red += weight * color.red() as Weight;
                        green += weight * color.green() as Weight;
                        blue += weight * color.blue() as Weight;
                    }
                    None => {
                        red += weight * fill;
                        green += weight * fill;
                        blue += weight * fill;
                    }
                }
            }
        }

        Color::from_clamped(round_half_up(red), round_half_up(green), round_half_up(blue))
    }

    /// Runs `average` at every cell and returns a grid of the same shape.
    pub fn smooth(&self, grid: &ColorGrid, kernel: &Kernel) -> ColorGrid {
        ColorGrid::from_fn(grid.width(), grid.height(), |row, col| {
            self.average(grid, row as i64, col as i64, kernel)
        })
    }

    /// Same result as `smooth`, with rows split across one scoped thread per CPU.
    pub fn smooth_parallel(&self, grid: &ColorGrid, kernel: &Kernel) -> ColorGrid {
        let width = grid.width();
        let height = grid.height();
        if width == 0 || height == 0 {
            return grid.clone();
        }

        let workers = num_cpus::get().clamp(1, height);
        let rows_per_worker = height.div_ceil(workers);
        let mut cells = vec![Color::default(); width * height];

        std::thread::scope(|scope| {
            for (band_index, band) in cells.chunks_mut(rows_per_worker * width).enumerate() {
                let first_row = band_index * rows_per_worker;
                scope.spawn(move || {
                    for (offset, cell) in band.iter_mut().enumerate() {
                        let row = first_row + offset / width;
                        let col = offset % width;
                        *cell = self.average(grid, row as i64, col as i64, kernel);
                    }
                });
            }
        });

        ColorGrid::from_fn(width, height, |row, col| cells[row * width + col])
    }
}

/// `+0.5` then truncate toward zero.
#[inline]
fn round_half_up(accumulator: Weight) -> i64 {
    (accumulator + 0.5) as i64
}

/// Smoothed color at `(row, col)` with the default engine.
pub fn average(grid: &ColorGrid, row: i64, col: i64, kernel: &Kernel) -> Color {
    ConvolutionEngine::default().average(grid, row, col, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> ColorGrid {
        ColorGrid::from_fn(width, height, |row, col| {
            Color::new((row * 20) as u8, (col * 30) as u8, ((row + col) * 5) as u8)
        })
    }

    #[test]
    fn identity_kernel_returns_cell_in_bounds() {
        let grid = gradient(6, 5);
        for row in 0..5 {
            for col in 0..6 {
                assert_eq!(
                    average(&grid, row, col, Kernel::identity()),
                    grid.get(row as usize, col as usize).unwrap()
                );
            }
        }
    }

    #[test]
    fn identity_kernel_off_grid_is_default_gray() {
        let grid = gradient(3, 3);
        assert_eq!(average(&grid, -4, 10, Kernel::identity()), Color::GRAY);
    }

    #[test]
    fn uniform_region_reproduces_color_for_every_preset() {
        let color = Color::new(201, 37, 99);
        let grid = ColorGrid::filled(9, 9, color);
        for kernel in [Kernel::gaussian_3x3(), Kernel::gaussian_5x5(), Kernel::gaussian_7x7()] {
            let out = average(&grid, 4, 4, kernel);
            for (got, want) in out.channels().iter().zip(color.channels()) {
                assert!((*got as i16 - want as i16).abs() <= 1, "{out} vs {color}");
            }
        }
    }

    #[test]
    fn red_5x5_grid_averages_to_red() {
        let grid = ColorGrid::filled(5, 5, Color::RED);
        assert_eq!(average(&grid, 2, 2, Kernel::gaussian_5x5()), Color::RED);
    }

    #[test]
    fn corner_blends_real_cells_with_gray() {
        // Off-grid weights at (0,0): top row 1+2+1, left column 2+1 => 7/16.
        // On-grid weights: 4+2+2+1 => 9/16.
        let black = ColorGrid::filled(2, 2, Color::BLACK);
        assert_eq!(average(&black, 0, 0, Kernel::gaussian_3x3()), Color::new(56, 56, 56));

        let red = ColorGrid::filled(2, 2, Color::RED);
        let expected_red = (128.0 * 7.0 / 16.0 + 255.0 * 9.0 / 16.0 + 0.5) as u8;
        assert_eq!(expected_red, 199);
        assert_eq!(average(&red, 0, 0, Kernel::gaussian_3x3()), Color::new(199, 56, 56));
    }

    #[test]
    fn corner_matches_weighted_formula_on_mixed_grid() {
        let grid = ColorGrid::from_rows(vec![
            vec![Color::new(16, 0, 32), Color::new(48, 64, 0)],
            vec![Color::new(0, 160, 80), Color::new(240, 16, 16)],
        ])
        .unwrap();
        let k = Kernel::gaussian_3x3();

        let mut expected = [0.0f64; 3];
        for ki in 0..3 {
            for kj in 0..3 {
                let channels = match grid.get_signed(ki as i64 - 1, kj as i64 - 1) {
                    Some(c) => c.channels().map(f64::from),
                    None => [128.0; 3],
                };
                for ch in 0..3 {
                    expected[ch] += k.weight(ki, kj) * channels[ch];
                }
            }
        }
        let expected = Color::from_clamped(
            (expected[0] + 0.5) as i64,
            (expected[1] + 0.5) as i64,
            (expected[2] + 0.5) as i64,
        );
        assert_eq!(average(&grid, 0, 0, k), expected);
    }

    #[test]
    fn center_far_outside_grid_is_all_gray() {
        let grid = ColorGrid::filled(4, 4, Color::PINK);
        for kernel in [Kernel::gaussian_3x3(), Kernel::gaussian_7x7()] {
            assert_eq!(average(&grid, 100, -100, kernel), Color::GRAY);
        }
    }

    #[test]
    fn custom_default_value_is_used_off_grid() {
        let engine = ConvolutionEngine::new(Footprint::Full, 0);
        let grid = ColorGrid::filled(1, 1, Color::WHITE);
        assert_eq!(engine.average(&grid, 5, 5, Kernel::gaussian_3x3()), Color::BLACK);
    }

    #[test]
    fn legacy_footprint_skips_last_row_and_column() {
        let engine = ConvolutionEngine::new(Footprint::Legacy, DEFAULT_VALUE);
        let grid = ColorGrid::filled(3, 3, Color::RED);
        // Only kernel cells (0,0) (0,1) (1,0) (1,1) are read: 1+2+2+4 = 9/16.
        assert_eq!(engine.average(&grid, 1, 1, Kernel::gaussian_3x3()), Color::new(143, 0, 0));
    }

    #[test]
    fn legacy_footprint_identity_samples_nothing() {
        let engine = ConvolutionEngine::new(Footprint::Legacy, DEFAULT_VALUE);
        let grid = ColorGrid::filled(3, 3, Color::WHITE);
        assert_eq!(engine.average(&grid, 1, 1, Kernel::identity()), Color::BLACK);
    }

    #[test]
    fn negative_weights_are_clamped() {
        let sharpen = Kernel::new(vec![
            vec![0.0, -1.0, 0.0],
            vec![-1.0, 5.0, -1.0],
            vec![0.0, -1.0, 0.0],
        ])
        .unwrap();
        let grid = ColorGrid::from_fn(3, 3, |row, col| {
            if row == 1 && col == 1 { Color::WHITE } else { Color::BLACK }
        });
        assert_eq!(average(&grid, 1, 1, &sharpen), Color::WHITE);
        assert_eq!(average(&grid, 0, 1, &sharpen), Color::BLACK);
    }

    #[test]
    fn parallel_smooth_matches_sequential() {
        let grid = gradient(13, 11);
        let engine = ConvolutionEngine::default();
        let kernel = Kernel::gaussian_5x5();
        assert_eq!(engine.smooth_parallel(&grid, kernel), engine.smooth(&grid, kernel));
    }

    #[test]
    fn smooth_keeps_shape() {
        let grid = gradient(7, 3);
        let out = ConvolutionEngine::default().smooth(&grid, Kernel::gaussian_3x3());
        assert_eq!((out.width(), out.height()), (7, 3));
    }
}
